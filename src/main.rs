// Copyright (c) 2026 rezky_nightky

mod cell;
mod config;
mod error;
mod frame;
mod input;
mod palette;
mod pool;
mod prefs;
mod render;
mod runtime;
mod settings;
mod stripe;
mod terminal;
mod ticker;
mod watcher;

use std::env;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, print_help_detail, print_list_themes,
    Args,
};
use crate::error::ConfigError;
use crate::frame::Frame;
use crate::input::TouchEvent;
use crate::prefs::{
    PrefStore, KEY_SPEED, KEY_SPEED_RANGE, KEY_THEME, KEY_TOUCH, KEY_WIDTH, KEY_WIDTH_RANGE,
};
use crate::render::RenderLoop;
use crate::runtime::ColorMode;
use crate::settings::{drain_pending, engine_channel, watch_prefs_file};
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

/// How long to wait for input while no frame is scheduled.
const IDLE_POLL: Duration = Duration::from_millis(250);

fn build_info() -> &'static str {
    env!("STRIPEPAPER_BUILD")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn require_f32_range(name: &str, v: f32, min: f32, max: f32) -> f32 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() || v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }

    ColorMode::Color16
}

fn detect_color_mode(args: &Args) -> ColorMode {
    match args.colormode {
        None => detect_color_mode_auto(),
        Some(0) => ColorMode::Mono,
        Some(16) => ColorMode::Color16,
        Some(8) | Some(256) => ColorMode::Color256,
        Some(24) | Some(32) => ColorMode::TrueColor,
        Some(m) => {
            eprintln!("invalid --colormode: {} (allowed: 0,16,8/256,24/32)", m);
            std::process::exit(1);
        }
    }
}

fn color_mode_label(m: ColorMode) -> &'static str {
    match m {
        ColorMode::TrueColor => "24-bit truecolor",
        ColorMode::Color256 => "8-bit (256-color)",
        ColorMode::Color16 => "16-color",
        ColorMode::Mono => "mono",
    }
}

fn init_logging(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn apply_overrides(store: &mut PrefStore, args: &Args) {
    if let Some(theme) = &args.theme {
        store.set_override(KEY_THEME, theme.clone());
    }
    if let Some(w) = args.width {
        store.set_override(KEY_WIDTH, require_f32_range("--width", w, 0.0, 100_000.0).to_string());
    }
    if let Some(w) = args.width_range {
        let w = require_f32_range("--width-range", w, 0.0, 100_000.0);
        store.set_override(KEY_WIDTH_RANGE, w.to_string());
    }
    if let Some(s) = args.speed {
        let s = require_f32_range("--speed", s, -100_000.0, 100_000.0);
        store.set_override(KEY_SPEED, s.to_string());
    }
    if let Some(s) = args.speed_range {
        let s = require_f32_range("--speed-range", s, 0.0, 100_000.0);
        store.set_override(KEY_SPEED_RANGE, s.to_string());
    }
    if args.no_touch {
        store.set_override(KEY_TOUCH, "false");
    }
}

/// Restores the terminal, reports `err` and exits with status 1.
fn bail(term: Terminal, err: &ConfigError) -> ! {
    drop(term);
    error!("{err}");
    eprintln!("{err}");
    std::process::exit(1);
}

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_themes {
        print_list_themes();
        return Ok(());
    }

    if args.help_detail {
        print_help_detail();
        return Ok(());
    }

    if args.check_bitcolor {
        let colorterm = env::var("COLORTERM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        println!("BITCOLOR CHECK:");
        println!(
            "  COLORTERM: {}",
            if colorterm.is_empty() { "(unset)" } else { &colorterm }
        );
        println!("  TERM: {}", if term.is_empty() { "(unset)" } else { &term });
        println!("  auto_detected: {}", color_mode_label(detect_color_mode_auto()));
        println!("  effective: {}", color_mode_label(detect_color_mode(&args)));
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        let sha = env!("STRIPEPAPER_GIT_SHA");
        if !sha.is_empty() {
            println!("Commit: {}", sha);
        }
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    if let Some(path) = &args.log_file {
        if let Err(e) = init_logging(path) {
            eprintln!("failed to open log file {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }

    let mut store = match &args.prefs {
        Some(path) => PrefStore::open(path).unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        }),
        None => PrefStore::in_memory(),
    };

    if args.reset_prefs {
        if store.path().is_none() {
            eprintln!("--reset-prefs needs --prefs <path>");
            std::process::exit(1);
        }
        if let Err(e) = store.reset() {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        info!("settings reset to defaults");
        println!("settings reset to defaults");
        return Ok(());
    }

    apply_overrides(&mut store, &args);

    let color_mode = detect_color_mode(&args);
    let px_per_col = require_f32_range("--px-per-col", args.px_per_col, 1.0, 64.0);
    let duration_s = args.duration.and_then(|s| {
        if s.is_finite() && s <= 0.0 {
            return None;
        }
        Some(require_f64_range("--duration", s, 0.1, 86400.0))
    });

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let (handle, events) = engine_channel();
    let _settings_watch = match store.path() {
        Some(path) => match watch_prefs_file(path, handle) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!("{e}; settings changes will not be picked up");
                None
            }
        },
        None => None,
    };

    let mut term = Terminal::new()?;
    let (w, h) = term.size()?;
    let mut frame = Frame::new(w, h, px_per_col, color_mode);
    let display_width = |f: &Frame| f.width as f32 * f.px_per_col();
    info!(cols = w, rows = h, px_per_col, ?color_mode, "surface ready");

    let mut engine = RenderLoop::new(rng);
    if let Err(e) = engine.check_and_rebuild(&store, display_width(&frame)) {
        bail(term, &e);
    }

    let start_time = Instant::now();
    let end_time = duration_s.map(|s| start_time + Duration::from_secs_f64(s));
    let mut running = true;

    let mut presented = engine.frames();
    let res = {
        let canvas = (w > 0 && h > 0).then_some(&mut frame);
        engine.on_visibility_changed(true, Instant::now(), &store, w as f32 * px_per_col, canvas)
    };
    if let Err(e) = res {
        bail(term, &e);
    }

    while running {
        if presented != engine.frames() {
            presented = engine.frames();
            frame.commit();
            term.present(&mut frame)?;
        }

        let now = Instant::now();
        if end_time.is_some_and(|end| now >= end) {
            break;
        }

        let mut timeout = engine.time_to_next_frame(now).unwrap_or(IDLE_POLL);
        if let Some(end) = end_time {
            timeout = timeout.min(end.saturating_duration_since(now));
        }

        if Terminal::poll_event(timeout)? {
            let ev = Terminal::read_event()?;
            let now = Instant::now();
            let dw = display_width(&frame);
            let res = match ev {
                Event::Resize(nw, nh) => {
                    frame = Frame::new(nw, nh, px_per_col, color_mode);
                    info!(cols = nw, rows = nh, "surface resized");
                    Ok(())
                }
                Event::FocusGained | Event::FocusLost => {
                    let visible = matches!(ev, Event::FocusGained);
                    if visible {
                        frame.force_redraw();
                    }
                    let canvas = (frame.width > 0 && frame.height > 0).then_some(&mut frame);
                    engine.on_visibility_changed(visible, now, &store, dw, canvas)
                }
                Event::Mouse(m) => {
                    if let Some(touch) = TouchEvent::from_mouse(&m, px_per_col) {
                        engine.on_touch(touch, &store);
                    }
                    Ok(())
                }
                Event::Key(k) if k.kind == KeyEventKind::Press => {
                    if args.screensaver {
                        running = false;
                        Ok(())
                    } else {
                        match k.code {
                            KeyCode::Esc | KeyCode::Char('q') => {
                                running = false;
                                Ok(())
                            }
                            KeyCode::Char('p') => {
                                let visible = !engine.visibility().is_visible();
                                let canvas =
                                    (frame.width > 0 && frame.height > 0).then_some(&mut frame);
                                engine.on_visibility_changed(visible, now, &store, dw, canvas)
                            }
                            KeyCode::Char('r') => {
                                let canvas =
                                    (frame.width > 0 && frame.height > 0).then_some(&mut frame);
                                engine.rebuild_and_paint(dw, canvas);
                                Ok(())
                            }
                            _ => Ok(()),
                        }
                    }
                }
                _ => Ok(()),
            };
            if let Err(e) = res {
                bail(term, &e);
            }
        }

        if drain_pending(&events).is_some() {
            match store.reload() {
                Ok(changed) => {
                    info!(changed, "settings reloaded");
                    let dw = display_width(&frame);
                    let canvas = (frame.width > 0 && frame.height > 0).then_some(&mut frame);
                    if let Err(e) =
                        engine.on_preferences_changed(Instant::now(), &store, dw, canvas)
                    {
                        bail(term, &e);
                    }
                }
                Err(e) => warn!("{e}; keeping previous settings"),
            }
        }

        let dw = display_width(&frame);
        let canvas = (frame.width > 0 && frame.height > 0).then_some(&mut frame);
        if let Err(e) = engine.tick(Instant::now(), &store, dw, canvas) {
            bail(term, &e);
        }
    }

    engine.on_surface_destroyed();
    info!(
        frames = engine.frames(),
        rebuilds = engine.rebuilds(),
        stripes = engine.pool().len(),
        elapsed_s = start_time.elapsed().as_secs_f64(),
        "stopped"
    );
    Ok(())
}
