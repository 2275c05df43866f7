// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;

use crate::palette::{resolve, theme_listing};

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  stripepaper --theme algeria --width 50 --width-range 20 --speed 1 --speed-range 2 --px-per-col 8";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help_detail(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
        } else if let Some(rest) = line.strip_prefix("      Example:") {
            out.push_str("      \x1b[32mExample:\x1b[0m");
            out.push_str(rest);
        } else if let Some(rest) = line.strip_prefix("  stripepaper") {
            out.push_str("  \x1b[1;34mstripepaper\x1b[0m");
            out.push_str(rest);
        } else if line.starts_with("  -") {
            out.push_str("  \x1b[33m");
            out.push_str(&line[2..]);
            out.push_str("\x1b[0m");
        } else {
            out.push_str(line);
        }
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_detail(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "stripepaper", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'p',
        long = "prefs",
        help_heading = "SETTINGS",
        help = "Settings file (TOML), reloaded when it changes"
    )]
    pub prefs: Option<PathBuf>,

    #[arg(
        long = "reset-prefs",
        help_heading = "SETTINGS",
        help = "Clear every value in the settings file and exit"
    )]
    pub reset_prefs: bool,

    #[arg(
        short = 't',
        long = "theme",
        help_heading = "APPEARANCE",
        help = "Color theme (see --list-themes) [default: algeria]"
    )]
    pub theme: Option<String>,

    #[arg(
        short = 'w',
        long = "width",
        help_heading = "APPEARANCE",
        help = "Base stripe half-width in pixels, above --width-range [default: 50]"
    )]
    pub width: Option<f32>,

    #[arg(
        short = 'W',
        long = "width-range",
        help_heading = "APPEARANCE",
        help = "Half-width jitter in pixels (min 0) [default: 20]"
    )]
    pub width_range: Option<f32>,

    #[arg(
        short = 'S',
        long = "speed",
        help_heading = "MOTION",
        help = "Base speed, divided by 50 to get pixels per tick [default: 1]"
    )]
    pub speed: Option<f32>,

    #[arg(
        short = 'R',
        long = "speed-range",
        help_heading = "MOTION",
        help = "Speed jitter, divided by 50 (min 0) [default: 2]"
    )]
    pub speed_range: Option<f32>,

    #[arg(
        long = "no-touch",
        help_heading = "MOTION",
        help = "Ignore mouse presses instead of adding stripes"
    )]
    pub no_touch: bool,

    #[arg(
        long = "px-per-col",
        default_value_t = 8.0,
        help_heading = "APPEARANCE",
        help = "Device pixels per terminal column (min 1 max 64)"
    )]
    pub px_per_col: f32,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: auto-detected from COLORTERM/TERM"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Fixed random seed for a reproducible run"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "log-file",
        help_heading = "GENERAL",
        help = "Write logs to this file (filter with RUST_LOG, default info)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "help-detail",
        help_heading = "HELP",
        help = "Show detailed help for all parameters and exit"
    )]
    pub help_detail: bool,

    #[arg(
        long = "list-themes",
        help_heading = "HELP",
        help = "List available color themes and exit"
    )]
    pub list_themes: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

pub fn print_list_themes() {
    let color = color_enabled_stdout();
    if color {
        println!("\x1b[1;36mAVAILABLE COLOR THEMES:\x1b[0m");
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with --theme.\x1b[0m");
    } else {
        println!("AVAILABLE COLOR THEMES:");
        println!("NOTE: Use only the VALUE (left side) with --theme.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    for (name, description) in theme_listing() {
        let mut swatch = String::new();
        if color {
            if let Ok(theme) = resolve(name) {
                for c in &theme.colors {
                    swatch.push_str(&format!("\x1b[48;2;{};{};{}m  ", c.r, c.g, c.b));
                }
                swatch.push_str("\x1b[0m ");
            }
        }
        println!("{:<12} {}{}", name, swatch, description);
    }
}

pub fn print_help_detail() {
    let block = format!(
        "{}\n\nUSAGE:\n  stripepaper [OPTIONS]\n\nSETTINGS:\n  -p, --prefs <path>\n      TOML settings file with the keys theme, width, widthRange, speed,\n      speedRange and touch. Changes are picked up while running.\n      Example: stripepaper --prefs ~/.config/stripepaper.toml\n\n  --reset-prefs\n      Clear every value in the settings file and exit.\n      Example: stripepaper --prefs stripes.toml --reset-prefs\n\nAPPEARANCE:\n  -t, --theme <name>\n      Color theme (see --list-themes).\n      Example: stripepaper --theme ukraine\n\n  -w, --width <pixels>\n      Base stripe half-width.\n      Example: stripepaper --width 40\n\n  -W, --width-range <pixels>\n      Each stripe is exactly width-range wider or narrower than the base.\n      Example: stripepaper --width-range 10\n\n  --px-per-col <number>\n      Device pixels per terminal column (min 1 max 64).\n      Example: stripepaper --px-per-col 4\n\n  --colormode <0|16|8|24>\n      Force color mode; otherwise auto-detected from COLORTERM/TERM.\n      Example: stripepaper --colormode 24\n\nMOTION:\n  -S, --speed <number>\n      Base speed; divided by 50 to get pixels per tick.\n      Example: stripepaper --speed 5\n\n  -R, --speed-range <number>\n      Speed jitter; divided by 50.\n      Example: stripepaper --speed-range 4\n\n  --no-touch\n      Ignore mouse presses instead of adding stripes.\n      Example: stripepaper --no-touch\n\nGENERAL:\n  --seed <number>\n      Fixed random seed.\n      Example: stripepaper --seed 42\n\n  --duration <seconds>\n      Stop after N seconds (min 0.1 max 86400).\n      Example: stripepaper --duration 10\n\n  -s, --screensaver\n      Exit on the first keypress.\n      Example: stripepaper -s\n\n  --log-file <path>\n      Write logs to a file; RUST_LOG selects the level.\n      Example: RUST_LOG=debug stripepaper --log-file stripes.log\n\nKEYS:\n  q, Esc      quit\n  p           pause / resume\n  r           rebuild with a fresh population\n  mouse press add a stripe (unless touch is disabled)\n\nHELP:\n  --check-bitcolor\n      Print detected terminal color capability and exit.\n\n  --help\n      Show short help.\n\n  --help-detail\n      Show this detailed help.\n\n  --list-themes\n      List available color themes and exit.\n\n  -v, --version\n      Print version and exit.\n\n  -i, --info\n      Print version info and exit.\n",
        DEFAULT_PARAMS_USAGE
    );

    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(&block));
    } else {
        print!("{}", block);
    }
    println!();
    print_list_themes();
}
