// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::frame::Canvas;
use crate::input::{InputHandler, TouchEvent};
use crate::palette::Rgba;
use crate::pool::StripePool;
use crate::prefs::Preferences;
use crate::runtime::Visibility;
use crate::ticker::{Ticker, FRAME_DELAY};
use crate::watcher::ConfigWatcher;

pub const BACKDROP: Rgba = Rgba::BLACK;

/// Drives the stripe simulation: configuration checks, physics, painting and
/// the single pending frame tick.
///
/// Every method runs on the thread that owns the loop; touch events and
/// ticks are interleaved by the caller, never concurrent.
pub struct RenderLoop {
    visibility: Visibility,
    ticker: Ticker,
    watcher: ConfigWatcher,
    pool: StripePool,
    input: InputHandler,
    rng: StdRng,
    rebuilds: u64,
    frames: u64,
}

impl RenderLoop {
    pub fn new(rng: StdRng) -> Self {
        Self {
            visibility: Visibility::Hidden,
            ticker: Ticker::new(),
            watcher: ConfigWatcher::new(),
            pool: StripePool::new(),
            input: InputHandler,
            rng,
            rebuilds: 0,
            frames: 0,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn pool(&self) -> &StripePool {
        &self.pool
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Time left until the pending frame, `None` when no frame is scheduled.
    pub fn time_to_next_frame(&self, now: Instant) -> Option<Duration> {
        self.ticker.remaining(now)
    }

    /// Rebuilds the pool when the preferences differ from the cached ones.
    pub fn check_and_rebuild<P: Preferences + ?Sized>(
        &mut self,
        prefs: &P,
        display_width: f32,
    ) -> Result<bool, ConfigError> {
        if !self.watcher.check(prefs)? {
            return Ok(false);
        }
        if self.rebuild(display_width) {
            debug!(stripes = self.pool.len(), display_width, "stripe pool rebuilt");
        }
        Ok(true)
    }

    /// Replaces the population on request and paints it once, even while
    /// hidden, so a paused surface shows the new stripes. The pending tick
    /// is left alone. Returns whether the pool was rebuilt.
    pub fn rebuild_and_paint<C: Canvas + ?Sized>(
        &mut self,
        display_width: f32,
        canvas: Option<&mut C>,
    ) -> bool {
        if !self.rebuild(display_width) {
            return false;
        }
        debug!(stripes = self.pool.len(), display_width, "stripe pool rebuilt on request");
        if let Some(canvas) = canvas {
            self.paint(canvas);
            self.frames += 1;
        }
        true
    }

    /// Replaces the population using the cached configuration.
    fn rebuild(&mut self, display_width: f32) -> bool {
        let (Some(cfg), Some(theme)) = (self.watcher.config(), self.watcher.theme()) else {
            return false;
        };
        self.pool.rebuild(
            cfg.pool_capacity,
            display_width,
            cfg,
            theme,
            &mut self.rng,
        );
        self.rebuilds += 1;
        true
    }

    pub fn on_visibility_changed<P, C>(
        &mut self,
        visible: bool,
        now: Instant,
        prefs: &P,
        display_width: f32,
        canvas: Option<&mut C>,
    ) -> Result<(), ConfigError>
    where
        P: Preferences + ?Sized,
        C: Canvas + ?Sized,
    {
        self.visibility = Visibility::from_visible(visible);
        debug!(visibility = ?self.visibility, "visibility changed");
        if visible {
            self.check_and_rebuild(prefs, display_width)?;
            self.run_frame(now, prefs, display_width, canvas)
        } else {
            self.ticker.cancel();
            Ok(())
        }
    }

    pub fn on_surface_destroyed(&mut self) {
        debug!("surface destroyed");
        self.visibility = Visibility::Hidden;
        self.ticker.cancel();
    }

    /// Re-evaluates the configuration right away when visible; otherwise
    /// the next visibility change picks it up.
    pub fn on_preferences_changed<P, C>(
        &mut self,
        now: Instant,
        prefs: &P,
        display_width: f32,
        canvas: Option<&mut C>,
    ) -> Result<(), ConfigError>
    where
        P: Preferences + ?Sized,
        C: Canvas + ?Sized,
    {
        if !self.visibility.is_visible() {
            return Ok(());
        }
        self.check_and_rebuild(prefs, display_width)?;
        self.run_frame(now, prefs, display_width, canvas)
    }

    /// Runs the pending frame if it is due. Returns whether a frame ran.
    pub fn tick<P, C>(
        &mut self,
        now: Instant,
        prefs: &P,
        display_width: f32,
        canvas: Option<&mut C>,
    ) -> Result<bool, ConfigError>
    where
        P: Preferences + ?Sized,
        C: Canvas + ?Sized,
    {
        if !self.ticker.take_due(now) {
            return Ok(false);
        }
        self.run_frame(now, prefs, display_width, canvas)?;
        Ok(true)
    }

    pub fn on_touch<P: Preferences + ?Sized>(&mut self, ev: TouchEvent, prefs: &P) -> bool {
        self.watcher.refresh_touch(prefs);
        let (Some(cfg), Some(theme)) = (self.watcher.config(), self.watcher.theme()) else {
            return false;
        };
        let inserted = self
            .input
            .on_touch(ev, &mut self.pool, cfg, theme, &mut self.rng);
        if inserted {
            trace!(x = ev.x, stripes = self.pool.len(), "stripe inserted from touch");
        }
        inserted
    }

    /// Check, step and paint one frame if a surface is available, then
    /// schedule the next tick while visible.
    fn run_frame<P, C>(
        &mut self,
        now: Instant,
        prefs: &P,
        display_width: f32,
        canvas: Option<&mut C>,
    ) -> Result<(), ConfigError>
    where
        P: Preferences + ?Sized,
        C: Canvas + ?Sized,
    {
        if let Some(canvas) = canvas {
            self.check_and_rebuild(prefs, display_width)?;
            if let Some(cfg) = self.watcher.config() {
                self.pool.step(canvas.width(), cfg, &mut self.rng);
            }
            self.paint(canvas);
            self.frames += 1;
        }

        self.ticker.cancel();
        if self.visibility.is_visible() {
            self.ticker.schedule(now, FRAME_DELAY);
        }
        Ok(())
    }

    /// Backdrop first, then stripes oldest to newest.
    pub fn paint<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        canvas.draw_color(BACKDROP);
        for s in self.pool.stripes() {
            canvas.fill_band(s.left(), s.right(), s.color);
        }
    }
}

#[cfg(test)]
impl RenderLoop {
    pub fn watcher(&self) -> &ConfigWatcher {
        &self.watcher
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.ticker.deadline()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::frame::Frame;
    use crate::input::TouchPhase;
    use crate::prefs::{PrefStore, KEY_THEME, KEY_TOUCH, KEY_WIDTH, KEY_WIDTH_RANGE};
    use crate::runtime::ColorMode;

    #[derive(Default)]
    struct Recorder {
        width: f32,
        ops: Vec<(f32, f32, Rgba)>,
        fills: usize,
    }

    impl Canvas for Recorder {
        fn width(&self) -> f32 {
            self.width
        }

        fn height(&self) -> f32 {
            100.0
        }

        fn draw_color(&mut self, _color: Rgba) {
            self.fills += 1;
            self.ops.clear();
        }

        fn fill_band(&mut self, left: f32, right: f32, color: Rgba) {
            self.ops.push((left, right, color));
        }
    }

    fn engine() -> RenderLoop {
        RenderLoop::new(StdRng::seed_from_u64(42))
    }

    fn recorder() -> Recorder {
        Recorder {
            width: 1000.0,
            ..Recorder::default()
        }
    }

    #[test]
    fn becoming_visible_builds_paints_and_schedules() {
        let prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut canvas = recorder();
        let now = Instant::now();

        r.on_visibility_changed(true, now, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();

        assert_eq!(r.visibility(), Visibility::Visible);
        assert_eq!(r.pool().len(), 200);
        assert_eq!(r.rebuilds(), 1);
        assert_eq!(r.frames(), 1);
        assert_eq!(canvas.fills, 1);
        assert_eq!(canvas.ops.len(), 200);
        assert_eq!(r.next_deadline(), Some(now + FRAME_DELAY));
    }

    #[test]
    fn paint_follows_pool_order() {
        let prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut canvas = recorder();
        r.on_visibility_changed(true, Instant::now(), &prefs, 1000.0, Some(&mut canvas))
            .unwrap();

        let expected: Vec<(f32, f32, Rgba)> = r
            .pool()
            .stripes()
            .iter()
            .map(|s| (s.left(), s.right(), s.color))
            .collect();
        assert_eq!(canvas.ops, expected);
    }

    #[test]
    fn ticks_only_fire_when_due_and_keep_one_pending() {
        let prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut canvas = recorder();
        let t0 = Instant::now();
        r.on_visibility_changed(true, t0, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();

        assert!(!r.tick(t0, &prefs, 1000.0, Some(&mut canvas)).unwrap());
        let t1 = t0 + FRAME_DELAY;
        assert!(r.tick(t1, &prefs, 1000.0, Some(&mut canvas)).unwrap());
        assert_eq!(r.frames(), 2);
        assert_eq!(r.next_deadline(), Some(t1 + FRAME_DELAY));
        assert_eq!(r.rebuilds(), 1);
    }

    #[test]
    fn hiding_cancels_the_pending_tick() {
        let prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut canvas = recorder();
        let t0 = Instant::now();
        r.on_visibility_changed(true, t0, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();
        r.on_visibility_changed(false, t0, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();

        assert_eq!(r.next_deadline(), None);
        assert!(!r
            .tick(t0 + FRAME_DELAY * 10, &prefs, 1000.0, Some(&mut canvas))
            .unwrap());
        assert_eq!(r.frames(), 1);

        r.on_visibility_changed(false, t0, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();
        assert_eq!(r.next_deadline(), None);
    }

    #[test]
    fn surface_destroyed_stops_frames() {
        let prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut canvas = recorder();
        let t0 = Instant::now();
        r.on_visibility_changed(true, t0, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();
        r.on_surface_destroyed();
        assert_eq!(r.visibility(), Visibility::Hidden);
        assert_eq!(r.next_deadline(), None);
    }

    #[test]
    fn missing_surface_skips_painting_but_keeps_ticking() {
        let prefs = PrefStore::in_memory();
        let mut r = engine();
        let t0 = Instant::now();
        r.on_visibility_changed(true, t0, &prefs, 1000.0, None::<&mut Recorder>)
            .unwrap();
        assert_eq!(r.frames(), 0);
        assert_eq!(r.next_deadline(), Some(t0 + FRAME_DELAY));

        assert!(r
            .tick(t0 + FRAME_DELAY, &prefs, 1000.0, None::<&mut Recorder>)
            .unwrap());
        assert_eq!(r.frames(), 0);
        assert!(r.next_deadline().is_some());
    }

    #[test]
    fn theme_change_rebuilds_once_with_new_colors() {
        let mut prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut canvas = recorder();
        let t0 = Instant::now();
        r.on_visibility_changed(true, t0, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();

        prefs.set(KEY_THEME, "sweden");
        let t1 = t0 + FRAME_DELAY;
        r.tick(t1, &prefs, 1000.0, Some(&mut canvas)).unwrap();
        r.tick(t1 + FRAME_DELAY, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();

        assert_eq!(r.rebuilds(), 2);
        assert_eq!(r.pool().len(), 200);
        let theme = r.watcher().theme().unwrap();
        assert_eq!(theme.name, "sweden");
        assert!(r.pool().stripes().iter().all(|s| theme.contains(s.color)));
    }

    #[test]
    fn config_error_is_surfaced() {
        let mut prefs = PrefStore::in_memory();
        prefs.set(KEY_THEME, "atlantis");
        let mut r = engine();
        let err = r
            .on_visibility_changed(true, Instant::now(), &prefs, 1000.0, Some(&mut recorder()))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownTheme("atlantis".to_string()));
    }

    #[test]
    fn preference_change_while_hidden_waits_for_visibility() {
        let mut prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut canvas = recorder();
        let t0 = Instant::now();
        r.check_and_rebuild(&prefs, 1000.0).unwrap();

        prefs.set(KEY_THEME, "japan");
        r.on_preferences_changed(t0, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();
        assert_eq!(r.rebuilds(), 1);

        r.on_visibility_changed(true, t0, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();
        assert_eq!(r.rebuilds(), 2);
        assert_eq!(r.watcher().theme().unwrap().name, "japan");
    }

    #[test]
    fn touch_respects_live_touch_preference() {
        let mut prefs = PrefStore::in_memory();
        let mut r = engine();
        r.check_and_rebuild(&prefs, 1000.0).unwrap();
        let down = TouchEvent {
            phase: TouchPhase::Down,
            x: 500.0,
            y: 0.0,
        };

        let oldest = r.pool().stripes()[0];
        assert!(r.on_touch(down, &prefs));
        assert_eq!(r.pool().len(), 200);
        assert_eq!(r.pool().stripes()[199].center_x, 500.0);
        assert_ne!(r.pool().stripes()[0], oldest);

        prefs.set(KEY_TOUCH, "false");
        assert!(!r.on_touch(down, &prefs));
    }

    #[test]
    fn touch_before_first_check_is_ignored() {
        let prefs = PrefStore::in_memory();
        let mut r = engine();
        let down = TouchEvent {
            phase: TouchPhase::Down,
            x: 1.0,
            y: 0.0,
        };
        assert!(!r.on_touch(down, &prefs));
    }

    #[test]
    fn frames_render_into_a_terminal_frame() {
        let prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut frame = Frame::new(80, 4, 8.0, ColorMode::TrueColor);
        r.on_visibility_changed(true, Instant::now(), &prefs, 640.0, Some(&mut frame))
            .unwrap();
        frame.commit();
        assert!(frame.is_dirty_all());
        assert!(r
            .pool()
            .stripes()
            .iter()
            .all(|s| (0.0..=640.0).contains(&s.center_x)));
    }

    #[test]
    fn preference_change_while_visible_rebuilds_and_paints_now() {
        let mut prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut canvas = recorder();
        let t0 = Instant::now();
        r.on_visibility_changed(true, t0, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();

        prefs.set(KEY_WIDTH, "40");
        let t1 = t0 + Duration::from_millis(1);
        r.on_preferences_changed(t1, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();

        assert_eq!(r.rebuilds(), 2);
        assert_eq!(r.frames(), 2);
        assert_eq!(r.next_deadline(), Some(t1 + FRAME_DELAY));
        assert_eq!(canvas.fills, 2);
        assert!(r
            .pool()
            .stripes()
            .iter()
            .all(|s| s.half_width == 20.0 || s.half_width == 60.0));
    }

    #[test]
    fn width_range_wider_than_width_is_rejected() {
        let mut prefs = PrefStore::in_memory();
        prefs.set(KEY_WIDTH, "10");
        prefs.set(KEY_WIDTH_RANGE, "20");
        let mut r = engine();
        assert!(matches!(
            r.check_and_rebuild(&prefs, 1000.0),
            Err(ConfigError::Invalid { key: KEY_WIDTH, .. })
        ));
        assert!(r.pool().is_empty());

        prefs.set(KEY_WIDTH, "21");
        assert!(r.check_and_rebuild(&prefs, 1000.0).unwrap());
        assert!(r.pool().stripes().iter().all(|s| s.half_width > 0.0));

        let mut canvas = recorder();
        r.paint(&mut canvas);
        assert_eq!(canvas.ops.len(), 200);
        assert!(canvas.ops.iter().all(|&(left, right, _)| left < right));
    }

    #[test]
    fn requested_rebuild_paints_once_while_hidden() {
        let prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut canvas = recorder();
        assert!(!r.rebuild_and_paint(1000.0, Some(&mut canvas)));
        assert_eq!(canvas.fills, 0);

        r.check_and_rebuild(&prefs, 1000.0).unwrap();
        let before = r.pool().stripes().to_vec();
        assert!(r.rebuild_and_paint(1000.0, Some(&mut canvas)));

        assert_eq!(r.rebuilds(), 2);
        assert_eq!(r.frames(), 1);
        assert_eq!(canvas.fills, 1);
        assert_eq!(canvas.ops.len(), 200);
        assert_ne!(r.pool().stripes(), before.as_slice());
        assert_eq!(r.next_deadline(), None);
    }

    #[test]
    fn requested_rebuild_keeps_the_pending_tick() {
        let prefs = PrefStore::in_memory();
        let mut r = engine();
        let mut canvas = recorder();
        let t0 = Instant::now();
        r.on_visibility_changed(true, t0, &prefs, 1000.0, Some(&mut canvas))
            .unwrap();

        assert!(r.rebuild_and_paint(1000.0, None::<&mut Recorder>));
        assert_eq!(r.rebuilds(), 2);
        assert_eq!(r.frames(), 1);
        assert_eq!(r.next_deadline(), Some(t0 + FRAME_DELAY));
    }
}
