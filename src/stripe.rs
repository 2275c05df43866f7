// Copyright (c) 2026 rezky_nightky

use rand::Rng;

use crate::palette::{Rgba, Theme};
use crate::watcher::StripeConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stripe {
    pub center_x: f32,
    pub half_width: f32,
    pub color: Rgba,
    pub velocity: f32,
}

/// `base ± jitter`, decided by one fair coin.
pub fn jittered<R: Rng + ?Sized>(rng: &mut R, base: f32, jitter: f32) -> f32 {
    if rng.random_bool(0.5) {
        base - jitter
    } else {
        base + jitter
    }
}

/// Rebound speed magnitude: a fresh `base_speed ± speed_jitter` draw.
pub fn rebound_speed<R: Rng + ?Sized>(rng: &mut R, cfg: &StripeConfig) -> f32 {
    jittered(rng, cfg.base_speed, cfg.speed_jitter)
}

impl Stripe {
    /// Creates a stripe at `center_x` with a freshly drawn width, velocity and color.
    ///
    /// Width and velocity magnitude each take their own coin flip, and the
    /// velocity direction takes a third one.
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        center_x: f32,
        cfg: &StripeConfig,
        theme: &Theme,
    ) -> Self {
        let mut velocity = rebound_speed(rng, cfg);
        if rng.random_bool(0.5) {
            velocity = -velocity;
        }
        let half_width = jittered(rng, cfg.base_width, cfg.width_jitter);
        Self {
            center_x,
            half_width,
            color: theme.pick_random(rng),
            velocity,
        }
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.half_width
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.half_width
    }
}
