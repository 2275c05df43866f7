// Copyright (c) 2026 rezky_nightky

use rand::Rng;

use crate::palette::Theme;
use crate::stripe::{rebound_speed, Stripe};
use crate::watcher::StripeConfig;

/// Extra leftward speed added when a stripe leaves the left edge and its
/// fresh rebound draw already points left.
pub const LEFT_EDGE_KICK: f32 = 1.0;

/// Live stripes, oldest first.
#[derive(Clone, Debug, Default)]
pub struct StripePool {
    stripes: Vec<Stripe>,
}

impl StripePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stripes(&self) -> &[Stripe] {
        &self.stripes
    }

    pub fn len(&self) -> usize {
        self.stripes.len()
    }

    /// Replaces the whole population with `capacity` stripes spread
    /// uniformly over `[0, display_width)`.
    pub fn rebuild<R: Rng + ?Sized>(
        &mut self,
        capacity: usize,
        display_width: f32,
        cfg: &StripeConfig,
        theme: &Theme,
        rng: &mut R,
    ) {
        self.stripes.clear();
        self.stripes.reserve(capacity);
        for _ in 0..capacity {
            let x = if display_width > 0.0 {
                rng.random_range(0.0..display_width)
            } else {
                0.0
            };
            self.stripes.push(Stripe::spawn(rng, x, cfg, theme));
        }
    }

    /// Appends a stripe centered at `x` and evicts the oldest entries past
    /// `cfg.pool_capacity`. Returns whether a stripe was added.
    pub fn insert_from_touch<R: Rng + ?Sized>(
        &mut self,
        x: f32,
        cfg: &StripeConfig,
        theme: &Theme,
        rng: &mut R,
    ) -> bool {
        if !cfg.touch_enabled {
            return false;
        }
        self.stripes.push(Stripe::spawn(rng, x, cfg, theme));
        let excess = self.stripes.len().saturating_sub(cfg.pool_capacity);
        if excess > 0 {
            self.stripes.drain(..excess);
        }
        true
    }

    /// Advances every stripe by its velocity and bounces it off the edges.
    ///
    /// The right edge always sends the stripe back left. The left edge keeps
    /// the fresh draw when it is positive and only kicks it further left
    /// when it is negative, so a left-edge rebound may keep drifting left
    /// and be clamped again on the next step.
    pub fn step<R: Rng + ?Sized>(&mut self, surface_width: f32, cfg: &StripeConfig, rng: &mut R) {
        for s in &mut self.stripes {
            s.center_x += s.velocity;
            if s.center_x > surface_width {
                s.center_x = surface_width;
                let v = rebound_speed(rng, cfg);
                s.velocity = if v > 0.0 { -v } else { v };
            } else if s.center_x < 0.0 {
                s.center_x = 0.0;
                let v = rebound_speed(rng, cfg);
                s.velocity = if v < 0.0 { v - LEFT_EDGE_KICK } else { v };
            }
        }
    }
}

#[cfg(test)]
impl StripePool {
    pub fn is_empty(&self) -> bool {
        self.stripes.is_empty()
    }
}
