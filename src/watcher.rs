// Copyright (c) 2026 rezky_nightky

use tracing::debug;

use crate::error::ConfigError;
use crate::palette::{resolve, Theme, DEFAULT_THEME};
use crate::prefs::{
    Preferences, KEY_SPEED, KEY_SPEED_RANGE, KEY_THEME, KEY_TOUCH, KEY_WIDTH, KEY_WIDTH_RANGE,
};

pub const POOL_CAPACITY: usize = 200;

/// Raw speed preferences are divided by this before use.
pub const SPEED_DIVISOR: f32 = 50.0;

#[derive(Clone, Debug, PartialEq)]
pub struct StripeConfig {
    pub theme_name: String,
    pub base_width: f32,
    pub width_jitter: f32,
    pub base_speed: f32,
    pub speed_jitter: f32,
    pub touch_enabled: bool,
    pub pool_capacity: usize,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            theme_name: DEFAULT_THEME.to_string(),
            base_width: 50.0,
            width_jitter: 20.0,
            base_speed: 1.0 / SPEED_DIVISOR,
            speed_jitter: 2.0 / SPEED_DIVISOR,
            touch_enabled: true,
            pool_capacity: POOL_CAPACITY,
        }
    }
}

impl StripeConfig {
    /// Reads a full snapshot from `prefs` without touching any cache.
    pub fn read<P: Preferences + ?Sized>(prefs: &P) -> Result<Self, ConfigError> {
        let theme_name = prefs.get_string(KEY_THEME, DEFAULT_THEME).trim().to_string();
        let base_width = read_number(prefs, KEY_WIDTH, "50")?;
        let width_jitter = read_jitter(prefs, KEY_WIDTH_RANGE, "20")?;
        if base_width - width_jitter <= 0.0 {
            return Err(ConfigError::Invalid {
                key: KEY_WIDTH,
                value: base_width,
                reason: "must be larger than the width range",
            });
        }
        let base_speed = read_number(prefs, KEY_SPEED, "1")? / SPEED_DIVISOR;
        let speed_jitter = read_jitter(prefs, KEY_SPEED_RANGE, "2")? / SPEED_DIVISOR;

        Ok(Self {
            theme_name,
            base_width,
            width_jitter,
            base_speed,
            speed_jitter,
            touch_enabled: prefs.get_bool(KEY_TOUCH, true),
            pool_capacity: POOL_CAPACITY,
        })
    }

    /// True when a rebuild-relevant field differs. Touch and capacity are ignored.
    fn differs_from(&self, other: &StripeConfig) -> bool {
        !self.theme_name.eq_ignore_ascii_case(&other.theme_name)
            || self.base_width != other.base_width
            || self.width_jitter != other.width_jitter
            || self.base_speed != other.base_speed
            || self.speed_jitter != other.speed_jitter
    }
}

fn read_number<P: Preferences + ?Sized>(
    prefs: &P,
    key: &'static str,
    default: &str,
) -> Result<f32, ConfigError> {
    let raw = prefs.get_string(key, default);
    let v: f32 = raw.trim().parse().map_err(|_| ConfigError::Parse {
        key,
        value: raw.to_string(),
    })?;
    if !v.is_finite() {
        return Err(ConfigError::Invalid {
            key,
            value: v,
            reason: "must be a finite number",
        });
    }
    Ok(v)
}

fn read_jitter<P: Preferences + ?Sized>(
    prefs: &P,
    key: &'static str,
    default: &str,
) -> Result<f32, ConfigError> {
    let v = read_number(prefs, key, default)?;
    if v < 0.0 {
        return Err(ConfigError::Invalid {
            key,
            value: v,
            reason: "must not be negative",
        });
    }
    Ok(v)
}

/// Caches the last applied configuration and reports when a rebuild is due.
#[derive(Debug, Default)]
pub struct ConfigWatcher {
    current: Option<StripeConfig>,
    theme: Option<Theme>,
}

impl ConfigWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares the live preferences against the cache.
    ///
    /// Returns `Ok(true)` on the first call and whenever theme, width, width
    /// range, speed or speed range changed. A failed check leaves the cache
    /// untouched.
    pub fn check<P: Preferences + ?Sized>(&mut self, prefs: &P) -> Result<bool, ConfigError> {
        let fresh = StripeConfig::read(prefs)?;

        let theme_changed = match &self.current {
            Some(cur) => !cur.theme_name.eq_ignore_ascii_case(&fresh.theme_name),
            None => true,
        };
        let theme = if theme_changed || self.theme.is_none() {
            Some(resolve(&fresh.theme_name)?)
        } else {
            None
        };

        let changed = self
            .current
            .as_ref()
            .map_or(true, |cur| fresh.differs_from(cur));
        if let Some(t) = theme {
            debug!(theme = t.name, colors = t.colors.len(), "palette resolved");
            self.theme = Some(t);
        }
        if changed {
            debug!(?fresh, "configuration changed");
            self.current = Some(fresh);
        } else if let Some(cur) = &mut self.current {
            cur.touch_enabled = fresh.touch_enabled;
        }
        Ok(changed)
    }

    /// Refreshes the touch flag without requesting a rebuild.
    pub fn refresh_touch<P: Preferences + ?Sized>(&mut self, prefs: &P) {
        if let Some(cur) = &mut self.current {
            cur.touch_enabled = prefs.get_bool(KEY_TOUCH, true);
        }
    }

    pub fn config(&self) -> Option<&StripeConfig> {
        self.current.as_ref()
    }

    pub fn theme(&self) -> Option<&Theme> {
        self.theme.as_ref()
    }
}
