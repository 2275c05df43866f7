// Copyright (c) 2026 rezky_nightky

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use rand::Rng;

use crate::palette::Theme;
use crate::pool::StripePool;
use crate::watcher::StripeConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub x: f32,
    pub y: f32,
}

impl TouchEvent {
    /// Maps a terminal mouse event to pixel coordinates, using the center
    /// of the cell under the pointer. Scroll and other events yield `None`.
    pub fn from_mouse(ev: &MouseEvent, px_per_col: f32) -> Option<Self> {
        let phase = match ev.kind {
            MouseEventKind::Down(MouseButton::Left) => TouchPhase::Down,
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => TouchPhase::Move,
            MouseEventKind::Up(MouseButton::Left) => TouchPhase::Up,
            _ => return None,
        };
        Some(Self {
            phase,
            x: (ev.column as f32 + 0.5) * px_per_col,
            y: (ev.row as f32 + 0.5) * px_per_col,
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InputHandler;

impl InputHandler {
    /// Inserts a stripe at the touch position on touch-down.
    ///
    /// Returns whether the pool changed.
    pub fn on_touch<R: Rng + ?Sized>(
        &self,
        ev: TouchEvent,
        pool: &mut StripePool,
        cfg: &StripeConfig,
        theme: &Theme,
        rng: &mut R,
    ) -> bool {
        if ev.phase != TouchPhase::Down || !cfg.touch_enabled {
            return false;
        }
        pool.insert_from_touch(ev.x, cfg, theme, rng)
    }
}
