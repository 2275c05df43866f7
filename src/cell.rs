// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::palette::{shade_glyph, term_color, Rgba};
use crate::runtime::ColorMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub bg: Option<Color>,
}

impl Cell {
    pub const BLANK: Cell = Cell { ch: ' ', bg: None };

    /// Resolves a pixel color to what the terminal can show in `mode`.
    pub fn from_rgba(c: Rgba, mode: ColorMode) -> Self {
        match mode {
            ColorMode::Mono => Self {
                ch: shade_glyph(c),
                bg: None,
            },
            _ => Self {
                ch: ' ',
                bg: term_color(c, mode),
            },
        }
    }
}
