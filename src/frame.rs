// Copyright (c) 2026 rezky_nightky

use crate::cell::Cell;
use crate::palette::Rgba;
use crate::runtime::ColorMode;

/// Drawing surface measured in device pixels.
pub trait Canvas {
    fn width(&self) -> f32;
    fn height(&self) -> f32;

    /// Fills the whole surface.
    fn draw_color(&mut self, color: Rgba);

    /// Fills the full-height band `[left, right)`.
    fn fill_band(&mut self, left: f32, right: f32, color: Rgba);
}

/// Terminal-backed canvas.
///
/// Painting goes into one color per column. [`Frame::commit`] resolves the
/// columns to cells and records which cells changed since the last commit.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    px_per_col: f32,
    mode: ColorMode,
    columns: Vec<Rgba>,
    cells: Vec<Cell>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, px_per_col: f32, mode: ColorMode) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            px_per_col: px_per_col.max(1.0),
            mode,
            columns: vec![Rgba::BLACK; width as usize],
            cells: vec![Cell::BLANK; len],
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    pub fn px_per_col(&self) -> f32 {
        self.px_per_col
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }

        for &i in &self.dirty {
            if let Some(v) = self.dirty_map.get_mut(i) {
                *v = false;
            }
        }
        self.dirty.clear();
    }

    pub fn force_redraw(&mut self) {
        self.dirty_all = true;
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or(Cell::BLANK)
    }

    fn set(&mut self, i: usize, cell: Cell) {
        if self.cells[i] == cell {
            return;
        }
        self.cells[i] = cell;
        if !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }

    /// Resolves painted columns into cells.
    pub fn commit(&mut self) {
        let w = self.width as usize;
        for x in 0..w {
            let cell = Cell::from_rgba(self.columns[x], self.mode);
            for y in 0..self.height as usize {
                self.set(y * w + x, cell);
            }
        }
    }
}

impl Canvas for Frame {
    fn width(&self) -> f32 {
        self.width as f32 * self.px_per_col
    }

    fn height(&self) -> f32 {
        self.height as f32 * self.px_per_col
    }

    fn draw_color(&mut self, color: Rgba) {
        for c in &mut self.columns {
            *c = color.over(*c);
        }
    }

    /// Edges may arrive in either order; the band spans `[min, max)`.
    fn fill_band(&mut self, left: f32, right: f32, color: Rgba) {
        let (left, right) = if left <= right {
            (left, right)
        } else {
            (right, left)
        };
        if left.is_nan() || right.is_nan() || right <= left || self.columns.is_empty() {
            return;
        }
        let ppc = self.px_per_col;
        let last = self.columns.len() - 1;
        let first_col = (left / ppc).floor().max(0.0) as usize;
        let last_col = ((right / ppc).ceil() as usize).min(last + 1);

        for x in first_col..last_col {
            let x0 = x as f32 * ppc;
            let covered = right.min(x0 + ppc) - left.max(x0);
            if covered <= 0.0 {
                continue;
            }
            let coverage = (covered / ppc).min(1.0);
            let src = Rgba {
                a: (color.a as f32 * coverage).round() as u8,
                ..color
            };
            self.columns[x] = src.over(self.columns[x]);
        }
    }
}

#[cfg(test)]
impl Frame {
    /// Pixel x of the center of terminal column `col`.
    pub fn col_center_px(&self, col: u16) -> f32 {
        (col as f32 + 0.5) * self.px_per_col
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn column_color(&self, x: u16) -> Option<Rgba> {
        self.columns.get(x as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::opaque(255, 0, 0);
    const BLUE: Rgba = Rgba::opaque(0, 0, 255);

    fn frame() -> Frame {
        Frame::new(10, 3, 10.0, ColorMode::TrueColor)
    }

    #[test]
    fn size_is_reported_in_pixels() {
        let f = frame();
        assert_eq!(f.width(), 100.0);
        assert_eq!(f.height(), 30.0);
        assert_eq!(f.col_center_px(2), 25.0);
    }

    #[test]
    fn band_covers_whole_columns() {
        let mut f = frame();
        f.draw_color(Rgba::BLACK);
        f.fill_band(20.0, 50.0, RED);
        let painted: Vec<bool> = (0..10).map(|x| f.column_color(x) == Some(RED)).collect();
        assert_eq!(
            painted,
            vec![false, false, true, true, true, false, false, false, false, false]
        );
    }

    #[test]
    fn partial_coverage_blends_with_backdrop() {
        let mut f = frame();
        f.draw_color(Rgba::BLACK);
        f.fill_band(15.0, 20.0, RED);
        assert_eq!(f.column_color(1), Some(Rgba::opaque(128, 0, 0)));
    }

    #[test]
    fn later_band_wins_where_they_overlap() {
        let mut f = frame();
        f.draw_color(Rgba::BLACK);
        f.fill_band(0.0, 40.0, RED);
        f.fill_band(20.0, 60.0, BLUE);
        assert_eq!(f.column_color(1), Some(RED));
        assert_eq!(f.column_color(2), Some(BLUE));
        assert_eq!(f.column_color(5), Some(BLUE));
    }

    #[test]
    fn bands_outside_the_surface_are_clipped() {
        let mut f = frame();
        f.draw_color(Rgba::BLACK);
        f.fill_band(-500.0, 5.0, RED);
        f.fill_band(95.0, 800.0, BLUE);
        f.fill_band(30.0, 30.0, RED);
        assert_eq!(f.column_color(0), Some(Rgba::opaque(128, 0, 0)));
        assert_eq!(f.column_color(9), Some(Rgba::opaque(0, 0, 128)));
        assert_eq!(f.column_color(3), Some(Rgba::BLACK));
    }

    #[test]
    fn reversed_edges_paint_the_same_band() {
        let mut f = frame();
        f.draw_color(Rgba::BLACK);
        f.fill_band(50.0, 20.0, RED);
        let painted: Vec<u16> = (0..10).filter(|&x| f.column_color(x) == Some(RED)).collect();
        assert_eq!(painted, vec![2, 3, 4]);

        f.fill_band(f32::NAN, 40.0, BLUE);
        assert_eq!(f.column_color(0), Some(Rgba::BLACK));
    }

    #[test]
    fn commit_marks_only_changed_cells_dirty() {
        let mut f = frame();
        f.draw_color(Rgba::BLACK);
        f.commit();
        assert!(f.is_dirty_all());
        f.clear_dirty();

        f.commit();
        assert!(f.dirty_indices().is_empty());

        f.fill_band(0.0, 10.0, RED);
        f.commit();
        let mut dirty = f.dirty_indices().to_vec();
        dirty.sort_unstable();
        assert_eq!(dirty, vec![0, 10, 20]);
        assert_eq!(f.get(0, 2).unwrap().bg, Some(crossterm::style::Color::Rgb { r: 255, g: 0, b: 0 }));
    }
}
