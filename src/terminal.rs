// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor,
    event::{self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor},
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;

struct LastFrame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl LastFrame {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; width as usize * height as usize],
        }
    }
}

/// The terminal as a drawable surface: raw mode, alternate screen, mouse
/// presses and focus changes enabled for the lifetime of the value.
pub struct Terminal {
    stdout: Stdout,
    last: Option<LastFrame>,
    run_buf: String,
    row_dirty: Vec<Vec<usize>>,
    touched_rows: Vec<u16>,
}

fn restore(out: &mut Stdout) {
    let _ = out.execute(DisableFocusChange);
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(EnableMouseCapture)?;
            let _ = out.execute(EnableFocusChange);
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore(&mut out);
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            last: None,
            run_buf: String::with_capacity(256),
            row_dirty: Vec::new(),
            touched_rows: Vec::new(),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    fn set_bg(&mut self, bg: Option<Color>) -> Result<()> {
        self.stdout
            .queue(SetBackgroundColor(bg.unwrap_or(Color::Reset)))?;
        Ok(())
    }

    /// Writes the changed cells of `frame` and clears its dirty state.
    pub fn present(&mut self, frame: &mut Frame) -> Result<()> {
        let size_changed = self
            .last
            .as_ref()
            .map(|l| l.width != frame.width || l.height != frame.height)
            .unwrap_or(true);
        if size_changed {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.last = Some(LastFrame::new(frame.width, frame.height));
        }

        let total_cells = frame.width as usize * frame.height as usize;
        let dirty_is_large = total_cells > 0 && frame.dirty_indices().len() >= total_cells / 3;
        if size_changed || frame.is_dirty_all() || dirty_is_large {
            self.redraw_all(frame)?;
        } else {
            self.redraw_dirty(frame)?;
        }

        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }

    fn redraw_all(&mut self, frame: &Frame) -> Result<()> {
        let mut cur_bg: Option<Option<Color>> = None;
        for y in 0..frame.height {
            self.stdout.queue(cursor::MoveTo(0, y))?;
            self.run_buf.clear();
            for x in 0..frame.width {
                let idx = y as usize * frame.width as usize + x as usize;
                let cell = frame.cell_at_index(idx);
                if cur_bg != Some(cell.bg) {
                    if !self.run_buf.is_empty() {
                        self.stdout.queue(Print(self.run_buf.as_str()))?;
                        self.run_buf.clear();
                    }
                    self.set_bg(cell.bg)?;
                    cur_bg = Some(cell.bg);
                }
                self.run_buf.push(cell.ch);
                if let Some(last) = self.last.as_mut() {
                    last.cells[idx] = cell;
                }
            }
            if !self.run_buf.is_empty() {
                self.stdout.queue(Print(self.run_buf.as_str()))?;
            }
        }
        Ok(())
    }

    fn redraw_dirty(&mut self, frame: &Frame) -> Result<()> {
        let width = frame.width as usize;
        if self.row_dirty.len() != frame.height as usize {
            self.row_dirty = vec![Vec::new(); frame.height as usize];
        }
        for r in &mut self.row_dirty {
            r.clear();
        }
        self.touched_rows.clear();

        for &idx in frame.dirty_indices() {
            let y = idx / width;
            if y >= frame.height as usize {
                continue;
            }
            if self.row_dirty[y].is_empty() {
                self.touched_rows.push(y as u16);
            }
            self.row_dirty[y].push(idx);
        }
        self.touched_rows.sort_unstable();

        let mut cur_bg: Option<Option<Color>> = None;
        let mut cur_pos: Option<(u16, u16)> = None;
        let rows = std::mem::take(&mut self.touched_rows);
        for &y in &rows {
            let mut row = std::mem::take(&mut self.row_dirty[y as usize]);
            row.sort_unstable();

            let mut i = 0usize;
            while i < row.len() {
                let idx0 = row[i];
                let cell0 = frame.cell_at_index(idx0);
                let Some(last) = self.last.as_mut() else {
                    return Ok(());
                };
                if last.cells[idx0] == cell0 {
                    i += 1;
                    continue;
                }
                last.cells[idx0] = cell0;

                self.run_buf.clear();
                self.run_buf.push(cell0.ch);
                let mut end = idx0;
                let mut j = i + 1;
                while j < row.len() && row[j] == end + 1 {
                    let cell1 = frame.cell_at_index(row[j]);
                    if cell1.bg != cell0.bg || last.cells[row[j]] == cell1 {
                        break;
                    }
                    last.cells[row[j]] = cell1;
                    self.run_buf.push(cell1.ch);
                    end = row[j];
                    j += 1;
                }

                let x0 = (idx0 % width) as u16;
                if cur_pos != Some((x0, y)) {
                    self.stdout.queue(cursor::MoveTo(x0, y))?;
                }
                if cur_bg != Some(cell0.bg) {
                    self.set_bg(cell0.bg)?;
                    cur_bg = Some(cell0.bg);
                }
                self.stdout.queue(Print(self.run_buf.as_str()))?;

                let next_x = (end % width) as u16 + 1;
                cur_pos = (next_x < frame.width).then_some((next_x, y));
                i = j;
            }
            row.clear();
            self.row_dirty[y as usize] = row;
        }
        self.touched_rows = rows;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore(&mut self.stdout);
    }
}

pub fn restore_terminal_best_effort() {
    restore(&mut stdout());
}
