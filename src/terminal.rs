// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;

/// Consecutive changed cells on one row sharing the same style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Run {
    x: u16,
    y: u16,
    start: usize,
    len: usize,
}

fn same_style(a: &Cell, b: &Cell) -> bool {
    a.fg == b.fg && a.bg == b.bg && a.bold == b.bold
}

/// Cells of `frame` that differ from `last`, batched into printable runs.
fn changed_runs(last: &[Cell], frame: &Frame) -> Vec<Run> {
    let width = frame.width as usize;
    let mut runs = Vec::new();
    for y in 0..frame.height {
        let row = y as usize * width;
        let mut x = 0usize;
        while x < width {
            let idx = row + x;
            let cell = frame.cell_at_index(idx);
            if last.get(idx) == Some(&cell) {
                x += 1;
                continue;
            }
            let mut len = 1;
            while x + len < width {
                let next = frame.cell_at_index(idx + len);
                if last.get(idx + len) == Some(&next) || !same_style(&cell, &next) {
                    break;
                }
                len += 1;
            }
            runs.push(Run {
                x: x as u16,
                y,
                start: idx,
                len,
            });
            x += len;
        }
    }
    runs
}

pub struct Terminal {
    stdout: Stdout,
    mouse: bool,
    last: Vec<Cell>,
    last_size: Option<(u16, u16)>,
    run_buf: String,
}

impl Terminal {
    pub fn new(mouse: bool) -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            if mouse {
                out.execute(event::EnableMouseCapture)?;
            }
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            mouse,
            last: Vec::new(),
            last_size: None,
            run_buf: String::with_capacity(64),
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

    fn queue_style(&mut self, cell: &Cell, cur: &mut Option<Cell>) -> Result<()> {
        let prev = *cur;
        if prev.map(|c| c.fg) != Some(cell.fg) {
            self.stdout
                .queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
        }
        if prev.map(|c| c.bg) != Some(cell.bg) {
            self.stdout
                .queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
        }
        if prev.map(|c| c.bold) != Some(cell.bold) {
            self.stdout.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
        }
        *cur = Some(*cell);
        Ok(())
    }

    /// Prints only the cells that changed since the previous draw.
    /// Returns how many runs were written.
    pub fn draw(&mut self, frame: &Frame) -> Result<usize> {
        let size = (frame.width, frame.height);
        if self.last_size != Some(size) {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            // Nothing on screen matches any cell, so every cell is printed.
            self.last.clear();
            self.last_size = Some(size);
        }

        let runs = changed_runs(&self.last, frame);
        let mut style: Option<Cell> = None;
        let mut cur_pos: Option<(u16, u16)> = None;

        for run in &runs {
            let first = frame.cell_at_index(run.start);
            self.run_buf.clear();
            for i in run.start..run.start + run.len {
                self.run_buf.push(frame.cell_at_index(i).ch);
            }
            if cur_pos != Some((run.x, run.y)) {
                self.stdout.queue(cursor::MoveTo(run.x, run.y))?;
            }
            self.queue_style(&first, &mut style)?;
            self.stdout.queue(Print(self.run_buf.as_str()))?;
            let next_x = run.x.saturating_add(run.len as u16);
            cur_pos = (next_x < frame.width).then_some((next_x, run.y));
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;

        let len = frame.width as usize * frame.height as usize;
        self.last.clear();
        self.last.extend((0..len).map(|i| frame.cell_at_index(i)));
        Ok(runs.len())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.mouse {
            let _ = self.stdout.execute(event::DisableMouseCapture);
        }
        restore_terminal_best_effort();
    }
}

/// Leaves the alternate screen and raw mode without reporting errors.
/// Safe to call from panic hooks and signal handlers.
pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(event::DisableMouseCapture);
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(ch: char, fg: Color) -> Cell {
        Cell {
            ch,
            fg: Some(fg),
            bg: None,
            bold: false,
        }
    }

    fn snapshot(frame: &Frame) -> Vec<Cell> {
        (0..frame.width as usize * frame.height as usize)
            .map(|i| frame.cell_at_index(i))
            .collect()
    }

    #[test]
    fn first_draw_covers_every_cell() {
        let frame = Frame::new(4, 2, None);
        let runs = changed_runs(&[], &frame);
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|r| r.len == 4));
    }

    #[test]
    fn unchanged_frame_prints_nothing() {
        let mut frame = Frame::new(3, 3, None);
        frame.set(1, 1, lit('x', Color::Red));
        let last = snapshot(&frame);
        assert!(changed_runs(&last, &frame).is_empty());
    }

    #[test]
    fn runs_split_on_style_changes() {
        let frame = Frame::new(6, 1, None);
        let last = snapshot(&frame);
        let mut next = frame.clone();
        next.set(1, 0, lit('a', Color::Red));
        next.set(2, 0, lit('b', Color::Red));
        next.set(3, 0, lit('c', Color::Blue));
        next.set(5, 0, lit('d', Color::Blue));

        let runs = changed_runs(&last, &next);
        assert_eq!(
            runs,
            vec![
                Run {
                    x: 1,
                    y: 0,
                    start: 1,
                    len: 2
                },
                Run {
                    x: 3,
                    y: 0,
                    start: 3,
                    len: 1
                },
                Run {
                    x: 5,
                    y: 0,
                    start: 5,
                    len: 1
                },
            ]
        );
    }
}
