// Copyright (c) 2026 rezky_nightky

use glam::Vec2;

use crate::cell::Cell;
use crate::frame::Frame;
use crate::palette::terminal_color;
use crate::runtime::ColorMode;
use crate::surface::{Rgba, Surface};

/// Scaled light below this stays invisible when painted into a frame.
const VISIBLE_FLOOR: f32 = 0.06;
/// Light below this is treated as fully faded and frees the texel.
const FADED: f32 = 1.0 / 255.0;
const BOLD_FROM: f32 = 0.85;
const MAX_LINE_STEPS: usize = 4096;

/// What put the glyph into a texel. Higher marks win the glyph slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Mark {
    Empty,
    Line,
    Dot,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Texel {
    pub light: [f32; 3],
    pub glyph: char,
    pub mark: Mark,
}

impl Texel {
    const EMPTY: Texel = Texel {
        light: [0.0; 3],
        glyph: ' ',
        mark: Mark::Empty,
    };

    fn peak(&self) -> f32 {
        self.light[0].max(self.light[1]).max(self.light[2])
    }
}

/// Virtual pixels covered by one terminal cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellMetrics {
    pub width: f32,
    pub height: f32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            width: 8.0,
            height: 16.0,
        }
    }
}

/// Pixel-addressed surface rasterised onto a grid of terminal cells.
#[derive(Clone, Debug)]
pub struct Canvas {
    metrics: CellMetrics,
    width: u32,
    height: u32,
    cols: u16,
    rows: u16,
    texels: Vec<Texel>,
    alpha: f32,
}

impl Canvas {
    pub fn new(metrics: CellMetrics) -> Self {
        Self {
            metrics,
            width: 0,
            height: 0,
            cols: 0,
            rows: 0,
            texels: Vec::new(),
            alpha: 1.0,
        }
    }

    #[cfg(test)]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    #[cfg(test)]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    #[cfg(test)]
    pub fn texel(&self, col: u16, row: u16) -> Option<&Texel> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.texels
            .get(row as usize * self.cols as usize + col as usize)
    }

    fn cell_index(&self, p: Vec2) -> Option<usize> {
        if !p.is_finite() || p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        if p.x >= self.width as f32 || p.y >= self.height as f32 {
            return None;
        }
        let col = ((p.x / self.metrics.width) as usize).min(self.cols as usize - 1);
        let row = ((p.y / self.metrics.height) as usize).min(self.rows as usize - 1);
        Some(row * self.cols as usize + col)
    }

    fn blend(&mut self, i: usize, color: Rgba) {
        let a = (color.a * self.alpha).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let rgb = color.rgb_unit();
        let t = &mut self.texels[i];
        for (l, c) in t.light.iter_mut().zip(rgb) {
            *l = *l * (1.0 - a) + c * a;
        }
        if t.mark != Mark::Empty && t.peak() < FADED {
            *t = Texel::EMPTY;
        }
    }

    fn place(&mut self, i: usize, glyph: char, mark: Mark, color: Rgba) {
        if (color.a * self.alpha) <= 0.0 {
            return;
        }
        self.blend(i, color);
        let t = &mut self.texels[i];
        if mark >= t.mark {
            t.glyph = glyph;
            t.mark = mark;
        }
    }

    /// Copies every visible texel into `frame`, scaled by `opacity * gain`.
    pub fn paint_into(&self, frame: &mut Frame, opacity: f32, gain: f32, mode: ColorMode) {
        let scale = (opacity * gain).max(0.0);
        let rows = self.rows.min(frame.height);
        let cols = self.cols.min(frame.width);
        for row in 0..rows {
            for col in 0..cols {
                let t = &self.texels[row as usize * self.cols as usize + col as usize];
                if t.mark == Mark::Empty {
                    continue;
                }
                let light = t.light.map(|v| (v * scale).min(1.0));
                let peak = light[0].max(light[1]).max(light[2]);
                if peak < VISIBLE_FLOOR {
                    continue;
                }
                frame.set(
                    col,
                    row,
                    Cell {
                        ch: t.glyph,
                        fg: terminal_color(light, mode),
                        bg: frame.bg(),
                        bold: peak >= BOLD_FROM,
                    },
                );
            }
        }
    }
}

fn dot_glyph(radius: f32) -> char {
    if radius < 1.0 {
        '·'
    } else if radius < 2.0 {
        '•'
    } else {
        '●'
    }
}

fn slope_glyph(dx: f32, dy: f32, heavy: bool) -> char {
    if dy.abs() < dx.abs() * 0.5 {
        if heavy {
            '━'
        } else {
            '─'
        }
    } else if dx.abs() < dy.abs() * 0.5 {
        if heavy {
            '┃'
        } else {
            '│'
        }
    } else if (dx > 0.0) == (dy > 0.0) {
        '╲'
    } else {
        '╱'
    }
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        let cols = (width as f32 / self.metrics.width).ceil();
        let rows = (height as f32 / self.metrics.height).ceil();
        self.cols = cols.clamp(0.0, u16::MAX as f32) as u16;
        self.rows = rows.clamp(0.0, u16::MAX as f32) as u16;
        if self.cols == 0 || self.rows == 0 {
            self.cols = 0;
            self.rows = 0;
            self.width = 0;
            self.height = 0;
        } else {
            self.width = width;
            self.height = height;
        }
        self.texels.clear();
        self.texels
            .resize(self.cols as usize * self.rows as usize, Texel::EMPTY);
    }

    fn clear(&mut self) {
        self.texels.fill(Texel::EMPTY);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        if self.is_empty() || !(w > 0.0 && h > 0.0) || !x.is_finite() || !y.is_finite() {
            return;
        }
        let x0 = x.max(0.0);
        let y0 = y.max(0.0);
        let x1 = (x + w).min(self.width as f32);
        let y1 = (y + h).min(self.height as f32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let c0 = (x0 / self.metrics.width) as usize;
        let r0 = (y0 / self.metrics.height) as usize;
        let c1 = ((x1 / self.metrics.width).ceil() as usize).min(self.cols as usize);
        let r1 = ((y1 / self.metrics.height).ceil() as usize).min(self.rows as usize);
        for row in r0..r1 {
            for col in c0..c1 {
                self.blend(row * self.cols as usize + col, color);
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if self.is_empty() || !(radius > 0.0) {
            return;
        }
        let glyph = dot_glyph(radius);
        if let Some(i) = self.cell_index(center) {
            self.place(i, glyph, Mark::Dot, color);
        }
        if radius < self.metrics.width.min(self.metrics.height) * 0.5 {
            return;
        }

        let (mw, mh) = (self.metrics.width, self.metrics.height);
        let c0 = ((center.x - radius) / mw).floor().max(0.0) as usize;
        let r0 = ((center.y - radius) / mh).floor().max(0.0) as usize;
        let c1 = (((center.x + radius) / mw).ceil().max(0.0) as usize).min(self.cols as usize);
        let r1 = (((center.y + radius) / mh).ceil().max(0.0) as usize).min(self.rows as usize);
        let home = self.cell_index(center);
        for row in r0..r1 {
            for col in c0..c1 {
                let i = row * self.cols as usize + col;
                if Some(i) == home {
                    continue;
                }
                let mid = Vec2::new((col as f32 + 0.5) * mw, (row as f32 + 0.5) * mh);
                if mid.distance(center) <= radius {
                    self.place(i, glyph, Mark::Dot, color);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        if self.is_empty() || !(width > 0.0) || !from.is_finite() || !to.is_finite() {
            return;
        }
        let span = to - from;
        let dc = span.x / self.metrics.width;
        let dr = span.y / self.metrics.height;
        let steps = (dc.abs().max(dr.abs()).ceil() as usize).min(MAX_LINE_STEPS);
        let glyph = slope_glyph(dc, dr, width >= 1.0);

        let mut last = None;
        for s in 0..=steps {
            let t = if steps == 0 {
                0.0
            } else {
                s as f32 / steps as f32
            };
            let Some(i) = self.cell_index(from + span * t) else {
                continue;
            };
            if last == Some(i) {
                continue;
            }
            last = Some(i);
            self.place(i, glyph, Mark::Line, color);
        }
    }

    fn fill_glyph(&mut self, glyph: char, at: Vec2, size: f32, color: Rgba) {
        if self.is_empty() || !(size > 0.0) {
            return;
        }
        // Baseline anchored; the box spans `at.y - size .. at.y`.
        let sample = Vec2::new(at.x + size * 0.3, at.y - size * 0.5);
        if let Some(i) = self.cell_index(sample) {
            self.place(i, glyph, Mark::Text, color);
        }
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            1.0
        };
    }
}
