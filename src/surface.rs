// Copyright (c) 2026 rezky_nightky

use glam::Vec2;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 1.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Parses `#rgb` / `#rrggbb` (leading `#` optional).
    pub fn hex(s: &str) -> Result<Self> {
        let raw = s.trim();
        let digits = raw.strip_prefix('#').unwrap_or(raw);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(s.to_string()));
        }
        let channel = |h: &str| {
            u8::from_str_radix(h, 16).map_err(|_| Error::InvalidColor(s.to_string()))
        };
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in digits.chars().enumerate() {
                    let v = channel(&c.to_string())?;
                    out[i] = v * 17;
                }
                Ok(Self::opaque(out[0], out[1], out[2]))
            }
            6 => Ok(Self::opaque(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => Err(Error::InvalidColor(s.to_string())),
        }
    }

    pub fn rgb_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// A 2D drawing target addressed in pixels.
///
/// Implementations clip anything outside `0..width` x `0..height`; a
/// zero-sized surface accepts every call and draws nothing.
pub trait Surface {
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32);

    fn clear(&mut self);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);

    /// Draws one glyph with its baseline at `at.y`, like canvas `fillText`.
    fn fill_glyph(&mut self, glyph: char, at: Vec2, size: f32, color: Rgba);

    /// Multiplies the alpha of every following draw until changed again.
    fn set_global_alpha(&mut self, alpha: f32);

    fn is_empty(&self) -> bool {
        let (w, h) = self.size();
        w == 0 || h == 0
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_long_and_short_forms() {
        assert_eq!(Rgba::hex("#ff0c00").unwrap(), Rgba::opaque(255, 12, 0));
        assert_eq!(Rgba::hex("0ff").unwrap(), Rgba::opaque(0, 255, 255));
    }

    #[test]
    fn hex_rejects_garbage() {
        assert!(Rgba::hex("#ff0c0").is_err());
        assert!(Rgba::hex("#gg0000").is_err());
        assert!(Rgba::hex("").is_err());
    }
}
