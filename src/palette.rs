// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::ColorMode;
use crate::surface::Rgba;

/// Particle colours: blue, violet, green and pink neon at low alpha.
pub const NEON: [Rgba; 4] = [
    Rgba::new(0, 255, 255, 0.3),
    Rgba::new(157, 0, 255, 0.3),
    Rgba::new(57, 255, 20, 0.3),
    Rgba::new(255, 0, 255, 0.3),
];

pub const RAIN_RED: Rgba = Rgba::opaque(255, 12, 0);

fn dist2(a: (u8, u8, u8), b: (u8, u8, u8)) -> i32 {
    let dr = a.0 as i32 - b.0 as i32;
    let dg = a.1 as i32 - b.1 as i32;
    let db = a.2 as i32 - b.2 as i32;
    dr * dr + dg * dg + db * db
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let level = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;
    let (r6, g6, b6) = (level(r), level(g), level(b));
    let cube = (
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );
    let cube_idx = 16 + 36 * r6 + 6 * g6 + b6;

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let (gray_idx, gray) = match avg {
        0..=7 => (16, (0, 0, 0)),
        239..=255 => (231, (255, 255, 255)),
        _ => {
            let step = (avg - 8) / 10;
            let v = 8 + 10 * step;
            (232 + step, (v, v, v))
        }
    };

    if dist2((r, g, b), gray) < dist2((r, g, b), cube) {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];

    TABLE
        .iter()
        .min_by_key(|(_, rgb)| dist2((r, g, b), *rgb))
        .map(|(c, _)| *c)
        .unwrap_or(Color::White)
}

/// Maps light in `0..=1` per channel to what the terminal can show.
pub fn terminal_color(light: [f32; 3], mode: ColorMode) -> Option<Color> {
    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    let (r, g, b) = (to_u8(light[0]), to_u8(light[1]), to_u8(light[2]));
    match mode {
        ColorMode::Mono => None,
        ColorMode::TrueColor => Some(Color::Rgb { r, g, b }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(r, g, b))),
        ColorMode::Color16 => Some(rgb_to_color16(r, g, b)),
    }
}

pub fn background(mode: ColorMode, use_terminal_default: bool) -> Option<Color> {
    if use_terminal_default {
        return None;
    }
    Some(match mode {
        ColorMode::Color16 => Color::Black,
        ColorMode::TrueColor => Color::Rgb { r: 0, g: 0, b: 0 },
        ColorMode::Mono | ColorMode::Color256 => Color::AnsiValue(16),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi256_prefers_cube_for_saturated_colors() {
        assert_eq!(rgb_to_ansi256(255, 0, 0), 196);
        assert_eq!(rgb_to_ansi256(0, 255, 255), 51);
    }

    #[test]
    fn ansi256_uses_gray_ramp_for_grays() {
        assert_eq!(rgb_to_ansi256(128, 128, 128), 244);
        assert_eq!(rgb_to_ansi256(0, 0, 0), 16);
    }

    #[test]
    fn color16_picks_nearest_entry() {
        assert_eq!(rgb_to_color16(250, 10, 5), Color::Red);
        assert_eq!(rgb_to_color16(0, 120, 130), Color::DarkCyan);
    }

    #[test]
    fn mono_has_no_foreground() {
        assert_eq!(terminal_color([1.0, 0.0, 0.0], ColorMode::Mono), None);
        assert_eq!(
            terminal_color([1.0, 0.0, 0.0], ColorMode::TrueColor),
            Some(Color::Rgb { r: 255, g: 0, b: 0 })
        );
    }
}
