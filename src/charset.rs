// Copyright (c) 2026 rezky_nightky

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphSet {
    /// Digits and lowercase letters.
    Alnum,
    Binary,
    Digits,
    Hex,
    Katakana,
    /// Letters, digits and half-width katakana.
    Matrix,
}

pub const PRESETS: &[(&str, &str)] = &[
    ("alnum", "Digits + lowercase letters (aliases: code, default)"),
    ("binary", "0 and 1 (aliases: bin, 01)"),
    ("digits", "Digits only (aliases: dec, decimal)"),
    ("hex", "0-9 and a-f (alias: hexadecimal)"),
    ("katakana", "Half-width katakana"),
    ("matrix", "Letters + digits + katakana"),
];

pub fn glyph_set_from_str(name: &str) -> Result<GlyphSet> {
    let name = name.trim().to_ascii_lowercase();
    match name.as_str() {
        "alnum" | "code" | "default" => Ok(GlyphSet::Alnum),
        "bin" | "binary" | "01" => Ok(GlyphSet::Binary),
        "digits" | "dec" | "decimal" => Ok(GlyphSet::Digits),
        "hex" | "hexadecimal" => Ok(GlyphSet::Hex),
        "katakana" => Ok(GlyphSet::Katakana),
        "matrix" => Ok(GlyphSet::Matrix),
        _ => Err(Error::UnknownCharset(name)),
    }
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    out.extend((start..=end).filter_map(char::from_u32));
}

pub fn build_glyphs(set: GlyphSet) -> Vec<char> {
    let mut out = Vec::new();
    match set {
        GlyphSet::Alnum => {
            push_range(&mut out, 0x30, 0x39);
            push_range(&mut out, 0x61, 0x7A);
        }
        GlyphSet::Binary => push_range(&mut out, 0x30, 0x31),
        GlyphSet::Digits => push_range(&mut out, 0x30, 0x39),
        GlyphSet::Hex => {
            push_range(&mut out, 0x30, 0x39);
            push_range(&mut out, 0x61, 0x66);
        }
        GlyphSet::Katakana => push_range(&mut out, 0xFF66, 0xFF9D),
        GlyphSet::Matrix => {
            push_range(&mut out, 0x41, 0x5A);
            push_range(&mut out, 0x61, 0x7A);
            push_range(&mut out, 0x30, 0x39);
            push_range(&mut out, 0xFF66, 0xFF9D);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alnum_is_digits_then_lowercase() {
        let g: String = build_glyphs(GlyphSet::Alnum).into_iter().collect();
        assert_eq!(g, "0123456789abcdefghijklmnopqrstuvwxyz");
    }

    #[test]
    fn binary_has_only_0_and_1() {
        assert_eq!(build_glyphs(GlyphSet::Binary), vec!['0', '1']);
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(glyph_set_from_str(" 01 ").unwrap(), GlyphSet::Binary);
        assert_eq!(glyph_set_from_str("Code").unwrap(), GlyphSet::Alnum);
        assert!(matches!(
            glyph_set_from_str("runic"),
            Err(Error::UnknownCharset(s)) if s == "runic"
        ));
    }

    #[test]
    fn every_preset_parses_and_is_non_empty() {
        for (name, _) in PRESETS {
            let set = glyph_set_from_str(name).unwrap();
            assert!(!build_glyphs(set).is_empty());
        }
    }
}
