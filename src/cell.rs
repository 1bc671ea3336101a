// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

/// One terminal cell as it will be printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Cell {
    pub fn blank(bg: Option<Color>) -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg,
            bold: false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.ch == ' '
    }
}
