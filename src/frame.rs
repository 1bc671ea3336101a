// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::cell::Cell;

/// Composited terminal image for one presented frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    blank: Cell,
}

impl Frame {
    pub fn new(width: u16, height: u16, bg: Option<Color>) -> Self {
        let blank = Cell::blank(bg);
        Self {
            width,
            height,
            cells: vec![blank; width as usize * height as usize],
            blank,
        }
    }

    pub fn bg(&self) -> Option<Color> {
        self.blank.bg
    }

    /// Resets every cell to the background; layers are painted on top.
    pub fn wipe(&mut self) {
        self.cells.fill(self.blank);
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[cfg(test)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or(self.blank)
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    #[cfg(test)]
    pub fn visible_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_blank()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wipe_restores_background() {
        let mut f = Frame::new(2, 2, None);
        f.set(
            1,
            1,
            Cell {
                ch: 'x',
                fg: None,
                bg: None,
                bold: false,
            },
        );
        assert_eq!(f.get(1, 1).unwrap().ch, 'x');
        assert_eq!(f.visible_cells(), 1);
        f.wipe();
        assert_eq!(f.get(1, 1).unwrap().ch, ' ');
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut f = Frame::new(2, 1, None);
        f.set(5, 0, Cell::blank(Some(Color::Red)));
        assert!(f.get(5, 0).is_none());
        assert_eq!(f.visible_cells(), 0);
    }
}
