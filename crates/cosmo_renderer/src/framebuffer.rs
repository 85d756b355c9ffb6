//! Character grid written by the renderer.

/// Row-major grid of `width × height` characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    cells: Vec<char>,
}

impl FrameBuffer {
    /// Create a buffer with every cell set to `fill`.
    pub fn new(width: u32, height: u32, fill: char) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the cell at (col, row).
    pub fn get(&self, col: u32, row: u32) -> char {
        self.cells[self.offset(col, row)]
    }

    /// Set the cell at (col, row).
    pub fn set(&mut self, col: u32, row: u32, value: char) {
        let offset = self.offset(col, row);
        self.cells[offset] = value;
    }

    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    /// Mutable access to all cells, row-major.
    pub fn cells_mut(&mut self) -> &mut [char] {
        &mut self.cells
    }

    pub fn row(&self, row: u32) -> String {
        let start = self.offset(0, row);
        self.cells[start..start + self.width as usize].iter().collect()
    }

    /// The grid as `height` strings of `width` characters.
    pub fn rows(&self) -> Vec<String> {
        (0..self.height).map(|row| self.row(row)).collect()
    }

    #[inline]
    fn offset(&self, col: u32, row: u32) -> usize {
        debug_assert!(col < self.width && row < self.height);
        row as usize * self.width as usize + col as usize
    }
}
