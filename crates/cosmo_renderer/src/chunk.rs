//! Row-chunk partitioning of the character grid.
//!
//! Each chunk is a contiguous band of rows, so its cells form one contiguous
//! slice of the frame buffer and chunks can be rendered independently.

/// A band of rows of the grid to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowChunk {
    /// First row covered by the chunk
    pub start_row: u32,
    /// Number of rows in the chunk
    pub rows: u32,
}

impl RowChunk {
    pub fn new(start_row: u32, rows: u32) -> Self {
        Self { start_row, rows }
    }

    /// One past the last row.
    pub fn end_row(&self) -> u32 {
        self.start_row + self.rows
    }

    /// Get the total number of cells in this chunk.
    pub fn cell_count(&self, width: u32) -> usize {
        self.rows as usize * width as usize
    }
}

/// Split `height` rows into at most `count` chunks of near-equal size.
///
/// The number of chunks is `min(count, height)` (at least one for a
/// non-empty grid). The first `height % chunks` chunks get one extra row.
pub fn generate_chunks(height: u32, count: usize) -> Vec<RowChunk> {
    if height == 0 {
        return Vec::new();
    }

    let chunks = count.clamp(1, height as usize) as u32;
    let base = height / chunks;
    let extra = height % chunks;

    let mut start_row = 0;
    (0..chunks)
        .map(|i| {
            let rows = base + u32::from(i < extra);
            let chunk = RowChunk::new(start_row, rows);
            start_row += rows;
            chunk
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(chunks: &[RowChunk], height: u32) {
        let mut next = 0;
        for chunk in chunks {
            assert_eq!(chunk.start_row, next, "chunks must be contiguous");
            assert!(chunk.rows > 0, "no empty chunks");
            next = chunk.end_row();
        }
        assert_eq!(next, height);
    }

    #[test]
    fn test_even_split() {
        let chunks = generate_chunks(24, 4);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.rows == 6));
        assert_covers(&chunks, 24);
    }

    #[test]
    fn test_remainder_goes_to_first_chunks() {
        let chunks = generate_chunks(10, 4);
        let rows: Vec<u32> = chunks.iter().map(|c| c.rows).collect();
        assert_eq!(rows, vec![3, 3, 2, 2]);
        assert_covers(&chunks, 10);
    }

    #[test]
    fn test_more_workers_than_rows() {
        let chunks = generate_chunks(3, 16);
        assert_eq!(chunks.len(), 3);
        assert_covers(&chunks, 3);
    }

    #[test]
    fn test_zero_workers_is_one_chunk() {
        let chunks = generate_chunks(7, 0);
        assert_eq!(chunks, vec![RowChunk::new(0, 7)]);
        assert_eq!(chunks[0].cell_count(5), 35);
    }

    #[test]
    fn test_empty_grid() {
        assert!(generate_chunks(0, 4).is_empty());
    }
}
