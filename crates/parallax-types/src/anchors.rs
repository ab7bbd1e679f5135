// ABOUTME: Line-to-pixel anchor table shared by the preview pane and scroll sync
// ABOUTME: One non-decreasing pixel offset per 1-based source line

use serde::{Deserialize, Serialize};

/// Ordered pixel offsets, entry `i` belongs to source line `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorTable {
    offsets: Vec<f32>,
}

impl AnchorTable {
    /// Wrap a list of offsets. Callers build the list in line order with
    /// values carried forward, so it is non-decreasing.
    pub fn from_offsets(offsets: Vec<f32>) -> Self {
        debug_assert!(
            offsets.windows(2).all(|w| w[0] <= w[1]),
            "anchor offsets must be non-decreasing"
        );
        Self { offsets }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offset for a 0-based index
    pub fn get(&self, index: usize) -> Option<f32> {
        self.offsets.get(index).copied()
    }

    /// Offset for a 1-based source line, clamped into the table
    pub fn offset_for_line(&self, line: usize) -> Option<f32> {
        if self.offsets.is_empty() {
            return None;
        }
        let index = line.clamp(1, self.offsets.len()) - 1;
        self.get(index)
    }

    /// Index of the first entry whose offset is at or past the given scroll
    /// offset, falling back to the last entry when every anchor lies above it.
    pub fn index_at_or_after(&self, offset: f32) -> Option<usize> {
        if self.offsets.is_empty() {
            return None;
        }
        Some(
            self.offsets
                .iter()
                .position(|anchor| *anchor >= offset)
                .unwrap_or(self.offsets.len() - 1),
        )
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.offsets
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.offsets.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_for_line_clamps() {
        let table = AnchorTable::from_offsets(vec![0.0, 10.0, 30.0]);
        assert_eq!(table.offset_for_line(0), Some(0.0));
        assert_eq!(table.offset_for_line(2), Some(10.0));
        assert_eq!(table.offset_for_line(99), Some(30.0));
        assert_eq!(AnchorTable::empty().offset_for_line(1), None);
    }

    #[test]
    fn test_index_at_or_after() {
        let table = AnchorTable::from_offsets(vec![0.0, 0.0, 100.0, 250.0]);
        assert_eq!(table.index_at_or_after(0.0), Some(0));
        assert_eq!(table.index_at_or_after(1.0), Some(2));
        assert_eq!(table.index_at_or_after(100.0), Some(2));
        assert_eq!(table.index_at_or_after(240.0), Some(3));
        // Past the last anchor falls back to the final line
        assert_eq!(table.index_at_or_after(9000.0), Some(3));
        assert_eq!(AnchorTable::empty().index_at_or_after(0.0), None);
    }
}
