//! Per-box record of laid out lines.
//!
//! Incremental layout resumes from a line instead of the top of the box, and
//! render repaints from a line down. Both look lines up here.

use serde::Serialize;
use weft_dom::NodeId;

use crate::error::LayoutError;

/// One laid out line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineRecord {
    /// First child on the line.
    pub child: NodeId,
    /// Byte offset into that child's text where the line starts; zero for
    /// anything that is not text.
    pub offset: usize,
    /// Top of the line in the box's content coordinates.
    pub y: f32,
    /// Width taken by the content on the line.
    pub width: f32,
    /// Line height.
    pub height: f32,
    /// Whether the line starts partway through a child.
    pub continues: bool,
    /// Whether a float narrowed the line. Layout never resumes from such a
    /// line because the float state at its top is not kept.
    pub has_floats: bool,
}

impl LineRecord {
    /// Bottom of the line.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Lines of one box in top-to-bottom order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineIndex {
    records: Vec<LineRecord>,
}

impl LineIndex {
    /// No lines.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the box has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All lines.
    #[must_use]
    pub fn records(&self) -> &[LineRecord] {
        &self.records
    }

    /// Line at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LineRecord> {
        self.records.get(index)
    }

    /// Append a line.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Allocation`] if the index cannot grow.
    pub fn push(&mut self, record: LineRecord) -> Result<(), LayoutError> {
        self.records
            .try_reserve(1)
            .map_err(|_| LayoutError::Allocation("line index"))?;
        self.records.push(record);
        Ok(())
    }

    /// Keep the first `len` lines.
    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    /// Index of the line containing `y`, clamped to the last line.
    #[must_use]
    pub fn line_at_y(&self, y: f32) -> Option<usize> {
        if self.records.is_empty() {
            return None;
        }
        let after = self.records.partition_point(|r| r.y <= y);
        Some(after.saturating_sub(1))
    }

    /// Nearest line at or before `index` that no float narrows.
    ///
    /// `None` when every line up to `index` is beside a float; callers then
    /// start from the top of the box.
    #[must_use]
    pub fn resumable_at_or_before(&self, index: usize) -> Option<usize> {
        let end = index.min(self.records.len().checked_sub(1)?);
        (0..=end).rev().find(|&i| !self.records[i].has_floats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(y: f32, has_floats: bool) -> LineRecord {
        LineRecord {
            child: NodeId(1),
            offset: 0,
            y,
            width: 10.0,
            height: 10.0,
            continues: false,
            has_floats,
        }
    }

    #[test]
    fn test_truncate_keeps_lines_above_the_boundary() {
        let mut index = LineIndex::new();
        for i in 0..4 {
            index.push(line(i as f32 * 10.0, false)).unwrap();
        }
        let boundary = index.get(2).unwrap().y;
        index.truncate(2);
        assert_eq!(index.len(), 2);
        assert!(index.records().iter().all(|r| r.y < boundary));
        index.truncate(0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_resume_skips_lines_beside_floats() {
        let mut index = LineIndex::new();
        index.push(line(0.0, false)).unwrap();
        index.push(line(10.0, true)).unwrap();
        index.push(line(20.0, true)).unwrap();
        assert_eq!(index.resumable_at_or_before(2), Some(0));
        assert_eq!(index.resumable_at_or_before(9), Some(0));
        assert_eq!(index.line_at_y(25.0), Some(2));
        assert_eq!(index.line_at_y(-5.0), Some(0));

        let mut floating = LineIndex::new();
        floating.push(line(0.0, true)).unwrap();
        assert_eq!(floating.resumable_at_or_before(0), None);
        assert_eq!(LineIndex::new().resumable_at_or_before(0), None);
    }
}
