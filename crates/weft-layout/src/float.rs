//! Float margin tracking.
//!
//! [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
//!
//! "The current and subsequent line boxes created next to the float are
//! shortened as necessary to make room for the margin box of the float."
//!
//! Each side keeps a list of [`MarginRecord`]s ordered by the y at which
//! they expire. A record's `width` is the total width consumed on its side
//! while it is the first unexpired record, so nested floats compound: the
//! consumed width at any y is just the `width` of the first record ending
//! below it. Records are dropped lazily as layout moves down the box.

use serde::Serialize;
use weft_css::{Clear, Float};

/// [§ 9.5.1](https://www.w3.org/TR/CSS2/visuren.html#float-position)
///
/// "The element generates a block box that is floated to the left / right."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FloatSide {
    /// Content flows along the right side of the float.
    Left,
    /// Content flows along the left side of the float.
    Right,
}

impl FloatSide {
    /// Side for a `float` value, `None` when the box does not float.
    #[must_use]
    pub const fn from_float(value: Float) -> Option<Self> {
        match value {
            Float::Left => Some(Self::Left),
            Float::Right => Some(Self::Right),
            Float::None => None,
        }
    }
}

/// One float's effect on the lines beside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarginRecord {
    /// First y no longer narrowed by this record.
    pub end_y: f32,
    /// Width consumed on this side while the record is active.
    pub width: f32,
    /// List indent level the float was placed at.
    pub indent_level: u32,
}

/// Left and right margin lists of one box.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FloatMargins {
    left: Vec<MarginRecord>,
    right: Vec<MarginRecord>,
    max_end_y: f32,
}

impl FloatMargins {
    /// Empty lists.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            left: Vec::new(),
            right: Vec::new(),
            max_end_y: 0.0,
        }
    }

    /// Whether no float is tracked on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Records on one side, earliest expiry first.
    #[must_use]
    pub fn records(&self, side: FloatSide) -> &[MarginRecord] {
        match side {
            FloatSide::Left => &self.left,
            FloatSide::Right => &self.right,
        }
    }

    fn side_mut(&mut self, side: FloatSide) -> &mut Vec<MarginRecord> {
        match side {
            FloatSide::Left => &mut self.left,
            FloatSide::Right => &mut self.right,
        }
    }

    /// Record a float that narrows `side` by `width` more than is already
    /// consumed there, until `end_y`.
    pub fn add_margin(&mut self, side: FloatSide, end_y: f32, width: f32, indent_level: u32) {
        self.max_end_y = self.max_end_y.max(end_y);
        let records = self.side_mut(side);

        // STEP 1: Compound with what is active now.
        let consumed = records.first().map_or(0.0, |r| r.width) + width.max(0.0);

        // STEP 2: Records expiring no later than the new one are beside it for
        // their whole life, so they consume at least as much.
        for record in records.iter_mut().filter(|r| r.end_y <= end_y) {
            record.width = record.width.max(consumed);
        }

        // STEP 3: Merge with a record ending at the same y; otherwise insert
        // in end-y order.
        if let Some(same) = records.iter_mut().find(|r| (r.end_y - end_y).abs() < f32::EPSILON) {
            same.width = same.width.max(consumed);
            same.indent_level = same.indent_level.max(indent_level);
            return;
        }
        let at = records.partition_point(|r| r.end_y < end_y);
        records.insert(
            at,
            MarginRecord {
                end_y,
                width: consumed,
                indent_level,
            },
        );
    }

    /// Widths consumed on the left and right at `y`.
    ///
    /// Drops every record that has expired by `y`; callers query with a
    /// non-decreasing `y` during one layout pass.
    pub fn current_margins(&mut self, y: f32) -> (f32, f32) {
        for records in [&mut self.left, &mut self.right] {
            let expired = records.partition_point(|r| r.end_y <= y);
            let _ = records.drain(..expired);
        }
        self.peek_margins(y)
    }

    /// Like [`current_margins`](Self::current_margins) without dropping anything.
    #[must_use]
    pub fn peek_margins(&self, y: f32) -> (f32, f32) {
        (first_active(&self.left, y).map_or(0.0, |r| r.width), first_active(&self.right, y).map_or(0.0, |r| r.width))
    }

    /// Whether any float narrows the line at `y`.
    #[must_use]
    pub fn is_active_at(&self, y: f32) -> bool {
        first_active(&self.left, y).is_some() || first_active(&self.right, y).is_some()
    }

    /// Lowest y at or below `y` where the two sides together consume no
    /// more than `budget`.
    ///
    /// Walks down one expiry at a time, so it ends after at most as many
    /// steps as there are records. Returns the bottom of all floats if even
    /// that is not enough, since nothing narrows the line beyond it.
    #[must_use]
    pub fn find_y_with_budget(&self, y: f32, budget: f32) -> f32 {
        let mut y = y;
        loop {
            let left = first_active(&self.left, y);
            let right = first_active(&self.right, y);
            let consumed = left.map_or(0.0, |r| r.width) + right.map_or(0.0, |r| r.width);
            if consumed <= budget {
                return y;
            }
            let next = match (left, right) {
                (Some(l), Some(r)) => l.end_y.min(r.end_y),
                (Some(l), None) => l.end_y,
                (None, Some(r)) => r.end_y,
                (None, None) => return y,
            };
            y = next;
        }
    }

    /// y below every left float placed at `indent_level` or deeper.
    ///
    /// Used when a list closes, so floats from the deeper list stop
    /// narrowing the shallower content that follows.
    #[must_use]
    pub fn find_indent_clear_y(&self, y: f32, indent_level: u32) -> f32 {
        self.left
            .iter()
            .filter(|r| r.end_y > y && r.indent_level >= indent_level)
            .map(|r| r.end_y)
            .fold(y, f32::max)
    }

    /// [§ 9.5.2](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// "Requires that the top border edge of the box be below the bottom
    /// outer edge of any left-floating boxes" (or right, or both).
    #[must_use]
    pub fn clear_y(&self, clear: Clear, y: f32) -> f32 {
        let bottom = |records: &[MarginRecord]| records.iter().map(|r| r.end_y).fold(y, f32::max);
        match clear {
            Clear::None => y,
            Clear::Left => bottom(&self.left),
            Clear::Right => bottom(&self.right),
            Clear::Both => bottom(&self.left).max(bottom(&self.right)),
        }
    }

    /// [§ 10.6.7](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    ///
    /// "If the element has any floating descendants whose bottom margin edge
    /// is below the element's bottom content edge, then the height is
    /// increased to include those edges."
    #[must_use]
    pub const fn max_end_y(&self) -> f32 {
        self.max_end_y
    }
}

fn first_active(records: &[MarginRecord], y: f32) -> Option<&MarginRecord> {
    records.iter().find(|r| r.end_y > y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_floats_compound() {
        let mut floats = FloatMargins::new();
        floats.add_margin(FloatSide::Left, 100.0, 50.0, 0);
        floats.add_margin(FloatSide::Left, 60.0, 30.0, 0);
        assert_eq!(floats.current_margins(0.0), (80.0, 0.0));
        assert_eq!(floats.current_margins(70.0), (50.0, 0.0));
        assert_eq!(floats.current_margins(100.0), (0.0, 0.0));
    }

    #[test]
    fn test_longer_float_raises_earlier_records() {
        let mut floats = FloatMargins::new();
        floats.add_margin(FloatSide::Right, 40.0, 20.0, 0);
        floats.add_margin(FloatSide::Right, 90.0, 30.0, 0);
        // The second float sits beside the first and outlives it.
        assert_eq!(floats.peek_margins(10.0), (0.0, 50.0));
        assert_eq!(floats.peek_margins(50.0), (0.0, 50.0));
        assert_eq!(floats.peek_margins(90.0), (0.0, 0.0));
    }

    #[test]
    fn test_find_y_with_budget_walks_down() {
        let mut floats = FloatMargins::new();
        floats.add_margin(FloatSide::Left, 30.0, 100.0, 0);
        floats.add_margin(FloatSide::Right, 50.0, 100.0, 0);
        assert!((floats.find_y_with_budget(0.0, 150.0) - 30.0).abs() < f32::EPSILON);
        assert!((floats.find_y_with_budget(0.0, 50.0) - 50.0).abs() < f32::EPSILON);
        assert!((floats.find_y_with_budget(0.0, 250.0)).abs() < f32::EPSILON);
        assert!((floats.find_y_with_budget(0.0, -1.0) - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_clear_and_indent_clear() {
        let mut floats = FloatMargins::new();
        floats.add_margin(FloatSide::Left, 30.0, 10.0, 2);
        floats.add_margin(FloatSide::Left, 80.0, 10.0, 0);
        floats.add_margin(FloatSide::Right, 50.0, 10.0, 0);
        assert!((floats.clear_y(Clear::Right, 0.0) - 50.0).abs() < f32::EPSILON);
        assert!((floats.clear_y(Clear::Both, 0.0) - 80.0).abs() < f32::EPSILON);
        assert!((floats.clear_y(Clear::None, 5.0) - 5.0).abs() < f32::EPSILON);
        assert!((floats.find_indent_clear_y(0.0, 1) - 30.0).abs() < f32::EPSILON);
        assert!((floats.max_end_y() - 80.0).abs() < f32::EPSILON);
    }

    #[quickcheck_macros::quickcheck]
    fn prop_margins_vanish_below_last_float(heights: Vec<u8>, widths: Vec<u8>) -> bool {
        let mut floats = FloatMargins::new();
        let mut end = 0.0;
        for (h, w) in heights.iter().zip(widths.iter()) {
            end += f32::from(*h) + 1.0;
            floats.add_margin(FloatSide::Left, end, f32::from(*w), 0);
        }
        let (left, right) = floats.current_margins(end);
        left.abs() < f32::EPSILON && right.abs() < f32::EPSILON
    }

    #[quickcheck_macros::quickcheck]
    fn prop_earlier_records_consume_at_least_as_much(floats_in: Vec<(u8, u8)>) -> bool {
        let mut floats = FloatMargins::new();
        for (end, width) in floats_in {
            floats.add_margin(FloatSide::Right, f32::from(end) + 1.0, f32::from(width), 0);
        }
        floats
            .records(FloatSide::Right)
            .windows(2)
            .all(|pair| pair[0].end_y < pair[1].end_y && pair[0].width >= pair[1].width)
    }
}
