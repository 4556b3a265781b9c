//! The document list stack.
//!
//! [§ 12.5 Lists](https://www.w3.org/TR/CSS2/generate.html#lists)
//!
//! Each open list contributes one entry: its kind, marker style, running
//! ordinal and nesting level. Content appended while a list is open takes
//! the top entry's indent level; markers take their bullet from it.

use serde::{Deserialize, Serialize};
use weft_css::ListStyleType;
use weft_dom::Bullet;

/// Kinds of list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Bulleted.
    Unordered,
    /// Numbered.
    Ordered,
    /// Terms and definitions; no markers.
    Definition,
}

/// One open list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    /// Kind of list.
    pub kind: ListKind,
    /// Explicit marker style, if any.
    pub style: Option<ListStyleType>,
    /// Items numbered so far.
    pub ordinal: u32,
    /// Nesting level, starting at 1.
    pub level: u32,
    /// Indent level content in this list gets.
    pub indent: u32,
    /// Items flow side by side instead of one per line; no extra indent.
    pub horizontal: bool,
    /// Inside a definition term, which sits one level out.
    pub in_term: bool,
}

/// Stack of open lists. Empty outside any list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListStack {
    entries: Vec<ListEntry>,
}

impl ListStack {
    /// No open list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Open a list.
    pub fn push_list(&mut self, kind: ListKind, style: Option<ListStyleType>, horizontal: bool) {
        let (level, indent) = self.top().map_or((0, 0), |e| (e.level, e.indent));
        let entry = ListEntry {
            kind,
            style,
            ordinal: 0,
            level: level + 1,
            indent: if horizontal { indent } else { indent + 1 },
            horizontal,
            in_term: false,
        };
        log::trace!(target: "weft::list", "open {kind:?} list at level {}", entry.level);
        self.entries.push(entry);
    }

    /// Close the innermost list. Returns `false` when none is open.
    pub fn pop_list(&mut self) -> bool {
        self.entries.pop().is_some()
    }

    /// Enter or leave a definition term in the innermost list.
    pub fn set_definition_term(&mut self, active: bool) {
        if let Some(top) = self.entries.last_mut() {
            top.in_term = active;
        }
    }

    /// Innermost open list.
    #[must_use]
    pub fn top(&self) -> Option<&ListEntry> {
        self.entries.last()
    }

    /// Nesting level; zero outside lists.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.top().map_or(0, |e| e.level)
    }

    /// Indent level for content appended now.
    #[must_use]
    pub fn indent(&self) -> u32 {
        self.top()
            .map_or(0, |e| if e.in_term { e.indent.saturating_sub(1) } else { e.indent })
    }

    /// Marker for the next item of the innermost list, advancing its ordinal.
    ///
    /// `None` outside lists, for definition lists and for `list-style-type: none`.
    pub fn next_bullet(&mut self) -> Option<Bullet> {
        let top = self.entries.last_mut()?;
        top.ordinal += 1;
        let style = match (top.kind, top.style) {
            (ListKind::Definition, _) => return None,
            (_, Some(style)) => style,
            (ListKind::Ordered, None) => ListStyleType::Decimal,
            (ListKind::Unordered, None) => {
                // Unstyled bullets cycle through six disc classes by depth.
                return Some(Bullet::Disc(((top.level - 1) % 6 + 1) as u8));
            }
        };
        bullet_for(style, top.ordinal)
    }
}

/// Marker for item number `ordinal` in the given style.
#[must_use]
pub fn bullet_for(style: ListStyleType, ordinal: u32) -> Option<Bullet> {
    let label = match style {
        ListStyleType::None => return None,
        ListStyleType::Disc => return Some(Bullet::Disc(1)),
        ListStyleType::Circle => return Some(Bullet::Circle),
        ListStyleType::Square => return Some(Bullet::Square),
        ListStyleType::Decimal => ordinal.to_string(),
        ListStyleType::LowerAlpha => alpha(ordinal),
        ListStyleType::UpperAlpha => alpha(ordinal).to_uppercase(),
        ListStyleType::LowerRoman => roman(ordinal),
        ListStyleType::UpperRoman => roman(ordinal).to_uppercase(),
    };
    Some(Bullet::Label(format!("{label}.")))
}

/// a, b, ..., z, aa, ab, ...
fn alpha(mut n: u32) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Lower-case roman numerals; falls back to decimal beyond 3999.
fn roman(n: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    if n == 0 || n > 3999 {
        return n.to_string();
    }
    let mut rest = n;
    let mut out = String::new();
    for (value, digits) in TABLE {
        while rest >= value {
            out.push_str(digits);
            rest -= value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_unordered_bullets_by_level() {
        let mut lists = ListStack::new();
        lists.push_list(ListKind::Unordered, None, false);
        assert_eq!(lists.next_bullet(), Some(Bullet::Disc(1)));
        lists.push_list(ListKind::Unordered, None, false);
        assert_eq!(lists.next_bullet(), Some(Bullet::Disc(2)));
        assert_eq!(lists.indent(), 2);
        assert!(lists.pop_list());
        assert_eq!(lists.indent(), 1);
        assert!(lists.pop_list());
        assert!(!lists.pop_list());
        assert_eq!(lists.next_bullet(), None);
    }

    #[test]
    fn test_disc_class_wraps_after_six_levels() {
        let mut lists = ListStack::new();
        for _ in 0..7 {
            lists.push_list(ListKind::Unordered, None, false);
        }
        assert_eq!(lists.next_bullet(), Some(Bullet::Disc(1)));
    }

    #[test]
    fn test_ordered_labels() {
        let mut lists = ListStack::new();
        lists.push_list(ListKind::Ordered, Some(ListStyleType::UpperRoman), false);
        let labels: Vec<_> = (0..4).filter_map(|_| lists.next_bullet()).collect();
        assert_eq!(labels.last(), Some(&Bullet::Label("IV.".to_string())));
        assert_eq!(bullet_for(ListStyleType::LowerAlpha, 28), Some(Bullet::Label("ab.".to_string())));
        assert_eq!(bullet_for(ListStyleType::Decimal, 3), Some(Bullet::Label("3.".to_string())));
    }

    #[test]
    fn test_horizontal_and_definition_lists() {
        let mut lists = ListStack::new();
        lists.push_list(ListKind::Definition, None, false);
        assert_eq!(lists.next_bullet(), None);
        lists.set_definition_term(true);
        assert_eq!(lists.indent(), 0);
        lists.set_definition_term(false);
        assert_eq!(lists.indent(), 1);
        lists.push_list(ListKind::Unordered, None, true);
        assert_eq!(lists.indent(), 1);
        assert_eq!(lists.level(), 2);
    }
}
