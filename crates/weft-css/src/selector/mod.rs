//! CSS selector parsing.
//!
//! A selector is stored as a flattened chain of compound components,
//! rightmost (the subject) first. Each component carries the combinator that
//! links it to the next component to its left, so matching walks the chain
//! front to back while walking the box tree upward. See [`matching`].

mod matching;

use bitflags::bitflags;
use thiserror::Error;
use weft_common::DiagnosticKind;

pub use matching::MatchLimits;

bitflags! {
    /// Which kinds of simple selector a component contains.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SelectorFlags: u16 {
        /// A type selector such as `div`.
        const ELEMENT = 1 << 0;
        /// One or more `.class` selectors.
        const CLASS = 1 << 1;
        /// An `#id` selector.
        const ID = 1 << 2;
        /// A `:pseudo-class`.
        const PSEUDO_CLASS = 1 << 3;
        /// A `::pseudo-element`.
        const PSEUDO_ELEMENT = 1 << 4;
        /// One or more `[attr]` selectors.
        const ATTRIBUTE = 1 << 5;
        /// The `:root` pseudo-class.
        const ROOT = 1 << 6;
        /// The `*` selector.
        const UNIVERSAL = 1 << 7;
    }
}

/// [§ 8 Combinators](https://www.w3.org/TR/selectors-3/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any ancestor.
    Descendant,
    /// `>`: the parent.
    Child,
}

/// [§ 6.3.1 Attribute presence and value selectors](https://www.w3.org/TR/selectors-3/#attribute-selectors)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[name]`
    Exists,
    /// `[name=value]`
    Equals,
    /// `[name*=value]`
    Contains,
    /// `[name^=value]`
    StartsWith,
    /// `[name$=value]`
    EndsWith,
    /// `[name~=value]`: one of the whitespace separated words.
    WordMatch,
    /// `[name|=value]`: exactly `value` or starting with `value-`.
    DashMatch,
}

/// One attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMatcher {
    /// Lowercase attribute name.
    pub name: String,
    /// Comparison to perform.
    pub operator: AttributeOperator,
    /// Unquoted comparison value; empty for [`AttributeOperator::Exists`].
    pub value: String,
}

impl AttributeMatcher {
    /// Test an attribute value (or its absence).
    #[must_use]
    pub fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let expected = self.value.as_str();
        match self.operator {
            AttributeOperator::Exists => true,
            AttributeOperator::Equals => actual == expected,
            // "If value is the empty string, this selector does not represent anything."
            AttributeOperator::Contains => !expected.is_empty() && actual.contains(expected),
            AttributeOperator::StartsWith => !expected.is_empty() && actual.starts_with(expected),
            AttributeOperator::EndsWith => !expected.is_empty() && actual.ends_with(expected),
            AttributeOperator::WordMatch => {
                !expected.is_empty()
                    && !expected.contains(char::is_whitespace)
                    && actual.split_ascii_whitespace().any(|w| w == expected)
            }
            AttributeOperator::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
        }
    }
}

/// [§ 6.6 Pseudo-classes](https://www.w3.org/TR/selectors-3/#pseudo-classes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    /// `:root`, the document element.
    Root,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:link`; resolved by the host through the link colors, never by matching.
    Link,
    /// `:visited`; same as `:link`.
    Visited,
    /// `:hover`, `:active`, `:focus` and other states a static box never has.
    Dynamic(String),
}

impl PseudoClass {
    fn from_name(name: &str) -> Self {
        match name {
            "root" => Self::Root,
            "first-child" => Self::FirstChild,
            "last-child" => Self::LastChild,
            "link" => Self::Link,
            "visited" => Self::Visited,
            other => Self::Dynamic(other.to_string()),
        }
    }
}

/// A compound selector: every simple selector between two combinators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorComponent {
    /// Kinds present in this component.
    pub flags: SelectorFlags,
    /// Lowercase type name.
    pub element: Option<String>,
    /// Required class words.
    pub classes: Vec<String>,
    /// Required id.
    pub id: Option<String>,
    /// Pseudo-classes, in source order.
    pub pseudo_classes: Vec<PseudoClass>,
    /// Pseudo-element name, if any.
    pub pseudo_element: Option<String>,
    /// Attribute conditions.
    pub attributes: Vec<AttributeMatcher>,
    /// How this component relates to the next component in the chain
    /// (the one to its left in source). `None` on the last component.
    pub combinator: Option<Combinator>,
}

impl SelectorComponent {
    /// [§ 9 Calculating a selector's specificity](https://www.w3.org/TR/selectors-3/#specificity)
    /// on the legacy 100/10/1 scale.
    #[must_use]
    pub fn specificity(&self) -> u32 {
        let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        let mut total = 0u32;
        if self.flags.contains(SelectorFlags::ELEMENT) {
            total += 1;
        }
        total = total.saturating_add(count(self.classes.len()).saturating_mul(10));
        if self.id.is_some() {
            total = total.saturating_add(100);
        }
        total = total.saturating_add(count(self.attributes.len()).saturating_mul(10));
        total = total.saturating_add(count(self.pseudo_classes.len()).saturating_mul(10));
        if self.pseudo_element.is_some() {
            total = total.saturating_add(1);
        }
        total
    }

    fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// A parsed selector chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Components, subject first.
    pub components: Vec<SelectorComponent>,
    /// Sum of component specificities.
    pub specificity: u32,
    /// Source text, whitespace-normalized.
    pub text: String,
}

impl Selector {
    /// The subject component.
    #[must_use]
    pub fn subject(&self) -> Option<&SelectorComponent> {
        self.components.first()
    }

    /// Whether the subject carries the given pseudo-class.
    #[must_use]
    pub fn subject_has_pseudo_class(&self, pseudo: &PseudoClass) -> bool {
        self.subject()
            .is_some_and(|c| c.pseudo_classes.contains(pseudo))
    }
}

/// Why a selector was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// No selector text at all.
    #[error("empty selector")]
    Empty,
    /// Syntax this engine does not implement (sibling combinators,
    /// functional pseudo-classes).
    #[error("unsupported syntax: {0}")]
    Unsupported(String),
    /// Broken syntax.
    #[error("malformed: {0}")]
    Malformed(String),
}

impl SelectorError {
    /// Diagnostic classification for the sink.
    #[must_use]
    pub const fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Unsupported(_) => DiagnosticKind::Unsupported,
            Self::Empty | Self::Malformed(_) => DiagnosticKind::ParseRecoverable,
        }
    }
}

/// Parse one selector (no commas) into a subject-first chain.
///
/// # Errors
///
/// Returns a [`SelectorError`] for empty, malformed or unsupported input.
pub fn parse_selector(text: &str) -> Result<Selector, SelectorError> {
    let mut parser = SelectorParser {
        chars: text.trim().chars().collect(),
        pos: 0,
    };
    if parser.chars.is_empty() {
        return Err(SelectorError::Empty);
    }

    // Left to right, then reversed.
    let mut components: Vec<SelectorComponent> = Vec::new();
    let mut pending: Option<Combinator> = None;
    loop {
        let saw_space = parser.skip_whitespace();
        let Some(c) = parser.peek() else { break };
        match c {
            '>' => {
                if components.is_empty() || pending == Some(Combinator::Child) {
                    return Err(SelectorError::Malformed("dangling '>'".to_string()));
                }
                parser.pos += 1;
                pending = Some(Combinator::Child);
                continue;
            }
            '+' | '~' => {
                return Err(SelectorError::Unsupported(format!("'{c}' combinator")));
            }
            _ => {}
        }
        if !components.is_empty() && pending.is_none() {
            if !saw_space {
                return Err(SelectorError::Malformed(format!("unexpected '{c}'")));
            }
            pending = Some(Combinator::Descendant);
        }
        let component = parser.parse_compound()?;
        if let Some(last) = components.last_mut() {
            last.combinator = pending.take();
        }
        components.push(component);
    }
    if pending.is_some() {
        return Err(SelectorError::Malformed("trailing combinator".to_string()));
    }
    if components.is_empty() {
        return Err(SelectorError::Empty);
    }

    // Each combinator recorded on a component links it to the component on
    // its right; after reversal it must link to the one on its left.
    let combinators: Vec<Option<Combinator>> = components.iter().map(|c| c.combinator).collect();
    components.reverse();
    let n = components.len();
    for (i, component) in components.iter_mut().enumerate() {
        component.combinator = if i + 1 < n { combinators[n - 2 - i] } else { None };
    }

    let specificity = components
        .iter()
        .map(SelectorComponent::specificity)
        .fold(0u32, u32::saturating_add);
    Ok(Selector {
        components,
        specificity,
        text: text.split_whitespace().collect::<Vec<_>>().join(" "),
    })
}

struct SelectorParser {
    chars: Vec<char>,
    pos: usize,
}

impl SelectorParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                out.push(c);
                self.pos += 1;
            } else if c == '\\' {
                self.pos += 1;
                if let Some(escaped) = self.peek() {
                    out.push(escaped);
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
        out
    }

    fn required_ident(&mut self, what: &str) -> Result<String, SelectorError> {
        let ident = self.ident();
        if ident.is_empty() {
            return Err(SelectorError::Malformed(format!("missing {what} name")));
        }
        Ok(ident)
    }

    /// Simple selectors up to whitespace, a combinator or the end.
    fn parse_compound(&mut self) -> Result<SelectorComponent, SelectorError> {
        let mut component = SelectorComponent::default();

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                component.flags |= SelectorFlags::UNIVERSAL;
            }
            Some(c) if c.is_alphabetic() || c == '_' || c == '-' => {
                component.element = Some(self.ident().to_ascii_lowercase());
                component.flags |= SelectorFlags::ELEMENT;
            }
            _ => {}
        }

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.pos += 1;
                    component.classes.push(self.required_ident("class")?);
                    component.flags |= SelectorFlags::CLASS;
                }
                '#' => {
                    self.pos += 1;
                    if component.id.is_some() {
                        return Err(SelectorError::Malformed("two ids".to_string()));
                    }
                    component.id = Some(self.required_ident("id")?);
                    component.flags |= SelectorFlags::ID;
                }
                '[' => {
                    self.pos += 1;
                    component.attributes.push(self.parse_attribute()?);
                    component.flags |= SelectorFlags::ATTRIBUTE;
                }
                ':' => {
                    self.pos += 1;
                    let is_element = self.peek() == Some(':');
                    if is_element {
                        self.pos += 1;
                    }
                    let name = self.required_ident("pseudo")?.to_ascii_lowercase();
                    if self.peek() == Some('(') {
                        return Err(SelectorError::Unsupported(format!(":{name}()")));
                    }
                    // CSS 2 allows the four legacy pseudo-elements with one colon.
                    let legacy_element = matches!(
                        name.as_str(),
                        "before" | "after" | "first-line" | "first-letter"
                    );
                    if is_element || legacy_element {
                        component.pseudo_element = Some(name);
                        component.flags |= SelectorFlags::PSEUDO_ELEMENT;
                    } else {
                        let pseudo = PseudoClass::from_name(&name);
                        if pseudo == PseudoClass::Root {
                            component.flags |= SelectorFlags::ROOT;
                        }
                        component.pseudo_classes.push(pseudo);
                        component.flags |= SelectorFlags::PSEUDO_CLASS;
                    }
                }
                c if c.is_whitespace() || c == '>' || c == '+' || c == '~' => break,
                other => {
                    return Err(SelectorError::Malformed(format!("unexpected '{other}'")));
                }
            }
        }

        if component.is_empty() {
            return Err(SelectorError::Malformed("empty compound selector".to_string()));
        }
        Ok(component)
    }

    /// After `[`: `name]` or `name op value]`.
    fn parse_attribute(&mut self) -> Result<AttributeMatcher, SelectorError> {
        let _ = self.skip_whitespace();
        let name = self.required_ident("attribute")?.to_ascii_lowercase();
        let _ = self.skip_whitespace();

        let operator = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttributeMatcher {
                    name,
                    operator: AttributeOperator::Exists,
                    value: String::new(),
                });
            }
            Some('=') => {
                self.pos += 1;
                AttributeOperator::Equals
            }
            Some(c) => {
                let operator = match c {
                    '*' => AttributeOperator::Contains,
                    '^' => AttributeOperator::StartsWith,
                    '$' => AttributeOperator::EndsWith,
                    '~' => AttributeOperator::WordMatch,
                    '|' => AttributeOperator::DashMatch,
                    other => {
                        return Err(SelectorError::Malformed(format!(
                            "unknown attribute operator '{other}'"
                        )));
                    }
                };
                self.pos += 1;
                if self.peek() != Some('=') {
                    return Err(SelectorError::Malformed("expected '='".to_string()));
                }
                self.pos += 1;
                operator
            }
            None => return Err(SelectorError::Malformed("unclosed '['".to_string())),
        };

        let _ = self.skip_whitespace();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.peek() {
                        None => {
                            return Err(SelectorError::Malformed("unterminated string".to_string()));
                        }
                        Some('\\') => {
                            self.pos += 1;
                            if let Some(escaped) = self.peek() {
                                value.push(escaped);
                                self.pos += 1;
                            }
                        }
                        Some(c) if c == q => {
                            self.pos += 1;
                            break;
                        }
                        Some(c) => {
                            value.push(c);
                            self.pos += 1;
                        }
                    }
                }
                value
            }
            _ => self.ident(),
        };
        let _ = self.skip_whitespace();
        // Case-sensitivity flag: accepted and ignored.
        if matches!(self.peek(), Some('i' | 'I' | 's' | 'S')) {
            self.pos += 1;
            let _ = self.skip_whitespace();
        }
        if self.peek() != Some(']') {
            return Err(SelectorError::Malformed("unclosed '['".to_string()));
        }
        self.pos += 1;
        Ok(AttributeMatcher {
            name,
            operator,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_is_subject_first() {
        let sel = parse_selector("ul > li a.nav").unwrap();
        assert_eq!(sel.components.len(), 3);
        assert_eq!(sel.components[0].element.as_deref(), Some("a"));
        assert_eq!(sel.components[0].combinator, Some(Combinator::Descendant));
        assert_eq!(sel.components[1].element.as_deref(), Some("li"));
        assert_eq!(sel.components[1].combinator, Some(Combinator::Child));
        assert_eq!(sel.components[2].element.as_deref(), Some("ul"));
        assert_eq!(sel.components[2].combinator, None);
    }

    #[test]
    fn test_specificity_weights() {
        assert_eq!(parse_selector("div").unwrap().specificity, 1);
        assert_eq!(parse_selector(".a.b").unwrap().specificity, 20);
        assert_eq!(parse_selector("#x").unwrap().specificity, 100);
        assert_eq!(parse_selector("a[href]:link").unwrap().specificity, 21);
        assert_eq!(parse_selector("p::first-line").unwrap().specificity, 2);
        assert_eq!(parse_selector("*").unwrap().specificity, 0);
        assert_eq!(parse_selector("#nav ul li.on").unwrap().specificity, 112);
    }

    #[test]
    fn test_flags() {
        let sel = parse_selector(":root").unwrap();
        let flags = sel.components[0].flags;
        assert!(flags.contains(SelectorFlags::ROOT | SelectorFlags::PSEUDO_CLASS));
        let sel = parse_selector("a.b#c[d]").unwrap();
        assert_eq!(
            sel.components[0].flags,
            SelectorFlags::ELEMENT | SelectorFlags::CLASS | SelectorFlags::ID | SelectorFlags::ATTRIBUTE
        );
    }

    #[test]
    fn test_attribute_operators() {
        let sel = parse_selector(r#"[data-x^="ab"]"#).unwrap();
        let attr = &sel.components[0].attributes[0];
        assert_eq!(attr.operator, AttributeOperator::StartsWith);
        assert_eq!(attr.value, "ab");
        assert!(attr.matches(Some("abc")));
        assert!(!attr.matches(Some("xab")));
        assert!(!attr.matches(None));

        let dash = parse_selector("[lang|=en]").unwrap();
        let attr = &dash.components[0].attributes[0];
        assert!(attr.matches(Some("en")));
        assert!(attr.matches(Some("en-GB")));
        assert!(!attr.matches(Some("english")));
    }

    #[test]
    fn test_unsupported_and_malformed() {
        assert!(matches!(parse_selector("a + b"), Err(SelectorError::Unsupported(_))));
        assert!(matches!(parse_selector("li:not(.x)"), Err(SelectorError::Unsupported(_))));
        assert!(matches!(parse_selector("a >"), Err(SelectorError::Malformed(_))));
        assert!(matches!(parse_selector("[x"), Err(SelectorError::Malformed(_))));
        assert!(matches!(parse_selector("   "), Err(SelectorError::Empty)));
    }
}
