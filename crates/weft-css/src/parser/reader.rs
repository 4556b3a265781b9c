//! Character-level reader behind [`super::Stylesheet::parse`].

use weft_common::{Component, Diagnostic, DiagnosticKind, DiagnosticSink};

use super::{ParserLimits, Property, Rule};
use crate::selector::{Selector, parse_selector};

/// Outcome of scanning a quoted string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quoted {
    /// Closing quote found.
    Closed,
    /// Input ended first.
    Unterminated,
    /// `max_scan_chars` exceeded; the reader stopped inside the string.
    TooLong,
}

pub(super) struct CssReader<'a> {
    chars: Vec<char>,
    pos: usize,
    limits: &'a ParserLimits,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> CssReader<'a> {
    pub(super) fn new(text: &str, limits: &'a ParserLimits, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            limits,
            sink,
        }
    }

    fn report(&self, kind: DiagnosticKind, message: impl Into<String>) {
        self.sink
            .report(Diagnostic::new(Component::Parser, kind, message));
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if self.pos < self.chars.len() {
            self.pos += 1;
        }
    }

    fn at_comment(&self) -> bool {
        self.peek() == Some('/') && self.peek_at(1) == Some('*')
    }

    fn skip_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.chars.len() {
            if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
        self.report(DiagnosticKind::ParseRecoverable, "unterminated comment");
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            if self.at_comment() {
                self.skip_comment();
            } else {
                return;
            }
        }
    }

    /// Scan a quoted string starting at the opening quote, appending the
    /// quotes and contents to `out`.
    fn read_quoted(&mut self, out: &mut String) -> Quoted {
        let Some(quote) = self.peek() else {
            return Quoted::Unterminated;
        };
        out.push(quote);
        self.bump();
        let mut scanned = 0usize;
        while let Some(c) = self.peek() {
            if scanned >= self.limits.max_scan_chars {
                self.report(
                    DiagnosticKind::IterationBudgetExceeded,
                    format!("quoted string longer than {} characters", self.limits.max_scan_chars),
                );
                return Quoted::TooLong;
            }
            scanned += 1;
            if c == '\n' {
                // An unescaped newline ends a bad string.
                self.report(DiagnosticKind::ParseRecoverable, "newline in string");
                return Quoted::Unterminated;
            }
            out.push(c);
            self.bump();
            if c == '\\' {
                if let Some(escaped) = self.peek() {
                    out.push(escaped);
                    self.bump();
                }
            } else if c == quote {
                return Quoted::Closed;
            }
        }
        self.report(DiagnosticKind::ParseRecoverable, "unterminated string");
        Quoted::Unterminated
    }

    /// Skip a `{ ... }` block starting at its opening brace, honoring nested
    /// blocks, strings and comments.
    fn skip_block(&mut self) {
        let mut depth = 0usize;
        let mut scratch = String::new();
        while let Some(c) = self.peek() {
            match c {
                '{' => {
                    depth += 1;
                    self.bump();
                }
                '}' => {
                    self.bump();
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                '"' | '\'' => {
                    // A string cut off by the scan cap resumes from inside it.
                    scratch.clear();
                    let _ = self.read_quoted(&mut scratch);
                }
                '/' if self.at_comment() => self.skip_comment(),
                _ => self.bump(),
            }
        }
        self.report(DiagnosticKind::ParseRecoverable, "unterminated block");
    }

    /// Top-level driver: rules and at-rules until input or step budget runs out.
    pub(super) fn read_stylesheet(&mut self, first_order: usize) -> Vec<Rule> {
        let mut rules = Vec::new();
        let mut order = first_order;
        let mut steps = 0usize;

        loop {
            self.skip_whitespace_and_comments();
            if self.peek().is_none() {
                break;
            }
            if steps >= self.limits.max_steps {
                self.report(
                    DiagnosticKind::IterationBudgetExceeded,
                    format!("stopped after {} top-level steps", self.limits.max_steps),
                );
                break;
            }
            steps += 1;

            let start = self.pos;
            match self.peek() {
                Some('@') => self.skip_at_rule(),
                Some('}') => {
                    self.report(DiagnosticKind::ParseRecoverable, "stray '}'");
                    self.bump();
                }
                // HTML comment delimiters inside <style> are ignored.
                Some('<') if self.matches_ahead("<!--") => self.pos += 4,
                Some('-') if self.matches_ahead("-->") => self.pos += 3,
                _ => {
                    if let Some(rule) = self.read_rule(order) {
                        rules.push(rule);
                        order += 1;
                    }
                }
            }
            // Forced progress: a step that consumed nothing skips one character.
            if self.pos == start {
                self.bump();
            }
        }
        rules
    }

    fn matches_ahead(&self, literal: &str) -> bool {
        literal
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    /// `@name ... ;` or `@name ... { ... }`; the content is not interpreted.
    fn skip_at_rule(&mut self) {
        self.bump();
        let mut scratch = String::new();
        while let Some(c) = self.peek() {
            match c {
                ';' => {
                    self.bump();
                    return;
                }
                '{' => {
                    self.skip_block();
                    return;
                }
                '}' => return,
                '"' | '\'' => {
                    scratch.clear();
                    let _ = self.read_quoted(&mut scratch);
                }
                '/' if self.at_comment() => self.skip_comment(),
                _ => self.bump(),
            }
        }
    }

    /// Selector text up to the opening brace.
    ///
    /// Returns `None` (after reporting) when the prelude is cut off by `;`,
    /// `}`, the end of input, or the scan cap. On `None` the reader is
    /// positioned after the offending fragment.
    fn read_prelude(&mut self) -> Option<String> {
        let mut text = String::new();
        let mut overflow = false;
        let mut scanned = 0usize;
        while let Some(c) = self.peek() {
            if scanned >= self.limits.max_scan_chars && !overflow {
                self.report(
                    DiagnosticKind::IterationBudgetExceeded,
                    format!("selector longer than {} characters", self.limits.max_scan_chars),
                );
                overflow = true;
            }
            scanned += 1;
            match c {
                '{' => {
                    if overflow {
                        self.skip_block();
                        return None;
                    }
                    return Some(text);
                }
                ';' | '}' => {
                    self.report(
                        DiagnosticKind::ParseRecoverable,
                        format!("selector '{}' has no declaration block", text.trim()),
                    );
                    self.bump();
                    return None;
                }
                '"' | '\'' => {
                    let mut quoted = String::new();
                    if self.read_quoted(&mut quoted) != Quoted::Closed {
                        overflow = true;
                    }
                    if !overflow {
                        text.push_str(&quoted);
                    }
                }
                '/' if self.at_comment() => {
                    self.skip_comment();
                    text.push(' ');
                }
                _ => {
                    if !overflow {
                        text.push(c);
                    }
                    self.bump();
                }
            }
        }
        self.report(
            DiagnosticKind::ParseRecoverable,
            "unexpected end of input in selector",
        );
        None
    }

    fn read_rule(&mut self, order: usize) -> Option<Rule> {
        let prelude = self.read_prelude()?;
        // At '{'.
        self.bump();
        let properties = self.read_declarations(true);
        let selectors = self.parse_selector_list(&prelude);
        if selectors.is_empty() {
            return None;
        }
        Some(Rule {
            selectors,
            properties,
            order,
        })
    }

    /// Split on top-level commas and parse each selector, dropping failures.
    fn parse_selector_list(&self, prelude: &str) -> Vec<Selector> {
        let mut selectors = Vec::new();
        for (iteration, text) in split_selector_list(prelude).into_iter().enumerate() {
            if iteration >= self.limits.max_selector_iterations {
                self.report(
                    DiagnosticKind::IterationBudgetExceeded,
                    format!(
                        "selector list truncated at {} entries",
                        self.limits.max_selector_iterations
                    ),
                );
                break;
            }
            match parse_selector(text) {
                Ok(selector) => selectors.push(selector),
                Err(err) => self.sink.report(Diagnostic::new(
                    Component::Selector,
                    err.kind(),
                    format!("dropped selector '{text}': {err}"),
                )),
            }
        }
        selectors
    }

    /// Declarations until the closing brace (`in_block`) or end of input.
    pub(super) fn read_declarations(&mut self, in_block: bool) -> Vec<Property> {
        let mut properties = Vec::new();
        let mut iterations = 0usize;
        loop {
            self.skip_whitespace_and_comments();
            match self.peek() {
                None => {
                    if in_block {
                        self.report(DiagnosticKind::ParseRecoverable, "unterminated declaration block");
                    }
                    break;
                }
                Some('}') => {
                    self.bump();
                    if in_block {
                        break;
                    }
                    self.report(DiagnosticKind::ParseRecoverable, "stray '}' in declarations");
                    continue;
                }
                Some(';') => {
                    self.bump();
                    continue;
                }
                Some(_) => {}
            }
            if iterations >= self.limits.max_property_iterations {
                self.report(
                    DiagnosticKind::IterationBudgetExceeded,
                    format!(
                        "declaration block truncated at {} entries",
                        self.limits.max_property_iterations
                    ),
                );
                if in_block {
                    self.skip_rest_of_block();
                }
                break;
            }
            iterations += 1;

            let start = self.pos;
            if let Some(property) = self.read_declaration() {
                properties.push(property);
            }
            if self.pos == start {
                self.bump();
            }
        }
        properties
    }

    /// Consume up to and including the `}` closing the current block.
    fn skip_rest_of_block(&mut self) {
        let mut depth = 1usize;
        let mut scratch = String::new();
        while let Some(c) = self.peek() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                }
                '"' | '\'' => {
                    scratch.clear();
                    let _ = self.read_quoted(&mut scratch);
                    continue;
                }
                '/' if self.at_comment() => {
                    self.skip_comment();
                    continue;
                }
                _ => {}
            }
            self.bump();
        }
    }

    /// `name : value`, stopping before the terminating `;` or `}`.
    fn read_declaration(&mut self) -> Option<Property> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if matches!(c, ':' | ';' | '}' | '{') || (c == '/' && self.at_comment()) {
                break;
            }
            name.push(c);
            self.bump();
        }
        self.skip_whitespace_and_comments();
        let name = name.trim().to_ascii_lowercase();

        match self.peek() {
            Some(':') => self.bump(),
            Some('{') => {
                self.report(
                    DiagnosticKind::ParseRecoverable,
                    format!("nested block after '{name}' ignored"),
                );
                self.skip_block();
                return None;
            }
            _ => {
                if !name.is_empty() {
                    self.report(
                        DiagnosticKind::ParseRecoverable,
                        format!("declaration '{name}' has no value"),
                    );
                }
                return None;
            }
        }

        let value = self.read_value()?;
        if name.is_empty() || name.contains(char::is_whitespace) {
            self.report(
                DiagnosticKind::ParseRecoverable,
                format!("malformed property name '{name}'"),
            );
            return None;
        }
        let (value, important) = strip_important(&value);
        Some(Property {
            name,
            value,
            important,
        })
    }

    /// Value text up to `;` or `}` outside quotes and parentheses.
    fn read_value(&mut self) -> Option<String> {
        let mut value = String::new();
        let mut valid = true;
        let mut scanned = 0usize;
        let mut parens = 0usize;
        while let Some(c) = self.peek() {
            if valid && scanned >= self.limits.max_scan_chars {
                self.report(
                    DiagnosticKind::IterationBudgetExceeded,
                    format!("value longer than {} characters", self.limits.max_scan_chars),
                );
                valid = false;
            }
            scanned += 1;
            match c {
                '}' => break,
                ';' if parens == 0 => break,
                '{' => {
                    self.report(DiagnosticKind::ParseRecoverable, "block inside value");
                    self.skip_block();
                    valid = false;
                }
                '"' | '\'' => {
                    let mut quoted = String::new();
                    if self.read_quoted(&mut quoted) != Quoted::Closed {
                        valid = false;
                    }
                    if valid {
                        value.push_str(&quoted);
                    }
                }
                '/' if self.at_comment() => self.skip_comment(),
                _ => {
                    if c == '(' {
                        parens += 1;
                    } else if c == ')' {
                        parens = parens.saturating_sub(1);
                    } else if c == '\n' {
                        // An unclosed paren never swallows the rest of the sheet.
                        parens = 0;
                    }
                    if valid {
                        value.push(c);
                    }
                    self.bump();
                }
            }
        }
        if valid { Some(value) } else { None }
    }
}

/// Split a selector list on commas that are outside brackets and quotes.
fn split_selector_list(prelude: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut brackets = 0usize;
    let mut parens = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in prelude.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' => brackets += 1,
                ']' => brackets = brackets.saturating_sub(1),
                '(' => parens += 1,
                ')' => parens = parens.saturating_sub(1),
                ',' if brackets == 0 && parens == 0 => {
                    parts.push(prelude[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(prelude[start..].trim());
    parts
}

/// Remove a trailing `!important`, returning the trimmed value and the flag.
fn strip_important(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    if let Some(bang) = trimmed.rfind('!') {
        if trimmed[bang + 1..].trim().eq_ignore_ascii_case("important") {
            return (trimmed[..bang].trim_end().to_string(), true);
        }
    }
    (trimmed.to_string(), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_brackets_and_quotes() {
        let parts = split_selector_list(r#"a, [title="x,y"], b > c"#);
        assert_eq!(parts, vec!["a", r#"[title="x,y"]"#, "b > c"]);
    }

    #[test]
    fn test_strip_important() {
        assert_eq!(strip_important("red !important"), ("red".to_string(), true));
        assert_eq!(strip_important("red ! IMPORTANT "), ("red".to_string(), true));
        assert_eq!(strip_important("red"), ("red".to_string(), false));
        assert_eq!(strip_important("'!'"), ("'!'".to_string(), false));
    }
}
