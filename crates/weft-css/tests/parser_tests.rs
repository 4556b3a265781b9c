//! Integration tests for the bounded CSS parser.

use quickcheck_macros::quickcheck;
use weft_common::{CollectingSink, DiagnosticKind, NullSink};
use weft_css::{ParserLimits, Property, Stylesheet, parse, parse_declarations};

fn parse_collecting(css: &str) -> (Stylesheet, CollectingSink) {
    let sink = CollectingSink::new();
    let sheet = Stylesheet::parse_with(css, &ParserLimits::default(), &sink);
    (sheet, sink)
}

#[test]
fn test_parse_simple_rule() {
    let sheet = parse("p { color: red; margin-left: 4px }");
    assert_eq!(sheet.len(), 1);
    let rule = &sheet.rules[0];
    assert_eq!(rule.selectors.len(), 1);
    assert_eq!(rule.selectors[0].text, "p");
    assert_eq!(
        rule.properties,
        vec![Property::new("color", "red"), Property::new("margin-left", "4px")]
    );
}

#[test]
fn test_selector_list_and_order() {
    let sheet = parse("h1, h2 , .x{font-weight:bold} div{}");
    assert_eq!(sheet.len(), 2);
    assert_eq!(sheet.rules[0].selectors.len(), 3);
    assert_eq!(sheet.rules[0].order, 0);
    assert_eq!(sheet.rules[1].order, 1);
}

#[test]
fn test_comments_and_at_rules_are_skipped() {
    let css = r"
        /* header */
        @import url(base.css);
        @media screen { p { color: red } div { color: blue } }
        p /* inline */ { color: /* mid */ green }
        @font-face { font-family: x; src: url('a;b') }
        b { color: black }
    ";
    let sheet = parse(css);
    assert_eq!(sheet.len(), 2);
    assert_eq!(sheet.rules[0].properties[0].value, "green");
    assert_eq!(sheet.rules[1].selectors[0].text, "b");
}

#[test]
fn test_quoted_values_keep_delimiters() {
    let sheet = parse(r#"q { content: "a;b}c"; font-family: 'Times New Roman', serif }"#);
    let props = &sheet.rules[0].properties;
    assert_eq!(props[0].value, r#""a;b}c""#);
    assert_eq!(props[1].value, "'Times New Roman', serif");
}

#[test]
fn test_important_flag_recorded() {
    let sheet = parse("p { color: red !important; width: 5px }");
    let props = &sheet.rules[0].properties;
    assert!(props[0].important);
    assert_eq!(props[0].value, "red");
    assert!(!props[1].important);
}

#[test]
fn test_unsupported_selector_drops_only_itself() {
    let (sheet, sink) = parse_collecting("a + b, .ok, li:nth-child(2) { color: red }");
    assert_eq!(sheet.len(), 1);
    assert_eq!(sheet.rules[0].selectors.len(), 1);
    assert_eq!(sheet.rules[0].selectors[0].text, ".ok");
    assert_eq!(sink.count(DiagnosticKind::Unsupported), 2);
}

#[test]
fn test_rule_with_no_valid_selector_is_dropped() {
    let (sheet, _) = parse_collecting("a ~ b { color: red } p { color: blue }");
    assert_eq!(sheet.len(), 1);
    assert_eq!(sheet.rules[0].selectors[0].text, "p");
}

#[test]
fn test_recovery_after_malformed_declarations() {
    let (sheet, sink) = parse_collecting("p { color red; : 3px; width: 10px } div { height: 1px }");
    assert_eq!(sheet.len(), 2);
    assert_eq!(sheet.rules[0].properties, vec![Property::new("width", "10px")]);
    assert_eq!(sheet.rules[1].properties, vec![Property::new("height", "1px")]);
    assert!(sink.count(DiagnosticKind::ParseRecoverable) >= 1);
}

#[test]
fn test_stray_braces_and_missing_blocks() {
    let (sheet, sink) = parse_collecting("} p; div { color: red } }}} span { color: blue }");
    let selectors: Vec<&str> = sheet
        .rules
        .iter()
        .map(|r| r.selectors[0].text.as_str())
        .collect();
    assert_eq!(selectors, vec!["div", "span"]);
    assert!(sink.count(DiagnosticKind::ParseRecoverable) >= 3);
}

#[test]
fn test_deeply_nested_braces_terminate() {
    let css = format!("{}{}", "{".repeat(50_000), "p { color: red }");
    let sheet = parse(&css);
    assert!(sheet.is_empty());
}

#[test]
fn test_unterminated_string_terminates() {
    let (sheet, _) = parse_collecting("p { content: \"never closed ; color: red }");
    assert!(sheet.len() <= 1);
    let (sheet, _) = parse_collecting("p { content: 'x\n'; color: red }");
    assert_eq!(sheet.len(), 1);
}

#[test]
fn test_long_value_is_discarded() {
    let long = "x".repeat(20_000);
    let css = format!("p {{ font-family: {long}; color: red }}");
    let (sheet, sink) = parse_collecting(&css);
    assert_eq!(sheet.len(), 1);
    assert_eq!(sheet.rules[0].properties, vec![Property::new("color", "red")]);
    assert_eq!(sink.count(DiagnosticKind::IterationBudgetExceeded), 1);
}

#[test]
fn test_step_cap_truncates() {
    let limits = ParserLimits {
        max_steps: 3,
        ..ParserLimits::default()
    };
    let sink = CollectingSink::new();
    let sheet = Stylesheet::parse_with("a{} b{} c{} d{} e{}", &limits, &sink);
    assert_eq!(sheet.len(), 3);
    assert_eq!(sink.count(DiagnosticKind::IterationBudgetExceeded), 1);
}

#[test]
fn test_property_cap_truncates_block() {
    let limits = ParserLimits {
        max_property_iterations: 2,
        ..ParserLimits::default()
    };
    let sheet = Stylesheet::parse_with(
        "p { a: 1; b: 2; c: 3; d: 4 } q { e: 5 }",
        &limits,
        &NullSink,
    );
    assert_eq!(sheet.len(), 2);
    assert_eq!(sheet.rules[0].properties.len(), 2);
    assert_eq!(sheet.rules[1].properties.len(), 1);
}

#[test]
fn test_merge_appends_with_continuing_order() {
    let mut sheet = parse("p { color: red }");
    sheet.merge("p { color: blue } div { color: green }");
    assert_eq!(sheet.len(), 3);
    let orders: Vec<usize> = sheet.rules.iter().map(|r| r.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert_eq!(sheet.rules[0].properties[0].value, "red");
}

#[test]
fn test_parse_declarations_for_style_attribute() {
    let props = parse_declarations("color: red; ; width:10px;  background: url(a.png)");
    assert_eq!(
        props,
        vec![
            Property::new("color", "red"),
            Property::new("width", "10px"),
            Property::new("background", "url(a.png)"),
        ]
    );
}

#[test]
fn test_html_comment_delimiters_ignored() {
    let sheet = parse("<!-- p { color: red } -->");
    assert_eq!(sheet.len(), 1);
}

#[quickcheck]
fn prop_parse_terminates_on_any_input(input: String) -> bool {
    let sheet = Stylesheet::parse_with(&input, &ParserLimits::default(), &NullSink);
    sheet.rules.iter().all(|r| !r.selectors.is_empty())
}

#[quickcheck]
fn prop_parse_terminates_on_css_alphabet(bytes: Vec<u8>) -> bool {
    const ALPHABET: &[u8] = b"{}[]()\"';:,.#*>+~@/!\\ \nabp-=^$|";
    let input: String = bytes
        .iter()
        .map(|b| ALPHABET[usize::from(*b) % ALPHABET.len()] as char)
        .collect();
    let sheet = Stylesheet::parse_with(&input, &ParserLimits::default(), &NullSink);
    let _ = weft_css::parse_declarations_with(&input, &ParserLimits::default(), &NullSink);
    sheet.len() <= input.len()
}
