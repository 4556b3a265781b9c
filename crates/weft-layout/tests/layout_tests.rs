//! Integration tests for building, laying out and rendering documents.
//!
//! Every test uses a 10px base font with the approximate metrics: glyphs are
//! 6px wide and lines 12px tall.

use std::rc::Rc;

use weft_common::{CollectingSink, DiagnosticKind};
use weft_css::{Color, TextAlign};
use weft_dom::{BreakKind, Bullet, ElementData, NodeId, NodeType};
use weft_layout::{
    BoxProperty, DisplayCommand, DisplayList, Document, EngineConfig, FontFlags, FontType, ListKind,
    ListOp, Rect,
};

fn config() -> EngineConfig {
    EngineConfig {
        default_font_size: 10.0,
        ..EngineConfig::default()
    }
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

fn div() -> ElementData {
    ElementData::new("div")
}

/// A document with an empty `body` root box.
fn document() -> (Document, NodeId) {
    let mut doc = Document::new(config());
    let body = doc.add_box(NodeId::ROOT, ElementData::new("body")).unwrap();
    (doc, body)
}

/// Append a child box with inline style `style`, closed again.
fn styled_box(doc: &mut Document, parent: NodeId, style: &str) -> NodeId {
    let node = doc.add_box(parent, div()).unwrap();
    let _ = doc
        .configure(node, [BoxProperty::Style(style.to_string())])
        .unwrap();
    doc.close_box(node).unwrap();
    node
}

fn push_list() -> BoxProperty {
    BoxProperty::List(ListOp::Push {
        kind: ListKind::Unordered,
        style: None,
        horizontal: false,
    })
}

#[test]
fn test_text_wraps_at_the_last_word_that_fits() {
    let (mut doc, body) = document();
    let text = doc.add_text(body, "aaaa bbbb cccc dddd").unwrap();

    let outcome = doc.layout(100.0, 400.0).unwrap();
    assert!(approx(outcome.height, 24.0));
    assert!(!outcome.needs_another_pass);

    let lines = doc.line_index(body).unwrap();
    assert_eq!(lines.len(), 2);
    let second = lines.get(1).unwrap();
    assert_eq!(second.offset, 15);
    assert!(second.continues);
    assert!(approx(second.y, 12.0));

    let frame = doc.frame(text).unwrap();
    assert!(approx(frame.width, 84.0));
    assert!(approx(frame.height, 12.0));
}

#[test]
fn test_centered_line() {
    let (mut doc, body) = document();
    let _ = doc
        .configure(body, [BoxProperty::DivAlign(TextAlign::Center)])
        .unwrap();
    let text = doc.add_text(body, "ab").unwrap();
    let _ = doc.layout(100.0, 400.0).unwrap();
    assert!(approx(doc.frame(text).unwrap().x, 44.0));
}

#[test]
fn test_text_flows_beside_a_left_float() {
    let (mut doc, body) = document();
    let float = styled_box(&mut doc, body, "float: left; width: 50px; height: 30px");
    let text = doc.add_text(body, "aaaa bbbb").unwrap();

    let outcome = doc.layout(200.0, 400.0).unwrap();

    assert_eq!(doc.frame(float).unwrap(), Rect::new(0.0, 0.0, 50.0, 30.0));
    let frame = doc.frame(text).unwrap();
    assert!(approx(frame.x, 50.0));
    assert!(approx(frame.y, 0.0));
    // The float hangs below the only line.
    assert!(approx(outcome.height, 30.0));
}

#[test]
fn test_word_wider_than_the_room_beside_a_float_moves_below_it() {
    let (mut doc, body) = document();
    let _ = styled_box(&mut doc, body, "float: left; width: 150px; height: 30px");
    let text = doc.add_text(body, "aaaaaaaaaa").unwrap();

    let outcome = doc.layout(200.0, 400.0).unwrap();

    let frame = doc.frame(text).unwrap();
    assert!(approx(frame.x, 0.0));
    assert!(approx(frame.y, 30.0));
    assert!(approx(outcome.height, 42.0));
}

#[test]
fn test_clearing_break_moves_below_left_floats() {
    let (mut doc, body) = document();
    let _ = styled_box(&mut doc, body, "float: left; width: 50px; height: 30px");
    let first = doc.add_text(body, "a").unwrap();
    let _ = doc.add_break(body, BreakKind::ClearLeft).unwrap();
    let second = doc.add_text(body, "b").unwrap();

    let _ = doc.layout(200.0, 400.0).unwrap();

    assert!(approx(doc.frame(first).unwrap().x, 50.0));
    let frame = doc.frame(second).unwrap();
    assert!(approx(frame.x, 0.0));
    assert!(approx(frame.y, 30.0));
}

#[test]
fn test_right_float_shrinks_to_its_content() {
    let (mut doc, body) = document();
    let float = styled_box(&mut doc, body, "float: right");
    let _ = doc.add_text(float, "aaaa bbbb").unwrap();

    let _ = doc.layout(200.0, 400.0).unwrap();

    let frame = doc.frame(float).unwrap();
    assert!(approx(frame.width, 54.0));
    assert!(approx(frame.x, 146.0));
}

#[test]
fn test_nested_lists_indent_and_pick_bullets_by_depth() {
    let (mut doc, body) = document();
    let _ = doc.configure(body, [push_list()]).unwrap();
    let outer = doc.add_marker(body).unwrap().unwrap();
    let _ = doc.add_text(body, "one").unwrap();
    let _ = doc.add_break(body, BreakKind::Line).unwrap();
    let _ = doc.configure(body, [push_list()]).unwrap();
    let inner = doc.add_marker(body).unwrap().unwrap();
    let _ = doc.add_text(body, "two").unwrap();
    let _ = doc.add_break(body, BreakKind::Line).unwrap();
    let _ = doc
        .configure(body, [BoxProperty::List(ListOp::Pop), BoxProperty::List(ListOp::Pop)])
        .unwrap();
    let after = doc.add_text(body, "after").unwrap();

    let bullet = |node: NodeId| match &doc.tree().get(node).unwrap().node_type {
        NodeType::Marker(bullet) => bullet.clone(),
        other => panic!("expected a marker, got {other:?}"),
    };
    assert_eq!(bullet(outer), Bullet::Disc(1));
    assert_eq!(bullet(inner), Bullet::Disc(2));
    assert_eq!(doc.context(outer).unwrap().indent, 1);
    assert_eq!(doc.context(inner).unwrap().indent, 2);
    assert_eq!(doc.context(after).unwrap().indent, 0);

    let _ = doc.layout(400.0, 400.0).unwrap();
    assert!(approx(doc.frame(outer).unwrap().x, 40.0));
    assert!(approx(doc.frame(inner).unwrap().x, 80.0));
    let frame = doc.frame(after).unwrap();
    assert!(approx(frame.x, 0.0));
    assert!(approx(frame.y, 24.0));
}

#[test]
fn test_ordered_list_numbers_items() {
    let (mut doc, body) = document();
    let _ = doc
        .configure(
            body,
            [BoxProperty::List(ListOp::Push {
                kind: ListKind::Ordered,
                style: None,
                horizontal: false,
            })],
        )
        .unwrap();
    let _ = doc.add_marker(body).unwrap();
    let second = doc.add_marker(body).unwrap().unwrap();
    assert!(matches!(
        &doc.tree().get(second).unwrap().node_type,
        NodeType::Marker(Bullet::Label(label)) if label == "2."
    ));
}

#[test]
fn test_appending_resumes_at_the_changed_line() {
    let (mut doc, body) = document();
    let mut blocks = Vec::new();
    for word in ["one", "two", "three"] {
        let block = doc.add_box(body, div()).unwrap();
        let _ = doc.add_text(block, word).unwrap();
        doc.close_box(block).unwrap();
        blocks.push(block);
    }
    let _ = doc.layout(100.0, 400.0).unwrap();
    assert_eq!(doc.line_index(body).unwrap().len(), 3);
    assert!(approx(doc.frame(blocks[2]).unwrap().y, 24.0));

    let _ = doc.add_text(blocks[2], " more").unwrap();
    let outcome = doc.layout(100.0, 400.0).unwrap();

    assert!(approx(outcome.height, 36.0));
    assert_eq!(doc.layout_box(body).unwrap().first_touched_line, 2);
    assert_eq!(doc.line_index(body).unwrap().len(), 3);
    assert_eq!(doc.layout_box(blocks[2]).unwrap().fragments.len(), 2);

    // A changed render starts at the first rewritten line.
    let mut list = DisplayList::new();
    doc.render(Rect::new(0.0, 0.0, 100.0, 100.0), true, false, &mut list)
        .unwrap();
    assert_eq!(list.texts(), vec!["three", " more"]);
}

#[test]
fn test_unchanged_layout_is_reused() {
    let (mut doc, body) = document();
    let _ = doc.add_text(body, "aaaa").unwrap();
    let first = doc.layout(100.0, 400.0).unwrap();
    assert!(doc.layout_box(body).unwrap().layout_ready);
    let again = doc.layout(100.0, 400.0).unwrap();
    assert_eq!(first, again);
}

#[test]
fn test_replaced_content_without_a_size_asks_for_another_pass() {
    let (mut doc, body) = document();
    let image = doc.add_replaced(body, "img", None).unwrap();

    let outcome = doc.layout(200.0, 400.0).unwrap();
    assert!(outcome.needs_another_pass);
    assert_eq!(doc.frame(image).unwrap(), Rect::new(0.0, 0.0, 20.0, 20.0));

    doc.set_replaced_size(image, 30.0, 40.0).unwrap();
    let outcome = doc.layout(200.0, 400.0).unwrap();
    assert!(!outcome.needs_another_pass);
    assert_eq!(doc.frame(image).unwrap(), Rect::new(0.0, 0.0, 30.0, 40.0));
}

#[test]
fn test_positioned_children() {
    let (mut doc, body) = document();
    let _ = doc
        .configure(body, [BoxProperty::Style("height: 100px".to_string())])
        .unwrap();
    let top_left = styled_box(
        &mut doc,
        body,
        "position: absolute; left: 10px; top: 20px; width: 50px; height: 10px",
    );
    let bottom_right = styled_box(
        &mut doc,
        body,
        "position: absolute; right: 10px; bottom: 10px; width: 50px; height: 10px",
    );
    let relative = doc.add_box(body, div()).unwrap();
    let _ = doc
        .configure(
            relative,
            [BoxProperty::Style("position: relative; left: 5px; top: 5px".to_string())],
        )
        .unwrap();
    let _ = doc.add_text(relative, "x").unwrap();
    doc.close_box(relative).unwrap();

    let _ = doc.layout(200.0, 300.0).unwrap();

    assert_eq!(doc.frame(top_left).unwrap(), Rect::new(10.0, 20.0, 50.0, 10.0));
    assert_eq!(doc.frame(bottom_right).unwrap(), Rect::new(140.0, 80.0, 50.0, 10.0));
    let frame = doc.frame(relative).unwrap();
    assert!(approx(frame.x, 5.0));
    assert!(approx(frame.y, 5.0));
}

#[test]
fn test_render_paints_by_stack_level_inside_the_clip() {
    let (mut doc, body) = document();
    let _ = doc
        .configure(
            body,
            [BoxProperty::Style(
                "background-color: red; height: 100px; overflow: hidden".to_string(),
            )],
        )
        .unwrap();
    let above = doc.add_box(body, div()).unwrap();
    let _ = doc
        .configure(
            above,
            [
                BoxProperty::ZIndex(1),
                BoxProperty::Style(
                    "position: absolute; background-color: lime; width: 10px; height: 10px"
                        .to_string(),
                ),
            ],
        )
        .unwrap();
    doc.close_box(above).unwrap();
    let _ = doc.add_text(body, "hi").unwrap();
    let below = doc.add_box(body, div()).unwrap();
    let _ = doc
        .configure(
            below,
            [
                BoxProperty::ZIndex(-1),
                BoxProperty::Style(
                    "position: absolute; background-color: blue; width: 10px; height: 10px"
                        .to_string(),
                ),
            ],
        )
        .unwrap();
    doc.close_box(below).unwrap();

    let _ = doc.layout(200.0, 300.0).unwrap();
    let mut list = DisplayList::new();
    doc.render(Rect::new(0.0, 0.0, 200.0, 300.0), false, false, &mut list)
        .unwrap();

    let painted: Vec<String> = list
        .commands()
        .iter()
        .map(|command| match command {
            DisplayCommand::FillRect { color, .. } if *color == Color::rgb(255, 0, 0) => "red".to_string(),
            DisplayCommand::FillRect { color, .. } if *color == Color::rgb(0, 0, 255) => "blue".to_string(),
            DisplayCommand::FillRect { color, .. } if *color == Color::rgb(0, 255, 0) => "lime".to_string(),
            DisplayCommand::Text { text, .. } => text.clone(),
            DisplayCommand::PushClip { .. } => "push".to_string(),
            DisplayCommand::PopClip => "pop".to_string(),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(painted, ["red", "push", "blue", "hi", "lime", "pop"]);
    assert!(matches!(
        list.commands()[1],
        DisplayCommand::PushClip { rect } if rect == Rect::new(0.0, 0.0, 200.0, 100.0)
    ));
}

#[test]
fn test_consecutive_font_options_form_one_entry() {
    let (mut doc, body) = document();
    let depth = doc.font_stack().depth();
    let _ = doc
        .configure(
            body,
            [BoxProperty::SetHardStyle(FontFlags::BOLD), BoxProperty::FontSize(20.0)],
        )
        .unwrap();
    assert_eq!(doc.font_stack().depth(), depth + 1);

    let text = doc.add_text(body, "x").unwrap();
    let context = doc.context(text).unwrap();
    assert!(approx(context.font_size, 20.0));
    assert!(context.flags.contains(FontFlags::BOLD));

    let _ = doc.configure(body, [BoxProperty::FontEnd]).unwrap();
    assert_eq!(doc.font_stack().depth(), depth);
}

#[test]
fn test_unmatched_font_end_is_reported() {
    let sink = Rc::new(CollectingSink::new());
    let mut doc = Document::with_sink(config(), Box::new(Rc::clone(&sink)));
    let body = doc.add_box(NodeId::ROOT, ElementData::new("body")).unwrap();
    let _ = doc.configure(body, [BoxProperty::FontEnd]).unwrap();
    assert_eq!(doc.font_stack().depth(), 1);
    assert_eq!(sink.count(DiagnosticKind::ParseRecoverable), 1);
}

#[test]
fn test_removing_a_box_releases_its_fonts() {
    let (mut doc, body) = document();
    doc.merge_stylesheet(".big { font-size: 20px }");
    let big = doc
        .add_box(body, div().with_attr("class", "big"))
        .unwrap();
    let _ = doc.add_text(big, "large").unwrap();
    doc.close_box(big).unwrap();
    assert_eq!(doc.fonts().len(), 2);

    doc.remove(big).unwrap();
    assert_eq!(doc.fonts().len(), 1);
    assert!(doc.layout_box(big).is_err());
    let _ = doc.layout(100.0, 100.0).unwrap();
}

#[test]
fn test_late_stylesheet_restyles_existing_boxes() {
    let (mut doc, body) = document();
    let block = doc
        .add_box(body, div().with_attr("class", "box").with_attr("id", "main"))
        .unwrap();
    doc.close_box(block).unwrap();

    let _ = doc.layout(200.0, 400.0).unwrap();
    assert!(approx(doc.frame(block).unwrap().width, 200.0));

    doc.merge_stylesheet(".box { width: 50px }");
    let _ = doc.layout(200.0, 400.0).unwrap();
    assert!(approx(doc.frame(block).unwrap().width, 50.0));

    doc.merge_stylesheet("#main { width: 60px } .box { width: 70px }");
    let _ = doc.layout(200.0, 400.0).unwrap();
    assert!(approx(doc.frame(block).unwrap().width, 60.0));
}

#[test]
fn test_measure_reports_preferred_and_minimum_widths() {
    let (mut doc, body) = document();
    let _ = doc.add_text(body, "aaaa bbbb").unwrap();
    let (preferred, minimum) = doc.measure(body, 200.0, 400.0, false).unwrap();
    assert!(approx(preferred, 54.0));
    assert!(approx(minimum, 24.0));
}

#[test]
fn test_measure_recomputes_after_a_descendant_grows() {
    let (mut doc, body) = document();
    let block = doc.add_box(body, div()).unwrap();
    let _ = doc.add_text(block, "aaaa").unwrap();
    doc.close_box(block).unwrap();
    let _ = doc.layout(200.0, 400.0).unwrap();
    assert!(doc.layout_box(body).unwrap().changed_child.is_none());

    let (preferred, _) = doc.measure(body, 200.0, 400.0, true).unwrap();
    assert!(approx(preferred, 24.0));
    assert!(doc.layout_box(body).unwrap().measure_cache.is_some());

    let _ = doc.add_text(block, " bbbbbb").unwrap();
    assert_eq!(doc.layout_box(body).unwrap().changed_child, Some(block));
    let (grown, minimum) = doc.measure(body, 200.0, 400.0, true).unwrap();
    assert!(approx(grown, 66.0));
    assert!(approx(minimum, 36.0));
}

#[test]
fn test_step_cap_truncates_the_pass() {
    let sink = Rc::new(CollectingSink::new());
    let config = EngineConfig {
        layout_step_cap: 5,
        ..config()
    };
    let mut doc = Document::with_sink(config, Box::new(Rc::clone(&sink)));
    let body = doc.add_box(NodeId::ROOT, ElementData::new("body")).unwrap();
    for _ in 0..20 {
        let _ = doc.add_text(body, "a ").unwrap();
        let _ = doc.add_break(body, BreakKind::Line).unwrap();
    }

    assert!(doc.layout(100.0, 100.0).is_ok());
    assert_eq!(sink.count(DiagnosticKind::IterationBudgetExceeded), 1);
    assert!(doc.line_index(body).unwrap().len() < 20);
}

#[test]
fn test_absolute_rect_adds_ancestor_offsets() {
    let (mut doc, body) = document();
    let _ = doc
        .configure(body, [BoxProperty::PaddingLeft(7.0), BoxProperty::PaddingTop(3.0)])
        .unwrap();
    let block = doc.add_box(body, div()).unwrap();
    let text = doc.add_text(block, "x").unwrap();
    doc.close_box(block).unwrap();

    let _ = doc.layout(100.0, 100.0).unwrap();
    let rect = doc.absolute_rect(text).unwrap();
    assert!(approx(rect.x, 7.0));
    assert!(approx(rect.y, 3.0));
}

#[test]
fn test_whitespace_only_nowrap_text_makes_no_line() {
    let (mut doc, body) = document();
    let block = styled_box(&mut doc, body, "white-space: nowrap");
    let _ = doc.add_text(block, "   ").unwrap();

    let _ = doc.layout(100.0, 400.0).unwrap();

    assert!(doc.line_index(block).unwrap().is_empty());
    assert!(approx(doc.frame(block).unwrap().height, 0.0));
}

#[test]
fn test_clearing_render_backs_up_past_lines_beside_floats() {
    let red = Color::rgb(255, 0, 0);
    let (mut doc, body) = document();
    let _ = doc.configure(body, [BoxProperty::BgColor(red)]).unwrap();
    let _ = styled_box(&mut doc, body, "float: left; width: 50px; height: 20px");
    let _ = doc.add_text(body, "a").unwrap();
    let _ = doc.add_break(body, BreakKind::Line).unwrap();
    let _ = doc.add_text(body, "b").unwrap();
    let _ = doc.add_break(body, BreakKind::Line).unwrap();
    let _ = doc.add_text(body, "c").unwrap();
    let _ = doc.layout(200.0, 400.0).unwrap();
    {
        let lines = doc.line_index(body).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines.get(1).unwrap().has_floats);
        assert!(!lines.get(2).unwrap().has_floats);
    }

    // A float appended to the last line puts it beside a float too.
    let _ = styled_box(&mut doc, body, "float: left; width: 50px; height: 30px");
    let _ = doc.layout(200.0, 400.0).unwrap();
    assert_eq!(doc.layout_box(body).unwrap().first_touched_line, 2);
    assert!(doc.line_index(body).unwrap().get(2).unwrap().has_floats);

    let mut list = DisplayList::new();
    doc.render(Rect::new(0.0, 0.0, 200.0, 400.0), true, true, &mut list)
        .unwrap();
    assert!(matches!(
        list.commands()[0],
        DisplayCommand::FillRect { rect, color } if approx(rect.y, 0.0) && color == red
    ));
    assert_eq!(list.texts(), vec!["a", "b", "c"]);
}

#[test]
fn test_merging_the_same_stylesheet_again_changes_nothing() {
    const CSS: &str = ".note { float: left; width: 50px; height: 30px } \
                       #main { padding-left: 4px; width: 120px }";
    let (mut doc, body) = document();
    doc.merge_stylesheet(CSS);
    let note = doc.add_box(body, div().with_attr("class", "note")).unwrap();
    doc.close_box(note).unwrap();
    let main = doc
        .add_box(body, ElementData::new("p").with_attr("id", "main"))
        .unwrap();
    let text = doc.add_text(main, "aaaa bbbb cccc").unwrap();
    doc.close_box(main).unwrap();

    let frames = |doc: &Document| [note, main, text].map(|node| doc.frame(node).unwrap());
    let _ = doc.layout(200.0, 400.0).unwrap();
    let before = frames(&doc);
    assert!(approx(before[0].width, 50.0));
    assert!(approx(before[1].width, 124.0));

    let rules = doc.stylesheet().len();
    doc.merge_stylesheet(CSS);
    assert_eq!(doc.stylesheet().len(), rules * 2);
    let _ = doc.layout(200.0, 400.0).unwrap();
    assert_eq!(frames(&doc), before);
}

#[test]
fn test_each_box_holds_one_reference_to_its_font() {
    let (mut doc, body) = document();
    let block = doc.add_box(body, div()).unwrap();
    let _ = doc.add_text(block, "x").unwrap();
    doc.close_box(block).unwrap();

    let font = doc.context(block).unwrap().font;
    assert_eq!(doc.layout_box(block).unwrap().fonts, vec![font]);
    // Held once by the body and once by the block.
    assert_eq!(doc.fonts().ref_count(font), 2);

    doc.remove(block).unwrap();
    assert_eq!(doc.fonts().ref_count(font), 1);
}

#[test]
fn test_fixed_hard_style_switches_face_until_unset() {
    let face = |doc: &Document, node: NodeId| -> String {
        let font = doc.context(node).unwrap().font;
        doc.fonts().get(font).unwrap().face.clone()
    };
    let (mut doc, body) = document();
    let _ = doc
        .configure(body, [BoxProperty::SetHardStyle(FontFlags::FIXED)])
        .unwrap();
    let code = doc.add_text(body, "code").unwrap();
    let _ = doc
        .configure(body, [BoxProperty::UnsetHardStyle(FontFlags::FIXED)])
        .unwrap();
    let prose = doc.add_text(body, "prose").unwrap();

    assert_eq!(face(&doc, code), "monospace");
    assert_eq!(face(&doc, prose), "serif");
    assert!(!doc.context(code).unwrap().flags.contains(FontFlags::FIXED));

    // A fixed base wins over every entry.
    doc.font_stack_mut().patch_base_type(FontType::Fixed);
    let _ = doc
        .configure(body, [BoxProperty::UnsetHardStyle(FontFlags::FIXED)])
        .unwrap();
    let forced = doc.add_text(body, "forced").unwrap();
    assert_eq!(face(&doc, forced), "monospace");
}
