//! Float-aware incremental box layout for the weft engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **Document** ([`document`]): the box tree with its styles, insertion
//!   contexts, font and list stacks, and the configuration surface
//!   ([`properties`])
//!
//! - **Box model** ([`box_model`]): frames, resolved edges
//!
//! - **Floats** ([`float`]): per-side margin records that narrow the lines
//!   beside a float, with indent-aware clearing
//!
//! - **Lines** ([`line_index`], [`text`]): line breaking, alignment, shared
//!   baselines and a per-box line index for resuming layout mid-box
//!
//! - **Fonts** ([`font`], [`font_stack`]) and **lists** ([`list_stack`])
//!
//! - **Measure / Layout / Render**: intrinsic widths, incremental layout from
//!   the earliest changed child, and painting through a host [`Painter`]
//!   ([`render`])
//!
//! # Not Implemented
//!
//! - Margin collapsing
//! - Justified text (treated as left aligned)
//! - Bidirectional text and vertical writing modes
//! - Tables, flex and grid

/// Box geometry.
pub mod box_model;
/// Engine limits and defaults.
pub mod config;
/// The box tree and its build, configure and layout entry points.
pub mod document;
/// Layout errors.
pub mod error;
/// Float margin tracking.
pub mod float;
mod flow;
/// Font handles, cache and metrics.
pub mod font;
/// Nested font requests.
pub mod font_stack;
/// Per-box layout state.
pub mod layout_box;
/// Per-box line index.
pub mod line_index;
/// Nested lists and bullets.
pub mod list_stack;
mod measure;
mod positioned;
/// Box configuration options.
pub mod properties;
/// Painting.
pub mod render;
/// Whitespace and line fitting of text.
pub mod text;

pub use box_model::{BoxDimensions, EdgeSizes, Rect};
pub use config::EngineConfig;
pub use document::Document;
pub use error::LayoutError;
pub use float::{FloatMargins, FloatSide, MarginRecord};
pub use font::{ApproximateFontMetrics, FontCache, FontFlags, FontHandle, FontKey, FontMetrics, FontType};
pub use font_stack::{FontRequest, FontSize, FontStack, ResolvedFont};
pub use layout_box::{Fragment, FragmentKind, InsertionContext, LayoutBox, LayoutOutcome, LinkState, MeasureCache};
pub use line_index::{LineIndex, LineRecord};
pub use list_stack::{ListEntry, ListKind, ListStack, bullet_for};
pub use properties::{BoxProperty, ListOp};
pub use render::{DisplayCommand, DisplayList, Painter, TextRun};
pub use text::{TextFit, TextMeasure, collapse_whitespace};
