//! Common utilities for the weft engine.
//!
//! This crate provides shared infrastructure used by all engine components:
//! - **Diagnostics** - an injectable sink that parser, matcher, cascade and
//!   layout report recoverable problems to, instead of a process-wide flag

pub mod diagnostics;

pub use diagnostics::{
    CollectingSink, Component, Diagnostic, DiagnosticKind, DiagnosticSink, LogSink, NullSink,
};
