//! Engine diagnostics.
//!
//! Nothing in the engine is fatal to the hosting document. Malformed CSS,
//! exhausted iteration budgets and failed allocations are reported to a
//! [`DiagnosticSink`] handed in by the host, and the engine carries on with
//! a best-effort result.
//!
//! [`LogSink`] forwards to the `log` facade and deduplicates so that the same
//! warning is not repeated for every box in a large tree.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use strum_macros::Display;

/// The engine component a diagnostic originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Component {
    /// The CSS text parser.
    #[strum(serialize = "css-parser")]
    Parser,
    /// Selector matching.
    #[strum(serialize = "selector")]
    Selector,
    /// Cascade and property application.
    #[strum(serialize = "cascade")]
    Cascade,
    /// Measure, layout and render passes.
    #[strum(serialize = "layout")]
    Layout,
    /// The box configuration surface.
    #[strum(serialize = "builder")]
    Builder,
}

/// Taxonomy of recoverable conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DiagnosticKind {
    /// A malformed token or rule was skipped up to the next synchronization point.
    ParseRecoverable,
    /// A defensive cap was hit; the operation stopped early with a partial result.
    IterationBudgetExceeded,
    /// Growing a cache failed; the current sub-operation was abandoned.
    AllocationFailure,
    /// Input that is understood but deliberately ignored (unknown property,
    /// unsupported selector syntax).
    Unsupported,
}

/// A single reported condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where it came from.
    pub component: Component,
    /// What kind of condition it is.
    pub kind: DiagnosticKind,
    /// Human readable detail.
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic.
    #[must_use]
    pub fn new(component: Component, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            component,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.component, self.kind, self.message)
    }
}

/// Receiver for engine diagnostics.
///
/// The engine is single-threaded, so sinks take `&self` and use interior
/// mutability where they need state.
pub trait DiagnosticSink {
    /// Record one diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` facade, printing each unique message once.
#[derive(Debug, Default)]
pub struct LogSink {
    seen: RefCell<HashSet<String>>,
}

impl LogSink {
    /// Create a sink with an empty de-duplication set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget previously printed messages (call when loading a new page).
    pub fn clear(&self) {
        self.seen.borrow_mut().clear();
    }
}

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        let key = diagnostic.to_string();
        if !self.seen.borrow_mut().insert(key) {
            return;
        }
        match diagnostic.kind {
            DiagnosticKind::AllocationFailure | DiagnosticKind::IterationBudgetExceeded => {
                log::warn!(target: "weft", "{diagnostic}");
            }
            DiagnosticKind::ParseRecoverable => log::info!(target: "weft", "{diagnostic}"),
            DiagnosticKind::Unsupported => log::debug!(target: "weft", "{diagnostic}"),
        }
    }
}

/// Keeps every diagnostic in memory. Used by tests and by the CLI summary.
#[derive(Debug, Default)]
pub struct CollectingSink {
    items: RefCell<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.items.borrow().clone()
    }

    /// Number of diagnostics of the given kind.
    #[must_use]
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.borrow().iter().filter(|d| d.kind == kind).count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.items.borrow_mut().push(diagnostic);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// A shared sink, so the host can keep reading what a document reports.
impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Rc<T> {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}
