//! Annotation-driven source transformation.
//!
//! A traversal/matching collaborator locates annotated declarations in a
//! source buffer and hands each one to this crate as a
//! `(payload, match context, node)` triple. The payload is parsed into an
//! ordered sequence of transform calls, each call is resolved against a
//! registry of transform rules, and whatever replacement text a rule produces
//! is committed over the node's token-expanded source range. Rules may
//! delegate to an embedded interpreter session to run injected transform code
//! with typed access to the live host objects.
//!
//! ```text
//! payload ── payload::parse_payload ──> CallDescriptors (+ noise)
//!                    │
//!                    v
//!        Registry::find ──> TransformHandler::run        (engine/)
//!                    │               │
//!                    │               └─ Bridge::run_for_replacement (bridge/)
//!                    v
//!        apply_replacement ──> RewriteBuffer edits       (engine/rewrite.rs)
//! ```
//!
//! Failures are local to one call by design: malformed segments are inert,
//! unresolved rule names are warnings, interpreter failures yield "no
//! replacement". The only fatal conditions are programming errors in the
//! embedding host (duplicate rule registration, cross-sequence calls,
//! out-of-bounds replacement offsets).

#[macro_use]
mod macros;
mod api;
mod bridge;
mod engine;
mod host;
mod methods;
mod payload;
mod sequence;

pub use api::Session;
pub use bridge::marshal;
pub use bridge::{BoxedValue, Bridge, ExecError, HostBindings, Interpreter};
pub use engine::{DispatchContext, DispatchSummary, Registry, RewriteBuffer, TransformHandler, apply_replacement};
pub use host::{MatchContext, NodeId, SyntaxNode};
pub use methods::register_builtins;
pub use payload::{Argument, ArgumentSet, CallDescriptor, NoiseSegment, ParsedPayload, parse_payload};

// --- Shared core types -------------------------------------------------------

/// A `[start, end)` byte range over the host's canonical source positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "source range start {start} past end {end}");
        SourceRange { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `other` lies entirely within this range.
    pub fn contains(&self, other: &SourceRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Outcome of one transform rule invocation.
///
/// The three states are distinct and load-bearing:
///
/// - `replacement: None` — keep the original source for this call.
/// - `replacement: Some("")` — delete the annotated range.
/// - `replacement: Some(s)` — replace the annotated range with `s`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformResult {
    pub replacement: Option<String>,
}

impl TransformResult {
    /// Do not modify source for this call.
    pub fn keep() -> Self {
        TransformResult { replacement: None }
    }

    /// Delete the annotated range.
    pub fn erase() -> Self {
        TransformResult { replacement: Some(String::new()) }
    }

    /// Replace the annotated range with `text`.
    pub fn replace(text: impl Into<String>) -> Self {
        TransformResult { replacement: Some(text.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_is_not_keep() {
        // Some("") deletes; None keeps. Collapsing the two would silently
        // turn deletions into no-ops.
        assert_eq!(TransformResult::erase().replacement, Some(String::new()));
        assert_eq!(TransformResult::keep().replacement, None);
        assert_ne!(TransformResult::erase(), TransformResult::keep());
    }

    #[test]
    fn range_containment() {
        let outer = SourceRange::new(10, 42);
        assert!(outer.contains(&SourceRange::new(10, 42)));
        assert!(outer.contains(&SourceRange::new(12, 20)));
        assert!(!outer.contains(&SourceRange::new(9, 20)));
        assert_eq!(outer.len(), 32);
    }
}
