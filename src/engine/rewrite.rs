//! Rewrite application over a transactional text buffer.
//!
//! Edits are keyed by byte offsets into the *original*, unmodified buffer;
//! the buffer does the offset bookkeeping so edits against different
//! annotated nodes in the same file compose without anyone computing offsets
//! against partially rewritten text. Rendering splices all edits in one pass:
//!
//! ```text
//! original: ....AAAA......BBBB....
//! edits:        └─"x"      └─""      (keyed by original offsets)
//! render:   ....x......(deleted)....
//! ```
//!
//! A second edit over the same start offset replaces the first. This is what
//! turns "several calls in one payload produced text for the same node" into
//! exactly one visible replacement: the last writer wins.

use crate::host::{MatchContext, SyntaxNode};
use crate::sequence::SequenceChecker;
use crate::{SourceRange, TransformResult};
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// The rewriting session's text buffer for one source file.
#[derive(Debug, Clone)]
pub struct RewriteBuffer {
    original: String,
    edits: BTreeMap<usize, Edit>,
    sequence: SequenceChecker,
}

#[derive(Debug, Clone)]
struct Edit {
    end: usize,
    text: String,
}

impl RewriteBuffer {
    pub fn new(source: impl Into<String>) -> Self {
        RewriteBuffer { original: source.into(), edits: BTreeMap::new(), sequence: SequenceChecker::new() }
    }

    /// The unmodified source text. All edit offsets index into this.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    pub fn is_dirty(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Replace `range` with `text`.
    ///
    /// Offsets must be valid char boundaries in the original buffer;
    /// anything else is a programming error in the caller and panics.
    /// Re-editing a range that starts at an already edited offset replaces
    /// the earlier edit.
    pub fn replace_range(&mut self, range: SourceRange, text: &str) {
        self.sequence.check();
        assert!(
            range.start <= range.end && range.end <= self.original.len(),
            "replacement range {}..{} is invalid for a buffer of {} bytes",
            range.start,
            range.end,
            self.original.len()
        );
        assert!(
            self.original.is_char_boundary(range.start) && self.original.is_char_boundary(range.end),
            "replacement range {}..{} splits a character",
            range.start,
            range.end
        );

        if self.edits.insert(range.start, Edit { end: range.end, text: text.to_string() }).is_some() {
            trace!(start = range.start, end = range.end, "edit over an already edited offset; last writer wins");
        }
    }

    /// Splice all edits into the original buffer.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.original.len());
        let mut cursor = 0usize;

        for (&start, edit) in &self.edits {
            if start < cursor {
                warn!(start, cursor, "dropping edit swallowed by an earlier, wider edit");
                continue;
            }
            out.push_str(&self.original[cursor..start]);
            out.push_str(&edit.text);
            cursor = edit.end;
        }
        out.push_str(&self.original[cursor..]);
        out
    }
}

/// Commit `result` for `node`, iff it carries replacement text.
///
/// The node's raw range is first expanded to full token boundaries through
/// the traversal collaborator, so the annotation marker is erased along with
/// the declaration it decorates. Returns whether a replacement was applied.
pub fn apply_replacement(
    result: &TransformResult,
    match_context: &MatchContext,
    node: &SyntaxNode,
    buffer: &mut RewriteBuffer,
) -> bool {
    // Expansion must be requested before any replacement, even when the
    // result turns out to be "keep": the collaborator may cache per-node
    // state keyed off this request.
    let range = match_context.expanded_range(node);

    match &result.replacement {
        Some(text) => {
            buffer.replace_range(range, text);
            true
        }
        None => {
            trace!(node = ?node.id, "no replacement produced; keeping old code");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NodeId;

    #[test]
    fn replaces_byte_range_in_rendered_output() {
        //         0         1         2         3         4
        //         0123456789012345678901234567890123456789012345
        let src = "0123456789ANNOTATED DECLARATION SPANS HERE4247tail";
        let mut buffer = RewriteBuffer::new(src);

        buffer.replace_range(SourceRange::new(10, 42), "X");

        assert_eq!(buffer.render(), "0123456789X4247tail");
        assert_eq!(buffer.original(), src);
        assert!(buffer.is_dirty());
    }

    #[test]
    fn same_range_edit_overwrites_exactly_once() {
        let mut buffer = RewriteBuffer::new("keep[OLD]keep");

        buffer.replace_range(SourceRange::new(4, 9), "first");
        buffer.replace_range(SourceRange::new(4, 9), "last");

        assert_eq!(buffer.edit_count(), 1);
        assert_eq!(buffer.render(), "keeplastkeep");
    }

    #[test]
    fn disjoint_edits_use_original_offsets() {
        let mut buffer = RewriteBuffer::new("aa...bb...cc");

        // Deliberately out of source order; offsets stay original.
        buffer.replace_range(SourceRange::new(10, 12), "CC");
        buffer.replace_range(SourceRange::new(0, 2), "LONGER_THAN_AA");

        assert_eq!(buffer.render(), "LONGER_THAN_AA...bb...CC");
    }

    #[test]
    fn empty_replacement_deletes_the_range() {
        let mut buffer = RewriteBuffer::new("before<gone>after");
        buffer.replace_range(SourceRange::new(6, 12), "");
        assert_eq!(buffer.render(), "beforeafter");
    }

    #[test]
    fn swallowed_edit_is_dropped_at_render() {
        let mut buffer = RewriteBuffer::new("0123456789");
        buffer.replace_range(SourceRange::new(0, 8), "wide");
        buffer.replace_range(SourceRange::new(2, 4), "inner");
        assert_eq!(buffer.render(), "wide89");
    }

    #[test]
    #[should_panic(expected = "invalid for a buffer")]
    fn out_of_bounds_range_panics() {
        let mut buffer = RewriteBuffer::new("short");
        buffer.replace_range(SourceRange::new(0, 6), "");
    }

    #[test]
    fn applier_expands_before_replacing() {
        let src = "ATTR decl;rest";
        let mut buffer = RewriteBuffer::new(src);
        let node = SyntaxNode::new(NodeId(1), SourceRange::new(5, 10)); // "decl;"
        let mut cx = MatchContext::new("demo.cc");
        cx.set_expanded_range(node.id, SourceRange::new(0, 10)); // covers "ATTR " too

        let applied = apply_replacement(&TransformResult::replace("NEW"), &cx, &node, &mut buffer);

        assert!(applied);
        assert_eq!(buffer.render(), "NEWrest");
    }

    #[test]
    fn applier_keeps_source_when_no_replacement() {
        let mut buffer = RewriteBuffer::new("unchanged");
        let node = SyntaxNode::new(NodeId(1), SourceRange::new(0, 9));
        let cx = MatchContext::new("demo.cc");

        let applied = apply_replacement(&TransformResult::keep(), &cx, &node, &mut buffer);

        assert!(!applied);
        assert!(!buffer.is_dirty());
        assert_eq!(buffer.render(), "unchanged");
    }
}
