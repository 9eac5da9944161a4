//! Collaborator-boundary types.
//!
//! The syntax-tree matching/traversal engine is an external collaborator:
//! it discovers annotated declarations, owns the tree, and knows how to
//! expand a node's raw start/end locations to full token boundaries
//! (including the annotation marker itself). This module holds the read-only
//! views of that collaborator the core dispatches against.

use crate::SourceRange;
use std::collections::HashMap;

/// Stable identity of a syntax node for the lifetime of one traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// An annotated declaration located by the traversal collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub id: NodeId,
    /// Raw reported source range of the declaration, before token expansion.
    pub range: SourceRange,
}

impl SyntaxNode {
    pub fn new(id: NodeId, range: SourceRange) -> Self {
        SyntaxNode { id, range }
    }
}

/// Read-only view of the enclosing match/traversal context.
///
/// Carries the token-boundary expansions the traversal collaborator computed
/// for the nodes it matched. The rewrite applier requests the expansion
/// before committing any replacement, so the annotation marker is erased
/// together with the declaration it decorates.
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    file: String,
    expansions: HashMap<NodeId, SourceRange>,
}

impl MatchContext {
    pub fn new(file: impl Into<String>) -> Self {
        MatchContext { file: file.into(), expansions: HashMap::new() }
    }

    /// Source file being rewritten. Diagnostic label only.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Register the token-expanded range for a node. Called by the traversal
    /// collaborator when it matches an annotated declaration.
    pub fn set_expanded_range(&mut self, id: NodeId, range: SourceRange) {
        self.expansions.insert(id, range);
    }

    /// Token-expanded range for `node`; falls back to the node's raw range
    /// when no expansion was registered.
    pub fn expanded_range(&self, node: &SyntaxNode) -> SourceRange {
        self.expansions.get(&node.id).copied().unwrap_or(node.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_falls_back_to_raw_range() {
        let node = SyntaxNode::new(NodeId(3), SourceRange::new(20, 40));
        let mut cx = MatchContext::new("demo.cc");
        assert_eq!(cx.expanded_range(&node), SourceRange::new(20, 40));

        cx.set_expanded_range(NodeId(3), SourceRange::new(5, 41));
        assert_eq!(cx.expanded_range(&node), SourceRange::new(5, 41));
    }
}
