//! Call dispatch for one annotated node.
//!
//! Given the ordered calls of one payload, resolve each against the registry
//! and run it. A lookup miss is non-fatal by design: payloads may name rules
//! registered by collaborators that are absent from the current build
//! configuration, so the miss is reported and dispatch moves on.

use crate::bridge::Bridge;
use crate::engine::registry::Registry;
use crate::engine::rewrite::{RewriteBuffer, apply_replacement};
use crate::host::{MatchContext, SyntaxNode};
use crate::payload::{CallDescriptor, ParsedPayload};
use tracing::{debug, trace, warn};

/// Per-invocation bundle handed to a transform handler.
///
/// Borrows everything, owns nothing; a fresh context is built for every
/// handler invocation and dropped as soon as it returns.
pub struct DispatchContext<'a> {
    /// The call being handled.
    pub call: &'a CallDescriptor,
    /// All calls parsed from the same payload, in payload order. Handlers
    /// may look ahead or behind across their siblings.
    pub calls: &'a [CallDescriptor],
    /// The raw annotation payload the calls were parsed from.
    pub payload: &'a str,
    /// Read-only handle to the enclosing match/traversal context.
    pub match_context: &'a MatchContext,
    /// The annotated node. Identity-stable for the node's lifetime.
    pub node: &'a SyntaxNode,
    /// The rewriting session's buffer for the current file.
    pub rewriter: &'a mut RewriteBuffer,
    /// Bridge into the embedded interpreter session.
    pub bridge: &'a mut Bridge,
}

/// What dispatching one payload against one node did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Calls parsed from the payload.
    pub calls: usize,
    /// Calls that resolved to a handler and ran.
    pub dispatched: usize,
    /// Inert segments the parser recorded.
    pub noise: usize,
    /// Call names with no registry entry, in encounter order.
    pub unresolved: Vec<String>,
    /// Name of the last call whose replacement text was committed, if any.
    pub committed_by: Option<String>,
}

impl DispatchSummary {
    /// True if any call committed replacement text for the node.
    pub fn replaced(&self) -> bool {
        self.committed_by.is_some()
    }
}

pub(crate) fn dispatch_payload(
    payload: &str,
    parsed: &ParsedPayload,
    registry: &Registry,
    bridge: &mut Bridge,
    buffer: &mut RewriteBuffer,
    match_context: &MatchContext,
    node: &SyntaxNode,
) -> DispatchSummary {
    let mut summary =
        DispatchSummary { calls: parsed.calls.len(), noise: parsed.noise.len(), ..DispatchSummary::default() };

    for segment in &parsed.noise {
        debug!(segment = %segment.raw, "skipping inert annotation segment");
    }

    for call in &parsed.calls {
        let Some(handler) = registry.find(&call.name) else {
            warn!(segment = %call.raw, "unregistered transform rule: {}", call.name);
            summary.unresolved.push(call.name.clone());
            continue;
        };

        trace!(rule = %call.name, node = ?node.id, "dispatching transform rule");
        let result = {
            let mut cx = DispatchContext {
                call,
                calls: &parsed.calls,
                payload,
                match_context,
                node,
                rewriter: &mut *buffer,
                bridge: &mut *bridge,
            };
            handler.run(&mut cx)
        };
        summary.dispatched += 1;

        // Every call of this payload replaces the identical expanded range,
        // so the last call producing text determines the committed output.
        if apply_replacement(&result, match_context, node, buffer) {
            summary.committed_by = Some(call.name.clone());
        }
    }

    summary
}
