//! Transform rule registry, dispatch and rewrite application.
//!
//! This module is the operational core between a parsed payload and the
//! rewritten source buffer:
//!
//! ```text
//! ParsedPayload
//!      │  per call, in payload order
//!      v
//! Registry::find ──(miss)──> warn "unregistered transform rule" + continue
//!      │ (hit)
//!      v
//! TransformHandler::run(DispatchContext)      (dispatch.rs)
//!      │
//!      v
//! TransformResult ── apply_replacement ──> RewriteBuffer   (rewrite.rs)
//!                    (expanded node range, last writer wins)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `registry.rs`: the name → handler table and the `TransformHandler`
//!   capability trait. Duplicate registration is a fatal caller bug; a
//!   lookup miss is not.
//! - `dispatch.rs`: iterates the calls of one payload, builds a fresh
//!   `DispatchContext` per invocation, and reports what happened in a
//!   `DispatchSummary`.
//! - `rewrite.rs`: the offset-bookkeeping `RewriteBuffer` and the applier
//!   that commits a replacement over the node's token-expanded range.
//!
//! Every call of one payload targets the identical expanded range, so when
//! several calls produce replacement text only the last one is visible in
//! the rendered output. That last-writer-wins policy is deliberate; payload
//! order is the dispatch order and must stay deterministic.

#[path = "engine/dispatch.rs"]
mod dispatch;
#[path = "engine/registry.rs"]
mod registry;
#[path = "engine/rewrite.rs"]
mod rewrite;

pub(crate) use dispatch::dispatch_payload;
pub use dispatch::{DispatchContext, DispatchSummary};
pub use registry::{Registry, TransformHandler};
pub use rewrite::{RewriteBuffer, apply_replacement};
