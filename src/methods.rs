//! Built-in transform rules.
//!
//! Four rules ship with the crate; everything else is registered by the
//! embedding host. The three `execute*` rules treat the payload *remainder*
//! past their own segment as the code to inject, so a payload reads as
//! `directive;code...`:
//!
//! ```text
//! "{executeCode};emit_bindings(node);"
//!  └── rule ────┘└──── injected ─────┘
//! ```
//!
//! The remainder also re-enters the parser as ordinary segments, where it
//! shows up as unresolved calls or noise; that is expected and harmless.
//!
//! Legacy aliases `eval`, `export` and `embed` are kept for payloads written
//! against the old annotation vocabulary and dispatch to the same handlers.

use crate::TransformResult;
use crate::bridge::HostBindings;
use crate::engine::{DispatchContext, Registry};
use tracing::debug;

/// Register the built-in rules (and their legacy aliases) into `registry`.
///
/// Panics if any built-in name is already bound, same as any other duplicate
/// registration.
pub fn register_builtins(registry: &mut Registry) {
    registry.register("executeStringWithoutSpaces", execute_string_without_spaces);
    registry.register("executeCode", execute_code);
    registry.register("executeCodeAndReplace", execute_code_and_replace);
    registry.register("funccall", funccall);

    registry.register("eval", execute_string_without_spaces);
    registry.register("export", execute_code);
    registry.register("embed", execute_code_and_replace);
}

/// The payload text following the current call's segment: the injected code
/// for the `execute*` family.
fn injected_code<'a>(cx: &DispatchContext<'a>) -> &'a str {
    let after = (cx.call.span.end + 1).min(cx.payload.len());
    cx.payload[after..].trim()
}

/// Run the remainder as a bare interpreter directive, outside any scope and
/// without host bindings. For includes and other top-level declarations that
/// a scoped unit would reject. The annotated range is erased afterwards, run
/// or no run: the annotation carrier must never survive into the output.
fn execute_string_without_spaces(cx: &mut DispatchContext<'_>) -> TransformResult {
    let code = injected_code(cx);
    if code.is_empty() {
        debug!(rule = %cx.call.name, "empty directive; nothing to run");
    } else {
        cx.bridge.run_raw(code);
    }
    TransformResult::erase()
}

/// Run the remainder for its side effects, then erase the annotated range.
/// The injected code mutates the rewriting session through the marshalled
/// host bindings. Erasure does not depend on the run succeeding; a failure
/// is already logged and the annotation carrier still must not leak into
/// the output.
fn execute_code(cx: &mut DispatchContext<'_>) -> TransformResult {
    let code = injected_code(cx);
    cx.bridge.run(
        code,
        HostBindings { match_context: cx.match_context, rewriter: &mut *cx.rewriter, node: cx.node },
    );
    TransformResult::erase()
}

/// Run the remainder and substitute its result text for the annotated range.
/// A void result or a failed execution keeps the source untouched.
fn execute_code_and_replace(cx: &mut DispatchContext<'_>) -> TransformResult {
    let code = injected_code(cx);
    let replacement = cx.bridge.run_for_replacement(
        code,
        HostBindings { match_context: cx.match_context, rewriter: &mut *cx.rewriter, node: cx.node },
    );
    match replacement {
        Some(text) => TransformResult::replace(text),
        None => TransformResult::keep(),
    }
}

/// Selector marker from the old annotation vocabulary: the calls that follow
/// it in the payload are dispatched as ordinary registry lookups, which the
/// dispatcher does for every segment anyway. Kept so old payloads resolve
/// instead of warning.
fn funccall(_cx: &mut DispatchContext<'_>) -> TransformResult {
    TransformResult::keep()
}
