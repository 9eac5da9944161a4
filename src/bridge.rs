//! Dynamic-execution bridge.
//!
//! Transform rules delegate here to run injected code inside the embedded
//! interpreter session while giving that code typed access to the live host
//! objects of the current dispatch:
//!
//! ```text
//! injected expression
//!        │  synthesize: anonymous scope
//!        │   + bind match_context / rewriter / node   (marshal.rs)
//!        │   + append the expression as the scope's value
//!        v
//! Interpreter::execute            (side-effect mode, value discarded)
//! Interpreter::execute_with_result
//!        │
//!        v
//! BoxedValue ── decode once ──> Option<String> replacement
//!               (release hook runs exactly once, success or failure)
//! ```
//!
//! Failure semantics: compile/run errors are logged with a bounded excerpt of
//! the offending code and yield "no replacement"; a void or absent result is
//! logged at debug level and also yields "no replacement". Neither aborts the
//! host's traversal of the rest of the tree. The bridge cannot be constructed
//! without an interpreter session, so "invoked before the session exists" is
//! unrepresentable rather than asserted.

#[path = "bridge/marshal.rs"]
pub mod marshal;

use crate::engine::RewriteBuffer;
use crate::host::{MatchContext, SyntaxNode};
use crate::sequence::SequenceChecker;
use thiserror::Error;
use tracing::{debug, error};

/// Longest prefix of offending injected code echoed into failure logs.
const CODE_EXCERPT_LIMIT: usize = 1000;

/// Compile or run failure reported by the interpreter collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("compilation failed: {0}")]
    Compile(String),
    #[error("execution failed: {0}")]
    Run(String),
}

/// The embedded interpreter session (external collaborator).
///
/// Execution is synchronous and run-to-completion per invocation; the
/// session is not safe for concurrent use and lives on the bridge's
/// sequence for the whole processing pass.
pub trait Interpreter {
    /// Compile and run `code`, discarding any produced value.
    fn execute(&mut self, code: &str) -> Result<(), ExecError>;

    /// Compile and run `code`, retrieving its boxed result value.
    fn execute_with_result(&mut self, code: &str) -> Result<BoxedValue, ExecError>;
}

/// Boxed value handed back by the interpreter, decoded exactly once.
///
/// The tagged shape (`present` + text) replaces any downcasting at the
/// boundary: the interpreter collaborator builds it, the bridge copies the
/// text out, and the release hook — which stands in for freeing the
/// interpreter-side allocation — runs exactly once whether the value is
/// consumed or merely dropped. A double release or a leak here is a
/// correctness bug, and test doubles observe the hook to prove neither
/// happens.
pub struct BoxedValue {
    present: bool,
    value: String,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl std::fmt::Debug for BoxedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedValue")
            .field("present", &self.present)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl BoxedValue {
    /// A value wrapping a concrete replacement string (possibly empty —
    /// an empty string means "delete", which is distinct from absent).
    pub fn present(value: impl Into<String>) -> Self {
        BoxedValue { present: true, value: value.into(), release: None }
    }

    /// An absent/void value: "do not modify source".
    pub fn void() -> Self {
        BoxedValue { present: false, value: String::new(), release: None }
    }

    /// Attach a hook observing the exactly-once release of the boxed
    /// interpreter-side allocation.
    pub fn with_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(hook));
        self
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Copy the replacement text out and release the boxed value.
    pub fn into_replacement(mut self) -> Option<String> {
        let out = self.present.then(|| std::mem::take(&mut self.value));
        self.release_now();
        out
    }

    fn release_now(&mut self) {
        if let Some(hook) = self.release.take() {
            hook();
        }
    }
}

impl Drop for BoxedValue {
    fn drop(&mut self) {
        self.release_now();
    }
}

/// The three live host objects marshalled into one bridge execution.
pub struct HostBindings<'a> {
    pub match_context: &'a MatchContext,
    pub rewriter: &'a mut RewriteBuffer,
    pub node: &'a SyntaxNode,
}

/// Bridge between transform rules and the embedded interpreter session.
pub struct Bridge {
    interpreter: Box<dyn Interpreter>,
    sequence: SequenceChecker,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge").finish_non_exhaustive()
    }
}

impl Bridge {
    pub fn new(interpreter: Box<dyn Interpreter>) -> Self {
        Bridge { interpreter, sequence: SequenceChecker::new() }
    }

    /// Run directive-style code as-is: no scope wrap, no host bindings.
    ///
    /// Use for single lines that must stay at the unit's top level
    /// (includes, module-level declarations). Returns whether the
    /// interpreter accepted the code; failures are logged, never propagated.
    pub fn run_raw(&mut self, code: &str) -> bool {
        self.sequence.check();
        match self.interpreter.execute(code) {
            Ok(()) => true,
            Err(err) => {
                log_exec_failure(&err, code);
                false
            }
        }
    }

    /// Side-effect mode: run the synthesized scope, discarding any value.
    ///
    /// The injected code may mutate the rewriting session directly through
    /// the marshalled `rewriter` binding.
    pub fn run(&mut self, code: &str, mut hosts: HostBindings<'_>) -> bool {
        self.sequence.check();
        let unit = synthesize(code, &mut hosts);
        match self.interpreter.execute(&unit) {
            Ok(()) => true,
            Err(err) => {
                log_exec_failure(&err, code);
                false
            }
        }
    }

    /// Replacement mode: run the synthesized scope and decode its boxed
    /// result into replacement text.
    ///
    /// `Some(text)` (including `Some("")`) comes from a present result;
    /// `None` covers void/absent results and compile/run failures alike.
    pub fn run_for_replacement(&mut self, code: &str, mut hosts: HostBindings<'_>) -> Option<String> {
        self.sequence.check();
        let unit = synthesize(code, &mut hosts);
        match self.interpreter.execute_with_result(&unit) {
            Ok(value) => {
                let replacement = value.into_replacement();
                if replacement.is_none() {
                    debug!(code = excerpt(code), "ignored void interpreter result; keeping old code");
                }
                replacement
            }
            Err(err) => {
                log_exec_failure(&err, code);
                None
            }
        }
    }
}

/// Wrap `code` in an anonymous scope: bind the three host objects to typed
/// locals reconstructed from in-process addresses, then append the injected
/// expression as the scope's value.
fn synthesize(code: &str, hosts: &mut HostBindings<'_>) -> String {
    let bindings = [
        marshal::bind_ref("match_context", "MatchContext", marshal::address_of(hosts.match_context)),
        marshal::bind_mut("rewriter", "RewriteBuffer", marshal::address_of_mut(hosts.rewriter)),
        marshal::bind_ref("node", "SyntaxNode", marshal::address_of(hosts.node)),
    ];

    let mut unit = String::with_capacity(code.len() + 256);
    unit.push_str("{\n");
    for binding in &bindings {
        unit.push_str(binding);
        unit.push('\n');
    }
    unit.push_str(code);
    unit.push_str("\n}");
    unit
}

fn log_exec_failure(err: &ExecError, code: &str) {
    error!(code = excerpt(code), "error while running interpreted code: {err}");
}

/// Bounded prefix of `code` for diagnostics, trimmed to a char boundary.
fn excerpt(code: &str) -> &str {
    let mut end = code.len().min(CODE_EXCERPT_LIMIT);
    while !code.is_char_boundary(end) {
        end -= 1;
    }
    &code[..end]
}
