//! Public processing surface.
//!
//! A [`Session`] owns everything one file's transformation needs: the rule
//! registry, the bridge into the interpreter session, and the rewrite buffer.
//! The traversal collaborator feeds it `(payload, match context, node)`
//! triples through [`Session::process`]; when the traversal is done,
//! [`Session::into_output`] renders the rewritten file.
//!
//! The registry and the interpreter are constructor arguments, so a session
//! that could dispatch against missing rules or a missing interpreter cannot
//! be built in the first place.
//!
//! ```
//! use annotex::{
//!     BoxedValue, DispatchContext, ExecError, Interpreter, MatchContext, NodeId, Registry,
//!     Session, SourceRange, SyntaxNode, TransformResult, register_builtins,
//! };
//!
//! struct NullInterpreter;
//!
//! impl Interpreter for NullInterpreter {
//!     fn execute(&mut self, _code: &str) -> Result<(), ExecError> {
//!         Ok(())
//!     }
//!     fn execute_with_result(&mut self, _code: &str) -> Result<BoxedValue, ExecError> {
//!         Ok(BoxedValue::void())
//!     }
//! }
//!
//! fn make_answer(_cx: &mut DispatchContext<'_>) -> TransformResult {
//!     TransformResult::replace("const ANSWER: u32 = 42;")
//! }
//!
//! let mut registry = Registry::new();
//! register_builtins(&mut registry);
//! registry.register("make_answer", make_answer);
//!
//! let source = "ATTR placeholder_decl;rest";
//! let mut session = Session::new(source, registry, Box::new(NullInterpreter));
//!
//! let node = SyntaxNode::new(NodeId(1), SourceRange::new(5, 22));
//! let mut cx = MatchContext::new("demo.cc");
//! cx.set_expanded_range(node.id, SourceRange::new(0, 22)); // cover "ATTR " too
//!
//! let summary = session.process("make_answer;", &cx, &node);
//! assert_eq!(summary.committed_by.as_deref(), Some("make_answer"));
//! assert_eq!(session.into_output(), "const ANSWER: u32 = 42;rest");
//! ```

use crate::bridge::{Bridge, Interpreter};
use crate::engine::{DispatchSummary, Registry, RewriteBuffer, dispatch_payload};
use crate::host::{MatchContext, SyntaxNode};
use crate::payload::parse_payload;
use crate::sequence::SequenceChecker;
use tracing::debug;

/// One file's transformation session.
#[derive(Debug)]
pub struct Session {
    registry: Registry,
    bridge: Bridge,
    buffer: RewriteBuffer,
    sequence: SequenceChecker,
}

impl Session {
    /// Build a session over `source` with a fully populated `registry` and a
    /// live interpreter. Nothing can be registered after construction;
    /// build the registry first.
    pub fn new(source: impl Into<String>, registry: Registry, interpreter: Box<dyn Interpreter>) -> Self {
        Session {
            registry,
            bridge: Bridge::new(interpreter),
            buffer: RewriteBuffer::new(source),
            sequence: SequenceChecker::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The rewriting buffer, for inspection between traversal callbacks.
    pub fn buffer(&self) -> &RewriteBuffer {
        &self.buffer
    }

    /// Parse `payload` and dispatch its calls against `node`.
    ///
    /// One traversal callback, one call. Failures inside the payload are
    /// absorbed per call and reported in the summary; the session stays
    /// usable for the rest of the traversal.
    pub fn process(&mut self, payload: &str, match_context: &MatchContext, node: &SyntaxNode) -> DispatchSummary {
        self.sequence.check();
        debug!(file = match_context.file(), node = ?node.id, "processing annotation payload");

        let parsed = parse_payload(payload);
        dispatch_payload(
            payload,
            &parsed,
            &self.registry,
            &mut self.bridge,
            &mut self.buffer,
            match_context,
            node,
        )
    }

    /// Render the rewritten file and consume the session.
    pub fn into_output(self) -> String {
        self.buffer.render()
    }
}
