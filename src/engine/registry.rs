//! The transform rule registry: name → handler.
//!
//! The registry is an explicitly owned value injected into every dispatch,
//! never a process-wide singleton; tests swap in a fresh one at will. It is
//! built once per processing session (host registers built-ins, collaborators
//! register domain rules) and read-heavy afterwards.

use crate::TransformResult;
use crate::engine::dispatch::DispatchContext;
use crate::sequence::SequenceChecker;
use std::collections::HashMap;

/// A registered transform rule.
///
/// One capability: accept a dispatch context, yield a [`TransformResult`].
/// Handlers must be invokable any number of times; they are stateless
/// bindings or closures over shared external state, never single-shot.
pub trait TransformHandler {
    fn run(&self, cx: &mut DispatchContext<'_>) -> TransformResult;
}

impl<F> TransformHandler for F
where
    F: Fn(&mut DispatchContext<'_>) -> TransformResult,
{
    fn run(&self, cx: &mut DispatchContext<'_>) -> TransformResult {
        self(cx)
    }
}

/// Name → handler table for one processing session.
pub struct Registry {
    rules: HashMap<String, Box<dyn TransformHandler>>,
    sequence: SequenceChecker,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("rules", &self.names()).finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry { rules: HashMap::new(), sequence: SequenceChecker::new() }
    }

    /// Bind `name` to `handler`.
    ///
    /// Panics if `name` is already bound. Silent overwriting is forbidden:
    /// it would produce order-dependent behavior between independently
    /// loaded collaborators, which is a construction-order bug, not a
    /// runtime condition.
    #[track_caller]
    pub fn register(&mut self, name: impl Into<String>, handler: impl TransformHandler + 'static) {
        self.sequence.check();
        let name = name.into();
        let previous = self.rules.insert(name.clone(), Box::new(handler));
        assert!(previous.is_none(), "transform rule '{name}' is already registered");
    }

    /// Pure lookup by exact name. Absence is not an error at this level;
    /// the dispatcher decides policy.
    pub fn find(&self, name: &str) -> Option<&dyn TransformHandler> {
        self.rules.get(name).map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered rule names, sorted for stable diagnostics.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keep(_cx: &mut DispatchContext<'_>) -> TransformResult {
        TransformResult::keep()
    }

    #[test]
    fn registers_and_finds_by_exact_name() {
        let mut registry = Registry::new();
        registry.register("make_reflect", keep);

        assert!(registry.find("make_reflect").is_some());
        assert!(registry.find("make_Reflect").is_none());
        assert!(registry.find("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_registration_panics() {
        let mut registry = Registry::new();
        registry.register("make_reflect", keep);
        registry.register("make_reflect", keep);
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = Registry::new();
        registry.register("zeta", keep);
        registry.register("alpha", keep);
        assert_eq!(registry.names(), ["alpha", "zeta"]);
    }
}
