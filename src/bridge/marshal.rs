//! Pointer marshalling across the interpreter boundary.
//!
//! This is the one narrow seam where the crate trades memory safety for the
//! embedded-interpreter requirement. A borrowed host object is encoded as its
//! in-process address and redeclared, with an explicit static type, inside
//! the synthesized compilation unit, so the interpreter reconstructs a typed
//! reference instead of an opaque handle:
//!
//! ```text
//! host                          synthesized unit
//! &rewriter ── address_of_mut ─> let rewriter: &mut RewriteBuffer =
//!                                    unsafe { &mut *(0x00007ffd4a21b0c0usize
//!                                                    as *mut RewriteBuffer) };
//! ```
//!
//! Correctness depends on the interpreter session compiling against type
//! layouts identical to the host's, and on the encoded object staying alive
//! and unaliased for the duration of the synchronous execution. Annotation
//! payloads are trusted source-adjacent text, never attacker-controlled
//! input. Everything outside this module is ordinary safe ownership.

/// In-process address of a shared borrow, for embedding as a pointer literal.
pub fn address_of<T>(value: &T) -> usize {
    std::ptr::from_ref(value) as usize
}

/// In-process address of an exclusive borrow.
pub fn address_of_mut<T>(value: &mut T) -> usize {
    std::ptr::from_mut(value) as usize
}

/// Synthesize a declaration binding `name` to a reconstructed shared
/// reference of type `ty` at `addr`. The address is a fixed-width hex
/// literal so generated units diff cleanly.
pub fn bind_ref(name: &str, ty: &str, addr: usize) -> String {
    format!("let {name}: &{ty} = unsafe {{ &*(0x{addr:016x}usize as *const {ty}) }};")
}

/// As [`bind_ref`], for an exclusive reference.
pub fn bind_mut(name: &str, ty: &str, addr: usize) -> String {
    format!("let {name}: &mut {ty} = unsafe {{ &mut *(0x{addr:016x}usize as *mut {ty}) }};")
}

/// Reconstruct the shared reference encoded by [`address_of`] / [`bind_ref`].
///
/// # Safety
///
/// `addr` must come from [`address_of`] over a live `T` in this same process,
/// and that `T` must outlive `'a`. The caller is the interpreter side of the
/// boundary; nothing inside this crate calls it on untrusted input.
pub unsafe fn deref_ref<'a, T>(addr: usize) -> &'a T {
    unsafe { &*(addr as *const T) }
}

/// Reconstruct the exclusive reference encoded by [`address_of_mut`] /
/// [`bind_mut`].
///
/// # Safety
///
/// As [`deref_ref`], and additionally the `T` must not be aliased anywhere
/// for the lifetime of the returned borrow.
pub unsafe fn deref_mut<'a, T>(addr: usize) -> &'a mut T {
    unsafe { &mut *(addr as *mut T) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_round_trip_to_the_same_object() {
        let mut value = String::from("live host object");
        let addr = address_of(&value);

        let reconstructed: &String = unsafe { deref_ref(addr) };
        assert_eq!(reconstructed, "live host object");

        let addr = address_of_mut(&mut value);
        let reconstructed: &mut String = unsafe { deref_mut(addr) };
        reconstructed.push_str(", mutated");
        assert_eq!(value, "live host object, mutated");
    }

    #[test]
    fn bindings_declare_name_type_and_fixed_width_literal() {
        let binding = bind_ref("node", "SyntaxNode", 0xabcd);
        assert_eq!(binding, "let node: &SyntaxNode = unsafe { &*(0x000000000000abcdusize as *const SyntaxNode) };");

        let binding = bind_mut("rewriter", "RewriteBuffer", 0x1);
        assert!(binding.starts_with("let rewriter: &mut RewriteBuffer"));
        assert!(binding.contains("0x0000000000000001usize as *mut RewriteBuffer"));
    }
}
