//! Arena allocator for gate storage
//!
//! Gates and their input slices live for the whole encoding of one problem and
//! are dropped together with the arena once the solution has been extracted.

use bumpalo::Bump;

/// Arena owning every gate built for one solve call
///
/// Wraps `bumpalo::Bump` so that the rest of the crate only sees the two
/// allocation shapes the circuit layer needs.
pub struct GateArena {
    bump: Bump,
}

impl GateArena {
    /// Creates an empty arena
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Moves a value into the arena
    pub fn alloc<T>(&self, value: T) -> &T {
        self.bump.alloc(value)
    }

    /// Copies a slice into the arena
    pub fn alloc_slice<T: Copy>(&self, values: &[T]) -> &[T] {
        self.bump.alloc_slice_copy(values)
    }

    /// Bytes currently held by the arena
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for GateArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slices_are_copied() {
        let arena = GateArena::new();
        let source = vec![1, 2, 3];
        let stored = arena.alloc_slice(&source);
        drop(source);
        assert_eq!(stored, &[1, 2, 3]);
        assert!(arena.allocated_bytes() > 0);
    }
}
