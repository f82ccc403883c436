//! Placeholder (unification variable) allocation.
//!
//! A placeholder request materializes a *chain*: one unknown for the requested level plus
//! unknowns for each level above it, up to the fourth level, terminated by the dead end.
//! The chain is built innermost-first so that `chain[i].higher_order() == chain[i + 1]`.

use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use log::trace;
use smallvec::SmallVec;
use strum::{EnumIter, FromRepr};

use crate::expr::{Expr, dead_end};

/// Index of a placeholder. Unique and strictly increasing within one allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaceholderIndex(pub usize);

impl fmt::Display for PlaceholderIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}", self.0)
    }
}

/// The level at which a placeholder chain starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, FromRepr)]
#[repr(u8)]
pub enum PlaceholderOrderHint {
    VariableOrAbove = 0,
    TypeOrAbove = 1,
    KindOrAbove = 2,
    Fourth = 3,
    DeadEnd = 4,
}

impl PlaceholderOrderHint {
    /// The hint one level up the kind tower, saturating at the dead end.
    pub fn above(self) -> Self {
        Self::from_repr(self as u8 + 1).unwrap_or(PlaceholderOrderHint::DeadEnd)
    }

    /// Number of placeholders a chain starting at this level materializes.
    pub fn chain_length(self) -> usize {
        let dead_end = PlaceholderOrderHint::DeadEnd as usize;
        let fourth = PlaceholderOrderHint::Fourth as usize;
        (dead_end - (self as usize).min(dead_end)).min(fourth)
    }
}

/// Anything able to mint fresh placeholder chains.
pub trait PlaceholderProvider {
    fn create_placeholder(&self, hint: PlaceholderOrderHint) -> Expr;
}

/// Atomic index source shared by an environment and all of its child scopes.
#[derive(Debug, Default)]
pub struct PlaceholderAllocator {
    last: AtomicUsize,
}

impl PlaceholderAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next index.
    #[inline]
    pub fn next_index(&self) -> PlaceholderIndex {
        PlaceholderIndex(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// The most recently issued index (0 when none was issued yet).
    pub fn last_index(&self) -> usize {
        self.last.load(Ordering::Relaxed)
    }
}

impl PlaceholderProvider for PlaceholderAllocator {
    fn create_placeholder(&self, hint: PlaceholderOrderHint) -> Expr {
        let count = hint.chain_length();
        let indices: SmallVec<PlaceholderIndex, 4> = (0..count).map(|_| self.next_index()).collect();
        trace!("Allocated placeholder chain {:?} for {:?}", indices.as_slice(), hint);

        indices
            .iter()
            .rev()
            .fold(dead_end(), |higher_order, index| {
                Expr::placeholder(*index, higher_order)
            })
    }
}
