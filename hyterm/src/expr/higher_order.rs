//! Storage of the higher order attached to every node.
//!
//! Some higher orders are expensive or recursive to build (the signature of a native
//! method, the type of a function type). Those are stored as a deferred thunk and
//! materialized on access; everything else is stored already evaluated.

use std::{fmt, sync::Arc};

use crate::expr::Expr;

/// A deferred higher order. Forcing it twice yields structurally equal expressions.
#[derive(Clone)]
pub struct Thunk(Arc<dyn Fn() -> Expr + Send + Sync>);

impl Thunk {
    pub fn new(f: impl Fn() -> Expr + Send + Sync + 'static) -> Self {
        Thunk(Arc::new(f))
    }

    #[inline]
    pub fn force(&self) -> Expr {
        (self.0)()
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thunk(..)")
    }
}

#[derive(Debug, Clone)]
pub enum HigherOrder {
    /// Already computed.
    Evaluated(Expr),
    /// Computed on access.
    Deferred(Thunk),
    /// Top of the kind tower; only the dead end carries this.
    Terminal,
}

impl HigherOrder {
    pub fn deferred(f: impl Fn() -> Expr + Send + Sync + 'static) -> Self {
        HigherOrder::Deferred(Thunk::new(f))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, HigherOrder::Deferred(_))
    }
}

impl From<Expr> for HigherOrder {
    fn from(value: Expr) -> Self {
        HigherOrder::Evaluated(value)
    }
}
