//! Hyterm: term rewriting and type inference for a calculus where values, types, kinds and
//! the fourth level are all expressions.
//!
//! Every [`Expr`](expr::Expr) carries a *higher order*: the expression describing it. A value
//! is described by a type, a type by the kind `*`, the kind by the fourth level `#`, and the
//! chain ends at the dead end. Missing higher orders are inferred by unification.
//!
//! Pipeline
//!  - transpose: infix operators in application spines become prefix applications.
//!  - make-rewritable: unknown higher orders become fresh placeholder chains.
//!  - infer: constraints between higher orders are handed to the [`Unifier`](unify::Unifier).
//!  - fixup: solved placeholders are substituted and normalized by the
//!    [`LogicalCalculator`](calculator::LogicalCalculator).
//!  - reduce (optional): beta reduction and native calls down to normal form.
//!
//! Example
//! ```
//! use hyterm::prelude::*;
//!
//! let add = NativeMethod::new(
//!     "add",
//!     &[builtin::I32.clone(), builtin::I32.clone()],
//!     builtin::I32.clone(),
//!     |args| {
//!         let (Some(a), Some(b)) = (args[0].as_i64(), args[1].as_i64()) else {
//!             return Err("expected integers".into());
//!         };
//!         Ok(Value::I32((a + b) as i32))
//!     },
//! );
//!
//! let env = Environment::new();
//! env.mutable_bind("add", method(add));
//! let five = env
//!     .reduce(&apply(apply(variable("add"), constant(2)), constant(3)))
//!     .unwrap();
//! assert_eq!(five, constant(5));
//! ```

/// Notation attributes of bindings (prefix/infix, associativity, precedence).
pub mod attributes;
/// AND/OR simplification and the subtyping choices built on it.
pub mod calculator;
/// Binding tables, scopes and the phase pipeline.
pub mod environment;
pub mod error;
/// Expression handle, variants, builders and renderings.
pub mod expr;
/// Host types, runtime values and native members.
pub mod host;
pub mod placeholder;
pub mod range;
/// Phase implementations.
pub mod transform;
/// Placeholder unification.
pub mod unify;

pub mod prelude {
    //! Convenient re-exports for end users.
    //!
    //! - Free-function builders and the `Expr` handle
    //! - Pretty-printing via `PrettyExpr`
    //! - Host types and native members
    //! - The environment and its configuration
    pub use crate::expr::{
        Expr, ExprKind, ExprType, Symbol, and, apply, bound, constant, dead_end, fourth, function,
        lambda, method, or, pretty::PrettyExpr, pretty::PrettyMode, property, type_kind,
        type_term, unit, unspecified, variable,
    };

    pub use crate::host::{
        HostObject, HostType, TypeCategory, TypeRegistry, Value, builtin,
        member::{NativeMethod, NativeProperty},
    };

    pub use crate::attributes::{BoundAssociativity, BoundAttributes, BoundPosition, BoundPrecedence};
    pub use crate::calculator::{ChoiceResult, LogicalCalculator};
    pub use crate::environment::{Environment, EnvironmentConfig};
    pub use crate::error::{TermError, TermResult};
    pub use crate::placeholder::{PlaceholderIndex, PlaceholderOrderHint, PlaceholderProvider};
    pub use crate::unify::Topology;
}
