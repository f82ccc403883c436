//! The universal term: values, types, kinds and the top of the kind tower share one node type.
//!
//! Role
//! - [`Expr`] is a cheap, immutable, shareable handle (`Arc`) on a node carrying an
//!   [`ExprKind`] payload, a [`HigherOrder`] (the expression describing this one) and a
//!   [`TextRange`].
//! - Free builder functions ([`variable`], [`lambda`], [`apply`], [`function`], ...) compute the
//!   default higher order of every variant, so trees built by hand are well-formed.
//!
//! Equality semantics
//! - Equality and hashing are structural over the payload only. Ranges never participate and
//!   neither do higher orders; use [`LogicalCalculator::exact_equals`] to compare those too.
//!
//! Example
//! ```
//! use hyterm::prelude::*;
//!
//! let id = lambda(bound("x"), variable("x"));
//! let three = apply(id, constant(3));
//! assert_eq!(three.expr_type(), ExprType::Apply);
//! assert_eq!(constant(3).higher_order(), type_term(builtin::I32.clone()));
//! ```
//!
//! [`LogicalCalculator::exact_equals`]: crate::calculator::LogicalCalculator::exact_equals

pub mod higher_order;
pub mod pretty;
pub mod variant;
pub mod xml;

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use once_cell::sync::Lazy;
use smallvec::SmallVec;

pub use self::higher_order::{HigherOrder, Thunk};
pub use self::variant::ExprType;
use crate::{
    expr::pretty::{PrettyExpr, PrettyMode},
    host::{
        HostType, Value,
        member::{Callable, MethodTerm, NativeMethod, NativeProperty, PartialApplication, PropertyTerm},
    },
    placeholder::PlaceholderIndex,
    range::TextRange,
};

/// Name of a variable.
pub type Symbol = Arc<str>;

/// Payload of an expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// Free occurrence of a name.
    Variable(Symbol),
    /// Name introduced by a binder (lambda parameter or environment binding).
    BoundVariable(Symbol),
    Constant(Value),
    Lambda { parameter: Expr, body: Expr },
    Apply { function: Expr, argument: Expr },
    /// The type of a lambda.
    Function { parameter: Expr, result: Expr },
    And(Expr, Expr),
    Or(Expr, Expr),
    Placeholder(PlaceholderIndex),
    /// A host type.
    Type(HostType),
    Method(MethodTerm),
    MethodBinder(MethodTerm),
    MethodPartialClosure(PartialApplication),
    Property(PropertyTerm),
    /// `*`
    TypeKind,
    /// `#`
    Fourth,
    /// No information yet. Never solved.
    Unspecified,
    /// Terminates every higher order chain.
    DeadEnd,
}

impl ExprKind {
    pub fn expr_type(&self) -> ExprType {
        match self {
            ExprKind::Variable(_) => ExprType::Variable,
            ExprKind::BoundVariable(_) => ExprType::BoundVariable,
            ExprKind::Constant(_) => ExprType::Constant,
            ExprKind::Lambda { .. } => ExprType::Lambda,
            ExprKind::Apply { .. } => ExprType::Apply,
            ExprKind::Function { .. } => ExprType::Function,
            ExprKind::And(..) => ExprType::And,
            ExprKind::Or(..) => ExprType::Or,
            ExprKind::Placeholder(_) => ExprType::Placeholder,
            ExprKind::Type(_) => ExprType::Type,
            ExprKind::Method(_) => ExprType::Method,
            ExprKind::MethodBinder(_) => ExprType::MethodBinder,
            ExprKind::MethodPartialClosure(_) => ExprType::MethodPartialClosure,
            ExprKind::Property(_) => ExprType::Property,
            ExprKind::TypeKind => ExprType::TypeKind,
            ExprKind::Fourth => ExprType::Fourth,
            ExprKind::Unspecified => ExprType::Unspecified,
            ExprKind::DeadEnd => ExprType::DeadEnd,
        }
    }
}

struct Node {
    kind: ExprKind,
    higher_order: HigherOrder,
    range: TextRange,
}

/// Shared handle on an immutable expression node.
#[derive(Clone)]
pub struct Expr(Arc<Node>);

static DEAD_END: Lazy<Expr> = Lazy::new(|| Expr::assemble(ExprKind::DeadEnd, None, TextRange::UNKNOWN));
static FOURTH: Lazy<Expr> = Lazy::new(|| Expr::assemble(ExprKind::Fourth, None, TextRange::UNKNOWN));
static TYPE_KIND: Lazy<Expr> = Lazy::new(|| Expr::assemble(ExprKind::TypeKind, None, TextRange::UNKNOWN));
static UNSPECIFIED: Lazy<Expr> =
    Lazy::new(|| Expr::assemble(ExprKind::Unspecified, None, TextRange::UNKNOWN));

fn default_higher_order(kind: &ExprKind) -> HigherOrder {
    match kind {
        ExprKind::DeadEnd => HigherOrder::Terminal,
        ExprKind::Fourth | ExprKind::Unspecified => dead_end().into(),
        ExprKind::TypeKind => fourth().into(),
        ExprKind::Type(_) => type_kind().into(),
        ExprKind::Constant(value) => type_term(value.host_type()).into(),
        ExprKind::Property(property) => type_term(property.host_type().clone()).into(),
        ExprKind::Function { parameter, result } => {
            let (parameter, result) = (parameter.clone(), result.clone());
            HigherOrder::deferred(move || function(parameter.higher_order(), result.higher_order()))
        }
        ExprKind::Method(method) | ExprKind::MethodBinder(method) => {
            let method = method.clone();
            HigherOrder::deferred(move || method.signature(0))
        }
        ExprKind::MethodPartialClosure(partial) => {
            let partial = partial.clone();
            HigherOrder::deferred(move || partial.method().signature(partial.arguments().len()))
        }
        _ => unspecified().into(),
    }
}

impl Expr {
    /// Build a node. Without an explicit higher order the variant's default is used.
    pub fn assemble(kind: ExprKind, higher_order: Option<Expr>, range: TextRange) -> Expr {
        let higher_order = match (&kind, higher_order) {
            (ExprKind::DeadEnd, _) => HigherOrder::Terminal,
            (_, Some(higher_order)) => HigherOrder::Evaluated(higher_order),
            (kind, None) => default_higher_order(kind),
        };
        Expr(Arc::new(Node {
            kind,
            higher_order,
            range,
        }))
    }

    pub fn placeholder(index: PlaceholderIndex, higher_order: Expr) -> Expr {
        Expr::assemble(
            ExprKind::Placeholder(index),
            Some(higher_order),
            TextRange::UNKNOWN,
        )
    }

    pub fn partial(partial: PartialApplication) -> Expr {
        Expr::assemble(
            ExprKind::MethodPartialClosure(partial),
            None,
            TextRange::UNKNOWN,
        )
    }

    #[inline]
    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    #[inline]
    pub fn expr_type(&self) -> ExprType {
        self.0.kind.expr_type()
    }

    #[inline]
    pub fn range(&self) -> TextRange {
        self.0.range
    }

    /// The expression describing this one. The dead end is its own higher order.
    pub fn higher_order(&self) -> Expr {
        match &self.0.higher_order {
            HigherOrder::Evaluated(higher_order) => higher_order.clone(),
            HigherOrder::Deferred(thunk) => thunk.force(),
            HigherOrder::Terminal => dead_end(),
        }
    }

    pub fn higher_order_storage(&self) -> &HigherOrder {
        &self.0.higher_order
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_dead_end(&self) -> bool {
        matches!(self.0.kind, ExprKind::DeadEnd)
    }

    pub fn is_fourth(&self) -> bool {
        matches!(self.0.kind, ExprKind::Fourth)
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self.0.kind, ExprKind::Unspecified)
    }

    pub fn as_placeholder(&self) -> Option<PlaceholderIndex> {
        match self.0.kind {
            ExprKind::Placeholder(index) => Some(index),
            _ => None,
        }
    }

    /// Terms the unifier skips entirely.
    pub fn ignores_unification(&self) -> bool {
        self.expr_type().ignores_unification()
    }

    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match &self.0.kind {
            ExprKind::Method(method) | ExprKind::MethodBinder(method) => Some(method),
            ExprKind::MethodPartialClosure(partial) => Some(partial),
            _ => None,
        }
    }

    /// Direct structural children, in printing order.
    pub fn children(&self) -> SmallVec<&Expr, 2> {
        let mut children = SmallVec::new();
        match &self.0.kind {
            ExprKind::Lambda {
                parameter: a,
                body: b,
            }
            | ExprKind::Apply {
                function: a,
                argument: b,
            }
            | ExprKind::Function {
                parameter: a,
                result: b,
            }
            | ExprKind::And(a, b)
            | ExprKind::Or(a, b) => {
                children.push(a);
                children.push(b);
            }
            _ => {}
        }
        children
    }

    /// `true` if the placeholder appears anywhere in this tree or in its higher orders.
    pub fn occurs(&self, index: PlaceholderIndex) -> bool {
        match self.0.kind {
            ExprKind::Placeholder(current) if current == index => return true,
            ExprKind::DeadEnd | ExprKind::Unspecified => return false,
            _ => {}
        }
        self.children().iter().any(|child| child.occurs(index))
            || self.higher_order().occurs(index)
    }

    /// Rename the free occurrences of `from` to `to`.
    ///
    /// `None` when renaming would change what a name refers to: `to` already occurs free, or
    /// an occurrence of `from` sits under a binder of `to`.
    pub fn rename(&self, from: &str, to: &Symbol) -> Option<Expr> {
        self.rename_under(from, to, false)
    }

    fn rename_under(&self, from: &str, to: &Symbol, captured: bool) -> Option<Expr> {
        let kind = match &self.0.kind {
            ExprKind::Variable(symbol) if &**symbol == from => {
                if captured {
                    return None;
                }
                ExprKind::Variable(to.clone())
            }
            ExprKind::Variable(symbol) if symbol == to && !captured => return None,
            ExprKind::Lambda { parameter, body } => {
                let binds = |name: &str| {
                    matches!(parameter.kind(), ExprKind::BoundVariable(p) if &**p == name)
                };
                if binds(from) {
                    return Some(self.clone());
                }
                ExprKind::Lambda {
                    parameter: parameter.clone(),
                    body: body.rename_under(from, to, captured || binds(to))?,
                }
            }
            ExprKind::Apply { function, argument } => ExprKind::Apply {
                function: function.rename_under(from, to, captured)?,
                argument: argument.rename_under(from, to, captured)?,
            },
            ExprKind::Function { parameter, result } => ExprKind::Function {
                parameter: parameter.rename_under(from, to, captured)?,
                result: result.rename_under(from, to, captured)?,
            },
            ExprKind::And(left, right) => ExprKind::And(
                left.rename_under(from, to, captured)?,
                right.rename_under(from, to, captured)?,
            ),
            ExprKind::Or(left, right) => ExprKind::Or(
                left.rename_under(from, to, captured)?,
                right.rename_under(from, to, captured)?,
            ),
            _ => return Some(self.clone()),
        };
        Some(self.rebuild(kind))
    }

    /// Same payload, new range.
    pub fn with_range(&self, range: TextRange) -> Expr {
        Expr(Arc::new(Node {
            kind: self.0.kind.clone(),
            higher_order: self.0.higher_order.clone(),
            range,
        }))
    }

    /// Same payload and range, explicit higher order.
    pub fn with_higher_order(&self, higher_order: Expr) -> Expr {
        Expr::assemble(self.0.kind.clone(), Some(higher_order), self.0.range)
    }

    /// New payload, keeping the range. An explicit higher order is kept, a derived one
    /// is derived again from the new payload.
    pub fn rebuild(&self, kind: ExprKind) -> Expr {
        let higher_order = match &self.0.higher_order {
            HigherOrder::Evaluated(higher_order) if !is_derived(&self.0.kind) => {
                Some(higher_order.clone())
            }
            _ => None,
        };
        Expr::assemble(kind, higher_order, self.0.range)
    }

    /// New payload and higher order, keeping the range.
    pub fn rebuild_with(&self, kind: ExprKind, higher_order: Expr) -> Expr {
        Expr::assemble(kind, Some(higher_order), self.0.range)
    }
}

/// Variants whose higher order is a function of their payload.
fn is_derived(kind: &ExprKind) -> bool {
    matches!(
        kind,
        ExprKind::Constant(_)
            | ExprKind::Type(_)
            | ExprKind::Property(_)
            | ExprKind::TypeKind
            | ExprKind::Fourth
            | ExprKind::Unspecified
            | ExprKind::DeadEnd
    )
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.kind == other.0.kind
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.kind.hash(state);
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_string(PrettyMode::Strict))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        pretty::render_fmt(self, PrettyMode::Readable, f)
    }
}

/// `DeadEnd`
pub fn dead_end() -> Expr {
    DEAD_END.clone()
}

/// `#`
pub fn fourth() -> Expr {
    FOURTH.clone()
}

/// `*`
pub fn type_kind() -> Expr {
    TYPE_KIND.clone()
}

/// `_`
pub fn unspecified() -> Expr {
    UNSPECIFIED.clone()
}

pub fn variable(symbol: impl Into<Symbol>) -> Expr {
    Expr::assemble(ExprKind::Variable(symbol.into()), None, TextRange::UNKNOWN)
}

pub fn bound(symbol: impl Into<Symbol>) -> Expr {
    Expr::assemble(
        ExprKind::BoundVariable(symbol.into()),
        None,
        TextRange::UNKNOWN,
    )
}

pub fn constant(value: impl Into<Value>) -> Expr {
    Expr::assemble(ExprKind::Constant(value.into()), None, TextRange::UNKNOWN)
}

pub fn unit() -> Expr {
    constant(Value::Unit)
}

pub fn type_term(ty: HostType) -> Expr {
    Expr::assemble(ExprKind::Type(ty), None, TextRange::UNKNOWN)
}

pub fn lambda(parameter: Expr, body: Expr) -> Expr {
    let range = parameter.range().combine(&body.range());
    Expr::assemble(ExprKind::Lambda { parameter, body }, None, range)
}

pub fn apply(function: Expr, argument: Expr) -> Expr {
    let range = function.range().combine(&argument.range());
    Expr::assemble(ExprKind::Apply { function, argument }, None, range)
}

/// The type `parameter -> result`. Collapses to the dead end when either side is one.
pub fn function(parameter: Expr, result: Expr) -> Expr {
    if parameter.is_dead_end() || result.is_dead_end() {
        return dead_end();
    }
    let range = parameter.range().combine(&result.range());
    Expr::assemble(ExprKind::Function { parameter, result }, None, range)
}

pub fn and(left: Expr, right: Expr) -> Expr {
    let range = left.range().combine(&right.range());
    Expr::assemble(ExprKind::And(left, right), None, range)
}

pub fn or(left: Expr, right: Expr) -> Expr {
    let range = left.range().combine(&right.range());
    Expr::assemble(ExprKind::Or(left, right), None, range)
}

/// Wrap a native method: a `Method` leaf up to one parameter, a `MethodBinder` beyond.
pub fn method(method: NativeMethod) -> Expr {
    let term = MethodTerm::new(method);
    let kind = if term.arity() <= 1 {
        ExprKind::Method(term)
    } else {
        ExprKind::MethodBinder(term)
    };
    Expr::assemble(kind, None, TextRange::UNKNOWN)
}

pub fn property(property: NativeProperty) -> Expr {
    Expr::assemble(
        ExprKind::Property(PropertyTerm::new(property)),
        None,
        TextRange::UNKNOWN,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::builtin;

    fn tower(mut expr: Expr) -> Vec<ExprType> {
        let mut chain = vec![expr.expr_type()];
        while !expr.is_dead_end() {
            expr = expr.higher_order();
            chain.push(expr.expr_type());
        }
        chain
    }

    #[test]
    fn constant_tower_reaches_dead_end() {
        assert_eq!(
            tower(constant(3)),
            vec![
                ExprType::Constant,
                ExprType::Type,
                ExprType::TypeKind,
                ExprType::Fourth,
                ExprType::DeadEnd
            ]
        );
    }

    #[test]
    fn function_tower_reaches_dead_end() {
        let ty = function(
            type_term(builtin::I32.clone()),
            type_term(builtin::STRING.clone()),
        );
        assert_eq!(
            tower(ty),
            vec![
                ExprType::Function,
                ExprType::Function,
                ExprType::Function,
                ExprType::DeadEnd
            ]
        );
    }

    #[test]
    fn equality_ignores_higher_order_and_range() {
        let x = bound("x");
        let typed = x.with_higher_order(type_term(builtin::I32.clone()));
        assert_eq!(x, typed);
        assert_ne!(bound("x"), variable("x"));
    }

    #[test]
    fn rename_refuses_to_capture() {
        let to: Symbol = "y".into();
        let free = apply(variable("a"), variable("z"));
        assert_eq!(
            free.rename("a", &to),
            Some(apply(variable("y"), variable("z")))
        );
        // `y` is already free.
        assert_eq!(apply(variable("a"), variable("y")).rename("a", &to), None);
        // `a` would move under a binder of `y`.
        assert_eq!(lambda(bound("y"), variable("a")).rename("a", &to), None);
        // A binder of `a` hides its body.
        let hidden = lambda(bound("a"), variable("a"));
        assert_eq!(hidden.rename("a", &to), Some(hidden.clone()));
    }

    #[test]
    fn rebuild_rederives_function_types() {
        let int = type_term(builtin::I32.clone());
        let f = function(int.clone(), int);
        let g = f.rebuild(ExprKind::Function {
            parameter: type_kind(),
            result: type_kind(),
        });
        assert_eq!(g.higher_order(), function(fourth(), fourth()));
    }
}
