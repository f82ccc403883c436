//! The phases every expression goes through, and the context they share.
//!
//! An [`Environment`] runs, in order: transpose, make-rewritable, infer, alias
//! normalization, fixup and optionally reduce. Each phase is a method of [`Context`] returning
//! a [`Rewrite`]: the resulting expression together with an explicit flag telling whether
//! anything changed, so untouched subtrees are shared instead of rebuilt.

pub mod fixup;
pub mod infer;
pub mod reduce;
pub mod rewritable;
pub mod transpose;

use std::sync::Arc;

use log::trace;
use smallvec::SmallVec;

use crate::{
    calculator::LogicalCalculator,
    environment::{
        Environment,
        scope::{Binding, Lookup, Scope},
    },
    error::TermResult,
    expr::{Expr, ExprKind, Symbol},
    placeholder::{PlaceholderIndex, PlaceholderOrderHint, PlaceholderProvider},
    unify::{Topology, Unifier},
};

/// Output of a phase.
#[derive(Debug, Clone)]
pub struct Rewrite {
    expr: Expr,
    changed: bool,
}

impl Rewrite {
    /// The input, untouched.
    pub fn same(expr: &Expr) -> Self {
        Self {
            expr: expr.clone(),
            changed: false,
        }
    }

    /// A new expression.
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            changed: true,
        }
    }

    /// `new` unless the expression is the input itself.
    pub fn compare(original: &Expr, expr: Expr) -> Self {
        let changed = !original.ptr_eq(&expr);
        Self { expr, changed }
    }

    #[inline]
    pub fn changed(&self) -> bool {
        self.changed
    }

    #[inline]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    #[inline]
    pub fn into_expr(self) -> Expr {
        self.expr
    }
}

/// Rebuild a node from rewritten children, or keep it when no child changed.
pub(crate) fn rebuild_binary(
    original: &Expr,
    (a, b): (Rewrite, Rewrite),
    make: impl FnOnce(Expr, Expr) -> ExprKind,
) -> Rewrite {
    if !a.changed && !b.changed {
        return Rewrite::same(original);
    }
    Rewrite::new(original.rebuild(make(a.expr, b.expr)))
}

/// State of one pipeline run: scope chain, unifier and recursion guard.
pub struct Context<'env> {
    environment: &'env Environment,
    scope: Scope,
    unifier: Unifier,
    calculator: Arc<LogicalCalculator>,
    expanding: SmallVec<Symbol, 4>,
    renamed: usize,
}

impl<'env> Context<'env> {
    pub fn new(environment: &'env Environment) -> Self {
        let calculator = environment.calculator();
        let unifier =
            Unifier::new(calculator.clone()).with_error_mode(environment.config().error_mode);
        Self {
            environment,
            scope: Scope::root(),
            unifier,
            calculator,
            expanding: SmallVec::new(),
            renamed: 0,
        }
    }

    pub fn environment(&self) -> &'env Environment {
        self.environment
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn calculator(&self) -> &LogicalCalculator {
        &self.calculator
    }

    /// Run `f` with `scope` as the current scope, restoring the previous one afterwards.
    pub fn with_scope<T>(
        &mut self,
        scope: Scope,
        f: impl FnOnce(&mut Self) -> TermResult<T>,
    ) -> TermResult<T> {
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = f(self);
        self.scope = saved;
        result
    }

    /// Run `f` while `symbol` is marked as being expanded.
    pub(crate) fn expanding<T>(
        &mut self,
        symbol: &Symbol,
        f: impl FnOnce(&mut Self) -> TermResult<T>,
    ) -> TermResult<T> {
        self.expanding.push(symbol.clone());
        let result = f(self);
        self.expanding.pop();
        result
    }

    pub(crate) fn is_expanding(&self, symbol: &str) -> bool {
        self.expanding.iter().any(|s| &**s == symbol)
    }

    /// A symbol distinct from `symbol`, used to rename a parameter while reducing under it.
    pub(crate) fn fresh_symbol(&mut self, symbol: &str) -> Symbol {
        self.renamed += 1;
        Symbol::from(format!("{symbol}#{}", self.renamed))
    }

    /// Resolve a symbol: local frames first, then the environment tables.
    pub fn lookup(&self, symbol: &str) -> Lookup {
        match self.scope.find(symbol) {
            Some(Some(binding)) => Lookup::Bound {
                binding: binding.clone(),
                global: false,
            },
            Some(None) => Lookup::Shadowed,
            None => match self.environment.lookup(symbol) {
                Some(binding) => Lookup::Bound {
                    binding,
                    global: true,
                },
                None => Lookup::Free,
            },
        }
    }

    /// Bind a lambda parameter in a child of the current scope.
    pub(crate) fn bind_local(&self, symbol: Symbol, binding: Binding) -> Scope {
        self.scope.bind(symbol, binding)
    }

    pub fn unify(&mut self, from: &Expr, to: &Expr, bidirectional: bool) -> TermResult<()> {
        self.unifier.unify(from, to, bidirectional)
    }

    pub fn resolve(&self, index: PlaceholderIndex) -> Option<Expr> {
        self.unifier.resolve(index)
    }

    pub fn normalize_aliases(&mut self) {
        self.unifier.normalize_aliases();
        trace!("Normalized {} binding(s)", self.unifier.len());
    }

    pub fn topology(&self) -> Topology {
        self.unifier.snapshot()
    }
}

impl PlaceholderProvider for Context<'_> {
    fn create_placeholder(&self, hint: PlaceholderOrderHint) -> Expr {
        self.environment.create_placeholder(hint)
    }
}
