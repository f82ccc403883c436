//! The binding environment and the phase pipeline.
//!
//! An [`Environment`] owns the global binding table, the placeholder allocator and the
//! calculator. Every [`Environment::infer`] / [`Environment::reduce`] call runs in a fresh
//! [`Context`]: constraints recorded during one call never leak into the next, and a failed
//! call leaves the environment exactly as it was.
//!
//! ```
//! use hyterm::prelude::*;
//!
//! let env = Environment::new();
//! let id = lambda(bound("x"), variable("x"));
//! let three = env.reduce(&apply(id, constant(3))).unwrap();
//! assert_eq!(three, constant(3));
//! assert_eq!(three.higher_order(), type_term(builtin::I32.clone()));
//! ```

pub mod config;
pub mod scope;

use std::{io, sync::Arc};

use log::{debug, trace};
use parking_lot::Mutex;

pub use self::config::EnvironmentConfig;
use self::scope::{Binding, BindingTable, Scope};
use crate::{
    attributes::BoundAttributes,
    calculator::LogicalCalculator,
    error::TermResult,
    expr::{
        Expr, Symbol, fourth,
        pretty::{PrettyExpr, PrettyMode},
        type_kind, type_term, unspecified,
    },
    host::{HostType, TypeCategory, TypeRegistry},
    placeholder::{PlaceholderAllocator, PlaceholderOrderHint, PlaceholderProvider},
    transform::{Context, Rewrite},
    unify::Topology,
};

pub struct Environment {
    bindings: Arc<BindingTable>,
    allocator: Arc<PlaceholderAllocator>,
    calculator: Arc<LogicalCalculator>,
    config: Arc<EnvironmentConfig>,
    registry: Option<Arc<TypeRegistry>>,
    last_topology: Mutex<Option<Topology>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::with_config(EnvironmentConfig::default())
    }

    pub fn with_config(config: EnvironmentConfig) -> Self {
        let env = Self {
            bindings: Arc::new(BindingTable::new()),
            allocator: Arc::new(PlaceholderAllocator::new()),
            calculator: Arc::new(LogicalCalculator::types()),
            config: Arc::new(config),
            registry: None,
            last_topology: Mutex::new(None),
        };
        env.mutable_bind("_", unspecified());
        env.mutable_bind("#", fourth());
        env.mutable_bind("*", type_kind());
        env
    }

    /// Attach a host type registry and bind every type it knows under its name.
    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        for ty in registry.types() {
            self.bind_type(ty);
        }
        self.registry = Some(registry);
        self
    }

    pub fn registry(&self) -> Option<&TypeRegistry> {
        self.registry.as_deref()
    }

    /// Register a host type and bind it under its name.
    ///
    /// Without an attached registry the type is only bound.
    pub fn register_type(
        &self,
        name: &str,
        category: TypeCategory,
        bases: &[HostType],
    ) -> TermResult<HostType> {
        let ty = match &self.registry {
            Some(registry) => registry.register(name, category, bases)?,
            None => HostType::new(name, category, bases),
        };
        self.bind_type(ty.clone());
        Ok(ty)
    }

    fn bind_type(&self, ty: HostType) {
        let name = ty.name().to_string();
        self.mutable_bind_with(name, type_term(ty), BoundAttributes::NEUTRAL, type_kind());
    }

    /// A child environment: its own bindings on top of this one's, everything else shared.
    pub fn create_scope(&self) -> Environment {
        Self {
            bindings: Arc::new(BindingTable::with_parent(self.bindings.clone())),
            allocator: self.allocator.clone(),
            calculator: self.calculator.clone(),
            config: self.config.clone(),
            registry: self.registry.clone(),
            last_topology: Mutex::new(None),
        }
    }

    /// Install or overwrite a binding in this scope.
    pub fn mutable_bind(&self, symbol: impl Into<Symbol>, expression: Expr) {
        self.mutable_bind_with(symbol, expression, BoundAttributes::NEUTRAL, unspecified());
    }

    /// Install or overwrite a binding with explicit attributes and a declared higher order.
    pub fn mutable_bind_with(
        &self,
        symbol: impl Into<Symbol>,
        expression: Expr,
        attributes: BoundAttributes,
        symbol_higher_order: Expr,
    ) {
        let symbol = symbol.into();
        debug!("Binding {} [{}] := {}", symbol, attributes.readable(), expression);
        self.bindings.insert(
            symbol,
            Binding {
                attributes,
                symbol_higher_order,
                expression,
                closure: Scope::root(),
            },
        );
    }

    /// Innermost global binding of `symbol`, searching parent scopes.
    pub fn lookup(&self, symbol: &str) -> Option<Binding> {
        self.bindings.get(symbol)
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.bindings.symbols()
    }

    pub fn calculator(&self) -> Arc<LogicalCalculator> {
        self.calculator.clone()
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Placeholder indices issued so far by this environment and its scopes.
    pub fn last_placeholder_index(&self) -> usize {
        self.allocator.last_index()
    }

    /// A fresh pipeline context for manual phase control.
    pub fn context(&self) -> Context<'_> {
        Context::new(self)
    }

    /// Transpose, make rewritable, infer and fix up `expr`.
    pub fn infer(&self, expr: &Expr) -> TermResult<Expr> {
        let mut ctx = self.context();
        let inferred = self.run_inference(&mut ctx, expr)?;
        self.retain(&ctx);
        Ok(inferred)
    }

    /// Infer `expr`, then evaluate it to normal form.
    pub fn reduce(&self, expr: &Expr) -> TermResult<Expr> {
        let mut ctx = self.context();
        let inferred = self.run_inference(&mut ctx, expr)?;
        let reduced = self.phase("reduce", &inferred, |e| ctx.reduce(e))?;
        self.retain(&ctx);
        Ok(reduced)
    }

    /// Unify two expressions in a fresh context and return the fixed-up bindings.
    pub fn unify(&self, from: &Expr, to: &Expr) -> TermResult<Topology> {
        let mut ctx = self.context();
        ctx.unify(from, to, false)?;
        ctx.normalize_aliases();
        let topology = Topology::new(
            ctx.topology()
                .iter()
                .map(|(index, expr)| (index, ctx.fixup(expr).into_expr())),
        );
        self.retain(&ctx);
        Ok(topology)
    }

    /// Bindings of the last successful call, when retained.
    pub fn last_topology(&self) -> Option<Topology> {
        self.last_topology.lock().clone()
    }

    /// Print `expr` to stdout in the given mode.
    pub fn print(&self, expr: &Expr, mode: PrettyMode) -> io::Result<()> {
        let stdout = termcolor::StandardStream::stdout(termcolor::ColorChoice::Auto);
        let mut stdout = stdout.lock();
        expr.pretty_render_to(mode, self.config.pretty_width, &mut stdout)?;
        io::Write::write_all(&mut stdout, b"\n")
    }

    fn run_inference(&self, ctx: &mut Context<'_>, expr: &Expr) -> TermResult<Expr> {
        let transposed = self.phase("transpose", expr, |e| ctx.transpose(e))?;
        let rewritable = self.phase("make-rewritable", &transposed, |e| {
            ctx.make_rewritable(e, PlaceholderOrderHint::VariableOrAbove)
        })?;
        let inferred = self.phase("infer", &rewritable, |e| ctx.infer(e))?;
        ctx.normalize_aliases();
        self.phase("fixup", &inferred, |e| Ok(ctx.fixup(e)))
    }

    fn phase(
        &self,
        name: &str,
        expr: &Expr,
        run: impl FnOnce(&Expr) -> TermResult<Rewrite>,
    ) -> TermResult<Expr> {
        debug!("Phase {} on {}", name, expr.pretty_string(PrettyMode::Minimum));
        let rewrite = run(expr)?;
        debug!(
            "Phase {} done ({}): {}",
            name,
            if rewrite.changed() { "changed" } else { "unchanged" },
            rewrite.expr().pretty_string(PrettyMode::Readable)
        );
        if self.config.trace_phases {
            trace!("After {}:\n{}", name, rewrite.expr().to_xml());
        }
        Ok(rewrite.into_expr())
    }

    fn retain(&self, ctx: &Context<'_>) {
        if self.config.retain_topology {
            *self.last_topology.lock() = Some(ctx.topology());
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceholderProvider for Environment {
    fn create_placeholder(&self, hint: PlaceholderOrderHint) -> Expr {
        self.allocator.create_placeholder(hint)
    }
}
