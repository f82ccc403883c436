//! Reduce: evaluate an inferred tree to normal form.
//!
//! Applications of lambdas bind the parameter to the unevaluated argument together with the
//! caller's scope, so each use of the parameter reduces the argument where it was written.
//! Applications of callable leaves reduce the argument first and hand it to the host.

use log::trace;

use crate::{
    attributes::BoundAttributes,
    environment::scope::{Binding, Lookup},
    error::TermResult,
    expr::{Expr, ExprKind, Symbol, constant},
    transform::{Context, Rewrite, rebuild_binary},
};

impl Context<'_> {
    pub fn reduce(&mut self, expr: &Expr) -> TermResult<Rewrite> {
        match expr.kind() {
            ExprKind::Variable(symbol) => self.reduce_variable(expr, symbol),
            ExprKind::Lambda { parameter, body } => match parameter.kind() {
                ExprKind::BoundVariable(symbol) => self.reduce_lambda(expr, parameter, symbol, body),
                _ => {
                    let body_rw = self.reduce(body)?;
                    Ok(rebuild_binary(
                        expr,
                        (Rewrite::same(parameter), body_rw),
                        |parameter, body| ExprKind::Lambda { parameter, body },
                    ))
                }
            },
            ExprKind::Apply {
                function: callee,
                argument,
            } => self.reduce_apply(expr, callee, argument),
            ExprKind::Function { parameter, result } => {
                let children = (self.reduce(parameter)?, self.reduce(result)?);
                Ok(rebuild_binary(expr, children, |parameter, result| {
                    ExprKind::Function { parameter, result }
                }))
            }
            ExprKind::And(left, right) => {
                let children = (self.reduce(left)?, self.reduce(right)?);
                let rebuilt = rebuild_binary(expr, children, ExprKind::And);
                Ok(self.compute(expr, rebuilt))
            }
            ExprKind::Or(left, right) => {
                let children = (self.reduce(left)?, self.reduce(right)?);
                let rebuilt = rebuild_binary(expr, children, ExprKind::Or);
                Ok(self.compute(expr, rebuilt))
            }
            ExprKind::Property(property) => Ok(Rewrite::new(
                constant(property.get()?).with_range(expr.range()),
            )),
            _ => Ok(Rewrite::same(expr)),
        }
    }

    fn compute(&self, original: &Expr, rebuilt: Rewrite) -> Rewrite {
        let computed = self.calculator().compute(rebuilt.expr());
        Rewrite::compare(original, computed)
    }

    /// Reduce under a binder.
    ///
    /// The parameter is first renamed to a fresh symbol so that values flowing in through
    /// closures can never be captured by it. The original name is restored when the reduced
    /// body allows it.
    fn reduce_lambda(
        &mut self,
        expr: &Expr,
        parameter: &Expr,
        symbol: &Symbol,
        body: &Expr,
    ) -> TermResult<Rewrite> {
        let fresh = self.fresh_symbol(symbol);
        let inner = self.scope().shadow(fresh.clone());
        let scope = inner.bind(
            symbol.clone(),
            Binding {
                attributes: BoundAttributes::NEUTRAL,
                symbol_higher_order: parameter.higher_order(),
                expression: parameter.rebuild(ExprKind::Variable(fresh.clone())),
                closure: inner.clone(),
            },
        );
        let reduced = self.with_scope(scope, |ctx| ctx.reduce(body))?.into_expr();

        match reduced.rename(&fresh, symbol) {
            Some(restored) if restored == *body => Ok(Rewrite::same(expr)),
            Some(restored) => Ok(Rewrite::new(expr.rebuild(ExprKind::Lambda {
                parameter: parameter.clone(),
                body: restored,
            }))),
            None => {
                trace!("Renamed parameter {} to {}", symbol, fresh);
                Ok(Rewrite::new(expr.rebuild(ExprKind::Lambda {
                    parameter: parameter.rebuild(ExprKind::BoundVariable(fresh)),
                    body: reduced,
                })))
            }
        }
    }

    fn reduce_variable(&mut self, expr: &Expr, symbol: &Symbol) -> TermResult<Rewrite> {
        let Lookup::Bound { binding, global } = self.lookup(symbol) else {
            return Ok(Rewrite::same(expr));
        };
        if let ExprKind::BoundVariable(bound_symbol) = binding.expression.kind() {
            if bound_symbol == symbol {
                return Ok(Rewrite::same(expr));
            }
        }
        if global && self.is_expanding(symbol) {
            return Ok(Rewrite::same(expr));
        }

        let reduced = self.with_scope(binding.closure.clone(), |ctx| {
            if global {
                ctx.expanding(symbol, |ctx| ctx.reduce(&binding.expression))
            } else {
                ctx.reduce(&binding.expression)
            }
        })?;
        trace!("Expanded {} into {}", symbol, reduced.expr());
        Ok(Rewrite::new(reduced.into_expr()))
    }

    fn reduce_apply(&mut self, expr: &Expr, callee: &Expr, argument: &Expr) -> TermResult<Rewrite> {
        let is_value = |callee: &Expr| {
            matches!(callee.kind(), ExprKind::Lambda { .. }) || callee.as_callable().is_some()
        };
        let callee_rw = if is_value(callee) {
            Rewrite::same(callee)
        } else {
            self.reduce(callee)?
        };

        let reduced_callee = callee_rw.expr().clone();
        match reduced_callee.kind() {
            ExprKind::Lambda { parameter, body } => {
                let scope = match parameter.kind() {
                    ExprKind::BoundVariable(symbol) => self.bind_local(
                        symbol.clone(),
                        Binding {
                            attributes: BoundAttributes::NEUTRAL,
                            symbol_higher_order: parameter.higher_order(),
                            expression: argument.clone(),
                            closure: self.scope().clone(),
                        },
                    ),
                    _ => self.scope().clone(),
                };
                let result = self.with_scope(scope, |ctx| ctx.reduce(body))?;
                Ok(Rewrite::new(result.into_expr()))
            }
            _ => {
                let argument_rw = self.reduce(argument)?;
                if let Some(callable) = reduced_callee.as_callable() {
                    // Under a binder the argument may still depend on a parameter.
                    if !self.mentions_parameter(argument_rw.expr()) {
                        let result = callable.call(argument_rw.expr())?;
                        return Ok(Rewrite::new(result.with_range(expr.range())));
                    }
                }
                Ok(rebuild_binary(expr, (callee_rw, argument_rw), |function, argument| {
                    ExprKind::Apply { function, argument }
                }))
            }
        }
    }

    /// Whether `expr` contains a variable bound to a parameter without a value.
    fn mentions_parameter(&self, expr: &Expr) -> bool {
        match expr.kind() {
            ExprKind::Variable(symbol) => matches!(self.lookup(symbol), Lookup::Shadowed),
            _ => expr
                .children()
                .into_iter()
                .any(|child| self.mentions_parameter(child)),
        }
    }
}
