//! Infer: generate unification constraints between the higher orders of a tree.
//!
//! The tree must have gone through make-rewritable first, so every unknown higher order is
//! a placeholder the unifier can bind. Inference itself only rewrites lambdas whose type
//! cannot exist (a parameter or body at the top of the kind tower); everything else is
//! recorded in the context's unifier and applied later by fixup.

use log::trace;

use crate::{
    attributes::BoundAttributes,
    environment::scope::{Binding, Lookup},
    error::TermResult,
    expr::{Expr, ExprKind, Symbol, dead_end, function},
    placeholder::PlaceholderOrderHint,
    transform::{Context, Rewrite, rebuild_binary},
};

impl Context<'_> {
    pub fn infer(&mut self, expr: &Expr) -> TermResult<Rewrite> {
        match expr.kind() {
            ExprKind::Variable(symbol) => {
                self.infer_variable(expr, symbol)?;
                Ok(Rewrite::same(expr))
            }
            ExprKind::Lambda { parameter, body } => self.infer_lambda(expr, parameter, body),
            ExprKind::Apply {
                function: callee,
                argument,
            } => {
                let callee_rw = self.infer(callee)?;
                let argument_rw = self.infer(argument)?;
                let expected = function(argument_rw.expr().higher_order(), expr.higher_order());
                self.constrain(&callee_rw.expr().higher_order(), &expected, false)?;
                Ok(rebuild_binary(expr, (callee_rw, argument_rw), |function, argument| {
                    ExprKind::Apply { function, argument }
                }))
            }
            ExprKind::Function { parameter, result } => {
                let parameter_rw = self.infer(parameter)?;
                let result_rw = self.infer(result)?;
                let signature = function(
                    parameter_rw.expr().higher_order(),
                    result_rw.expr().higher_order(),
                );
                self.constrain(&signature, &expr.higher_order(), true)?;
                Ok(rebuild_binary(expr, (parameter_rw, result_rw), |parameter, result| {
                    ExprKind::Function { parameter, result }
                }))
            }
            ExprKind::And(left, right) => {
                let children = self.infer_junction(expr, left, right)?;
                Ok(rebuild_binary(expr, children, ExprKind::And))
            }
            ExprKind::Or(left, right) => {
                let children = self.infer_junction(expr, left, right)?;
                Ok(rebuild_binary(expr, children, ExprKind::Or))
            }
            _ => Ok(Rewrite::same(expr)),
        }
    }

    fn infer_variable(&mut self, expr: &Expr, symbol: &Symbol) -> TermResult<()> {
        let (binding, global) = match self.lookup(symbol) {
            Lookup::Bound { binding, global } => (binding, global),
            Lookup::Shadowed | Lookup::Free => return Ok(()),
        };

        // A lambda parameter: the occurrence shares the parameter's higher order.
        if let ExprKind::BoundVariable(bound_symbol) = binding.expression.kind() {
            if bound_symbol == symbol {
                return self.constrain(&binding.symbol_higher_order, &expr.higher_order(), true);
            }
        }

        if global && self.is_expanding(symbol) {
            trace!("Skipping recursive occurrence of {}", symbol);
            return Ok(());
        }

        let declared = self.make_rewritable(&binding.symbol_higher_order, PlaceholderOrderHint::TypeOrAbove)?;
        let declared = self.infer(declared.expr())?.into_expr();

        let target = self.with_scope(binding.closure.clone(), |ctx| {
            ctx.expanding(symbol, |ctx| {
                let rewritable =
                    ctx.make_rewritable(&binding.expression, PlaceholderOrderHint::VariableOrAbove)?;
                ctx.infer(rewritable.expr())
            })
        })?;
        let target_higher_order = target.expr().higher_order();

        self.constrain(&declared, &target_higher_order, true)?;
        self.constrain(&target_higher_order, &expr.higher_order(), true)
    }

    fn infer_lambda(&mut self, expr: &Expr, parameter: &Expr, body: &Expr) -> TermResult<Rewrite> {
        let parameter_rw = self.infer(parameter)?;

        let scope = match parameter.kind() {
            ExprKind::BoundVariable(symbol) => self.bind_local(
                symbol.clone(),
                Binding {
                    attributes: BoundAttributes::NEUTRAL,
                    symbol_higher_order: parameter_rw.expr().higher_order(),
                    expression: parameter_rw.expr().clone(),
                    closure: self.scope().clone(),
                },
            ),
            _ => self.scope().clone(),
        };
        let body_rw = self.with_scope(scope, |ctx| ctx.infer(body))?;

        let parameter_type = parameter_rw.expr().higher_order();
        let body_type = body_rw.expr().higher_order();
        let untypeable = parameter_rw.expr().is_fourth()
            || body_rw.expr().is_fourth()
            || parameter_type.is_dead_end()
            || body_type.is_dead_end();

        if untypeable {
            if expr.higher_order().is_dead_end() && !parameter_rw.changed() && !body_rw.changed() {
                return Ok(Rewrite::same(expr));
            }
            let kind = ExprKind::Lambda {
                parameter: parameter_rw.into_expr(),
                body: body_rw.into_expr(),
            };
            return Ok(Rewrite::new(expr.rebuild_with(kind, dead_end())));
        }

        self.constrain(&function(parameter_type, body_type), &expr.higher_order(), false)?;
        Ok(rebuild_binary(expr, (parameter_rw, body_rw), |parameter, body| {
            ExprKind::Lambda { parameter, body }
        }))
    }

    fn infer_junction(
        &mut self,
        expr: &Expr,
        left: &Expr,
        right: &Expr,
    ) -> TermResult<(Rewrite, Rewrite)> {
        let left_rw = self.infer(left)?;
        let right_rw = self.infer(right)?;
        let left_type = left_rw.expr().higher_order();
        let right_type = right_rw.expr().higher_order();
        let own = expr.higher_order();
        self.constrain(&left_type, &right_type, true)?;
        self.constrain(&left_type, &own, false)?;
        self.constrain(&right_type, &own, false)?;
        Ok((left_rw, right_rw))
    }

    /// Unify two higher orders. A dead end on either side is the top of a kind tower and
    /// constrains nothing.
    fn constrain(&mut self, from: &Expr, to: &Expr, bidirectional: bool) -> TermResult<()> {
        if from.is_dead_end() || to.is_dead_end() {
            return Ok(());
        }
        self.unify(from, to, bidirectional)
    }
}
