//! Make-rewritable: replace every unknown higher order by a fresh placeholder chain.
//!
//! The hint tells at which level of the kind tower the expression sits. Children of a node
//! sit at the same level, higher orders one level up. Anything at or past the dead-end level
//! collapses to the dead end itself.

use crate::{
    error::TermResult,
    expr::{Expr, ExprKind, HigherOrder, dead_end},
    placeholder::{PlaceholderOrderHint, PlaceholderProvider},
    transform::{Context, Rewrite},
};

impl Context<'_> {
    pub fn make_rewritable(
        &mut self,
        expr: &Expr,
        hint: PlaceholderOrderHint,
    ) -> TermResult<Rewrite> {
        if hint >= PlaceholderOrderHint::DeadEnd {
            return Ok(if expr.is_dead_end() {
                Rewrite::same(expr)
            } else {
                Rewrite::new(dead_end())
            });
        }

        match expr.kind() {
            ExprKind::Unspecified => Ok(Rewrite::new(self.create_placeholder(hint))),

            ExprKind::Fourth
            | ExprKind::TypeKind
            | ExprKind::DeadEnd
            | ExprKind::Placeholder(_)
            | ExprKind::Constant(_)
            | ExprKind::Type(_)
            | ExprKind::Method(_)
            | ExprKind::MethodBinder(_)
            | ExprKind::MethodPartialClosure(_)
            | ExprKind::Property(_) => Ok(Rewrite::same(expr)),

            ExprKind::Variable(_) | ExprKind::BoundVariable(_) => {
                let higher_order = expr.higher_order();
                let rewritten = self.make_rewritable(&higher_order, hint.above())?;
                Ok(self.with_rewritten_higher_order(expr, expr.kind().clone(), false, rewritten))
            }

            ExprKind::Lambda { parameter, body } => {
                let parameter = self.make_rewritable(parameter, hint)?;
                let body = self.make_rewritable(body, hint)?;
                self.rebuild_composite(expr, hint, (parameter, body), |parameter, body| {
                    ExprKind::Lambda { parameter, body }
                })
            }
            ExprKind::Apply { function, argument } => {
                let function = self.make_rewritable(function, hint)?;
                let argument = self.make_rewritable(argument, hint)?;
                self.rebuild_composite(expr, hint, (function, argument), |function, argument| {
                    ExprKind::Apply { function, argument }
                })
            }
            ExprKind::Function { parameter, result } => {
                let parameter = self.make_rewritable(parameter, hint)?;
                let result = self.make_rewritable(result, hint)?;
                self.rebuild_composite(expr, hint, (parameter, result), |parameter, result| {
                    ExprKind::Function { parameter, result }
                })
            }
            ExprKind::And(left, right) => {
                let left = self.make_rewritable(left, hint)?;
                let right = self.make_rewritable(right, hint)?;
                self.rebuild_composite(expr, hint, (left, right), ExprKind::And)
            }
            ExprKind::Or(left, right) => {
                let left = self.make_rewritable(left, hint)?;
                let right = self.make_rewritable(right, hint)?;
                self.rebuild_composite(expr, hint, (left, right), ExprKind::Or)
            }
        }
    }

    fn rebuild_composite(
        &mut self,
        expr: &Expr,
        hint: PlaceholderOrderHint,
        (a, b): (Rewrite, Rewrite),
        make: impl FnOnce(Expr, Expr) -> ExprKind,
    ) -> TermResult<Rewrite> {
        if let HigherOrder::Deferred(_) = expr.higher_order_storage() {
            // Derived from the children, which are rewritten already.
            return Ok(if a.changed() || b.changed() {
                Rewrite::new(expr.rebuild(make(a.into_expr(), b.into_expr())))
            } else {
                Rewrite::same(expr)
            });
        }
        let higher_order = expr.higher_order();
        let rewritten = self.make_rewritable(&higher_order, hint.above())?;
        let children_changed = a.changed() || b.changed();
        let kind = make(a.into_expr(), b.into_expr());
        Ok(self.with_rewritten_higher_order(expr, kind, children_changed, rewritten))
    }

    fn with_rewritten_higher_order(
        &self,
        expr: &Expr,
        kind: ExprKind,
        children_changed: bool,
        higher_order: Rewrite,
    ) -> Rewrite {
        if !children_changed && !higher_order.changed() {
            return Rewrite::same(expr);
        }
        Rewrite::new(expr.rebuild_with(kind, higher_order.into_expr()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        environment::Environment,
        expr::{ExprType, apply, lambda, bound, variable, constant},
    };

    #[test]
    fn unknown_higher_orders_become_placeholder_chains() {
        let env = Environment::new();
        let mut ctx = env.context();
        let expr = apply(lambda(bound("x"), variable("x")), constant(1));
        let rewritten = ctx
            .make_rewritable(&expr, PlaceholderOrderHint::VariableOrAbove)
            .unwrap();
        assert!(rewritten.changed());

        let result = rewritten.expr();
        assert_eq!(result.higher_order().expr_type(), ExprType::Placeholder);
        let ExprKind::Apply { function, argument } = result.kind() else {
            panic!("expected an application, got {result:?}");
        };
        assert_eq!(function.higher_order().expr_type(), ExprType::Placeholder);
        // Constants already know their type.
        assert!(argument.ptr_eq(match expr.kind() {
            ExprKind::Apply { argument, .. } => argument,
            _ => unreachable!(),
        }));
    }

    #[test]
    fn past_the_tower_everything_is_a_dead_end() {
        let env = Environment::new();
        let mut ctx = env.context();
        let rewritten = ctx
            .make_rewritable(&variable("x"), PlaceholderOrderHint::DeadEnd)
            .unwrap();
        assert!(rewritten.expr().is_dead_end());

        let again = ctx
            .make_rewritable(rewritten.expr(), PlaceholderOrderHint::DeadEnd)
            .unwrap();
        assert!(!again.changed());
    }

    #[test]
    fn a_fully_typed_leaf_is_left_alone() {
        let env = Environment::new();
        let mut ctx = env.context();
        let expr = constant(42);
        let rewritten = ctx
            .make_rewritable(&expr, PlaceholderOrderHint::VariableOrAbove)
            .unwrap();
        assert!(!rewritten.changed());
        assert!(rewritten.expr().ptr_eq(&expr));
    }
}
