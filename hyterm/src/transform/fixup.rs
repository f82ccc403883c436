//! Fixup: substitute solved placeholders and normalize the resulting higher orders.

use crate::{
    expr::{Expr, ExprKind, HigherOrder},
    transform::{Context, Rewrite},
};

impl Context<'_> {
    /// Replace every placeholder the unifier solved, recursively, and run each rewritten higher
    /// order through the calculator. Placeholders left unsolved stay in place.
    pub fn fixup(&self, expr: &Expr) -> Rewrite {
        if let ExprKind::Placeholder(index) = expr.kind() {
            if let Some(solution) = self.resolve(*index) {
                if !solution.ptr_eq(expr) && solution.as_placeholder() != Some(*index) {
                    return Rewrite::new(self.fixup(&solution).into_expr());
                }
            }
        }

        let (kind, children_changed) = self.fixup_children(expr);

        match expr.higher_order_storage() {
            HigherOrder::Evaluated(higher_order) => {
                let fixed = self.fixup_higher_order(higher_order);
                match (children_changed, fixed.changed()) {
                    (false, false) => Rewrite::same(expr),
                    _ => Rewrite::new(expr.rebuild_with(kind, fixed.into_expr())),
                }
            }
            HigherOrder::Deferred(_) | HigherOrder::Terminal => {
                if children_changed {
                    Rewrite::new(expr.rebuild(kind))
                } else {
                    Rewrite::same(expr)
                }
            }
        }
    }

    fn fixup_higher_order(&self, higher_order: &Expr) -> Rewrite {
        let fixed = self.fixup(higher_order);
        let computed = self.calculator().compute(fixed.expr());
        if fixed.changed() || !computed.ptr_eq(fixed.expr()) {
            Rewrite::new(computed)
        } else {
            Rewrite::same(higher_order)
        }
    }

    fn fixup_children(&self, expr: &Expr) -> (ExprKind, bool) {
        let pair = |a: &Expr, b: &Expr| {
            let (a, b) = (self.fixup(a), self.fixup(b));
            let changed = a.changed() || b.changed();
            (a.into_expr(), b.into_expr(), changed)
        };
        match expr.kind() {
            ExprKind::Lambda { parameter, body } => {
                let (parameter, body, changed) = pair(parameter, body);
                (ExprKind::Lambda { parameter, body }, changed)
            }
            ExprKind::Apply { function, argument } => {
                let (function, argument, changed) = pair(function, argument);
                (ExprKind::Apply { function, argument }, changed)
            }
            ExprKind::Function { parameter, result } => {
                let (parameter, result, changed) = pair(parameter, result);
                (ExprKind::Function { parameter, result }, changed)
            }
            ExprKind::And(left, right) => {
                let (left, right, changed) = pair(left, right);
                (ExprKind::And(left, right), changed)
            }
            ExprKind::Or(left, right) => {
                let (left, right, changed) = pair(left, right);
                (ExprKind::Or(left, right), changed)
            }
            other => (other.clone(), false),
        }
    }
}
