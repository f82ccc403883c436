//! Transpose: turn application spines containing infix operators into prefix applications.
//!
//! A parser sees `a + b * c` as the left-nested application `((((a +) b) *) c)`. Variables
//! bound with infix attributes are recognized inside such spines (except at the start of a
//! group, where they are ordinary prefix functions) and the spine is rebuilt by precedence
//! climbing into `(+) a ((*) b c)`. Juxtaposition binds tighter than any operator. A trailing
//! operator yields the left section `(op a)`.

use either::Either;
use log::trace;
use smallvec::SmallVec;

use crate::{
    attributes::{BoundAttributes, BoundAssociativity, BoundPosition},
    environment::scope::Lookup,
    error::TermResult,
    expr::{Expr, ExprKind, apply},
    transform::{Context, Rewrite, rebuild_binary},
};

type SpineItem = Either<Expr, (Expr, BoundAttributes)>;

/// Head of the spine and the `Apply` nodes above it, innermost first.
fn unwind(expr: &Expr) -> (&Expr, SmallVec<&Expr, 8>) {
    let mut applies = SmallVec::new();
    let mut current = expr;
    while let ExprKind::Apply { function, .. } = current.kind() {
        applies.push(current);
        current = function;
    }
    applies.reverse();
    (current, applies)
}

fn argument_of(apply_node: &Expr) -> Option<&Expr> {
    match apply_node.kind() {
        ExprKind::Apply { argument, .. } => Some(argument),
        _ => None,
    }
}

fn fold_group(group: Vec<Expr>) -> Option<Expr> {
    group.into_iter().reduce(apply)
}

fn binary(operator: Expr, lhs: Expr, rhs: Expr) -> Expr {
    apply(apply(operator, lhs), rhs)
}

/// Precedence climbing over already grouped operands.
fn climb(groups: Vec<Expr>, operators: Vec<(Expr, BoundAttributes)>) -> Option<Expr> {
    let mut groups = groups.into_iter();
    let mut output: Vec<Expr> = vec![groups.next()?];
    let mut stack: Vec<(Expr, BoundAttributes)> = Vec::new();

    fn reduce_top(output: &mut Vec<Expr>, stack: &mut Vec<(Expr, BoundAttributes)>) -> Option<()> {
        let (operator, _) = stack.pop()?;
        let rhs = output.pop()?;
        let lhs = output.pop()?;
        output.push(binary(operator, lhs, rhs));
        Some(())
    }

    for ((operator, attributes), group) in operators.into_iter().zip(groups) {
        while let Some((_, top)) = stack.last() {
            let binds_tighter = top.precedence > attributes.precedence
                || (top.precedence == attributes.precedence
                    && attributes.associativity == BoundAssociativity::LeftToRight);
            if !binds_tighter {
                break;
            }
            reduce_top(&mut output, &mut stack)?;
        }
        stack.push((operator, attributes));
        output.push(group);
    }
    while !stack.is_empty() {
        reduce_top(&mut output, &mut stack)?;
    }
    output.pop()
}

impl Context<'_> {
    pub fn transpose(&mut self, expr: &Expr) -> TermResult<Rewrite> {
        match expr.kind() {
            ExprKind::Apply { .. } => self.transpose_spine(expr),
            ExprKind::Lambda { parameter, body } => {
                let parameter_rw = self.transpose(parameter)?;
                let scope = match parameter.kind() {
                    ExprKind::BoundVariable(symbol) => self.scope().shadow(symbol.clone()),
                    _ => self.scope().clone(),
                };
                let body_rw = self.with_scope(scope, |ctx| ctx.transpose(body))?;
                Ok(rebuild_binary(expr, (parameter_rw, body_rw), |parameter, body| {
                    ExprKind::Lambda { parameter, body }
                }))
            }
            ExprKind::Function { parameter, result } => {
                let children = (self.transpose(parameter)?, self.transpose(result)?);
                Ok(rebuild_binary(expr, children, |parameter, result| {
                    ExprKind::Function { parameter, result }
                }))
            }
            ExprKind::And(left, right) => {
                let children = (self.transpose(left)?, self.transpose(right)?);
                Ok(rebuild_binary(expr, children, ExprKind::And))
            }
            ExprKind::Or(left, right) => {
                let children = (self.transpose(left)?, self.transpose(right)?);
                Ok(rebuild_binary(expr, children, ExprKind::Or))
            }
            _ => Ok(Rewrite::same(expr)),
        }
    }

    /// Attributes of `expr` when it names an infix-bound variable.
    fn infix_attributes(&self, expr: &Expr) -> Option<BoundAttributes> {
        let ExprKind::Variable(symbol) = expr.kind() else {
            return None;
        };
        match self.lookup(symbol) {
            Lookup::Bound { binding, .. } if binding.attributes.position == BoundPosition::Infix => {
                Some(binding.attributes)
            }
            _ => None,
        }
    }

    fn transpose_spine(&mut self, expr: &Expr) -> TermResult<Rewrite> {
        let (head, applies) = unwind(expr);

        let mut items: SmallVec<(Rewrite, SpineItem), 8> = SmallVec::new();
        let mut at_group_start = true;
        for node in std::iter::once(head).chain(applies.iter().filter_map(|node| argument_of(node))) {
            let rewritten = self.transpose(node)?;
            let item = match self.infix_attributes(rewritten.expr()) {
                Some(attributes) if !at_group_start => {
                    at_group_start = true;
                    Either::Right((rewritten.expr().clone(), attributes))
                }
                _ => {
                    at_group_start = false;
                    Either::Left(rewritten.expr().clone())
                }
            };
            items.push((rewritten, item));
        }

        if items.iter().all(|(_, item)| item.is_left()) {
            return Ok(rebuild_prefix_spine(head, &applies, items));
        }

        let mut groups: Vec<Vec<Expr>> = vec![Vec::new()];
        let mut operators: Vec<(Expr, BoundAttributes)> = Vec::new();
        for (_, item) in items {
            match item {
                Either::Left(operand) => {
                    if let Some(group) = groups.last_mut() {
                        group.push(operand);
                    }
                }
                Either::Right(operator) => {
                    operators.push(operator);
                    groups.push(Vec::new());
                }
            }
        }

        let section = match groups.last() {
            Some(last) if last.is_empty() => {
                groups.pop();
                operators.pop()
            }
            _ => None,
        };

        let folded: Vec<Expr> = groups.into_iter().filter_map(fold_group).collect();
        let Some(mut result) = climb(folded, operators) else {
            return Ok(Rewrite::same(expr));
        };
        if let Some((operator, _)) = section {
            result = apply(operator, result);
        }

        trace!("Transposed spine into {}", result);
        Ok(Rewrite::new(result.with_range(expr.range())))
    }
}

/// Spine without operators: keep its shape, sharing every untouched node.
fn rebuild_prefix_spine(
    head: &Expr,
    applies: &[&Expr],
    items: SmallVec<(Rewrite, SpineItem), 8>,
) -> Rewrite {
    let mut rewrites = items.into_iter().map(|(rewrite, _)| rewrite);
    let mut current = rewrites.next().unwrap_or_else(|| Rewrite::same(head));
    for (node, argument) in applies.iter().zip(rewrites) {
        current = rebuild_binary(node, (current, argument), |function, argument| {
            ExprKind::Apply { function, argument }
        });
    }
    current
}
