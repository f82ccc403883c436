//! Algebraic calculator for `And`/`Or` combinations.
//!
//! Role
//! - Decide, pair by pair, how two operands combine under `And` (narrowing) and `Or`
//!   (widening) through a [`Choicer`].
//! - Simplify trees by flattening, absorption (`a && (a || b) = a`) and shrinking (dropping
//!   operands a sibling already covers).
//! - Compare expressions logically, i.e. up to associativity, commutativity and idempotence
//!   of `And`/`Or`.
//!
//! The calculator is pure; one instance can be shared between threads.

pub mod ordering;
pub mod types;

use std::{cmp::Ordering, sync::Arc};

use smallvec::SmallVec;

use crate::expr::{Expr, ExprKind, and, or};

pub use self::ordering::compare_terms;
pub use self::types::TypeChoicer;

/// Outcome of combining two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceResult {
    /// Keep both operands; the combination stays explicit.
    NonRelated,
    Equal,
    AcceptLeft,
    AcceptRight,
}

impl ChoiceResult {
    /// The result for the same pair given in the opposite order.
    pub fn mirror(self) -> Self {
        match self {
            ChoiceResult::AcceptLeft => ChoiceResult::AcceptRight,
            ChoiceResult::AcceptRight => ChoiceResult::AcceptLeft,
            other => other,
        }
    }
}

/// Pairwise decision procedure plugged into a [`LogicalCalculator`].
pub trait Choicer: Send + Sync {
    fn choice_for_and(&self, calculator: &LogicalCalculator, left: &Expr, right: &Expr) -> ChoiceResult;

    fn choice_for_or(&self, calculator: &LogicalCalculator, left: &Expr, right: &Expr) -> ChoiceResult;
}

/// Boolean algebra only: equal operands are idempotent, anything else is unrelated.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseChoicer;

impl Choicer for BaseChoicer {
    fn choice_for_and(&self, calculator: &LogicalCalculator, left: &Expr, right: &Expr) -> ChoiceResult {
        if calculator.equals(left, right) {
            ChoiceResult::Equal
        } else {
            ChoiceResult::NonRelated
        }
    }

    fn choice_for_or(&self, calculator: &LogicalCalculator, left: &Expr, right: &Expr) -> ChoiceResult {
        self.choice_for_and(calculator, left, right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
}

impl Operator {
    fn of(expr: &Expr) -> Option<(Operator, &Expr, &Expr)> {
        match expr.kind() {
            ExprKind::And(left, right) => Some((Operator::And, left, right)),
            ExprKind::Or(left, right) => Some((Operator::Or, left, right)),
            _ => None,
        }
    }

    fn dual(self) -> Operator {
        match self {
            Operator::And => Operator::Or,
            Operator::Or => Operator::And,
        }
    }

    fn create(self, left: Expr, right: Expr) -> Expr {
        match self {
            Operator::And => and(left, right),
            Operator::Or => or(left, right),
        }
    }

    fn choose(self, choicer: &dyn Choicer, calculator: &LogicalCalculator, left: &Expr, right: &Expr) -> ChoiceResult {
        match self {
            Operator::And => choicer.choice_for_and(calculator, left, right),
            Operator::Or => choicer.choice_for_or(calculator, left, right),
        }
    }
}

type Operands = SmallVec<Expr, 8>;

/// Collect the operands of a chain of `operator` nodes, left to right.
fn flatten_into(operator: Operator, expr: &Expr, operands: &mut Operands) {
    match Operator::of(expr) {
        Some((current, left, right)) if current == operator => {
            flatten_into(operator, left, operands);
            flatten_into(operator, right, operands);
        }
        _ => operands.push(expr.clone()),
    }
}

fn flatten(operator: Operator, expr: &Expr) -> Operands {
    let mut operands = Operands::new();
    flatten_into(operator, expr, &mut operands);
    operands
}

/// Fold operands left to right: `((a op b) op c) ...`. `None` when there is nothing to fold.
fn construct_nested(operator: Operator, operands: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    operands
        .into_iter()
        .reduce(|acc, operand| operator.create(acc, operand))
}

pub struct LogicalCalculator {
    choicer: Arc<dyn Choicer>,
    sorted: bool,
}

impl LogicalCalculator {
    pub fn new(choicer: Arc<dyn Choicer>, sorted: bool) -> Self {
        Self { choicer, sorted }
    }

    /// Plain boolean algebra.
    pub fn logical() -> Self {
        Self::new(Arc::new(BaseChoicer), false)
    }

    /// Subtyping aware calculator, with deterministic operand order.
    pub fn types() -> Self {
        Self::new(Arc::new(TypeChoicer), true)
    }

    pub fn choicer(&self) -> &dyn Choicer {
        self.choicer.as_ref()
    }

    pub fn choice_for_and(&self, left: &Expr, right: &Expr) -> ChoiceResult {
        self.choicer.choice_for_and(self, left, right)
    }

    pub fn choice_for_or(&self, left: &Expr, right: &Expr) -> ChoiceResult {
        self.choicer.choice_for_or(self, left, right)
    }

    /// Logical equality: `And`/`Or` chains compare as operand sets, everything else
    /// structurally.
    pub fn equals(&self, lhs: &Expr, rhs: &Expr) -> bool {
        if lhs.ptr_eq(rhs) {
            return true;
        }
        match (Operator::of(lhs), Operator::of(rhs)) {
            (Some((lo, ..)), Some((ro, ..))) if lo == ro => {
                let left = flatten(lo, lhs);
                let right = flatten(ro, rhs);
                let covers = |a: &Operands, b: &Operands| {
                    a.iter().all(|x| b.iter().any(|y| self.equals(x, y)))
                };
                covers(&left, &right) && covers(&right, &left)
            }
            (Some(_), _) | (_, Some(_)) => false,
            _ => self.equals_shape(lhs, rhs),
        }
    }

    fn equals_shape(&self, lhs: &Expr, rhs: &Expr) -> bool {
        match (lhs.kind(), rhs.kind()) {
            (
                ExprKind::Lambda {
                    parameter: lp,
                    body: lb,
                },
                ExprKind::Lambda {
                    parameter: rp,
                    body: rb,
                },
            )
            | (
                ExprKind::Apply {
                    function: lp,
                    argument: lb,
                },
                ExprKind::Apply {
                    function: rp,
                    argument: rb,
                },
            )
            | (
                ExprKind::Function {
                    parameter: lp,
                    result: lb,
                },
                ExprKind::Function {
                    parameter: rp,
                    result: rb,
                },
            ) => self.equals(lp, rp) && self.equals(lb, rb),
            _ => lhs == rhs,
        }
    }

    /// Logical equality of the expressions and of their whole higher order chains.
    pub fn exact_equals(&self, lhs: &Expr, rhs: &Expr) -> bool {
        if lhs.ptr_eq(rhs) {
            return true;
        }
        if !self.equals(lhs, rhs) {
            return false;
        }
        match (lhs.is_dead_end(), rhs.is_dead_end()) {
            (true, true) => true,
            (true, false) | (false, true) => false,
            _ => self.exact_equals(
                &self.compute(&lhs.higher_order()),
                &self.compute(&rhs.higher_order()),
            ),
        }
    }

    pub fn compute(&self, expr: &Expr) -> Expr {
        let choicer = self.choicer.clone();
        self.compute_with(expr, choicer.as_ref())
    }

    /// Simplify every `And`/`Or` in `expr` with the given choicer.
    ///
    /// Returns `expr` itself when nothing could be simplified.
    pub fn compute_with(&self, expr: &Expr, choicer: &dyn Choicer) -> Expr {
        match expr.kind() {
            ExprKind::And(left, right) | ExprKind::Or(left, right) => {
                let operator = match expr.kind() {
                    ExprKind::And(..) => Operator::And,
                    _ => Operator::Or,
                };
                let left = self.compute_with(left, choicer);
                let right = self.compute_with(right, choicer);

                if let Some(absorbed) = self.absorption(operator, &left, &right, choicer) {
                    return self.compute_with(&absorbed, choicer);
                }

                self.shrink(expr, operator, left, right, choicer)
            }
            ExprKind::Function { parameter, result } => {
                let parameter_ = self.compute_with(parameter, choicer);
                let result_ = self.compute_with(result, choicer);
                if parameter_.ptr_eq(parameter) && result_.ptr_eq(result) {
                    expr.clone()
                } else {
                    expr.rebuild(ExprKind::Function {
                        parameter: parameter_,
                        result: result_,
                    })
                }
            }
            _ => expr.clone(),
        }
    }

    /// `a op (b dual c)`: distribute `a` over the dual chain, keeping only the operands
    /// related to `a`.
    fn absorption(
        &self,
        operator: Operator,
        left: &Expr,
        right: &Expr,
        choicer: &dyn Choicer,
    ) -> Option<Expr> {
        let dual = operator.dual();
        let pick = |l: &Expr, r: &Expr| match operator.choose(choicer, self, l, r) {
            ChoiceResult::Equal | ChoiceResult::AcceptLeft => Some(l.clone()),
            ChoiceResult::AcceptRight => Some(r.clone()),
            ChoiceResult::NonRelated => None,
        };

        let results: Operands = match (Operator::of(left), Operator::of(right)) {
            (_, Some((o, ..))) if o == dual => flatten(dual, right)
                .iter()
                .filter_map(|operand| pick(left, operand))
                .collect(),
            (Some((o, ..)), _) if o == dual => flatten(dual, left)
                .iter()
                .filter_map(|operand| pick(operand, right))
                .collect(),
            _ => return None,
        };

        construct_nested(dual, results)
    }

    fn shrink(
        &self,
        original: &Expr,
        operator: Operator,
        left: Expr,
        right: Expr,
        choicer: &dyn Choicer,
    ) -> Expr {
        let mut flattened = flatten(operator, &left);
        flatten_into(operator, &right, &mut flattened);
        let mut candidates = flattened.clone();

        loop {
            let mut changed = false;
            let mut i = 0;
            while i < candidates.len() {
                let mut j = i + 1;
                while j < candidates.len() {
                    let choice = if candidates[i] == candidates[j] {
                        ChoiceResult::Equal
                    } else {
                        operator.choose(choicer, self, &candidates[i], &candidates[j])
                    };
                    match choice {
                        ChoiceResult::Equal | ChoiceResult::AcceptLeft => {
                            candidates.remove(j);
                            changed = true;
                        }
                        ChoiceResult::AcceptRight => {
                            candidates.swap(i, j);
                            candidates.remove(j);
                            changed = true;
                        }
                        ChoiceResult::NonRelated => j += 1,
                    }
                }
                i += 1;
            }
            if !changed {
                break;
            }
        }

        if self.sorted {
            candidates.sort_by(compare_terms);
        }

        let unchanged = candidates.len() == flattened.len()
            && candidates
                .iter()
                .zip(flattened.iter())
                .all(|(a, b)| a.ptr_eq(b));
        if unchanged {
            if let Some((_, l, r)) = Operator::of(original) {
                if l.ptr_eq(&left) && r.ptr_eq(&right) {
                    return original.clone();
                }
            }
        }

        match construct_nested(operator, candidates) {
            Some(result) if Operator::of(&result).is_some() => original.rebuild(result.kind().clone()),
            Some(result) => result,
            None => original.clone(),
        }
    }

    /// Deterministic order used for candidate lists of a sorted calculator.
    pub fn compare(&self, lhs: &Expr, rhs: &Expr) -> Ordering {
        compare_terms(lhs, rhs)
    }
}

impl Default for LogicalCalculator {
    fn default() -> Self {
        Self::logical()
    }
}

impl std::fmt::Debug for LogicalCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicalCalculator")
            .field("sorted", &self.sorted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::variable;

    #[test]
    fn absorption_and_idempotence() {
        let calculator = LogicalCalculator::logical();
        let a = variable("a");
        let b = variable("b");

        let absorbed = calculator.compute(&and(a.clone(), or(a.clone(), b.clone())));
        assert_eq!(absorbed, a);

        let idempotent = calculator.compute(&or(b.clone(), or(a.clone(), b.clone())));
        assert!(calculator.equals(&idempotent, &or(a.clone(), b.clone())));
    }

    #[test]
    fn unrelated_operands_are_kept_as_is() {
        let calculator = LogicalCalculator::logical();
        let expr = and(variable("a"), variable("b"));
        assert!(calculator.compute(&expr).ptr_eq(&expr));
    }

    #[test]
    fn set_equality() {
        let calculator = LogicalCalculator::logical();
        let (a, b, c) = (variable("a"), variable("b"), variable("c"));
        assert!(calculator.equals(
            &and(a.clone(), and(b.clone(), c.clone())),
            &and(and(c.clone(), a.clone()), b.clone())
        ));
        assert!(!calculator.equals(&and(a.clone(), b.clone()), &or(a, b)));
    }
}
