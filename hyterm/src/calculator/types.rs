//! Subtyping specialization of the calculator.
//!
//! Host types narrow under `And` (keep the more derived type) and widen under `Or` (keep
//! the more general one). Function types are compared axis by axis with the same choice on
//! the parameters and on the results; the function is accepted only when both axes agree.

use crate::{
    calculator::{BaseChoicer, ChoiceResult, Choicer, LogicalCalculator},
    expr::{Expr, ExprKind},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeChoicer;

/// Combine the per-axis choices of two function types. Mixed answers stay unrelated.
fn combine_axes(parameter: ChoiceResult, result: ChoiceResult) -> Option<ChoiceResult> {
    use ChoiceResult::*;
    match (parameter, result) {
        (Equal, Equal) => Some(Equal),
        (Equal, AcceptLeft) | (AcceptLeft, Equal) | (AcceptLeft, AcceptLeft) => Some(AcceptLeft),
        (Equal, AcceptRight) | (AcceptRight, Equal) | (AcceptRight, AcceptRight) => {
            Some(AcceptRight)
        }
        _ => None,
    }
}

/// `(rtl, ltr)` for two host type terms: whether each side accepts the other.
fn assignability(left: &Expr, right: &Expr) -> Option<(bool, bool)> {
    match (left.kind(), right.kind()) {
        (ExprKind::Type(lt), ExprKind::Type(rt)) => {
            Some((lt.is_assignable_from(rt), rt.is_assignable_from(lt)))
        }
        _ => None,
    }
}

fn function_axes<'a>(left: &'a Expr, right: &'a Expr) -> Option<[(&'a Expr, &'a Expr); 2]> {
    match (left.kind(), right.kind()) {
        (
            ExprKind::Function {
                parameter: lp,
                result: lr,
            },
            ExprKind::Function {
                parameter: rp,
                result: rr,
            },
        ) => Some([(lp, rp), (lr, rr)]),
        _ => None,
    }
}

impl Choicer for TypeChoicer {
    fn choice_for_and(&self, calculator: &LogicalCalculator, left: &Expr, right: &Expr) -> ChoiceResult {
        // Narrowing
        if let Some((rtl, ltr)) = assignability(left, right) {
            match (rtl, ltr) {
                (true, true) => return ChoiceResult::Equal,
                (true, false) => return ChoiceResult::AcceptRight,
                (false, true) => return ChoiceResult::AcceptLeft,
                (false, false) => {}
            }
        }

        if let Some([(lp, rp), (lr, rr)]) = function_axes(left, right) {
            let parameter = self.choice_for_and(calculator, lp, rp);
            let result = self.choice_for_and(calculator, lr, rr);
            if let Some(choice) = combine_axes(parameter, result) {
                return choice;
            }
        }

        BaseChoicer.choice_for_and(calculator, left, right)
    }

    fn choice_for_or(&self, calculator: &LogicalCalculator, left: &Expr, right: &Expr) -> ChoiceResult {
        // Widening
        if let Some((rtl, ltr)) = assignability(left, right) {
            match (rtl, ltr) {
                (true, true) => return ChoiceResult::Equal,
                (true, false) => return ChoiceResult::AcceptLeft,
                (false, true) => return ChoiceResult::AcceptRight,
                (false, false) => {}
            }
        }

        if let Some([(lp, rp), (lr, rr)]) = function_axes(left, right) {
            let parameter = self.choice_for_or(calculator, lp, rp);
            let result = self.choice_for_or(calculator, lr, rr);
            if let Some(choice) = combine_axes(parameter, result) {
                return choice;
            }
        }

        BaseChoicer.choice_for_or(calculator, left, right)
    }
}
