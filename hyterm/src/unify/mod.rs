//! Placeholder unification.
//!
//! The [`Unifier`] records, for one inference call, what every placeholder stands for.
//! Unification is directional: `unify(from, to)` requires `from` to be usable where `to` is
//! expected, checked by the calculator as `from || to == to`. Placeholders bind once; later
//! constraints are checked against the binding. Two unbound placeholders become aliases, the
//! higher index pointing at the lower one.

pub mod topology;

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use log::{debug, trace};

use crate::{
    calculator::LogicalCalculator,
    error::{TermError, TermResult},
    expr::{
        Expr, ExprKind, or,
        pretty::{PrettyExpr, PrettyMode},
    },
    placeholder::PlaceholderIndex,
};

pub use self::topology::Topology;

/// Which side of a constraint a placeholder sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// `other <: placeholder`
    Forward,
    /// `placeholder <: other`
    Backward,
    Both,
}

pub struct Unifier {
    calculator: Arc<LogicalCalculator>,
    bindings: BTreeMap<PlaceholderIndex, Expr>,
    placeholders: BTreeMap<PlaceholderIndex, Expr>,
    error_mode: PrettyMode,
}

impl Unifier {
    pub fn new(calculator: Arc<LogicalCalculator>) -> Self {
        Self {
            calculator,
            bindings: BTreeMap::new(),
            placeholders: BTreeMap::new(),
            error_mode: PrettyMode::Minimum,
        }
    }

    /// Rendering used for the operands quoted in errors.
    pub fn with_error_mode(mut self, error_mode: PrettyMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    pub fn calculator(&self) -> &LogicalCalculator {
        &self.calculator
    }

    /// Require `from` to be usable where `to` is expected (both ways when `bidirectional`).
    ///
    /// A placeholder required to stand for the dead end is an error. Higher orders are unified
    /// level by level, and a tower that ends earlier than the other is not.
    pub fn unify(&mut self, from: &Expr, to: &Expr, bidirectional: bool) -> TermResult<()> {
        for (placeholder, other) in [(from, to), (to, from)] {
            if let (Some(index), true) = (placeholder.as_placeholder(), other.is_dead_end()) {
                return Err(TermError::DeadEndBinding {
                    placeholder: index.to_string(),
                });
            }
        }
        self.unify_levels(from, to, bidirectional)
    }

    fn unify_levels(&mut self, from: &Expr, to: &Expr, bidirectional: bool) -> TermResult<()> {
        if self.calculator.exact_equals(from, to) {
            return Ok(());
        }
        if from.ignores_unification() || to.ignores_unification() {
            return Ok(());
        }

        trace!(
            "unify {} {} {}",
            from.pretty_string(PrettyMode::Strict),
            if bidirectional { "<=>" } else { "<:" },
            to.pretty_string(PrettyMode::Strict)
        );

        self.unify_levels(&from.higher_order(), &to.higher_order(), bidirectional)?;
        self.unify_core(from, to, bidirectional)
    }

    fn unify_core(&mut self, from: &Expr, to: &Expr, bidirectional: bool) -> TermResult<()> {
        match (from.kind(), to.kind()) {
            (ExprKind::And(left, right) | ExprKind::Or(left, right), _) => {
                self.unify(left, to, false)?;
                self.unify(right, to, false)
            }
            (_, ExprKind::And(left, right) | ExprKind::Or(left, right)) => {
                self.unify(from, left, false)?;
                self.unify(from, right, false)
            }
            (
                ExprKind::Function {
                    parameter: fp,
                    result: fr,
                },
                ExprKind::Function {
                    parameter: tp,
                    result: tr,
                },
            ) => {
                // Parameters are contravariant.
                self.unify(tp, fp, false)?;
                self.unify(fr, tr, false)
            }
            (_, ExprKind::Placeholder(_)) => {
                let direction = if bidirectional {
                    Direction::Both
                } else {
                    Direction::Forward
                };
                self.bind(to, from, direction)
            }
            (ExprKind::Placeholder(_), _) => {
                let direction = if bidirectional {
                    Direction::Both
                } else {
                    Direction::Backward
                };
                self.bind(from, to, direction)
            }
            _ => {
                if self.subsumes(from, to) || (bidirectional && self.subsumes(to, from)) {
                    Ok(())
                } else {
                    Err(self.unification_error(from, to))
                }
            }
        }
    }

    /// `from || to == to`
    fn subsumes(&self, from: &Expr, to: &Expr) -> bool {
        let widened = self.calculator.compute(&or(from.clone(), to.clone()));
        self.calculator.equals(&widened, to)
    }

    /// Check an existing binding against a new constraint.
    fn check(&mut self, bound: &Expr, other: &Expr, direction: Direction) -> TermResult<()> {
        match direction {
            Direction::Forward => self.unify(other, bound, false),
            Direction::Backward => self.unify(bound, other, false),
            Direction::Both => self.unify(bound, other, true),
        }
    }

    fn bind(&mut self, placeholder: &Expr, other: &Expr, direction: Direction) -> TermResult<()> {
        let Some(index) = placeholder.as_placeholder() else {
            return Err(self.unification_error(placeholder, other));
        };
        self.placeholders
            .entry(index)
            .or_insert_with(|| placeholder.clone());

        let representative = self.representative(index);

        if let Some(other_index) = other.as_placeholder() {
            self.placeholders
                .entry(other_index)
                .or_insert_with(|| other.clone());
            let other_representative = self.representative(other_index);
            if representative == other_representative {
                return Ok(());
            }

            let bound = self.bindings.get(&representative).cloned();
            let other_bound = self.bindings.get(&other_representative).cloned();
            return match (bound, other_bound) {
                (None, None) => {
                    let low = representative.min(other_representative);
                    let high = representative.max(other_representative);
                    self.link(high, low)
                }
                (Some(_), None) => self.link(other_representative, representative),
                (None, Some(_)) => self.link(representative, other_representative),
                (Some(bound), Some(other_bound)) => self.check(&bound, &other_bound, direction),
            };
        }

        match self.bindings.get(&representative).cloned() {
            Some(bound) => self.check(&bound, other, direction),
            None => {
                if self.occurs(representative, other, &mut BTreeSet::new()) {
                    return Err(TermError::OccursCheck {
                        placeholder: representative.to_string(),
                        expression: other.pretty_string(self.error_mode),
                    });
                }
                debug!(
                    "Bound {} := {}",
                    representative,
                    other.pretty_string(PrettyMode::Readable)
                );
                self.bindings.insert(representative, other.clone());
                Ok(())
            }
        }
    }

    /// Make `from` an alias of `to`.
    fn link(&mut self, from: PlaceholderIndex, to: PlaceholderIndex) -> TermResult<()> {
        let (Some(source), Some(target)) = (
            self.placeholders.get(&from).cloned(),
            self.placeholders.get(&to).cloned(),
        ) else {
            return Ok(());
        };
        if self.occurs(from, &target, &mut BTreeSet::new())
            || self.occurs(to, &source, &mut BTreeSet::new())
        {
            return Err(TermError::OccursCheck {
                placeholder: from.to_string(),
                expression: target.pretty_string(self.error_mode),
            });
        }
        debug!("Aliased {} => {}", from, to);
        self.bindings.insert(from, target);
        Ok(())
    }

    /// Whether `index` appears in `expr`, its higher orders, or the bindings it reaches.
    fn occurs(
        &self,
        index: PlaceholderIndex,
        expr: &Expr,
        visited: &mut BTreeSet<PlaceholderIndex>,
    ) -> bool {
        match expr.kind() {
            ExprKind::DeadEnd | ExprKind::Unspecified => return false,
            ExprKind::Placeholder(current) => {
                if *current == index {
                    return true;
                }
                if !visited.insert(*current) {
                    return false;
                }
                if let Some(bound) = self.bindings.get(current) {
                    if self.occurs(index, bound, visited) {
                        return true;
                    }
                }
            }
            _ => {}
        }
        expr.children()
            .into_iter()
            .any(|child| self.occurs(index, child, visited))
            || self.occurs(index, &expr.higher_order(), visited)
    }

    /// Follow placeholder-to-placeholder links to the end of the chain.
    fn representative(&self, index: PlaceholderIndex) -> PlaceholderIndex {
        let mut current = index;
        let mut steps = 0;
        while let Some(next) = self.bindings.get(&current).and_then(Expr::as_placeholder) {
            current = next;
            steps += 1;
            if steps > self.bindings.len() {
                break;
            }
        }
        current
    }

    /// Current binding of a placeholder, if any.
    pub fn resolve(&self, index: PlaceholderIndex) -> Option<Expr> {
        self.bindings.get(&index).cloned()
    }

    /// Point every alias directly at the end of its chain: the representative's binding when
    /// it has one, the representative itself otherwise.
    pub fn normalize_aliases(&mut self) {
        let aliases: Vec<PlaceholderIndex> = self
            .bindings
            .iter()
            .filter(|(_, expr)| expr.as_placeholder().is_some())
            .map(|(index, _)| *index)
            .collect();

        for index in aliases {
            let representative = self.representative(index);
            let target = match self.bindings.get(&representative) {
                Some(bound) => Some(bound.clone()),
                None => self.placeholders.get(&representative).cloned(),
            };
            if let Some(target) = target {
                self.bindings.insert(index, target);
            }
        }
    }

    fn unification_error(&self, from: &Expr, to: &Expr) -> TermError {
        TermError::Unification {
            from: from.pretty_string(self.error_mode),
            to: to.pretty_string(self.error_mode),
        }
    }

    pub fn snapshot(&self) -> Topology {
        Topology::new(self.bindings.iter().map(|(index, expr)| (*index, expr.clone())))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
