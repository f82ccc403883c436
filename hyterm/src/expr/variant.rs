use strum::{Display, EnumIter, FromRepr};

/// Tag of the outer constructor of an [`Expr`](crate::expr::Expr).
///
/// The declaration order is meaningful: it is used as the fallback ordering between
/// terms of different shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, FromRepr, Display)]
#[repr(u8)]
pub enum ExprType {
    // Host leaves
    Type,
    Constant,
    Property,
    Method,
    MethodBinder,
    MethodPartialClosure,

    // Names
    Variable,
    BoundVariable,
    Placeholder,

    // Calculus
    Lambda,
    Apply,
    Function,

    // Logic
    And,
    Or,

    // Kind tower
    TypeKind,
    Fourth,
    Unspecified,
    DeadEnd,
}

impl ExprType {
    /// Terms the unifier never attempts to solve.
    pub fn ignores_unification(self) -> bool {
        matches!(self, ExprType::DeadEnd | ExprType::Unspecified)
    }

    /// Leaves that carry no children.
    pub fn is_leaf(self) -> bool {
        !matches!(
            self,
            ExprType::Lambda
                | ExprType::Apply
                | ExprType::Function
                | ExprType::And
                | ExprType::Or
                | ExprType::MethodPartialClosure
        )
    }
}
