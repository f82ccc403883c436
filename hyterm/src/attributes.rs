//! Notation attributes attached to symbol bindings.
//!
//! Attributes only influence the transpose phase: a variable bound as [`BoundPosition::Infix`]
//! is treated as a binary operator when it appears inside an application spine.

use std::fmt;

use strum::{Display, EnumIs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIs)]
pub enum BoundPosition {
    #[strum(to_string = "PREFIX")]
    Prefix,
    #[strum(to_string = "INFIX")]
    Infix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIs)]
pub enum BoundAssociativity {
    #[strum(to_string = "LTR")]
    LeftToRight,
    #[strum(to_string = "RTL")]
    RightToLeft,
}

/// Binding precedence; higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundPrecedence(pub i32);

impl BoundPrecedence {
    pub const BINDER: BoundPrecedence = BoundPrecedence(-7000);
    pub const COMPOSER: BoundPrecedence = BoundPrecedence(-6000);
    pub const LAMBDA: BoundPrecedence = BoundPrecedence(-5000);
    pub const LOGICAL_OPERATORS: BoundPrecedence = BoundPrecedence(-4000);
    pub const COMPARER: BoundPrecedence = BoundPrecedence(-3000);
    pub const BIT_OPERATORS: BoundPrecedence = BoundPrecedence(-2000);
    pub const ADDITION: BoundPrecedence = BoundPrecedence(-1000);
    pub const MULTIPLY: BoundPrecedence = BoundPrecedence(-900);
    pub const NEUTRAL: BoundPrecedence = BoundPrecedence(0);
    pub const PREFIX_OPERATORS: BoundPrecedence = BoundPrecedence(2000);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundAttributes {
    pub position: BoundPosition,
    pub associativity: BoundAssociativity,
    pub precedence: BoundPrecedence,
}

impl BoundAttributes {
    pub const NEUTRAL: BoundAttributes = BoundAttributes {
        position: BoundPosition::Prefix,
        associativity: BoundAssociativity::LeftToRight,
        precedence: BoundPrecedence::NEUTRAL,
    };

    pub const fn new(
        position: BoundPosition,
        associativity: BoundAssociativity,
        precedence: BoundPrecedence,
    ) -> Self {
        Self {
            position,
            associativity,
            precedence,
        }
    }

    pub const fn prefix(precedence: BoundPrecedence) -> Self {
        Self::new(
            BoundPosition::Prefix,
            BoundAssociativity::LeftToRight,
            precedence,
        )
    }

    pub const fn infix_left(precedence: BoundPrecedence) -> Self {
        Self::new(
            BoundPosition::Infix,
            BoundAssociativity::LeftToRight,
            precedence,
        )
    }

    pub const fn infix_right(precedence: BoundPrecedence) -> Self {
        Self::new(
            BoundPosition::Infix,
            BoundAssociativity::RightToLeft,
            precedence,
        )
    }

    /// Compact form: `IL`, `PR-1000`, ...
    pub fn readable(&self) -> String {
        let position = match self.position {
            BoundPosition::Prefix => 'P',
            BoundPosition::Infix => 'I',
        };
        let associativity = match self.associativity {
            BoundAssociativity::LeftToRight => 'L',
            BoundAssociativity::RightToLeft => 'R',
        };
        if self.precedence == BoundPrecedence::NEUTRAL {
            format!("{position}{associativity}")
        } else {
            format!("{position}{associativity}{}", self.precedence.0)
        }
    }
}

impl Default for BoundAttributes {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Strict form: `INFIX|LTR|-1000`, the precedence omitted when neutral.
impl fmt::Display for BoundAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.position, self.associativity)?;
        if self.precedence != BoundPrecedence::NEUTRAL {
            write!(f, "|{}", self.precedence.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_forms() {
        let attrs = BoundAttributes::infix_left(BoundPrecedence::ADDITION);
        assert_eq!(attrs.to_string(), "INFIX|LTR|-1000");
        assert_eq!(attrs.readable(), "IL-1000");
        assert_eq!(BoundAttributes::NEUTRAL.to_string(), "PREFIX|LTR");
        assert_eq!(BoundAttributes::NEUTRAL.readable(), "PL");
    }
}
