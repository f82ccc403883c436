use std::error::Error as StdError;

use thiserror::Error;

/// Fault raised by a native member body.
pub type NativeError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TermError {
    #[error("Couldn't unify: {from} <: {to}")]
    Unification { from: String, to: String },

    #[error("Occurs check failed: {placeholder} occurs in {expression}")]
    OccursCheck {
        placeholder: String,
        expression: String,
    },

    #[error("Placeholder {placeholder} cannot be bound to a dead end")]
    DeadEndBinding { placeholder: String },

    #[error("Invalid argument for '{callee}': {argument}")]
    InvalidArgument { callee: String, argument: String },

    #[error("Argument type mismatch for '{callee}': expected {expected}, found {actual}")]
    ArgumentType {
        callee: String,
        expected: String,
        actual: String,
    },

    #[error("Native invocation of '{member}' failed: {cause}")]
    NativeInvocation {
        member: String,
        cause: String,
        #[source]
        source: NativeError,
    },

    #[error("Type '{0}' is already registered with a different definition")]
    TypeRedefinition(String),

    #[error("Failed to parse environment configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TermError {
    /// Wrap a native fault, presenting the innermost cause of its `source()` chain.
    pub fn native(member: impl Into<String>, source: NativeError) -> Self {
        let cause = innermost_cause(source.as_ref()).to_string();
        TermError::NativeInvocation {
            member: member.into(),
            cause,
            source,
        }
    }
}

/// Walk the `source()` chain down to the last error.
pub fn innermost_cause<'a>(error: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut current = error;
    while let Some(next) = current.source() {
        current = next;
    }
    current
}

pub type TermResult<T> = Result<T, TermError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer failure")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("division by zero")]
    struct Inner;

    #[test]
    fn native_fault_reports_innermost_cause() {
        let err = TermError::native("div", Box::new(Outer(Inner)));
        assert_eq!(
            err.to_string(),
            "Native invocation of 'div' failed: division by zero"
        );
        assert!(StdError::source(&err).is_some());
    }
}
