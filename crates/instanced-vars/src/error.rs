//! Error types for value resolution and expression evaluation

use thiserror::Error;

/// Errors raised while resolving a reference to its storage location.
///
/// The non-fallible accessors on [`Reference`](crate::Reference) and
/// [`ValuePrototype`](crate::ValuePrototype) recover from these locally and
/// report them as diagnostics; the `try_*` variants return them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// A shared or instanced reference has no prototype assigned
    #[error("Missing reference to value prototype ({mode} reference)")]
    MissingPrototype {
        /// Mode of the reference that failed to resolve
        mode: String,
    },

    /// An instanced reference has no owner assigned
    #[error("Missing owner for instanced reference to `{prototype}`")]
    MissingOwner {
        /// Name of the prototype the reference points at
        prototype: String,
    },

    /// A per-owner instance could not be materialized
    #[error("Could not create instance of `{prototype}` for {owner}: {reason}")]
    InstanceCreation {
        /// Prototype whose instancing failed
        prototype: String,
        /// Owner the instance was requested for
        owner: String,
        /// Why creation failed
        reason: String,
    },
}

/// Errors raised while parsing or evaluating an arithmetic expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// A character that starts no token
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character
        ch: char,
        /// Character offset into the source
        position: usize,
    },

    /// A numeric literal that does not parse
    #[error("Invalid number `{text}` at position {position}")]
    InvalidNumber {
        /// Raw literal text
        text: String,
        /// Character offset into the source
        position: usize,
    },

    /// A token that cannot appear where it was found
    #[error("Unexpected token `{found}` at position {position}")]
    UnexpectedToken {
        /// Text of the token
        found: String,
        /// Character offset into the source
        position: usize,
    },

    /// Input ended in the middle of an expression
    #[error("Unexpected end of expression: expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for
        expected: String,
    },

    /// An identifier with no binding
    #[error("Unknown identifier `{name}`")]
    UnknownIdentifier {
        /// The identifier
        name: String,
    },

    /// Right-hand side of `/` evaluated to zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Sub-expressions nested beyond the configured limit
    #[error("Expression nested too deeply: depth {depth} exceeds maximum {max}")]
    NestingTooDeep {
        /// Depth reached
        depth: usize,
        /// Configured maximum
        max: usize,
    },

    /// The result has no value in the element type
    #[error("Result {value} is not representable as {target}")]
    NotRepresentable {
        /// The `f64` result
        value: f64,
        /// Name of the element type
        target: &'static str,
    },
}

/// Result type alias for reference resolution
pub type Result<T> = std::result::Result<T, BindingError>;
