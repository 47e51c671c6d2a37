//! Tunables for instancing and expression parsing

use serde::{Deserialize, Serialize};

/// Default limit on base-chain links followed while materializing an instance.
pub const DEFAULT_MAX_BASE_DEPTH: usize = 64;

/// Default limit on expression nesting and tree depth.
pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 256;

/// Configuration carried by every [`ValuePrototype`](crate::ValuePrototype).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrototypeConfig {
    /// Maximum number of `base` links walked by `get_or_create_instance`.
    ///
    /// A base chain can be re-pointed at runtime, so it may loop. Walking
    /// past this limit is reported as an instance creation failure.
    pub max_base_depth: usize,
}

impl Default for PrototypeConfig {
    fn default() -> Self {
        Self {
            max_base_depth: DEFAULT_MAX_BASE_DEPTH,
        }
    }
}

impl PrototypeConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with a custom base-chain limit.
    pub fn with_max_base_depth(max_depth: usize) -> Self {
        Self {
            max_base_depth: max_depth,
        }
    }
}

/// Configuration for parsing a [`BoundExpression`](crate::BoundExpression).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionConfig {
    /// Maximum nesting of sub-expressions.
    ///
    /// Counts parentheses and unary operators as well as every operator
    /// folded into a chain, so `a + b + c` is three levels deep.
    pub max_depth: usize,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
        }
    }
}

impl ExpressionConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with a custom nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}
