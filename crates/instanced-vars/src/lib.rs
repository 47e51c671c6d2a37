//! # instanced-vars
//!
//! Runtime value bindings for game logic.
//!
//! A variable is authored once as a [`ValuePrototype`]. Gameplay code reads
//! and writes it through a [`Reference`], which resolves on every access to
//! one of three storage locations:
//!
//! - **Constant**: a value baked into the reference itself
//! - **Shared**: the prototype's single runtime value
//! - **Instanced**: a private copy for an [`OwnerKey`], materialized lazily
//!   the first time that owner touches the prototype
//!
//! References compose into a [`ClampedReference`] (a value kept between two
//! others) and a [`BoundExpression`] (an arithmetic formula over named
//! references).
//!
//! ## Architecture
//!
//! - **Owners**: identity tokens with an optional parent; torn down by the host
//! - **Prototypes**: default value, runtime value, base chain, instance registry
//! - **References**: mode resolution, listeners, read caching
//! - **Composites**: clamped ranges and expressions
//!
//! Everything is single-threaded: handles are `Rc`-based and listener
//! dispatch is synchronous. Diagnostics are emitted as `tracing` events.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clamped;
pub mod config;
pub mod error;
pub mod expression;
pub mod listener;
pub mod owner;
pub mod prototype;
pub mod reference;

// Re-export main types
pub use clamped::ClampedReference;
pub use config::{ExpressionConfig, PrototypeConfig};
pub use error::{BindingError, ExpressionError, Result};
pub use expression::{BoundExpression, Expr, Numeric, Scope};
pub use listener::Listener;
pub use owner::OwnerKey;
pub use prototype::ValuePrototype;
pub use reference::{Reference, ReferenceMode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
