//! Arithmetic expressions over named references
//!
//! Grammar, loosest to tightest:
//!
//! ```text
//! expr   := expr ('+' | '-') expr
//!         | expr ('*' | '/') expr
//!         | ('-' | '+') expr
//!         | expr '^' expr            (right-associative)
//!         | number | name | '(' expr ')'
//! ```
//!
//! Expressions evaluate in `f64`; [`Numeric`] converts to and from the
//! element type of the bound references.

pub mod eval;
pub mod lexer;
pub mod parser;

pub use eval::Scope;
pub use parser::{BinaryOp, Expr};

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::config::ExpressionConfig;
use crate::error::ExpressionError;
use crate::reference::Reference;

/// Element types an expression can read and produce.
pub trait Numeric: Clone + Default + 'static {
    /// Widen to `f64` for evaluation.
    fn to_f64(&self) -> f64;

    /// Narrow an evaluation result, or `None` if it has no counterpart.
    ///
    /// Floats accept every result, including infinities and NaN. Integers
    /// truncate toward zero and reject non-finite or out-of-range results.
    fn from_f64(value: f64) -> Option<Self>;
}

impl Numeric for f64 {
    fn to_f64(&self) -> f64 {
        *self
    }

    fn from_f64(value: f64) -> Option<Self> {
        Some(value)
    }
}

impl Numeric for f32 {
    fn to_f64(&self) -> f64 {
        f64::from(*self)
    }

    fn from_f64(value: f64) -> Option<Self> {
        Some(value as f32)
    }
}

impl Numeric for i32 {
    fn to_f64(&self) -> f64 {
        f64::from(*self)
    }

    fn from_f64(value: f64) -> Option<Self> {
        let truncated = value.trunc();
        // Both bounds are exact in f64.
        if (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&truncated) {
            Some(truncated as i32)
        } else {
            None
        }
    }
}

impl Numeric for i64 {
    fn to_f64(&self) -> f64 {
        *self as f64
    }

    fn from_f64(value: f64) -> Option<Self> {
        // i64::MAX rounds up to 2^63 in f64, so the upper bound is exclusive.
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        let truncated = value.trunc();
        if (-LIMIT..LIMIT).contains(&truncated) {
            Some(truncated as i64)
        } else {
            None
        }
    }
}

/// References bound by name, read live during evaluation.
struct Bindings<'a, T: Numeric>(&'a IndexMap<String, Reference<T>>);

impl<T: Numeric> Scope for Bindings<'_, T> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.0.get(name).map(|reference| reference.value().to_f64())
    }
}

/// An expression string evaluated against named references.
///
/// The string is parsed on first use and the tree is kept until the string
/// changes. The result is never cached: every [`value`](Self::value) call
/// reads the bound references afresh.
///
/// # Example
///
/// ```
/// use instanced_vars::{BoundExpression, Reference};
///
/// let mut damage = BoundExpression::new("base * (1 + bonus)");
/// damage.bind("base", Reference::constant(40.0_f32));
/// damage.bind("bonus", Reference::constant(0.5));
///
/// assert_eq!(damage.value().unwrap(), 60.0);
/// ```
pub struct BoundExpression<T: Numeric> {
    source: String,
    bindings: IndexMap<String, Reference<T>>,
    compiled: RefCell<Option<Rc<Expr>>>,
    config: ExpressionConfig,
}

impl<T: Numeric> BoundExpression<T> {
    /// Create an expression with no bindings.
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_config(source, ExpressionConfig::default())
    }

    /// Create an expression with a custom parser configuration.
    pub fn with_config(source: impl Into<String>, config: ExpressionConfig) -> Self {
        Self {
            source: source.into(),
            bindings: IndexMap::new(),
            compiled: RefCell::new(None),
            config,
        }
    }

    /// The expression source.
    pub fn expression(&self) -> &str {
        &self.source
    }

    /// Replace the expression source. It is re-parsed on next use.
    pub fn set_expression(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.compiled.borrow_mut().take();
    }

    /// Bind `name` to `reference`, returning any reference it replaces.
    pub fn bind(&mut self, name: impl Into<String>, reference: Reference<T>) -> Option<Reference<T>> {
        self.bindings.insert(name.into(), reference)
    }

    /// Remove the binding for `name`.
    pub fn unbind(&mut self, name: &str) -> Option<Reference<T>> {
        self.bindings.shift_remove(name)
    }

    /// The reference bound to `name`.
    pub fn binding(&self, name: &str) -> Option<&Reference<T>> {
        self.bindings.get(name)
    }

    /// Bound names with their references, in binding order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Reference<T>)> {
        self.bindings.iter().map(|(name, r)| (name.as_str(), r))
    }

    /// Parse the source, reusing the previous parse when there is one.
    pub fn compile(&self) -> Result<Rc<Expr>, ExpressionError> {
        if let Some(expr) = self.compiled.borrow().as_ref() {
            return Ok(Rc::clone(expr));
        }

        let expr = Rc::new(Expr::parse_with_config(&self.source, &self.config)?);
        *self.compiled.borrow_mut() = Some(Rc::clone(&expr));
        Ok(expr)
    }

    /// Names used by the expression that have no binding.
    pub fn unbound_names(&self) -> Result<Vec<String>, ExpressionError> {
        let expr = self.compile()?;
        Ok(expr
            .variables()
            .into_iter()
            .filter(|name| !self.bindings.contains_key(*name))
            .map(str::to_string)
            .collect())
    }

    /// Evaluate against the current values of the bound references.
    pub fn value(&self) -> Result<T, ExpressionError> {
        let expr = self.compile()?;
        let result = expr.evaluate(&Bindings(&self.bindings))?;
        T::from_f64(result).ok_or(ExpressionError::NotRepresentable {
            value: result,
            target: std::any::type_name::<T>(),
        })
    }

    /// Enable read caching on every bound reference.
    pub fn enable_caching(&self) {
        for reference in self.bindings.values() {
            reference.enable_caching();
        }
    }

    /// Release caching on every bound reference.
    pub fn dispose(&self) {
        for reference in self.bindings.values() {
            reference.dispose();
        }
    }
}
