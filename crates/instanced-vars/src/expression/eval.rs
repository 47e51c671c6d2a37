//! Evaluation of parsed expressions against a variable scope

use std::collections::{BTreeMap, HashMap};

use super::parser::{BinaryOp, Expr};
use crate::error::ExpressionError;

/// Supplies variable values during evaluation.
pub trait Scope {
    /// Current value of `name`, or `None` if it is not bound.
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl Scope for HashMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Scope for BTreeMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Expr {
    /// Evaluate against `scope`. Every variable is looked up afresh.
    ///
    /// # Example
    ///
    /// ```
    /// use instanced_vars::expression::Expr;
    /// use std::collections::HashMap;
    ///
    /// let scope = HashMap::from([("a".to_string(), 10.0), ("b".to_string(), 2.0)]);
    /// let expr = Expr::parse("a ^ b").unwrap();
    /// assert_eq!(expr.evaluate(&scope).unwrap(), 100.0);
    /// ```
    pub fn evaluate(&self, scope: &dyn Scope) -> Result<f64, ExpressionError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Variable(name) => {
                scope
                    .lookup(name)
                    .ok_or_else(|| ExpressionError::UnknownIdentifier {
                        name: name.clone(),
                    })
            }
            Expr::Negate(inner) => Ok(-inner.evaluate(scope)?),
            Expr::Binary { op, left, right } => {
                let left = left.evaluate(scope)?;
                let right = right.evaluate(scope)?;
                apply(*op, left, right)
            }
        }
    }
}

fn apply(op: BinaryOp, left: f64, right: f64) -> Result<f64, ExpressionError> {
    match op {
        BinaryOp::Add => Ok(left + right),
        BinaryOp::Sub => Ok(left - right),
        BinaryOp::Mul => Ok(left * right),
        BinaryOp::Div => {
            if right == 0.0 {
                return Err(ExpressionError::DivisionByZero);
            }
            Ok(left / right)
        }
        BinaryOp::Pow => Ok(left.powf(right)),
    }
}
