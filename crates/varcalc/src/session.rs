//! Calculator session state: named shared bindings and one expression slot

use anyhow::{bail, Context, Result};
use instanced_vars::{BoundExpression, Reference, ValuePrototype};

/// A line entered at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// `:quit`
    Quit,
    /// `:vars`
    Vars,
    /// `NAME = EXPRESSION`
    Assign { name: String, source: String },
    /// Anything else
    Evaluate(String),
}

impl Input {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        match line {
            ":quit" | ":q" => return Ok(Input::Quit),
            ":vars" => return Ok(Input::Vars),
            _ if line.starts_with(':') => bail!("unknown command `{}`", line),
            _ => {}
        }

        match line.split_once('=') {
            Some((name, source)) => {
                let name = name.trim();
                if !is_identifier(name) {
                    bail!("`{}` is not a valid binding name", name);
                }
                Ok(Input::Assign {
                    name: name.to_string(),
                    source: source.trim().to_string(),
                })
            }
            None => Ok(Input::Evaluate(line.to_string())),
        }
    }
}

/// Parse a `--bind NAME=VALUE` argument.
pub fn parse_binding(arg: &str) -> Result<(String, f64)> {
    let (name, value) = arg
        .split_once('=')
        .with_context(|| format!("binding `{}` is not of the form NAME=VALUE", arg))?;
    let name = name.trim();
    if !is_identifier(name) {
        bail!("`{}` is not a valid binding name", name);
    }
    let value = value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("binding `{}` has a non-numeric value", name))?;
    Ok((name.to_string(), value))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub struct Session {
    expression: BoundExpression<f64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            expression: BoundExpression::new(""),
        }
    }

    /// Write `value` to `name`, creating a shared prototype for new names.
    pub fn set(&mut self, name: &str, value: f64) {
        match self.expression.binding(name) {
            Some(reference) => reference.set_value(value),
            None => {
                let prototype = ValuePrototype::new(name, value);
                self.expression.bind(name, Reference::shared(prototype));
            }
        }
        tracing::debug!(name, value, "binding updated");
    }

    pub fn evaluate(&mut self, source: &str) -> Result<f64> {
        self.expression.set_expression(source);
        let value = self
            .expression
            .value()
            .with_context(|| format!("cannot evaluate `{}`", source))?;
        Ok(value)
    }

    /// Evaluate `source` and store the result under `name`.
    pub fn assign(&mut self, name: &str, source: &str) -> Result<f64> {
        let value = self.evaluate(source)?;
        self.set(name, value);
        Ok(value)
    }

    /// Bindings and their current values, in creation order.
    pub fn vars(&self) -> Vec<(String, f64)> {
        self.expression
            .bindings()
            .map(|(name, reference)| (name.to_string(), reference.value()))
            .collect()
    }
}
