//! Precedence-climbing parser producing an [`Expr`] tree

use std::fmt;

use super::lexer::{Lexer, Token, TokenKind};
use crate::config::ExpressionConfig;
use crate::error::ExpressionError;

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`, right-associative
    Pow,
}

impl BinaryOp {
    /// Left and right binding power. Higher binds tighter; a right power
    /// below the left one makes the operator right-associative.
    fn binding_power(self) -> (u8, u8) {
        match self {
            BinaryOp::Add | BinaryOp::Sub => (1, 2),
            BinaryOp::Mul | BinaryOp::Div => (3, 4),
            BinaryOp::Pow => (7, 6),
        }
    }

    fn from_token(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Caret => Some(BinaryOp::Pow),
            _ => None,
        }
    }

    /// Operator symbol
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }
}

/// Unary minus binds looser than `^` and tighter than `*`.
const PREFIX_POWER: u8 = 5;

/// Parsed arithmetic expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Decimal literal
    Number(f64),

    /// Named binding
    Variable(String),

    /// Unary minus
    Negate(Box<Expr>),

    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
}

impl Expr {
    /// Parse with the default configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use instanced_vars::expression::{BinaryOp, Expr};
    ///
    /// let expr = Expr::parse("1 + x * 2").unwrap();
    /// assert!(matches!(expr, Expr::Binary { op: BinaryOp::Add, .. }));
    /// ```
    pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
        Self::parse_with_config(source, &ExpressionConfig::default())
    }

    /// Parse with an explicit nesting limit.
    ///
    /// The limit bounds both the parser's own recursion and the depth of
    /// the resulting tree, so a long flat chain such as `a + a + ... + a`
    /// is rejected with [`ExpressionError::NestingTooDeep`] once it has more
    /// than `max_depth` levels.
    pub fn parse_with_config(
        source: &str,
        config: &ExpressionConfig,
    ) -> Result<Expr, ExpressionError> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            max_depth: config.max_depth,
        };

        let (expr, _) = parser.parse_expr(0)?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(unexpected(token)),
        }
    }

    /// Names of every variable the expression mentions, in first-use order.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Negate(inner) => inner.collect_variables(names),
            Expr::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Negate(inner) => write!(f, "(-{})", inner),
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

/// A parsed sub-tree with its depth (a leaf has depth 1).
type Parsed = (Expr, usize);

impl Parser {
    fn parse_expr(&mut self, min_power: u8) -> Result<Parsed, ExpressionError> {
        self.depth += 1;
        self.check_depth(self.depth)?;

        let (mut left, mut height) = self.parse_prefix()?;

        while let Some(token) = self.peek() {
            let op = match &token.kind {
                TokenKind::CloseParen => break,
                kind => BinaryOp::from_token(kind).ok_or_else(|| unexpected(token))?,
            };

            let (left_power, right_power) = op.binding_power();
            if left_power < min_power {
                break;
            }

            self.advance();
            let (right, right_height) = self.parse_expr(right_power)?;
            height = height.max(right_height) + 1;
            self.check_depth(height)?;

            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth -= 1;
        Ok((left, height))
    }

    fn parse_prefix(&mut self) -> Result<Parsed, ExpressionError> {
        let token = self
            .advance()
            .ok_or_else(|| ExpressionError::UnexpectedEnd {
                expected: "a number, name or `(`".to_string(),
            })?;

        match token.kind {
            TokenKind::Number(n) => Ok((Expr::Number(n), 1)),
            TokenKind::Identifier(name) => Ok((Expr::Variable(name), 1)),
            TokenKind::Minus => {
                let (operand, height) = self.parse_expr(PREFIX_POWER)?;
                self.check_depth(height + 1)?;
                Ok((Expr::Negate(Box::new(operand)), height + 1))
            }
            TokenKind::Plus => self.parse_expr(PREFIX_POWER),
            TokenKind::OpenParen => {
                let inner = self.parse_expr(0)?;
                self.expect_close_paren()?;
                Ok(inner)
            }
            _ => Err(unexpected(&token)),
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), ExpressionError> {
        if depth > self.max_depth {
            return Err(ExpressionError::NestingTooDeep {
                depth,
                max: self.max_depth,
            });
        }
        Ok(())
    }

    fn expect_close_paren(&mut self) -> Result<(), ExpressionError> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::CloseParen,
                ..
            }) => Ok(()),
            Some(token) => Err(unexpected(&token)),
            None => Err(ExpressionError::UnexpectedEnd {
                expected: "`)`".to_string(),
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

fn unexpected(token: &Token) -> ExpressionError {
    ExpressionError::UnexpectedToken {
        found: token.kind.to_string(),
        position: token.position,
    }
}
