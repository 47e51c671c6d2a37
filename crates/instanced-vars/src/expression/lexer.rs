//! Tokenizer for arithmetic expressions

use std::fmt;

use crate::error::ExpressionError;

/// A token with the character offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// Character offset into the source
    pub position: usize,
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Decimal literal
    Number(f64),
    /// Variable name
    Identifier(String),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `^`
    Caret,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Identifier(name) => write!(f, "{}", name),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Caret => write!(f, "^"),
            Self::OpenParen => write!(f, "("),
            Self::CloseParen => write!(f, ")"),
        }
    }
}

/// Lexer over an expression string
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    /// Create a new lexer from input text
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            if self.pos >= self.input.len() {
                return Ok(tokens);
            }
            tokens.push(self.next_token()?);
        }
    }

    fn next_token(&mut self) -> Result<Token, ExpressionError> {
        let ch = self.input[self.pos];
        let position = self.pos;

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '^' => TokenKind::Caret,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            c if c.is_ascii_digit() || c == '.' => return self.read_number(),
            c if c.is_ascii_alphabetic() || c == '_' => return Ok(self.read_identifier()),
            _ => return Err(ExpressionError::UnexpectedCharacter { ch, position }),
        };

        self.pos += 1;
        Ok(Token { kind, position })
    }

    fn read_number(&mut self) -> Result<Token, ExpressionError> {
        let position = self.pos;
        let text = self.take_while(|c| c.is_ascii_digit() || c == '.');

        text.parse::<f64>()
            .map(|n| Token {
                kind: TokenKind::Number(n),
                position,
            })
            .map_err(|_| ExpressionError::InvalidNumber { text, position })
    }

    fn read_identifier(&mut self) -> Token {
        let position = self.pos;
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        Token {
            kind: TokenKind::Identifier(name),
            position,
        }
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.pos < self.input.len() && accept(self.input[self.pos]) {
            self.pos += 1;
        }
        self.input[start..self.pos].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_operators_and_names() {
        assert_eq!(
            kinds("(a + b_2) ^ 3.5"),
            vec![
                TokenKind::OpenParen,
                TokenKind::Identifier("a".to_string()),
                TokenKind::Plus,
                TokenKind::Identifier("b_2".to_string()),
                TokenKind::CloseParen,
                TokenKind::Caret,
                TokenKind::Number(3.5),
            ]
        );
    }

    #[test]
    fn test_tokenize_leading_dot_number() {
        assert_eq!(kinds(".25*x"), vec![
            TokenKind::Number(0.25),
            TokenKind::Star,
            TokenKind::Identifier("x".to_string()),
        ]);
    }

    #[test]
    fn test_positions_are_character_offsets() {
        let tokens = Lexer::new("  a /b").tokenize().unwrap();
        let positions: Vec<_> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![2, 4, 5]);
    }

    #[test]
    fn test_invalid_number() {
        let err = Lexer::new("1.2.3").tokenize().unwrap_err();
        assert_eq!(
            err,
            ExpressionError::InvalidNumber {
                text: "1.2.3".to_string(),
                position: 0
            }
        );
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("a % b").tokenize().unwrap_err();
        assert_eq!(
            err,
            ExpressionError::UnexpectedCharacter { ch: '%', position: 2 }
        );
    }

    #[test]
    fn test_empty_input_has_no_tokens() {
        assert!(kinds("   ").is_empty());
    }
}
