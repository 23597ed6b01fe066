//! Arithmetic expression evaluator backing the `calculate` skill.
//!
//! Decimal arithmetic, so `0.1 + 0.2` is exactly `0.3`. Supports `+ - * / %`,
//! integer powers (`^` or `**`), unary signs and parentheses. Nothing else is
//! evaluated; there is no variable or function lookup.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

const MAX_EXPONENT: i64 = 1_000;

/// Nesting limit for parentheses, unary signs and power chains
const MAX_DEPTH: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbalanced parentheses")]
    Unbalanced,

    #[error("division by zero")]
    DivisionByZero,

    #[error("exponent must be an integer between -{MAX_EXPONENT} and {MAX_EXPONENT}")]
    BadExponent,

    #[error("numeric overflow")]
    Overflow,

    #[error("expression nested deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(Decimal),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &input[start..end];
                let value = Decimal::from_str(text).map_err(|_| ExprError::InvalidNumber(text.into()))?;
                tokens.push(Token::Num(value));
            }
            '*' => {
                chars.next();
                // Python-style `**` is a power
                if chars.peek().is_some_and(|&(_, n)| n == '*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '^' => Token::Caret,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => return Err(ExprError::UnexpectedChar(other)),
                };
                chars.next();
                tokens.push(token);
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn nested(&mut self, rule: fn(&mut Self) -> Result<Decimal, ExprError>) -> Result<Decimal, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        self.depth += 1;
        let value = rule(self);
        self.depth -= 1;
        value
    }

    fn expr(&mut self) -> Result<Decimal, ExprError> {
        let mut acc = self.term()?;
        while let Some(op) = self.peek() {
            let op = op.clone();
            if !matches!(op, Token::Plus | Token::Minus) {
                break;
            }
            self.pos += 1;
            let rhs = self.term()?;
            acc = match op {
                Token::Plus => acc.checked_add(rhs),
                _ => acc.checked_sub(rhs),
            }
            .ok_or(ExprError::Overflow)?;
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Decimal, ExprError> {
        let mut acc = self.power()?;
        while let Some(op) = self.peek() {
            let op = op.clone();
            if !matches!(op, Token::Star | Token::Slash | Token::Percent) {
                break;
            }
            self.pos += 1;
            let rhs = self.power()?;
            acc = match op {
                Token::Star => acc.checked_mul(rhs).ok_or(ExprError::Overflow)?,
                _ if rhs.is_zero() => return Err(ExprError::DivisionByZero),
                Token::Slash => acc.checked_div(rhs).ok_or(ExprError::Overflow)?,
                _ => acc.checked_rem(rhs).ok_or(ExprError::Overflow)?,
            };
        }
        Ok(acc)
    }

    // Right-associative: 2^3^2 == 2^9
    fn power(&mut self) -> Result<Decimal, ExprError> {
        let base = self.unary()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let exponent = self.nested(Self::power)?;
            return pow(base, exponent);
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<Decimal, ExprError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.nested(Self::unary)?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Decimal, ExprError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let inner = self.nested(Self::expr)?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExprError::Unbalanced),
                }
            }
            Some(Token::RParen) => Err(ExprError::Unbalanced),
            Some(_) | None => Err(ExprError::UnexpectedEnd),
        }
    }
}

fn pow(base: Decimal, exponent: Decimal) -> Result<Decimal, ExprError> {
    if !exponent.fract().is_zero() {
        return Err(ExprError::BadExponent);
    }
    let exp = exponent
        .to_i64()
        .filter(|e| (-MAX_EXPONENT..=MAX_EXPONENT).contains(e))
        .ok_or(ExprError::BadExponent)?;

    let mut acc = Decimal::ONE;
    for _ in 0..exp.unsigned_abs() {
        acc = acc.checked_mul(base).ok_or(ExprError::Overflow)?;
    }

    if exp < 0 {
        if acc.is_zero() {
            return Err(ExprError::DivisionByZero);
        }
        acc = Decimal::ONE.checked_div(acc).ok_or(ExprError::Overflow)?;
    }
    Ok(acc)
}

/// Evaluate `input` and return the normalized result
pub fn evaluate(input: &str) -> Result<Decimal, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExprError::UnexpectedEnd);
    }

    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let value = parser.expr()?;

    match parser.peek() {
        None => Ok(value.normalize()),
        Some(Token::RParen) => Err(ExprError::Unbalanced),
        Some(_) => Err(ExprError::UnexpectedEnd),
    }
}
