/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::ast::Anchor;
use super::ast::Expr;
use super::ast::NodeTest;
use super::ast::Path;
use super::ast::Step;
use super::error::BadXPath;
use super::error::description;

const MAX_DEPTH: usize = 32;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    Pipe,
    Equals,
    Star,
    Dot,
    DotDot,
    At,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Name(String),
    Literal(String),
    Integer(usize),
}

macro_rules! whitespace {
    () => {
        b' ' | b'\t' | b'\r' | b'\n'
    };
}

fn is_name_byte(c: u8) -> bool {
    c >= 0x80 || c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'.' | b':')
}

fn literal(expression: &str, start: usize) -> Result<(String, usize), BadXPath> {
    let bytes = expression.as_bytes();
    let quote = bytes[start];
    let mut value = String::new();
    let mut back = start + 1;
    let mut pos = start + 1;
    loop {
        match bytes.get(pos) {
            None => return Err(BadXPath::new(start, description::UNTERMINATED_LITERAL)),
            Some(&c) if c == quote => {
                value.push_str(&expression[back..pos]);
                return Ok((value, pos + 1));
            }
            Some(b'\\') if matches!(bytes.get(pos + 1), Some(b'\'' | b'"')) => {
                value.push_str(&expression[back..pos]);
                back = pos + 1;
                pos += 2;
            }
            Some(_) => pos += 1,
        }
    }
}

fn integer(bytes: &[u8], start: usize) -> Result<(usize, usize), BadXPath> {
    let mut value: usize = 0;
    let mut pos = start;
    while let Some(&c) = bytes.get(pos) {
        if !c.is_ascii_digit() {
            break;
        }
        value = value
            .checked_mul(10)
            .and_then(|value| value.checked_add(usize::from(c - b'0')))
            .ok_or(BadXPath::new(start, description::INTEGER_TOO_BIG))?;
        pos += 1;
    }
    Ok((value, pos))
}

fn tokenize(expression: &str) -> Result<Vec<(usize, Token)>, BadXPath> {
    let bytes = expression.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let start = pos;
        let token = match bytes[pos] {
            whitespace!() => {
                pos += 1;
                continue;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos += 2;
                Token::DoubleSlash
            }
            b'.' if bytes.get(pos + 1) == Some(&b'.') => {
                pos += 2;
                Token::DotDot
            }
            b'\'' | b'"' => {
                let (value, end) = literal(expression, pos)?;
                pos = end;
                Token::Literal(value)
            }
            b'0'..=b'9' => {
                let (value, end) = integer(bytes, pos)?;
                pos = end;
                Token::Integer(value)
            }
            c => {
                pos += 1;
                match c {
                    b'/' => Token::Slash,
                    b'.' => Token::Dot,
                    b'|' => Token::Pipe,
                    b'=' => Token::Equals,
                    b'*' => Token::Star,
                    b'@' => Token::At,
                    b'[' => Token::OpenBracket,
                    b']' => Token::CloseBracket,
                    b'(' => Token::OpenParen,
                    b')' => Token::CloseParen,
                    _ if is_name_byte(c) => {
                        while pos < bytes.len() && is_name_byte(bytes[pos]) {
                            pos += 1;
                        }
                        Token::Name(expression[start..pos].to_string())
                    }
                    _ => return Err(BadXPath::new(start, description::UNEXPECTED_CHAR)),
                }
            }
        };
        tokens.push((start, token));
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    current: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|(_, token)| token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.current)
            .map_or(self.end, |(position, _)| *position)
    }

    fn error(&self, description: &'static str) -> BadXPath {
        BadXPath::new(self.position(), description)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).map(|(_, token)| token.clone());
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn at_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Name(_)
                    | Token::Star
                    | Token::Dot
                    | Token::DotDot
                    | Token::At
                    | Token::OpenParen
            )
        )
    }

    fn expr(&mut self) -> Result<Expr, BadXPath> {
        if self.depth == MAX_DEPTH {
            return Err(self.error(description::TOO_DEEP));
        }
        self.depth += 1;
        let result = self.union();
        self.depth -= 1;
        result
    }

    fn union(&mut self) -> Result<Expr, BadXPath> {
        let first = self.equality()?;
        if self.peek() != Some(&Token::Pipe) {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.eat(&Token::Pipe) {
            parts.push(self.equality()?);
        }
        Ok(Expr::Union(parts))
    }

    fn equality(&mut self) -> Result<Expr, BadXPath> {
        let left = self.operand()?;
        if self.eat(&Token::Equals) {
            let right = self.operand()?;
            return Ok(Expr::Equals(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn operand(&mut self) -> Result<Expr, BadXPath> {
        match self.peek() {
            Some(Token::Literal(_) | Token::Integer(_)) => match self.advance() {
                Some(Token::Literal(value)) => Ok(Expr::Literal(value)),
                Some(Token::Integer(value)) => Ok(Expr::Integer(value)),
                _ => Err(self.error(description::STEP_EXPECTED)),
            },
            _ => Ok(Expr::Path(self.path()?)),
        }
    }

    fn path(&mut self) -> Result<Path, BadXPath> {
        if self.eat(&Token::Slash) {
            let steps = if self.at_step() {
                self.relative(false)?
            } else {
                Vec::new()
            };
            return Ok(Path {
                anchor: Anchor::Root,
                steps,
            });
        }
        if self.eat(&Token::DoubleSlash) {
            return Ok(Path {
                anchor: Anchor::Subtree,
                steps: self.relative(true)?,
            });
        }
        Ok(Path {
            anchor: Anchor::Context,
            steps: self.relative(false)?,
        })
    }

    fn relative(&mut self, descendant: bool) -> Result<Vec<Step>, BadXPath> {
        let mut steps = vec![self.step(descendant)?];
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.step(false)?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(self.step(true)?);
            } else {
                return Ok(steps);
            }
        }
    }

    fn step(&mut self, descendant: bool) -> Result<Step, BadXPath> {
        let start = self.position();
        let test = match self.advance() {
            Some(Token::Name(name)) => NodeTest::Name(name),
            Some(Token::Star) => NodeTest::Any,
            Some(Token::Dot) => NodeTest::SelfNode,
            Some(Token::DotDot) => NodeTest::Parent,
            Some(Token::At) => match self.advance() {
                Some(Token::Name(name)) => NodeTest::Attribute(Some(name)),
                Some(Token::Star) => NodeTest::Attribute(None),
                _ => return Err(BadXPath::new(start, description::ATTRIBUTE_NAME_EXPECTED)),
            },
            Some(Token::OpenParen) => {
                let inner = self.expr()?;
                if !self.eat(&Token::CloseParen) {
                    return Err(self.error(description::GROUP_NOT_CLOSED));
                }
                NodeTest::Group(Box::new(inner))
            }
            _ => return Err(BadXPath::new(start, description::STEP_EXPECTED)),
        };

        let mut predicates = Vec::new();
        while self.eat(&Token::OpenBracket) {
            predicates.push(self.expr()?);
            if !self.eat(&Token::CloseBracket) {
                return Err(self.error(description::PREDICATE_NOT_CLOSED));
            }
        }
        Ok(Step {
            descendant,
            test,
            predicates,
        })
    }
}

/// Compiles an expression into its syntax tree.
pub(super) fn parse(expression: &str) -> Result<Expr, BadXPath> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(BadXPath::new(0, description::EMPTY));
    }
    let mut parser = Parser {
        tokens,
        current: 0,
        end: expression.len(),
        depth: 0,
    };
    let expr = parser.expr()?;
    if parser.peek().is_some() {
        return Err(parser.error(description::TRAILING_INPUT));
    }
    Ok(expr)
}
