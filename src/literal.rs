//! Restricted parser for Python-style literal expressions.
//!
//! Function-backed datasets carry their data as a literal expression in
//! metadata rather than a plain value. Only numbers, strings, booleans,
//! `None`, lists, tuples, and dicts are accepted; identifiers, calls, and
//! operators are rejected, so no evaluation surface exists. JSON spellings
//! (`true`, `false`, `null`) are accepted as well since stringified metadata
//! round-trips through JSON.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

#[derive(Debug, Error)]
#[error("invalid literal at offset {pos}: {message}")]
pub struct LiteralError {
    pub pos: usize,
    pub message: String,
}

/// Parse a complete literal expression; trailing input is an error.
pub fn parse_literal(input: &str) -> Result<Literal, LiteralError> {
    let chars: Vec<char> = input.chars().collect();
    let mut parser = Parser { chars, pos: 0 };
    parser.skip_whitespace();
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos != parser.chars.len() {
        return Err(parser.fail("trailing input after literal"));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn fail(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            pos: self.pos,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(self.fail(format!("expected '{expected}', found '{ch}'"))),
            None => Err(self.fail(format!("expected '{expected}', found end of input"))),
        }
    }

    fn parse_value(&mut self) -> Result<Literal, LiteralError> {
        match self.peek() {
            Some('[') => self.parse_sequence('[', ']'),
            Some('(') => self.parse_sequence('(', ')'),
            Some('{') => self.parse_dict(),
            Some('"') | Some('\'') => self.parse_string().map(Literal::Str),
            Some(ch) if ch.is_ascii_digit() || ch == '-' || ch == '+' || ch == '.' => {
                self.parse_number()
            }
            Some(ch) if ch.is_alphabetic() => self.parse_keyword(),
            Some(ch) => Err(self.fail(format!("unexpected character '{ch}'"))),
            None => Err(self.fail("unexpected end of input")),
        }
    }

    fn parse_keyword(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_alphanumeric() || ch == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" | "true" => Ok(Literal::Bool(true)),
            "False" | "false" => Ok(Literal::Bool(false)),
            "None" | "null" => Ok(Literal::None),
            _ => Err(LiteralError {
                pos: start,
                message: format!("bare identifier '{word}' is not a literal"),
            }),
        }
    }

    fn parse_number(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        while matches!(
            self.peek(),
            Some(ch) if ch.is_ascii_digit() || ch == '.' || ch == '_'
        ) {
            self.pos += 1;
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.pos += 1;
            if matches!(self.peek(), Some('-') | Some('+')) {
                self.pos += 1;
            }
            while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        // Underscores are digit separators: each must sit between two digits.
        let bytes = raw.as_bytes();
        for (idx, byte) in bytes.iter().enumerate() {
            if *byte != b'_' {
                continue;
            }
            let prev_is_digit = idx > 0 && bytes[idx - 1].is_ascii_digit();
            let next_is_digit = bytes.get(idx + 1).is_some_and(|b| b.is_ascii_digit());
            if !prev_is_digit || !next_is_digit {
                return Err(LiteralError {
                    pos: start + idx,
                    message: "underscore must separate digits".to_string(),
                });
            }
        }
        let text: String = raw.chars().filter(|ch| *ch != '_').collect();
        text.parse::<f64>()
            .map(Literal::Number)
            .map_err(|_| LiteralError {
                pos: start,
                message: format!("invalid number '{text}'"),
            })
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or_else(|| self.fail("expected string"))?;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some(ch) if ch == quote => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('\\') => text.push('\\'),
                    Some('\'') => text.push('\''),
                    Some('"') => text.push('"'),
                    Some(other) => {
                        return Err(self.fail(format!("unsupported escape '\\{other}'")))
                    }
                    None => return Err(self.fail("unterminated escape")),
                },
                Some(ch) => text.push(ch),
                None => return Err(self.fail("unterminated string")),
            }
        }
    }

    fn parse_sequence(&mut self, open: char, close: char) -> Result<Literal, LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Literal::List(items));
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some(ch) if ch == close => {}
                _ => return Err(self.fail(format!("expected ',' or '{close}'"))),
            }
        }
    }

    fn parse_dict(&mut self) -> Result<Literal, LiteralError> {
        self.expect('{')?;
        let mut entries = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Literal::Dict(entries));
            }
            let key = self.parse_value()?;
            self.skip_whitespace();
            self.expect(':')?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            entries.push((key, value));
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some('}') => {}
                _ => return Err(self.fail("expected ',' or '}'")),
            }
        }
    }
}
