//! Table literal decoding.
//!
//! This module provides the [`Parser`], a single-pass recursive-descent parser
//! that turns literal text back into a [`Table`].
//!
//! ## Overview
//!
//! - **Literal only**: accepts tables, strings, booleans and numbers. Names,
//!   calls, operators and comments are rejected, so nothing in the input is
//!   ever evaluated
//! - **Byte oriented**: string contents are copied byte for byte and need not
//!   be UTF-8
//! - **Fail fast**: the first grammar violation ends the parse with
//!   [`Error::MalformedLiteral`], reporting byte offset, line and column
//! - **Bounded nesting**: tables deeper than
//!   [`DecodeOptions::max_depth`](crate::DecodeOptions) are rejected instead
//!   of exhausting the stack
//!
//! ## Usage
//!
//! ```rust
//! use serde_jkr::{from_str, Value};
//!
//! let table = from_str(r#"return {["foo"]="bar",[1]=42,}"#).unwrap();
//! assert_eq!(table.get("foo"), Some(Value::from("bar")));
//! assert_eq!(table.get(1), Some(Value::Number(42.0)));
//! ```

use crate::format::RETURN_KEYWORD;
use crate::table::Key;
use crate::{DecodeOptions, Error, Result, Table, Value};
use tracing::trace;

/// Bytes of context shown on each side of an error position.
const CONTEXT_RADIUS: usize = 40;

/// The literal parser.
///
/// Created via [`Parser::new`] or [`Parser::with_options`] and consumed by
/// [`Parser::parse`].
pub struct Parser<'a> {
    input: &'a [u8],
    position: usize,
    line: usize,
    column: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, &DecodeOptions::default())
    }

    #[must_use]
    pub fn with_options(input: &'a [u8], options: &DecodeOptions) -> Self {
        Parser {
            input,
            position: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    /// Parses the whole input as `[return] <table>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotATable`] if the expression is a string, number or
    /// boolean, and [`Error::MalformedLiteral`] for anything outside the
    /// grammar, including trailing content after the table.
    pub fn parse(mut self) -> Result<Table> {
        trace!(len = self.input.len(), "parsing table literal");

        self.skip_whitespace();
        self.skip_return_keyword();
        self.skip_whitespace();

        let start = self.position;
        let table = match self.parse_value()? {
            Value::Table(table) => table,
            other => return Err(Error::not_a_table(start, other.kind())),
        };

        self.skip_whitespace();
        if !self.at_end() {
            return Err(self.error("unexpected content after table"));
        }

        trace!(entries = table.len(), "parsed table literal");
        Ok(table)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.position + ahead).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.position += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if is_space(b)) {
            self.next_byte();
        }
    }

    fn skip_return_keyword(&mut self) {
        let keyword = RETURN_KEYWORD.as_bytes();
        if self.input[self.position..].starts_with(keyword)
            && !matches!(self.peek_at(keyword.len()), Some(b) if is_ident(b))
        {
            for _ in 0..keyword.len() {
                self.next_byte();
            }
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.next_byte();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", byte as char)))
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some(b'{') => self.parse_table().map(Value::Table),
            Some(b'"') | Some(b'\'') => self.parse_string().map(Value::String),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number().map(Value::Number),
            Some(b) if is_ident(b) => self.parse_bool().map(Value::Boolean),
            _ => Err(self.unexpected("a value")),
        }
    }

    fn parse_table(&mut self) -> Result<Table> {
        self.expect(b'{')?;
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.error(&format!(
                "tables nested deeper than {} levels",
                self.max_depth
            )));
        }

        let table = Table::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'}') => {
                    self.next_byte();
                    break;
                }
                Some(b'[') => {}
                _ => return Err(self.unexpected("'[' or '}'")),
            }

            let key = self.parse_key()?;
            self.skip_whitespace();
            self.expect(b'=')?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            table.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') | Some(b';') => {
                    self.next_byte();
                }
                Some(b'}') => {
                    self.next_byte();
                    break;
                }
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }

        self.depth -= 1;
        Ok(table)
    }

    fn parse_key(&mut self) -> Result<Key> {
        self.expect(b'[')?;
        self.skip_whitespace();
        let key = match self.peek() {
            Some(b'"') | Some(b'\'') => Key::String(self.parse_string()?),
            Some(b'-') | Some(b'0'..=b'9') => Key::Number(self.parse_number()?),
            _ => return Err(self.unexpected("a string or number key")),
        };
        self.skip_whitespace();
        self.expect(b']')?;
        Ok(key)
    }

    fn parse_bool(&mut self) -> Result<bool> {
        let start = self.position;
        let end = self.input[start..]
            .iter()
            .position(|&b| !is_ident(b))
            .map_or(self.input.len(), |len| start + len);

        let value = match &self.input[start..end] {
            b"true" => true,
            b"false" => false,
            word => {
                return Err(self.error(&format!(
                    "unexpected name '{}', expected a value",
                    String::from_utf8_lossy(word)
                )))
            }
        };
        for _ in start..end {
            self.next_byte();
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<f64> {
        let start = self.position;
        let (line, column) = (self.line, self.column);

        if self.peek() == Some(b'-') {
            self.next_byte();
        }
        self.digits()?;
        if self.peek() == Some(b'.') {
            self.next_byte();
            self.digits()?;
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.next_byte();
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.next_byte();
            }
            self.digits()?;
        }
        if matches!(self.peek(), Some(b) if is_ident(b) || b == b'.') {
            return Err(self.error("malformed number"));
        }

        // The accepted bytes are ASCII digits, signs, '.', 'e' and 'E'.
        let text = std::str::from_utf8(&self.input[start..self.position])
            .map_err(|_| self.error_at(start, line, column, "malformed number"))?;
        text.parse::<f64>()
            .map_err(|_| self.error_at(start, line, column, "malformed number"))
    }

    fn digits(&mut self) -> Result<()> {
        if !matches!(self.peek(), Some(b'0'..=b'9')) {
            return Err(self.unexpected("a digit"));
        }
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.next_byte();
        }
        Ok(())
    }

    fn parse_string(&mut self) -> Result<Vec<u8>> {
        let quote = match self.next_byte() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.unexpected("a string")),
        };

        let mut result = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(b'\n') | Some(b'\r') => {
                    return Err(self.error("unescaped line break in string"))
                }
                Some(b) if b == quote => {
                    self.next_byte();
                    return Ok(result);
                }
                Some(b'\\') => {
                    self.next_byte();
                    self.parse_escape(&mut result)?;
                }
                Some(b) => {
                    self.next_byte();
                    result.push(b);
                }
            }
        }
    }

    fn parse_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let Some(b) = self.peek() else {
            return Err(self.error("unterminated string"));
        };
        match b {
            b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v' | b'\\' | b'"' | b'\'' => {
                self.next_byte();
                out.push(match b {
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'v' => 0x0b,
                    other => other,
                });
            }
            b'\n' | b'\r' => {
                self.next_byte();
                // "\r\n" and "\n\r" count as one line break.
                if matches!(self.peek(), Some(next) if (next == b'\n' || next == b'\r') && next != b)
                {
                    self.next_byte();
                }
                out.push(b'\n');
            }
            b'x' => {
                self.next_byte();
                let hi = self.hex_digit()?;
                let lo = self.hex_digit()?;
                out.push((hi << 4) | lo);
            }
            b'z' => {
                self.next_byte();
                self.skip_whitespace();
            }
            b'0'..=b'9' => {
                let mut code: u32 = 0;
                let mut count = 0;
                while count < 3 {
                    match self.peek() {
                        Some(d @ b'0'..=b'9') => {
                            code = code * 10 + u32::from(d - b'0');
                            self.next_byte();
                            count += 1;
                        }
                        _ => break,
                    }
                }
                let byte = u8::try_from(code)
                    .map_err(|_| self.error("decimal escape too large"))?;
                out.push(byte);
            }
            b'u' => {
                self.next_byte();
                self.expect(b'{')?;
                let mut code: u32 = 0;
                let mut count = 0;
                while self.peek() != Some(b'}') {
                    let digit = self.hex_digit()?;
                    code = code
                        .checked_mul(16)
                        .map(|c| c + u32::from(digit))
                        .ok_or_else(|| self.error("unicode escape too large"))?;
                    count += 1;
                }
                if count == 0 {
                    return Err(self.unexpected("a hexadecimal digit"));
                }
                let ch = char::from_u32(code)
                    .ok_or_else(|| self.error("invalid unicode code point in escape"))?;
                self.next_byte();
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            other => {
                return Err(self.error(&format!(
                    "invalid escape sequence '\\{}'",
                    printable(other)
                )))
            }
        }
        Ok(())
    }

    fn hex_digit(&mut self) -> Result<u8> {
        let digit = match self.peek() {
            Some(b @ b'0'..=b'9') => b - b'0',
            Some(b @ b'a'..=b'f') => b - b'a' + 10,
            Some(b @ b'A'..=b'F') => b - b'A' + 10,
            _ => return Err(self.unexpected("a hexadecimal digit")),
        };
        self.next_byte();
        Ok(digit)
    }

    fn unexpected(&self, expected: &str) -> Error {
        match self.peek() {
            Some(b) => self.error(&format!(
                "unexpected '{}', expected {}",
                printable(b),
                expected
            )),
            None => self.error(&format!("unexpected end of input, expected {}", expected)),
        }
    }

    fn error(&self, msg: &str) -> Error {
        self.error_at(self.position, self.line, self.column, msg)
    }

    /// Builds an error with a window of the offending line and a caret.
    fn error_at(&self, offset: usize, line: usize, column: usize, msg: &str) -> Error {
        let offset = offset.min(self.input.len());
        let line_start = self.input[..offset]
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        let line_end = self.input[offset..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .map_or(self.input.len(), |i| offset + i);

        // Saves are usually one very long line, so show a window around the error.
        let window_start = line_start.max(offset.saturating_sub(CONTEXT_RADIUS));
        let window_end = line_end.min(offset + CONTEXT_RADIUS);
        let snippet: String = self.input[window_start..window_end]
            .iter()
            .map(|&b| if (0x20..0x7f).contains(&b) { b as char } else { '.' })
            .collect();
        let caret = format!("{}^", " ".repeat(offset - window_start));

        Error::malformed(offset, line, column, msg, &format!("{}\n{}", snippet, caret))
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn printable(b: u8) -> String {
    if (0x20..0x7f).contains(&b) {
        (b as char).to_string()
    } else {
        format!("\\x{:02x}", b)
    }
}
