//! Table literal encoding.
//!
//! This module provides the [`Encoder`], which turns a [`Table`] into the
//! literal text stored inside a jkr file, and [`ValueSerializer`], which builds
//! a [`Value`] from any `T: Serialize`.
//!
//! ## Overview
//!
//! The encoder walks the table depth-first and writes every entry as
//! `[key]=value,`:
//!
//! - **Cycle detection**: tables currently being written are tracked by
//!   identity; re-entering one fails with [`Error::CyclicReference`]
//! - **Object placeholders**: tables with a function under `"is"` are written
//!   as `"MANUAL_REPLACE"` without being entered
//! - **Type checks**: keys must be strings or numbers, values must be
//!   booleans, numbers, strings or tables
//!
//! The first error aborts the walk.
//!
//! ## Usage
//!
//! Most users should use the functions in the crate root:
//!
//! ```rust
//! use serde_jkr::{to_string, Table};
//!
//! let table = Table::new();
//! table.insert("foo", "bar");
//! assert_eq!(to_string(&table).unwrap(), r#"return {["foo"]="bar",}"#);
//! ```
//!
//! ## Direct Encoder Usage
//!
//! ```rust
//! use serde_jkr::{Encoder, Table};
//!
//! let table = Table::new();
//! table.insert(1, 42);
//!
//! let mut encoder = Encoder::new();
//! encoder.encode(&table).unwrap();
//! assert_eq!(encoder.into_inner(), "return {[1]=42,}");
//! ```

use crate::format::{INFINITY_LITERAL, PLACEHOLDER, RETURN_KEYWORD};
use crate::table::{Key, Table};
use crate::value::is_i64;
use crate::{Error, Result, Value};
use serde::{ser, Serialize};
use std::collections::HashSet;
use std::fmt::Write;

/// The literal encoder.
///
/// An `Encoder` is single-use: call [`Encoder::encode`] once, then take the
/// text with [`Encoder::into_inner`]. After an error the buffer holds a
/// partial literal and should be discarded.
pub struct Encoder {
    output: String,
    open: HashSet<usize>,
    path: Vec<String>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    #[must_use]
    pub fn new() -> Self {
        Encoder {
            output: String::with_capacity(256),
            open: HashSet::new(),
            path: Vec::new(),
        }
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.output
    }

    /// Writes `return ` followed by the literal for `table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicReference`], [`Error::InvalidKeyType`] or
    /// [`Error::UnsupportedValueType`] for the first offending entry.
    pub fn encode(&mut self, table: &Table) -> Result<()> {
        self.output.push_str(RETURN_KEYWORD);
        self.output.push(' ');
        self.write_table(table)
    }

    fn path_string(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.concat()
        }
    }

    fn write_table(&mut self, table: &Table) -> Result<()> {
        let id = table.id();
        if !self.open.insert(id) {
            return Err(Error::cyclic_reference(&self.path_string()));
        }

        self.output.push('{');
        let entries = table.borrow();
        for (key, value) in entries.iter() {
            let key_text = key_literal(key)
                .ok_or_else(|| Error::invalid_key_type(&self.path_string(), key_kind(key)))?;
            self.path.push(format!("[{}]", key_text));

            self.output.push('[');
            self.output.push_str(&key_text);
            self.output.push_str("]=");
            self.write_value(value)?;
            self.output.push(',');

            self.path.pop();
        }
        self.output.push('}');

        self.open.remove(&id);
        Ok(())
    }

    fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Table(t) if t.is_placeholder() => {
                self.output.push('"');
                self.output.push_str(PLACEHOLDER);
                self.output.push('"');
            }
            Value::Table(t) => self.write_table(t)?,
            Value::String(s) => write_quoted(&mut self.output, s),
            Value::Boolean(b) => self.output.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) if n.is_nan() => {
                return Err(Error::unsupported_value_type(&self.path_string(), "NaN"));
            }
            Value::Number(n) => write_number(&mut self.output, *n),
            Value::Nil | Value::Function(_) => {
                return Err(Error::unsupported_value_type(
                    &self.path_string(),
                    value.kind(),
                ));
            }
        }
        Ok(())
    }
}

fn key_literal(key: &Key) -> Option<String> {
    let mut text = String::new();
    match key {
        Key::String(s) => write_quoted(&mut text, s),
        Key::Number(n) if !n.is_nan() => write_number(&mut text, *n),
        _ => return None,
    }
    Some(text)
}

fn key_kind(key: &Key) -> &'static str {
    match key {
        Key::Number(_) => "NaN",
        other => other.kind(),
    }
}

/// Appends the number literal for `n`.
///
/// Callers reject NaN first; it has no literal form.
pub(crate) fn write_number(out: &mut String, n: f64) {
    if n.is_infinite() {
        if n < 0.0 {
            out.push('-');
        }
        out.push_str(INFINITY_LITERAL);
        return;
    }
    if is_i64(n) {
        let _ = write!(out, "{}", n as i64);
        return;
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345675e6`.
    let scientific = format!("{:e}", n);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        let _ = write!(out, "{}e{}{:02}", mantissa, sign, exponent.abs());
    } else {
        let _ = write!(out, "{}", n);
    }
}

/// Appends `bytes` as a double-quoted literal.
pub(crate) fn write_quoted(out: &mut String, bytes: &[u8]) {
    out.push('"');
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            0x07 => out.push_str("\\a"),
            0x08 => out.push_str("\\b"),
            0x0c => out.push_str("\\f"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x0b => out.push_str("\\v"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", b);
            }
        }
    }
    out.push('"');
}

/// Serializer that produces a [`Value`] from any `T: Serialize`.
///
/// Structs and maps become tables; sequences and tuples become tables keyed
/// `1..=n`; `None` and `()` become [`Value::Nil`]. Nil entries are left out of
/// the table, mirroring how the runtime treats assignment of `nil`. Enum
/// variants with data become single-entry tables keyed by the variant name.
///
/// ```rust
/// use serde::Serialize;
/// use serde_jkr::{to_value, Value};
///
/// #[derive(Serialize)]
/// struct Card { rank: u8, suit: &'static str, edition: Option<String> }
///
/// let value = to_value(&Card { rank: 12, suit: "Hearts", edition: None }).unwrap();
/// let table = value.as_table().unwrap();
/// assert_eq!(table.get("rank"), Some(Value::Number(12.0)));
/// assert!(!table.contains_key("edition"));
/// ```
pub struct ValueSerializer;

pub struct SerializeSeq {
    table: Table,
    index: usize,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    table: Table,
    current_key: Option<Key>,
    variant: Option<&'static str>,
}

fn wrap_variant(variant: Option<&'static str>, table: Table) -> Value {
    match variant {
        Some(name) => {
            let outer = Table::with_capacity(1);
            outer.insert(name, table);
            Value::Table(outer)
        }
        None => Value::Table(table),
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeSeq;
    type SerializeTuple = SerializeSeq;
    type SerializeTupleStruct = SerializeSeq;
    type SerializeTupleVariant = SerializeSeq;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::from(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::String(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Nil)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Nil)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Nil)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::from(variant))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let table = Table::with_capacity(1);
        let inner = to_value(value)?;
        if !inner.is_nil() {
            table.insert(variant, inner);
        }
        Ok(Value::Table(table))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeSeq> {
        Ok(SerializeSeq::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeSeq> {
        Ok(SerializeSeq::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeSeq> {
        Ok(SerializeSeq::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeSeq> {
        Ok(SerializeSeq::new(len, Some(variant)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len.unwrap_or(0), None))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len, Some(variant)))
    }
}

impl SerializeSeq {
    fn new(len: usize, variant: Option<&'static str>) -> Self {
        SerializeSeq {
            table: Table::with_capacity(len),
            index: 1,
            variant,
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = to_value(value)?;
        if !value.is_nil() {
            self.table.insert(self.index, value);
        }
        self.index += 1;
        Ok(())
    }
}

impl SerializeMap {
    fn new(len: usize, variant: Option<&'static str>) -> Self {
        SerializeMap {
            table: Table::with_capacity(len),
            current_key: None,
            variant,
        }
    }

    fn field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = to_value(value)?;
        if !value.is_nil() {
            self.table.insert(key, value);
        }
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeSeq {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(wrap_variant(self.variant, self.table))
    }
}

impl ser::SerializeTuple for SerializeSeq {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(wrap_variant(self.variant, self.table))
    }
}

impl ser::SerializeTupleStruct for SerializeSeq {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(wrap_variant(self.variant, self.table))
    }
}

impl ser::SerializeTupleVariant for SerializeSeq {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(wrap_variant(self.variant, self.table))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = Key::try_from(to_value(key)?)?;
        self.current_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        let value = to_value(value)?;
        if !value.is_nil() {
            self.table.insert(key, value);
        }
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(wrap_variant(self.variant, self.table))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(wrap_variant(self.variant, self.table))
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(wrap_variant(self.variant, self.table))
    }
}

/// Converts any `T: Serialize` into a [`Value`].
///
/// # Errors
///
/// Returns an error if a map key serializes to nil.
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}
