//! # serde_jkr
//!
//! Reader and writer for `.jkr` save files: a Lua table literal wrapped in a
//! raw DEFLATE stream.
//!
//! ## What is jkr?
//!
//! A jkr file is what a Lua game writes when it persists a table: the text
//! `return {[key]=value,...}` compressed at the fastest DEFLATE level with no
//! zlib or gzip header. See [`format`] for the exact grammar.
//!
//! ## Key Features
//!
//! - **No interpreter**: files are read by a literal-only parser, so nothing
//!   in a save file is ever executed
//! - **Byte-exact strings**: string values are byte strings and survive a
//!   round trip even when they are not UTF-8
//! - **Cycle safe**: self-referencing tables are rejected with a key path
//!   instead of overflowing the stack
//! - **Object placeholders**: tables standing for live game objects are written
//!   as `"MANUAL_REPLACE"`
//! - **Serde interop**: build tables from Rust types with [`to_value`]
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_jkr::{from_slice, to_bytes, Table, Value};
//!
//! let game = Table::new();
//! game.insert("round", 3);
//! game.insert("won", false);
//!
//! let save = Table::new();
//! save.insert("GAME", game);
//! save.insert("VERSION", "1.0.1o");
//!
//! let bytes = to_bytes(&save).unwrap();
//! let back = from_slice(&bytes).unwrap();
//! assert_eq!(back, save);
//! assert_eq!(back.get("VERSION"), Some(Value::from("1.0.1o")));
//! ```
//!
//! ### Literal text
//!
//! The text layer is available on its own, without compression:
//!
//! ```rust
//! use serde_jkr::{from_str, table, to_string};
//!
//! let text = to_string(&table!({ "foo": "bar" })).unwrap();
//! assert_eq!(text, r#"return {["foo"]="bar",}"#);
//! assert_eq!(from_str(&text).unwrap(), table!({ "foo": "bar" }));
//! ```
//!
//! ### From Rust types
//!
//! ```rust
//! use serde::Serialize;
//! use serde_jkr::{to_bytes, to_value};
//!
//! #[derive(Serialize)]
//! struct Profile { name: String, career_wins: u32 }
//!
//! let value = to_value(&Profile { name: "P1".into(), career_wins: 7 }).unwrap();
//! let bytes = to_bytes(value.as_table().unwrap()).unwrap();
//! assert!(!bytes.is_empty());
//! ```
//!
//! ## Untrusted input
//!
//! Readers accept any DEFLATE level and never evaluate code, but a small file
//! can inflate to a large payload. Use [`from_slice_with_options`] with
//! [`DecodeOptions::with_max_decompressed_size`] for files from unknown
//! sources.
//!
//! ## Threading
//!
//! [`Table`] is a single-threaded shared handle (`Rc<RefCell<..>>`), so tables
//! are not `Send`. Every call is self-contained; independent calls on
//! different threads need no coordination.

pub mod de;
pub mod error;
pub mod format;
pub mod framing;
pub mod macros;
pub mod options;
pub mod ser;
pub mod table;
pub mod value;

pub use de::Parser;
pub use error::{Error, Result};
pub use options::DecodeOptions;
pub use ser::{to_value, Encoder, ValueSerializer};
pub use table::{Key, Table};
pub use value::{Function, Value};

use std::io;
use tracing::debug;

/// Encode a table to its literal text, without compression.
///
/// # Examples
///
/// ```rust
/// use serde_jkr::{to_string, Table};
///
/// let table = Table::new();
/// table.insert(1, 42);
/// assert_eq!(to_string(&table).unwrap(), "return {[1]=42,}");
/// ```
///
/// # Errors
///
/// Returns [`Error::CyclicReference`], [`Error::InvalidKeyType`] or
/// [`Error::UnsupportedValueType`] for the first entry that cannot be written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(table: &Table) -> Result<String> {
    let mut encoder = Encoder::new();
    if let Err(err) = encoder.encode(table) {
        debug!(error = %err, "failed to encode table");
        return Err(err);
    }
    Ok(encoder.into_inner())
}

/// Encode a table to jkr file bytes.
///
/// # Examples
///
/// ```rust
/// use serde_jkr::{to_bytes, Table};
///
/// let bytes = to_bytes(&Table::new()).unwrap();
/// assert!(!bytes.is_empty());
/// ```
///
/// # Errors
///
/// Returns the encoding errors of [`to_string`], or [`Error::Framing`] if
/// compression fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    to_writer(&mut bytes, table)?;
    Ok(bytes)
}

/// Encode a table as jkr file bytes into a writer.
///
/// The literal is built completely before anything is written, so an encoding
/// error leaves `writer` untouched.
///
/// # Examples
///
/// ```rust
/// use serde_jkr::{from_reader, table, to_writer};
/// use std::io::Cursor;
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &table!({ "seed": "ABCD1234" })).unwrap();
///
/// let back = from_reader(Cursor::new(buffer)).unwrap();
/// assert_eq!(back, table!({ "seed": "ABCD1234" }));
/// ```
///
/// # Errors
///
/// Returns the encoding errors of [`to_string`], or [`Error::Framing`] if
/// writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(writer: W, table: &Table) -> Result<()>
where
    W: io::Write,
{
    let literal = to_string(table)?;
    framing::compress(writer, literal.as_bytes()).map_err(|err| {
        debug!(error = %err, "failed to write jkr stream");
        err
    })?;
    Ok(())
}

/// Decode literal text, without decompression.
///
/// # Examples
///
/// ```rust
/// use serde_jkr::from_literal;
///
/// let table = from_literal(b"return {[\"name\"]=\"caf\\xc3\\xa9\",}").unwrap();
/// assert_eq!(table.get("name").unwrap().as_str(), Some("café"));
/// ```
///
/// # Errors
///
/// Returns [`Error::MalformedLiteral`] or [`Error::NotATable`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_literal(literal: &[u8]) -> Result<Table> {
    from_literal_with_options(literal, &DecodeOptions::default())
}

/// Decode literal text with custom limits.
///
/// # Errors
///
/// Returns [`Error::MalformedLiteral`] or [`Error::NotATable`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_literal_with_options(literal: &[u8], options: &DecodeOptions) -> Result<Table> {
    Parser::with_options(literal, options)
        .parse()
        .map_err(|err| {
            debug!(error = %err, "failed to decode table literal");
            err
        })
}

/// Decode literal text held in a string.
///
/// # Examples
///
/// ```rust
/// use serde_jkr::{from_str, Value};
///
/// let table = from_str("return {[1]=42,}").unwrap();
/// assert_eq!(table.get(1), Some(Value::Number(42.0)));
///
/// assert!(from_str(r#"return "foo""#).unwrap_err().is_not_a_table());
/// ```
///
/// # Errors
///
/// Returns [`Error::MalformedLiteral`] or [`Error::NotATable`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(s: &str) -> Result<Table> {
    from_literal(s.as_bytes())
}

/// Decode jkr file bytes.
///
/// # Examples
///
/// ```rust
/// use serde_jkr::{from_slice, table, to_bytes};
///
/// let bytes = to_bytes(&table!({ 1: 42 })).unwrap();
/// assert_eq!(from_slice(&bytes).unwrap(), table!({ 1: 42 }));
/// ```
///
/// # Errors
///
/// Returns [`Error::Framing`] for corrupt streams, otherwise the errors of
/// [`from_literal`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(bytes: &[u8]) -> Result<Table> {
    from_slice_with_options(bytes, &DecodeOptions::default())
}

/// Decode jkr file bytes with custom limits.
///
/// # Errors
///
/// Returns [`Error::Framing`] for corrupt or oversized streams, otherwise the
/// errors of [`from_literal`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice_with_options(bytes: &[u8], options: &DecodeOptions) -> Result<Table> {
    from_reader_with_options(bytes, options)
}

/// Decode a jkr stream from a reader.
///
/// The stream is read to its end before parsing starts.
///
/// # Errors
///
/// Returns [`Error::Framing`] if reading fails or the stream is corrupt,
/// otherwise the errors of [`from_literal`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(reader: R) -> Result<Table>
where
    R: io::Read,
{
    from_reader_with_options(reader, &DecodeOptions::default())
}

/// Decode a jkr stream from a reader with custom limits.
///
/// # Errors
///
/// Returns [`Error::Framing`] if reading fails, the stream is corrupt or it
/// inflates beyond [`DecodeOptions::max_decompressed_size`], otherwise the
/// errors of [`from_literal`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader_with_options<R>(reader: R, options: &DecodeOptions) -> Result<Table>
where
    R: io::Read,
{
    let literal =
        framing::decompress(reader, options.max_decompressed_size).map_err(|err| {
            debug!(error = %err, "failed to read jkr stream");
            err
        })?;
    from_literal_with_options(&literal, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    fn literal_of(bytes: &[u8]) -> String {
        let raw = framing::decompress(bytes, None).unwrap();
        String::from_utf8(raw).unwrap()
    }

    #[derive(Serialize)]
    struct Joker {
        name: String,
        cost: u32,
        edition: Option<String>,
    }

    #[derive(Serialize)]
    struct Run {
        seed: String,
        ante: u8,
        jokers: Vec<Joker>,
    }

    #[test]
    fn test_bytes_decompress_to_literal() {
        let table = Table::new();
        table.insert("foo", "bar");
        assert_eq!(literal_of(&to_bytes(&table).unwrap()), r#"return {["foo"]="bar",}"#);
    }

    #[test]
    fn test_round_trip_struct() {
        let run = Run {
            seed: "7LB2WVPK".to_string(),
            ante: 4,
            jokers: vec![
                Joker {
                    name: "Blueprint".to_string(),
                    cost: 10,
                    edition: Some("foil".to_string()),
                },
                Joker {
                    name: "Jimbo".to_string(),
                    cost: 2,
                    edition: None,
                },
            ],
        };

        let value = to_value(&run).unwrap();
        let table = value.as_table().unwrap();
        let back = from_slice(&to_bytes(table).unwrap()).unwrap();
        assert_eq!(&back, table);

        let jokers = back.get("jokers").unwrap();
        let second = jokers.as_table().unwrap().get(2).unwrap();
        let second = second.as_table().unwrap();
        assert_eq!(second.get("name"), Some(Value::from("Jimbo")));
        assert!(!second.contains_key("edition"));
    }

    #[test]
    fn test_encode_error_writes_nothing() {
        let table = Table::new();
        table.insert("self", table.clone());

        let mut buffer = Vec::new();
        let err = to_writer(&mut buffer, &table).unwrap_err();
        assert!(err.is_cyclic_reference());
        assert!(buffer.is_empty());

        // Break the cycle so the allocation is freed.
        table.remove("self");
    }

    #[test]
    fn test_decode_errors_by_layer() {
        assert!(from_slice(&[0xff, 0xff, 0xff]).unwrap_err().is_framing());

        let bytes = framing::compress(Vec::new(), b"return \"foo\"").unwrap();
        assert!(from_slice(&bytes).unwrap_err().is_not_a_table());

        let bytes = framing::compress(Vec::new(), b"return {[1]=}").unwrap();
        assert!(from_slice(&bytes).unwrap_err().is_malformed_literal());
    }

    #[test]
    fn test_options_apply_to_both_layers() {
        let bytes = to_bytes(&crate::table!({ "a": { "b": { "c": 1 } } })).unwrap();

        let shallow = DecodeOptions::new().with_max_depth(2);
        assert!(from_slice_with_options(&bytes, &shallow)
            .unwrap_err()
            .is_malformed_literal());

        let tiny = DecodeOptions::new().with_max_decompressed_size(8);
        assert!(from_slice_with_options(&bytes, &tiny).unwrap_err().is_framing());

        let roomy = DecodeOptions::new()
            .with_max_depth(3)
            .with_max_decompressed_size(1024);
        assert!(from_slice_with_options(&bytes, &roomy).is_ok());
    }
}
