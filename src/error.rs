//! Error types for jkr encoding and decoding.
//!
//! Every failure aborts the whole operation: there is no partial output on
//! encode and no partially-built table on decode.
//!
//! ## Error Categories
//!
//! - **Encode-time**: [`Error::CyclicReference`], [`Error::InvalidKeyType`],
//!   [`Error::UnsupportedValueType`]. Each carries the key path of the entry
//!   that failed, e.g. `["deck"]["cards"][3]`.
//! - **Decode-time**: [`Error::MalformedLiteral`] (with byte offset, line, column
//!   and the offending line) and [`Error::NotATable`].
//! - **Either direction**: [`Error::Framing`] for I/O failures and corrupt or
//!   oversized DEFLATE streams.
//!
//! ## Examples
//!
//! ```rust
//! use serde_jkr::from_str;
//!
//! let err = from_str("return {[1]=@,}").unwrap_err();
//! assert!(err.is_malformed_literal());
//! assert!(err.to_string().contains("line 1"));
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

/// Represents all possible errors that can occur while reading or writing jkr data.
#[derive(Debug, Error)]
pub enum Error {
    /// A table transitively contains itself.
    #[error("circular reference detected in table at {path}")]
    CyclicReference { path: String },

    /// A key is neither a string nor a (non-NaN) number.
    #[error("invalid key type {kind} at {path}: table keys must be strings or numbers")]
    InvalidKeyType { path: String, kind: &'static str },

    /// A value has a kind the format cannot represent.
    #[error("unsupported value type {kind} for key {path}")]
    UnsupportedValueType { path: String, kind: &'static str },

    /// The literal text violates the table grammar.
    #[error("malformed literal at line {line}, column {col} (offset {offset}): {msg}\n{context}")]
    MalformedLiteral {
        offset: usize,
        line: usize,
        col: usize,
        msg: String,
        context: String,
    },

    /// The top-level expression is a valid literal but not a table.
    #[error("expected a table at offset {offset}, found {found}")]
    NotATable { offset: usize, found: &'static str },

    /// The compressed stream could not be read or written.
    #[error("framing error: {0}")]
    Framing(#[from] io::Error),

    /// Custom error raised through serde.
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    pub fn cyclic_reference(path: &str) -> Self {
        Error::CyclicReference {
            path: path.to_string(),
        }
    }

    pub fn invalid_key_type(path: &str, kind: &'static str) -> Self {
        Error::InvalidKeyType {
            path: path.to_string(),
            kind,
        }
    }

    pub fn unsupported_value_type(path: &str, kind: &'static str) -> Self {
        Error::UnsupportedValueType {
            path: path.to_string(),
            kind,
        }
    }

    /// Creates a malformed-literal error with its source position.
    ///
    /// `context` is the excerpt of input shown under the message, usually the
    /// offending line with a caret under the error column.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_jkr::Error;
    ///
    /// let err = Error::malformed(7, 1, 8, "expected '='", "{[\"a\"] 1}\n       ^");
    /// assert!(err.to_string().contains("column 8"));
    /// assert_eq!(err.offset(), Some(7));
    /// ```
    pub fn malformed(offset: usize, line: usize, col: usize, msg: &str, context: &str) -> Self {
        Error::MalformedLiteral {
            offset,
            line,
            col,
            msg: msg.to_string(),
            context: context.to_string(),
        }
    }

    pub fn not_a_table(offset: usize, found: &'static str) -> Self {
        Error::NotATable { offset, found }
    }

    /// Creates a framing error that did not originate from an I/O call.
    pub fn framing(msg: &str) -> Self {
        Error::Framing(io::Error::new(io::ErrorKind::InvalidData, msg.to_string()))
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    #[must_use]
    pub fn is_cyclic_reference(&self) -> bool {
        matches!(self, Error::CyclicReference { .. })
    }

    #[must_use]
    pub fn is_invalid_key_type(&self) -> bool {
        matches!(self, Error::InvalidKeyType { .. })
    }

    #[must_use]
    pub fn is_unsupported_value_type(&self) -> bool {
        matches!(self, Error::UnsupportedValueType { .. })
    }

    #[must_use]
    pub fn is_malformed_literal(&self) -> bool {
        matches!(self, Error::MalformedLiteral { .. })
    }

    #[must_use]
    pub fn is_not_a_table(&self) -> bool {
        matches!(self, Error::NotATable { .. })
    }

    #[must_use]
    pub fn is_framing(&self) -> bool {
        matches!(self, Error::Framing(_))
    }

    /// Byte offset into the literal text for decode-time errors.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::MalformedLiteral { offset, .. } | Error::NotATable { offset, .. } => {
                Some(*offset)
            }
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
