//! jkr Format Description
//!
//! This module documents the on-disk format as implemented by this library
//! and holds the constants both directions share.
//!
//! # Overview
//!
//! A jkr file is a single raw DEFLATE stream (no zlib or gzip header). Its
//! payload is one Lua expression: the keyword `return` followed by a table
//! constructor.
//!
//! ```text
//! return {["GAME"]={["round"]=3,["won"]=false,},["VERSION"]="1.0.1o",}
//! ```
//!
//! Writers compress at level 1 (fastest). Readers accept any level.
//!
//! # Grammar
//!
//! ```text
//! Chunk     := ["return"] Table
//! Table     := "{" { Entry Sep } [ Entry ] "}"
//! Entry     := "[" Key "]" "=" Value
//! Sep       := "," | ";"
//! Key       := String | Number
//! Value     := Table | String | Boolean | Number
//! String    := '"' { Char | Escape } '"' | "'" { Char | Escape } "'"
//! Boolean   := "true" | "false"
//! Number    := ["-"] Digits ["." Digits] [("e"|"E") ["+"|"-"] Digits]
//! ```
//!
//! Whitespace (space, tab, newline, carriage return, vertical tab, form feed)
//! may appear between any two tokens. Nothing else is accepted: no
//! identifiers, function calls, operators, comments or `nil`.
//!
//! ## Entries
//!
//! | Form | Example |
//! |------|---------|
//! | String key | `["chips"]=10,` |
//! | Number key | `[1]="Joker",` |
//! | Nested table | `["hand"]={[1]="ace",},` |
//!
//! The writer always emits a separator after every entry, including the last.
//! Entry order is not significant.
//!
//! ## Numbers
//!
//! Whole numbers within the signed 64-bit range are written as plain integers
//! (`42`, `-7`, `0`). Other finite values use the shortest digits that read
//! back to the same `f64`, in exponent form when the decimal exponent is below
//! -4 or at least 6:
//!
//! | Value | Text |
//! |-------|------|
//! | `0.5` | `0.5` |
//! | `0.00001` | `1e-05` |
//! | `1234567.5` | `1.2345675e+06` |
//! | `1e19` | `1e+19` |
//! | `f64::INFINITY` | `1e999` |
//!
//! NaN has no literal form and is rejected.
//!
//! ## Strings
//!
//! Printable ASCII is written as-is except `"` and `\`. Everything else is
//! escaped, one escape per byte:
//!
//! | Byte | Escape |
//! |------|--------|
//! | `"` `\` | `\"` `\\` |
//! | 0x07 0x08 0x0C | `\a` `\b` `\f` |
//! | 0x0A 0x0D 0x09 0x0B | `\n` `\r` `\t` `\v` |
//! | any other byte outside 0x20..=0x7E | `\xHH` |
//!
//! Readers additionally accept `\'`, `\ddd` (decimal), `\z`, `\u{XXX}` and a
//! backslash followed by a line break, which covers what the game's own
//! serializer emits.
//!
//! ## Object placeholders
//!
//! A table whose `"is"` entry is a function stands for a live game object. It
//! is written as the string [`PLACEHOLDER`] and reads back as that string.

/// Keyword that prefixes the table literal.
pub const RETURN_KEYWORD: &str = "return";

/// Text written in place of an object table.
pub const PLACEHOLDER: &str = "MANUAL_REPLACE";

/// Key whose function value marks a table as an object.
pub const PLACEHOLDER_MARKER_KEY: &str = "is";

/// Default bound on table nesting accepted by the reader.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Text written for positive infinity; overflows to `inf` when read.
pub const INFINITY_LITERAL: &str = "1e999";
