//! Configuration options for reading jkr data.
//!
//! Writing has no options: the compression level and literal layout are part
//! of the format. Reading can be bounded for untrusted input.
//!
//! ## Examples
//!
//! ```rust
//! use serde_jkr::{from_slice_with_options, to_bytes, DecodeOptions, Table};
//!
//! let bytes = to_bytes(&Table::new()).unwrap();
//!
//! let options = DecodeOptions::new()
//!     .with_max_depth(64)
//!     .with_max_decompressed_size(16 * 1024 * 1024);
//! let table = from_slice_with_options(&bytes, &options).unwrap();
//! assert!(table.is_empty());
//! ```

use crate::format::DEFAULT_MAX_DEPTH;

/// Limits applied while decoding.
///
/// # Decompression bombs
///
/// A small DEFLATE stream can inflate to a very large payload. By default no
/// limit is imposed; set [`DecodeOptions::max_decompressed_size`] when the input
/// is not trusted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest table nesting accepted. The root table is depth 1.
    pub max_depth: usize,
    /// Largest inflated payload accepted, in bytes.
    pub max_decompressed_size: Option<u64>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            max_decompressed_size: None,
        }
    }
}

impl DecodeOptions {
    /// Creates default options (nesting bounded at 512, no size limit).
    ///
    /// ```rust
    /// use serde_jkr::DecodeOptions;
    ///
    /// let options = DecodeOptions::new();
    /// assert_eq!(options.max_depth, 512);
    /// assert_eq!(options.max_decompressed_size, None);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Rejects payloads that inflate beyond `limit` bytes.
    #[must_use]
    pub fn with_max_decompressed_size(mut self, limit: u64) -> Self {
        self.max_decompressed_size = Some(limit);
        self
    }
}
