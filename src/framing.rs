//! Raw DEFLATE framing around the literal text.
//!
//! jkr files carry no zlib or gzip header and no checksum: the file is the
//! bare DEFLATE stream. Writing always uses the fastest compression level;
//! reading accepts streams produced at any level.
//!
//! ```rust
//! use serde_jkr::framing::{compress, decompress};
//!
//! let packed = compress(Vec::new(), b"return {}").unwrap();
//! assert_eq!(decompress(packed.as_slice(), None).unwrap(), b"return {}");
//! ```

use crate::{Error, Result};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tracing::debug;

/// Compresses `literal` into `writer` and returns the writer once the stream
/// is finished.
///
/// # Errors
///
/// Returns [`Error::Framing`] if writing to `writer` fails.
pub fn compress<W: Write>(writer: W, literal: &[u8]) -> Result<W> {
    let mut encoder = DeflateEncoder::new(writer, Compression::fast());
    encoder.write_all(literal)?;
    let writer = encoder.finish()?;
    debug!(literal_len = literal.len(), "compressed table literal");
    Ok(writer)
}

/// Inflates a whole raw DEFLATE stream from `reader`.
///
/// With `limit` set, a payload larger than `limit` bytes is rejected without
/// being fully inflated.
///
/// # Errors
///
/// Returns [`Error::Framing`] if the stream is corrupt, reading fails, or
/// the payload exceeds `limit`.
pub fn decompress<R: Read>(reader: R, limit: Option<u64>) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(reader);
    let mut payload = Vec::new();

    match limit {
        Some(limit) => {
            decoder
                .by_ref()
                .take(limit.saturating_add(1))
                .read_to_end(&mut payload)?;
            if payload.len() as u64 > limit {
                debug!(limit, "decompressed payload over limit");
                return Err(Error::framing(&format!(
                    "decompressed payload exceeds {} bytes",
                    limit
                )));
            }
        }
        None => {
            decoder.read_to_end(&mut payload)?;
        }
    }

    debug!(
        compressed_len = decoder.total_in(),
        payload_len = payload.len(),
        "decompressed table literal"
    );
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;

    #[test]
    fn test_round_trip() {
        let literal = br#"return {["a"]=1,}"#;
        let packed = compress(Vec::new(), literal).unwrap();
        assert_ne!(packed.as_slice(), &literal[..]);
        assert_eq!(decompress(packed.as_slice(), None).unwrap(), literal);
    }

    #[test]
    fn test_empty_payload() {
        let packed = compress(Vec::new(), b"").unwrap();
        assert!(!packed.is_empty());
        assert!(decompress(packed.as_slice(), None).unwrap().is_empty());
    }

    #[test]
    fn test_reads_any_level() {
        let literal = "return {[1]=\"x\",}".repeat(20);
        for level in [Compression::none(), Compression::default(), Compression::best()] {
            let mut encoder = DeflateEncoder::new(Vec::new(), level);
            encoder.write_all(literal.as_bytes()).unwrap();
            let packed = encoder.finish().unwrap();
            assert_eq!(decompress(packed.as_slice(), None).unwrap(), literal.as_bytes());
        }
    }

    #[test]
    fn test_rejects_corrupt_stream() {
        // 0xff sets block type 3, which is reserved.
        let err = decompress(&[0xffu8, 0xff, 0xff][..], None).unwrap_err();
        assert!(err.is_framing());
    }

    #[test]
    fn test_rejects_zlib_header_stream() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(b"return {}").unwrap();
        let packed = encoder.finish().unwrap();
        // A zlib header does not decode as a raw stream to the same payload.
        match decompress(packed.as_slice(), None) {
            Ok(payload) => assert_ne!(payload, b"return {}"),
            Err(err) => assert!(err.is_framing()),
        }
    }

    #[test]
    fn test_limit() {
        let literal = vec![b'x'; 4096];
        let packed = compress(Vec::new(), &literal).unwrap();

        assert_eq!(decompress(packed.as_slice(), Some(4096)).unwrap().len(), 4096);

        let err = decompress(packed.as_slice(), Some(4095)).unwrap_err();
        assert!(err.is_framing());
        assert!(err.to_string().contains("exceeds 4095 bytes"));
    }
}
