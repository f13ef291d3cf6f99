//! HTTP `Range` header parsing.
//!
//! Only a single `bytes=start-end` or `bytes=start-` range is supported. Both
//! bounds must fall inside `[0, size)`; anything else is unsatisfiable.

/// An inclusive byte range inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl ByteRange {
    /// Number of bytes covered. Never zero.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a file of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Why a `Range` header was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("malformed range header")]
    Malformed,
    #[error("range outside of {size} bytes")]
    Unsatisfiable { size: u64 },
}

/// Parse a `Range` header value against a file of `size` bytes.
///
/// ```
/// use clipvault::delivery::range::{parse_range, ByteRange};
///
/// assert_eq!(parse_range("bytes=0-99", 1000), Ok(ByteRange { start: 0, end: 99 }));
/// assert_eq!(parse_range("bytes=900-", 1000), Ok(ByteRange { start: 900, end: 999 }));
/// assert!(parse_range("bytes=1000-", 1000).is_err());
/// ```
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange, RangeError> {
    let ranges = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::Malformed)?;

    if ranges.contains(',') {
        return Err(RangeError::Malformed);
    }

    let (start, end) = ranges.split_once('-').ok_or(RangeError::Malformed)?;
    let start = start.trim();
    let end = end.trim();

    if start.is_empty() || !start.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed);
    }
    let start: u64 = start.parse().map_err(|_| RangeError::Malformed)?;

    let end = if end.is_empty() {
        if size == 0 {
            return Err(RangeError::Unsatisfiable { size });
        }
        size - 1
    } else {
        if !end.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RangeError::Malformed);
        }
        end.parse().map_err(|_| RangeError::Malformed)?
    };

    if start >= size || end >= size || start > end {
        return Err(RangeError::Unsatisfiable { size });
    }

    Ok(ByteRange { start, end })
}
