//! # Raw Column Windows
//!
//! `RawBytes` is the zero-copy destination for blob-like columns. In
//! streaming mode the decoder stores a `Borrowed` window that points
//! straight into the cursor's row buffer; the window is invalidated the
//! moment the cursor advances or closes, which is why reading it is
//! `unsafe`. Single-row decoding never hands out `Borrowed`: the decoder
//! substitutes an owning conversion so the destination survives the
//! cursor (see the decode module).

use std::fmt;

/// A column's raw bytes: SQL NULL, a window into the cursor's current
/// row, or an owned copy.
#[derive(Default)]
pub enum RawBytes {
    /// The column was SQL NULL.
    #[default]
    Null,
    /// Points into the cursor's internal buffer for the current row.
    /// Invalid once the cursor advances or closes.
    Borrowed { ptr: *const u8, len: usize },
    /// An owned copy, produced by single-row decoding.
    Owned(Vec<u8>),
}

impl RawBytes {
    /// Captures a window over `bytes`. The caller keeps the backing
    /// buffer alive for as long as the window is read.
    pub fn borrowed(bytes: &[u8]) -> Self {
        RawBytes::Borrowed {
            ptr: bytes.as_ptr(),
            len: bytes.len(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawBytes::Null)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, RawBytes::Owned(_))
    }

    /// The window contents, or `None` for SQL NULL.
    ///
    /// # Safety
    ///
    /// For a `Borrowed` window the cursor that produced it must not have
    /// advanced or closed since, and its row buffer must still be live.
    pub unsafe fn bytes(&self) -> Option<&[u8]> {
        match self {
            RawBytes::Null => None,
            RawBytes::Borrowed { ptr, len } => {
                Some(unsafe { std::slice::from_raw_parts(*ptr, *len) })
            }
            RawBytes::Owned(v) => Some(v),
        }
    }

    /// Copies the window into an owned variant. NULL stays NULL.
    ///
    /// # Safety
    ///
    /// Same validity requirement as [`RawBytes::bytes`].
    pub unsafe fn to_owned_bytes(&self) -> RawBytes {
        match unsafe { self.bytes() } {
            None => RawBytes::Null,
            Some(b) => RawBytes::Owned(b.to_vec()),
        }
    }
}

impl fmt::Debug for RawBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawBytes::Null => write!(f, "RawBytes::Null"),
            RawBytes::Borrowed { len, .. } => write!(f, "RawBytes::Borrowed({} bytes)", len),
            RawBytes::Owned(v) => write!(f, "RawBytes::Owned({} bytes)", v.len()),
        }
    }
}
