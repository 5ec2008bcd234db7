//! # Cursor Abstraction
//!
//! The decoder never talks to a database driver directly; it consumes
//! this minimal row-iteration trait. A driver adapter positions itself
//! on rows and hands each column back as raw bytes (or a NULL marker)
//! through [`RawCell`] slots the decoder supplies.
//!
//! ## Window Validity
//!
//! Cells point into the cursor's internal row storage. A filled cell is
//! valid until the cursor next advances or closes; the decoder consumes
//! them within the same decode call, and only leaves longer-lived
//! borrows in destinations that opted into [`RawBytes`] windows.
//!
//! [`RawBytes`]: crate::types::RawBytes

use std::fmt;

/// One column cell of the current row: SQL NULL or a byte window into
/// the cursor's row buffer.
#[derive(Clone, Copy)]
pub struct RawCell {
    ptr: *const u8,
    len: usize,
}

impl RawCell {
    /// The NULL cell.
    pub const fn null() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
        }
    }

    /// Points the cell at `bytes`. The backing buffer must stay live and
    /// unmoved until the cursor advances or closes.
    pub fn set(&mut self, bytes: &[u8]) {
        self.ptr = bytes.as_ptr();
        self.len = bytes.len();
    }

    /// Resets the cell to NULL.
    pub fn clear(&mut self) {
        *self = Self::null();
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// The cell contents, or `None` for SQL NULL.
    ///
    /// # Safety
    ///
    /// The buffer the cell was `set` from must still be live, and the
    /// returned slice must not outlive it.
    pub unsafe fn bytes<'a>(&self) -> Option<&'a [u8]> {
        if self.ptr.is_null() {
            None
        } else {
            Some(unsafe { std::slice::from_raw_parts(self.ptr, self.len) })
        }
    }
}

impl Default for RawCell {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "RawCell::Null")
        } else {
            write!(f, "RawCell({} bytes)", self.len)
        }
    }
}

/// Minimal abstraction of a driver's row cursor.
///
/// Implementations wrap whatever the driver hands back. The decoder
/// calls `advance`/`close` only in single-row mode; streaming users
/// drive iteration themselves.
pub trait Cursor {
    /// Column names of the result set, in column order. Only consulted
    /// by name-matching decoders.
    fn columns(&mut self) -> eyre::Result<Vec<String>>;

    /// Moves to the next row. Returns false at the end of the result
    /// set (check [`Cursor::take_err`] to distinguish exhaustion from
    /// failure).
    fn advance(&mut self) -> bool;

    /// Takes the sticky error, if iteration failed.
    fn take_err(&mut self) -> Option<eyre::Report>;

    /// Fills `cells` with the current row's column bytes, setting NULL
    /// columns to the null cell. Implementations must fail when the
    /// row's actual column count differs from `cells.len()`; the windows
    /// written must stay valid until the next `advance` or `close`.
    fn scan_current_row(&mut self, cells: &mut [RawCell]) -> eyre::Result<()>;

    /// Releases the underlying result set. Called by single-row decoding;
    /// must be idempotent.
    fn close(&mut self) -> eyre::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_cell_round_trip() {
        let mut cell = RawCell::default();
        assert!(cell.is_null());
        assert_eq!(unsafe { cell.bytes() }, None);

        let buf = b"abc".to_vec();
        cell.set(&buf);
        assert!(!cell.is_null());
        assert_eq!(unsafe { cell.bytes() }, Some(&b"abc"[..]));

        cell.clear();
        assert!(cell.is_null());
    }

    #[test]
    fn empty_window_is_not_null() {
        let mut cell = RawCell::default();
        let buf: Vec<u8> = Vec::new();
        cell.set(&buf);
        assert!(!cell.is_null());
        assert_eq!(unsafe { cell.bytes() }, Some(&b""[..]));
    }
}
