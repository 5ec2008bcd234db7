//! # Nullable Scalar Wrapper
//!
//! `Nullable<K>` represents a SQL-nullable column at the destination side.
//! It is a plain pair rather than an `Option` so that decoding can always
//! write a whole value in one store: a NULL column produces
//! `{ is_null: true, value: K::default() }`, a non-null column produces
//! `{ is_null: false, value: parsed }`.
//!
//! The `is_null` flag is authoritative. The zero held in `value` when the
//! column was NULL is a filler, not data.

use std::fmt;

/// A SQL-nullable scalar. `value` holds the kind's zero when `is_null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nullable<K> {
    pub is_null: bool,
    pub value: K,
}

impl<K> Nullable<K> {
    /// Wraps a non-null value.
    pub fn some(value: K) -> Self {
        Self {
            is_null: false,
            value,
        }
    }

    /// The NULL state, with `value` at the kind's zero.
    pub fn null() -> Self
    where
        K: Default,
    {
        Self {
            is_null: true,
            value: K::default(),
        }
    }

    /// Returns the value unless the column was NULL.
    pub fn get(&self) -> Option<&K> {
        if self.is_null {
            None
        } else {
            Some(&self.value)
        }
    }

    /// Consumes the wrapper, returning the value unless NULL.
    pub fn into_option(self) -> Option<K> {
        if self.is_null {
            None
        } else {
            Some(self.value)
        }
    }
}

impl<K: Default> From<Option<K>> for Nullable<K> {
    fn from(v: Option<K>) -> Self {
        match v {
            Some(value) => Self::some(value),
            None => Self::null(),
        }
    }
}

impl<K: fmt::Display> fmt::Display for Nullable<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null {
            write!(f, "NULL")
        } else {
            self.value.fmt(f)
        }
    }
}
