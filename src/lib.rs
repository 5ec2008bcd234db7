//! # fastrow - Precompiled SQL Row Decoding
//!
//! fastrow turns the per-row type dispatch of naive row scanning into a
//! one-time analysis step. The shape of a destination struct is walked
//! once, flattened into a **decoding plan** (field offsets, pointer hops,
//! one converter function per column), and cached by type identity. Every
//! subsequent row costs base+offset address arithmetic, a null check, and
//! a direct call to the pre-selected converter.
//!
//! ## Quick Start
//!
//! ```ignore
//! use fastrow::{destination, Destinations, RowDecoder};
//!
//! destination! {
//!     #[derive(Default)]
//!     pub struct Book {
//!         pub title: String,
//!         pub year: u16,
//!         pub loans: Option<Box<Loans>>,
//!     }
//!
//!     #[derive(Default)]
//!     pub struct Loans {
//!         pub library_id: i8,
//!         pub loan_data: Vec<u8>,
//!     }
//! }
//!
//! let plan = fastrow::plan_of::<&mut Book>()?;
//! let mut decoder = RowDecoder::new(plan);
//!
//! let mut cursor = driver_cursor("SELECT title, year, library_id, loan_data FROM books");
//! while cursor.advance() {
//!     let mut book = Book { loans: Some(Box::default()), ..Book::default() };
//!     decoder.decode_row(&mut cursor, &mut book)?;
//!     shelve(book);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Entry points (scan_single, plan_of)     │
//! ├──────────────────────────────────────────┤
//! │  RowDecoder          │  name matching    │
//! ├──────────────────────────────────────────┤
//! │  Plan (leaves/edges) │  Plan catalog     │
//! ├──────────────────────────────────────────┤
//! │  Shape analyzer                          │
//! ├──────────────────────────────────────────┤
//! │  Shapes (Destination) │ Converters       │
//! ├──────────────────────────────────────────┤
//! │  Cursor trait (driver adapter, external) │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`shape`]: destination shape metadata and the `Destination` trait
//! - [`plan`]: decoding plans, the shape analyzer, the process-wide catalog
//! - [`convert`]: the byte-to-scalar converter family
//! - [`decode`]: the row decoder, name matching, one-shot helpers
//! - [`cursor`]: the minimal driver-cursor abstraction
//! - [`types`]: `Nullable`, `RawBytes`, `Timestamp`
//!
//! ## Concurrency
//!
//! Plans are immutable and shared (`Arc`); the catalog takes a read lock
//! on the hit path. A [`RowDecoder`] holds raw pointer scratch and is
//! intentionally not `Send`: build one decoder per concurrent scan and
//! share the plan between them.

#![warn(unsafe_op_in_unsafe_fn)]

#[macro_use]
mod macros;

pub mod convert;
pub mod cursor;
pub mod decode;
pub mod dest;
pub mod plan;
pub mod shape;
pub mod types;

pub use convert::ParseError;
pub use cursor::{Cursor, RawCell};
pub use decode::{
    is_no_rows, scan_single, scan_single_by_name, scan_single_by_name_from, scan_single_from,
    FieldErrors, NoRows, RowDecoder,
};
pub use dest::Destinations;
pub use plan::{Plan, MAX_NESTING_DEPTH};
pub use shape::{Destination, ScalarKind, Shape};
pub use types::{Nullable, RawBytes, Timestamp};

use eyre::Result;
use std::sync::Arc;

/// Builds (or fetches from the catalog) the decoding plan for a
/// destination set, e.g. `plan_of::<&mut Book>()` or
/// `plan_of::<(&mut Book, &mut u64)>()`.
pub fn plan_of<D: Destinations>() -> Result<Arc<Plan>> {
    D::plan()
}
