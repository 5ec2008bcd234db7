//! # Row Decoding
//!
//! [`RowDecoder`] executes a plan against rows from a [`Cursor`]. One
//! decoder serves one user at a time (it holds raw pointer scratch and is
//! deliberately `!Send`); the plan behind it is freely shared.
//!
//! ## Modes
//!
//! - **Streaming** (`decode_row`): the cursor is already positioned on a
//!   row; the decoder neither advances nor closes. Raw-window leaves
//!   borrow straight from the cursor's row buffer.
//! - **Single row** (`decode_single`): advances once, decodes, always
//!   closes. An exhausted cursor reports [`NoRows`] (a pending cursor
//!   error takes precedence). Raw-window leaves get the owning converter
//!   substituted so nothing borrowed survives the closed cursor.
//!
//! The checked variants verify the destination types against the plan's
//! identity on every call; the `unsafe` `_unchecked` variants skip the
//! per-root type comparison for trusted hot paths (the count is always
//! verified).
//!
//! ## Error Aggregation
//!
//! Within one row the decoder does not short-circuit: every pointer and
//! conversion failure is collected in plan order as
//! `Error on <path>: <cause>` and returned as one [`FieldErrors`] value.
//! An indirection edge that fails suppresses the leaves behind it, so a
//! missing sub-record reports exactly one line.

mod named;

use crate::convert::{conv_nullable_raw_owned, conv_raw_owned, ConvFn};
use crate::cursor::{Cursor, RawCell};
use crate::dest::{Destinations, RootAddrs, RootIds};
use crate::plan::{Leaf, Plan};
use eyre::{bail, Result};
use std::fmt;
use std::sync::Arc;

/// Distinguished error from single-row decoding of an empty result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoRows;

impl fmt::Display for NoRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no rows in result set")
    }
}

impl std::error::Error for NoRows {}

/// Returns true when `err` is the [`NoRows`] sentinel.
pub fn is_no_rows(err: &eyre::Report) -> bool {
    err.downcast_ref::<NoRows>().is_some()
}

/// Aggregated per-field failures for one row, in plan order.
#[derive(Debug)]
pub struct FieldErrors {
    lines: Vec<String>,
}

impl FieldErrors {
    /// One `Error on <path>: <cause>` line per failed field.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

impl std::error::Error for FieldErrors {}

/// Executes one plan against rows. Not thread-safe; build one decoder
/// per concurrent scan and share the plan.
pub struct RowDecoder {
    plan: Arc<Plan>,
    cells: Box<[RawCell]>,
    slots: Box<[*mut u8]>,
    roots: RootAddrs,
    ids: RootIds,
    errs: Vec<String>,
    reset_cells: bool,
    named: Option<named::NamedState>,
}

impl RowDecoder {
    /// Positional decoder: column N feeds leaf N.
    pub fn new(plan: Arc<Plan>) -> Self {
        let cells = vec![RawCell::null(); plan.column_count()].into_boxed_slice();
        let slots = vec![std::ptr::null_mut(); plan.slot_count()].into_boxed_slice();
        Self {
            plan,
            cells,
            slots,
            roots: RootAddrs::new(),
            ids: RootIds::new(),
            errs: Vec::new(),
            reset_cells: true,
            named: None,
        }
    }

    /// Name-matching decoder: on the first row the cursor's column names
    /// are matched against leaf paths (full dotted path, else unique
    /// basename) and the leaf order is permuted to fit. Later rows must
    /// keep the first row's column order.
    pub fn new_by_name(plan: Arc<Plan>) -> Self {
        Self {
            named: Some(named::NamedState::default()),
            ..Self::new(plan)
        }
    }

    /// Controls the defensive clearing of column cells before each scan.
    /// On by default; drivers have been seen to misread cells that still
    /// hold the previous row's windows.
    pub fn with_cell_reset(mut self, reset: bool) -> Self {
        self.reset_cells = reset;
        self
    }

    pub fn plan(&self) -> &Arc<Plan> {
        &self.plan
    }

    /// Decodes the cursor's current row. The cursor must already be
    /// positioned; this neither advances nor closes it.
    pub fn decode_row<C: Cursor, D: Destinations>(
        &mut self,
        cursor: &mut C,
        dest: D,
    ) -> Result<()> {
        self.do_scan(cursor, dest, true, false)
    }

    /// [`RowDecoder::decode_row`] without the per-root type check, for
    /// trusted hot paths. The destination count is still verified.
    ///
    /// # Safety
    ///
    /// The destinations must be the types this decoder's plan was built
    /// for, in the same order; converters write through raw offsets and a
    /// mismatched type corrupts memory.
    pub unsafe fn decode_row_unchecked<C: Cursor, D: Destinations>(
        &mut self,
        cursor: &mut C,
        dest: D,
    ) -> Result<()> {
        self.do_scan(cursor, dest, false, false)
    }

    /// Advances once, decodes, and closes the cursor regardless of the
    /// outcome. Returns [`NoRows`] for an empty result set.
    pub fn decode_single<C: Cursor, D: Destinations>(
        &mut self,
        cursor: &mut C,
        dest: D,
    ) -> Result<()> {
        self.do_scan(cursor, dest, true, true)
    }

    /// [`RowDecoder::decode_single`] without the per-root type check.
    ///
    /// # Safety
    ///
    /// Same contract as [`RowDecoder::decode_row_unchecked`].
    pub unsafe fn decode_single_unchecked<C: Cursor, D: Destinations>(
        &mut self,
        cursor: &mut C,
        dest: D,
    ) -> Result<()> {
        self.do_scan(cursor, dest, false, true)
    }

    fn do_scan<C: Cursor, D: Destinations>(
        &mut self,
        cursor: &mut C,
        dest: D,
        check: bool,
        single: bool,
    ) -> Result<()> {
        let result = self.scan_inner(cursor, dest, check, single);
        if !single {
            return result;
        }
        match result {
            Ok(()) => cursor.close(),
            Err(err) => {
                let _ = cursor.close();
                Err(err)
            }
        }
    }

    fn scan_inner<C: Cursor, D: Destinations>(
        &mut self,
        cursor: &mut C,
        dest: D,
        check: bool,
        single: bool,
    ) -> Result<()> {
        self.bind(dest, check)?;

        if single && !cursor.advance() {
            if let Some(err) = cursor.take_err() {
                return Err(err);
            }
            return Err(NoRows.into());
        }

        if self.reset_cells {
            for cell in self.cells.iter_mut() {
                cell.clear();
            }
        }

        if self.named.is_some() {
            self.init_named(cursor)?;
        }

        cursor.scan_current_row(&mut self.cells)?;
        self.convert(single)
    }

    /// Captures the destination addresses and verifies them against the
    /// plan identity. The count is always checked; per-root types only
    /// in checked mode.
    fn bind<D: Destinations>(&mut self, dest: D, check: bool) -> Result<()> {
        self.ids.clear();
        D::push_roots(&mut self.ids);
        if self.ids.len() != self.plan.roots.len() {
            bail!(
                "destinations is incorrect length {}!={}",
                self.ids.len(),
                self.plan.roots.len()
            );
        }
        if check {
            for (i, ((id, name), root)) in
                self.ids.iter().zip(self.plan.roots.iter()).enumerate()
            {
                if *id != root.id {
                    bail!(
                        "destinations[{}] type is incorrect ({})!=({})",
                        i,
                        name,
                        root.name
                    );
                }
            }
        }

        self.roots.clear();
        dest.push_addrs(&mut self.roots);
        Ok(())
    }

    fn convert(&mut self, single: bool) -> Result<()> {
        self.errs.clear();

        self.slots[0] = if self.plan.simple {
            self.roots[0]
        } else {
            self.roots.as_mut_ptr() as *mut u8
        };
        for (i, edge) in self.plan.edges.iter().enumerate() {
            let parent = self.slots[edge.parent as usize];
            let mut next = std::ptr::null_mut();
            if !parent.is_null() {
                next = unsafe { *(parent.add(edge.offset) as *const *mut u8) };
                if next.is_null() {
                    self.errs
                        .push(format!("Error on {}: pointer not initialized", edge.path));
                }
            }
            self.slots[i + 1] = next;
        }

        let leaves: &[Leaf] = match &self.named {
            Some(state) => state.leaves.as_deref().unwrap_or(&self.plan.leaves),
            None => &self.plan.leaves,
        };

        for (i, leaf) in leaves.iter().enumerate() {
            // A null slot already produced its edge error.
            let base = self.slots[leaf.slot as usize];
            if base.is_null() {
                continue;
            }

            let mut dst = unsafe { base.add(leaf.offset) };
            if leaf.pointer {
                dst = unsafe { *(dst as *const *mut u8) };
                if dst.is_null() {
                    self.errs
                        .push(format!("Error on {}: pointer not initialized", leaf.path));
                    continue;
                }
            }

            // Borrowed windows must not outlive a single-row cursor.
            let convert: ConvFn = if single && leaf.raw {
                if leaf.nullable {
                    conv_nullable_raw_owned
                } else {
                    conv_raw_owned
                }
            } else {
                leaf.convert
            };

            let cell = unsafe { self.cells[i].bytes() };
            if let Err(err) = unsafe { convert(cell, dst) } {
                self.errs
                    .push(format!("Error on {}: {}", leaf.path, err));
            }
        }

        if self.errs.is_empty() {
            Ok(())
        } else {
            Err(FieldErrors {
                lines: std::mem::take(&mut self.errs),
            }
            .into())
        }
    }
}

/// One-shot single-row decode: builds (or fetches) the plan, scans one
/// row, closes the cursor. Plan-lookup failures still close the cursor.
/// For repeated scans build a [`RowDecoder`] instead; it skips the
/// catalog lookup and the per-call allocations.
pub fn scan_single<C: Cursor, D: Destinations>(cursor: &mut C, dest: D) -> Result<()> {
    let plan = match D::plan() {
        Ok(plan) => plan,
        Err(err) => {
            let _ = cursor.close();
            return Err(err);
        }
    };
    // The plan was just derived from D, so the types match by construction.
    unsafe { RowDecoder::new(plan).decode_single_unchecked(cursor, dest) }
}

/// One-shot single-row decode with first-row column-name matching.
pub fn scan_single_by_name<C: Cursor, D: Destinations>(cursor: &mut C, dest: D) -> Result<()> {
    let plan = match D::plan() {
        Ok(plan) => plan,
        Err(err) => {
            let _ = cursor.close();
            return Err(err);
        }
    };
    // The plan was just derived from D, so the types match by construction.
    unsafe { RowDecoder::new_by_name(plan).decode_single_unchecked(cursor, dest) }
}

/// Threads a failed query straight through: `Err` is returned as-is,
/// `Ok(cursor)` is scanned like [`scan_single`].
pub fn scan_single_from<C: Cursor, D: Destinations>(
    cursor: Result<C>,
    dest: D,
) -> Result<()> {
    match cursor {
        Ok(mut cursor) => scan_single(&mut cursor, dest),
        Err(err) => Err(err),
    }
}

/// [`scan_single_from`] with first-row column-name matching.
pub fn scan_single_by_name_from<C: Cursor, D: Destinations>(
    cursor: Result<C>,
    dest: D,
) -> Result<()> {
    match cursor {
        Ok(mut cursor) => scan_single_by_name(&mut cursor, dest),
        Err(err) => Err(err),
    }
}
