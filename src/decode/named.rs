//! # Column-Name Matching
//!
//! Optional overlay for decoders whose query column order does not match
//! the destination's field order. Matching runs once, against the first
//! row's column names; the result is a reordered private copy of the
//! plan's leaf list. The plan itself is never touched.
//!
//! A column matches a leaf by full dotted path first, else by basename
//! (rightmost path segment) when exactly one unused leaf carries it.
//! Top-level scalar elements answer to their `Param#i` name.

use super::RowDecoder;
use crate::cursor::Cursor;
use crate::plan::{Leaf, Plan};
use eyre::{bail, Result};

#[derive(Default)]
pub(crate) struct NamedState {
    /// Reordered leaves, present once the first row has been matched.
    pub(crate) leaves: Option<Box<[Leaf]>>,
    /// A failed match latches; later rows keep reporting it.
    pub(crate) failed: bool,
}

impl RowDecoder {
    pub(crate) fn init_named<C: Cursor>(&mut self, cursor: &mut C) -> Result<()> {
        let Some(state) = self.named.as_mut() else {
            return Ok(());
        };
        if state.failed {
            bail!("column name matching previously failed for this decoder");
        }
        if state.leaves.is_some() {
            return Ok(());
        }

        let names = match cursor.columns() {
            Ok(names) => names,
            Err(err) => {
                state.failed = true;
                return Err(err);
            }
        };
        match match_columns(&self.plan, &names) {
            Ok(leaves) => {
                state.leaves = Some(leaves);
                Ok(())
            }
            Err(err) => {
                state.failed = true;
                Err(err)
            }
        }
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

fn match_columns(plan: &Plan, names: &[String]) -> Result<Box<[Leaf]>> {
    let leaves = &plan.leaves;
    if names.len() != leaves.len() {
        bail!(
            "number of columns in row ({}) does not match number of expected fields ({})",
            names.len(),
            leaves.len()
        );
    }

    let mut used = vec![false; leaves.len()];
    let mut order = vec![0usize; leaves.len()];

    'cols: for (col_idx, name) in names.iter().enumerate() {
        let mut partial = 0usize;
        let mut partial_count = 0usize;
        for (leaf_idx, leaf) in leaves.iter().enumerate() {
            if used[leaf_idx] {
                continue;
            }
            if &*leaf.path == name.as_str() {
                used[leaf_idx] = true;
                order[col_idx] = leaf_idx;
                continue 'cols;
            }
            if basename(&leaf.path) == name.as_str() {
                partial = leaf_idx;
                partial_count += 1;
            }
        }
        if partial_count != 1 {
            bail!("{} matches found for column \"{}\"", partial_count, name);
        }
        used[partial] = true;
        order[col_idx] = partial;
    }

    Ok(order.into_iter().map(|i| leaves[i].clone()).collect())
}
