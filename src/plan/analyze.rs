//! # Shape Analysis
//!
//! Walks a destination's shape metadata and produces the flat decoding
//! plan: a counting pass first so the leaf and edge arrays are allocated
//! to exact size, then a filling pass that computes cumulative byte
//! offsets for by-value nesting, emits an indirection edge per pointed-to
//! record, and selects a converter per leaf.
//!
//! Unsupported fields (the only representable case is a pointer to a
//! pointer) are collected with their dotted path and reported together,
//! so a bad destination surfaces every offending member at once.

use super::catalog;
use super::{Edge, Leaf, Plan, Root, MAX_NESTING_DEPTH};
use crate::convert::converter_for;
use crate::shape::{Destination, FieldDef, RecordLayout, ScalarKind, Shape};
use eyre::{bail, Result};
use std::any::type_name;
use std::sync::Arc;

/// Plan for a single `&mut T` destination. Records get the simple plan
/// (slot 0 is the destination itself); bare scalars go through the same
/// pointer-table scheme as tuples so the decoder has one uniform shape.
pub(crate) fn single_plan<T: Destination>() -> Result<Arc<Plan>> {
    match T::shape() {
        Shape::Record(layout) => {
            catalog::cached::<T>(|| build_record_plan(layout, Root::of::<T>()))
        }
        Shape::Scalar { .. } => merge_plans(&[element_plan::<T>()?]),
        Shape::Pointer(_) => bail!("invalid scalar type {}", type_name::<T>()),
    }
}

/// Cached per-element plan used when merging tuple destinations.
pub(crate) fn element_plan<T: Destination>() -> Result<Arc<Plan>> {
    match T::shape() {
        Shape::Record(layout) => {
            catalog::cached::<T>(|| build_record_plan(layout, Root::of::<T>()))
        }
        Shape::Scalar { kind, nullable } => {
            catalog::cached::<T>(|| Ok(scalar_plan(kind, nullable, Root::of::<T>())))
        }
        Shape::Pointer(_) => bail!("invalid scalar type {}", type_name::<T>()),
    }
}

fn scalar_plan(kind: ScalarKind, nullable: bool, root: Root) -> Plan {
    let leaf = Leaf {
        slot: 0,
        offset: 0,
        convert: converter_for(kind, nullable),
        pointer: false,
        raw: matches!(kind, ScalarKind::Raw),
        nullable,
        path: root.name.into(),
    };
    Plan {
        leaves: Box::new([leaf]),
        edges: Box::new([]),
        roots: Box::new([root]),
        simple: false,
        scalar_root: true,
    }
}

fn build_record_plan(layout: &'static RecordLayout, root: Root) -> Result<Plan> {
    let mut leaf_count = 0;
    let mut edge_count = 0;
    count_fields(layout, 0, &mut leaf_count, &mut edge_count)?;

    let mut b = Builder {
        leaves: Vec::with_capacity(leaf_count),
        edges: Vec::with_capacity(edge_count),
        errs: Vec::new(),
    };
    b.walk(layout, 0, 0, "");

    if !b.errs.is_empty() {
        bail!("invalid types found for members:\n{}", b.errs.join("\n"));
    }
    debug_assert_eq!(b.leaves.len(), leaf_count);
    debug_assert_eq!(b.edges.len(), edge_count);

    Ok(Plan {
        leaves: b.leaves.into_boxed_slice(),
        edges: b.edges.into_boxed_slice(),
        roots: Box::new([root]),
        simple: true,
        scalar_root: false,
    })
}

/// Strips at most one pointer level off a field's shape.
fn resolve(field: &FieldDef) -> (Shape, bool) {
    match (field.shape)() {
        Shape::Pointer(inner) => (inner(), true),
        shape => (shape, false),
    }
}

fn count_fields(
    layout: &'static RecordLayout,
    depth: usize,
    leaves: &mut usize,
    edges: &mut usize,
) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        bail!(
            "nesting depth exceeded in {} (limit {})",
            layout.type_name,
            MAX_NESTING_DEPTH
        );
    }
    for field in layout.fields {
        match resolve(field) {
            (Shape::Record(sub), is_pointer) => {
                if is_pointer {
                    *edges += 1;
                }
                count_fields(sub, depth + 1, leaves, edges)?;
            }
            _ => *leaves += 1,
        }
    }
    Ok(())
}

struct Builder {
    leaves: Vec<Leaf>,
    edges: Vec<Edge>,
    errs: Vec<String>,
}

impl Builder {
    fn walk(&mut self, layout: &'static RecordLayout, base: usize, slot: u32, prefix: &str) {
        for field in layout.fields {
            let (shape, is_pointer) = resolve(field);
            match shape {
                Shape::Scalar { kind, nullable } => {
                    self.leaves.push(Leaf {
                        slot,
                        offset: base + field.offset,
                        convert: converter_for(kind, nullable),
                        pointer: is_pointer,
                        raw: matches!(kind, ScalarKind::Raw),
                        nullable,
                        path: format!("{}{}", prefix, field.name).into(),
                    });
                }
                Shape::Record(sub) => {
                    let path = format!("{}{}", prefix, field.name);
                    let child_prefix = format!("{}.", path);
                    if is_pointer {
                        self.edges.push(Edge {
                            parent: slot,
                            offset: base + field.offset,
                            path: path.into(),
                        });
                        let child_slot = self.edges.len() as u32;
                        self.walk(sub, 0, child_slot, &child_prefix);
                    } else {
                        self.walk(sub, base + field.offset, slot, &child_prefix);
                    }
                }
                // Only a pointer behind a pointer resolves to this.
                Shape::Pointer(_) => {
                    self.errs
                        .push(format!("{}{}: {}", prefix, field.name, field.type_name));
                }
            }
        }
    }
}

/// Builds the tuple-mode plan: a synthetic pointer table at slot 0 with
/// one `Param#i` edge per element, each element's slots shifted in after
/// it. Element order is preserved, so the merged leaf list is the
/// concatenation of the elements' columns.
pub(crate) fn merge_plans(elems: &[Arc<Plan>]) -> Result<Arc<Plan>> {
    if elems.is_empty() {
        bail!("at least 1 destination is required");
    }

    let ptr_size = std::mem::size_of::<*mut u8>();
    let mut edges = Vec::with_capacity(elems.iter().map(|p| p.edges.len() + 1).sum());
    let mut leaves = Vec::with_capacity(elems.iter().map(|p| p.leaves.len()).sum());
    let mut roots = Vec::with_capacity(elems.len());

    for (i, plan) in elems.iter().enumerate() {
        edges.push(Edge {
            parent: 0,
            offset: i * ptr_size,
            path: format!("Param#{}", i).into(),
        });
        let shift = edges.len() as u32;

        for leaf in plan.leaves.iter() {
            let mut leaf = leaf.clone();
            leaf.slot += shift;
            if plan.scalar_root {
                leaf.path = format!("Param#{}", i).into();
            }
            leaves.push(leaf);
        }
        for edge in plan.edges.iter() {
            let mut edge = edge.clone();
            edge.parent += shift;
            edges.push(edge);
        }
        roots.push(plan.roots[0]);
    }

    Ok(Arc::new(Plan {
        leaves: leaves.into_boxed_slice(),
        edges: edges.into_boxed_slice(),
        roots: roots.into_boxed_slice(),
        simple: false,
        scalar_root: false,
    }))
}
