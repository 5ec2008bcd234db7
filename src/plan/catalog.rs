//! # Plan Catalog
//!
//! Process-wide cache of decoding plans keyed by destination `TypeId`.
//! Reads dominate (one insert per shape for the life of the process), so
//! the hit path takes only the shared side of a `parking_lot::RwLock`.
//! There is no eviction.

use super::Plan;
use crate::shape::Destination;
use eyre::Result;
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::any::TypeId;
use std::sync::{Arc, LazyLock};

static PLANS: LazyLock<RwLock<HashMap<TypeId, Arc<Plan>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Returns the cached plan for `T`, building and publishing it on first
/// use. Concurrent first builds race benignly: analysis is deterministic,
/// the first insert wins, and every caller observes the same `Arc`.
pub(crate) fn cached<T: Destination>(build: impl FnOnce() -> Result<Plan>) -> Result<Arc<Plan>> {
    let id = TypeId::of::<T>();
    if let Some(plan) = PLANS.read().get(&id) {
        return Ok(Arc::clone(plan));
    }

    let plan = Arc::new(build()?);
    let mut map = PLANS.write();
    Ok(Arc::clone(map.entry(id).or_insert(plan)))
}
