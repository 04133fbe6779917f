//! # Registry Module
//!
//! In-memory registries for the Lab/Pod/Device hierarchy.
//!
//! ## Components
//!
//! - `ids.rs`: [`IdentifierAllocator`], the shared source of opaque ids
//! - `lab.rs`: [`LabRegistry`], Lab metadata plus the namespace lifecycle
//! - `pod.rs`: [`PodRegistry`], Pods and Devices with per-Pod address tracking
//!
//! ## Lifecycle
//!
//! 1. `LabRegistry::create` allocates a Lab id and opens a Pod namespace
//! 2. Pods and Devices are created through the `PodRegistry`, which claims
//!    each Device's first-port address in the [`AddressTracker`](crate::ip::AddressTracker)
//! 3. `LabRegistry::delete` drops the namespace, releasing every address
//!
//! ## Locking
//!
//! Each registry guards its state with one `RwLock`. Lab-level operations
//! hold the labs lock while they call into the pod store, so a namespace is
//! never created or dropped in the middle of a Pod write.

pub mod ids;
pub mod lab;
pub mod pod;

use std::sync::Arc;

pub use ids::{IdKind, IdentifierAllocator};
pub use lab::LabRegistry;
pub use pod::PodRegistry;

/// Build an empty store. A seed makes every issued id reproducible.
pub fn in_memory(seed: Option<u64>) -> LabRegistry {
    let ids = match seed {
        Some(seed) => IdentifierAllocator::with_seed(seed),
        None => IdentifierAllocator::new(),
    };
    LabRegistry::new(Arc::new(PodRegistry::new(Arc::new(ids))))
}
