//! Identifier allocation for Labs, Pods and Devices.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::inventory::{DeviceId, LabId, PodId};

/// Ids are 48 random bits rendered as 12 hex digits
const ID_MASK: u64 = 0xffff_ffff_ffff;

/// Entity an id was issued or claimed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Lab,
    Pod,
    Device,
}

#[derive(Debug)]
struct AllocatorState {
    rng: StdRng,
    issued: HashMap<String, IdKind>,
}

/// Issues globally unique opaque identifiers.
///
/// Shared by the Lab and Pod registries so one id is never handed out twice,
/// and explicit ids registered through [`claim`](Self::claim) are never
/// drawn afterwards.
#[derive(Debug)]
pub struct IdentifierAllocator {
    state: Mutex<AllocatorState>,
}

impl IdentifierAllocator {
    /// Allocator seeded from OS entropy
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic allocator for reproducible runs and tests
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        IdentifierAllocator {
            state: Mutex::new(AllocatorState {
                rng,
                issued: HashMap::new(),
            }),
        }
    }

    fn next(&self, kind: IdKind) -> String {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            let candidate = format!("{:012x}", state.rng.gen::<u64>() & ID_MASK);
            if !state.issued.contains_key(&candidate) {
                state.issued.insert(candidate.clone(), kind);
                return candidate;
            }
        }
    }

    /// Mark an externally chosen id as taken by `kind`.
    ///
    /// Returns false if the id already belongs to a different kind. Claiming
    /// an id again for the same kind succeeds, so a deleted Lab's id can be
    /// registered anew.
    pub fn claim(&self, id: &str, kind: IdKind) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.issued.get(id) {
            Some(owner) => *owner == kind,
            None => {
                state.issued.insert(id.to_string(), kind);
                true
            }
        }
    }

    /// Kind an id was issued or claimed for, if any
    pub fn kind_of(&self, id: &str) -> Option<IdKind> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.issued.get(id).copied()
    }

    pub fn lab_id(&self) -> LabId {
        LabId::from(self.next(IdKind::Lab))
    }

    pub fn pod_id(&self) -> PodId {
        PodId::from(self.next(IdKind::Pod))
    }

    pub fn device_id(&self) -> DeviceId {
        DeviceId::from(self.next(IdKind::Device))
    }
}

impl Default for IdentifierAllocator {
    fn default() -> Self {
        Self::new()
    }
}
