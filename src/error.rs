//! Error taxonomy for registry operations.
//!
//! Every variant is an ordinary outcome the caller is expected to handle.
//! A failed operation never leaves a partial write behind.

use std::net::Ipv4Addr;

use crate::inventory::{DeviceId, LabId, PodId};

/// Errors returned by [`LabRegistry`](crate::registry::LabRegistry) and
/// [`PodRegistry`](crate::registry::PodRegistry)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("Lab {0} does not exist")]
    LabNotFound(LabId),

    #[error("Pod {pod} does not exist in lab {lab}")]
    PodNotFound { lab: LabId, pod: PodId },

    #[error("Device {device} does not exist in pod {pod}")]
    DeviceNotFound { pod: PodId, device: DeviceId },

    #[error("Device {0} has no ports")]
    PortNotFound(DeviceId),

    #[error("Device {0} has no access methods")]
    AccessMethodNotFound(DeviceId),

    #[error("Lab {0} already exists")]
    LabAlreadyExists(LabId),

    #[error("Address {address} is already in use in pod {pod}")]
    DuplicateAddress { pod: PodId, address: Ipv4Addr },
}

impl InventoryError {
    /// True for the lookup failures an adapter would report as 404-class
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            InventoryError::LabNotFound(_)
                | InventoryError::PodNotFound { .. }
                | InventoryError::DeviceNotFound { .. }
                | InventoryError::PortNotFound(_)
                | InventoryError::AccessMethodNotFound(_)
        )
    }

    /// True for uniqueness violations (409-class)
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            InventoryError::LabAlreadyExists(_) | InventoryError::DuplicateAddress { .. }
        )
    }
}

/// Result type for registry operations
pub type InventoryResult<T> = Result<T, InventoryError>;
