//! Inventory entities.
//!
//! Labs own Pods, Pods own Devices, and Devices carry the network Ports whose
//! first address is tracked per Pod. Specs (`PodSpec`, `DeviceSpec`) are the
//! creation payloads handed in by the API layer; the registries assign ids.

pub mod types;

pub use types::{
    AccessMethod, Device, DeviceId, DeviceSpec, Interface, Lab, LabDump, LabId, LabMeta, Location,
    Network, Pod, PodId, PodSpec, Port,
};
