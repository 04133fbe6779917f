//! # labtrack - Lab, Pod and Device inventory with IPv4 address tracking
//!
//! This library keeps an in-memory inventory of physical test labs: Labs own
//! Pods, Pods own Devices, and each Device carries network Ports. Within a
//! Pod, the address on a Device's first Port must be unique; the registry
//! enforces this, derives the Pod's network from its Devices, and computes
//! which addresses in that network are still free.
//!
//! ## Architecture
//!
//! - `inventory`: entity and payload types (Lab, Pod, Device, Port, Network)
//! - `ip`: the per-Pod [`AddressTracker`](ip::AddressTracker) and host-range helpers
//! - `registry`: [`LabRegistry`](registry::LabRegistry), [`PodRegistry`](registry::PodRegistry)
//!   and the shared [`IdentifierAllocator`](registry::IdentifierAllocator)
//! - `import`: loading Lab dumps from JSON or YAML files
//! - `report`: per-Pod address usage reports
//! - `error`: the [`InventoryError`] taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use labtrack::inventory::{DeviceSpec, LabMeta, Location, Network, PodSpec, Port};
//! use labtrack::registry;
//!
//! let labs = registry::in_memory(None);
//! let lab = labs.create(LabMeta {
//!     name: "Interop".into(),
//!     location: "Austin".into(),
//!     building: "B2".into(),
//!     floor: "3".into(),
//! })?;
//!
//! let network = Network {
//!     network: "10.0.0.0/24".parse().unwrap(),
//!     gateway: "10.0.0.1".parse().unwrap(),
//! };
//! let switch = DeviceSpec {
//!     name: "tor-1".into(),
//!     description: "top of rack".into(),
//!     access_methods: vec![],
//!     location: Location { row: "4".into(), aisle: "C".into() },
//!     ports: vec![Port::new("10.0.0.5".parse().unwrap(), network)],
//! };
//! let pod = labs.pods().create_pod(&lab.id, PodSpec { assets: vec![switch] })?;
//!
//! let free = labs.pods().get_free_addresses(&lab.id, &pod.id)?;
//! assert_eq!(free.len(), 253);
//! # Ok::<(), labtrack::InventoryError>(())
//! ```
//!
//! ## Error Handling
//!
//! Registry operations return [`InventoryResult`]; every error is an ordinary
//! outcome and leaves the store unchanged. The file-facing layers (`import`,
//! `report`, the binary) use `color_eyre` for contextual errors.

pub mod error;
pub mod import;
pub mod inventory;
pub mod ip;
pub mod registry;
pub mod report;

pub use error::{InventoryError, InventoryResult};
