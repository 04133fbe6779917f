//! IPv4 address tracking and host range management.
//!
//! This module keeps the per-Pod sets of claimed addresses and computes
//! the usable host range of a Pod's network.

pub mod hosts;
pub mod tracker;

// Re-export commonly used types
pub use hosts::{host_count, is_usable_host, usable_hosts};
pub use tracker::AddressTracker;
