//! Per-Pod address tracker.
//!
//! Keeps, for every (Lab, Pod) pair, the set of IPv4 addresses claimed by
//! the first Port of that Pod's Devices. Every mutating call checks and
//! commits in one step, so a caller holding `&mut AddressTracker` can never
//! observe a passed check followed by a lost insert.

use std::collections::{BTreeSet, HashMap};
use std::net::Ipv4Addr;

use crate::error::{InventoryError, InventoryResult};
use crate::inventory::{LabId, PodId};

#[derive(Debug, Default)]
pub struct AddressTracker {
    /// Used addresses per (lab, pod); BTreeSet keeps them in ascending order
    used: HashMap<(LabId, PodId), BTreeSet<Ipv4Addr>>,
}

impl AddressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn duplicate(pod: &PodId, address: Ipv4Addr) -> InventoryError {
        InventoryError::DuplicateAddress {
            pod: pod.clone(),
            address,
        }
    }

    /// Check if an address is in use in the pod
    pub fn contains(&self, lab: &LabId, pod: &PodId, address: Ipv4Addr) -> bool {
        self.used
            .get(&(lab.clone(), pod.clone()))
            .map_or(false, |set| set.contains(&address))
    }

    /// Claim an address for the pod, failing if it is already claimed
    pub fn reserve(&mut self, lab: &LabId, pod: &PodId, address: Ipv4Addr) -> InventoryResult<()> {
        let set = self.used.entry((lab.clone(), pod.clone())).or_default();
        if !set.insert(address) {
            log::warn!("Rejected duplicate address {} in pod {} (lab {})", address, pod, lab);
            return Err(Self::duplicate(pod, address));
        }
        log::debug!("Reserved {} in pod {} (lab {})", address, pod, lab);
        Ok(())
    }

    /// Claim a batch of addresses as one unit.
    ///
    /// The batch is rejected if any address repeats within it or is already
    /// claimed. Nothing is recorded unless the whole batch passes. The pod's
    /// entry is created even for an empty batch.
    pub fn reserve_batch(
        &mut self,
        lab: &LabId,
        pod: &PodId,
        addresses: &[Ipv4Addr],
    ) -> InventoryResult<()> {
        let key = (lab.clone(), pod.clone());
        let existing = self.used.get(&key);

        let mut staged = BTreeSet::new();
        for &address in addresses {
            let taken = existing.map_or(false, |set| set.contains(&address));
            if taken || !staged.insert(address) {
                log::warn!("Rejected address batch for pod {} (lab {}): {} repeats", pod, lab, address);
                return Err(Self::duplicate(pod, address));
            }
        }

        let set = self.used.entry(key).or_default();
        set.extend(staged);
        log::debug!("Reserved {} addresses in pod {} (lab {})", addresses.len(), pod, lab);
        Ok(())
    }

    /// Move a claim from `old` to `new`.
    ///
    /// `old` does not count as a collision for `new`. On failure the set is
    /// unchanged. `old` of `None` behaves like `reserve`.
    pub fn swap(
        &mut self,
        lab: &LabId,
        pod: &PodId,
        old: Option<Ipv4Addr>,
        new: Ipv4Addr,
    ) -> InventoryResult<()> {
        if old == Some(new) {
            return Ok(());
        }
        let set = self.used.entry((lab.clone(), pod.clone())).or_default();
        if set.contains(&new) {
            log::warn!("Rejected address change to {} in pod {} (lab {})", new, pod, lab);
            return Err(Self::duplicate(pod, new));
        }
        if let Some(old) = old {
            set.remove(&old);
        }
        set.insert(new);
        log::debug!("Moved claim {:?} -> {} in pod {} (lab {})", old, new, pod, lab);
        Ok(())
    }

    /// Release an address. Returns whether it was claimed.
    pub fn release(&mut self, lab: &LabId, pod: &PodId, address: Ipv4Addr) -> bool {
        let released = self
            .used
            .get_mut(&(lab.clone(), pod.clone()))
            .map_or(false, |set| set.remove(&address));
        if released {
            log::debug!("Released {} in pod {} (lab {})", address, pod, lab);
        }
        released
    }

    /// Drop a pod's entire address set, returning what it held
    pub fn close_pod(&mut self, lab: &LabId, pod: &PodId) -> BTreeSet<Ipv4Addr> {
        self.used
            .remove(&(lab.clone(), pod.clone()))
            .unwrap_or_default()
    }

    /// Drop every pod's address set for a lab. Returns the number of pods dropped.
    pub fn close_lab(&mut self, lab: &LabId) -> usize {
        let before = self.used.len();
        self.used.retain(|(owner, _), _| owner != lab);
        before - self.used.len()
    }

    /// Used addresses of a pod in ascending order
    pub fn used(&self, lab: &LabId, pod: &PodId) -> Vec<Ipv4Addr> {
        self.addresses(lab, pod)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn addresses(&self, lab: &LabId, pod: &PodId) -> Option<&BTreeSet<Ipv4Addr>> {
        self.used.get(&(lab.clone(), pod.clone()))
    }

    /// Total number of claimed addresses across all pods
    pub fn total_claimed(&self) -> usize {
        self.used.values().map(BTreeSet::len).sum()
    }
}
