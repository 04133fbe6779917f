//! Pod and Device registry.
//!
//! Owns every Lab's Pod namespace together with the [`AddressTracker`] that
//! enforces per-Pod address uniqueness. A single `RwLock` covers both, so a
//! write holds the Device data and the tracker together for its whole
//! check-then-commit sequence, and readers never see one updated without
//! the other.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{InventoryError, InventoryResult};
use crate::inventory::{
    AccessMethod, Device, DeviceId, DeviceSpec, LabId, Location, Network, Pod, PodId, PodSpec,
};
use crate::ip::{host_count, is_usable_host, usable_hosts, AddressTracker};

use super::ids::IdentifierAllocator;

/// Pods of one Lab in insertion order
#[derive(Debug, Default)]
struct Namespace {
    pods: Vec<Pod>,
}

#[derive(Debug, Default)]
struct PodStore {
    namespaces: HashMap<LabId, Namespace>,
    tracker: AddressTracker,
}

fn find_pod<'a>(
    namespaces: &'a HashMap<LabId, Namespace>,
    lab: &LabId,
    pod: &PodId,
) -> InventoryResult<&'a Pod> {
    let namespace = namespaces
        .get(lab)
        .ok_or_else(|| InventoryError::LabNotFound(lab.clone()))?;
    namespace
        .pods
        .iter()
        .find(|candidate| &candidate.id == pod)
        .ok_or_else(|| InventoryError::PodNotFound {
            lab: lab.clone(),
            pod: pod.clone(),
        })
}

fn find_pod_mut<'a>(
    namespaces: &'a mut HashMap<LabId, Namespace>,
    lab: &LabId,
    pod: &PodId,
) -> InventoryResult<&'a mut Pod> {
    let namespace = namespaces
        .get_mut(lab)
        .ok_or_else(|| InventoryError::LabNotFound(lab.clone()))?;
    namespace
        .pods
        .iter_mut()
        .find(|candidate| &candidate.id == pod)
        .ok_or_else(|| InventoryError::PodNotFound {
            lab: lab.clone(),
            pod: pod.clone(),
        })
}

fn find_device_mut<'a>(pod: &'a mut Pod, device: &DeviceId) -> InventoryResult<&'a mut Device> {
    let pod_id = pod.id.clone();
    pod.device_mut(device)
        .ok_or_else(|| InventoryError::DeviceNotFound {
            pod: pod_id,
            device: device.clone(),
        })
}

/// Registry of Pods and Devices, keyed by (Lab id, Pod id, Device id)
#[derive(Debug)]
pub struct PodRegistry {
    store: RwLock<PodStore>,
    ids: Arc<IdentifierAllocator>,
}

impl PodRegistry {
    pub fn new(ids: Arc<IdentifierAllocator>) -> Self {
        PodRegistry {
            store: RwLock::new(PodStore::default()),
            ids,
        }
    }

    /// The allocator this registry draws Pod and Device ids from
    pub fn allocator(&self) -> &Arc<IdentifierAllocator> {
        &self.ids
    }

    fn read(&self) -> RwLockReadGuard<'_, PodStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PodStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open an empty Pod namespace for a Lab.
    ///
    /// Opening the same namespace twice is a caller bug; it is reported as
    /// `LabAlreadyExists` and the existing namespace is left alone.
    pub fn init_namespace(&self, lab: &LabId) -> InventoryResult<()> {
        let mut store = self.write();
        if store.namespaces.contains_key(lab) {
            return Err(InventoryError::LabAlreadyExists(lab.clone()));
        }
        store.namespaces.insert(lab.clone(), Namespace::default());
        log::debug!("Opened pod namespace for lab {}", lab);
        Ok(())
    }

    /// Remove every Pod of a Lab and release its tracked addresses
    pub fn drop_namespace(&self, lab: &LabId) -> InventoryResult<()> {
        let mut guard = self.write();
        let store = &mut *guard;
        let namespace = store
            .namespaces
            .remove(lab)
            .ok_or_else(|| InventoryError::LabNotFound(lab.clone()))?;
        let closed = store.tracker.close_lab(lab);
        log::info!(
            "Dropped namespace of lab {} ({} pods, {} address sets)",
            lab,
            namespace.pods.len(),
            closed
        );
        Ok(())
    }

    pub fn has_namespace(&self, lab: &LabId) -> bool {
        self.read().namespaces.contains_key(lab)
    }

    /// Reserve a new Pod's addresses and build it. Nothing is recorded on failure.
    fn materialize(
        &self,
        tracker: &mut AddressTracker,
        lab: &LabId,
        spec: PodSpec,
    ) -> InventoryResult<Pod> {
        let pod_id = self.ids.pod_id();
        let addresses: Vec<Ipv4Addr> = spec
            .assets
            .iter()
            .filter_map(DeviceSpec::primary_address)
            .collect();
        tracker.reserve_batch(lab, &pod_id, &addresses)?;

        let assets = spec
            .assets
            .into_iter()
            .map(|device| device.into_device(self.ids.device_id()))
            .collect();
        Ok(Pod { id: pod_id, assets })
    }

    /// Create a Pod with its initial Devices.
    ///
    /// The Devices' addresses are validated as one batch: a repeat inside the
    /// batch fails with `DuplicateAddress` and no Pod or address is stored.
    pub fn create_pod(&self, lab: &LabId, spec: PodSpec) -> InventoryResult<Pod> {
        let mut guard = self.write();
        let store = &mut *guard;
        let namespace = store
            .namespaces
            .get_mut(lab)
            .ok_or_else(|| InventoryError::LabNotFound(lab.clone()))?;

        let pod = self.materialize(&mut store.tracker, lab, spec)?;
        namespace.pods.push(pod.clone());
        log::info!("Created pod {} in lab {} with {} devices", pod.id, lab, pod.assets.len());
        Ok(pod)
    }

    /// Create several Pods as one unit: either all are stored or none are
    pub fn create_pods(&self, lab: &LabId, specs: Vec<PodSpec>) -> InventoryResult<Vec<Pod>> {
        let mut guard = self.write();
        let store = &mut *guard;
        let namespace = store
            .namespaces
            .get_mut(lab)
            .ok_or_else(|| InventoryError::LabNotFound(lab.clone()))?;

        let mut staged: Vec<Pod> = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.materialize(&mut store.tracker, lab, spec) {
                Ok(pod) => staged.push(pod),
                Err(err) => {
                    for pod in &staged {
                        store.tracker.close_pod(lab, &pod.id);
                    }
                    return Err(err);
                }
            }
        }

        namespace.pods.extend(staged.iter().cloned());
        log::info!("Created {} pods in lab {}", staged.len(), lab);
        Ok(staged)
    }

    /// Append a Device to a Pod, claiming its first-port address
    pub fn create_device(
        &self,
        lab: &LabId,
        pod: &PodId,
        spec: DeviceSpec,
    ) -> InventoryResult<Device> {
        let mut guard = self.write();
        let store = &mut *guard;
        let target = find_pod_mut(&mut store.namespaces, lab, pod)?;

        if let Some(address) = spec.primary_address() {
            store.tracker.reserve(lab, pod, address)?;
        }

        let device = spec.into_device(self.ids.device_id());
        target.assets.push(device.clone());
        log::info!("Created device {} ({}) in pod {}", device.id, device.name, pod);
        Ok(device)
    }

    /// Change the address of a Device's first port
    pub fn patch_device_ip(
        &self,
        lab: &LabId,
        pod: &PodId,
        device: &DeviceId,
        new_ip: Ipv4Addr,
    ) -> InventoryResult<Device> {
        let mut guard = self.write();
        let store = &mut *guard;
        let target = find_device_mut(find_pod_mut(&mut store.namespaces, lab, pod)?, device)?;

        let port = target
            .ports
            .first_mut()
            .ok_or_else(|| InventoryError::PortNotFound(device.clone()))?;
        let current = port.interface.address;
        if current == new_ip {
            log::debug!("Device {} already at {}, nothing to change", device, new_ip);
            return Ok(target.clone());
        }

        store.tracker.swap(lab, pod, Some(current), new_ip)?;
        port.interface.address = new_ip;
        log::info!("Device {} moved from {} to {}", device, current, new_ip);
        Ok(target.clone())
    }

    pub fn patch_device_name(
        &self,
        lab: &LabId,
        pod: &PodId,
        device: &DeviceId,
        name: &str,
    ) -> InventoryResult<Device> {
        let mut store = self.write();
        let target = find_device_mut(find_pod_mut(&mut store.namespaces, lab, pod)?, device)?;
        target.name = name.to_string();
        Ok(target.clone())
    }

    /// Replace the first access method of a Device
    pub fn patch_device_access_method(
        &self,
        lab: &LabId,
        pod: &PodId,
        device: &DeviceId,
        access: AccessMethod,
    ) -> InventoryResult<Device> {
        let mut store = self.write();
        let target = find_device_mut(find_pod_mut(&mut store.namespaces, lab, pod)?, device)?;
        let first = target
            .access_methods
            .first_mut()
            .ok_or_else(|| InventoryError::AccessMethodNotFound(device.clone()))?;
        *first = access;
        Ok(target.clone())
    }

    /// Overwrite the parent network on every port of every Device in the Pod.
    /// Addresses and the tracker are untouched.
    pub fn patch_pod_devices_network(
        &self,
        lab: &LabId,
        pod: &PodId,
        network: Network,
    ) -> InventoryResult<Vec<Device>> {
        let mut store = self.write();
        let target = find_pod_mut(&mut store.namespaces, lab, pod)?;
        for port in target.assets.iter_mut().flat_map(|device| device.ports.iter_mut()) {
            port.interface.parent = network.clone();
        }
        log::info!("Set network {} on all devices of pod {}", network.network, pod);
        Ok(target.assets.clone())
    }

    /// Overwrite the location of every Device in the Pod
    pub fn patch_pod_devices_location(
        &self,
        lab: &LabId,
        pod: &PodId,
        location: Location,
    ) -> InventoryResult<Vec<Device>> {
        let mut store = self.write();
        let target = find_pod_mut(&mut store.namespaces, lab, pod)?;
        for device in &mut target.assets {
            device.location = location.clone();
        }
        Ok(target.assets.clone())
    }

    /// Remove a Device and release its tracked address
    pub fn delete_device(&self, lab: &LabId, pod: &PodId, device: &DeviceId) -> InventoryResult<()> {
        let mut guard = self.write();
        let store = &mut *guard;
        let target = find_pod_mut(&mut store.namespaces, lab, pod)?;
        let index = target
            .assets
            .iter()
            .position(|candidate| &candidate.id == device)
            .ok_or_else(|| InventoryError::DeviceNotFound {
                pod: pod.clone(),
                device: device.clone(),
            })?;

        let removed = target.assets.remove(index);
        if let Some(address) = removed.primary_address() {
            store.tracker.release(lab, pod, address);
        }
        log::info!("Deleted device {} from pod {}", device, pod);
        Ok(())
    }

    /// Remove a Pod together with its whole address set
    pub fn delete_pod(&self, lab: &LabId, pod: &PodId) -> InventoryResult<()> {
        let mut guard = self.write();
        let store = &mut *guard;
        let namespace = store
            .namespaces
            .get_mut(lab)
            .ok_or_else(|| InventoryError::LabNotFound(lab.clone()))?;
        let index = namespace
            .pods
            .iter()
            .position(|candidate| &candidate.id == pod)
            .ok_or_else(|| InventoryError::PodNotFound {
                lab: lab.clone(),
                pod: pod.clone(),
            })?;

        namespace.pods.remove(index);
        let released = store.tracker.close_pod(lab, pod);
        log::info!("Deleted pod {} from lab {} ({} addresses released)", pod, lab, released.len());
        Ok(())
    }

    pub fn get_pod(&self, lab: &LabId, pod: &PodId) -> InventoryResult<Pod> {
        let store = self.read();
        find_pod(&store.namespaces, lab, pod).cloned()
    }

    pub fn get_pod_devices(&self, lab: &LabId, pod: &PodId) -> InventoryResult<Vec<Device>> {
        let store = self.read();
        Ok(find_pod(&store.namespaces, lab, pod)?.assets.clone())
    }

    pub fn get_device(&self, lab: &LabId, pod: &PodId, device: &DeviceId) -> InventoryResult<Device> {
        let store = self.read();
        let target = find_pod(&store.namespaces, lab, pod)?;
        target
            .device(device)
            .cloned()
            .ok_or_else(|| InventoryError::DeviceNotFound {
                pod: pod.clone(),
                device: device.clone(),
            })
    }

    /// Pod ids of a Lab in insertion order
    pub fn list_pods(&self, lab: &LabId) -> InventoryResult<Vec<PodId>> {
        let store = self.read();
        let namespace = store
            .namespaces
            .get(lab)
            .ok_or_else(|| InventoryError::LabNotFound(lab.clone()))?;
        Ok(namespace.pods.iter().map(|pod| pod.id.clone()).collect())
    }

    /// Network of the first Device (by insertion order) that has a port
    pub fn get_pod_network(&self, lab: &LabId, pod: &PodId) -> InventoryResult<Option<Network>> {
        let store = self.read();
        let target = find_pod(&store.namespaces, lab, pod)?;
        Ok(target.assets.iter().find_map(Device::primary_network).cloned())
    }

    /// Tracked addresses of the Pod in ascending order
    pub fn get_used_addresses(&self, lab: &LabId, pod: &PodId) -> InventoryResult<Vec<Ipv4Addr>> {
        let store = self.read();
        find_pod(&store.namespaces, lab, pod)?;
        Ok(store.tracker.used(lab, pod))
    }

    /// Usable hosts of the Pod's network that are not tracked, ascending.
    /// Empty when the Pod has no derivable network.
    pub fn get_free_addresses(&self, lab: &LabId, pod: &PodId) -> InventoryResult<Vec<Ipv4Addr>> {
        let store = self.read();
        let target = find_pod(&store.namespaces, lab, pod)?;
        let Some(network) = target.assets.iter().find_map(Device::primary_network) else {
            return Ok(Vec::new());
        };

        let used = store.tracker.addresses(lab, pod);
        Ok(usable_hosts(network.network)
            .filter(|address| used.map_or(true, |set| !set.contains(address)))
            .collect())
    }

    /// Number of free addresses, computed without materializing the free list
    pub fn count_free_addresses(&self, lab: &LabId, pod: &PodId) -> InventoryResult<u64> {
        let store = self.read();
        let target = find_pod(&store.namespaces, lab, pod)?;
        let Some(network) = target.assets.iter().find_map(Device::primary_network) else {
            return Ok(0);
        };

        let net = network.network;
        let used_in_range = store
            .tracker
            .addresses(lab, pod)
            .map_or(0, |set| set.iter().filter(|a| is_usable_host(net, **a)).count());
        Ok(host_count(net) - used_in_range as u64)
    }
}
