//! Lab metadata registry.
//!
//! Labs hold metadata only. Their Pods live in the [`PodRegistry`], which is
//! driven through `init_namespace`/`drop_namespace` from here. The labs lock
//! is always taken before the pod store lock.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{InventoryError, InventoryResult};
use crate::inventory::{Lab, LabDump, LabId, LabMeta};

use super::ids::IdKind;
use super::pod::PodRegistry;

#[derive(Debug)]
pub struct LabRegistry {
    labs: RwLock<BTreeMap<LabId, LabMeta>>,
    pods: Arc<PodRegistry>,
}

impl LabRegistry {
    pub fn new(pods: Arc<PodRegistry>) -> Self {
        LabRegistry {
            labs: RwLock::new(BTreeMap::new()),
            pods,
        }
    }

    pub fn pods(&self) -> &Arc<PodRegistry> {
        &self.pods
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<LabId, LabMeta>> {
        self.labs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<LabId, LabMeta>> {
        self.labs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a Lab under a freshly allocated id and open its Pod namespace
    pub fn create(&self, meta: LabMeta) -> InventoryResult<Lab> {
        let id = self.pods.allocator().lab_id();
        let mut labs = self.write();
        self.pods.init_namespace(&id)?;
        labs.insert(id.clone(), meta.clone());
        log::info!("Created lab {} ({})", id, meta.name);
        Ok(Lab { id, meta })
    }

    /// Register a Lab under a caller-chosen id (import path)
    pub fn create_with_id(&self, id: LabId, meta: LabMeta) -> InventoryResult<Lab> {
        let mut labs = self.write();
        self.insert_with_id(&mut labs, &id, &meta)?;
        Ok(Lab { id, meta })
    }

    fn insert_with_id(
        &self,
        labs: &mut BTreeMap<LabId, LabMeta>,
        id: &LabId,
        meta: &LabMeta,
    ) -> InventoryResult<()> {
        if labs.contains_key(id) {
            return Err(InventoryError::LabAlreadyExists(id.clone()));
        }
        if !self.pods.allocator().claim(id.as_str(), IdKind::Lab) {
            log::warn!("Rejected lab id {}: already issued to another entity", id);
            return Err(InventoryError::LabAlreadyExists(id.clone()));
        }
        self.pods.init_namespace(id)?;
        labs.insert(id.clone(), meta.clone());
        log::info!("Created lab {} ({}) with explicit id", id, meta.name);
        Ok(())
    }

    pub fn get(&self, id: &LabId) -> InventoryResult<Lab> {
        self.read()
            .get(id)
            .map(|meta| Lab {
                id: id.clone(),
                meta: meta.clone(),
            })
            .ok_or_else(|| InventoryError::LabNotFound(id.clone()))
    }

    /// Overwrite a Lab's metadata. The id and Pod namespace are untouched.
    pub fn replace(&self, id: &LabId, meta: LabMeta) -> InventoryResult<Lab> {
        let mut labs = self.write();
        let slot = labs
            .get_mut(id)
            .ok_or_else(|| InventoryError::LabNotFound(id.clone()))?;
        *slot = meta.clone();
        Ok(Lab {
            id: id.clone(),
            meta,
        })
    }

    /// Delete a Lab and its Pods.
    ///
    /// If the Pod namespace cannot be dropped the Lab metadata is kept and
    /// the cascade error is returned.
    pub fn delete(&self, id: &LabId) -> InventoryResult<()> {
        let mut labs = self.write();
        if !labs.contains_key(id) {
            return Err(InventoryError::LabNotFound(id.clone()));
        }
        if let Err(err) = self.pods.drop_namespace(id) {
            log::warn!("Cascade delete of lab {} failed: {}", id, err);
            return Err(err);
        }
        labs.remove(id);
        log::info!("Deleted lab {} and its pods", id);
        Ok(())
    }

    /// All Labs ordered by id
    pub fn list(&self) -> Vec<Lab> {
        self.read()
            .iter()
            .map(|(id, meta)| Lab {
                id: id.clone(),
                meta: meta.clone(),
            })
            .collect()
    }

    /// Import a full Lab document.
    ///
    /// The dump's Lab id is kept; Pod and Device ids are re-issued. Either
    /// the Lab and every Pod are stored, or nothing is.
    pub fn import(&self, dump: LabDump) -> InventoryResult<Lab> {
        let LabDump { id, meta, pods } = dump;
        let pod_count = pods.len();

        let mut labs = self.write();
        self.insert_with_id(&mut labs, &id, &meta)?;

        if let Err(err) = self.pods.create_pods(&id, pods) {
            log::warn!("Import of lab {} failed, rolling back: {}", id, err);
            labs.remove(&id);
            if let Err(cleanup) = self.pods.drop_namespace(&id) {
                log::warn!("Rollback of lab {} namespace failed: {}", id, cleanup);
            }
            return Err(err);
        }

        log::info!("Imported lab {} with {} pods", id, pod_count);
        Ok(Lab { id, meta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::PodSpec;
    use crate::registry::IdentifierAllocator;

    fn registry() -> LabRegistry {
        let ids = Arc::new(IdentifierAllocator::with_seed(3));
        LabRegistry::new(Arc::new(PodRegistry::new(ids)))
    }

    fn meta(name: &str) -> LabMeta {
        LabMeta {
            name: name.to_string(),
            location: "Raleigh".to_string(),
            building: "RTP-1".to_string(),
            floor: "2".to_string(),
        }
    }

    #[test]
    fn test_create_get_replace() {
        let labs = registry();
        let lab = labs.create(meta("interop")).unwrap();
        assert!(labs.pods().has_namespace(&lab.id));
        assert_eq!(labs.get(&lab.id).unwrap(), lab);

        let updated = labs.replace(&lab.id, meta("scale")).unwrap();
        assert_eq!(updated.id, lab.id);
        assert_eq!(labs.get(&lab.id).unwrap().meta.name, "scale");
        assert!(labs.pods().has_namespace(&lab.id));
    }

    #[test]
    fn test_missing_lab() {
        let labs = registry();
        let ghost = LabId::from("ghost");
        assert_eq!(labs.get(&ghost), Err(InventoryError::LabNotFound(ghost.clone())));
        assert!(labs.replace(&ghost, meta("x")).is_err());
        assert!(labs.delete(&ghost).is_err());
    }

    #[test]
    fn test_explicit_id_collision() {
        let labs = registry();
        labs.create_with_id(LabId::from("lab-1"), meta("a")).unwrap();
        let err = labs.create_with_id(LabId::from("lab-1"), meta("b")).unwrap_err();
        assert_eq!(err, InventoryError::LabAlreadyExists(LabId::from("lab-1")));
        assert_eq!(labs.get(&LabId::from("lab-1")).unwrap().meta.name, "a");
    }

    #[test]
    fn test_explicit_id_taken_by_pod_or_device() {
        let labs = registry();
        let host = labs.create(meta("host")).unwrap();
        let pod = labs.pods().create_pod(&host.id, PodSpec::default()).unwrap();

        let stolen = LabId::from(pod.id.as_str());
        let err = labs.create_with_id(stolen.clone(), meta("x")).unwrap_err();
        assert_eq!(err, InventoryError::LabAlreadyExists(stolen.clone()));
        assert!(!labs.pods().has_namespace(&stolen));
        assert!(labs.get(&stolen).is_err());
        assert_eq!(labs.list().len(), 1);
    }

    #[test]
    fn test_explicit_id_reusable_after_delete() {
        let labs = registry();
        labs.create_with_id(LabId::from("lab-1"), meta("a")).unwrap();
        labs.delete(&LabId::from("lab-1")).unwrap();
        let again = labs.create_with_id(LabId::from("lab-1"), meta("b")).unwrap();
        assert_eq!(labs.get(&again.id).unwrap().meta.name, "b");
    }

    #[test]
    fn test_delete_keeps_meta_when_cascade_fails() {
        let labs = registry();
        let lab = labs.create(meta("a")).unwrap();
        // Simulate a namespace already gone underneath the lab
        labs.pods().drop_namespace(&lab.id).unwrap();

        assert_eq!(labs.delete(&lab.id), Err(InventoryError::LabNotFound(lab.id.clone())));
        assert!(labs.get(&lab.id).is_ok());
    }

    #[test]
    fn test_delete_cascades() {
        let labs = registry();
        let lab = labs.create(meta("a")).unwrap();
        let pod = labs.pods().create_pod(&lab.id, PodSpec::default()).unwrap();

        labs.delete(&lab.id).unwrap();
        assert!(!labs.pods().has_namespace(&lab.id));
        assert_eq!(
            labs.pods().get_pod(&lab.id, &pod.id),
            Err(InventoryError::LabNotFound(lab.id.clone()))
        );
    }

    #[test]
    fn test_list_is_sorted_by_id() {
        let labs = registry();
        labs.create_with_id(LabId::from("b"), meta("b")).unwrap();
        labs.create_with_id(LabId::from("a"), meta("a")).unwrap();
        let ids: Vec<String> = labs.list().into_iter().map(|lab| lab.id.to_string()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
