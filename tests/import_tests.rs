#[cfg(test)]
mod import_tests {
    use std::io::Write;
    use std::net::Ipv4Addr;
    use tempfile::{Builder, NamedTempFile};

    use labtrack::import::import_file;
    use labtrack::inventory::{LabDump, LabId, LabMeta};
    use labtrack::registry;
    use labtrack::InventoryError;

    const DUMP: &str = r#"{
        "id": "lab-42",
        "name": "Scale",
        "location": "San Jose",
        "building": "SJ-7",
        "floor": "2",
        "pods": [
            {
                "id": "ignored-pod-id",
                "assets": [
                    {
                        "id": "ignored-device-id",
                        "name": "spine1",
                        "description": "spine switch",
                        "accessMethods": [{"url": "ssh://172.16.0.10"}],
                        "location": {"row": "1", "aisle": "A"},
                        "ports": [{"interface": {"address": "172.16.0.10",
                            "parent": {"network": "172.16.0.0/28", "gateway": "172.16.0.1"}}}]
                    },
                    {
                        "name": "spine2",
                        "description": "spine switch",
                        "accessMethods": [],
                        "location": {"row": "1", "aisle": "B"},
                        "ports": [{"interface": {"address": "172.16.0.11",
                            "parent": {"network": "172.16.0.0/28", "gateway": "172.16.0.1"}}}]
                    }
                ]
            },
            {"assets": []}
        ]
    }"#;

    fn write_dump(contents: &str) -> NamedTempFile {
        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(temp_file, "{}", contents).unwrap();
        temp_file
    }

    #[test]
    fn test_import_keeps_lab_id_and_reissues_nested_ids() {
        let labs = registry::in_memory(Some(9));
        let file = write_dump(DUMP);
        let lab = import_file(&labs, file.path()).unwrap();

        assert_eq!(lab.id, LabId::from("lab-42"));
        assert_eq!(labs.get(&lab.id).unwrap().meta.building, "SJ-7");

        let pods = labs.pods().list_pods(&lab.id).unwrap();
        assert_eq!(pods.len(), 2);
        assert_ne!(pods[0].as_str(), "ignored-pod-id");

        let devices = labs.pods().get_pod_devices(&lab.id, &pods[0]).unwrap();
        assert_eq!(devices.len(), 2);
        assert_ne!(devices[0].id.as_str(), "ignored-device-id");
        assert_eq!(
            labs.pods().get_used_addresses(&lab.id, &pods[0]).unwrap(),
            vec![Ipv4Addr::new(172, 16, 0, 10), Ipv4Addr::new(172, 16, 0, 11)]
        );
        assert_eq!(labs.pods().get_free_addresses(&lab.id, &pods[0]).unwrap().len(), 12);
    }

    #[test]
    fn test_importing_same_lab_twice_conflicts() {
        let labs = registry::in_memory(Some(10));
        let file = write_dump(DUMP);
        import_file(&labs, file.path()).unwrap();

        let err = import_file(&labs, file.path()).unwrap_err();
        let cause = err.downcast_ref::<InventoryError>().unwrap();
        assert_eq!(cause, &InventoryError::LabAlreadyExists(LabId::from("lab-42")));
        assert_eq!(labs.list().len(), 1);
    }

    #[test]
    fn test_failed_import_leaves_store_unchanged() {
        let labs = registry::in_memory(Some(11));
        let duplicated = DUMP.replace("172.16.0.11", "172.16.0.10");
        let file = write_dump(&duplicated);

        let err = import_file(&labs, file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InventoryError>(),
            Some(InventoryError::DuplicateAddress { .. })
        ));
        assert!(labs.list().is_empty());
        assert!(!labs.pods().has_namespace(&LabId::from("lab-42")));
    }

    #[test]
    fn test_import_from_value() {
        let labs = registry::in_memory(Some(12));
        let dump = LabDump {
            id: LabId::from("direct"),
            meta: LabMeta {
                name: "Direct".to_string(),
                location: "Lab".to_string(),
                building: "1".to_string(),
                floor: "1".to_string(),
            },
            pods: vec![],
        };
        let lab = labs.import(dump).unwrap();
        assert!(labs.pods().list_pods(&lab.id).unwrap().is_empty());
    }
}
