//! Entity types for the Lab/Pod/Device hierarchy.

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a Lab
    LabId
);
opaque_id!(
    /// Identifier of a Pod, unique within its Lab
    PodId
);
opaque_id!(
    /// Identifier of a Device
    DeviceId
);

/// Network block and gateway attached to an interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub network: Ipv4Network,
    pub gateway: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub address: Ipv4Addr,
    pub parent: Network,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub interface: Interface,
}

impl Port {
    pub fn new(address: Ipv4Addr, parent: Network) -> Self {
        Port {
            interface: Interface { address, parent },
        }
    }
}

/// Physical placement of a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub row: String,
    pub aisle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMethod {
    pub url: String,
}

/// A Device as stored in a Pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub description: String,
    #[serde(rename = "accessMethods")]
    pub access_methods: Vec<AccessMethod>,
    pub location: Location,
    pub ports: Vec<Port>,
}

impl Device {
    /// Address of the first port. Only this address is tracked for the Pod.
    pub fn primary_address(&self) -> Option<Ipv4Addr> {
        self.ports.first().map(|port| port.interface.address)
    }

    /// Parent network of the first port
    pub fn primary_network(&self) -> Option<&Network> {
        self.ports.first().map(|port| &port.interface.parent)
    }
}

/// Payload for creating a Device. Any `id` present in the source document is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "accessMethods", default)]
    pub access_methods: Vec<AccessMethod>,
    pub location: Location,
    #[serde(default)]
    pub ports: Vec<Port>,
}

impl DeviceSpec {
    pub fn primary_address(&self) -> Option<Ipv4Addr> {
        self.ports.first().map(|port| port.interface.address)
    }

    pub(crate) fn into_device(self, id: DeviceId) -> Device {
        Device {
            id,
            name: self.name,
            description: self.description,
            access_methods: self.access_methods,
            location: self.location,
            ports: self.ports,
        }
    }
}

/// A Pod and its Devices in insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub id: PodId,
    pub assets: Vec<Device>,
}

impl Pod {
    pub(crate) fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.assets.iter().find(|device| &device.id == id)
    }

    pub(crate) fn device_mut(&mut self, id: &DeviceId) -> Option<&mut Device> {
        self.assets.iter_mut().find(|device| &device.id == id)
    }
}

/// Payload for creating a Pod with its initial Devices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub assets: Vec<DeviceSpec>,
}

/// Lab metadata without nested data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabMeta {
    pub name: String,
    pub location: String,
    pub building: String,
    pub floor: String,
}

/// A registered Lab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lab {
    pub id: LabId,
    #[serde(flatten)]
    pub meta: LabMeta,
}

/// A full Lab document as produced by an inventory export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabDump {
    pub id: LabId,
    #[serde(flatten)]
    pub meta: LabMeta,
    #[serde(default)]
    pub pods: Vec<PodSpec>,
}
