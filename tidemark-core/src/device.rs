/// Device records
use crate::Sensor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The top-level container for a group of sensors.
///
/// Devices are the unit of provisioning: readings are always written to a
/// sensor within a device, and device attributes are the primary grouping
/// mechanism for [`Selection`](crate::Selection)s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Device primary key.
    pub key: String,
    /// Human readable name, e.g. "Pump Station 4".
    #[serde(default)]
    pub name: String,
    /// Indexable attributes, e.g. {"region": "southwest", "model": "TX75"}.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    /// Sensors attached to this device.
    #[serde(default)]
    pub sensors: Vec<Sensor>,
}

impl Device {
    /// Create a device with just a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: String::new(),
            attributes: HashMap::new(),
            sensors: Vec::new(),
        }
    }

    /// Set the human readable name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add an indexable attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attach a sensor.
    pub fn with_sensor(mut self, sensor: Sensor) -> Self {
        self.sensors.push(sensor);
        self
    }
}
