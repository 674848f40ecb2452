/// Sensor records
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The container for one stream of timestamped datapoints.
///
/// Sensors always live inside a [`Device`](crate::Device); their keys only
/// need to be unique within that device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    /// Sensor primary key within its device.
    pub key: String,
    /// Human readable name, e.g. "Thermometer 1".
    #[serde(default)]
    pub name: String,
    /// Indexable attributes, e.g. {"unit": "F", "model": "FHZ343"}.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Sensor {
    /// Create a sensor with just a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: String::new(),
            attributes: HashMap::new(),
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
}
