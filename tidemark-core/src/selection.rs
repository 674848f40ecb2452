/// Query selections
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Describes which devices and sensors a query targets.
///
/// Selections are passed through to the backend verbatim, so the type is a
/// thin wrapper over a JSON tree rather than a closed enum: the filter
/// grammar can grow server-side without a client release. The constructors
/// cover the common cases; [`Selection::raw`] accepts anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(Value);

impl Selection {
    /// Match every device.
    pub fn all_devices() -> Self {
        Self(json!({"devices": "all"}))
    }

    /// Match a single device by key.
    pub fn device_key(key: impl Into<String>) -> Self {
        Self(json!({"devices": {"key": key.into()}}))
    }

    /// Match devices carrying an attribute key/value pair.
    pub fn device_attribute(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self(json!({"devices": {"attributes": {key.into(): value.into()}}}))
    }

    /// Match devices that have an attribute key, regardless of its value.
    pub fn device_attribute_key(key: impl Into<String>) -> Self {
        Self(json!({"devices": {"attribute_key": key.into()}}))
    }

    /// Match a single sensor by key, across all selected devices.
    pub fn sensor_key(key: impl Into<String>) -> Self {
        Self(json!({"sensors": {"key": key.into()}}))
    }

    /// Match sensors carrying an attribute key/value pair.
    pub fn sensor_attribute(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self(json!({"sensors": {"attributes": {key.into(): value.into()}}}))
    }

    /// Use an arbitrary filter tree verbatim.
    pub fn raw(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying filter tree.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
