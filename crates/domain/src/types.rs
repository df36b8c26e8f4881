//! Domain data types for device state reporting

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque identifier for a device in the remote graph.
pub type DeviceId = String;

/// A batch of per-device state deltas.
///
/// Maps a device id to a partial state object containing only the fields
/// that changed (e.g. `{"on": true}` for a light that was switched on).
/// The shape of each state object is owned by the device data model and is
/// carried here as opaque JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateChanges(HashMap<DeviceId, Value>);

impl StateChanges {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the changed state fields for a device.
    pub fn insert(&mut self, device_id: impl Into<DeviceId>, state: Value) {
        self.0.insert(device_id.into(), state);
    }

    /// True when no device has pending changes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of devices with pending changes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(device id, partial state)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&DeviceId, &Value)> {
        self.0.iter()
    }
}

impl From<HashMap<DeviceId, Value>> for StateChanges {
    fn from(map: HashMap<DeviceId, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(DeviceId, Value)> for StateChanges {
    fn from_iter<I: IntoIterator<Item = (DeviceId, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
