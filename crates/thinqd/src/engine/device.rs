use serde::Deserialize;
use serde::Serialize;

/// Device-registry metadata an integration reports alongside its entities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// (domain, identifier) pairs; the first one names the device.
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub sw_version: Option<String>,
}

impl DeviceInfo {
    /// Registry key, `"{domain}.{identifier}"` of the first identifier.
    pub fn registry_id(&self) -> Option<String> {
        self.identifiers
            .first()
            .map(|(domain, id)| format!("{}.{}", domain, id))
    }
}

/// A device in the registry.
///
/// A device represents a physical appliance that contains one or more entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub info: DeviceInfo,
    pub entity_ids: Vec<String>,
}

impl Device {
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            entity_ids: Vec::new(),
        }
    }

    pub fn add_entity(&mut self, entity_id: String) {
        if !self.entity_ids.contains(&entity_id) {
            self.entity_ids.push(entity_id);
        }
    }
}
