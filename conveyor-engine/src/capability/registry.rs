use std::collections::HashMap;
use std::sync::Arc;

use conveyor_core::domain::capability::CapabilityInfo;
use thiserror::Error;

use super::Capability;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("capability '{0}' is already registered")]
    Duplicate(String),
}

/// Name -> capability lookup table
///
/// Filled before the engine starts and read-only afterwards, so lookups need
/// no locking.
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability under its own name
    ///
    /// # Errors
    /// Returns `RegistryError::Duplicate` if the name is already taken
    pub fn register<C: Capability + 'static>(&mut self, capability: C) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(capability))
    }

    pub fn register_arc(&mut self, capability: Arc<dyn Capability>) -> Result<(), RegistryError> {
        let name = capability.name().to_string();
        if self.capabilities.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        tracing::debug!("Registered capability {} v{}", name, capability.version());
        self.capabilities.insert(name, capability);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).cloned()
    }

    /// Registered capabilities sorted by name
    pub fn list(&self) -> Vec<CapabilityInfo> {
        let mut infos: Vec<CapabilityInfo> = self
            .capabilities
            .values()
            .map(|c| CapabilityInfo {
                name: c.name().to_string(),
                version: c.version().to_string(),
            })
            .collect();
        infos.sort();
        infos
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
