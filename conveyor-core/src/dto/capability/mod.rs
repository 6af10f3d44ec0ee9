//! Capability DTOs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Arguments for a direct capability invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteCapability {
    #[serde(default)]
    pub args: HashMap<String, serde_json::Value>,
}

/// Result of a direct capability invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityOutput {
    pub name: String,
    pub result: serde_json::Value,
}
