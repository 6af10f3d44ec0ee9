//! Capability descriptors

use serde::{Deserialize, Serialize};

/// Name and version of a registered capability
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapabilityInfo {
    pub name: String,
    pub version: String,
}
