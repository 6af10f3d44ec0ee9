//! Capabilities
//!
//! A capability is a named unit of work invoked with a key/value argument map,
//! used by jobs as an alternative to running an external command. The engine
//! only looks capabilities up by name in a [`CapabilityRegistry`]; how they get
//! there is up to whoever builds the registry.

mod builtin;
mod process;
mod registry;

pub use builtin::EchoCapability;
pub use process::{ProcessCapability, discover};
pub use registry::{CapabilityRegistry, RegistryError};

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Arguments passed to a capability
pub type CapabilityArgs = HashMap<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Executable unit registered under a unique name
///
/// Implementations must be safe to invoke concurrently from several workers.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Unique name jobs use to select this capability
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "0.1.0"
    }

    async fn execute(&self, args: CapabilityArgs) -> Result<serde_json::Value, CapabilityError>;
}
