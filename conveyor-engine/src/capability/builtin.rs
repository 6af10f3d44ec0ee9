//! Capabilities compiled into the engine

use async_trait::async_trait;

use super::{Capability, CapabilityArgs, CapabilityError};

/// Returns its arguments as a JSON object
pub struct EchoCapability;

#[async_trait]
impl Capability for EchoCapability {
    fn name(&self) -> &str {
        "echo"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn execute(&self, args: CapabilityArgs) -> Result<serde_json::Value, CapabilityError> {
        Ok(serde_json::Value::Object(args.into_iter().collect()))
    }
}
