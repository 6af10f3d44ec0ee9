//! Subprocess capabilities
//!
//! An external executable acting as a capability. Each invocation spawns the
//! program, writes `{"args": {...}}` as JSON to its stdin and expects exactly
//! one JSON object on stdout:
//!
//! ```text
//! {"result": <any JSON value>}   success
//! {"error": "<message>"}         failure
//! ```
//!
//! A non-zero exit status or unparsable output is a failure as well.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::{Capability, CapabilityArgs, CapabilityError};

const VERSION_SUFFIX: &str = "version";
const UNKNOWN_VERSION: &str = "0.0.0";

#[derive(Serialize)]
struct Request<'a> {
    args: &'a CapabilityArgs,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct ProcessCapability {
    name: String,
    version: String,
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessCapability {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version: UNKNOWN_VERSION.to_string(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Fixed arguments passed to the program on every invocation
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl Capability for ProcessCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    async fn execute(&self, args: CapabilityArgs) -> Result<serde_json::Value, CapabilityError> {
        let request = serde_json::to_vec(&Request { args: &args })
            .map_err(|e| CapabilityError::InvalidArguments(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Output has to be drained while the request is still being written
        let stdin = child.stdin.take();
        let write_request = async move {
            let Some(mut stdin) = stdin else {
                return Ok::<(), io::Error>(());
            };
            match stdin.write_all(&request).await {
                // A program that ignores its input may exit before reading it
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
        };

        let (written, output) = tokio::join!(write_request, child.wait_with_output());
        let output = output?;
        written?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CapabilityError::Failed(format!(
                "{} exited with {}: {}",
                self.name,
                output.status,
                stderr.trim()
            )));
        }

        let response: Response = serde_json::from_slice(&output.stdout).map_err(|e| {
            CapabilityError::Protocol(format!("invalid response from {}: {}", self.name, e))
        })?;

        debug!("Capability {} returned", self.name);
        match response.error {
            Some(message) => Err(CapabilityError::Failed(message)),
            None => Ok(response.result.unwrap_or(serde_json::Value::Null)),
        }
    }
}

/// Find every executable in `dir` and wrap it as a capability
///
/// The capability name is the file stem; an optional `<name>.version` file
/// next to it supplies the version. Results are sorted by name.
pub async fn discover(dir: &Path) -> io::Result<Vec<ProcessCapability>> {
    let mut found = Vec::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let metadata = entry.metadata().await?;
        if !metadata.is_file() || !is_executable(&metadata) {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some(VERSION_SUFFIX) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|n| n.to_str()) else {
            continue;
        };

        let version_file = dir.join(format!("{}.{}", name, VERSION_SUFFIX));
        let version = match fs::read_to_string(&version_file).await {
            Ok(v) => v.trim().to_string(),
            Err(_) => UNKNOWN_VERSION.to_string(),
        };

        found.push(ProcessCapability::new(name, &path).with_version(version));
    }

    found.sort_by(|a, b| a.name.cmp(&b.name));
    info!("Discovered {} capability program(s) in {:?}", found.len(), dir);
    Ok(found)
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        path
    }

    fn via_sh(name: &str, path: &Path) -> ProcessCapability {
        ProcessCapability::new(name, "/bin/sh").with_args([path.to_string_lossy().to_string()])
    }

    #[tokio::test]
    async fn test_result_response() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "wrap", r#"input=$(cat); printf '{"result": %s}' "$input""#);

        let mut args = CapabilityArgs::new();
        args.insert("key".to_string(), serde_json::json!("value"));

        let value = via_sh("wrap", &path).execute(args).await.unwrap();
        assert_eq!(value["args"]["key"], "value");
    }

    #[tokio::test]
    async fn test_large_request_to_streaming_program() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "stream", r#"printf '{"result": '; cat; printf '}'"#);

        let blob = "x".repeat(200_000);
        let mut args = CapabilityArgs::new();
        args.insert("blob".to_string(), serde_json::json!(blob));

        let value = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            via_sh("stream", &path).execute(args),
        )
        .await
        .expect("capability stalled")
        .unwrap();
        assert_eq!(value["args"]["blob"].as_str().map(str::len), Some(200_000));
    }

    #[tokio::test]
    async fn test_error_response() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "fail", r#"cat >/dev/null; printf '{"error": "boom"}'"#);

        let err = via_sh("fail", &path)
            .execute(CapabilityArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Failed(ref m) if m == "boom"));
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "crash", "cat >/dev/null; echo oops >&2; exit 3");

        let err = via_sh("crash", &path)
            .execute(CapabilityArgs::new())
            .await
            .unwrap_err();
        match err {
            CapabilityError::Failed(message) => assert!(message.contains("oops")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_output() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "garbage", "cat >/dev/null; echo not-json");

        let err = via_sh("garbage", &path)
            .execute(CapabilityArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_discover_executables() {
        let dir = TempDir::new().unwrap();
        let greet = script(&dir, "greet.sh", "echo '{}'");
        std::fs::set_permissions(&greet, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::fs::write(dir.path().join("greet.version"), "1.2.0\n").unwrap();
        script(&dir, "notes", "not executable");

        let found = discover(dir.path()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "greet");
        assert_eq!(found[0].version(), "1.2.0");
        assert_eq!(found[0].program(), greet.as_path());
    }
}
