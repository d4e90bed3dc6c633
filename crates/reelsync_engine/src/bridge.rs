//! Link discovery through an external helper process.
//!
//! The helper is invoked as `<program> [leading args...] <external_id>
//! <movie|tv> [extra args...]`, the leading args usually naming the script.
//! It prints one JSON object on its last stdout line:
//! `{"success": true, "links": [...], "count": n}` or
//! `{"success": false, "error": "..."}`.
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use reelsync_core::MediaType;
use reelsync_logging::{sync_debug, sync_warn};
use serde::Deserialize;
use tokio::process::Command;

use crate::collab::LinkDiscovery;
use crate::CollaboratorError;

pub const DEFAULT_BRIDGE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub program: PathBuf,
    /// Placed before the external id, e.g. the helper script.
    pub leading_args: Vec<String>,
    /// Placed after the media type, e.g. credentials.
    pub extra_args: Vec<String>,
    pub timeout: Duration,
}

impl BridgeSettings {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            extra_args: Vec::new(),
            timeout: DEFAULT_BRIDGE_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    success: bool,
    #[serde(default)]
    links: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct BridgeLinkDiscovery {
    settings: BridgeSettings,
}

impl BridgeLinkDiscovery {
    pub fn new(settings: BridgeSettings) -> Self {
        Self { settings }
    }

    fn command(&self, external_id: &str, media_type: MediaType) -> Command {
        let mut command = Command::new(&self.settings.program);
        command
            .args(&self.settings.leading_args)
            .arg(external_id)
            .arg(media_type.as_str())
            .args(&self.settings.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

/// The helper may log before answering; only the last JSON-looking line
/// counts.
fn parse_reply(stdout: &str) -> Option<Result<BridgeReply, serde_json::Error>> {
    stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| line.starts_with('{'))
        .map(serde_json::from_str)
}

#[async_trait::async_trait]
impl LinkDiscovery for BridgeLinkDiscovery {
    async fn discover_links(
        &self,
        external_id: &str,
        media_type: MediaType,
    ) -> Result<Vec<String>, CollaboratorError> {
        sync_debug!("bridge", "discovering links for {} ({})", external_id, media_type);
        let output = tokio::time::timeout(
            self.settings.timeout,
            self.command(external_id, media_type).output(),
        )
        .await
        .map_err(|_| CollaboratorError::Timeout(self.settings.timeout))?
        .map_err(|err| CollaboratorError::Process(err.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let reply = match parse_reply(&stdout) {
            Some(reply) => reply?,
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(CollaboratorError::Process(format!(
                    "{}: {}",
                    output.status,
                    stderr.trim()
                )));
            }
        };

        if !reply.success {
            let message = reply.error.unwrap_or_else(|| "unknown error".to_string());
            sync_warn!("bridge", "helper reported failure for {}: {}", external_id, message);
            return Err(CollaboratorError::Process(message));
        }
        Ok(reply.links)
    }
}
