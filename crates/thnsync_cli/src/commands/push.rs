//! Push command implementation.

use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use thnsync_manifest::{Envelope, ManifestMode};
use thnsync_negotiate::{
    check_payload_size, ensure_mode_supported, ChunkNegotiator, ChunkSyncReport, ModeDecision,
    NegotiatorConfig, UreqClient,
};
use tracing::{info, warn};

use crate::error::{CliError, CliResult};
use crate::output::emit;

/// Push result.
#[derive(Debug, Serialize)]
pub struct PushResult {
    /// Remote base URL.
    pub url: String,
    /// Target namespace.
    pub target: String,
    /// Remote software version.
    pub remote_version: String,
    /// Mode decision.
    pub mode: ModeDecision,
    /// Bytes of chunk data offered.
    pub payload_bytes: u64,
    /// Chunk sync outcome, absent when the push was refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<ChunkSyncReport>,
    /// Why the push was refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the push command.
pub fn run(
    path: &Path,
    url: &str,
    target: Option<String>,
    timeout_secs: u64,
    json: bool,
) -> CliResult<bool> {
    let envelope = Envelope::read_from(path)?;
    if envelope.manifest.mode() != ManifestMode::CdcDelta {
        return Err(CliError::usage("push requires a cdc-delta envelope"));
    }
    let target = target
        .or_else(|| envelope.manifest.target().map(str::to_string))
        .unwrap_or_else(|| "web".to_string());

    let config = NegotiatorConfig::new(url).with_timeout(Duration::from_secs(timeout_secs));
    let client = UreqClient::new(&config);
    let negotiator = ChunkNegotiator::new(config, client);

    let remote = negotiator.negotiate_capabilities();
    let decision = ensure_mode_supported(&remote.capabilities, ManifestMode::CdcDelta.as_str());
    let payload_bytes: u64 = envelope.chunks.values().map(|c| c.len() as u64).sum();

    let mut result = PushResult {
        url: url.to_string(),
        target: target.clone(),
        remote_version: remote.remote_version,
        mode: decision.clone(),
        payload_bytes,
        sync: None,
        error: None,
    };

    let refusal = if decision.mode.as_deref() != Some(ManifestMode::CdcDelta.as_str()) {
        Some(
            decision
                .reason
                .unwrap_or_else(|| "Remote does not accept cdc-delta".to_string()),
        )
    } else {
        check_payload_size(&remote.capabilities, payload_bytes)
            .err()
            .map(|d| d.message)
    };

    match refusal {
        Some(reason) => {
            warn!(url, sync_target = %target, reason = %reason, "push refused");
            result.error = Some(reason);
        }
        None => {
            let report = negotiator.sync_chunks(&target, &envelope.chunks);
            info!(
                sync_target = %target,
                uploaded = report.uploaded.len(),
                skipped = report.skipped(),
                failed = report.failed.len(),
                "push finished"
            );
            result.sync = Some(report);
        }
    }

    emit(json, &result, render)?;
    Ok(result.sync.as_ref().is_some_and(ChunkSyncReport::is_complete))
}

fn render(result: &PushResult) -> String {
    match (&result.sync, &result.error) {
        (Some(sync), _) => {
            let mut out = format!(
                "{} [{}]: uploaded {}, skipped {}, failed {}",
                result.url,
                result.target,
                sync.uploaded.len(),
                sync.skipped(),
                sync.failed.len()
            );
            if sync.negotiation.fallback {
                out.push_str(" (negotiation failed; uploaded everything)");
            }
            for failure in &sync.failed {
                out.push_str(&format!(
                    "\n  {}: {}",
                    failure.chunk_id,
                    failure.error.as_deref().unwrap_or("upload failed")
                ));
            }
            out
        }
        (None, Some(error)) => format!("{} [{}]: refused: {error}", result.url, result.target),
        (None, None) => format!("{} [{}]: nothing to do", result.url, result.target),
    }
}
