//! Capability negotiation.
//!
//! Remotes without a negotiation endpoint are assumed to be conservative:
//! raw-zip only, no signatures, 32 MiB payloads, target `web`.

use serde::Serialize;
use thnsync_protocol::{Capabilities, NegotiationResponse, NEGOTIATION_PATH};
use tracing::{debug, warn};

use crate::error::{Diagnostic, DiagnosticKind, SoftResult};
use crate::http::HttpClient;
use crate::negotiator::ChunkNegotiator;

const RAW_ZIP: &str = "raw-zip";
const CDC_DELTA: &str = "cdc-delta";

/// Mode chosen for an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeDecision {
    /// Whether an upload can proceed.
    pub ok: bool,
    /// Mode to use when `ok`.
    pub mode: Option<String>,
    /// Explanation of a downgrade or refusal.
    pub reason: Option<String>,
}

impl<C: HttpClient> ChunkNegotiator<C> {
    /// Fetches the remote capabilities.
    ///
    /// Falls back to [`NegotiationResponse::fallback`] when the endpoint is
    /// unreachable or answers with something unusable.
    pub fn negotiate_capabilities(&self) -> NegotiationResponse {
        match self.try_capabilities() {
            Ok(response) => {
                debug!(
                    remote_version = %response.remote_version,
                    modes = ?response.capabilities.modes,
                    "remote capabilities"
                );
                response
            }
            Err(diagnostic) => {
                warn!(error = %diagnostic, "capability negotiation fell back to defaults");
                self.record(&diagnostic);
                NegotiationResponse::fallback(diagnostic.message)
            }
        }
    }

    fn try_capabilities(&self) -> SoftResult<NegotiationResponse> {
        let unavailable = || {
            Diagnostic::new(
                DiagnosticKind::Http,
                "Remote host did not provide negotiation endpoint",
            )
        };
        let response = self
            .client()
            .get(&self.config().endpoint(NEGOTIATION_PATH))
            .map_err(|_| unavailable())?;
        if !response.is_success() {
            return Err(unavailable());
        }
        let value: serde_json::Value = serde_json::from_slice(&response.body).map_err(|_| {
            Diagnostic::invalid_response("Negotiation endpoint returned non-JSON response")
        })?;
        if !value.is_object() {
            return Err(Diagnostic::invalid_response(
                "Negotiation endpoint returned invalid structure",
            ));
        }
        serde_json::from_value(value).map_err(|_| {
            Diagnostic::invalid_response("Negotiation endpoint returned invalid structure")
        })
    }
}

/// Picks the upload mode for `desired` given the remote capabilities.
///
/// `cdc-delta` is downgraded to `raw-zip` when the remote only supports the
/// latter; anything else unsupported is refused.
pub fn ensure_mode_supported(capabilities: &Capabilities, desired: &str) -> ModeDecision {
    if capabilities.supports(desired) {
        return ModeDecision {
            ok: true,
            mode: Some(desired.to_string()),
            reason: None,
        };
    }
    if desired == CDC_DELTA && capabilities.supports(RAW_ZIP) {
        return ModeDecision {
            ok: true,
            mode: Some(RAW_ZIP.to_string()),
            reason: Some("Remote does not support cdc-delta; falling back to raw-zip".to_string()),
        };
    }
    ModeDecision {
        ok: false,
        mode: None,
        reason: Some(format!("Remote does not support mode '{desired}'")),
    }
}

/// Refuses payloads larger than the remote accepts.
pub fn check_payload_size(capabilities: &Capabilities, payload_bytes: u64) -> SoftResult<()> {
    if payload_bytes > capabilities.max_payload_bytes {
        return Err(Diagnostic::new(
            DiagnosticKind::Rejected,
            format!(
                "Payload of {payload_bytes} bytes exceeds remote limit of {} bytes",
                capabilities.max_payload_bytes
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NegotiatorConfig;
    use crate::http::HttpResponse;

    struct Fixed(Result<HttpResponse, String>);

    impl HttpClient for Fixed {
        fn post(&self, _: &str, _: &[(&str, &str)], _: Vec<u8>) -> Result<HttpResponse, String> {
            Err("unused".to_string())
        }

        fn get(&self, _: &str) -> Result<HttpResponse, String> {
            self.0.clone()
        }
    }

    fn capabilities_from(result: Result<HttpResponse, String>) -> NegotiationResponse {
        ChunkNegotiator::new(NegotiatorConfig::new("http://remote"), Fixed(result))
            .negotiate_capabilities()
    }

    fn caps(modes: &[&str]) -> Capabilities {
        Capabilities {
            modes: modes.iter().map(|m| m.to_string()).collect(),
            ..Capabilities::default()
        }
    }

    #[test]
    fn reads_declared_capabilities() {
        let resp = capabilities_from(Ok(HttpResponse::new(
            200,
            br#"{"remote_version": "2.1", "capabilities": {"modes": ["raw-zip", "cdc-delta"], "max_payload_bytes": 1024}, "targets": ["web", "docs"]}"#.to_vec(),
        )));
        assert!(resp.success);
        assert_eq!(resp.remote_version, "2.1");
        assert!(resp.capabilities.supports("cdc-delta"));
        assert_eq!(resp.capabilities.max_payload_bytes, 1024);
        assert_eq!(resp.targets, vec!["web", "docs"]);
    }

    #[test]
    fn missing_endpoint_falls_back() {
        let resp = capabilities_from(Ok(HttpResponse::new(404, Vec::new())));
        assert!(!resp.success);
        assert_eq!(resp.targets, vec!["web"]);
        assert_eq!(
            resp.error.as_deref(),
            Some("Remote host did not provide negotiation endpoint")
        );

        let resp = capabilities_from(Err("refused".to_string()));
        assert_eq!(
            resp.error.as_deref(),
            Some("Remote host did not provide negotiation endpoint")
        );
    }

    #[test]
    fn malformed_bodies_fall_back() {
        let resp = capabilities_from(Ok(HttpResponse::new(200, b"nope".to_vec())));
        assert_eq!(
            resp.error.as_deref(),
            Some("Negotiation endpoint returned non-JSON response")
        );
        let resp = capabilities_from(Ok(HttpResponse::new(200, b"[1, 2]".to_vec())));
        assert_eq!(
            resp.error.as_deref(),
            Some("Negotiation endpoint returned invalid structure")
        );
        assert_eq!(resp.capabilities.modes, vec!["raw-zip"]);
    }

    #[test]
    fn mode_selection() {
        let both = caps(&["raw-zip", "cdc-delta"]);
        let decision = ensure_mode_supported(&both, "cdc-delta");
        assert!(decision.ok);
        assert_eq!(decision.mode.as_deref(), Some("cdc-delta"));
        assert!(decision.reason.is_none());

        let raw_only = caps(&["raw-zip"]);
        let decision = ensure_mode_supported(&raw_only, "cdc-delta");
        assert!(decision.ok);
        assert_eq!(decision.mode.as_deref(), Some("raw-zip"));
        assert!(decision.reason.is_some());

        let cdc_only = caps(&["cdc-delta"]);
        let decision = ensure_mode_supported(&cdc_only, "raw-zip");
        assert!(!decision.ok);
        assert!(decision.mode.is_none());
    }

    #[test]
    fn payload_limit() {
        let limits = Capabilities {
            max_payload_bytes: 10,
            ..Capabilities::default()
        };
        assert!(check_payload_size(&limits, 10).is_ok());
        let err = check_payload_size(&limits, 11).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Rejected);
    }
}
