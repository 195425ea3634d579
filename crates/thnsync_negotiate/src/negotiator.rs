//! Chunk negotiation and upload.

use std::collections::{BTreeMap, HashSet};

use parking_lot::RwLock;
use serde::Serialize;
use thnsync_protocol::{
    HasRequest, HasResponse, PutResponse, CONTENT_TYPE_JSON, CONTENT_TYPE_OCTET_STREAM,
    HAS_PATH, HEADER_CHUNK_ID, HEADER_TARGET, PUT_PATH,
};
use tracing::{debug, info, warn};

use crate::config::NegotiatorConfig;
use crate::error::{Diagnostic, DiagnosticKind, SoftResult};
use crate::http::HttpClient;

/// Outcome of a `has` query.
///
/// Always fully populated: on failure `has` and `missing` are empty lists
/// and `error` carries the reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NegotiationResult {
    /// Whether the remote answered with a usable body.
    pub success: bool,
    /// Ids the remote reports as held.
    pub has: Vec<String>,
    /// Ids the remote reports as missing.
    pub missing: Vec<String>,
    /// Failure description.
    pub error: Option<String>,
}

impl NegotiationResult {
    fn failure(diagnostic: &Diagnostic) -> Self {
        Self {
            success: false,
            has: Vec::new(),
            missing: Vec::new(),
            error: Some(diagnostic.message.clone()),
        }
    }
}

/// Split of a local chunk list against what the remote holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Partition {
    /// Ids the remote already holds, in input order.
    pub present: Vec<String>,
    /// Ids that must be transferred, in input order.
    pub missing: Vec<String>,
}

/// Places every id of `chunk_ids` into exactly one of `present` or
/// `missing`, preserving input order.
///
/// Ids in `remote_has` that were not asked about are ignored.
pub fn partition(chunk_ids: &[String], remote_has: &[String]) -> Partition {
    let known: HashSet<&str> = remote_has.iter().map(String::as_str).collect();
    let mut result = Partition::default();
    for id in chunk_ids {
        if known.contains(id.as_str()) {
            result.present.push(id.clone());
        } else {
            result.missing.push(id.clone());
        }
    }
    result
}

/// Result of a negotiation round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Negotiation {
    /// Raw query outcome.
    pub result: NegotiationResult,
    /// Partition of the local ids.
    pub partition: Partition,
    /// True when the query failed and every chunk was marked missing.
    pub fallback: bool,
}

/// Outcome of a single chunk upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// Uploaded chunk.
    pub chunk_id: String,
    /// Whether the remote stored the chunk.
    pub success: bool,
    /// Failure description.
    pub error: Option<String>,
}

/// Summary of [`ChunkNegotiator::sync_chunks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkSyncReport {
    /// Target namespace.
    pub target: String,
    /// Negotiation round that decided what to upload.
    pub negotiation: Negotiation,
    /// Chunks uploaded successfully.
    pub uploaded: Vec<String>,
    /// Chunks whose upload failed.
    pub failed: Vec<UploadResult>,
}

impl ChunkSyncReport {
    /// Returns true if every missing chunk reached the remote.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of chunks skipped because the remote held them.
    pub fn skipped(&self) -> usize {
        self.negotiation.partition.present.len()
    }
}

/// Client for the chunk negotiation protocol.
///
/// Every public operation is a soft boundary: failures are reported in the
/// returned value and the most recent one is kept in [`last_error`].
///
/// [`last_error`]: ChunkNegotiator::last_error
pub struct ChunkNegotiator<C: HttpClient> {
    config: NegotiatorConfig,
    client: C,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> ChunkNegotiator<C> {
    /// Creates a negotiator.
    pub fn new(config: NegotiatorConfig, client: C) -> Self {
        Self {
            config,
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &NegotiatorConfig {
        &self.config
    }

    /// Returns the HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the most recent failure message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    pub(crate) fn record(&self, diagnostic: &Diagnostic) {
        *self.last_error.write() = Some(diagnostic.message.clone());
    }

    /// Asks the remote which of `chunk_ids` it holds for `target`.
    pub fn query_remote(&self, target: &str, chunk_ids: &[String]) -> NegotiationResult {
        match self.try_query(target, chunk_ids) {
            Ok(response) => NegotiationResult {
                success: true,
                has: response.has,
                missing: response.missing,
                error: None,
            },
            Err(diagnostic) => {
                warn!(sync_target = target, error = %diagnostic, "chunk query failed");
                self.record(&diagnostic);
                NegotiationResult::failure(&diagnostic)
            }
        }
    }

    fn try_query(&self, target: &str, chunk_ids: &[String]) -> SoftResult<HasResponse> {
        let request = HasRequest::new(target, chunk_ids.to_vec());
        let body = serde_json::to_vec(&request)
            .map_err(|e| Diagnostic::new(DiagnosticKind::Rejected, e.to_string()))?;

        let response = self
            .client
            .post(
                &self.config.endpoint(HAS_PATH),
                &[("Content-Type", CONTENT_TYPE_JSON)],
                body,
            )
            .map_err(Diagnostic::network)?;
        if !response.is_success() {
            return Err(Diagnostic::http(response.status));
        }

        let value: serde_json::Value = serde_json::from_slice(&response.body)
            .map_err(|_| Diagnostic::invalid_response("Non-JSON response from remote host"))?;
        let parsed: HasResponse = serde_json::from_value(value).map_err(|_| {
            Diagnostic::invalid_response("Invalid response structure from remote host")
        })?;
        if !parsed.is_success() {
            let message = parsed
                .error
                .unwrap_or_else(|| "Remote reported failure".to_string());
            return Err(Diagnostic::remote(message));
        }
        Ok(parsed)
    }

    /// Queries the remote and partitions `chunk_ids`.
    ///
    /// If the query fails every id is treated as missing.
    pub fn negotiate(&self, target: &str, chunk_ids: &[String]) -> Negotiation {
        let result = self.query_remote(target, chunk_ids);
        if result.success {
            let partition = partition(chunk_ids, &result.has);
            debug!(
                sync_target = target,
                present = partition.present.len(),
                missing = partition.missing.len(),
                "negotiated chunks"
            );
            Negotiation {
                result,
                partition,
                fallback: false,
            }
        } else {
            warn!(
                sync_target = target,
                chunks = chunk_ids.len(),
                "negotiation unavailable, uploading every chunk"
            );
            Negotiation {
                result,
                partition: Partition {
                    present: Vec::new(),
                    missing: chunk_ids.to_vec(),
                },
                fallback: true,
            }
        }
    }

    /// Uploads one chunk.
    pub fn upload_chunk(&self, target: &str, chunk_id: &str, data: &[u8]) -> UploadResult {
        match self.try_upload(target, chunk_id, data) {
            Ok(()) => UploadResult {
                chunk_id: chunk_id.to_string(),
                success: true,
                error: None,
            },
            Err(diagnostic) => {
                warn!(sync_target = target, chunk_id, error = %diagnostic, "chunk upload failed");
                self.record(&diagnostic);
                UploadResult {
                    chunk_id: chunk_id.to_string(),
                    success: false,
                    error: Some(diagnostic.message),
                }
            }
        }
    }

    fn try_upload(&self, target: &str, chunk_id: &str, data: &[u8]) -> SoftResult<()> {
        let headers = [
            ("Content-Type", CONTENT_TYPE_OCTET_STREAM),
            (HEADER_TARGET, target),
            (HEADER_CHUNK_ID, chunk_id),
        ];
        let response = self
            .client
            .post(&self.config.endpoint(PUT_PATH), &headers, data.to_vec())
            .map_err(Diagnostic::network)?;

        let parsed: Option<PutResponse> = serde_json::from_slice(&response.body).ok();
        if !response.is_success() {
            return Err(match parsed.and_then(|p| p.error) {
                Some(error) => Diagnostic::new(
                    DiagnosticKind::Http,
                    format!("HTTPError: HTTP {}: {error}", response.status),
                ),
                None => Diagnostic::http(response.status),
            });
        }
        let parsed = parsed
            .ok_or_else(|| Diagnostic::invalid_response("Remote returned non-JSON response"))?;
        if !parsed.success {
            let message = parsed
                .error
                .unwrap_or_else(|| "Remote rejected chunk".to_string());
            return Err(Diagnostic::remote(message));
        }
        Ok(())
    }

    /// Negotiates `chunks` with the remote and uploads the missing ones.
    ///
    /// Never fails; per-chunk failures are collected in the report.
    pub fn sync_chunks(&self, target: &str, chunks: &BTreeMap<String, Vec<u8>>) -> ChunkSyncReport {
        let ids: Vec<String> = chunks.keys().cloned().collect();
        let negotiation = self.negotiate(target, &ids);

        let mut uploaded = Vec::new();
        let mut failed = Vec::new();
        for id in &negotiation.partition.missing {
            let Some(data) = chunks.get(id) else {
                continue;
            };
            let result = self.upload_chunk(target, id, data);
            if result.success {
                uploaded.push(result.chunk_id);
            } else {
                failed.push(result);
            }
        }

        info!(
            sync_target = target,
            skipped = negotiation.partition.present.len(),
            uploaded = uploaded.len(),
            failed = failed.len(),
            "chunk sync finished"
        );
        ChunkSyncReport {
            target: target.to_string(),
            negotiation,
            uploaded,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use parking_lot::Mutex;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    struct ScriptedClient {
        response: Mutex<Result<HttpResponse, String>>,
        requests: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl ScriptedClient {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                response: Mutex::new(Ok(HttpResponse::new(status, body.as_bytes().to_vec()))),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: &str) -> Self {
            Self {
                response: Mutex::new(Err(error.to_string())),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for ScriptedClient {
        fn post(
            &self,
            url: &str,
            _headers: &[(&str, &str)],
            body: Vec<u8>,
        ) -> Result<HttpResponse, String> {
            self.requests.lock().push((url.to_string(), body));
            self.response.lock().clone()
        }

        fn get(&self, url: &str) -> Result<HttpResponse, String> {
            self.requests.lock().push((url.to_string(), Vec::new()));
            self.response.lock().clone()
        }
    }

    fn negotiator(client: ScriptedClient) -> ChunkNegotiator<ScriptedClient> {
        ChunkNegotiator::new(NegotiatorConfig::new("http://remote"), client)
    }

    #[test]
    fn partition_example() {
        let split = partition(&ids(&["a", "b", "c"]), &ids(&["b"]));
        assert_eq!(split.present, ids(&["b"]));
        assert_eq!(split.missing, ids(&["a", "c"]));
    }

    #[test]
    fn partition_ignores_unrequested() {
        let split = partition(&ids(&["a"]), &ids(&["z", "a"]));
        assert_eq!(split.present, ids(&["a"]));
        assert!(split.missing.is_empty());
    }

    #[test]
    fn query_success() {
        let n = negotiator(ScriptedClient::answering(
            200,
            r#"{"has": ["b"], "missing": ["a"], "extra": 1}"#,
        ));
        let result = n.query_remote("web", &ids(&["a", "b"]));
        assert!(result.success);
        assert_eq!(result.has, ids(&["b"]));
        assert_eq!(result.missing, ids(&["a"]));
        assert_eq!(result.error, None);

        let requests = n.client().requests.lock();
        assert_eq!(requests[0].0, "http://remote/sync/chunks/has");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].1).unwrap();
        assert_eq!(body, serde_json::json!({"target": "web", "chunks": ["a", "b"]}));
    }

    #[test]
    fn query_non_json() {
        let n = negotiator(ScriptedClient::answering(200, "<html>"));
        let result = n.query_remote("web", &ids(&["a"]));
        assert!(!result.success);
        assert!(result.has.is_empty());
        assert!(result.missing.is_empty());
        assert_eq!(result.error.as_deref(), Some("Non-JSON response from remote host"));
        assert_eq!(n.last_error().as_deref(), Some("Non-JSON response from remote host"));
    }

    #[test]
    fn query_wrong_shape() {
        let n = negotiator(ScriptedClient::answering(200, r#"{"has": "a"}"#));
        let result = n.query_remote("web", &ids(&["a"]));
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Invalid response structure from remote host")
        );
    }

    #[test]
    fn query_http_error() {
        let n = negotiator(ScriptedClient::answering(500, "{}"));
        let result = n.query_remote("web", &ids(&["a"]));
        assert_eq!(result.error.as_deref(), Some("HTTPError: HTTP 500"));
    }

    #[test]
    fn query_network_error() {
        let n = negotiator(ScriptedClient::failing("connection refused"));
        let result = n.query_remote("web", &ids(&["a"]));
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Network error: connection refused")
        );
    }

    #[test]
    fn query_remote_failure_flag() {
        let n = negotiator(ScriptedClient::answering(
            200,
            r#"{"success": false, "error": "unknown target"}"#,
        ));
        let result = n.query_remote("web", &ids(&["a"]));
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("unknown target"));
    }

    #[test]
    fn negotiate_falls_back_to_everything() {
        let n = negotiator(ScriptedClient::failing("timed out"));
        let round = n.negotiate("web", &ids(&["a", "b"]));
        assert!(round.fallback);
        assert!(round.partition.present.is_empty());
        assert_eq!(round.partition.missing, ids(&["a", "b"]));
    }

    #[test]
    fn negotiate_is_deterministic() {
        let n = negotiator(ScriptedClient::answering(200, r#"{"has": ["c", "a"]}"#));
        let first = n.negotiate("web", &ids(&["a", "b", "c"]));
        let second = n.negotiate("web", &ids(&["a", "b", "c"]));
        assert_eq!(first, second);
        assert_eq!(first.partition.present, ids(&["a", "c"]));
    }

    #[test]
    fn upload_success() {
        let n = negotiator(ScriptedClient::answering(200, r#"{"success": true}"#));
        let result = n.upload_chunk("web", "abc", b"data");
        assert!(result.success);
        assert_eq!(result.chunk_id, "abc");
        let requests = n.client().requests.lock();
        assert_eq!(requests[0].0, "http://remote/sync/chunks/put");
        assert_eq!(requests[0].1, b"data".to_vec());
    }

    #[test]
    fn upload_non_json() {
        let n = negotiator(ScriptedClient::answering(200, "OK"));
        let result = n.upload_chunk("web", "abc", b"data");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Remote returned non-JSON response"));
    }

    #[test]
    fn upload_error_status_carries_remote_message() {
        let n = negotiator(ScriptedClient::answering(
            413,
            r#"{"success": false, "error": "chunk too large"}"#,
        ));
        let result = n.upload_chunk("web", "abc", b"data");
        assert_eq!(
            result.error.as_deref(),
            Some("HTTPError: HTTP 413: chunk too large")
        );
    }

    #[test]
    fn upload_rejected() {
        let n = negotiator(ScriptedClient::answering(200, r#"{"success": false}"#));
        let result = n.upload_chunk("web", "abc", b"data");
        assert_eq!(result.error.as_deref(), Some("Remote rejected chunk"));
    }

    #[test]
    fn sync_reports_failures_without_failing() {
        let n = negotiator(ScriptedClient::failing("down"));
        let mut chunks = BTreeMap::new();
        chunks.insert("a".to_string(), b"1".to_vec());
        chunks.insert("b".to_string(), b"2".to_vec());

        let report = n.sync_chunks("web", &chunks);
        assert!(report.negotiation.fallback);
        assert!(!report.is_complete());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.skipped(), 0);
        // one query plus two uploads
        assert_eq!(n.client().requests.lock().len(), 3);
    }
}
