//! Request handlers for the chunk endpoints.

use std::sync::Arc;

use parking_lot::RwLock;
use thnsync_protocol::{HasRequest, HasResponse, NegotiationResponse, PutResponse};
use thnsync_store::{validate_target, ChunkStore};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Counters kept by the handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    /// `has` queries answered.
    pub has_queries: u64,
    /// Chunks written by `put`.
    pub chunks_stored: u64,
    /// `put` calls for chunks already held.
    pub duplicate_puts: u64,
}

/// Handler for chunk requests.
pub struct RequestHandler {
    config: ServerConfig,
    store: Arc<dyn ChunkStore>,
    stats: RwLock<ServerStats>,
}

impl RequestHandler {
    /// Creates a handler over `store`.
    pub fn new(config: ServerConfig, store: Arc<dyn ChunkStore>) -> Self {
        Self {
            config,
            store,
            stats: RwLock::new(ServerStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<dyn ChunkStore> {
        &self.store
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> ServerStats {
        *self.stats.read()
    }

    fn check_target(&self, target: &str) -> ServerResult<()> {
        validate_target(target)?;
        if !self.config.accepts_target(target) {
            return Err(ServerError::UnknownTarget(target.to_string()));
        }
        Ok(())
    }

    /// Partitions the requested ids in request order.
    pub fn handle_has(&self, request: HasRequest) -> ServerResult<HasResponse> {
        self.check_target(&request.target)?;

        let mut has = Vec::new();
        let mut missing = Vec::new();
        for id in request.chunks {
            if self.store.contains(&request.target, &id)? {
                has.push(id);
            } else {
                missing.push(id);
            }
        }

        self.stats.write().has_queries += 1;
        debug!(
            sync_target = %request.target,
            has = has.len(),
            missing = missing.len(),
            "answered has query"
        );
        Ok(HasResponse::success(has, missing))
    }

    /// Verifies and stores one chunk.
    pub fn handle_put(&self, target: &str, chunk_id: &str, data: &[u8]) -> ServerResult<PutResponse> {
        self.check_target(target)?;
        if data.len() > self.config.max_chunk_bytes {
            return Err(ServerError::ChunkTooLarge {
                size: data.len(),
                max: self.config.max_chunk_bytes,
            });
        }

        if self.store.contains(target, chunk_id)? {
            self.stats.write().duplicate_puts += 1;
            debug!(sync_target = target, chunk_id, "chunk already stored");
            return Ok(PutResponse::stored(chunk_id));
        }

        self.store.insert(target, chunk_id, data)?;
        self.stats.write().chunks_stored += 1;
        info!(sync_target = target, chunk_id, bytes = data.len(), "stored chunk");
        Ok(PutResponse::stored(chunk_id))
    }

    /// Declares the server capabilities.
    pub fn handle_negotiation(&self) -> NegotiationResponse {
        NegotiationResponse {
            success: true,
            remote_version: self.config.remote_version.clone(),
            capabilities: self.config.capabilities(),
            targets: self.config.targets.clone(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thnsync_chunker::chunk_id;
    use thnsync_store::{InMemoryChunkStore, StoreError};

    fn handler() -> RequestHandler {
        RequestHandler::new(
            ServerConfig::default().with_max_chunk_bytes(64),
            Arc::new(InMemoryChunkStore::new()),
        )
    }

    #[test]
    fn has_preserves_request_order() {
        let h = handler();
        let stored = h.store().put("web", b"two").unwrap();
        let a = chunk_id(b"one");
        let c = chunk_id(b"three");

        let resp = h
            .handle_has(HasRequest::new("web", vec![a.clone(), stored.clone(), c.clone()]))
            .unwrap();
        assert_eq!(resp.has, vec![stored]);
        assert_eq!(resp.missing, vec![a, c]);
        assert_eq!(h.stats().has_queries, 1);
    }

    #[test]
    fn has_treats_malformed_ids_as_missing() {
        let h = handler();
        let resp = h
            .handle_has(HasRequest::new("web", vec!["../../etc".to_string()]))
            .unwrap();
        assert_eq!(resp.missing, vec!["../../etc"]);
    }

    #[test]
    fn unknown_target() {
        let h = handler();
        let err = h.handle_has(HasRequest::new("docs", vec![])).unwrap_err();
        assert!(matches!(err, ServerError::UnknownTarget(_)));
        let err = h.handle_has(HasRequest::new("../x", vec![])).unwrap_err();
        assert!(matches!(err, ServerError::Store(StoreError::InvalidTarget(_))));
    }

    #[test]
    fn put_verifies_hash() {
        let h = handler();
        let err = h.handle_put("web", &chunk_id(b"other"), b"data").unwrap_err();
        assert!(matches!(err, ServerError::Store(StoreError::HashMismatch { .. })));
        assert_eq!(h.stats().chunks_stored, 0);
    }

    #[test]
    fn put_is_idempotent() {
        let h = handler();
        let id = chunk_id(b"data");
        assert!(h.handle_put("web", &id, b"data").unwrap().success);
        assert!(h.handle_put("web", &id, b"data").unwrap().success);
        let stats = h.stats();
        assert_eq!(stats.chunks_stored, 1);
        assert_eq!(stats.duplicate_puts, 1);
        assert_eq!(h.store().get("web", &id).unwrap(), b"data");
    }

    #[test]
    fn put_enforces_size_limit() {
        let h = handler();
        let data = vec![7u8; 65];
        let err = h.handle_put("web", &chunk_id(&data), &data).unwrap_err();
        assert!(matches!(err, ServerError::ChunkTooLarge { size: 65, max: 64 }));
    }

    #[test]
    fn negotiation_declares_config() {
        let resp = handler().handle_negotiation();
        assert!(resp.success);
        assert_eq!(resp.targets, vec!["web"]);
        assert!(resp.capabilities.supports("raw-zip"));
    }
}
