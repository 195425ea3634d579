//! Request routing.

use std::sync::Arc;

use serde_json::json;
use thnsync_protocol::{
    HasRequest, CONTENT_TYPE_JSON, HAS_PATH, HEADER_CHUNK_ID, HEADER_TARGET, NEGOTIATION_PATH,
    PUT_PATH,
};
use thnsync_store::ChunkStore;
use tracing::warn;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{RequestHandler, ServerStats};

/// A request as received from the transport.
#[derive(Debug, Clone, Default)]
pub struct ServerRequest {
    /// HTTP method, upper case.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Vec<u8>,
}

impl ServerRequest {
    /// Creates a POST request.
    pub fn post(path: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: "POST".to_string(),
            path: path.into(),
            headers: Vec::new(),
            body,
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Looks up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response to hand back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerResponse {
    /// HTTP status code.
    pub status: u16,
    /// Content type of the body.
    pub content_type: &'static str,
    /// Response body.
    pub body: Vec<u8>,
}

impl ServerResponse {
    fn json<T: serde::Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }

    fn from_error(error: &ServerError) -> Self {
        Self::json(
            error.status(),
            &json!({"success": false, "error": error.to_string()}),
        )
    }
}

/// The chunk server.
///
/// Routes the three protocol endpoints to a [`RequestHandler`]. Errors are
/// answered with `{"success": false, "error": ...}` and a 4xx/5xx status.
pub struct ChunkServer {
    handler: RequestHandler,
}

impl ChunkServer {
    /// Creates a server over `store`.
    pub fn new(config: ServerConfig, store: Arc<dyn ChunkStore>) -> Self {
        Self {
            handler: RequestHandler::new(config, store),
        }
    }

    /// Returns the handler.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Returns the handler counters.
    pub fn stats(&self) -> ServerStats {
        self.handler.stats()
    }

    /// Handles one request.
    pub fn handle(&self, request: &ServerRequest) -> ServerResponse {
        match self.route(request) {
            Ok(response) => response,
            Err(error) => {
                if error.is_server_error() {
                    warn!(path = %request.path, %error, "request failed");
                }
                ServerResponse::from_error(&error)
            }
        }
    }

    fn route(&self, request: &ServerRequest) -> ServerResult<ServerResponse> {
        let path = request.path.split('?').next().unwrap_or_default();
        let method = request.method.as_str();
        match (method, path) {
            ("POST", HAS_PATH) => {
                let body: HasRequest = serde_json::from_slice(&request.body)
                    .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
                let response = self.handler.handle_has(body)?;
                Ok(ServerResponse::json(200, &response))
            }
            ("POST", PUT_PATH) => {
                let target = request
                    .header(HEADER_TARGET)
                    .ok_or(ServerError::MissingHeader(HEADER_TARGET))?;
                let chunk_id = request
                    .header(HEADER_CHUNK_ID)
                    .ok_or(ServerError::MissingHeader(HEADER_CHUNK_ID))?;
                let response = self.handler.handle_put(target, chunk_id, &request.body)?;
                Ok(ServerResponse::json(200, &response))
            }
            ("GET", NEGOTIATION_PATH) => {
                Ok(ServerResponse::json(200, &self.handler.handle_negotiation()))
            }
            (_, HAS_PATH | PUT_PATH | NEGOTIATION_PATH) => Err(ServerError::MethodNotAllowed {
                method: method.to_string(),
                path: path.to_string(),
            }),
            _ => Err(ServerError::NotFound(path.to_string())),
        }
    }
}
