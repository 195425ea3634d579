//! HTTP client abstraction.
//!
//! The negotiator talks to the remote through [`HttpClient`] so the
//! transport can be swapped: [`UreqClient`] for real hosts and
//! [`LoopbackClient`] for an in-process server in tests.

use std::io::Read;

use crate::config::NegotiatorConfig;

/// A response as seen by the negotiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// `Err` means the request produced no HTTP response at all (DNS, refused
/// connection, timeout). Non-2xx statuses are returned as `Ok`.
pub trait HttpClient: Send + Sync {
    /// Sends a POST request with the given headers and body.
    fn post(&self, url: &str, headers: &[(&str, &str)], body: Vec<u8>)
        -> Result<HttpResponse, String>;

    /// Sends a GET request.
    fn get(&self, url: &str) -> Result<HttpResponse, String>;
}

/// Blocking client backed by a `ureq` agent.
pub struct UreqClient {
    agent: ureq::Agent,
    max_response_bytes: u64,
}

impl UreqClient {
    /// Creates a client with the timeout, user agent and size cap of `config`.
    pub fn new(config: &NegotiatorConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();
        Self {
            agent,
            max_response_bytes: config.max_response_bytes,
        }
    }

    fn finish(&self, result: Result<ureq::Response, ureq::Error>) -> Result<HttpResponse, String> {
        match result {
            Ok(response) => {
                let status = response.status();
                let body = self.read_body(response)?;
                Ok(HttpResponse { status, body })
            }
            Err(ureq::Error::Status(status, response)) => {
                // The body of an error status is informational only.
                let body = self.read_body(response).unwrap_or_default();
                Ok(HttpResponse { status, body })
            }
            Err(ureq::Error::Transport(transport)) => Err(transport.to_string()),
        }
    }

    fn read_body(&self, response: ureq::Response) -> Result<Vec<u8>, String> {
        let mut body = Vec::new();
        response
            .into_reader()
            .take(self.max_response_bytes)
            .read_to_end(&mut body)
            .map_err(|e| e.to_string())?;
        Ok(body)
    }
}

impl HttpClient for UreqClient {
    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<HttpResponse, String> {
        let mut request = self.agent.post(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }
        self.finish(request.send_bytes(&body))
    }

    fn get(&self, url: &str) -> Result<HttpResponse, String> {
        self.finish(self.agent.get(url).call())
    }
}

/// Trait for servers that can answer loopback requests.
pub trait LoopbackServer {
    /// Handles a request addressed to `path` (the URL from `/sync/` on).
    fn handle(&self, method: &str, path: &str, headers: &[(&str, &str)], body: &[u8])
        -> HttpResponse;
}

/// A client that routes requests directly to an in-process server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a client connected to `server`.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the wrapped server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

fn path_of(url: &str) -> &str {
    url.find("/sync/").map(|i| &url[i..]).unwrap_or(url)
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<HttpResponse, String> {
        Ok(self.server.handle("POST", path_of(url), headers, &body))
    }

    fn get(&self, url: &str) -> Result<HttpResponse, String> {
        Ok(self.server.handle("GET", path_of(url), &[], &[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, String, Vec<(String, String)>, usize)>>,
    }

    impl LoopbackServer for Recorder {
        fn handle(
            &self,
            method: &str,
            path: &str,
            headers: &[(&str, &str)],
            body: &[u8],
        ) -> HttpResponse {
            self.seen.lock().push((
                method.to_string(),
                path.to_string(),
                headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body.len(),
            ));
            HttpResponse::new(200, b"{}".to_vec())
        }
    }

    #[test]
    fn loopback_strips_host() {
        let client = LoopbackClient::new(Recorder::default());
        client
            .post(
                "http://example.com:9/base/sync/chunks/put",
                &[("X-THN-Target", "web")],
                vec![1, 2, 3],
            )
            .unwrap();
        client.get("http://example.com/sync/negotiation").unwrap();

        let seen = client.server().seen.lock();
        assert_eq!(seen[0].0, "POST");
        assert_eq!(seen[0].1, "/sync/chunks/put");
        assert_eq!(seen[0].2, vec![("X-THN-Target".to_string(), "web".to_string())]);
        assert_eq!(seen[0].3, 3);
        assert_eq!(seen[1].0, "GET");
        assert_eq!(seen[1].1, "/sync/negotiation");
    }

    #[test]
    fn status_classes() {
        assert!(HttpResponse::new(204, Vec::new()).is_success());
        assert!(!HttpResponse::new(404, Vec::new()).is_success());
        assert!(!HttpResponse::new(302, Vec::new()).is_success());
    }

    #[test]
    fn ureq_transport_error_is_err() {
        // Port 9 is the discard service; nothing answers HTTP there.
        let config = NegotiatorConfig::new("http://127.0.0.1:9")
            .with_timeout(std::time::Duration::from_millis(500));
        let client = UreqClient::new(&config);
        assert!(client.get(&config.endpoint("/sync/negotiation")).is_err());
    }
}
