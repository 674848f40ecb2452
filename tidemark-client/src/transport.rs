/// Transport abstraction between the client and the wire
///
/// Every operation goes through the `Transport` trait: one call, one HTTP
/// exchange, no retries. The real implementation lives in
/// [`http::HttpTransport`]; [`StubTransport`] is the in-memory double used
/// by the test suites.
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::{ClientError, Result};

pub mod http;

/// HTTP verbs the backend routes use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete response from one wire exchange
///
/// `body` is the decompressed text; transports take care of content
/// encoding before handing the response back.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// True for any 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for wire transports
///
/// Implementations attach credentials and perform exactly one attempt per
/// call: the result is either a transport error (no response obtained) or
/// the response, whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        verb: Verb,
        route: &str,
        body: Option<Bytes>,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse>;
}

/// One request as seen by the stub, kept for assertions
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub verb: Verb,
    pub route: String,
    pub body: Option<String>,
    pub headers: HashMap<String, String>,
}

/// In-memory transport double for tests
///
/// Responses are queued per (verb, route) and consumed in FIFO order, so a
/// paginated exchange stubs one response per page. Requests that reach the
/// stub without a queued response fail: real connections are not allowed.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<HashMap<(Verb, String), VecDeque<HttpResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a canned response for the next request matching verb + route
    pub fn stub(&self, verb: Verb, route: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .entry((verb, route.to_string()))
            .or_default()
            .push_back(HttpResponse::new(status, body));
    }

    /// Every request issued so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(
        &self,
        verb: Verb,
        route: &str,
        body: Option<Bytes>,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse> {
        self.requests.lock().push(RecordedRequest {
            verb,
            route: route.to_string(),
            body: body.map(|b| String::from_utf8_lossy(&b).into_owned()),
            headers: headers.clone(),
        });

        let response = self
            .responses
            .lock()
            .get_mut(&(verb, route.to_string()))
            .and_then(|queue| queue.pop_front());

        response.ok_or_else(|| {
            ClientError::Transport(format!(
                "no stub matched {} {}: real HTTP connections are not allowed",
                verb, route
            ))
        })
    }
}
