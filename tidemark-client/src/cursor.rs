/// Cursor: query execution and pagination state machine
///
/// A cursor owns one logical query from first request to terminal state.
/// Pages are fetched strictly one at a time: the next request is only
/// issued once the buffered page has been drained, and its body is the
/// server's continuation, sent back verbatim. Records come out in server
/// order across page boundaries.
///
/// Cursors are single-use. There is no mid-stream cancel: dropping the
/// cursor abandons the sequence without issuing further requests.
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::envelope::ResponseEnvelope;
use crate::query::Query;
use crate::transport::{Transport, Verb};
use crate::{ClientError, Result};

/// Response field holding the page's records, unless overridden
pub const DEFAULT_SEGMENT_KEY: &str = "data";

/// Where a cursor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No request issued yet
    Idle,
    /// At least one page fetched, more may follow
    Running,
    /// Sequence ended normally; no further requests will be issued
    Completed,
    /// Sequence ended with an error; no further requests will be issued
    Failed,
}

impl CursorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CursorState::Completed | CursorState::Failed)
    }
}

/// A lazy sequence of decoded records spanning one or more pages.
///
/// `T` is any deserializable record type; list queries decode
/// [`Device`](tidemark_core::Device)s, read queries decode
/// [`Row`](tidemark_core::Row)s.
pub struct Cursor<T> {
    transport: Arc<dyn Transport>,
    verb: Verb,
    route: String,
    headers: HashMap<String, String>,
    segment_key: String,
    state: CursorState,
    page: VecDeque<Value>,
    next_body: Option<Value>,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Cursor<T> {
    pub fn new(
        transport: Arc<dyn Transport>,
        verb: Verb,
        route: impl Into<String>,
        headers: HashMap<String, String>,
        query: Query,
    ) -> Self {
        Self {
            transport,
            verb,
            route: route.into(),
            headers,
            segment_key: DEFAULT_SEGMENT_KEY.to_string(),
            state: CursorState::Idle,
            page: VecDeque::new(),
            next_body: Some(query.to_body()),
            _record: PhantomData,
        }
    }

    /// Read the page records from a different response field
    pub fn with_segment_key(mut self, key: impl Into<String>) -> Self {
        self.segment_key = key.into();
        self
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Eagerly issue the initial request.
    ///
    /// Optional: `try_next` starts an idle cursor on its own. Calling `run`
    /// on a cursor that already left `Idle` is a no-op returning `Ok(())`.
    pub async fn run(&mut self) -> Result<()> {
        if self.state != CursorState::Idle {
            return Ok(());
        }
        self.fetch_page().await
    }

    /// Pull the next record, fetching pages on demand.
    ///
    /// Returns `Ok(None)` once the sequence is exhausted, and keeps
    /// returning it afterwards. An error is surfaced exactly once; the
    /// cursor is `Failed` from then on and further calls yield `Ok(None)`.
    pub async fn try_next(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(record) = self.page.pop_front() {
                return match serde_json::from_value(record) {
                    Ok(value) => Ok(Some(value)),
                    Err(e) => {
                        self.fail();
                        Err(ClientError::Decode(e.to_string()))
                    }
                };
            }

            if self.state.is_terminal() {
                return Ok(None);
            }
            if self.next_body.is_none() {
                self.state = CursorState::Completed;
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Drain the whole sequence into a vector.
    ///
    /// All-or-nothing: an error on any page discards the records already
    /// decoded and returns only the error.
    pub async fn collect(mut self) -> Result<Vec<T>> {
        let mut records = Vec::new();
        while let Some(record) = self.try_next().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Fetch one page: send the pending body, buffer the records, stash the
    /// continuation. Any failure is terminal.
    async fn fetch_page(&mut self) -> Result<()> {
        let body = match self.next_body.take() {
            Some(body) => body,
            None => {
                self.state = CursorState::Completed;
                return Ok(());
            }
        };
        self.state = CursorState::Running;

        let response = match self
            .transport
            .execute(
                self.verb,
                &self.route,
                Some(Bytes::from(body.to_string())),
                &self.headers,
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.fail();
                return Err(e);
            }
        };

        if !response.is_success() {
            warn!("{} {} returned {}", self.verb, self.route, response.status);
            self.fail();
            return Err(ClientError::UnexpectedStatus {
                status: response.status,
                body: response.body,
            });
        }

        let envelope = match ResponseEnvelope::parse(&response.body, &self.segment_key) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.fail();
                return Err(e);
            }
        };

        debug!(
            "{} {}: page of {} records, continuation: {}",
            self.verb,
            self.route,
            envelope.segment.len(),
            envelope.continuation.is_some(),
        );

        self.page = envelope.segment.into();
        self.next_body = envelope.continuation;

        if self.page.is_empty() && self.next_body.is_none() {
            self.state = CursorState::Completed;
        }
        Ok(())
    }

    fn fail(&mut self) {
        self.state = CursorState::Failed;
        self.page.clear();
        self.next_body = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::StubTransport;
    use crate::SingleFunction;
    use serde_json::json;
    use tidemark_core::Selection;

    fn find_cursor(stub: Arc<StubTransport>) -> Cursor<Value> {
        Cursor::new(
            stub,
            Verb::Get,
            "/v2/devices",
            HashMap::new(),
            Query::find(Selection::all_devices()),
        )
    }

    #[tokio::test]
    async fn test_single_page_in_order() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(
            Verb::Get,
            "/v2/devices",
            200,
            r#"{"data":[{"n":1},{"n":2},{"n":3}]}"#,
        );

        let records = find_cursor(stub.clone()).collect().await.unwrap();
        assert_eq!(records, vec![json!({"n":1}), json!({"n":2}), json!({"n":3})]);
        assert_eq!(stub.request_count(), 1);
    }

    #[tokio::test]
    async fn test_continuation_followed_and_sent_verbatim() {
        let stub = Arc::new(StubTransport::new());
        let continuation = json!({"search": {"select": "devices"}, "find": {"marker": "page-2"}});
        stub.stub(
            Verb::Get,
            "/v2/devices",
            200,
            &json!({"data": [{"n": 1}], "next_page": {"next_query": continuation.clone()}})
                .to_string(),
        );
        stub.stub(Verb::Get, "/v2/devices", 200, r#"{"data":[{"n":2}]}"#);

        let records = find_cursor(stub.clone()).collect().await.unwrap();
        assert_eq!(records, vec![json!({"n":1}), json!({"n":2})]);

        let requests = stub.requests();
        assert_eq!(requests.len(), 2);
        let second_body: Value =
            serde_json::from_str(requests[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(second_body, continuation);
    }

    #[tokio::test]
    async fn test_lazy_start() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(Verb::Get, "/v2/devices", 200, r#"{"data":[{"n":1}]}"#);

        let mut cursor = find_cursor(stub.clone());
        assert_eq!(stub.request_count(), 0);
        assert_eq!(cursor.state(), CursorState::Idle);
        assert!(!cursor.state().is_terminal());

        let first: Option<Value> = cursor.try_next().await.unwrap();
        assert_eq!(first, Some(json!({"n":1})));
        assert_eq!(stub.request_count(), 1);
    }

    #[tokio::test]
    async fn test_run_twice_issues_one_request() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(Verb::Get, "/v2/devices", 200, r#"{"data":[{"n":1}]}"#);

        let mut cursor = find_cursor(stub.clone());
        cursor.run().await.unwrap();
        cursor.run().await.unwrap();
        assert_eq!(stub.request_count(), 1);
        assert_eq!(cursor.state(), CursorState::Running);

        assert_eq!(cursor.try_next().await.unwrap(), Some(json!({"n":1})));
        assert_eq!(cursor.try_next().await.unwrap(), None);
        assert_eq!(cursor.state(), CursorState::Completed);
    }

    #[tokio::test]
    async fn test_completion_is_fused() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(Verb::Get, "/v2/devices", 200, r#"{"data":[]}"#);

        let mut cursor = find_cursor(stub.clone());
        assert_eq!(cursor.try_next().await.unwrap(), None::<Value>);
        assert_eq!(cursor.state(), CursorState::Completed);
        assert!(cursor.state().is_terminal());
        assert_eq!(cursor.try_next().await.unwrap(), None::<Value>);
        assert_eq!(stub.request_count(), 1);
    }

    #[tokio::test]
    async fn test_error_status_surfaced_once_then_fused() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(Verb::Get, "/v2/devices", 500, "internal error");

        let mut cursor = find_cursor(stub.clone());
        let err = cursor.try_next().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::UnexpectedStatus { status: 500, .. }
        ));
        assert_eq!(cursor.state(), CursorState::Failed);
        assert!(cursor.state().is_terminal());

        assert_eq!(cursor.try_next().await.unwrap(), None::<Value>);
        assert_eq!(stub.request_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_terminal() {
        // No stub queued: the transport itself errors.
        let stub = Arc::new(StubTransport::new());
        let mut cursor = find_cursor(stub.clone());

        let err = cursor.try_next().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(cursor.state(), CursorState::Failed);
        assert_eq!(cursor.try_next().await.unwrap(), None::<Value>);
    }

    #[tokio::test]
    async fn test_failure_on_later_page_discards_collected_records() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(
            Verb::Get,
            "/v2/devices",
            200,
            &json!({"data": [{"n": 1}], "next_page": {"next_query": {"q": 2}}}).to_string(),
        );
        stub.stub(Verb::Get, "/v2/devices", 502, "bad gateway");

        let result = find_cursor(stub.clone()).collect().await;
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedStatus { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_middle_page() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(
            Verb::Get,
            "/v2/devices",
            200,
            &json!({"data": [{"n": 1}], "next_page": {"next_query": {"q": 2}}}).to_string(),
        );
        stub.stub(
            Verb::Get,
            "/v2/devices",
            200,
            &json!({"data": [], "next_page": {"next_query": {"q": 3}}}).to_string(),
        );
        stub.stub(Verb::Get, "/v2/devices", 200, r#"{"data":[{"n":2}]}"#);

        let records = find_cursor(stub.clone()).collect().await.unwrap();
        assert_eq!(records, vec![json!({"n":1}), json!({"n":2})]);
        assert_eq!(stub.request_count(), 3);
    }

    #[tokio::test]
    async fn test_decode_failure_is_terminal_and_drops_continuation() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(
            Verb::Get,
            "/v2/devices",
            200,
            &json!({
                "data": [{"key": "good"}, {"key": 42}],
                "next_page": {"next_query": {"q": 2}},
            })
            .to_string(),
        );

        let mut cursor: Cursor<tidemark_core::Device> = Cursor::new(
            stub.clone(),
            Verb::Get,
            "/v2/devices",
            HashMap::new(),
            Query::find(Selection::all_devices()),
        );

        let first = cursor.try_next().await.unwrap().unwrap();
        assert_eq!(first.key, "good");

        let err = cursor.try_next().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(cursor.state(), CursorState::Failed);

        // The pending continuation was dropped: no second request.
        assert!(cursor.try_next().await.unwrap().is_none());
        assert_eq!(stub.request_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_terminal() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(Verb::Get, "/v2/devices", 200, r#"{"rows":[]}"#);

        let mut cursor = find_cursor(stub.clone());
        let err = cursor.try_next().await.unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
        assert_eq!(cursor.state(), CursorState::Failed);
        assert_eq!(cursor.try_next().await.unwrap(), None::<Value>);
    }

    #[tokio::test]
    async fn test_custom_segment_key() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(Verb::Get, "/v2/single", 200, r#"{"readings":[{"n":1}]}"#);

        let cursor: Cursor<Value> = Cursor::new(
            stub.clone(),
            Verb::Get,
            "/v2/single",
            HashMap::new(),
            Query::single(Selection::all_devices(), SingleFunction::Latest),
        )
        .with_segment_key("readings");

        let records = cursor.collect().await.unwrap();
        assert_eq!(records, vec![json!({"n":1})]);
    }

    #[tokio::test]
    async fn test_headers_forwarded_on_every_page() {
        let stub = Arc::new(StubTransport::new());
        stub.stub(
            Verb::Get,
            "/v2/read",
            200,
            &json!({"data": [], "next_page": {"next_query": {"q": 2}}}).to_string(),
        );
        stub.stub(Verb::Get, "/v2/read", 200, r#"{"data":[]}"#);

        let headers = HashMap::from([("Accept".to_string(), "application/json".to_string())]);
        let cursor: Cursor<Value> = Cursor::new(
            stub.clone(),
            Verb::Get,
            "/v2/read",
            headers,
            Query::find(Selection::all_devices()),
        );
        cursor.collect().await.unwrap();

        for request in stub.requests() {
            assert_eq!(request.headers.get("Accept").unwrap(), "application/json");
        }
        assert_eq!(stub.request_count(), 2);
    }
}
