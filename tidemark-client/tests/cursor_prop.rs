use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tidemark_client::{Cursor, Query, StubTransport, Verb};
use tidemark_core::Selection;

/// Stub a paginated exchange: one canned response per page, each but the
/// last carrying a continuation to the next.
fn stub_pages(stub: &StubTransport, pages: &[Vec<i64>]) {
    for (index, page) in pages.iter().enumerate() {
        let records: Vec<Value> = page.iter().map(|n| json!({ "n": n })).collect();
        let mut body = json!({ "data": records });
        if index + 1 < pages.len() {
            body["next_page"] = json!({ "next_query": { "page": index + 1 } });
        }
        stub.stub(Verb::Get, "/v2/devices", 200, &body.to_string());
    }
}

fn collect_all(pages: &[Vec<i64>]) -> Vec<Value> {
    let stub = Arc::new(StubTransport::new());
    stub_pages(&stub, pages);

    let cursor: Cursor<Value> = Cursor::new(
        stub,
        Verb::Get,
        "/v2/devices",
        HashMap::new(),
        Query::find(Selection::all_devices()),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(cursor.collect()).unwrap()
}

proptest! {
    #[test]
    fn prop_records_collect_in_server_order(
        pages in proptest::collection::vec(proptest::collection::vec(any::<i64>(), 0..8), 1..6)
    ) {
        let collected = collect_all(&pages);
        let expected: Vec<Value> = pages
            .iter()
            .flatten()
            .map(|n| json!({ "n": n }))
            .collect();
        prop_assert_eq!(collected, expected);
    }

    #[test]
    fn prop_one_request_per_page(
        pages in proptest::collection::vec(proptest::collection::vec(any::<i64>(), 0..8), 1..6)
    ) {
        let stub = Arc::new(StubTransport::new());
        stub_pages(&stub, &pages);

        let cursor: Cursor<Value> = Cursor::new(
            stub.clone(),
            Verb::Get,
            "/v2/devices",
            HashMap::new(),
            Query::find(Selection::all_devices()),
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(cursor.collect()).unwrap();

        prop_assert_eq!(stub.request_count(), pages.len());
    }
}
