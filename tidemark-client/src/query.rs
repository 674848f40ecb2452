/// Logical queries and their wire encoding
///
/// A query pairs a selection (which streams) with an optional pipeline
/// (server-side transforms) and exactly one action (what to do with the
/// matched streams). The enum guarantees the one-action invariant that the
/// wire format expresses as "exactly one action key besides search/fold".
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tidemark_core::{time, Pipeline, Selection};

/// What a query does with the streams its selection matched
#[derive(Debug, Clone, PartialEq)]
pub enum QueryAction {
    /// Enumerate matching devices
    Find { limit: Option<u64> },
    /// Read raw or transformed values over a time interval
    Read {
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        limit: Option<u64>,
    },
    /// Locate one value per stream relative to a reference timestamp
    Single {
        function: SingleFunction,
        timestamp: Option<DateTime<Utc>>,
    },
}

/// Which value a single-point query locates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleFunction {
    Earliest,
    Latest,
    Before,
    After,
    Exact,
    Nearest,
}

impl SingleFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SingleFunction::Earliest => "earliest",
            SingleFunction::Latest => "latest",
            SingleFunction::Before => "before",
            SingleFunction::After => "after",
            SingleFunction::Exact => "exact",
            SingleFunction::Nearest => "nearest",
        }
    }
}

/// An immutable query value, built once and serialized per request
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    selection: Selection,
    pipeline: Option<Pipeline>,
    action: QueryAction,
}

impl Query {
    /// Enumerate the devices a selection matches
    pub fn find(selection: Selection) -> Self {
        Self {
            selection,
            pipeline: None,
            action: QueryAction::Find { limit: None },
        }
    }

    /// Read values between `start` (inclusive) and `stop` (exclusive)
    pub fn read(selection: Selection, start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        Self {
            selection,
            pipeline: None,
            action: QueryAction::Read {
                start,
                stop,
                limit: None,
            },
        }
    }

    /// Locate one value per stream
    pub fn single(selection: Selection, function: SingleFunction) -> Self {
        Self {
            selection,
            pipeline: None,
            action: QueryAction::Single {
                function,
                timestamp: None,
            },
        }
    }

    /// Apply a transform pipeline before values leave the backend
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Cap the number of records per page. Ignored by single-point queries.
    pub fn limit(mut self, limit: u64) -> Self {
        match &mut self.action {
            QueryAction::Find { limit: slot } | QueryAction::Read { limit: slot, .. } => {
                *slot = Some(limit)
            }
            QueryAction::Single { .. } => {}
        }
        self
    }

    /// Reference timestamp for single-point queries. Ignored by the others,
    /// and by the server for earliest/latest.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        if let QueryAction::Single {
            timestamp: slot, ..
        } = &mut self.action
        {
            *slot = Some(timestamp);
        }
        self
    }

    /// Wire encoding:
    /// `{"search": {"select": "devices", "filters": ...}, "fold"?, "<action>": ...}`
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "search": {
                "select": "devices",
                "filters": self.selection.as_value(),
            }
        });

        if let Some(pipeline) = &self.pipeline {
            if !pipeline.is_empty() {
                body["fold"] = json!({ "functions": pipeline.functions });
            }
        }

        match &self.action {
            QueryAction::Find { limit } => {
                let mut find = json!({"quantifier": "all"});
                if let Some(limit) = limit {
                    find["limit"] = json!(limit);
                }
                body["find"] = find;
            }
            QueryAction::Read { start, stop, limit } => {
                let mut read = json!({
                    "start": time::format(start),
                    "stop": time::format(stop),
                });
                if let Some(limit) = limit {
                    read["limit"] = json!(limit);
                }
                body["read"] = read;
            }
            QueryAction::Single {
                function,
                timestamp,
            } => {
                let mut single = json!({"function": function.as_str()});
                if let Some(timestamp) = timestamp {
                    single["timestamp"] = json!(time::format(timestamp));
                }
                body["single"] = single;
            }
        }

        body
    }
}
