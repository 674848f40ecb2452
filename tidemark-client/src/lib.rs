/// Tidemark HTTP Client Library
///
/// This crate provides a Rust client for the Tidemark time-series backend:
/// device provisioning, bulk writes with per-device outcomes, and paginated
/// reads driven by a cursor that follows server continuations transparently.

pub mod client;
pub mod config;
pub mod cursor;
pub mod envelope;
pub mod error;
pub mod multi_status;
pub mod query;
pub mod transport;

// Re-export key types
pub use client::{Client, DeleteSummary};
pub use config::ClientConfig;
pub use cursor::{Cursor, CursorState};
pub use envelope::ResponseEnvelope;
pub use error::{ClientError, Result};
pub use multi_status::{DeviceState, MultiStatus, WriteStatus};
pub use query::{Query, QueryAction, SingleFunction};
pub use tidemark_core::{BulkWrite, DataPoint, Device, Pipeline, Row, Selection, Sensor};
pub use transport::http::HttpTransport;
pub use transport::{HttpResponse, StubTransport, Transport, Verb};
