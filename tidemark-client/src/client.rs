/// Tidemark HTTP client implementation
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::cursor::Cursor;
use crate::error::{ClientError, Result};
use crate::multi_status::MultiStatus;
use crate::query::{Query, SingleFunction};
use crate::transport::http::HttpTransport;
use crate::transport::{HttpResponse, Transport, Verb};
use tidemark_core::{time, BulkWrite, DataPoint, Device, Pipeline, Row, Selection};

const ROUTE_DEVICES: &str = "/v2/devices";
const ROUTE_READ: &str = "/v2/read";
const ROUTE_SINGLE: &str = "/v2/single";
const ROUTE_WRITE: &str = "/v2/write";

/// Summary returned by delete operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    pub deleted: u64,
}

/// Tidemark remote client
///
/// # Example
/// ```no_run
/// # use tidemark_client::{Client, ClientConfig, Query};
/// # use tidemark_core::Selection;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new(ClientConfig::new("key", "secret", "api.tidemark.example"))?;
///
/// let devices = client
///     .list_devices(Query::find(Selection::all_devices()))
///     .collect()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Connect to a Tidemark backend over HTTPS
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(HttpTransport::new(&config)?),
        })
    }

    /// Build a client over an injected transport, e.g. a
    /// [`StubTransport`](crate::transport::StubTransport) in tests
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Provision a device
    ///
    /// # Returns
    /// The device as the backend stored it
    pub async fn create_device(&self, device: &Device) -> Result<Device> {
        let response = self
            .request(Verb::Post, ROUTE_DEVICES, Some(encode(device)?))
            .await?;
        if response.is_success() {
            decode(&response.body)
        } else {
            Err(unexpected(response))
        }
    }

    /// Replace a device's name, attributes, and sensors
    pub async fn update_device(&self, device: &Device) -> Result<Device> {
        let route = route(&["v2", "devices", device.key.as_str()]);
        let response = self
            .request(Verb::Put, &route, Some(encode(device)?))
            .await?;
        if response.is_success() {
            decode(&response.body)
        } else {
            Err(unexpected(response))
        }
    }

    /// Fetch a device by key
    ///
    /// # Returns
    /// The device if found, None otherwise
    pub async fn get_device(&self, key: &str) -> Result<Option<Device>> {
        let route = route(&["v2", "devices", key]);
        let response = self.request(Verb::Get, &route, None).await?;
        match response.status {
            404 => Ok(None),
            _ if response.is_success() => decode(&response.body).map(Some),
            _ => Err(unexpected(response)),
        }
    }

    /// Delete a device and all its readings
    ///
    /// # Returns
    /// True if the device existed, false if there was nothing to delete
    pub async fn delete_device(&self, key: &str) -> Result<bool> {
        let route = route(&["v2", "devices", key]);
        let response = self.request(Verb::Delete, &route, None).await?;
        match response.status {
            404 => Ok(false),
            _ if response.is_success() => Ok(true),
            _ => Err(unexpected(response)),
        }
    }

    /// Delete every device a selection matches
    pub async fn delete_devices(&self, selection: Selection) -> Result<DeleteSummary> {
        let body = Query::find(selection).to_body();
        let response = self
            .request(
                Verb::Delete,
                ROUTE_DEVICES,
                Some(Bytes::from(body.to_string())),
            )
            .await?;
        if response.is_success() {
            decode(&response.body)
        } else {
            Err(unexpected(response))
        }
    }

    /// Enumerate the devices a query matches, page by page
    pub fn list_devices(&self, query: Query) -> Cursor<Device> {
        Cursor::new(
            self.transport.clone(),
            Verb::Get,
            ROUTE_DEVICES,
            query_headers("device-collection"),
            query,
        )
    }

    /// Read raw or transformed values over the query's time interval
    ///
    /// # Example
    /// ```no_run
    /// # use tidemark_client::{Client, ClientConfig, Query};
    /// # use tidemark_core::Selection;
    /// # use chrono::{TimeZone, Utc};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = Client::new(ClientConfig::new("k", "s", "api.tidemark.example"))?;
    /// let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    /// let stop = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
    ///
    /// let mut rows = client.read(Query::read(Selection::device_key("pump-4"), start, stop));
    /// while let Some(row) = rows.try_next().await? {
    ///     println!("{} {:?}", row.ts, row.value("pump-4", "flow"));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn read(&self, query: Query) -> Cursor<Row> {
        Cursor::new(
            self.transport.clone(),
            Verb::Get,
            ROUTE_READ,
            query_headers("datapoint-collection"),
            query,
        )
    }

    /// Locate one value per selected stream
    pub fn single(&self, query: Query) -> Cursor<Row> {
        Cursor::new(
            self.transport.clone(),
            Verb::Get,
            ROUTE_SINGLE,
            query_headers("datapoint-collection"),
            query,
        )
    }

    /// The most recent value of every selected stream
    pub fn latest(&self, selection: Selection, pipeline: Option<Pipeline>) -> Cursor<Row> {
        let mut query = Query::single(selection, SingleFunction::Latest);
        if let Some(pipeline) = pipeline {
            query = query.pipeline(pipeline);
        }
        self.single(query)
    }

    /// Write readings to many devices at once
    ///
    /// # Returns
    /// The per-device outcome; inspect it with
    /// [`is_success`](MultiStatus::is_success) and
    /// [`failures`](MultiStatus::failures)
    pub async fn write_bulk(&self, write: &BulkWrite) -> Result<MultiStatus> {
        let response = self
            .request(Verb::Post, ROUTE_WRITE, Some(encode(write)?))
            .await?;
        MultiStatus::from_response(response.status, &response.body)
    }

    /// Write one reading per sensor to a single device, all at the same
    /// timestamp
    pub async fn write_device(
        &self,
        device_key: &str,
        timestamp: DateTime<Utc>,
        values: &HashMap<String, f64>,
    ) -> Result<MultiStatus> {
        let mut write = BulkWrite::new();
        for (sensor_key, value) in values {
            write.push(device_key, sensor_key.clone(), DataPoint::new(timestamp, *value));
        }
        self.write_bulk(&write).await
    }

    /// Delete one sensor's readings between `start` (inclusive) and `stop`
    /// (exclusive)
    pub async fn delete_datapoints(
        &self,
        device_key: &str,
        sensor_key: &str,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<DeleteSummary> {
        let route = route(&[
            "v2",
            "devices",
            device_key,
            "sensors",
            sensor_key,
            "datapoints",
        ]);
        let body = json!({
            "start": time::format(&start),
            "stop": time::format(&stop),
        });
        let response = self
            .request(Verb::Delete, &route, Some(Bytes::from(body.to_string())))
            .await?;
        if response.is_success() {
            decode(&response.body)
        } else {
            Err(unexpected(response))
        }
    }

    async fn request(
        &self,
        verb: Verb,
        route: &str,
        body: Option<Bytes>,
    ) -> Result<HttpResponse> {
        let response = self
            .transport
            .execute(verb, route, body, &HashMap::new())
            .await?;
        debug!("{} {} -> {}", verb, route, response.status);
        Ok(response)
    }
}

/// Vendor media type for a resource,
/// e.g. `application/prs.tidemark.query.v1+json`
fn media_type(resource: &str, version: &str) -> String {
    format!("application/prs.tidemark.{}.{}+json", resource, version)
}

/// Headers every paginated query request carries
fn query_headers(collection: &str) -> HashMap<String, String> {
    HashMap::from([
        (
            "Accept".to_string(),
            format!(
                "{}, {}",
                media_type(collection, "v2"),
                media_type("error", "v1")
            ),
        ),
        ("Content-Type".to_string(), media_type("query", "v1")),
    ])
}

/// Build a route from path segments, percent-encoding each one
fn route(segments: &[&str]) -> String {
    // Static URL always parses; http URLs always have path segments.
    let mut url = Url::parse("http://route.invalid/").expect("static URL parses");
    url.path_segments_mut()
        .expect("http URLs have path segments")
        .pop_if_empty()
        .extend(segments);
    url.path().to_string()
}

fn encode<B: Serialize>(body: &B) -> Result<Bytes> {
    serde_json::to_vec(body)
        .map(Bytes::from)
        .map_err(|e| ClientError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}

fn unexpected(response: HttpResponse) -> ClientError {
    ClientError::UnexpectedStatus {
        status: response.status,
        body: response.body,
    }
}
