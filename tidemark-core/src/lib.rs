/// Domain types for the Tidemark time-series backend
///
/// This crate holds the vocabulary shared between the client operations:
/// devices and their sensors, datapoints and rows of readings, selections
/// over the device population, transform pipelines and bulk-write payloads.
/// Everything here is plain data plus serde; network concerns live in
/// `tidemark-client`.

pub mod device;
pub mod pipeline;
pub mod point;
pub mod row;
pub mod selection;
pub mod sensor;
pub mod time;
pub mod write;

pub use device::Device;
pub use pipeline::{Pipeline, PipelineStep};
pub use point::DataPoint;
pub use row::Row;
pub use selection::Selection;
pub use sensor::Sensor;
pub use write::BulkWrite;
