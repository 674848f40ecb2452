/// Read pipelines
use crate::time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One server-side transform applied to a stream of readings.
///
/// Steps are named operations with positional string arguments; the server
/// interprets them, the client only carries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStep {
    pub name: String,
    pub arguments: Vec<String>,
}

impl PipelineStep {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// An ordered chain of transforms applied before readings leave the backend.
///
/// The common steps get fluent constructors:
///
/// ```
/// use tidemark_core::Pipeline;
/// use chrono::{TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
/// let pipeline = Pipeline::new().rollup("1day", "mean", start);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub functions: Vec<PipelineStep>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no steps have been added.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Collapse all selected streams into one using `function`
    /// (e.g. "sum", "mean", "max").
    pub fn aggregate(mut self, function: impl Into<String>) -> Self {
        self.functions
            .push(PipelineStep::new("aggregation", vec![function.into()]));
        self
    }

    /// Roll each stream up into fixed periods aligned to `start`,
    /// e.g. `rollup("1hour", "max", start)`.
    pub fn rollup(
        mut self,
        period: impl Into<String>,
        function: impl Into<String>,
        start: DateTime<Utc>,
    ) -> Self {
        self.functions.push(PipelineStep::new(
            "rollup",
            vec![function.into(), period.into(), time::format(&start)],
        ));
        self
    }

    /// Fill gaps in each stream at a fixed period between `start` and `stop`,
    /// e.g. `interpolate("1min", "linear", start, stop)`.
    pub fn interpolate(
        mut self,
        period: impl Into<String>,
        function: impl Into<String>,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Self {
        self.functions.push(PipelineStep::new(
            "interpolate",
            vec![
                function.into(),
                period.into(),
                time::format(&start),
                time::format(&stop),
            ],
        ));
        self
    }
}
