/// Core data types for the Great Lakes viewer.
///
/// This module defines the shared domain model imported by all other modules:
/// feature properties as handed over by the map, time series points, and the
/// plot response shape the map's plot panel consumes. It also holds the
/// crate-wide error type.

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Feature property keys
// ---------------------------------------------------------------------------

/// English lake name on the lake polygon layers.
pub const PROP_LAKE_NAME: &str = "NAMEEN";

/// NWPS reach / gauge identifier on the points layer. Its presence is what
/// marks a feature as a point feature.
pub const PROP_REACH_ID: &str = "ReachID";

/// Properties of a clicked feature, exactly as the map layer supplies them.
pub type FeatureProps = Map<String, Value>;

/// Reads a property as plain text. Strings are returned as-is; numbers and
/// booleans are rendered (GeoJSON exports often store `ReachID` as a number).
/// `null`, arrays and objects yield `None`.
pub fn property_text(props: &FeatureProps, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// A single (timestamp, value) sample.
///
/// `timestamp` is kept verbatim from the source: a month label for the lake
/// CSVs, an ISO 8601 `validTime` for NWPS responses.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub timestamp: String,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Plot types
// ---------------------------------------------------------------------------

/// Line styling for a plot series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub width: u32,
    pub color: String,
}

/// One trace in the plot panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSeries {
    pub name: String,
    pub mode: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
}

impl PlotSeries {
    /// Builds a `lines` series from an ordered list of points.
    pub fn lines(name: &str, points: &[TimeSeriesPoint]) -> Self {
        PlotSeries {
            name: name.to_string(),
            mode: "lines".to_string(),
            x: points.iter().map(|p| p.timestamp.clone()).collect(),
            y: points.iter().map(|p| p.value).collect(),
            line: None,
        }
    }

    pub fn with_line(mut self, width: u32, color: &str) -> Self {
        self.line = Some(LineStyle {
            width,
            color: color.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisOptions {
    pub title: String,
}

/// Axis titles for the plot panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotLayout {
    pub xaxis: AxisOptions,
    pub yaxis: AxisOptions,
}

impl PlotLayout {
    pub fn new(x_title: &str, y_title: &str) -> Self {
        PlotLayout {
            xaxis: AxisOptions { title: x_title.to_string() },
            yaxis: AxisOptions { title: y_title.to_string() },
        }
    }
}

/// A complete answer to a feature click: title, traces, and axis layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotResponse {
    pub title: String,
    pub series: Vec<PlotSeries>,
    pub layout: PlotLayout,
}

impl PlotResponse {
    /// The `[title, series, layout]` triple the map's plot panel expects.
    pub fn to_host_triple(&self) -> Value {
        Value::Array(vec![
            Value::String(self.title.clone()),
            serde_json::to_value(&self.series).unwrap_or(Value::Null),
            serde_json::to_value(&self.layout).unwrap_or(Value::Null),
        ])
    }
}

/// Host triple for an optional plot. `None` becomes `[null, null, null]`,
/// which the plot panel renders as "no plot available".
pub fn host_triple(plot: Option<&PlotResponse>) -> Value {
    match plot {
        Some(plot) => plot.to_host_triple(),
        None => Value::Array(vec![Value::Null, Value::Null, Value::Null]),
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while composing the map or resolving a plot.
#[derive(Debug)]
pub enum ViewerError {
    /// A feature lacked a property the resolver needs.
    MissingProperty(String),
    /// The per-lake water level CSV does not exist.
    DataFileNotFound(PathBuf),
    /// A workspace file (GeoJSON, CSV) could not be read.
    Io { path: PathBuf, source: std::io::Error },
    /// The water level CSV is malformed.
    Csv(String),
    /// A JSON / GeoJSON document did not have the expected structure.
    Parse(String),
    /// The HTTP request itself failed (DNS, connect, timeout).
    Request(String),
    /// The configuration file is missing or invalid.
    Config(String),
}

impl std::fmt::Display for ViewerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerError::MissingProperty(key) => write!(f, "Feature has no '{}' property", key),
            ViewerError::DataFileNotFound(path) => {
                write!(f, "Data file not found: {}", path.display())
            }
            ViewerError::Io { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            ViewerError::Csv(msg) => write!(f, "CSV error: {}", msg),
            ViewerError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ViewerError::Request(msg) => write!(f, "Request failed: {}", msg),
            ViewerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<csv::Error> for ViewerError {
    fn from(err: csv::Error) -> Self {
        ViewerError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::Parse(err.to_string())
    }
}

impl From<geojson::Error> for ViewerError {
    fn from(err: geojson::Error) -> Self {
        ViewerError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ViewerError {
    fn from(err: reqwest::Error) -> Self {
        ViewerError::Request(err.to_string())
    }
}

impl From<toml::de::Error> for ViewerError {
    fn from(err: toml::de::Error) -> Self {
        ViewerError::Config(err.to_string())
    }
}
