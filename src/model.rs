//! Query Model
//!
//! The shapes exchanged between the editor, the datasource adapter, and the
//! backend. Field names on the wire follow the dashboard host's conventions
//! (`refId`, `rawQuery`, `type`), so every type here carries serde renames
//! where the Rust name differs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder metric name the editor shows before a metric is picked.
/// Targets still carrying it are dropped before a query is sent.
pub const PLACEHOLDER_METRIC: &str = "select metric";

/// The only query type the backend understands.
pub const TIMESERIE: &str = "timeserie";

/// One query specification within a multi-series request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Metric name; may contain host template variables (e.g. `$host`).
    #[serde(default)]
    pub target: String,

    /// Wire `type`; always "timeserie" once the editor has normalized it.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,

    /// Free-form raw-mode query text.
    #[serde(default)]
    pub raw: String,

    /// Whether the editor is in raw text mode.
    #[serde(rename = "rawQuery", default)]
    pub raw_query: bool,

    /// Filter terms separated by condition markers.
    #[serde(default)]
    pub filters: Vec<Filter>,

    /// Aggregation applied to this series, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<Aggregator>,

    /// Opaque passthrough; interpreted by the backend only.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub correlate: Value,

    /// Opaque passthrough; interpreted by the backend only.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub field: Value,

    /// Host-assigned id identifying this target within the request.
    #[serde(rename = "refId", default)]
    pub ref_id: String,

    /// Hidden targets are excluded from query execution.
    #[serde(default)]
    pub hide: bool,
}

impl Target {
    /// A fresh target for the given metric, in the shape the editor
    /// produces: empty raw text, no filters, default aggregator.
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            target: metric.into(),
            target_type: Some(TIMESERIE.to_string()),
            raw: String::new(),
            raw_query: false,
            filters: Vec::new(),
            aggregator: Some(Aggregator::default()),
            correlate: Value::Null,
            field: Value::Null,
            ref_id: String::new(),
            hide: false,
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new(PLACEHOLDER_METRIC)
    }
}

/// One element of a target's filter list: either a condition marker
/// joining two terms, or an opaque term object owned by the host's
/// segment model.
///
/// The filter list never starts with a condition marker; markers are
/// inserted only immediately before a second-or-later term.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Filter {
    Condition(ConditionMarker),
    Term(Value),
}

impl Filter {
    /// An `AND` condition marker.
    pub fn and() -> Self {
        Filter::Condition(ConditionMarker {
            marker_type: "condition".to_string(),
            value: "AND".to_string(),
        })
    }

    /// An empty term, filled in later by the editor's segment widgets.
    pub fn empty_term() -> Self {
        Filter::Term(Value::Object(Map::new()))
    }

    pub fn is_condition(&self) -> bool {
        matches!(self, Filter::Condition(_))
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Terms are host-shaped objects that may themselves carry a `type`
        // field, so only the exact marker tag selects the Condition variant.
        let value = Value::deserialize(deserializer)?;
        if value.get("type").and_then(Value::as_str) == Some("condition") {
            let condition = value
                .get("value")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Ok(Filter::Condition(ConditionMarker {
                marker_type: "condition".to_string(),
                value: condition,
            }))
        } else {
            Ok(Filter::Term(value))
        }
    }
}

/// Condition marker joining two filter terms (`AND` / `OR`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionMarker {
    #[serde(rename = "type")]
    pub marker_type: String,
    pub value: String,
}

/// Named aggregation with typed arguments and a time unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregator {
    pub name: String,
    #[serde(default)]
    pub args: Vec<AggregatorArg>,
    #[serde(default)]
    pub unit: TimeUnit,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            name: "none".to_string(),
            args: vec![AggregatorArg {
                index: 0,
                arg_type: "int".to_string(),
                value: 1000.0,
            }],
            unit: TimeUnit::Secs,
        }
    }
}

impl Aggregator {
    /// Aggregation window in seconds: the first argument scaled by the
    /// unit. The backend applies the same scaling when it evaluates the
    /// aggregator, so this value is never written into the wire payload.
    pub fn window_seconds(&self) -> Option<f64> {
        self.args.first().map(|arg| arg.value * self.unit.to_seconds())
    }
}

/// One positional aggregator argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorArg {
    pub index: u32,
    #[serde(rename = "type")]
    pub arg_type: String,
    pub value: f64,
}

/// Time unit attached to an aggregator's window argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Secs,
    Mins,
    Hours,
    Days,
    Weeks,
    Months,
}

impl TimeUnit {
    /// Multiplier to seconds. Months use a 30-day approximation.
    pub fn to_seconds(self) -> f64 {
        match self {
            TimeUnit::Secs => 1.0,
            TimeUnit::Mins => 60.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Days => 86_400.0,
            TimeUnit::Weeks => 604_800.0,
            TimeUnit::Months => 2_592_000.0,
        }
    }
}

impl Default for TimeUnit {
    fn default() -> Self {
        TimeUnit::Secs
    }
}

/// Query time range, ISO 8601 with millisecond precision, the exact
/// format the backend parses (`yyyy-MM-dd'T'HH:mm:ss.SSS'Z'`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

const RANGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: from.format(RANGE_FORMAT).to_string(),
            to: to.format(RANGE_FORMAT).to_string(),
        }
    }

    pub fn last_hours(hours: i64) -> Self {
        let now = Utc::now();
        Self::new(now - Duration::hours(hours), now)
    }

    pub fn last_days(days: i64) -> Self {
        let now = Utc::now();
        Self::new(now - Duration::days(days), now)
    }
}

/// The host's query-request object: targets plus range metadata. Fields
/// this crate does not interpret pass through the flattened `extra` map
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub targets: Vec<Target>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TimeRange>,

    #[serde(rename = "intervalMs", default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,

    #[serde(rename = "maxDataPoints", default, skip_serializing_if = "Option::is_none")]
    pub max_data_points: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Series data returned by the backend. Payload shapes are host-defined
/// and stay opaque to this crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    pub data: Vec<Value>,
}

/// Normalized `{text, value}` pair every option-listing endpoint yields
/// for dropdown population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPair {
    pub text: String,
    pub value: Value,
}
