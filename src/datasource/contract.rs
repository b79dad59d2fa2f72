//! Datasource contract: the operation set the dashboard host invokes,
//! plus the response-normalization rule shared by every option-listing
//! endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{OptionPair, QueryRequest, QueryResponse, Target};

/// Host-facing datasource operations.
///
/// All option listings return normalized [`OptionPair`]s ready for
/// dropdown population.
#[async_trait]
pub trait Datasource: Send + Sync {
    /// Execute a multi-target query. Hidden targets are excluded; when
    /// nothing remains the call resolves to an empty response without
    /// touching the network.
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, DatasourceError>;

    /// Health-check the backend.
    async fn test_datasource(&self) -> Result<HealthStatus, DatasourceError>;

    /// Aggregator names applicable to the metric.
    async fn aggregators(&self, metric: MetricRef) -> Result<Vec<OptionPair>, DatasourceError>;

    /// Time units applicable to the metric's aggregator window.
    async fn units(&self, metric: MetricRef) -> Result<Vec<OptionPair>, DatasourceError>;

    /// Measurement (metric) names matching the expression.
    async fn measurements(&self, metric: MetricRef) -> Result<Vec<OptionPair>, DatasourceError>;

    /// Tag keys/values for the metric.
    async fn tags(&self, metric: MetricRef) -> Result<Vec<OptionPair>, DatasourceError>;

    /// Condition types usable between filter terms.
    async fn condition_types(&self) -> Result<Vec<OptionPair>, DatasourceError>;

    /// Field names recorded under the metric.
    async fn fields(&self, metric: MetricRef) -> Result<Vec<OptionPair>, DatasourceError>;
}

/// Option-listing lookups accept either a raw metric string or a full
/// target; this covers both call shapes.
#[derive(Debug, Clone)]
pub enum MetricRef {
    Name(String),
    Target(Target),
}

impl MetricRef {
    pub fn metric(&self) -> &str {
        match self {
            MetricRef::Name(name) => name,
            MetricRef::Target(target) => &target.target,
        }
    }
}

impl From<&str> for MetricRef {
    fn from(name: &str) -> Self {
        MetricRef::Name(name.to_string())
    }
}

impl From<String> for MetricRef {
    fn from(name: String) -> Self {
        MetricRef::Name(name)
    }
}

impl From<&Target> for MetricRef {
    fn from(target: &Target) -> Self {
        MetricRef::Target(target.clone())
    }
}

/// Successful health-check response, in the shape the dashboard host
/// displays on the datasource settings page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
    pub title: String,
}

impl HealthStatus {
    pub fn working() -> Self {
        Self {
            status: "success".to_string(),
            message: "Data source is working".to_string(),
            title: "Success".to_string(),
        }
    }
}

/// Errors that can occur when communicating with the backend.
#[derive(Error, Debug)]
pub enum DatasourceError {
    #[error("backend unavailable")]
    Unavailable,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend error {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("request timeout")]
    Timeout,
}

/// Normalize a backend list response into option pairs.
///
/// Elements already shaped as `{text, value}` (with both present and
/// truthy) keep their own label and value; anything else becomes its own
/// label with its position as the value. Heterogeneous arrays mixing the
/// two shapes are expected.
pub fn map_to_text_value(values: &[Value]) -> Vec<OptionPair> {
    values
        .iter()
        .enumerate()
        .map(|(i, d)| {
            if let Some(object) = d.as_object() {
                if let (Some(text), Some(value)) = (object.get("text"), object.get("value")) {
                    if is_truthy(text) && is_truthy(value) {
                        return OptionPair {
                            text: render_text(text),
                            value: value.clone(),
                        };
                    }
                }
            }
            OptionPair {
                text: render_text(d),
                value: Value::from(i),
            }
        })
        .collect()
}

// JS truthiness: null, false, 0 and "" are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
