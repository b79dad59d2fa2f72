//! HTTP implementation of the datasource contract.
//!
//! Thin calls against the backend's dashboard API: `POST /query` for
//! series data, `GET /hc` for health, and the `/query/*` listing
//! endpoints for editor dropdowns.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};

use super::contract::{
    map_to_text_value, Datasource, DatasourceError, HealthStatus, MetricRef,
};
use crate::host::{TemplateFormat, TemplateService};
use crate::model::{
    Aggregator, Filter, OptionPair, QueryRequest, QueryResponse, TimeRange, PLACEHOLDER_METRIC,
    TIMESERIE,
};

/// Backend identity and connection settings.
#[derive(Debug, Clone)]
pub struct DatasourceConfig {
    /// Base URL of the backend's dashboard API.
    pub base_url: String,
    /// Display name of this datasource instance.
    pub name: String,
    /// Datasource type reported to the host.
    pub source_type: String,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for DatasourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            name: "metricbridge".to_string(),
            source_type: "timeseries".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// A target as transmitted in a query body: exactly the fields the
/// backend consumes. Editor-only state (`raw`, `rawQuery`) never
/// reaches the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireTarget {
    pub target: String,
    pub filters: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<Aggregator>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub correlate: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub field: Value,
    #[serde(rename = "refId")]
    pub ref_id: String,
    pub hide: bool,
    #[serde(rename = "type")]
    pub target_type: String,
}

/// The POST /query body: built targets plus the host's range metadata,
/// unknown host fields passing through untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WireQuery {
    pub targets: Vec<WireTarget>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<TimeRange>,

    #[serde(rename = "intervalMs", skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,

    #[serde(rename = "maxDataPoints", skip_serializing_if = "Option::is_none")]
    pub max_data_points: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WireQuery {
    /// Drop hidden targets before transmission.
    pub fn retain_visible(&mut self) {
        self.targets.retain(|target| !target.hide);
    }
}

/// Datasource adapter backed by reqwest.
pub struct HttpDatasource {
    client: Client,
    config: DatasourceConfig,
    templates: Arc<dyn TemplateService>,
}

#[derive(Debug, Serialize)]
struct MetricQuery {
    target: String,
}

impl HttpDatasource {
    pub fn new(config: DatasourceConfig, templates: Arc<dyn TemplateService>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config, templates }
    }

    pub fn config(&self) -> &DatasourceConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn classify(e: reqwest::Error) -> DatasourceError {
        if e.is_timeout() {
            DatasourceError::Timeout
        } else if e.is_connect() {
            DatasourceError::Unavailable
        } else {
            DatasourceError::Request(e)
        }
    }

    /// Rewrite targets for transmission: drop editor placeholders,
    /// interpolate template variables, default the query type, and
    /// project each target down to the fields the backend consumes.
    ///
    /// The aggregation window is traced for diagnostics but not written
    /// into the payload; the backend scales the window argument by the
    /// unit itself.
    pub fn build_query_parameters(&self, request: QueryRequest) -> WireQuery {
        let QueryRequest { targets, range, interval_ms, max_data_points, extra } = request;

        let targets = targets
            .into_iter()
            .filter(|target| target.target != PLACEHOLDER_METRIC)
            .map(|target| {
                if let Some(window) = target.aggregator.as_ref().and_then(Aggregator::window_seconds)
                {
                    tracing::debug!(metric = %target.target, window_secs = window, "aggregation window");
                }
                WireTarget {
                    target: self.templates.replace(&target.target, TemplateFormat::Default),
                    filters: target.filters,
                    aggregator: target.aggregator,
                    correlate: target.correlate,
                    field: target.field,
                    ref_id: target.ref_id,
                    hide: target.hide,
                    target_type: target.target_type.unwrap_or_else(|| TIMESERIE.to_string()),
                }
            })
            .collect();

        WireQuery { targets, range, interval_ms, max_data_points, extra }
    }

    fn interpolated(&self, metric: &MetricRef) -> MetricQuery {
        MetricQuery {
            target: self.templates.replace(metric.metric(), TemplateFormat::Regex),
        }
    }

    /// POST to an option-listing endpoint and normalize the JSON array
    /// it returns.
    async fn option_query(
        &self,
        path: &str,
        body: Option<&MetricQuery>,
    ) -> Result<Vec<OptionPair>, DatasourceError> {
        let mut request = self.client.post(self.endpoint(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(Self::classify)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(DatasourceError::Backend { status, message });
        }

        let values: Vec<Value> = response.json().await.map_err(DatasourceError::Request)?;
        Ok(map_to_text_value(&values))
    }
}

#[async_trait]
impl Datasource for HttpDatasource {
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, DatasourceError> {
        let mut request = self.build_query_parameters(request);
        request.retain_visible();

        if request.targets.is_empty() {
            return Ok(QueryResponse::default());
        }

        let request_id = uuid::Uuid::new_v4();
        tracing::debug!(
            request_id = %request_id,
            datasource = %self.config.name,
            targets = request.targets.len(),
            "dispatching query"
        );

        let response = self
            .client
            .post(self.endpoint("/query"))
            .json(&request)
            .send()
            .await
            .map_err(Self::classify)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(request_id = %request_id, status, "query failed");
            return Err(DatasourceError::Backend { status, message });
        }

        let data: Vec<Value> = response.json().await.map_err(DatasourceError::Request)?;
        Ok(QueryResponse { data })
    }

    async fn test_datasource(&self) -> Result<HealthStatus, DatasourceError> {
        let response = self
            .client
            .get(self.endpoint("/hc"))
            .send()
            .await
            .map_err(Self::classify)?;

        if response.status().as_u16() == 200 {
            Ok(HealthStatus::working())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(DatasourceError::Backend { status, message })
        }
    }

    async fn aggregators(&self, metric: MetricRef) -> Result<Vec<OptionPair>, DatasourceError> {
        self.option_query("/query/aggregators", Some(&self.interpolated(&metric)))
            .await
    }

    async fn units(&self, metric: MetricRef) -> Result<Vec<OptionPair>, DatasourceError> {
        self.option_query("/query/units", Some(&self.interpolated(&metric)))
            .await
    }

    async fn measurements(&self, metric: MetricRef) -> Result<Vec<OptionPair>, DatasourceError> {
        self.option_query("/query/measurements", Some(&self.interpolated(&metric)))
            .await
    }

    async fn tags(&self, metric: MetricRef) -> Result<Vec<OptionPair>, DatasourceError> {
        self.option_query("/query/tags", Some(&self.interpolated(&metric)))
            .await
    }

    async fn condition_types(&self) -> Result<Vec<OptionPair>, DatasourceError> {
        self.option_query("/query/ctypes", None).await
    }

    async fn fields(&self, metric: MetricRef) -> Result<Vec<OptionPair>, DatasourceError> {
        self.option_query("/query/fields", Some(&self.interpolated(&metric)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PlainTemplates;
    use crate::model::Target;

    /// Appends the interpolation mode so tests can see which one a code
    /// path asked for.
    struct TaggingTemplates;

    impl TemplateService for TaggingTemplates {
        fn replace(&self, text: &str, format: TemplateFormat) -> String {
            match format {
                TemplateFormat::Default => format!("{text}:default"),
                TemplateFormat::Regex => format!("{text}:regex"),
            }
        }
    }

    fn datasource() -> HttpDatasource {
        // Unroutable base URL; tests below never reach the network.
        let config = DatasourceConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..DatasourceConfig::default()
        };
        HttpDatasource::new(config, Arc::new(PlainTemplates))
    }

    #[test]
    fn test_default_config() {
        let config = DatasourceConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.request_timeout_ms, 5000);
    }

    #[test]
    fn test_build_drops_placeholder_targets() {
        let request = QueryRequest {
            targets: vec![Target::new(PLACEHOLDER_METRIC), Target::new("cpu")],
            ..QueryRequest::default()
        };

        let built = datasource().build_query_parameters(request);
        assert_eq!(built.targets.len(), 1);
        assert_eq!(built.targets[0].target, "cpu");
    }

    #[test]
    fn test_build_defaults_missing_type() {
        let mut target = Target::new("cpu");
        target.target_type = None;

        let built = datasource().build_query_parameters(QueryRequest {
            targets: vec![target],
            ..QueryRequest::default()
        });

        assert_eq!(built.targets[0].target_type, TIMESERIE);
    }

    #[test]
    fn test_built_target_omits_editor_state() {
        let mut target = Target::new("cpu");
        target.raw = "select * from cpu".to_string();
        target.raw_query = true;
        target.ref_id = "A".to_string();
        target.correlate = serde_json::json!(false);
        target.field = serde_json::json!("value");

        let built = datasource().build_query_parameters(QueryRequest {
            targets: vec![target],
            ..QueryRequest::default()
        });

        let wire = serde_json::to_value(&built.targets[0]).unwrap();
        let mut keys: Vec<&str> = wire.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();

        assert_eq!(
            keys,
            vec!["aggregator", "correlate", "field", "filters", "hide", "refId", "target", "type"]
        );
    }

    #[test]
    fn test_visibility_filter_drops_hidden_keeps_visible() {
        let mut hidden = Target::new("mem");
        hidden.hide = true;

        let mut built = datasource().build_query_parameters(QueryRequest {
            targets: vec![Target::new("cpu"), hidden, Target::new("disk")],
            ..QueryRequest::default()
        });
        built.retain_visible();

        let surviving: Vec<&str> = built.targets.iter().map(|t| t.target.as_str()).collect();
        assert_eq!(surviving, vec!["cpu", "disk"]);
    }

    #[test]
    fn test_build_interpolates_in_default_mode() {
        let config = DatasourceConfig::default();
        let ds = HttpDatasource::new(config, Arc::new(TaggingTemplates));

        let built = ds.build_query_parameters(QueryRequest {
            targets: vec![Target::new("$host.cpu")],
            ..QueryRequest::default()
        });

        assert_eq!(built.targets[0].target, "$host.cpu:default");
    }

    #[test]
    fn test_build_keeps_target_fields_verbatim() {
        let mut target = Target::new("cpu");
        target.ref_id = "B".to_string();
        target.correlate = serde_json::json!(true);
        target.field = serde_json::json!("value");
        target.hide = true;

        let built = datasource().build_query_parameters(QueryRequest {
            targets: vec![target.clone()],
            ..QueryRequest::default()
        });

        assert_eq!(built.targets[0].ref_id, "B");
        assert_eq!(built.targets[0].correlate, serde_json::json!(true));
        assert_eq!(built.targets[0].field, serde_json::json!("value"));
        assert!(built.targets[0].hide);
        assert_eq!(built.targets[0].aggregator, target.aggregator);
    }

    #[tokio::test]
    async fn test_query_with_no_targets_skips_network() {
        let response = datasource().query(QueryRequest::default()).await.unwrap();
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn test_query_with_only_hidden_targets_skips_network() {
        let mut hidden = Target::new("cpu");
        hidden.hide = true;

        let response = datasource()
            .query(QueryRequest { targets: vec![hidden], ..QueryRequest::default() })
            .await
            .unwrap();
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn test_query_with_only_placeholders_skips_network() {
        let response = datasource()
            .query(QueryRequest {
                targets: vec![Target::default()],
                ..QueryRequest::default()
            })
            .await
            .unwrap();
        assert!(response.data.is_empty());
    }
}
