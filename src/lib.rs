//! # Metricbridge
//!
//! Dashboard datasource bridge: translates a dashboard host's query
//! model into HTTP requests against a time-series backend, and maps the
//! responses back into the shapes the host expects.
//!
//! ## Modules
//!
//! - [`model`]: targets, filters, aggregators, and wire payloads
//! - [`datasource`]: the adapter contract and its HTTP implementation
//! - [`editor`]: query editor controller for a single target
//! - [`host`]: ports for host-provided capabilities
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use metricbridge::{
//!     Datasource, DatasourceConfig, HttpDatasource, PlainTemplates,
//!     QueryRequest, Target, TimeRange,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let datasource = HttpDatasource::new(
//!         DatasourceConfig::default(),
//!         Arc::new(PlainTemplates),
//!     );
//!
//!     datasource.test_datasource().await?;
//!
//!     let response = datasource
//!         .query(QueryRequest {
//!             targets: vec![Target::new("cpu_usage")],
//!             range: Some(TimeRange::last_hours(6)),
//!             ..QueryRequest::default()
//!         })
//!         .await?;
//!
//!     println!("{} series", response.data.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod datasource;
pub mod editor;
pub mod host;
pub mod model;

// Re-export top-level types for convenience
pub use model::{
    Aggregator, AggregatorArg, ConditionMarker, Filter, OptionPair, QueryRequest, QueryResponse,
    Target, TimeRange, TimeUnit, PLACEHOLDER_METRIC, TIMESERIE,
};

pub use datasource::{
    map_to_text_value, Datasource, DatasourceConfig, DatasourceError, HealthStatus,
    HttpDatasource, MetricRef, WireQuery, WireTarget,
};

pub use editor::QueryEditor;

pub use host::{
    IdentitySegments, PanelHook, PlainTemplates, Segment, SegmentTransformer, TemplateFormat,
    TemplateService,
};

pub use config::{Config, ConfigError, DatasourceSettings, LoggingConfig};
