//! Datasource Adapter
//!
//! Translates dashboard query and metadata calls into backend HTTP
//! requests and normalizes the responses.
//!
//! - [`Datasource`]: the host-facing contract (query, health check,
//!   option listings)
//! - [`HttpDatasource`]: the reqwest implementation of that contract
//!
//! The host never calls methods reflectively here; it holds an
//! `Arc<dyn Datasource>` and invokes the contract directly.

mod client;
mod contract;

pub use client::{DatasourceConfig, HttpDatasource, WireQuery, WireTarget};
pub use contract::{map_to_text_value, Datasource, DatasourceError, HealthStatus, MetricRef};
