//! Query Editor
//!
//! Mediates between the editor UI widgets and the datasource: owns one
//! target's shape and lifecycle, fetches dropdown options, and asks the
//! host panel to refresh after every mutation that changes query
//! semantics.
//!
//! Host capabilities (refresh, segment transform) are composed in rather
//! than inherited from a host base class.

use std::sync::Arc;

use serde_json::Value;

use crate::datasource::{Datasource, DatasourceError, MetricRef};
use crate::host::{PanelHook, Segment, SegmentTransformer};
use crate::model::{Aggregator, AggregatorArg, Filter, Target, TIMESERIE};

/// Editor controller for a single query target.
pub struct QueryEditor {
    target: Target,
    datasource: Arc<dyn Datasource>,
    panel: Arc<dyn PanelHook>,
    segments: Arc<dyn SegmentTransformer>,
}

impl QueryEditor {
    /// Wrap a host-provided target, normalizing its shape: the query
    /// type is always forced to "timeserie" and a missing aggregator
    /// gets the default. `raw` and `filters` are already non-optional
    /// in the typed model.
    pub fn new(
        mut target: Target,
        datasource: Arc<dyn Datasource>,
        panel: Arc<dyn PanelHook>,
        segments: Arc<dyn SegmentTransformer>,
    ) -> Self {
        target.target_type = Some(TIMESERIE.to_string());
        if target.aggregator.is_none() {
            target.aggregator = Some(Aggregator::default());
        }

        Self { target, datasource, panel, segments }
    }

    /// The target in its current editing state.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Measurement names for the metric dropdown.
    pub async fn measurement_options(&self) -> Result<Vec<Segment>, DatasourceError> {
        let options = self.datasource.measurements(self.metric_ref()).await?;
        Ok(self.segments.transform(options))
    }

    /// Tag options for the filter widgets.
    pub async fn tag_options(&self) -> Result<Vec<Segment>, DatasourceError> {
        let options = self.datasource.tags(self.metric_ref()).await?;
        Ok(self.segments.transform(options))
    }

    /// Condition types usable between filter terms.
    pub async fn condition_options(&self) -> Result<Vec<Segment>, DatasourceError> {
        let options = self.datasource.condition_types().await?;
        Ok(self.segments.transform(options))
    }

    /// Field names for the field dropdown.
    pub async fn field_options(&self) -> Result<Vec<Segment>, DatasourceError> {
        let options = self.datasource.fields(self.metric_ref()).await?;
        Ok(self.segments.transform(options))
    }

    /// Aggregator names for the aggregator dropdown.
    pub async fn aggregator_options(&self) -> Result<Vec<Segment>, DatasourceError> {
        let options = self.datasource.aggregators(self.metric_ref()).await?;
        Ok(self.segments.transform(options))
    }

    /// Time units for the aggregator window dropdown.
    pub async fn unit_options(&self) -> Result<Vec<Segment>, DatasourceError> {
        let options = self.datasource.units(self.metric_ref()).await?;
        Ok(self.segments.transform(options))
    }

    /// Flip between structured editing and raw text editing.
    pub fn toggle_editor_mode(&mut self) {
        self.target.raw_query = !self.target.raw_query;
    }

    /// Append a new empty filter term, preceded by an AND condition
    /// marker when it is not the first term.
    pub fn add_filter(&mut self) {
        if !self.target.filters.is_empty() {
            self.target.filters.push(Filter::and());
        }
        self.target.filters.push(Filter::empty_term());
        self.panel.refresh();
    }

    /// Remove the filter at `index` together with the condition marker
    /// that joined it to its neighbor, so the list never starts with a
    /// marker. Out-of-range indices are ignored.
    pub fn remove_filter(&mut self, index: usize) {
        let filters = &mut self.target.filters;
        if index >= filters.len() {
            return;
        }
        filters.remove(index);

        if index > 0 {
            if filters.get(index - 1).map_or(false, Filter::is_condition) {
                filters.remove(index - 1);
            }
        } else if filters.first().map_or(false, Filter::is_condition) {
            filters.remove(0);
        }

        self.panel.refresh();
    }

    /// Append an argument slot to the current aggregator. No-op when no
    /// aggregator is set.
    pub fn add_args(&mut self) {
        if let Some(aggregator) = self.target.aggregator.as_mut() {
            let index = aggregator.args.len() as u32;
            aggregator.args.push(AggregatorArg {
                index,
                arg_type: "int".to_string(),
                value: 0.0,
            });
            self.panel.refresh();
        }
    }

    /// Clear the aggregator entirely. Does not refresh; the next
    /// structural edit re-runs the query.
    pub fn remove_aggregator(&mut self) {
        self.target.aggregator = None;
    }

    /// Notify the panel that an internal widget changed.
    pub fn on_change(&self) {
        self.panel.refresh();
    }

    /// Replace the filter at `index` with the segment the user picked,
    /// then re-run the query.
    pub fn on_change_filter(&mut self, index: usize, segment: Value) {
        if let Some(slot) = self.target.filters.get_mut(index) {
            *slot = Filter::Term(segment);
        }
        self.panel.refresh();
    }

    fn metric_ref(&self) -> MetricRef {
        MetricRef::from(&self.target)
    }
}
