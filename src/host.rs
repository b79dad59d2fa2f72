//! Host Ports
//!
//! The dashboard host supplies a handful of capabilities this crate
//! consumes but does not implement: template-variable interpolation,
//! a panel refresh trigger, and the transform that turns option pairs
//! into selectable widget segments. Each is a trait here so the host
//! wires in its own implementation; plain defaults cover tests and
//! hosts without the corresponding feature.

use serde_json::Value;

use crate::model::OptionPair;

/// Interpolation mode for template-variable substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    /// Plain substitution, used when building query payloads.
    Default,
    /// Regex-safe substitution, used for option-listing lookups.
    Regex,
}

/// Host templating engine: replaces `$variable` references in metric
/// expressions.
pub trait TemplateService: Send + Sync {
    fn replace(&self, text: &str, format: TemplateFormat) -> String;
}

/// No-op templating for hosts without variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTemplates;

impl TemplateService for PlainTemplates {
    fn replace(&self, text: &str, _format: TemplateFormat) -> String {
        text.to_string()
    }
}

/// The host panel's re-query trigger. Every editor mutation that changes
/// query semantics calls this.
pub trait PanelHook: Send + Sync {
    fn refresh(&self);
}

/// Widget segment model; its shape is owned by the host UI.
pub type Segment = Value;

/// Converts normalized option pairs into the host's segment widgets.
pub trait SegmentTransformer: Send + Sync {
    fn transform(&self, options: Vec<OptionPair>) -> Vec<Segment>;
}

/// Passes option pairs through as plain `{text, value}` objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySegments;

impl SegmentTransformer for IdentitySegments {
    fn transform(&self, options: Vec<OptionPair>) -> Vec<Segment> {
        options
            .into_iter()
            .map(|option| serde_json::json!({"text": option.text, "value": option.value}))
            .collect()
    }
}
