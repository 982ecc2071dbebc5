//! Config store: the authoritative ordered entry list, its JSON encoding,
//! and the two persistence sinks it is dual-written to.

use log::{error, warn};
use serde_json::Value;

use crate::reconciler::WidgetList;
use crate::traits::LoraHostNode;
use crate::types::{CONFIG_KEY, DEFAULT_STRENGTH, LoraEntry, NONE_LORA};

/// Ordered sequence of LoRA entries, serialized to one JSON string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoraConfig {
    entries: Vec<LoraEntry>,
}

impl LoraConfig {
    pub fn from_entries(entries: Vec<LoraEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LoraEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a saved config string. Anything that is not a JSON array is
    /// treated as an empty config; individual entries are sanitized.
    pub fn parse(saved: &str) -> Self {
        let value: Value = match serde_json::from_str(saved) {
            Ok(v) => v,
            Err(err) => {
                warn!("malformed saved lora_config ({err}), treating as empty: {saved}");
                return Self::default();
            }
        };
        let Value::Array(items) = value else {
            warn!("saved lora_config is not an array, treating as empty");
            return Self::default();
        };
        let entries = items.iter().map(sanitize_entry).collect();
        Self { entries }
    }

    pub fn to_json(&self) -> String {
        match serde_json::to_string(&self.entries) {
            Ok(json) => json,
            Err(err) => {
                // Unreachable for this shape, but never propagate out of a
                // UI turn.
                error!("failed to encode lora_config: {err}");
                "[]".to_string()
            }
        }
    }

    /// Clamp every strength into `range` (numbered variant only).
    pub fn clamp_strengths(&mut self, range: std::ops::RangeInclusive<f64>) {
        for entry in &mut self.entries {
            entry.strength = entry.strength.clamp(*range.start(), *range.end());
        }
    }
}

/// Restore one entry from its saved JSON value, defaulting missing or
/// mistyped fields.
fn sanitize_entry(value: &Value) -> LoraEntry {
    let name = value
        .get("lora")
        .and_then(Value::as_str)
        .unwrap_or(NONE_LORA);
    let strength = value
        .get("strength")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_STRENGTH);
    LoraEntry::new(name, strength)
}

// ---------------------------------------------------------------------------
// Hidden widget sink
// ---------------------------------------------------------------------------

/// The hidden, zero-height widget piggybacking on the host's widget-value
/// serialization. Never drawn, never laid out, always carries valid JSON.
#[derive(Clone, Debug)]
pub struct HiddenConfigWidget {
    value: String,
}

impl HiddenConfigWidget {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, json: String) {
        self.value = json;
    }

    /// Contributes nothing to the widget stack's layout.
    pub fn compute_height(&self) -> f32 {
        0.0
    }

    /// Drawing is a no-op; the widget only exists for serialization.
    pub fn draw(&self, _painter: &egui::Painter) {}

    /// Value handed to the host's widget-value serialization.
    pub fn serialize_value(&self) -> Value {
        Value::String(self.value.clone())
    }
}

// ---------------------------------------------------------------------------
// Config sinks
// ---------------------------------------------------------------------------

/// A place the serialized config can be read from or written to, selected
/// by availability at configure time. Replaces the original's duck-typed
/// mock-widget object.
pub enum ConfigSink<'a> {
    /// The node property keyed `lora_config`.
    Property(&'a mut dyn LoraHostNode),
    /// The hidden widget's value.
    Widget(&'a mut HiddenConfigWidget),
}

impl ConfigSink<'_> {
    pub fn read(&self) -> Option<String> {
        match self {
            ConfigSink::Property(node) => node.get_property(CONFIG_KEY),
            ConfigSink::Widget(widget) => Some(widget.value().to_string()),
        }
    }

    pub fn write(&mut self, json: &str) {
        match self {
            ConfigSink::Property(node) => node.set_property(CONFIG_KEY, json.to_string()),
            ConfigSink::Widget(widget) => widget.set_value(json.to_string()),
        }
    }
}

/// Derive the config fresh from the current rows and write it to both
/// sinks. Property first, then widget value, so each sink holds valid JSON
/// even if the turn is interrupted between the writes.
pub fn recompute(list: &mut WidgetList, node: &mut dyn LoraHostNode) -> String {
    let config = LoraConfig::from_entries(list.entries_ordered());
    let json = config.to_json();
    ConfigSink::Property(node).write(&json);
    ConfigSink::Widget(list.ensure_hidden()).write(&json);
    json
}
