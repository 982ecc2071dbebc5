//! Lightweight data types for the LoRA switcher widget set.

use serde::{Deserialize, Serialize};

/// Key of the node property and name of the hidden widget holding the
/// serialized config.
pub const CONFIG_KEY: &str = "lora_config";

/// Path of the endpoint serving the available LoRA names.
pub const LORA_ENDPOINT: &str = "/oshtz-nodes/get-loras";

/// Sentinel name for an unset row.
pub const NONE_LORA: &str = "None";

/// Strength assigned to new rows and to entries restored without one.
pub const DEFAULT_STRENGTH: f64 = 1.0;

/// One LoRA entry: a selectable name paired with a numeric strength.
///
/// Serialized as `{"lora": ..., "strength": ...}` — the field name `lora`
/// is dictated by the host's save format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoraEntry {
    #[serde(rename = "lora")]
    pub name: String,
    pub strength: f64,
}

impl LoraEntry {
    pub fn new(name: impl Into<String>, strength: f64) -> Self {
        Self {
            name: name.into(),
            strength,
        }
    }

    /// The unset entry new rows start from.
    pub fn none() -> Self {
        Self::new(NONE_LORA, DEFAULT_STRENGTH)
    }
}

impl Default for LoraEntry {
    fn default() -> Self {
        Self::none()
    }
}

/// Interactive sub-region of a row, laid out left-to-right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowRole {
    Index,
    Name,
    Strength,
    Remove,
}

/// Typed handle identifying where a pointer event landed, replacing the
/// original's widget-name string parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowHandle {
    pub index: usize,
    pub role: RowRole,
}
