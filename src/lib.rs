//! Standalone egui-based LoRA switcher widget set for node graph nodes.
//!
//! This crate provides the in-node UI for managing an ordered list of LoRA
//! entries: custom-drawn rows with hit-tested sub-regions, a reconciler
//! keeping row indices dense across add/remove, and a config store
//! dual-written to the host node's property map and a hidden widget.
//! Hosts implement the [`LoraHostNode`] trait and drive a
//! [`NodeLifecycle`] obtained from [`LoraSwitcherExtension`].

pub mod adapter;
pub mod config;
pub mod names;
pub mod numbered;
pub mod reconciler;
pub mod row;
pub mod state;
pub mod theme;
pub mod traits;
pub mod types;
pub mod widget;

pub use adapter::{
    DYNAMIC_NODE_TYPE, ExtensionContext, LoraSwitcherExtension, LoraSwitcherRack,
    NUMBERED_NODE_TYPE, RackStyle,
};
pub use config::{ConfigSink, HiddenConfigWidget, LoraConfig};
pub use names::{HttpNameSource, NameCache, NameSourceError};
pub use reconciler::WidgetList;
pub use state::RackUiState;
pub use theme::RackTheme;
pub use traits::{LoraHostNode, NameSource, NodeLifecycle, SavedNodeInfo};
pub use types::*;
pub use widget::{LoraRackWidget, PendingRowActions};
