//! Trait definitions for decoupling the widget set from the host editor.

/// Host-owned node surface the widget set operates on.
///
/// The node exclusively owns its property map; the widget set reaches it
/// only through this trait. Redraw requests are idempotent and may be
/// coalesced by the host.
pub trait LoraHostNode {
    /// Read a property from the node's property map.
    fn get_property(&self, key: &str) -> Option<String>;

    /// Write a property into the node's property map.
    fn set_property(&mut self, key: &str, value: String);

    /// Ask the host to repaint the canvas.
    fn request_redraw(&mut self);

    /// Set or clear the canvas tooltip.
    fn set_tooltip(&mut self, text: Option<&str>);

    /// Grow the node so at least `height` pixels of widget stack fit.
    fn ensure_height(&mut self, height: f32);
}

/// Widget values captured by the host's default node serialization.
#[derive(Default, Debug)]
pub struct SavedNodeInfo {
    pub widget_values: Vec<serde_json::Value>,
}

/// Lifecycle of the widget set on one node, called by the host's
/// registration glue. Replaces the original's prototype patching with
/// explicit composition: the host routes its node-created / configure /
/// serialize hooks and its per-frame draw here.
pub trait NodeLifecycle {
    /// Host created the node: install controls and an empty config.
    fn on_create(&mut self, node: &mut dyn LoraHostNode);

    /// Host restored the node from saved graph data. `saved` carries the
    /// widget values captured at save time, when the host has them.
    fn on_configure(&mut self, node: &mut dyn LoraHostNode, saved: Option<&SavedNodeInfo>);

    /// Host is saving the node. The config is already committed to the
    /// property sink by prior mutations; this only exposes widget values.
    fn on_serialize(&self, node: &dyn LoraHostNode, out: &mut SavedNodeInfo);

    /// Draw the widget stack and handle its input for one frame.
    /// Returns whether an input event was consumed.
    fn show(&mut self, ui: &mut egui::Ui, node: &mut dyn LoraHostNode) -> bool;
}

/// Source of the selectable LoRA name list.
///
/// Implementations must be callable from a background thread; failures are
/// mapped to the sentinel fallback list by the caller.
pub trait NameSource: Send + Sync {
    fn fetch_names(&self) -> Result<Vec<String>, crate::names::NameSourceError>;
}
