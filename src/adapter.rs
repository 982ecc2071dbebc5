//! Lifecycle adapter: wires the config store, reconciler and rack widgets
//! into the host's node-created / configure / serialize hooks.

use std::sync::Arc;

use log::{debug, warn};

use crate::config::{self, LoraConfig};
use crate::names::{HttpNameSource, NameCache, spawn_fetch};
use crate::numbered::{self, NumberedRackWidget};
use crate::reconciler::WidgetList;
use crate::state::RackUiState;
use crate::theme::RackTheme;
use crate::traits::{LoraHostNode, NameSource, NodeLifecycle, SavedNodeInfo};
use crate::types::CONFIG_KEY;
use crate::widget::LoraRackWidget;

/// Node type served by the dynamic variant.
pub const DYNAMIC_NODE_TYPE: &str = "LoraSwitcherDynamic";

/// Node type served by the numbered variant.
pub const NUMBERED_NODE_TYPE: &str = "LoraSwitcherNumbered";

/// Which of the two coexisting rack variants a node uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RackStyle {
    /// Composite custom-drawn rows, 0-based indices, unclamped strengths.
    Dynamic,
    /// Primitive widgets per row, 1-based indices, clamped strengths,
    /// capped at 20 rows.
    Numbered,
}

impl RackStyle {
    pub fn base_index(self) -> usize {
        match self {
            RackStyle::Dynamic => 0,
            RackStyle::Numbered => 1,
        }
    }

    pub fn row_cap(self) -> Option<usize> {
        match self {
            RackStyle::Dynamic => None,
            RackStyle::Numbered => Some(numbered::MAX_ROWS),
        }
    }

    pub fn node_type(self) -> &'static str {
        match self {
            RackStyle::Dynamic => DYNAMIC_NODE_TYPE,
            RackStyle::Numbered => NUMBERED_NODE_TYPE,
        }
    }
}

/// Per-extension context shared by every rack the extension creates:
/// the name source and the best-effort name cache. Replaces the original's
/// global mutable name list.
#[derive(Clone)]
pub struct ExtensionContext {
    source: Arc<dyn NameSource>,
    names: NameCache,
}

impl ExtensionContext {
    pub fn new(source: Arc<dyn NameSource>) -> Self {
        Self {
            source,
            names: NameCache::new(),
        }
    }

    pub fn names(&self) -> &NameCache {
        &self.names
    }

    pub fn source(&self) -> &Arc<dyn NameSource> {
        &self.source
    }

    /// Non-blocking refresh; the completion updates the shared cache,
    /// last-writer-wins.
    pub fn refresh_names(&self) {
        drop(spawn_fetch(Arc::clone(&self.source), self.names.clone()));
    }
}

/// The widget set of one node, driven by the host through [`NodeLifecycle`].
pub struct LoraSwitcherRack {
    style: RackStyle,
    list: WidgetList,
    state: RackUiState,
    theme: RackTheme,
    ctx: ExtensionContext,
}

impl LoraSwitcherRack {
    pub fn new(style: RackStyle, ctx: ExtensionContext) -> Self {
        Self {
            style,
            list: WidgetList::new(style.base_index()),
            state: RackUiState::default(),
            theme: RackTheme::default(),
            ctx,
        }
    }

    pub fn style(&self) -> RackStyle {
        self.style
    }

    pub fn list(&self) -> &WidgetList {
        &self.list
    }
}

impl NodeLifecycle for LoraSwitcherRack {
    fn on_create(&mut self, node: &mut dyn LoraHostNode) {
        self.list.ensure_add_button();
        self.list.ensure_hidden();
        // A property the host restored before instantiating the lifecycle
        // must survive creation; initialize only when absent.
        if node.get_property(CONFIG_KEY).is_none() {
            node.set_property(CONFIG_KEY, "[]".to_string());
        }
        node.ensure_height(self.list.total_height(&self.theme));
        node.request_redraw();
    }

    fn on_configure(&mut self, node: &mut dyn LoraHostNode, saved: Option<&SavedNodeInfo>) {
        // Saved widget values carry the hidden sink's serialized value;
        // seed it so the fallback below can read what the host restored.
        if let Some(saved) = saved {
            if let Some(json) = saved
                .widget_values
                .iter()
                .find_map(|v| v.as_str().map(str::to_string))
            {
                self.list.ensure_hidden().set_value(json);
            }
        }
        // The property sink is more reliable than widget-value history in
        // the host's save format; the hidden widget is the fallback.
        let saved_json = node
            .get_property(CONFIG_KEY)
            .or_else(|| self.list.hidden_value());
        let mut config = match saved_json {
            Some(json) => LoraConfig::parse(&json),
            None => {
                debug!("no saved lora_config on node, starting empty");
                LoraConfig::default()
            }
        };
        if self.style == RackStyle::Numbered {
            config.clamp_strengths(numbered::STRENGTH_MIN..=numbered::STRENGTH_MAX);
        }
        let count = match self.style.row_cap() {
            Some(cap) => config.len().min(cap),
            None => config.len(),
        };

        self.list.ensure_add_button();

        // Reuse existing rows by index, create only what is missing, prune
        // rows beyond the saved count.
        let base = self.list.base_index();
        for (i, entry) in config.entries().iter().take(count).cloned().enumerate() {
            match self.list.get_row_mut(base + i) {
                Some(row) => row.entry = entry,
                None => {
                    self.list.add_row(entry);
                }
            }
        }
        self.list.prune_rows_beyond(count);

        config::recompute(&mut self.list, node);

        // Best-effort, does not block configure.
        self.ctx.refresh_names();

        node.ensure_height(self.list.total_height(&self.theme));
        node.request_redraw();
    }

    fn on_serialize(&self, node: &dyn LoraHostNode, out: &mut SavedNodeInfo) {
        // Prior mutations already committed the config to the property
        // sink; only the widget values are exposed here.
        if let (Some(property), Some(widget)) =
            (node.get_property(CONFIG_KEY), self.list.hidden_value())
        {
            if property != widget {
                warn!("lora_config sinks desynced at save time");
            }
        }
        out.widget_values = self.list.serialize_values();
    }

    fn show(&mut self, ui: &mut egui::Ui, node: &mut dyn LoraHostNode) -> bool {
        match self.style {
            RackStyle::Dynamic => LoraRackWidget::new(
                &mut self.list,
                &mut self.state,
                &self.theme,
                &self.ctx.source,
                &self.ctx.names,
            )
            .show(ui, node),
            RackStyle::Numbered => {
                NumberedRackWidget::new(&mut self.list, &self.theme, &self.ctx.names).show(ui, node)
            }
        }
    }
}

/// Registration glue: one extension instance serving both node types with
/// a shared name cache. Both variants stay registered side by side, like
/// the original's node-class mappings.
pub struct LoraSwitcherExtension {
    ctx: ExtensionContext,
}

impl LoraSwitcherExtension {
    pub fn new(source: Arc<dyn NameSource>) -> Self {
        let ctx = ExtensionContext::new(source);
        // Warm the cache at startup; failures land as sentinel entries.
        ctx.refresh_names();
        Self { ctx }
    }

    /// Convenience constructor for the HTTP endpoint of the host server.
    pub fn from_base_url(base_url: impl Into<String>) -> Self {
        Self::new(Arc::new(HttpNameSource::new(base_url)))
    }

    pub fn context(&self) -> &ExtensionContext {
        &self.ctx
    }

    pub fn node_types(&self) -> [&'static str; 2] {
        [DYNAMIC_NODE_TYPE, NUMBERED_NODE_TYPE]
    }

    /// Instantiate the widget set for a node of `node_type`, sharing the
    /// extension's name cache.
    pub fn create_lifecycle(&self, node_type: &str) -> Option<LoraSwitcherRack> {
        let style = match node_type {
            DYNAMIC_NODE_TYPE => RackStyle::Dynamic,
            NUMBERED_NODE_TYPE => RackStyle::Numbered,
            _ => return None,
        };
        Some(LoraSwitcherRack::new(style, self.ctx.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::NameSourceError;
    use crate::types::LoraEntry;
    use crate::widget::PendingRowActions;
    use std::collections::HashMap;

    struct StubSource;
    impl NameSource for StubSource {
        fn fetch_names(&self) -> Result<Vec<String>, NameSourceError> {
            Ok(vec!["None".into(), "loraX".into(), "loraY".into()])
        }
    }

    struct TestNode {
        properties: HashMap<String, String>,
        redraws: usize,
        height: f32,
    }

    impl TestNode {
        fn new() -> Self {
            Self {
                properties: HashMap::new(),
                redraws: 0,
                height: 0.0,
            }
        }
    }

    impl LoraHostNode for TestNode {
        fn get_property(&self, key: &str) -> Option<String> {
            self.properties.get(key).cloned()
        }
        fn set_property(&mut self, key: &str, value: String) {
            self.properties.insert(key.to_string(), value);
        }
        fn request_redraw(&mut self) {
            self.redraws += 1;
        }
        fn set_tooltip(&mut self, _text: Option<&str>) {}
        fn ensure_height(&mut self, height: f32) {
            self.height = self.height.max(height);
        }
    }

    fn dynamic_rack() -> LoraSwitcherRack {
        LoraSwitcherRack::new(
            RackStyle::Dynamic,
            ExtensionContext::new(Arc::new(StubSource)),
        )
    }

    fn numbered_rack() -> LoraSwitcherRack {
        LoraSwitcherRack::new(
            RackStyle::Numbered,
            ExtensionContext::new(Arc::new(StubSource)),
        )
    }

    #[test]
    fn create_installs_controls_and_empty_config() {
        let mut node = TestNode::new();
        let mut rack = dynamic_rack();
        rack.on_create(&mut node);
        assert_eq!(node.get_property(CONFIG_KEY), Some("[]".to_string()));
        assert_eq!(rack.list().hidden_value(), Some("[]".to_string()));
        assert_eq!(rack.list().row_count(), 0);
        assert!(node.height > 0.0);
        assert_eq!(node.redraws, 1);
    }

    #[test]
    fn configure_restores_rows_from_property() {
        let mut node = TestNode::new();
        node.set_property(
            CONFIG_KEY,
            r#"[{"lora":"a.safetensors","strength":0.8},{"lora":"b","strength":1.2}]"#.to_string(),
        );
        let mut rack = dynamic_rack();
        rack.on_create(&mut node);
        rack.on_configure(&mut node, None);
        let entries = rack.list().entries_ordered();
        assert_eq!(
            entries,
            vec![
                LoraEntry::new("a.safetensors", 0.8),
                LoraEntry::new("b", 1.2),
            ]
        );
        // Both sinks reflect the restored config.
        assert_eq!(node.get_property(CONFIG_KEY), rack.list().hidden_value());
    }

    #[test]
    fn configure_with_malformed_property_yields_empty_config() {
        let mut node = TestNode::new();
        node.set_property(CONFIG_KEY, "{not json".to_string());
        let mut rack = dynamic_rack();
        rack.on_create(&mut node);
        rack.on_configure(&mut node, None);
        assert_eq!(rack.list().row_count(), 0);
        assert_eq!(node.get_property(CONFIG_KEY), Some("[]".to_string()));
    }

    #[test]
    fn create_preserves_property_restored_before_instantiation() {
        let mut node = TestNode::new();
        node.set_property(CONFIG_KEY, r#"[{"lora":"a","strength":0.8}]"#.to_string());
        let mut rack = dynamic_rack();
        rack.on_create(&mut node);
        rack.on_configure(&mut node, None);
        assert_eq!(
            rack.list().entries_ordered(),
            vec![LoraEntry::new("a", 0.8)]
        );
    }

    #[test]
    fn configure_falls_back_to_saved_widget_values() {
        // Legacy save with no property; the config only survives in the
        // hidden widget's saved value.
        let mut node = TestNode::new();
        let mut rack = dynamic_rack();
        let saved = SavedNodeInfo {
            widget_values: vec![serde_json::Value::String(
                r#"[{"lora":"legacy","strength":0.5}]"#.to_string(),
            )],
        };
        rack.on_configure(&mut node, Some(&saved));
        assert_eq!(
            rack.list().entries_ordered(),
            vec![LoraEntry::new("legacy", 0.5)]
        );
        // Configure promotes the restored config to the property sink.
        assert_eq!(
            node.get_property(CONFIG_KEY),
            Some(r#"[{"lora":"legacy","strength":0.5}]"#.to_string())
        );
    }

    #[test]
    fn configure_prefers_property_over_saved_widget_values() {
        let mut node = TestNode::new();
        node.set_property(CONFIG_KEY, r#"[{"lora":"current","strength":1.0}]"#.to_string());
        let mut rack = dynamic_rack();
        let saved = SavedNodeInfo {
            widget_values: vec![serde_json::Value::String(
                r#"[{"lora":"stale","strength":0.5}]"#.to_string(),
            )],
        };
        rack.on_configure(&mut node, Some(&saved));
        assert_eq!(
            rack.list().entries_ordered(),
            vec![LoraEntry::new("current", 1.0)]
        );
    }

    #[test]
    fn configure_with_no_sink_starts_empty() {
        let mut node = TestNode::new();
        let mut rack = dynamic_rack();
        rack.on_configure(&mut node, None);
        assert_eq!(rack.list().row_count(), 0);
        assert_eq!(node.get_property(CONFIG_KEY), Some("[]".to_string()));
    }

    #[test]
    fn configure_prunes_rows_beyond_saved_count() {
        let mut node = TestNode::new();
        let mut rack = dynamic_rack();
        rack.on_create(&mut node);
        for _ in 0..4 {
            rack.list.add_row(LoraEntry::new("stale", 1.0));
        }
        node.set_property(CONFIG_KEY, r#"[{"lora":"kept","strength":1.0}]"#.to_string());
        rack.on_configure(&mut node, None);
        assert_eq!(
            rack.list().entries_ordered(),
            vec![LoraEntry::new("kept", 1.0)]
        );
    }

    #[test]
    fn configure_twice_is_idempotent() {
        let mut node = TestNode::new();
        node.set_property(CONFIG_KEY, r#"[{"lora":"a","strength":0.8}]"#.to_string());
        let mut rack = dynamic_rack();
        rack.on_create(&mut node);
        rack.on_configure(&mut node, None);
        let first = node.get_property(CONFIG_KEY);
        rack.on_configure(&mut node, None);
        assert_eq!(node.get_property(CONFIG_KEY), first);
        assert_eq!(rack.list().row_count(), 1);
    }

    #[test]
    fn numbered_configure_clamps_and_caps() {
        let mut node = TestNode::new();
        let entries: Vec<String> = (0..22)
            .map(|i| format!(r#"{{"lora":"l{i}","strength":11.0}}"#))
            .collect();
        node.set_property(CONFIG_KEY, format!("[{}]", entries.join(",")));
        let mut rack = numbered_rack();
        rack.on_create(&mut node);
        rack.on_configure(&mut node, None);
        assert_eq!(rack.list().row_count(), numbered::MAX_ROWS);
        assert!(rack.list().rows().all(|r| r.entry.strength == 10.0));
        let indices: Vec<usize> = {
            let mut v: Vec<usize> = rack.list().rows().map(|r| r.index).collect();
            v.sort_unstable();
            v
        };
        assert_eq!(indices.first(), Some(&1));
        assert_eq!(indices.last(), Some(&numbered::MAX_ROWS));
    }

    #[test]
    fn selecting_name_reflects_in_hidden_sink_immediately() {
        let mut node = TestNode::new();
        let mut rack = dynamic_rack();
        rack.on_create(&mut node);
        rack.list.add_row(LoraEntry::none());
        let pending = PendingRowActions {
            names_to_set: vec![(0, "loraY".to_string())],
            ..Default::default()
        };
        assert!(pending.apply(&mut rack.list));
        config::recompute(&mut rack.list, &mut node);
        let json = r#"[{"lora":"loraY","strength":1.0}]"#.to_string();
        assert_eq!(rack.list().hidden_value(), Some(json.clone()));
        assert_eq!(node.get_property(CONFIG_KEY), Some(json));
    }

    #[test]
    fn serialize_exposes_hidden_value_without_rewriting_property() {
        let mut node = TestNode::new();
        let mut rack = dynamic_rack();
        rack.on_create(&mut node);
        rack.list.add_row(LoraEntry::new("a", 0.8));
        config::recompute(&mut rack.list, &mut node);
        let property_before = node.get_property(CONFIG_KEY);

        let mut out = SavedNodeInfo::default();
        rack.on_serialize(&node, &mut out);
        assert_eq!(node.get_property(CONFIG_KEY), property_before);
        assert_eq!(
            out.widget_values,
            vec![serde_json::Value::String(property_before.unwrap())]
        );
    }

    #[test]
    fn extension_serves_both_node_types() {
        let ext = LoraSwitcherExtension::new(Arc::new(StubSource));
        let dynamic = ext.create_lifecycle(DYNAMIC_NODE_TYPE).unwrap();
        let numbered = ext.create_lifecycle(NUMBERED_NODE_TYPE).unwrap();
        assert_eq!(dynamic.style(), RackStyle::Dynamic);
        assert_eq!(numbered.style(), RackStyle::Numbered);
        assert!(ext.create_lifecycle("SomethingElse").is_none());
    }
}
