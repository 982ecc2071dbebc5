//! Transient UI state for one rack instance.

use std::sync::mpsc;

use egui::Pos2;

/// Per-node UI state. All of it is touched only from the UI thread.
#[derive(Default)]
pub struct RackUiState {
    /// Open name-selection menu, if any.
    pub menu: Option<MenuState>,
    /// Open strength prompt, if any.
    pub prompt: Option<PromptState>,
    /// Row whose name region set the tooltip last frame.
    pub tooltip_row: Option<usize>,
}

/// Name-selection menu for one row. Presentation is gated on the fetch
/// completing; until then only a placeholder is shown.
pub struct MenuState {
    pub row: usize,
    pub screen_pos: Pos2,
    /// Completion channel of the fetch started on press.
    pub pending: Option<mpsc::Receiver<Vec<String>>>,
    /// Names to present once the fetch delivered them.
    pub names: Option<Vec<String>>,
}

/// Strength input prompt for one row.
pub struct PromptState {
    pub row: usize,
    pub screen_pos: Pos2,
    pub buffer: String,
}
