//! Main rack widget for the dynamic variant: one composite custom-drawn
//! row per entry, a trailing add-control, and the hidden config sink.

use std::sync::Arc;
use std::sync::mpsc::TryRecvError;

use egui::{self, Align2, FontId, Pos2, Rect, Sense, Vec2};

use crate::config;
use crate::names::{NameCache, spawn_fetch};
use crate::reconciler::{ADD_LABEL, RackWidget, WidgetList};
use crate::row::{self, RowRegions};
use crate::state::{MenuState, PromptState, RackUiState};
use crate::theme::RackTheme;
use crate::traits::{LoraHostNode, NameSource};
use crate::types::{LoraEntry, RowHandle, RowRole};

// ---------------------------------------------------------------------------
// PendingRowActions
// ---------------------------------------------------------------------------

/// Mutations collected during the render phase, applied after.
#[derive(Default)]
pub struct PendingRowActions {
    pub names_to_set: Vec<(usize, String)>,
    pub strengths_to_set: Vec<(usize, f64)>,
    pub rows_to_remove: Vec<usize>,
    pub rows_to_add: usize,
}

impl PendingRowActions {
    pub fn is_empty(&self) -> bool {
        self.names_to_set.is_empty()
            && self.strengths_to_set.is_empty()
            && self.rows_to_remove.is_empty()
            && self.rows_to_add == 0
    }

    /// Apply to the widget list. Returns whether anything changed, so the
    /// caller knows to recompute the config sinks and request a redraw.
    pub fn apply(self, list: &mut WidgetList) -> bool {
        let mut changed = false;
        for (index, name) in self.names_to_set {
            if let Some(row) = list.get_row_mut(index) {
                row.entry.name = name;
                changed = true;
            }
        }
        for (index, strength) in self.strengths_to_set {
            if let Some(row) = list.get_row_mut(index) {
                row.entry.strength = strength;
                changed = true;
            }
        }
        for index in self.rows_to_remove {
            changed |= list.remove_row(index);
        }
        for _ in 0..self.rows_to_add {
            list.add_row(LoraEntry::none());
            changed = true;
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// LoraRackWidget
// ---------------------------------------------------------------------------

pub struct LoraRackWidget<'a> {
    list: &'a mut WidgetList,
    state: &'a mut RackUiState,
    theme: &'a RackTheme,
    source: &'a Arc<dyn NameSource>,
    names: &'a NameCache,
}

impl<'a> LoraRackWidget<'a> {
    pub fn new(
        list: &'a mut WidgetList,
        state: &'a mut RackUiState,
        theme: &'a RackTheme,
        source: &'a Arc<dyn NameSource>,
        names: &'a NameCache,
    ) -> Self {
        Self {
            list,
            state,
            theme,
            source,
            names,
        }
    }

    /// Draw the rack and handle its input for one frame. Returns whether a
    /// pointer event was consumed, so the host can route unhandled events
    /// elsewhere.
    pub fn show(&mut self, ui: &mut egui::Ui, node: &mut dyn LoraHostNode) -> bool {
        let width = ui.available_width();
        let height = self
            .list
            .total_height(self.theme)
            .max(self.theme.row_height);
        let (response, painter) = ui.allocate_painter(Vec2::new(width, height), Sense::click());
        let origin = response.rect.min;

        // Layout and draw pass: stack visible widgets top-down, recomputing
        // every region from the current width.
        let mut row_layouts: Vec<(usize, RowRegions)> = Vec::new();
        let mut add_rect: Option<Rect> = None;
        let mut y = origin.y;
        for item in self.list.items() {
            match item {
                RackWidget::Row(row_widget) => {
                    let rect = Rect::from_min_size(
                        Pos2::new(origin.x, y),
                        Vec2::new(width, self.theme.row_height),
                    );
                    let regions = row::layout_row(rect, self.theme);
                    row_widget.draw(&painter, &regions, self.theme);
                    row_layouts.push((row_widget.index, regions));
                    y += self.theme.row_height + self.theme.row_spacing;
                }
                RackWidget::AddButton => {
                    let rect = Rect::from_min_size(
                        Pos2::new(origin.x + self.theme.row_margin, y),
                        Vec2::new(
                            (width - self.theme.row_margin * 2.0).max(0.0),
                            self.theme.row_height,
                        ),
                    );
                    painter.rect_filled(rect, 4.0, self.theme.add_button_color);
                    painter.text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        ADD_LABEL,
                        FontId::proportional(self.theme.font_size),
                        self.theme.add_text_color,
                    );
                    add_rect = Some(rect);
                    y += self.theme.row_height + self.theme.row_spacing;
                }
                RackWidget::HiddenConfig(hidden) => {
                    hidden.draw(&painter);
                }
            }
        }

        let mut pending = PendingRowActions::default();
        let mut handled = false;

        // Pointer move: tooltip over the name region, cleared elsewhere.
        if let Some(pos) = ui.input(|i| i.pointer.hover_pos()) {
            handled |= self.update_tooltip(node, pos, &row_layouts);
        }

        // Pointer press inside a sub-region or the add-control.
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                handled |= self.on_press(pos, &row_layouts, add_rect, &mut pending);
            }
        }

        self.render_menu(ui, &mut pending);
        self.render_prompt(ui, &mut pending);

        if !pending.is_empty() {
            handled = true;
            if pending.apply(self.list) {
                config::recompute(self.list, node);
                node.request_redraw();
            }
        }

        handled
    }

    fn update_tooltip(
        &mut self,
        node: &mut dyn LoraHostNode,
        pos: Pos2,
        row_layouts: &[(usize, RowRegions)],
    ) -> bool {
        let over_name = row_layouts
            .iter()
            .find(|(_, regions)| row::hit_test(regions, pos) == Some(RowRole::Name))
            .map(|&(index, _)| index);

        match over_name {
            Some(index) => {
                let full = self
                    .list
                    .rows()
                    .find(|r| r.index == index)
                    .and_then(|r| r.tooltip_name().map(str::to_string));
                if let Some(full) = full {
                    if self.state.tooltip_row != Some(index) {
                        node.set_tooltip(Some(&full));
                        self.state.tooltip_row = Some(index);
                    }
                    return true;
                }
                self.clear_tooltip(node);
                false
            }
            None => {
                self.clear_tooltip(node);
                false
            }
        }
    }

    fn clear_tooltip(&mut self, node: &mut dyn LoraHostNode) {
        if self.state.tooltip_row.take().is_some() {
            node.set_tooltip(None);
        }
    }

    fn on_press(
        &mut self,
        pos: Pos2,
        row_layouts: &[(usize, RowRegions)],
        add_rect: Option<Rect>,
        pending: &mut PendingRowActions,
    ) -> bool {
        for &(index, ref regions) in row_layouts {
            let Some(role) = row::hit_test(regions, pos) else {
                continue;
            };
            let handle = RowHandle { index, role };
            match handle.role {
                RowRole::Name => {
                    // Fetch the latest list first; the menu is presented
                    // once the completion arrives.
                    let rx = spawn_fetch(Arc::clone(self.source), self.names.clone());
                    self.state.menu = Some(MenuState {
                        row: handle.index,
                        screen_pos: pos,
                        pending: Some(rx),
                        names: None,
                    });
                }
                RowRole::Strength => {
                    let current = self
                        .list
                        .rows()
                        .find(|r| r.index == handle.index)
                        .map(|r| r.entry.strength)
                        .unwrap_or(crate::types::DEFAULT_STRENGTH);
                    self.state.prompt = Some(PromptState {
                        row: handle.index,
                        screen_pos: pos,
                        buffer: current.to_string(),
                    });
                }
                RowRole::Remove => {
                    pending.rows_to_remove.push(handle.index);
                }
                RowRole::Index => {}
            }
            return true;
        }

        if let Some(rect) = add_rect {
            if rect.contains(pos) {
                pending.rows_to_add += 1;
                return true;
            }
        }
        false
    }

    fn render_menu(&mut self, ui: &mut egui::Ui, pending: &mut PendingRowActions) {
        let Some(menu) = self.state.menu.as_mut() else {
            return;
        };

        // Poll the in-flight fetch; a dropped sender falls back to the
        // shared cache.
        if menu.names.is_none() {
            if let Some(rx) = &menu.pending {
                match rx.try_recv() {
                    Ok(names) => {
                        menu.names = Some(names);
                        menu.pending = None;
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        menu.names = Some(self.names.snapshot());
                        menu.pending = None;
                    }
                }
            } else {
                menu.names = Some(self.names.snapshot());
            }
        }

        let row = menu.row;
        let screen_pos = menu.screen_pos;
        let names = menu.names.clone();

        let mut close = false;
        let popup_id = ui.make_persistent_id("lora_name_menu");
        egui::Area::new(popup_id)
            .order(egui::Order::Foreground)
            .fixed_pos(screen_pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::menu(ui.style()).show(ui, |ui| {
                    ui.set_max_width(250.0);
                    match &names {
                        None => {
                            ui.label("Loading...");
                        }
                        Some(names) => {
                            egui::ScrollArea::vertical()
                                .max_height(300.0)
                                .show(ui, |ui| {
                                    for name in names {
                                        if ui.button(name).clicked() {
                                            pending.names_to_set.push((row, name.clone()));
                                            close = true;
                                        }
                                    }
                                });
                        }
                    }
                });
            });
        if close || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.state.menu = None;
        }
    }

    fn render_prompt(&mut self, ui: &mut egui::Ui, pending: &mut PendingRowActions) {
        let Some(prompt) = self.state.prompt.as_mut() else {
            return;
        };

        let mut close = false;
        let mut submit = false;
        let popup_id = ui.make_persistent_id("lora_strength_prompt");
        egui::Area::new(popup_id)
            .order(egui::Order::Foreground)
            .fixed_pos(prompt.screen_pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::menu(ui.style()).show(ui, |ui| {
                    ui.label("Enter new strength:");
                    let response = ui.text_edit_singleline(&mut prompt.buffer);
                    if !response.has_focus() {
                        response.request_focus();
                    }
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        submit = true;
                    }
                });
            });

        if submit {
            // Non-numeric or non-finite input is discarded silently; the
            // prior value stays.
            if let Ok(value) = prompt.buffer.trim().parse::<f64>() {
                if value.is_finite() {
                    pending.strengths_to_set.push((prompt.row, value));
                }
            }
            close = true;
        }
        if close || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.state.prompt = None;
        }
    }
}
