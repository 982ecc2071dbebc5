//! Numbered rack variant: three primitive widgets per row instead of one
//! composite drawing, 1-based indices, clamped strengths, capped rows.

use egui::{self, ComboBox, DragValue};

use crate::config;
use crate::names::NameCache;
use crate::reconciler::{ADD_LABEL, WidgetList};
use crate::row::display_name;
use crate::theme::RackTheme;
use crate::traits::LoraHostNode;
use crate::types::{LoraEntry, NONE_LORA};
use crate::widget::PendingRowActions;

/// Accepted strength range.
pub const STRENGTH_MIN: f64 = -10.0;
pub const STRENGTH_MAX: f64 = 10.0;

/// Strength editor step.
pub const STRENGTH_STEP: f64 = 0.01;

/// Row cap of the numbered variant.
pub const MAX_ROWS: usize = 20;

pub fn clamp_strength(value: f64) -> f64 {
    value.clamp(STRENGTH_MIN, STRENGTH_MAX)
}

pub struct NumberedRackWidget<'a> {
    list: &'a mut WidgetList,
    theme: &'a RackTheme,
    names: &'a NameCache,
}

impl<'a> NumberedRackWidget<'a> {
    pub fn new(list: &'a mut WidgetList, theme: &'a RackTheme, names: &'a NameCache) -> Self {
        Self { list, theme, names }
    }

    /// Draw the rack with primitive widgets and handle edits for one frame.
    pub fn show(&mut self, ui: &mut egui::Ui, node: &mut dyn LoraHostNode) -> bool {
        let mut pending = PendingRowActions::default();

        let mut rows: Vec<(usize, LoraEntry)> = self
            .list
            .rows()
            .map(|r| (r.index, r.entry.clone()))
            .collect();
        rows.sort_by_key(|&(index, _)| index);
        let row_count = rows.len();
        let available = self.names.snapshot();

        for (index, entry) in rows {
            ui.horizontal(|ui| {
                ui.label(index.to_string());

                let combo = ComboBox::from_id_salt(("lora_name", index))
                    .selected_text(display_name(&entry.name))
                    .width(ui.available_width() * self.theme.name_fraction);
                let combo_response = combo
                    .show_ui(ui, |ui| {
                        // Options keep the full name so long entries sharing
                        // a prefix stay distinguishable.
                        for name in &available {
                            if ui
                                .selectable_label(entry.name == *name, name.as_str())
                                .clicked()
                            {
                                pending.names_to_set.push((index, name.clone()));
                            }
                        }
                    })
                    .response;
                if entry.name != NONE_LORA && !entry.name.is_empty() {
                    combo_response.on_hover_text(entry.name.clone());
                }

                let mut strength = entry.strength;
                let drag = ui.add(
                    DragValue::new(&mut strength)
                        .range(STRENGTH_MIN..=STRENGTH_MAX)
                        .speed(STRENGTH_STEP)
                        .fixed_decimals(2),
                );
                if drag.changed() {
                    pending
                        .strengths_to_set
                        .push((index, clamp_strength(strength)));
                }

                if ui.button("X").clicked() {
                    pending.rows_to_remove.push(index);
                }
            });
        }

        if row_count < MAX_ROWS && ui.button(ADD_LABEL).clicked() {
            pending.rows_to_add += 1;
        }

        if pending.is_empty() {
            return false;
        }
        if pending.apply(self.list) {
            config::recompute(self.list, node);
            node.request_redraw();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_strengths_are_accepted() {
        assert_eq!(clamp_strength(-10.0), -10.0);
        assert_eq!(clamp_strength(10.0), 10.0);
    }

    #[test]
    fn out_of_range_strength_is_clamped() {
        assert_eq!(clamp_strength(10.01), 10.0);
        assert_eq!(clamp_strength(-10.01), -10.0);
    }

    #[test]
    fn numbered_rows_start_at_one() {
        let mut list = WidgetList::new(1);
        list.ensure_add_button();
        assert_eq!(list.add_row(LoraEntry::none()), 1);
        assert_eq!(list.add_row(LoraEntry::none()), 2);
        list.remove_row(1);
        let indices: Vec<usize> = list.rows().map(|r| r.index).collect();
        assert_eq!(indices, vec![1]);
    }
}
