//! Widget-list reconciliation: keeps the row widgets consistent with a
//! dense index sequence, with the add-control always trailing the rows.

use log::warn;

use crate::config::HiddenConfigWidget;
use crate::row::RowWidget;
use crate::theme::RackTheme;
use crate::types::LoraEntry;

/// Label of the trailing add-control.
pub const ADD_LABEL: &str = "+ Add LoRA";

/// One widget in the node's widget list.
pub enum RackWidget {
    Row(RowWidget),
    AddButton,
    HiddenConfig(HiddenConfigWidget),
}

/// The node's widget list plus the index base (0 for the dynamic variant,
/// 1 for the numbered one).
///
/// Invariant, restored after every mutation: row indices are contiguous
/// from the base with no gaps and no duplicates.
pub struct WidgetList {
    items: Vec<RackWidget>,
    base_index: usize,
}

impl WidgetList {
    pub fn new(base_index: usize) -> Self {
        Self {
            items: Vec::new(),
            base_index,
        }
    }

    pub fn base_index(&self) -> usize {
        self.base_index
    }

    pub fn items(&self) -> &[RackWidget] {
        &self.items
    }

    pub fn row_count(&self) -> usize {
        self.rows().count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &RowWidget> {
        self.items.iter().filter_map(|w| match w {
            RackWidget::Row(row) => Some(row),
            _ => None,
        })
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut RowWidget> {
        self.items.iter_mut().filter_map(|w| match w {
            RackWidget::Row(row) => Some(row),
            _ => None,
        })
    }

    pub fn get_row_mut(&mut self, index: usize) -> Option<&mut RowWidget> {
        self.rows_mut().find(|r| r.index == index)
    }

    /// Entries in presentation order (ordered by index).
    pub fn entries_ordered(&self) -> Vec<LoraEntry> {
        let mut rows: Vec<&RowWidget> = self.rows().collect();
        rows.sort_by_key(|r| r.index);
        rows.into_iter().map(|r| r.entry.clone()).collect()
    }

    /// Install the add-control once; repeated create/configure passes must
    /// not duplicate it.
    pub fn ensure_add_button(&mut self) {
        if !self
            .items
            .iter()
            .any(|w| matches!(w, RackWidget::AddButton))
        {
            self.items.push(RackWidget::AddButton);
        }
    }

    /// Install or fetch the hidden config sink.
    pub fn ensure_hidden(&mut self) -> &mut HiddenConfigWidget {
        let pos = self
            .items
            .iter()
            .position(|w| matches!(w, RackWidget::HiddenConfig(_)));
        let pos = match pos {
            Some(p) => p,
            None => {
                self.items
                    .push(RackWidget::HiddenConfig(HiddenConfigWidget::new("[]")));
                self.items.len() - 1
            }
        };
        match &mut self.items[pos] {
            RackWidget::HiddenConfig(hidden) => hidden,
            _ => unreachable!("position found above"),
        }
    }

    pub fn hidden_value(&self) -> Option<String> {
        self.items.iter().find_map(|w| match w {
            RackWidget::HiddenConfig(h) => Some(h.value().to_string()),
            _ => None,
        })
    }

    /// Append a row at the next dense index, inserted immediately before
    /// the add-control so the control keeps trailing the rows.
    pub fn add_row(&mut self, entry: LoraEntry) -> usize {
        let index = self.base_index + self.row_count();
        let row = RackWidget::Row(RowWidget::new(index, entry));
        let add_pos = self
            .items
            .iter()
            .position(|w| matches!(w, RackWidget::AddButton));
        match add_pos {
            Some(pos) => self.items.insert(pos, row),
            None => self.items.push(row),
        }
        index
    }

    /// Remove the row(s) at `index` and renumber the remainder. Removing a
    /// nonexistent index is a no-op.
    pub fn remove_row(&mut self, index: usize) -> bool {
        let before = self.items.len();
        self.items.retain(|w| match w {
            RackWidget::Row(row) => row.index != index,
            _ => true,
        });
        if self.items.len() == before {
            warn!("remove of nonexistent lora row {index} ignored");
            return false;
        }
        self.renumber();
        true
    }

    /// Drop rows beyond the first `count`, then renumber.
    pub fn prune_rows_beyond(&mut self, count: usize) {
        let base = self.base_index;
        self.items.retain(|w| match w {
            RackWidget::Row(row) => row.index < base + count,
            _ => true,
        });
        self.renumber();
    }

    /// Re-derive dense indices: sort remaining rows by their current index
    /// and reassign sequentially from the base.
    pub fn renumber(&mut self) {
        let mut positions: Vec<(usize, usize)> = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(pos, w)| match w {
                RackWidget::Row(row) => Some((pos, row.index)),
                _ => None,
            })
            .collect();
        positions.sort_by_key(|&(_, index)| index);
        for (seq, (pos, _)) in positions.into_iter().enumerate() {
            if let RackWidget::Row(row) = &mut self.items[pos] {
                row.index = self.base_index + seq;
            }
        }
    }

    /// Stack height of the visible widgets. The hidden sink contributes
    /// zero.
    pub fn total_height(&self, theme: &RackTheme) -> f32 {
        self.items
            .iter()
            .map(|w| match w {
                RackWidget::Row(_) | RackWidget::AddButton => {
                    theme.row_height + theme.row_spacing
                }
                RackWidget::HiddenConfig(h) => h.compute_height(),
            })
            .sum()
    }

    /// Widget values in host serialization order; rows opt out of direct
    /// serialization, the hidden sink opts in.
    pub fn serialize_values(&self) -> Vec<serde_json::Value> {
        self.items
            .iter()
            .filter_map(|w| match w {
                RackWidget::HiddenConfig(h) => Some(h.serialize_value()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(list: &WidgetList) -> Vec<usize> {
        let mut v: Vec<usize> = list.rows().map(|r| r.index).collect();
        v.sort_unstable();
        v
    }

    fn assert_contiguous(list: &WidgetList) {
        let got = indices(list);
        let want: Vec<usize> =
            (list.base_index()..list.base_index() + got.len()).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn add_assigns_dense_indices() {
        let mut list = WidgetList::new(0);
        list.ensure_add_button();
        assert_eq!(list.add_row(LoraEntry::none()), 0);
        assert_eq!(list.add_row(LoraEntry::none()), 1);
        assert_eq!(list.add_row(LoraEntry::none()), 2);
        assert_contiguous(&list);
    }

    #[test]
    fn add_inserts_before_add_control() {
        let mut list = WidgetList::new(0);
        list.ensure_add_button();
        list.add_row(LoraEntry::none());
        list.add_row(LoraEntry::none());
        // The add-control stays last among visible widgets.
        let last_visible = list
            .items()
            .iter()
            .rev()
            .find(|w| !matches!(w, RackWidget::HiddenConfig(_)));
        assert!(matches!(last_visible, Some(RackWidget::AddButton)));
    }

    #[test]
    fn ensure_add_button_is_idempotent() {
        let mut list = WidgetList::new(0);
        list.ensure_add_button();
        list.ensure_add_button();
        let buttons = list
            .items()
            .iter()
            .filter(|w| matches!(w, RackWidget::AddButton))
            .count();
        assert_eq!(buttons, 1);
    }

    #[test]
    fn remove_renumbers_remaining_rows() {
        let mut list = WidgetList::new(0);
        list.ensure_add_button();
        for _ in 0..4 {
            list.add_row(LoraEntry::none());
        }
        assert!(list.remove_row(1));
        assert_eq!(list.row_count(), 3);
        assert_contiguous(&list);
    }

    #[test]
    fn remove_missing_index_is_noop() {
        let mut list = WidgetList::new(0);
        list.add_row(LoraEntry::none());
        assert!(!list.remove_row(7));
        assert_eq!(list.row_count(), 1);
        assert_contiguous(&list);
    }

    #[test]
    fn remove_only_row_yields_empty_config() {
        let mut list = WidgetList::new(0);
        list.ensure_add_button();
        list.add_row(LoraEntry::none());
        assert!(list.remove_row(0));
        assert_eq!(list.row_count(), 0);
        assert!(list.entries_ordered().is_empty());
    }

    #[test]
    fn add_remove_scenario_keeps_survivor_at_base() {
        let mut list = WidgetList::new(0);
        list.ensure_add_button();
        let a = list.add_row(LoraEntry::new("loraA", 0.8));
        list.add_row(LoraEntry::new("loraB", 1.2));
        list.remove_row(a);
        let entries = list.entries_ordered();
        assert_eq!(entries, vec![LoraEntry::new("loraB", 1.2)]);
        assert_eq!(indices(&list), vec![0]);
    }

    #[test]
    fn one_based_lists_stay_contiguous_from_one() {
        let mut list = WidgetList::new(1);
        list.ensure_add_button();
        assert_eq!(list.add_row(LoraEntry::none()), 1);
        assert_eq!(list.add_row(LoraEntry::none()), 2);
        assert_eq!(list.add_row(LoraEntry::none()), 3);
        list.remove_row(2);
        assert_eq!(indices(&list), vec![1, 2]);
    }

    #[test]
    fn random_op_sequences_preserve_contiguity() {
        // Deterministic mixed sequence of adds and removes.
        let mut list = WidgetList::new(0);
        list.ensure_add_button();
        let ops: &[(bool, usize)] = &[
            (true, 0),
            (true, 0),
            (true, 0),
            (false, 1),
            (true, 0),
            (false, 0),
            (false, 5), // missing, no-op
            (true, 0),
            (false, 2),
        ];
        for &(is_add, index) in ops {
            if is_add {
                list.add_row(LoraEntry::none());
            } else {
                list.remove_row(index);
            }
            assert_contiguous(&list);
        }
    }

    #[test]
    fn prune_drops_excess_rows() {
        let mut list = WidgetList::new(0);
        for _ in 0..5 {
            list.add_row(LoraEntry::none());
        }
        list.prune_rows_beyond(2);
        assert_eq!(list.row_count(), 2);
        assert_contiguous(&list);
    }

    #[test]
    fn serialize_values_contains_only_hidden_sink() {
        let mut list = WidgetList::new(0);
        list.ensure_add_button();
        list.add_row(LoraEntry::none());
        list.ensure_hidden().set_value("[]".to_string());
        let values = list.serialize_values();
        assert_eq!(values, vec![serde_json::Value::String("[]".to_string())]);
    }

    #[test]
    fn hidden_sink_has_zero_height() {
        let mut list = WidgetList::new(0);
        let theme = RackTheme::default();
        let before = list.total_height(&theme);
        list.ensure_hidden();
        assert_eq!(list.total_height(&theme), before);
    }
}
