//! Row layout, drawing and hit-testing for the dynamic rack variant.

use egui::{Align2, FontId, Pos2, Rect, Vec2};

use crate::theme::RackTheme;
use crate::types::{LoraEntry, NONE_LORA, RowRole};

/// File extension stripped from displayed names.
const LORA_EXTENSION: &str = ".safetensors";

/// Longest displayed name before ellipsizing.
const MAX_DISPLAY_CHARS: usize = 15;

/// Bounds of a row's interactive sub-regions, recomputed from the current
/// widget width on every draw call.
#[derive(Clone, Copy, Debug)]
pub struct RowRegions {
    pub row: Rect,
    pub index: Rect,
    pub name: Rect,
    pub strength: Rect,
    pub remove: Rect,
}

/// Compute the sub-region bounds for a row occupying `rect`.
/// Index / name / strength take their theme fractions of the inner width;
/// the remove control takes the remainder.
pub fn layout_row(rect: Rect, theme: &RackTheme) -> RowRegions {
    let inner = Rect::from_min_size(
        Pos2::new(rect.min.x + theme.row_margin, rect.min.y),
        Vec2::new(
            (rect.width() - theme.row_margin * 2.0).max(0.0),
            rect.height(),
        ),
    );
    let index_w = inner.width() * theme.index_fraction;
    let name_w = inner.width() * theme.name_fraction;
    let strength_w = inner.width() * theme.strength_fraction;

    let index_x = inner.min.x;
    let name_x = index_x + index_w;
    let strength_x = name_x + name_w;
    let remove_x = strength_x + strength_w;

    let region = |x: f32, w: f32| {
        Rect::from_min_size(Pos2::new(x, inner.min.y), Vec2::new(w, inner.height()))
    };

    RowRegions {
        row: inner,
        index: region(index_x, index_w),
        name: region(name_x, name_w),
        strength: region(strength_x, strength_w),
        remove: region(remove_x, inner.max.x - remove_x),
    }
}

/// Which sub-region contains `pos`, if any.
pub fn hit_test(regions: &RowRegions, pos: Pos2) -> Option<RowRole> {
    if !regions.row.contains(pos) {
        return None;
    }
    if regions.index.contains(pos) {
        Some(RowRole::Index)
    } else if regions.name.contains(pos) {
        Some(RowRole::Name)
    } else if regions.strength.contains(pos) {
        Some(RowRole::Strength)
    } else if regions.remove.contains(pos) {
        Some(RowRole::Remove)
    } else {
        None
    }
}

/// Name as displayed in the row: extension stripped, ellipsized beyond 15
/// characters. The full name is kept for the tooltip and the stored value.
pub fn display_name(name: &str) -> String {
    let name = if name.is_empty() { NONE_LORA } else { name };
    let name = name.strip_suffix(LORA_EXTENSION).unwrap_or(name);
    if name.chars().count() <= MAX_DISPLAY_CHARS {
        return name.to_string();
    }
    let head: String = name.chars().take(MAX_DISPLAY_CHARS - 3).collect();
    format!("{head}...")
}

/// Strength as displayed: exactly two decimal digits.
pub fn display_strength(strength: f64) -> String {
    format!("{strength:.2}")
}

/// One LoRA entry rendered as a composite custom-drawn widget.
pub struct RowWidget {
    pub index: usize,
    pub entry: LoraEntry,
}

impl RowWidget {
    pub fn new(index: usize, entry: LoraEntry) -> Self {
        Self { index, entry }
    }

    /// Full name for the tooltip, or None for the unset sentinel.
    pub fn tooltip_name(&self) -> Option<&str> {
        if self.entry.name == NONE_LORA || self.entry.name.is_empty() {
            None
        } else {
            Some(&self.entry.name)
        }
    }

    pub fn draw(&self, painter: &egui::Painter, regions: &RowRegions, theme: &RackTheme) {
        let font = FontId::proportional(theme.font_size);
        let line_y = regions.row.center().y;

        painter.rect_filled(regions.row, 0.0, theme.row_background);

        // Index badge: 1-based, because 0 means "bypass" on the host's
        // switch input.
        let badge_center = Pos2::new(regions.index.center().x, line_y);
        let badge_radius = regions.index.width().min(regions.row.height()) * 0.4;
        painter.circle_filled(badge_center, badge_radius, theme.index_badge_color);
        painter.text(
            badge_center,
            Align2::CENTER_CENTER,
            (self.index + 1).to_string(),
            font.clone(),
            theme.index_text_color,
        );

        painter.text(
            Pos2::new(regions.name.min.x + 5.0, line_y),
            Align2::LEFT_CENTER,
            display_name(&self.entry.name),
            font.clone(),
            theme.text_color,
        );

        painter.text(
            Pos2::new(regions.strength.center().x, line_y),
            Align2::CENTER_CENTER,
            display_strength(self.entry.strength),
            font.clone(),
            theme.text_color,
        );

        painter.text(
            Pos2::new(regions.remove.center().x, line_y),
            Align2::CENTER_CENTER,
            "X",
            font,
            theme.remove_color,
        );
    }
}
