//! Theming for the LoRA rack widgets.

use egui::Color32;

/// Theme configuration for the rack. Literal constants only; the host's
/// styling system is out of scope.
pub struct RackTheme {
    /// Height of one row / the add-control in pixels.
    pub row_height: f32,
    /// Vertical gap between stacked widgets.
    pub row_spacing: f32,
    /// Horizontal margin inside the node body.
    pub row_margin: f32,
    /// Width fraction of the index badge region.
    pub index_fraction: f32,
    /// Width fraction of the name region.
    pub name_fraction: f32,
    /// Width fraction of the strength region.
    pub strength_fraction: f32,
    /// Row background.
    pub row_background: Color32,
    /// Index badge fill.
    pub index_badge_color: Color32,
    /// Index badge text.
    pub index_text_color: Color32,
    /// Name and strength text.
    pub text_color: Color32,
    /// Remove control text.
    pub remove_color: Color32,
    /// Add-control fill.
    pub add_button_color: Color32,
    /// Add-control text.
    pub add_text_color: Color32,
    /// Text size in points.
    pub font_size: f32,
}

impl Default for RackTheme {
    fn default() -> Self {
        Self {
            row_height: 20.0,
            row_spacing: 4.0,
            row_margin: 10.0,
            index_fraction: 0.1,
            name_fraction: 0.5,
            strength_fraction: 0.2,
            row_background: Color32::from_black_alpha(77),
            index_badge_color: Color32::from_rgb(0x44, 0x88, 0xff),
            index_text_color: Color32::WHITE,
            text_color: Color32::from_rgb(0xdd, 0xdd, 0xdd),
            remove_color: Color32::from_rgb(0xff, 0x55, 0x55),
            add_button_color: Color32::from_rgb(60, 60, 70),
            add_text_color: Color32::from_rgb(200, 200, 200),
            font_size: 14.0,
        }
    }
}
