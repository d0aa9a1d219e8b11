/// Compile-time layout tokens, not user-overridable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleTokens {
    pub spacing_4: i32,
    pub spacing_8: i32,
    pub spacing_12: i32,
    pub spacing_16: i32,
    pub spacing_24: i32,
    pub spacing_32: i32,
    pub card_radius: u16,
    pub control_radius: u16,
    pub control_size: u16,
    pub shutter_size: i32,
    pub border_width: u16,
    pub window_default_width: i32,
    pub window_default_height: i32,
    pub image_side: i32,
    pub motion_standard_ms: u32,
    pub motion_hover_ms: u32,
    pub toast_duration_ms: u32,
    pub camera_tick_ms: u32,
}

pub const LAYOUT_TOKENS: StyleTokens = StyleTokens {
    spacing_4: 4,
    spacing_8: 8,
    spacing_12: 12,
    spacing_16: 16,
    spacing_24: 24,
    spacing_32: 32,
    card_radius: 24,
    control_radius: 16,
    control_size: 48,
    shutter_size: 80,
    border_width: 1,
    window_default_width: 960,
    window_default_height: 820,
    image_side: 420,
    motion_standard_ms: 220,
    motion_hover_ms: 160,
    toast_duration_ms: 3_000,
    camera_tick_ms: 33,
};

/// CSS color values used by the runtime stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTokens {
    pub canvas_background: String,
    pub panel_background: String,
    pub border_color: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub accent_color: String,
    pub danger_color: String,
    pub focus_ring_color: String,
    pub focus_ring_glow: String,
}

pub fn default_color_tokens() -> ColorTokens {
    ColorTokens {
        canvas_background: "#09090b".to_string(),
        panel_background: "#18181b".to_string(),
        border_color: "#27272a".to_string(),
        text_color: "#fafafa".to_string(),
        muted_text_color: "#a1a1aa".to_string(),
        accent_color: "#10b981".to_string(),
        danger_color: "#ef4444".to_string(),
        focus_ring_color: "#34d399".to_string(),
        focus_ring_glow: "rgba(52, 211, 153, 0.35)".to_string(),
    }
}
