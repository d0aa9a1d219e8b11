use crate::ui::{ColorTokens, StyleTokens};
use gtk4::CssProvider;

pub(super) fn runtime_css(tokens: StyleTokens, colors: &ColorTokens) -> String {
    format!(
        "
window.gymglow-window {{
  background: {canvas_background};
  color: {text_color};
}}
.gymglow-root label {{
  color: {text_color};
}}
.gymglow-root button image {{
  -gtk-icon-style: symbolic;
  color: inherit;
}}

/* ── Brand ── */
.brand-title {{
  font-size: 20px;
  font-weight: 800;
  letter-spacing: 1px;
}}
.gymglow-root .brand-accent {{
  color: {accent_color};
  font-size: 20px;
  font-weight: 800;
}}

/* ── Idle hero ── */
.hero-title,
.gymglow-root .hero-title-accent {{
  font-size: 56px;
  font-weight: 800;
}}
.gymglow-root .hero-title-accent {{
  color: {accent_color};
}}
.gymglow-root .hero-subtitle,
.gymglow-root .muted-text,
.gymglow-root .status-line,
.gymglow-root .footer-text {{
  color: {muted_text_color};
}}
.hero-subtitle {{
  font-size: 18px;
  font-weight: 500;
}}
.feature-badge {{
  border-radius: {control_radius}px;
  border: {border_width}px solid {border_color};
  background: alpha({panel_background}, 0.5);
  padding: {spacing_12}px;
}}
.feature-badge-check {{
  color: {accent_color};
}}
.gymglow-root .feature-badge-label {{
  color: {muted_text_color};
  font-size: 11px;
  font-weight: 600;
}}

/* ── Buttons ── */
button.pill-button {{
  border-radius: {control_radius}px;
  min-height: {control_size}px;
  padding: 0 {spacing_32}px;
  font-weight: 700;
  transition: background {motion_hover_ms}ms cubic-bezier(0.4, 0, 0.2, 1);
}}
button.primary-button {{
  background: {text_color};
  color: {canvas_background};
  border-color: transparent;
}}
button.primary-button label,
button.primary-button image {{
  color: {canvas_background};
}}
button.primary-button:hover {{
  background: {accent_color};
}}
button.secondary-button {{
  background: {panel_background};
  border: {border_width}px solid {border_color};
}}
button.secondary-button:hover {{
  background: {border_color};
}}
button.shutter-button {{
  border-radius: 9999px;
  background: {text_color};
  color: {canvas_background};
  border: 4px solid {border_color};
}}
button.cancel-button {{
  border-radius: 9999px;
  background: {panel_background};
}}
button:focus-visible {{
  box-shadow: 0 0 0 2px {focus_ring_glow};
  border-color: {focus_ring_color};
}}

/* ── Images ── */
.image-frame {{
  border-radius: {card_radius}px;
  border: {border_width}px solid {border_color};
  background: {panel_background};
}}
.after-image {{
  border: 2px solid {accent_color};
  box-shadow: 0 0 50px alpha({accent_color}, 0.2);
}}
.camera-feed {{
  border: 4px solid {border_color};
}}
.screen-heading {{
  font-size: 22px;
  font-weight: 700;
}}
.result-caption {{
  font-size: 12px;
  font-weight: 700;
  letter-spacing: 2px;
}}

/* ── Errors ── */
.error-card {{
  border-radius: {card_radius}px;
  border: {border_width}px solid alpha({danger_color}, 0.3);
  background: alpha({danger_color}, 0.08);
  padding: {spacing_32}px;
}}
.gymglow-root .danger-heading {{
  color: {danger_color};
  font-size: 24px;
  font-weight: 700;
}}
.gymglow-root .danger-text {{
  color: {danger_color};
}}

/* ── Toast badge ── */
.toast-badge {{
  border-radius: {control_radius}px;
  border: {border_width}px solid {border_color};
  background: {panel_background};
  padding: {spacing_8}px {spacing_16}px;
  font-size: 13px;
  font-weight: 500;
  box-shadow: 0 4px 16px rgba(0, 0, 0, 0.14),
              0 1px 3px rgba(0, 0, 0, 0.08);
}}
.status-line,
.footer-text {{
  font-size: 11px;
}}
",
        canvas_background = colors.canvas_background,
        panel_background = colors.panel_background,
        border_color = colors.border_color,
        text_color = colors.text_color,
        muted_text_color = colors.muted_text_color,
        accent_color = colors.accent_color,
        danger_color = colors.danger_color,
        focus_ring_color = colors.focus_ring_color,
        focus_ring_glow = colors.focus_ring_glow,
        card_radius = tokens.card_radius,
        control_radius = tokens.control_radius,
        control_size = tokens.control_size,
        border_width = tokens.border_width,
        spacing_8 = tokens.spacing_8,
        spacing_12 = tokens.spacing_12,
        spacing_16 = tokens.spacing_16,
        spacing_32 = tokens.spacing_32,
        motion_hover_ms = tokens.motion_hover_ms,
    )
}

pub(super) fn install_runtime_css(tokens: StyleTokens, colors: &ColorTokens) {
    let provider = CssProvider::new();
    provider.load_from_data(&runtime_css(tokens, colors));
    if let Some(display) = gtk4::gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    } else {
        tracing::warn!("no display available; runtime stylesheet not installed");
    }
}
