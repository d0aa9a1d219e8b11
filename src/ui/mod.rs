pub mod style;
pub mod widgets;

pub use style::{default_color_tokens, ColorTokens, StyleTokens, LAYOUT_TOKENS};
pub use widgets::{caption_label, feature_badge, icon_button, labeled_button};
