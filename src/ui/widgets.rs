use gtk4::prelude::*;
use gtk4::{Align, Box as GtkBox, Button, Image, Label, Orientation};

pub fn icon_button(
    icon_name: &str,
    tooltip: &str,
    control_size: i32,
    extra_classes: &[&str],
) -> Button {
    let button = Button::from_icon_name(icon_name);
    button.set_focus_on_click(false);
    button.set_tooltip_text(Some(tooltip));
    button.add_css_class("flat");
    button.add_css_class("icon-button");
    for css_class in extra_classes {
        button.add_css_class(css_class);
    }
    button.set_size_request(control_size, control_size);
    button
}

/// Rounded pill button with a leading symbolic icon.
pub fn labeled_button(icon_name: &str, label: &str, extra_classes: &[&str]) -> Button {
    let content = GtkBox::new(Orientation::Horizontal, 8);
    content.set_halign(Align::Center);
    content.append(&Image::from_icon_name(icon_name));
    content.append(&Label::new(Some(label)));

    let button = Button::new();
    button.set_child(Some(&content));
    button.add_css_class("pill-button");
    for css_class in extra_classes {
        button.add_css_class(css_class);
    }
    button
}

pub fn feature_badge(text: &str) -> GtkBox {
    let badge = GtkBox::new(Orientation::Horizontal, 6);
    badge.add_css_class("feature-badge");
    badge.set_halign(Align::Fill);
    badge.set_hexpand(true);

    let check = Image::from_icon_name("object-select-symbolic");
    check.add_css_class("feature-badge-check");
    let label = Label::new(Some(&text.to_uppercase()));
    label.add_css_class("feature-badge-label");

    badge.append(&check);
    badge.append(&label);
    badge
}

pub fn caption_label(text: &str, css_class: &str) -> Label {
    let label = Label::new(Some(text));
    label.add_css_class(css_class);
    label.set_wrap(true);
    label.set_justify(gtk4::Justification::Center);
    label
}
