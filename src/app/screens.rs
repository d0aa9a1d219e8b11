use std::rc::Rc;

use crate::image_ref::ImageRef;
use crate::state::{AppPhase, Session};
use crate::ui::{caption_label, feature_badge, icon_button, labeled_button, StyleTokens};
use gtk4::prelude::*;
use gtk4::{
    gdk, glib, Align, Box as GtkBox, Button, ContentFit, Label, Orientation, Picture, Spinner,
    Stack, StackTransitionType,
};

use super::session_actions::SessionActionExecutor;

const HERO_BADGES: [&str; 4] = ["Realistic Sweat", "Muscle Pump", "Gym Gear", "Modern Lighting"];
const PROCESSING_QUOTE: &str = "\"The only bad workout is the one that didn't happen.\"";
const CAMERA_FAILURE_TEXT: &str = "Could not access camera. Please check permissions.";

#[derive(Clone)]
pub(super) struct SessionUi {
    pub(super) root: GtkBox,
    pub(super) toast_label: Label,
    pub(super) status_label: Label,
    stack: Stack,
    pub(super) take_selfie_button: Button,
    pub(super) upload_button: Button,
    pub(super) camera_picture: Picture,
    camera_waiting_label: Label,
    camera_error_box: GtkBox,
    pub(super) camera_go_back_button: Button,
    pub(super) shutter_button: Button,
    pub(super) cancel_capture_button: Button,
    processing_spinner: Spinner,
    processing_picture: Picture,
    before_picture: Picture,
    after_picture: Picture,
    pub(super) try_another_button: Button,
    pub(super) download_button: Button,
    error_message_label: Label,
    pub(super) back_to_start_button: Button,
}

impl SessionUi {
    pub(super) fn render(&self, session: &Session, camera_failed: bool) {
        let phase = session.phase();
        self.stack.set_visible_child_name(screen_name(phase));
        self.processing_spinner
            .set_spinning(matches!(phase, AppPhase::Processing));

        match session {
            Session::Idle => {
                clear_picture(&self.camera_picture);
                clear_picture(&self.before_picture);
                clear_picture(&self.after_picture);
            }
            Session::Capturing => {
                self.camera_error_box.set_visible(camera_failed);
                self.camera_picture.set_visible(!camera_failed);
                self.camera_waiting_label
                    .set_visible(!camera_failed && self.camera_picture.paintable().is_none());
                self.shutter_button.set_visible(!camera_failed);
                self.cancel_capture_button.set_visible(!camera_failed);
            }
            Session::Processing { original } => {
                show_image(&self.processing_picture, original);
                clear_picture(&self.camera_picture);
            }
            Session::Result {
                original,
                generated,
            } => {
                show_image(&self.before_picture, original);
                show_image(&self.after_picture, generated);
            }
            Session::Error { message, .. } => {
                self.error_message_label.set_text(message);
            }
        }
    }

    pub(super) fn show_camera_frame(&self, jpeg: &[u8]) {
        match texture_from_encoded(jpeg) {
            Ok(texture) => {
                self.camera_picture.set_paintable(Some(&texture));
                self.camera_waiting_label.set_visible(false);
            }
            Err(err) => tracing::debug!(%err, "skipping undecodable camera frame"),
        }
    }

    pub(super) fn set_status_text(&self, message: &str) {
        self.status_label.set_text(message);
    }
}

pub(super) fn screen_name(phase: AppPhase) -> &'static str {
    match phase {
        AppPhase::Idle => "idle",
        AppPhase::Capturing => "capturing",
        AppPhase::Processing => "processing",
        AppPhase::Result => "result",
        AppPhase::Error => "error",
    }
}

fn texture_from_encoded(bytes: &[u8]) -> Result<gdk::Texture, glib::Error> {
    gdk::Texture::from_bytes(&glib::Bytes::from_owned(bytes.to_vec()))
}

fn show_image(picture: &Picture, image: &ImageRef) {
    match texture_from_encoded(image.bytes()) {
        Ok(texture) => picture.set_paintable(Some(&texture)),
        Err(err) => {
            tracing::warn!(%err, image = ?image, "failed to decode image for display");
            clear_picture(picture);
        }
    }
}

fn clear_picture(picture: &Picture) {
    picture.set_paintable(None::<&gdk::Texture>);
}

fn image_frame(style_tokens: StyleTokens, css_class: &str) -> Picture {
    let picture = Picture::new();
    picture.set_content_fit(ContentFit::Cover);
    picture.set_can_shrink(true);
    picture.set_size_request(style_tokens.image_side, style_tokens.image_side);
    picture.add_css_class("image-frame");
    picture.add_css_class(css_class);
    picture
}

fn screen_box(style_tokens: StyleTokens) -> GtkBox {
    let screen = GtkBox::new(Orientation::Vertical, style_tokens.spacing_24);
    screen.set_halign(Align::Center);
    screen.set_valign(Align::Center);
    screen
}

fn build_idle_screen(style_tokens: StyleTokens) -> (GtkBox, Button, Button) {
    let screen = screen_box(style_tokens);

    let hero = GtkBox::new(Orientation::Horizontal, style_tokens.spacing_12);
    hero.set_halign(Align::Center);
    hero.append(&caption_label("See your", "hero-title"));
    hero.append(&caption_label("future pump", "hero-title-accent"));

    let subtitle = caption_label(
        "Upload a photo or take a selfie to visualize your post-workout transformation using Gemini AI.",
        "hero-subtitle",
    );
    subtitle.set_max_width_chars(56);

    let take_selfie_button =
        labeled_button("camera-photo-symbolic", "Take Selfie", &["primary-button"]);
    let upload_button =
        labeled_button("document-open-symbolic", "Upload Photo", &["secondary-button"]);
    let actions = GtkBox::new(Orientation::Horizontal, style_tokens.spacing_16);
    actions.set_halign(Align::Center);
    actions.append(&take_selfie_button);
    actions.append(&upload_button);

    let badges = GtkBox::new(Orientation::Horizontal, style_tokens.spacing_12);
    badges.set_homogeneous(true);
    badges.set_margin_top(style_tokens.spacing_32);
    for badge in HERO_BADGES {
        badges.append(&feature_badge(badge));
    }

    screen.append(&hero);
    screen.append(&subtitle);
    screen.append(&actions);
    screen.append(&badges);
    (screen, take_selfie_button, upload_button)
}

struct CaptureScreen {
    screen: GtkBox,
    picture: Picture,
    waiting_label: Label,
    error_box: GtkBox,
    go_back_button: Button,
    shutter_button: Button,
    cancel_button: Button,
}

fn build_capture_screen(style_tokens: StyleTokens) -> CaptureScreen {
    let screen = screen_box(style_tokens);
    let heading = caption_label("Position your face clearly", "screen-heading");

    let picture = image_frame(style_tokens, "camera-feed");
    let waiting_label = caption_label("Starting camera...", "muted-text");

    let error_box = GtkBox::new(Orientation::Vertical, style_tokens.spacing_16);
    error_box.add_css_class("camera-error");
    error_box.set_halign(Align::Center);
    error_box.set_visible(false);
    let go_back_button = labeled_button("go-previous-symbolic", "Go Back", &["secondary-button"]);
    go_back_button.set_halign(Align::Center);
    error_box.append(&caption_label(CAMERA_FAILURE_TEXT, "danger-text"));
    error_box.append(&go_back_button);

    let control_size = i32::from(style_tokens.control_size);
    let cancel_button = icon_button(
        "window-close-symbolic",
        "Cancel",
        control_size,
        &["cancel-button"],
    );
    let shutter_button = icon_button(
        "camera-photo-symbolic",
        "Take photo",
        style_tokens.shutter_size,
        &["shutter-button"],
    );
    let controls = GtkBox::new(Orientation::Horizontal, style_tokens.spacing_24);
    controls.set_halign(Align::Center);
    controls.append(&cancel_button);
    controls.append(&shutter_button);

    screen.append(&heading);
    screen.append(&picture);
    screen.append(&waiting_label);
    screen.append(&error_box);
    screen.append(&controls);
    CaptureScreen {
        screen,
        picture,
        waiting_label,
        error_box,
        go_back_button,
        shutter_button,
        cancel_button,
    }
}

fn build_processing_screen(style_tokens: StyleTokens) -> (GtkBox, Spinner, Picture) {
    let screen = screen_box(style_tokens);
    let picture = image_frame(style_tokens, "processing-original");
    picture.set_opacity(0.5);
    let spinner = Spinner::new();
    spinner.set_size_request(64, 64);
    spinner.add_css_class("processing-spinner");

    screen.append(&picture);
    screen.append(&spinner);
    screen.append(&caption_label("Injecting Gains...", "screen-heading"));
    screen.append(&caption_label(PROCESSING_QUOTE, "muted-text"));
    (screen, spinner, picture)
}

fn result_column(style_tokens: StyleTokens, title: &str, picture: &Picture) -> GtkBox {
    let column = GtkBox::new(Orientation::Vertical, style_tokens.spacing_8);
    let caption = caption_label(title, "result-caption");
    caption.set_halign(Align::Start);
    column.append(&caption);
    column.append(picture);
    column
}

fn build_result_screen(style_tokens: StyleTokens) -> (GtkBox, Picture, Picture, Button, Button) {
    let screen = screen_box(style_tokens);
    let before_picture = image_frame(style_tokens, "before-image");
    let after_picture = image_frame(style_tokens, "after-image");

    let pair = GtkBox::new(Orientation::Horizontal, style_tokens.spacing_24);
    pair.set_homogeneous(true);
    pair.append(&result_column(style_tokens, "Before Gym", &before_picture));
    pair.append(&result_column(style_tokens, "After Gym (AI)", &after_picture));

    let try_another_button =
        labeled_button("view-refresh-symbolic", "Try Another Photo", &["secondary-button"]);
    let download_button =
        labeled_button("document-save-symbolic", "Download Result", &["primary-button"]);
    let actions = GtkBox::new(Orientation::Horizontal, style_tokens.spacing_16);
    actions.set_halign(Align::Center);
    actions.append(&try_another_button);
    actions.append(&download_button);

    screen.append(&pair);
    screen.append(&actions);
    (
        screen,
        before_picture,
        after_picture,
        try_another_button,
        download_button,
    )
}

fn build_error_screen(style_tokens: StyleTokens) -> (GtkBox, Label, Button) {
    let screen = screen_box(style_tokens);
    screen.add_css_class("error-card");
    let message_label = caption_label("", "muted-text");
    message_label.set_max_width_chars(48);
    let back_button = labeled_button("go-home-symbolic", "Back to Start", &["primary-button"]);
    back_button.set_halign(Align::Center);

    screen.append(&caption_label("Workout Interrupted", "danger-heading"));
    screen.append(&message_label);
    screen.append(&back_button);
    (screen, message_label, back_button)
}

pub(super) fn build_session_ui(style_tokens: StyleTokens) -> SessionUi {
    let root = GtkBox::new(Orientation::Vertical, style_tokens.spacing_16);
    root.add_css_class("gymglow-root");
    root.set_margin_top(style_tokens.spacing_16);
    root.set_margin_bottom(style_tokens.spacing_16);
    root.set_margin_start(style_tokens.spacing_24);
    root.set_margin_end(style_tokens.spacing_24);

    let brand = GtkBox::new(Orientation::Horizontal, style_tokens.spacing_4);
    brand.append(&caption_label("GYMGLOW", "brand-title"));
    brand.append(&caption_label("AI", "brand-accent"));

    let (idle_screen, take_selfie_button, upload_button) = build_idle_screen(style_tokens);
    let capture = build_capture_screen(style_tokens);
    let (processing_screen, processing_spinner, processing_picture) =
        build_processing_screen(style_tokens);
    let (result_screen, before_picture, after_picture, try_another_button, download_button) =
        build_result_screen(style_tokens);
    let (error_screen, error_message_label, back_to_start_button) =
        build_error_screen(style_tokens);

    let stack = Stack::new();
    stack.set_vexpand(true);
    stack.set_transition_type(StackTransitionType::Crossfade);
    stack.set_transition_duration(style_tokens.motion_standard_ms);
    stack.add_named(&idle_screen, Some(screen_name(AppPhase::Idle)));
    stack.add_named(&capture.screen, Some(screen_name(AppPhase::Capturing)));
    stack.add_named(&processing_screen, Some(screen_name(AppPhase::Processing)));
    stack.add_named(&result_screen, Some(screen_name(AppPhase::Result)));
    stack.add_named(&error_screen, Some(screen_name(AppPhase::Error)));

    let toast_label = Label::new(Some(""));
    toast_label.add_css_class("toast-badge");
    toast_label.set_halign(Align::Center);
    toast_label.set_visible(false);

    let status_label = caption_label("ready", "status-line");
    status_label.set_halign(Align::Start);
    status_label.set_ellipsize(gtk4::pango::EllipsizeMode::End);

    let footer = caption_label("No pain, no gain.", "footer-text");

    root.append(&brand);
    root.append(&stack);
    root.append(&toast_label);
    root.append(&status_label);
    root.append(&footer);

    SessionUi {
        root,
        toast_label,
        status_label,
        stack,
        take_selfie_button,
        upload_button,
        camera_picture: capture.picture,
        camera_waiting_label: capture.waiting_label,
        camera_error_box: capture.error_box,
        camera_go_back_button: capture.go_back_button,
        shutter_button: capture.shutter_button,
        cancel_capture_button: capture.cancel_button,
        processing_spinner,
        processing_picture,
        before_picture,
        after_picture,
        try_another_button,
        download_button,
        error_message_label,
        back_to_start_button,
    }
}

pub(super) fn connect_session_button<F, R>(
    button: &Button,
    executor: &SessionActionExecutor,
    render: &Rc<R>,
    action: F,
) where
    F: Fn(&SessionActionExecutor) + 'static,
    R: Fn() + ?Sized + 'static,
{
    let executor = executor.clone();
    let render = render.clone();
    button.connect_clicked(move |_| {
        action(&executor);
        (render.as_ref())();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_phase_has_its_own_screen() {
        let phases = [
            AppPhase::Idle,
            AppPhase::Capturing,
            AppPhase::Processing,
            AppPhase::Result,
            AppPhase::Error,
        ];
        let names = phases.map(screen_name).into_iter().collect::<HashSet<_>>();
        assert_eq!(names.len(), phases.len());
    }

    #[test]
    fn hero_lists_four_feature_badges() {
        assert_eq!(
            HERO_BADGES,
            ["Realistic Sweat", "Muscle Pump", "Gym Gear", "Modern Lighting"]
        );
    }
}
