mod bootstrap;
mod camera_control;
mod runtime_css;
mod screens;
mod session_actions;
mod toast;
mod worker;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::config::StartupFlags;
use crate::error::AppResult;
use crate::state::SessionMachine;
use crate::ui::{default_color_tokens, LAYOUT_TOKENS};
use gtk4::glib::ControlFlow;
use gtk4::prelude::*;
use gtk4::{Application, ApplicationWindow};

use bootstrap::{bootstrap_app_runtime, capture_settings, gtk_launch_args};
use runtime_css::install_runtime_css;
use screens::{build_session_ui, connect_session_button, SessionUi};
use camera_control::CameraPoll;
use session_actions::SessionActionExecutor;
use toast::ToastRuntime;

const APPLICATION_ID: &str = "io.github.gymglow.GymGlow";

pub struct App {
    machine: SessionMachine,
    flags: StartupFlags,
}

impl App {
    pub fn new(flags: StartupFlags) -> Self {
        Self {
            machine: SessionMachine::new(),
            flags,
        }
    }

    pub fn start(&mut self) -> AppResult<()> {
        let bootstrap = bootstrap_app_runtime(&self.flags)?;
        let capture_settings = capture_settings(&bootstrap.config);
        let generation_client = bootstrap.generation_client;
        let storage = bootstrap.storage;

        let shared_machine = Rc::new(RefCell::new(std::mem::take(&mut self.machine)));
        let status_log = Rc::new(RefCell::new(String::from("ready")));
        let executor_slot = Rc::new(RefCell::new(None::<SessionActionExecutor>));
        let activate_once = Rc::new(Cell::new(false));

        tracing::info!("starting gtk runtime");
        let application = Application::new(
            Some(APPLICATION_ID),
            gtk4::gio::ApplicationFlags::NON_UNIQUE,
        );

        {
            let shared_machine = shared_machine.clone();
            let executor_slot = executor_slot.clone();
            application.connect_activate(move |app| {
                if activate_once.replace(true) {
                    tracing::debug!("ignoring duplicate gtk activate signal");
                    return;
                }
                let style_tokens = LAYOUT_TOKENS;
                install_runtime_css(style_tokens, &default_color_tokens());

                let window = ApplicationWindow::new(app);
                window.add_css_class("gymglow-window");
                window.set_title(Some("GymGlow"));
                window.set_default_size(
                    style_tokens.window_default_width,
                    style_tokens.window_default_height,
                );

                let ui = build_session_ui(style_tokens);
                window.set_child(Some(&ui.root));
                let toast = ToastRuntime::new(&ui.toast_label, style_tokens.toast_duration_ms);
                let executor = SessionActionExecutor::new(
                    shared_machine.clone(),
                    status_log.clone(),
                    capture_settings.clone(),
                    generation_client.clone(),
                    storage.clone(),
                    toast,
                );
                executor_slot.replace(Some(executor.clone()));

                let render: Rc<dyn Fn()> = {
                    let ui = ui.clone();
                    let machine = shared_machine.clone();
                    let status_log = status_log.clone();
                    let executor = executor.clone();
                    Rc::new(move || {
                        let machine = machine.borrow();
                        ui.render(machine.session(), executor.camera_failed());
                        ui.set_status_text(status_log.borrow().as_str());
                        tracing::trace!(phase = ?machine.phase(), "rendered session");
                    })
                };

                connect_buttons(&ui, &executor, &window, &render, style_tokens.camera_tick_ms);
                {
                    let executor = executor.clone();
                    window.connect_close_request(move |_| {
                        executor.shutdown();
                        gtk4::glib::Propagation::Proceed
                    });
                }

                (render.as_ref())();
                tracing::info!("presenting main window");
                window.present();
            });
        }

        application.run_with_args(&gtk_launch_args());

        if let Some(executor) = executor_slot.take() {
            executor.shutdown();
        }
        self.machine = std::mem::take(&mut *shared_machine.borrow_mut());
        Ok(())
    }

    pub fn session(&self) -> &SessionMachine {
        &self.machine
    }
}

fn connect_buttons(
    ui: &SessionUi,
    executor: &SessionActionExecutor,
    window: &ApplicationWindow,
    render: &Rc<dyn Fn()>,
    camera_tick_ms: u32,
) {
    {
        let ui_for_tick = ui.clone();
        let executor_for_click = executor.clone();
        let render = render.clone();
        ui.take_selfie_button.connect_clicked(move |_| {
            if executor_for_click.start_camera() && executor_for_click.camera_running() {
                start_camera_preview_tick(&ui_for_tick, &executor_for_click, &render, camera_tick_ms);
            }
            (render.as_ref())();
        });
    }
    {
        let executor = executor.clone();
        let window = window.clone();
        let render = render.clone();
        ui.upload_button.connect_clicked(move |_| {
            let render = render.clone();
            executor.choose_upload(&window, move || (render.as_ref())());
        });
    }
    {
        let executor = executor.clone();
        let render = render.clone();
        ui.shutter_button.connect_clicked(move |_| {
            let render = render.clone();
            executor.take_photo(move || (render.as_ref())());
        });
    }
    {
        let executor = executor.clone();
        let render = render.clone();
        ui.download_button.connect_clicked(move |_| {
            let render = render.clone();
            executor.download_result(move || (render.as_ref())());
        });
    }
    connect_session_button(&ui.cancel_capture_button, executor, render, |executor| {
        executor.leave_capture();
    });
    connect_session_button(&ui.camera_go_back_button, executor, render, |executor| {
        executor.leave_capture();
    });
    connect_session_button(&ui.try_another_button, executor, render, |executor| {
        executor.reset();
    });
    connect_session_button(&ui.back_to_start_button, executor, render, |executor| {
        executor.reset();
    });
}

/// Pulls the newest camera frame into the preview until the camera stops.
fn start_camera_preview_tick(
    ui: &SessionUi,
    executor: &SessionActionExecutor,
    render: &Rc<dyn Fn()>,
    camera_tick_ms: u32,
) {
    let ui = ui.clone();
    let executor = executor.clone();
    let render = render.clone();
    let last_sequence = Cell::new(0u64);
    gtk4::glib::timeout_add_local(
        Duration::from_millis(u64::from(camera_tick_ms)),
        move || match executor.poll_camera(last_sequence.get()) {
            CameraPoll::Frame(frame) => {
                last_sequence.set(frame.sequence);
                ui.show_camera_frame(&frame.jpeg);
                ControlFlow::Continue
            }
            CameraPoll::Unchanged => ControlFlow::Continue,
            CameraPoll::Stopped => {
                tracing::debug!(frames = last_sequence.get(), "camera preview stopped");
                (render.as_ref())();
                ControlFlow::Break
            }
        },
    );
}

impl Default for App {
    fn default() -> Self {
        Self::new(StartupFlags::default())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("phase", &self.machine.phase())
            .field("flags", &self.flags)
            .finish()
    }
}
