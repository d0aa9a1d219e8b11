use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use crate::capture::{load_upload, CaptureError, FfmpegCameraBackend};
use crate::generation::{GenerationClient, GenerationResult};
use crate::image_ref::ImageRef;
use crate::state::{AppEvent, AppPhase, SessionMachine, GENERATION_FAILED_MESSAGE};
use crate::storage::StorageService;
use gtk4::prelude::*;
use gtk4::{gio, ApplicationWindow, FileDialog, FileFilter};

use super::camera_control::{CameraController, CameraPoll, ShutterOutcome};
use super::toast::ToastRuntime;
use super::worker::spawn_worker_action;

pub(super) type SharedMachine = Rc<RefCell<SessionMachine>>;
pub(super) type SharedStatusLog = Rc<RefCell<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum GenerationOutcome {
    Completed(AppPhase),
    /// The session moved on (reset) before the result arrived.
    Dropped,
}

/// Camera settings the executor needs at capture time.
#[derive(Debug, Clone)]
pub(super) struct CaptureSettings {
    pub(super) camera_device: String,
    pub(super) jpeg_quality: u8,
}

#[derive(Clone)]
pub(super) struct SessionActionExecutor {
    machine: SharedMachine,
    status_log: SharedStatusLog,
    camera: Rc<CameraController>,
    generation_client: Arc<dyn GenerationClient>,
    storage: StorageService,
    toast: ToastRuntime,
}

impl SessionActionExecutor {
    pub(super) fn new(
        machine: SharedMachine,
        status_log: SharedStatusLog,
        capture_settings: CaptureSettings,
        generation_client: Arc<dyn GenerationClient>,
        storage: StorageService,
        toast: ToastRuntime,
    ) -> Self {
        let camera = CameraController::new(
            machine.clone(),
            status_log.clone(),
            Box::new(FfmpegCameraBackend::new(capture_settings.camera_device.as_str())),
            capture_settings.camera_device,
            capture_settings.jpeg_quality,
        );
        Self {
            machine,
            status_log,
            camera: Rc::new(camera),
            generation_client,
            storage,
            toast,
        }
    }

    pub(super) fn camera_failed(&self) -> bool {
        self.camera.failed()
    }

    pub(super) fn camera_running(&self) -> bool {
        self.camera.running()
    }

    pub(super) fn start_camera(&self) -> bool {
        self.camera.start()
    }

    pub(super) fn poll_camera(&self, last_sequence: u64) -> CameraPoll {
        self.camera.poll(last_sequence)
    }

    pub(super) fn leave_capture(&self) {
        self.camera.leave();
    }

    pub(super) fn take_photo<R>(&self, on_complete: R)
    where
        R: Fn() + 'static,
    {
        match self.camera.shutter() {
            ShutterOutcome::Captured(image) => self.start_generation(image, on_complete),
            ShutterOutcome::NotRunning => {}
            ShutterOutcome::WarmingUp => self.toast.show("Camera is still warming up"),
            ShutterOutcome::CameraLost => on_complete(),
            ShutterOutcome::Failed(err) => self.toast.show(format!("Capture failed: {err}")),
        }
    }

    pub(super) fn choose_upload<R>(&self, parent: &ApplicationWindow, on_complete: R)
    where
        R: Fn() + 'static,
    {
        if self.machine.borrow().phase() != AppPhase::Idle {
            set_status(&self.status_log, "upload is only available from the start screen");
            return;
        }

        let filter = FileFilter::new();
        filter.set_name(Some("Images"));
        filter.add_mime_type("image/*");
        let dialog = FileDialog::builder()
            .title("Upload Photo")
            .modal(true)
            .build();
        dialog.set_default_filter(Some(&filter));

        let executor = self.clone();
        dialog.open(Some(parent), gio::Cancellable::NONE, move |selection| {
            let path = match selection {
                Ok(file) => file.path(),
                Err(err) => {
                    tracing::debug!(%err, "file dialog closed without a selection");
                    None
                }
            };
            executor.load_upload_async(path, on_complete);
        });
    }

    fn load_upload_async<R>(&self, path: Option<PathBuf>, on_complete: R)
    where
        R: Fn() + 'static,
    {
        if path.is_none() {
            return;
        }
        let executor = self.clone();
        let mut on_complete = Some(on_complete);
        spawn_worker_action(
            "upload",
            move || load_upload(path.as_deref()),
            move |result| {
                let Some(on_complete) = on_complete.take() else {
                    return;
                };
                match result {
                    Ok(Some(image)) => executor.start_generation(image, on_complete),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(%err, "failed to load uploaded photo");
                        set_status(&executor.status_log, format!("upload failed: {err}"));
                        executor.toast.show(upload_failure_toast(&err));
                        on_complete();
                    }
                }
            },
        );
    }

    fn start_generation<R>(&self, image: ImageRef, on_complete: R)
    where
        R: Fn() + 'static,
    {
        if !begin_processing(&self.machine, &self.status_log, image.clone()) {
            on_complete();
            return;
        }
        on_complete();

        let client = self.generation_client.clone();
        let executor = self.clone();
        spawn_worker_action(
            "generation",
            move || client.generate(&image),
            move |result| {
                let outcome =
                    apply_generation_result(&executor.machine, &executor.status_log, result);
                if let Some(message) = notification_for(&outcome) {
                    crate::notification::send(message);
                }
                on_complete();
            },
        );
    }

    pub(super) fn download_result<R>(&self, on_complete: R)
    where
        R: Fn() + 'static,
    {
        let Some(generated) = self.machine.borrow().session().generated_image().cloned() else {
            set_status(&self.status_log, "no generated photo to save");
            return;
        };

        let storage = self.storage.clone();
        let executor = self.clone();
        spawn_worker_action(
            "save",
            move || storage.save_result(&generated),
            move |result| {
                match result {
                    Ok(path) => {
                        set_status(&executor.status_log, format!("saved {}", path.display()));
                        executor.toast.show(format!("Saved to {}", path.display()));
                    }
                    Err(err) => {
                        tracing::warn!(%err, "failed to save generated photo");
                        set_status(&executor.status_log, format!("save failed: {err}"));
                        executor.toast.show(format!("Save failed: {err}"));
                    }
                }
                on_complete();
            },
        );
    }

    pub(super) fn reset(&self) {
        self.camera.clear();
        if transition_with_status(
            &self.machine,
            &self.status_log,
            AppEvent::Reset,
            "reset blocked",
            "cannot reset",
        ) {
            set_status(&self.status_log, "ready");
        }
    }

    pub(super) fn shutdown(&self) {
        self.camera.release();
    }
}

pub(super) fn set_status(status_log: &SharedStatusLog, message: impl Into<String>) {
    *status_log.borrow_mut() = message.into();
}

pub(super) fn transition_with_status(
    machine: &SharedMachine,
    status_log: &SharedStatusLog,
    event: AppEvent,
    blocked_message: &str,
    failure_prefix: &str,
) -> bool {
    if !machine.borrow().can_transition(&event) {
        set_status(status_log, blocked_message);
        return false;
    }

    match machine.borrow_mut().transition(event) {
        Ok(_) => true,
        Err(err) => {
            set_status(status_log, format!("{failure_prefix}: {err}"));
            false
        }
    }
}

/// Moves a freshly captured or uploaded photo into Processing.
pub(super) fn begin_processing(
    machine: &SharedMachine,
    status_log: &SharedStatusLog,
    original: ImageRef,
) -> bool {
    let bytes = original.len();
    let started = transition_with_status(
        machine,
        status_log,
        AppEvent::Captured(original),
        "a photo is already being processed",
        "cannot process photo",
    );
    if started {
        tracing::info!(bytes, "photo accepted; generating");
        set_status(status_log, "generating");
    }
    started
}

/// Feeds a finished generation call back into the session. The underlying
/// error is logged; the session only ever carries the fixed message.
pub(super) fn apply_generation_result(
    machine: &SharedMachine,
    status_log: &SharedStatusLog,
    result: GenerationResult<ImageRef>,
) -> GenerationOutcome {
    let event = match result {
        Ok(generated) => AppEvent::GenerationSucceeded(generated),
        Err(err) => {
            tracing::error!(%err, "image generation failed");
            AppEvent::GenerationFailed
        }
    };

    let transitioned = machine.borrow_mut().transition(event);
    match transitioned {
        Ok(phase) => {
            let status = if phase == AppPhase::Result {
                "generation finished"
            } else {
                GENERATION_FAILED_MESSAGE
            };
            set_status(status_log, status);
            GenerationOutcome::Completed(phase)
        }
        Err(err) => {
            tracing::warn!(%err, "dropping generation result for an abandoned session");
            GenerationOutcome::Dropped
        }
    }
}

fn notification_for(outcome: &GenerationOutcome) -> Option<&'static str> {
    match outcome {
        GenerationOutcome::Completed(AppPhase::Result) => Some("Your post-workout photo is ready"),
        GenerationOutcome::Completed(_) => Some("Workout interrupted: generation failed"),
        GenerationOutcome::Dropped => None,
    }
}

fn upload_failure_toast(err: &CaptureError) -> String {
    match err {
        CaptureError::EmptyUpload { .. } => "The selected file is empty".to_string(),
        other => format!("Could not read photo: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;
    use crate::state::Session;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeGenerationClient {
        output: Option<ImageRef>,
        calls: AtomicUsize,
    }

    impl FakeGenerationClient {
        fn succeeding(output: ImageRef) -> Self {
            Self {
                output: Some(output),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                output: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl GenerationClient for FakeGenerationClient {
        fn generate(&self, _image: &ImageRef) -> GenerationResult<ImageRef> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output
                .clone()
                .ok_or(GenerationError::NoImageInResponse)
        }
    }

    fn shared() -> (SharedMachine, SharedStatusLog) {
        (
            Rc::new(RefCell::new(SessionMachine::new())),
            Rc::new(RefCell::new(String::new())),
        )
    }

    fn photo() -> ImageRef {
        ImageRef::jpeg(vec![0xFF, 0xD8, 0x42, 0xFF, 0xD9])
    }

    fn run_flow(
        client: &dyn GenerationClient,
        machine: &SharedMachine,
        status_log: &SharedStatusLog,
    ) -> GenerationOutcome {
        assert!(begin_processing(machine, status_log, photo()));
        let original = machine
            .borrow()
            .session()
            .original_image()
            .cloned()
            .expect("processing should hold the original");
        apply_generation_result(machine, status_log, client.generate(&original))
    }

    #[test]
    fn succeeding_client_reaches_result_with_its_output() {
        let (machine, status_log) = shared();
        let generated = ImageRef::png(vec![0x89, b'P', b'N', b'G', 7]);
        let client = FakeGenerationClient::succeeding(generated.clone());

        let outcome = run_flow(&client, &machine, &status_log);

        assert_eq!(outcome, GenerationOutcome::Completed(AppPhase::Result));
        assert_eq!(
            machine.borrow().session(),
            &Session::Result {
                original: photo(),
                generated
            }
        );
        assert_eq!(status_log.borrow().as_str(), "generation finished");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_client_reaches_error_and_keeps_original() {
        let (machine, status_log) = shared();
        let client = FakeGenerationClient::failing();

        let outcome = run_flow(&client, &machine, &status_log);

        assert_eq!(outcome, GenerationOutcome::Completed(AppPhase::Error));
        let machine = machine.borrow();
        assert_eq!(machine.session().original_image(), Some(&photo()));
        assert_eq!(
            machine.session().error_message(),
            Some(GENERATION_FAILED_MESSAGE)
        );
        assert_eq!(machine.session().generated_image(), None);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn result_after_reset_is_dropped() {
        let (machine, status_log) = shared();
        assert!(begin_processing(&machine, &status_log, photo()));
        machine
            .borrow_mut()
            .transition(AppEvent::Reset)
            .expect("reset should work");

        let outcome =
            apply_generation_result(&machine, &status_log, Ok(ImageRef::png(vec![1u8])));

        assert_eq!(outcome, GenerationOutcome::Dropped);
        assert_eq!(machine.borrow().session(), &Session::Idle);
        assert_eq!(notification_for(&outcome), None);
    }

    #[test]
    fn second_photo_is_refused_while_processing() {
        let (machine, status_log) = shared();
        assert!(begin_processing(&machine, &status_log, photo()));

        let started = begin_processing(&machine, &status_log, ImageRef::jpeg(vec![9u8]));

        assert!(!started);
        assert_eq!(
            status_log.borrow().as_str(),
            "a photo is already being processed"
        );
        assert_eq!(machine.borrow().session().original_image(), Some(&photo()));
    }

    #[test]
    fn transition_with_status_sets_message_when_transition_is_blocked() {
        let (machine, status_log) = shared();

        let changed = transition_with_status(
            &machine,
            &status_log,
            AppEvent::CancelCapture,
            "transition blocked",
            "cannot transition",
        );

        assert!(!changed);
        assert_eq!(status_log.borrow().as_str(), "transition blocked");
        assert_eq!(machine.borrow().phase(), AppPhase::Idle);
    }

    #[test]
    fn transition_with_status_updates_machine_on_success() {
        let (machine, status_log) = shared();

        let changed = transition_with_status(
            &machine,
            &status_log,
            AppEvent::RequestCapture,
            "transition blocked",
            "cannot transition",
        );

        assert!(changed);
        assert_eq!(machine.borrow().phase(), AppPhase::Capturing);
        assert!(status_log.borrow().is_empty());
    }

    #[test]
    fn notifications_follow_generation_outcome() {
        assert_eq!(
            notification_for(&GenerationOutcome::Completed(AppPhase::Result)),
            Some("Your post-workout photo is ready")
        );
        assert_eq!(
            notification_for(&GenerationOutcome::Completed(AppPhase::Error)),
            Some("Workout interrupted: generation failed")
        );
    }

    #[test]
    fn empty_upload_has_dedicated_toast() {
        let err = CaptureError::EmptyUpload {
            path: PathBuf::from("/tmp/empty.jpg"),
        };
        assert_eq!(upload_failure_toast(&err), "The selected file is empty");
    }
}
