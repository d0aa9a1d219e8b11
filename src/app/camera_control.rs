use std::cell::RefCell;

use crate::capture::{CameraBackend, CameraFrame, CameraSession, CaptureError};
use crate::image_ref::ImageRef;
use crate::state::AppEvent;

use super::session_actions::{set_status, transition_with_status, SharedMachine, SharedStatusLog};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum CameraPoll {
    Frame(CameraFrame),
    Unchanged,
    Stopped,
}

#[derive(Debug)]
pub(super) enum ShutterOutcome {
    /// The photo was taken and the camera is already off.
    Captured(ImageRef),
    NotRunning,
    WarmingUp,
    /// The stream died; the capture screen now shows the camera error.
    CameraLost,
    Failed(CaptureError),
}

/// Owns the live camera while the capture screen is up. Every exit path
/// drops the [`CameraSession`], which stops the stream.
pub(super) struct CameraController {
    machine: SharedMachine,
    status_log: SharedStatusLog,
    backend: Box<dyn CameraBackend>,
    device: String,
    jpeg_quality: u8,
    session: RefCell<Option<CameraSession>>,
    error: RefCell<Option<String>>,
}

impl CameraController {
    pub(super) fn new(
        machine: SharedMachine,
        status_log: SharedStatusLog,
        backend: Box<dyn CameraBackend>,
        device: impl Into<String>,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            machine,
            status_log,
            backend,
            device: device.into(),
            jpeg_quality,
            session: RefCell::new(None),
            error: RefCell::new(None),
        }
    }

    pub(super) fn failed(&self) -> bool {
        self.error.borrow().is_some()
    }

    pub(super) fn running(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Enters Capturing and opens the camera. A camera that cannot be opened
    /// still enters Capturing so the screen can show the error.
    pub(super) fn start(&self) -> bool {
        if !transition_with_status(
            &self.machine,
            &self.status_log,
            AppEvent::RequestCapture,
            "camera can only start from the start screen",
            "cannot start camera",
        ) {
            return false;
        }

        self.error.replace(None);
        match CameraSession::open_with(self.backend.as_ref(), self.jpeg_quality) {
            Ok(session) => {
                self.session.replace(Some(session));
                set_status(&self.status_log, "camera ready");
            }
            Err(err) => self.mark_failed(&err),
        }
        true
    }

    pub(super) fn poll(&self, last_sequence: u64) -> CameraPoll {
        let polled = match self.session.borrow().as_ref() {
            Some(session) => session.latest_frame(),
            None => return CameraPoll::Stopped,
        };
        match polled {
            Ok(Some(frame)) if frame.sequence != last_sequence => CameraPoll::Frame(frame),
            Ok(_) => CameraPoll::Unchanged,
            Err(err) => {
                self.mark_failed(&err);
                CameraPoll::Stopped
            }
        }
    }

    pub(super) fn shutter(&self) -> ShutterOutcome {
        let captured = match self.session.borrow().as_ref() {
            Some(session) => session.capture(),
            None => {
                set_status(&self.status_log, "camera is not running");
                return ShutterOutcome::NotRunning;
            }
        };

        match captured {
            Ok(image) => {
                self.release();
                ShutterOutcome::Captured(image)
            }
            Err(CaptureError::NoFrameAvailable) => ShutterOutcome::WarmingUp,
            Err(err @ CaptureError::CameraUnavailable { .. }) => {
                self.mark_failed(&err);
                ShutterOutcome::CameraLost
            }
            Err(err) => {
                tracing::warn!(%err, "photo capture failed");
                set_status(&self.status_log, format!("capture failed: {err}"));
                ShutterOutcome::Failed(err)
            }
        }
    }

    /// "Cancel" with a live camera, "Go Back" after a camera failure.
    pub(super) fn leave(&self) {
        let failed = self.error.take().is_some();
        self.release();
        let event = if failed {
            AppEvent::CameraFailed
        } else {
            AppEvent::CancelCapture
        };
        if transition_with_status(
            &self.machine,
            &self.status_log,
            event,
            "not capturing",
            "cannot leave camera",
        ) {
            set_status(&self.status_log, "ready");
        }
    }

    /// Drops the camera and any recorded failure, ahead of a session reset.
    pub(super) fn clear(&self) {
        self.error.replace(None);
        self.release();
    }

    pub(super) fn release(&self) {
        drop(self.session.take());
    }

    fn mark_failed(&self, err: &CaptureError) {
        tracing::warn!(%err, device = %self.device, "camera unavailable");
        self.release();
        self.error.replace(Some(err.to_string()));
        set_status(&self.status_log, format!("camera unavailable: {err}"));
    }
}

impl std::fmt::Debug for CameraController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraController")
            .field("device", &self.device)
            .field("running", &self.running())
            .field("failed", &self.failed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::test_support::{jpeg_bytes, FakeCameraBackend};
    use crate::state::{AppPhase, SessionMachine};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Harness {
        machine: SharedMachine,
        releases: Rc<Cell<usize>>,
        ended: Rc<Cell<bool>>,
        camera: CameraController,
    }

    fn harness(backend: FakeCameraBackend) -> Harness {
        let machine: SharedMachine = Rc::new(RefCell::new(SessionMachine::new()));
        let status_log: SharedStatusLog = Rc::new(RefCell::new(String::new()));
        let releases = backend.releases.clone();
        let ended = backend.ended.clone();
        let camera = CameraController::new(
            machine.clone(),
            status_log,
            Box::new(backend),
            "/dev/video0",
            90,
        );
        Harness {
            machine,
            releases,
            ended,
            camera,
        }
    }

    fn live_camera() -> Harness {
        let h = harness(FakeCameraBackend::with_frame(Some(jpeg_bytes(40, 30))));
        assert!(h.camera.start());
        assert!(h.camera.running());
        assert_eq!(h.releases.get(), 0);
        h
    }

    #[test]
    fn cancel_releases_camera_and_returns_idle() {
        let h = live_camera();

        h.camera.leave();

        assert_eq!(h.releases.get(), 1);
        assert!(!h.camera.running());
        assert_eq!(h.machine.borrow().phase(), AppPhase::Idle);
    }

    #[test]
    fn shutter_releases_camera_before_handing_over_photo() {
        let h = live_camera();

        let outcome = h.camera.shutter();

        let image = match outcome {
            ShutterOutcome::Captured(image) => image,
            other => panic!("expected a captured photo, got {other:?}"),
        };
        assert!(!image.is_empty());
        assert_eq!(h.releases.get(), 1);
        assert!(!h.camera.running());
    }

    #[test]
    fn stream_failure_during_preview_releases_camera_and_keeps_capture_screen() {
        let h = live_camera();
        h.ended.set(true);

        assert_eq!(h.camera.poll(0), CameraPoll::Stopped);

        assert_eq!(h.releases.get(), 1);
        assert!(h.camera.failed());
        assert_eq!(h.machine.borrow().phase(), AppPhase::Capturing);

        h.camera.leave();
        assert_eq!(h.releases.get(), 1);
        assert_eq!(h.machine.borrow().phase(), AppPhase::Idle);
        assert!(!h.camera.failed());
    }

    #[test]
    fn shutter_on_dead_stream_reports_camera_lost_and_releases() {
        let h = live_camera();
        h.ended.set(true);

        assert!(matches!(h.camera.shutter(), ShutterOutcome::CameraLost));
        assert_eq!(h.releases.get(), 1);
        assert!(h.camera.failed());
    }

    #[test]
    fn reset_clear_releases_camera() {
        let h = live_camera();

        h.camera.clear();

        assert_eq!(h.releases.get(), 1);
        assert!(!h.camera.running());
    }

    #[test]
    fn window_close_release_stops_camera_once() {
        let h = live_camera();

        h.camera.release();
        h.camera.release();

        assert_eq!(h.releases.get(), 1);
    }

    #[test]
    fn open_failure_enters_capture_screen_with_error_and_nothing_to_release() {
        let mut backend = FakeCameraBackend::with_frame(None);
        backend.fail_open = true;
        let h = harness(backend);

        assert!(h.camera.start());

        assert!(h.camera.failed());
        assert!(!h.camera.running());
        assert_eq!(h.machine.borrow().phase(), AppPhase::Capturing);
        assert_eq!(h.releases.get(), 0);
    }

    #[test]
    fn poll_reports_only_new_frames() {
        let h = live_camera();

        assert!(matches!(h.camera.poll(0), CameraPoll::Frame(_)));
        assert_eq!(h.camera.poll(1), CameraPoll::Unchanged);
    }

    #[test]
    fn start_outside_idle_is_refused_without_opening_camera() {
        let h = live_camera();

        assert!(!h.camera.start());
        assert_eq!(h.releases.get(), 0);
        assert!(h.camera.running());
    }
}
