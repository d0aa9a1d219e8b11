use crate::image_ref::ImageRef;

use super::model::AppPhase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    RequestCapture,
    CancelCapture,
    CameraFailed,
    Captured(ImageRef),
    GenerationSucceeded(ImageRef),
    GenerationFailed,
    Reset,
}

/// Payload-free discriminant of [`AppEvent`], used in history and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEventKind {
    RequestCapture,
    CancelCapture,
    CameraFailed,
    Captured,
    GenerationSucceeded,
    GenerationFailed,
    Reset,
}

impl AppEvent {
    pub fn kind(&self) -> AppEventKind {
        match self {
            Self::RequestCapture => AppEventKind::RequestCapture,
            Self::CancelCapture => AppEventKind::CancelCapture,
            Self::CameraFailed => AppEventKind::CameraFailed,
            Self::Captured(_) => AppEventKind::Captured,
            Self::GenerationSucceeded(_) => AppEventKind::GenerationSucceeded,
            Self::GenerationFailed => AppEventKind::GenerationFailed,
            Self::Reset => AppEventKind::Reset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: AppPhase,
    pub event: AppEventKind,
    pub to: AppPhase,
}

impl StateTransition {
    pub const fn new(from: AppPhase, event: AppEventKind, to: AppPhase) -> Self {
        Self { from, event, to }
    }
}
