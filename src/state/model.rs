use crate::image_ref::ImageRef;

/// Shown on the error screen; the underlying failure only goes to the log.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate gym version. The AI might be busy or the image was rejected.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppPhase {
    #[default]
    Idle,
    Capturing,
    Processing,
    Result,
    Error,
}

/// One capture/generation cycle. Fields live only on the variants that own them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Idle,
    Capturing,
    Processing {
        original: ImageRef,
    },
    Result {
        original: ImageRef,
        generated: ImageRef,
    },
    Error {
        original: ImageRef,
        message: String,
    },
}

impl Session {
    pub fn phase(&self) -> AppPhase {
        match self {
            Self::Idle => AppPhase::Idle,
            Self::Capturing => AppPhase::Capturing,
            Self::Processing { .. } => AppPhase::Processing,
            Self::Result { .. } => AppPhase::Result,
            Self::Error { .. } => AppPhase::Error,
        }
    }

    pub fn original_image(&self) -> Option<&ImageRef> {
        match self {
            Self::Processing { original }
            | Self::Result { original, .. }
            | Self::Error { original, .. } => Some(original),
            Self::Idle | Self::Capturing => None,
        }
    }

    pub fn generated_image(&self) -> Option<&ImageRef> {
        match self {
            Self::Result { generated, .. } => Some(generated),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}
