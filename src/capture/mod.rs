use std::path::PathBuf;

use crate::image_ref::ImageRef;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

pub mod camera;
pub mod upload;

pub use camera::{CameraBackend, CameraFrame, CameraSession, FfmpegCameraBackend, FrameSource};
pub use upload::load_upload;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera unavailable: {message}")]
    CameraUnavailable { message: String },
    #[error("camera has not produced a frame yet")]
    NoFrameAvailable,
    #[error("failed to decode camera frame: {message}")]
    FrameDecode { message: String },
    #[error("failed to encode captured image: {message}")]
    ImageEncode { message: String },
    #[error("failed to read {path}: {source}")]
    UploadRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("selected file is empty: {path}")]
    EmptyUpload { path: PathBuf },
}

pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Centered square inside a `width`x`height` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareCrop {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

pub fn centered_square(width: u32, height: u32) -> SquareCrop {
    let side = width.min(height);
    SquareCrop {
        x: (width - side) / 2,
        y: (height - side) / 2,
        side,
    }
}

pub fn crop_center_square(image: &DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let crop = centered_square(width, height);
    image.crop_imm(crop.x, crop.y, crop.side, crop.side)
}

pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> CaptureResult<ImageRef> {
    let quality = quality.clamp(1, 100);
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.to_rgb8())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))
        .map_err(|err| CaptureError::ImageEncode {
            message: err.to_string(),
        })?;
    Ok(ImageRef::jpeg(bytes))
}

/// Decodes one camera frame, crops it to a centered square and re-encodes it as JPEG.
pub fn capture_frame(frame: &[u8], quality: u8) -> CaptureResult<ImageRef> {
    let decoded = image::load_from_memory_with_format(frame, ImageFormat::Jpeg).map_err(|err| {
        CaptureError::FrameDecode {
            message: err.to_string(),
        }
    })?;
    let square = crop_center_square(&decoded);
    tracing::debug!(
        source_width = decoded.width(),
        source_height = decoded.height(),
        side = square.width(),
        "cropped camera frame to square"
    );
    encode_jpeg(&square, quality)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::Cell;
    use std::rc::Rc;

    use image::{DynamicImage, Rgb, RgbImage};

    use super::{CameraBackend, CameraFrame, CaptureError, CaptureResult, FrameSource};

    pub(crate) struct FakeFrameSource {
        frame: Option<Vec<u8>>,
        ended: Rc<Cell<bool>>,
        releases: Rc<Cell<usize>>,
    }

    impl FrameSource for FakeFrameSource {
        fn latest_frame(&self) -> CaptureResult<Option<CameraFrame>> {
            if self.ended.get() {
                return Err(CaptureError::CameraUnavailable {
                    message: "simulated stream end".to_string(),
                });
            }
            Ok(self.frame.as_ref().map(|jpeg| CameraFrame {
                sequence: 1,
                jpeg: jpeg.clone().into(),
            }))
        }

        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    /// Camera whose stream can be ended from the test and which counts releases.
    pub(crate) struct FakeCameraBackend {
        pub(crate) frame: Option<Vec<u8>>,
        pub(crate) ended: Rc<Cell<bool>>,
        pub(crate) fail_open: bool,
        pub(crate) releases: Rc<Cell<usize>>,
    }

    impl FakeCameraBackend {
        pub(crate) fn with_frame(frame: Option<Vec<u8>>) -> Self {
            Self {
                frame,
                ended: Rc::new(Cell::new(false)),
                fail_open: false,
                releases: Rc::new(Cell::new(0)),
            }
        }
    }

    impl CameraBackend for FakeCameraBackend {
        fn open(&self) -> CaptureResult<Box<dyn FrameSource>> {
            if self.fail_open {
                return Err(CaptureError::CameraUnavailable {
                    message: "simulated permission denied".to_string(),
                });
            }
            Ok(Box::new(FakeFrameSource {
                frame: self.frame.clone(),
                ended: self.ended.clone(),
                releases: self.releases.clone(),
            }))
        }
    }

    /// Frame whose pixel at (x, y) encodes its own coordinates in red/green.
    pub(crate) fn coordinate_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([x as u8, y as u8, 0])
        }))
    }

    pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        super::encode_jpeg(&coordinate_image(width, height), 95)
            .expect("test frame should encode")
            .bytes()
            .to_vec()
    }
}
