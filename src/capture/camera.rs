//! Live camera streams.
//!
//! A [`CameraSession`] owns the acquired stream for as long as the capture
//! screen is shown. Dropping the session releases the device, so every way
//! out of the capture screen (cancel, shutter, camera failure, window close)
//! turns the camera off.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use super::{capture_frame, CaptureError, CaptureResult};
use crate::image_ref::ImageRef;

const FFMPEG_COMMAND: &str = "ffmpeg";
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];
const READ_CHUNK_BYTES: usize = 64 * 1024;
const MAX_PENDING_BYTES: usize = 16 * 1024 * 1024;

/// One complete JPEG frame. `sequence` grows by one per frame received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFrame {
    pub sequence: u64,
    pub jpeg: Arc<[u8]>,
}

pub trait FrameSource {
    /// Latest frame, `Ok(None)` while the stream warms up, or
    /// `CameraUnavailable` once the stream has ended. A frame that arrived
    /// before the end is stale and never returned.
    fn latest_frame(&self) -> CaptureResult<Option<CameraFrame>>;
    /// Stops the stream. Must be safe to call more than once.
    fn release(&mut self);
}

pub trait CameraBackend {
    fn open(&self) -> CaptureResult<Box<dyn FrameSource>>;
}

pub struct CameraSession {
    source: Box<dyn FrameSource>,
    jpeg_quality: u8,
}

impl CameraSession {
    pub fn open_with<B: CameraBackend + ?Sized>(backend: &B, jpeg_quality: u8) -> CaptureResult<Self> {
        let source = backend.open()?;
        tracing::info!("camera stream acquired");
        Ok(Self {
            source,
            jpeg_quality,
        })
    }

    pub fn latest_frame(&self) -> CaptureResult<Option<CameraFrame>> {
        self.source.latest_frame()
    }

    /// Crops the current frame to a centered square and encodes it as JPEG.
    pub fn capture(&self) -> CaptureResult<ImageRef> {
        let frame = self
            .source
            .latest_frame()?
            .ok_or(CaptureError::NoFrameAvailable)?;
        capture_frame(&frame.jpeg, self.jpeg_quality)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.source.release();
        tracing::info!("camera stream released");
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("jpeg_quality", &self.jpeg_quality)
            .finish_non_exhaustive()
    }
}

/// Streams MJPEG from a V4L2 device through an `ffmpeg` child process.
#[derive(Debug, Clone)]
pub struct FfmpegCameraBackend {
    device: String,
}

impl FfmpegCameraBackend {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    fn command_args(&self) -> Vec<&str> {
        vec![
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "v4l2",
            "-i",
            self.device.as_str(),
            "-f",
            "image2pipe",
            "-vcodec",
            "mjpeg",
            "-q:v",
            "3",
            "-",
        ]
    }
}

impl CameraBackend for FfmpegCameraBackend {
    fn open(&self) -> CaptureResult<Box<dyn FrameSource>> {
        if !Path::new(&self.device).exists() {
            return Err(CaptureError::CameraUnavailable {
                message: format!("camera device {} not found", self.device),
            });
        }

        let mut child = Command::new(FFMPEG_COMMAND)
            .args(self.command_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| CaptureError::CameraUnavailable {
                message: format!("failed to start {FFMPEG_COMMAND}: {err}"),
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            cleanup_child(&mut child);
            return Err(CaptureError::CameraUnavailable {
                message: format!("{FFMPEG_COMMAND} output pipes unavailable"),
            });
        };

        let state = Arc::new(Mutex::new(StreamState::default()));
        let frame_reader = {
            let state = state.clone();
            std::thread::spawn(move || read_frames(stdout, &state))
        };
        let error_reader = {
            let state = state.clone();
            std::thread::spawn(move || read_errors(stderr, &state))
        };

        tracing::info!(device = %self.device, pid = child.id(), "started camera capture process");
        Ok(Box::new(FfmpegFrameSource {
            child: Some(child),
            readers: vec![frame_reader, error_reader],
            state,
        }))
    }
}

#[derive(Debug, Default)]
struct StreamState {
    latest: Option<CameraFrame>,
    ended: bool,
    last_error_line: Option<String>,
}

struct FfmpegFrameSource {
    child: Option<Child>,
    readers: Vec<JoinHandle<()>>,
    state: Arc<Mutex<StreamState>>,
}

impl FrameSource for FfmpegFrameSource {
    fn latest_frame(&self) -> CaptureResult<Option<CameraFrame>> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.ended {
            let message = state
                .last_error_line
                .clone()
                .unwrap_or_else(|| "camera stream ended".to_string());
            return Err(CaptureError::CameraUnavailable { message });
        }
        Ok(state.latest.clone())
    }

    fn release(&mut self) {
        if let Some(mut child) = self.child.take() {
            cleanup_child(&mut child);
        }
        for reader in self.readers.drain(..) {
            if reader.join().is_err() {
                tracing::warn!("camera reader thread panicked");
            }
        }
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        self.release();
    }
}

fn cleanup_child(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn read_frames<R: Read>(mut stdout: R, state: &Mutex<StreamState>) {
    let mut pending = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK_BYTES];
    let mut sequence = 0u64;

    loop {
        let read = match stdout.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                tracing::warn!(?err, "camera stream read failed");
                break;
            }
        };
        pending.extend_from_slice(&chunk[..read]);

        if let Some(jpeg) = drain_complete_frames(&mut pending).pop() {
            sequence += 1;
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.latest = Some(CameraFrame {
                sequence,
                jpeg: jpeg.into(),
            });
        }
        if pending.len() > MAX_PENDING_BYTES {
            tracing::warn!(bytes = pending.len(), "dropping oversized partial camera frame");
            pending.clear();
        }
    }

    tracing::debug!(frames = sequence, "camera stream ended");
    state.lock().unwrap_or_else(PoisonError::into_inner).ended = true;
}

/// Drains stderr to the end. Lines are decoded lossily so a non-UTF-8 line
/// cannot stop the drain and stall ffmpeg on a full pipe.
fn read_errors<R: Read>(stderr: R, state: &Mutex<StreamState>) {
    for raw in BufReader::new(stderr).split(b'\n') {
        let raw = match raw {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                tracing::debug!(?err, "camera error stream read failed");
                break;
            }
        };
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        tracing::warn!(line, "camera capture process reported an error");
        state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_error_line = Some(line.to_string());
    }
}

/// Removes every complete JPEG (SOI..EOI) from the front of `buffer` and
/// returns them in stream order. A trailing partial frame stays buffered.
fn drain_complete_frames(buffer: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut consumed = 0;

    loop {
        let Some(start) = find_marker(&buffer[consumed..], JPEG_SOI).map(|at| consumed + at)
        else {
            // Keep one byte in case a marker is split across reads.
            consumed = consumed.max(buffer.len().saturating_sub(1));
            break;
        };
        let body_start = start + JPEG_SOI.len();
        let Some(end) = find_marker(&buffer[body_start..], JPEG_EOI)
            .map(|at| body_start + at + JPEG_EOI.len())
        else {
            consumed = start;
            break;
        };
        frames.push(buffer[start..end].to_vec());
        consumed = end;
    }

    buffer.drain(..consumed);
    frames
}

fn find_marker(haystack: &[u8], marker: [u8; 2]) -> Option<usize> {
    haystack.windows(2).position(|window| window == marker)
}
