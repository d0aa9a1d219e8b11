use std::path::Path;

use image::ImageFormat;

use super::{CaptureError, CaptureResult};
use crate::image_ref::{ImageRef, MIME_OCTET_STREAM};

/// Reads a user-selected photo. A dismissed picker (`None`) is a no-op.
///
/// Uploads are passed through as-is: no cropping or re-encoding.
pub fn load_upload(path: Option<&Path>) -> CaptureResult<Option<ImageRef>> {
    let Some(path) = path else {
        tracing::debug!("file selection dismissed");
        return Ok(None);
    };

    let bytes = std::fs::read(path).map_err(|source| CaptureError::UploadRead {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(CaptureError::EmptyUpload {
            path: path.to_path_buf(),
        });
    }

    let mime_type = detect_mime_type(&bytes, path);
    tracing::info!(path = %path.display(), mime_type, bytes = bytes.len(), "loaded uploaded photo");
    Ok(Some(ImageRef::new(mime_type, bytes)))
}

fn detect_mime_type(bytes: &[u8], path: &Path) -> &'static str {
    image::guess_format(bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map(|format| format.to_mime_type())
        .unwrap_or(MIME_OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::test_support::jpeg_bytes;
    use crate::image_ref::{MIME_JPEG, MIME_PNG};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn fresh_test_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "gymglow-upload-{name}-{}-{nanos}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("test dir should be created");
        dir
    }

    #[test]
    fn dismissed_selection_is_a_no_op() {
        assert!(load_upload(None).expect("dismissal is not an error").is_none());
    }

    #[test]
    fn upload_keeps_bytes_and_sniffs_jpeg_mime() {
        let dir = fresh_test_dir("jpeg");
        let path = dir.join("portrait.bin");
        let bytes = jpeg_bytes(30, 50);
        fs::write(&path, &bytes).expect("write test photo");

        let image = load_upload(Some(&path))
            .expect("upload should load")
            .expect("selection should produce an image");

        assert_eq!(image.mime_type(), MIME_JPEG);
        assert_eq!(image.bytes(), bytes.as_slice());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn unknown_content_falls_back_to_extension_then_octet_stream() {
        let dir = fresh_test_dir("fallback");
        let named_png = dir.join("photo.png");
        let unnamed = dir.join("photo.data");
        fs::write(&named_png, b"opaque").expect("write png-named file");
        fs::write(&unnamed, b"opaque").expect("write unknown file");

        let by_extension = load_upload(Some(&named_png))
            .expect("upload should load")
            .expect("selection should produce an image");
        let unknown = load_upload(Some(&unnamed))
            .expect("upload should load")
            .expect("selection should produce an image");

        assert_eq!(by_extension.mime_type(), MIME_PNG);
        assert_eq!(unknown.mime_type(), MIME_OCTET_STREAM);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = fresh_test_dir("empty");
        let path = dir.join("empty.jpg");
        fs::write(&path, b"").expect("write empty file");

        let err = load_upload(Some(&path)).expect_err("empty file should fail");

        assert!(matches!(err, CaptureError::EmptyUpload { .. }));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_file_reports_read_error() {
        let dir = fresh_test_dir("missing");
        let err = load_upload(Some(&dir.join("nope.jpg"))).expect_err("missing file should fail");

        assert!(matches!(err, CaptureError::UploadRead { .. }));
        let _ = fs::remove_dir_all(dir);
    }
}
