use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::image_ref::ImageRef;
use thiserror::Error;

const RESULT_FILE_PREFIX: &str = "gymglow-after-";
const PICTURES_SUBDIR: &str = "Pictures";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no generated image to save")]
    NothingToSave,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Writes generated images into the user's output directory.
#[derive(Debug, Clone)]
pub struct StorageService {
    output_dir: PathBuf,
}

impl StorageService {
    pub const fn with_output_dir(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn allocate_target_path(&self, image: &ImageRef, stamp_millis: u128) -> PathBuf {
        self.output_dir.join(format!(
            "{RESULT_FILE_PREFIX}{stamp_millis}.{}",
            image.file_extension()
        ))
    }

    /// Saves the generated image, never overwriting an earlier download.
    pub fn save_result(&self, image: &ImageRef) -> StorageResult<PathBuf> {
        if image.is_empty() {
            return Err(StorageError::NothingToSave);
        }
        fs::create_dir_all(&self.output_dir)?;

        let mut stamp = now_millis();
        loop {
            let target = self.allocate_target_path(image, stamp);
            match write_new_file(&target, image.bytes()) {
                Ok(()) => {
                    tracing::info!(path = %target.display(), bytes = image.len(), "saved generated image");
                    return Ok(target);
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => stamp += 1,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

pub fn default_output_dir(home: &Path) -> PathBuf {
    home.join(PICTURES_SUBDIR)
}

/// Creates `path` and fails with `AlreadyExists` instead of truncating.
fn write_new_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}
