use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::capture::DEFAULT_JPEG_QUALITY;
use crate::generation::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::storage::default_output_dir;

mod startup;

pub use startup::{StartupAction, StartupFlags};

const APP_DIR: &str = "gymglow";
const APP_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
const FALLBACK_OUTPUT_DIR: &str = "/tmp/gymglow";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    MissingHomeDirectory,
    #[error("flag {flag} requires a value")]
    MissingFlagValue { flag: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Raw `config.json` contents. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct AppConfigFile {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    camera_device: Option<String>,
    #[serde(default)]
    jpeg_quality: Option<u8>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
}

/// Effective settings after defaults and CLI overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub model: String,
    pub api_base: String,
    pub camera_device: String,
    pub jpeg_quality: u8,
    pub output_dir: PathBuf,
}

impl AppConfig {
    fn defaults(home: Option<&Path>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            camera_device: DEFAULT_CAMERA_DEVICE.to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            output_dir: home
                .map(default_output_dir)
                .unwrap_or_else(|| PathBuf::from(FALLBACK_OUTPUT_DIR)),
        }
    }

    fn merged(file: AppConfigFile, home: Option<&Path>) -> Self {
        let defaults = Self::defaults(home);
        Self {
            model: non_empty(file.model).unwrap_or(defaults.model),
            api_base: non_empty(file.api_base).unwrap_or(defaults.api_base),
            camera_device: non_empty(file.camera_device).unwrap_or(defaults.camera_device),
            jpeg_quality: file
                .jpeg_quality
                .map_or(defaults.jpeg_quality, |quality| quality.clamp(1, 100)),
            output_dir: file
                .output_dir
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(defaults.output_dir),
        }
    }

    pub fn apply_flags(&mut self, flags: &StartupFlags) {
        if let Some(device) = flags.camera_device.as_ref() {
            self.camera_device = device.clone();
        }
        if let Some(model) = flags.model.as_ref() {
            self.model = model.clone();
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let (_, home) = config_env_dirs();
        Self::defaults(home.as_deref())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(path) => path,
        Err(err) => {
            tracing::warn!(%err, "cannot resolve config path; using defaults");
            return AppConfig::defaults(home);
        }
    };
    if !path.exists() {
        tracing::debug!(?path, "no config file; using defaults");
        return AppConfig::defaults(home);
    }

    let file = match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfigFile::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfigFile::default()
        }
    };
    AppConfig::merged(file, home)
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> ConfigResult<PathBuf> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(xdg_config_home: Option<&Path>, home: Option<&Path>) -> ConfigResult<PathBuf> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fresh_config_root(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "gymglow-config-{name}-{}-{nanos}",
            std::process::id()
        ))
    }

    fn write_config(root: &Path, contents: &str) {
        let dir = root.join(APP_DIR);
        fs::create_dir_all(&dir).expect("config dir should be created");
        fs::write(dir.join(APP_CONFIG_FILE), contents).expect("config should be written");
    }

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "gymglow",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/gymglow/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("gymglow", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/gymglow/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("gymglow", "config.json", Some(Path::new("")), None)
            .expect_err("path should not resolve");
        assert_eq!(error, ConfigError::MissingHomeDirectory);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let root = fresh_config_root("missing");
        let config = load_app_config_with(Some(&root), Some(Path::new("/home/test")));

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.camera_device, DEFAULT_CAMERA_DEVICE);
        assert_eq!(config.jpeg_quality, DEFAULT_JPEG_QUALITY);
        assert_eq!(config.output_dir, PathBuf::from("/home/test/Pictures"));
    }

    #[test]
    fn partial_config_overrides_only_given_keys_and_clamps_quality() {
        let root = fresh_config_root("partial");
        write_config(
            &root,
            r#"{"model": "custom-image-model", "jpeg_quality": 0, "camera_device": "  "}"#,
        );

        let config = load_app_config_with(Some(&root), Some(Path::new("/home/test")));

        assert_eq!(config.model, "custom-image-model");
        assert_eq!(config.jpeg_quality, 1);
        assert_eq!(config.camera_device, DEFAULT_CAMERA_DEVICE);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let root = fresh_config_root("malformed");
        write_config(&root, "{ not json");

        let config = load_app_config_with(Some(&root), Some(Path::new("/home/test")));

        assert_eq!(config, AppConfig::defaults(Some(Path::new("/home/test"))));
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn startup_flags_override_file_values() {
        let mut config = AppConfig::defaults(Some(Path::new("/home/test")));
        let flags = StartupFlags {
            camera_device: Some("/dev/video4".to_string()),
            model: None,
            action: StartupAction::Run,
        };

        config.apply_flags(&flags);

        assert_eq!(config.camera_device, "/dev/video4");
        assert_eq!(config.model, DEFAULT_MODEL);
    }
}
