use std::sync::Arc;

use crate::config::{load_app_config, AppConfig, StartupFlags};
use crate::error::AppResult;
use crate::generation::{GeminiClient, GenerationClient};
use crate::storage::StorageService;

use super::session_actions::CaptureSettings;

pub(super) struct AppBootstrap {
    pub(super) config: AppConfig,
    pub(super) generation_client: Arc<dyn GenerationClient>,
    pub(super) storage: StorageService,
}

pub(super) fn bootstrap_app_runtime(flags: &StartupFlags) -> AppResult<AppBootstrap> {
    let mut config = load_app_config();
    config.apply_flags(flags);
    tracing::info!(
        model = %config.model,
        api_base = %config.api_base,
        camera_device = %config.camera_device,
        jpeg_quality = config.jpeg_quality,
        output_dir = %config.output_dir.display(),
        "loaded app config"
    );

    let generation_client = GeminiClient::from_env(&config.api_base, &config.model)?;
    tracing::debug!(client = ?generation_client, "generation client ready");
    let storage = StorageService::with_output_dir(config.output_dir.clone());

    Ok(AppBootstrap {
        config,
        generation_client: Arc::new(generation_client),
        storage,
    })
}

pub(super) fn capture_settings(config: &AppConfig) -> CaptureSettings {
    CaptureSettings {
        camera_device: config.camera_device.clone(),
        jpeg_quality: config.jpeg_quality,
    }
}

/// Only argv[0] goes to GTK; our flags are parsed separately and would fail
/// GTK's own option parsing.
pub(super) fn gtk_launch_args() -> Vec<String> {
    gtk_launch_args_from(std::env::args())
}

fn gtk_launch_args_from(args: impl IntoIterator<Item = String>) -> Vec<String> {
    args.into_iter()
        .next()
        .map_or_else(|| vec!["gymglow".to_string()], |program| vec![program])
}
