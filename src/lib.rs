pub mod app;
pub mod capture;
pub mod config;
pub mod error;
pub mod generation;
pub mod image_ref;
pub mod logging;
pub mod notification;
pub mod state;
pub mod storage;
pub mod ui;
pub use error::{AppError, AppResult};

use config::{StartupAction, StartupFlags};

/// Entrypoint used by the binary.
pub fn run() -> AppResult<()> {
    logging::init();
    let flags = StartupFlags::from_env_args()?;
    if flags.action == StartupAction::PrintVersion {
        println!("gymglow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting GymGlow");
    let mut app = app::App::new(flags);
    app.start()?;

    tracing::info!(phase = ?app.session().phase(), "shutdown complete");
    Ok(())
}
