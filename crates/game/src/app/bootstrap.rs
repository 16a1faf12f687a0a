use std::rc::Rc;

use iso_engine::{
    resolve_app_paths, AssetDirectory, BattleController, BattleLoadError, ContentSource,
    LoopConfig, State, StartupError, Viewport,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::settings::{Settings, SettingsError};

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Battle(#[from] BattleLoadError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) state: Box<dyn State>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Iso Tactics Startup ===");

    let paths = resolve_app_paths()?;
    let settings = Settings::load_or_default(&paths.settings_file)?;
    let config = settings.loop_config(&paths);

    let source: Rc<dyn ContentSource> =
        Rc::new(AssetDirectory::new(paths.base_content_dir.clone()));
    let controller = BattleController::load(
        &settings.map,
        source,
        Viewport {
            width: config.window_width,
            height: config.window_height,
        },
    )?;
    info!(
        root = %paths.root.display(),
        content = %paths.base_content_dir.display(),
        map = settings.map.as_str(),
        "bootstrap_complete"
    );

    Ok(AppWiring {
        config,
        state: Box::new(controller),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
