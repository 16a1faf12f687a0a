use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use iso_engine::{validate_asset_key, AppPaths, AssetDirectory, KeyBinding, LoopConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings json in {path} at {field_path}: {source}")]
    Parse {
        path: PathBuf,
        field_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid settings in {path}: {field}: {message}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

/// Optional `settings.json` at the project root. Missing fields keep their
/// defaults; unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) map: String,
    pub(crate) window_title: String,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) target_tps: u32,
    pub(crate) max_render_fps: Option<u32>,
    /// Replaces the default bindings when present.
    pub(crate) key_bindings: Option<Vec<KeyBinding>>,
}

impl Default for Settings {
    fn default() -> Self {
        let loop_defaults = LoopConfig::default();
        Self {
            map: "debug".to_string(),
            window_title: loop_defaults.window_title,
            window_width: loop_defaults.window_width,
            window_height: loop_defaults.window_height,
            target_tps: loop_defaults.target_tps,
            max_render_fps: loop_defaults.max_render_fps,
            key_bindings: None,
        }
    }
}

impl Settings {
    pub(crate) fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(raw) => {
                let settings = Self::parse(path, &raw)?;
                info!(path = %path.display(), map = settings.map.as_str(), "settings_loaded");
                Ok(settings)
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "settings_missing_using_defaults");
                Ok(Self::default())
            }
            Err(source) => Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, SettingsError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let settings: Settings = serde_path_to_error::deserialize(&mut deserializer).map_err(
            |error| {
                let field_path = error.path().to_string();
                SettingsError::Parse {
                    path: path.to_path_buf(),
                    field_path: if field_path.is_empty() {
                        ".".to_string()
                    } else {
                        field_path
                    },
                    source: error.into_inner(),
                }
            },
        )?;
        settings.validate(path)?;
        Ok(settings)
    }

    fn validate(&self, path: &Path) -> Result<(), SettingsError> {
        let invalid = |field: &'static str, message: String| SettingsError::Invalid {
            path: path.to_path_buf(),
            field,
            message,
        };
        validate_asset_key(&self.map).map_err(|error| invalid("map", error.to_string()))?;
        if self.window_width == 0 || self.window_height == 0 {
            return Err(invalid(
                "window_width/window_height",
                "window size must be non-zero".to_string(),
            ));
        }
        if self.target_tps == 0 {
            return Err(invalid("target_tps", "must be at least 1".to_string()));
        }
        Ok(())
    }

    pub(crate) fn loop_config(&self, paths: &AppPaths) -> LoopConfig {
        let defaults = LoopConfig::default();
        LoopConfig {
            window_title: self.window_title.clone(),
            window_width: self.window_width,
            window_height: self.window_height,
            target_tps: self.target_tps,
            max_render_fps: self.max_render_fps,
            sprites_dir: AssetDirectory::new(paths.base_content_dir.clone()).sprites_dir(),
            key_bindings: self
                .key_bindings
                .clone()
                .unwrap_or(defaults.key_bindings),
            ..defaults
        }
    }
}
