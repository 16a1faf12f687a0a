use std::path::{Path, PathBuf};

use thiserror::Error;

const MAX_KEY_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset key is longer than {max} characters")]
    TooLong { max: usize },
    #[error("asset key must not start or end with '/'")]
    EdgeSlash,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys name sheets, maps and tile sets relative to an asset directory, e.g.
/// `tiles/grassland`. They never carry an extension.
pub fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.len() > MAX_KEY_LEN {
        return Err(AssetKeyError::TooLong { max: MAX_KEY_LEN });
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(AssetKeyError::EdgeSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-') {
            continue;
        }
        return Err(AssetKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

pub(crate) fn asset_path(
    dir: &Path,
    key: &str,
    extension: &str,
) -> Result<PathBuf, AssetKeyError> {
    validate_asset_key(key)?;
    let mut path = dir.to_path_buf();
    for segment in key.split('/') {
        path.push(segment);
    }
    path.set_extension(extension);
    Ok(path)
}
