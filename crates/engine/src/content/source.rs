use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::asset_keys::asset_path;

use super::error::ContentError;
use super::map_records::{parse_map_records, MapRecord};
use super::object_table::{parse_object_table, ObjectRecord};
use super::tile_sets::{parse_tile_set, TileSetDef};

pub const MAPS_DIR: &str = "maps";
pub const TILE_SETS_DIR: &str = "tilesets";
pub const SPRITES_DIR: &str = "sprites";
pub const OBJECT_TABLE_FILE: &str = "objects.xml";

/// Where battle content comes from. Implementations are read synchronously
/// and at most once per identifier by the caches that own them.
pub trait ContentSource {
    fn map_records(&self, map_id: &str) -> Result<Vec<MapRecord>, ContentError>;
    fn tile_set(&self, tile_set_id: &str) -> Result<TileSetDef, ContentError>;
    fn object_table(&self) -> Result<HashMap<String, ObjectRecord>, ContentError>;
}

/// Content read from an on-disk directory such as `assets/base`.
#[derive(Debug, Clone)]
pub struct AssetDirectory {
    root: PathBuf,
}

impl AssetDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sprites_dir(&self) -> PathBuf {
        self.root.join(SPRITES_DIR)
    }

    fn keyed_path(&self, dir: &str, key: &str, extension: &str) -> Result<PathBuf, ContentError> {
        let dir = self.root.join(dir);
        asset_path(&dir, key, extension).map_err(|error| {
            ContentError::invalid_key(&dir, format!("invalid asset key '{key}': {error}"))
        })
    }
}

fn read_text(path: &Path) -> Result<String, ContentError> {
    debug!(path = %path.display(), "content_read");
    fs::read_to_string(path).map_err(|source| ContentError::read_file(path, &source))
}

impl ContentSource for AssetDirectory {
    fn map_records(&self, map_id: &str) -> Result<Vec<MapRecord>, ContentError> {
        let path = self.keyed_path(MAPS_DIR, map_id, "map")?;
        let raw = read_text(&path)?;
        Ok(parse_map_records(&path, &raw))
    }

    fn tile_set(&self, tile_set_id: &str) -> Result<TileSetDef, ContentError> {
        let path = self.keyed_path(TILE_SETS_DIR, tile_set_id, "xml")?;
        let raw = read_text(&path)?;
        parse_tile_set(&path, &raw)
    }

    fn object_table(&self) -> Result<HashMap<String, ObjectRecord>, ContentError> {
        let path = self.root.join(OBJECT_TABLE_FILE);
        let raw = read_text(&path)?;
        parse_object_table(&path, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentErrorCode;

    #[test]
    fn reads_each_kind_of_content_from_its_directory() {
        let temp = tempfile::tempdir().expect("temp");
        fs::create_dir_all(temp.path().join(MAPS_DIR)).expect("maps");
        fs::create_dir_all(temp.path().join(TILE_SETS_DIR)).expect("tilesets");
        fs::write(
            temp.path().join(MAPS_DIR).join("debug.map"),
            "tileset id=grassland\n",
        )
        .expect("map");
        fs::write(
            temp.path().join(TILE_SETS_DIR).join("grassland.xml"),
            r#"<TileSet sheet="tiles/grassland"><Sprite name="grass" role="top"/></TileSet>"#,
        )
        .expect("tileset");
        fs::write(
            temp.path().join(OBJECT_TABLE_FILE),
            r#"<Objects><Object id="oak"><type>billboard</type></Object></Objects>"#,
        )
        .expect("objects");

        let source = AssetDirectory::new(temp.path());
        assert_eq!(source.map_records("debug").expect("map").len(), 1);
        assert_eq!(source.tile_set("grassland").expect("set").sprites.len(), 1);
        assert!(source.object_table().expect("objects").contains_key("oak"));
    }

    #[test]
    fn missing_map_is_a_read_error() {
        let temp = tempfile::tempdir().expect("temp");
        let source = AssetDirectory::new(temp.path());
        let error = source.map_records("nowhere").expect_err("must fail");
        assert_eq!(error.code, ContentErrorCode::ReadFile);
        assert!(error.file_path.ends_with("maps/nowhere.map"));
    }

    #[test]
    fn traversal_keys_never_touch_the_filesystem() {
        let temp = tempfile::tempdir().expect("temp");
        let source = AssetDirectory::new(temp.path());
        let error = source.tile_set("../objects").expect_err("must fail");
        assert_eq!(error.code, ContentErrorCode::InvalidKey);
    }
}
