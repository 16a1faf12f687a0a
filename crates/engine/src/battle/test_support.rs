use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;

use crate::content::{
    parse_map_records, parse_object_table, parse_tile_set, ContentError, ContentSource, MapRecord,
    ObjectRecord, TileSetDef,
};

pub(crate) const GRASSLAND_XML: &str = r#"<TileSet sheet="tiles/grassland">
    <Sprite name="grass" role="top"/>
    <Sprite name="grass" role="side"/>
    <Sprite name="stone" role="top"/>
</TileSet>"#;

pub(crate) const OBJECTS_XML: &str = r#"<Objects>
    <Object id="oak"><type>billboard</type><sprite_sheet>objects/trees</sprite_sheet><sprite>1</sprite></Object>
    <Object id="rock"><type>terrain</type><sprite_sheet>objects/rocks</sprite_sheet><sprite>0</sprite><height>24</height></Object>
    <Object id="ghost"><type>spectre</type></Object>
</Objects>"#;

/// In-memory content with load counters.
#[derive(Default)]
pub(crate) struct MemorySource {
    pub maps: HashMap<String, String>,
    pub tile_sets: HashMap<String, String>,
    pub objects: Option<String>,
    pub tile_set_loads: Cell<usize>,
    pub object_table_loads: Cell<usize>,
}

impl MemorySource {
    pub(crate) fn standard() -> Self {
        let mut source = Self::default();
        source
            .tile_sets
            .insert("grassland".to_string(), GRASSLAND_XML.to_string());
        source.objects = Some(OBJECTS_XML.to_string());
        source
    }

    pub(crate) fn with_map(mut self, id: &str, raw: &str) -> Self {
        self.maps.insert(id.to_string(), raw.to_string());
        self
    }
}

fn missing(path: &str) -> ContentError {
    ContentError::read_file(
        Path::new(path),
        &std::io::Error::from(std::io::ErrorKind::NotFound),
    )
}

impl ContentSource for MemorySource {
    fn map_records(&self, map_id: &str) -> Result<Vec<MapRecord>, ContentError> {
        let raw = self.maps.get(map_id).ok_or_else(|| missing(map_id))?;
        Ok(parse_map_records(Path::new(map_id), raw))
    }

    fn tile_set(&self, tile_set_id: &str) -> Result<TileSetDef, ContentError> {
        self.tile_set_loads.set(self.tile_set_loads.get() + 1);
        let raw = self
            .tile_sets
            .get(tile_set_id)
            .ok_or_else(|| missing(tile_set_id))?;
        parse_tile_set(Path::new(tile_set_id), raw)
    }

    fn object_table(&self) -> Result<HashMap<String, ObjectRecord>, ContentError> {
        self.object_table_loads
            .set(self.object_table_loads.get() + 1);
        let raw = self.objects.as_deref().ok_or_else(|| missing("objects"))?;
        parse_object_table(Path::new("objects.xml"), raw)
    }
}

pub(crate) fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}
