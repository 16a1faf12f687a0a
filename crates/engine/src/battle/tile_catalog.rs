use std::collections::HashMap;
use std::rc::Rc;

use tracing::{info, warn};

use crate::app::SpriteRef;
use crate::content::{ContentSource, SpriteRole, TileSetDef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileType {
    pub name: String,
    pub top: SpriteRef,
    pub side: SpriteRef,
}

#[derive(Debug, Clone, Default)]
pub struct TileSet {
    types: HashMap<String, Rc<TileType>>,
}

impl TileSet {
    pub fn from_def(tile_set_id: &str, def: &TileSetDef) -> Self {
        let sheet: Rc<str> = Rc::from(def.sheet.as_str());
        let mut tops = HashMap::<&str, u32>::new();
        let mut sides = HashMap::<&str, u32>::new();
        for sprite in &def.sprites {
            let slot = match sprite.role {
                SpriteRole::Top => &mut tops,
                SpriteRole::Side => &mut sides,
            };
            slot.entry(sprite.name.as_str()).or_insert(sprite.index);
        }

        let mut types = HashMap::new();
        for (name, top) in &tops {
            let side = sides.get(name).copied().unwrap_or(*top);
            types.insert(
                name.to_string(),
                Rc::new(TileType {
                    name: name.to_string(),
                    top: SpriteRef::new(Rc::clone(&sheet), *top),
                    side: SpriteRef::new(Rc::clone(&sheet), side),
                }),
            );
        }
        for name in sides.keys().filter(|name| !tops.contains_key(*name)) {
            warn!(tile_set = tile_set_id, name, "tile_type_without_top_sprite");
        }
        Self { types }
    }

    pub fn get(&self, name: &str) -> Option<Rc<TileType>> {
        self.types.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Tile sets by identifier. Each identifier is loaded at most once; a failed
/// load is remembered so it is neither retried nor reported again.
pub struct TileCatalog {
    source: Rc<dyn ContentSource>,
    cache: HashMap<String, Option<Rc<TileSet>>>,
}

impl TileCatalog {
    pub fn new(source: Rc<dyn ContentSource>) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, tile_set_id: &str) -> Option<Rc<TileSet>> {
        if let Some(cached) = self.cache.get(tile_set_id) {
            return cached.clone();
        }
        let loaded = match self.source.tile_set(tile_set_id) {
            Ok(def) => {
                let tile_set = TileSet::from_def(tile_set_id, &def);
                info!(
                    tile_set = tile_set_id,
                    tile_types = tile_set.len(),
                    "tile_set_loaded"
                );
                Some(Rc::new(tile_set))
            }
            Err(error) => {
                warn!(tile_set = tile_set_id, error = %error, "tile_set_load_failed");
                None
            }
        };
        self.cache.insert(tile_set_id.to_string(), loaded.clone());
        loaded
    }
}
