mod error;
mod map_records;
mod object_table;
mod source;
mod tile_sets;

pub use error::{ContentError, ContentErrorCode, SourceLocation};
pub use map_records::{parse_map_records, MapRecord, TilePlacement};
pub use object_table::{parse_object_table, ObjectRecord};
pub use source::{
    AssetDirectory, ContentSource, MAPS_DIR, OBJECT_TABLE_FILE, SPRITES_DIR, TILE_SETS_DIR,
};
pub use tile_sets::{parse_tile_set, SpriteRole, TileSetDef, TileSpriteDef};
