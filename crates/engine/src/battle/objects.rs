use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec3;
use tracing::{debug, warn};

use crate::app::{Palette, SpriteCanvas, SpriteRef, GRID_TILE_SIZE, TILT};
use crate::asset_keys::validate_asset_key;
use crate::content::{ContentSource, ObjectRecord};

const BILLBOARD_TYPE: &str = "billboard";
const TERRAIN_TYPE: &str = "terrain";

/// Draws `sprite` upright at the tile centre, turned to face the camera.
pub(crate) fn draw_billboard(
    canvas: &mut dyn SpriteCanvas,
    sprite: &SpriteRef,
    palette: &Palette,
    view_angle: f32,
) {
    let half = GRID_TILE_SIZE * 0.5;
    canvas.push();
    canvas.translate(Vec3::new(half, half, 0.0));
    canvas.rotate_z(-view_angle);
    canvas.rotate_x(TILT);
    canvas.scale(Vec3::new(1.0, -1.0, 1.0));
    canvas.translate(Vec3::new(-half, -GRID_TILE_SIZE, 0.0));
    canvas.draw_sprite(sprite, palette);
    canvas.pop();
}

/// Something standing on a tile.
#[derive(Debug, Clone, PartialEq)]
pub enum BattleObject {
    /// Static sprite counter-rotated against the view angle.
    Billboard { id: String, sprite: SpriteRef },
}

impl BattleObject {
    pub fn id(&self) -> &str {
        match self {
            BattleObject::Billboard { id, .. } => id,
        }
    }

    /// Height above the tile surface of the object's top edge.
    pub fn height_offset(&self) -> f32 {
        match self {
            BattleObject::Billboard { .. } => GRID_TILE_SIZE,
        }
    }

    pub fn display(&self, canvas: &mut dyn SpriteCanvas, view_angle: f32) {
        match self {
            BattleObject::Billboard { sprite, .. } => {
                draw_billboard(canvas, sprite, &Palette::IDENTITY, view_angle)
            }
        }
    }
}

/// Decoration attached to a tile. Its height lifts the tile's occupant.
#[derive(Debug, Clone, PartialEq)]
pub enum Terrain {
    Static {
        id: String,
        sprite: SpriteRef,
        height: f32,
    },
}

impl Terrain {
    pub fn id(&self) -> &str {
        match self {
            Terrain::Static { id, .. } => id,
        }
    }

    pub fn height(&self) -> f32 {
        match self {
            Terrain::Static { height, .. } => *height,
        }
    }

    pub fn display(&self, canvas: &mut dyn SpriteCanvas, view_angle: f32) {
        match self {
            Terrain::Static { sprite, .. } => {
                draw_billboard(canvas, sprite, &Palette::IDENTITY, view_angle)
            }
        }
    }
}

/// Instantiates objects and terrain from the object table on first use.
/// The table is read at most once; a record is dropped once its instance is
/// cached.
pub struct ObjectRegistry {
    source: Rc<dyn ContentSource>,
    table: Option<HashMap<String, ObjectRecord>>,
    objects: HashMap<String, Rc<BattleObject>>,
    terrain: HashMap<String, Rc<Terrain>>,
}

impl ObjectRegistry {
    pub fn new(source: Rc<dyn ContentSource>) -> Self {
        Self {
            source,
            table: None,
            objects: HashMap::new(),
            terrain: HashMap::new(),
        }
    }

    pub fn get_object(&mut self, id: &str) -> Option<Rc<BattleObject>> {
        if let Some(object) = self.objects.get(id) {
            return Some(Rc::clone(object));
        }
        let record = self.take_record(id, BILLBOARD_TYPE)?;
        let object = Rc::new(BattleObject::Billboard {
            id: record.id.clone(),
            sprite: record_sprite(&record)?,
        });
        debug!(id, "object_instantiated");
        self.objects.insert(id.to_string(), Rc::clone(&object));
        Some(object)
    }

    pub fn get_terrain(&mut self, id: &str) -> Option<Rc<Terrain>> {
        if let Some(terrain) = self.terrain.get(id) {
            return Some(Rc::clone(terrain));
        }
        let record = self.take_record(id, TERRAIN_TYPE)?;
        let height = match record.field("height") {
            Some(raw) => match raw.parse::<f32>() {
                Ok(height) if height.is_finite() => height,
                _ => {
                    warn!(id, value = raw, "terrain_height_invalid");
                    return None;
                }
            },
            None => 0.0,
        };
        let terrain = Rc::new(Terrain::Static {
            id: record.id.clone(),
            sprite: record_sprite(&record)?,
            height,
        });
        debug!(id, height, "terrain_instantiated");
        self.terrain.insert(id.to_string(), Rc::clone(&terrain));
        Some(terrain)
    }

    fn table(&mut self) -> &mut HashMap<String, ObjectRecord> {
        let source = &self.source;
        self.table.get_or_insert_with(|| match source.object_table() {
            Ok(table) => {
                debug!(records = table.len(), "object_table_loaded");
                table
            }
            Err(error) => {
                warn!(error = %error, "object_table_load_failed");
                HashMap::new()
            }
        })
    }

    /// Removes the record for `id` if it has `expected_type`. Records of
    /// another known type stay in the table for the matching getter.
    fn take_record(&mut self, id: &str, expected_type: &str) -> Option<ObjectRecord> {
        let table = self.table();
        let object_type = table.get(id)?.object_type.as_str();
        if object_type == expected_type {
            return table.remove(id);
        }
        if object_type == BILLBOARD_TYPE || object_type == TERRAIN_TYPE {
            warn!(id, object_type, expected_type, "object_type_mismatch");
        } else {
            warn!(id, object_type, "object_type_unknown");
        }
        None
    }
}

fn record_sprite(record: &ObjectRecord) -> Option<SpriteRef> {
    let Some(sheet) = record.field("sprite_sheet") else {
        warn!(id = record.id.as_str(), "object_sprite_sheet_missing");
        return None;
    };
    if let Err(error) = validate_asset_key(sheet) {
        warn!(id = record.id.as_str(), sheet, error = %error, "object_sprite_sheet_invalid");
        return None;
    }
    let index = match record.field("sprite") {
        Some(raw) => match raw.parse::<u32>() {
            Ok(index) => index,
            Err(_) => {
                warn!(id = record.id.as_str(), value = raw, "object_sprite_index_invalid");
                return None;
            }
        },
        None => 0,
    };
    Some(SpriteRef::new(sheet, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RecordingCanvas;
    use crate::battle::test_support::{approx_eq, MemorySource};

    fn registry(source: &Rc<MemorySource>) -> ObjectRegistry {
        ObjectRegistry::new(Rc::clone(source) as Rc<dyn ContentSource>)
    }

    #[test]
    fn objects_are_instantiated_once_and_shared() {
        let source = Rc::new(MemorySource::standard());
        let mut registry = registry(&source);
        let first = registry.get_object("oak").expect("oak");
        let second = registry.get_object("oak").expect("oak again");
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.id(), "oak");
        assert_eq!(
            *first,
            BattleObject::Billboard {
                id: "oak".to_string(),
                sprite: SpriteRef::new("objects/trees", 1),
            }
        );
    }

    #[test]
    fn table_is_read_once_across_misses() {
        let source = Rc::new(MemorySource::standard());
        let mut registry = registry(&source);
        assert!(registry.get_object("missing").is_none());
        assert!(registry.get_object("oak").is_some());
        assert!(registry.get_terrain("rock").is_some());
        assert_eq!(source.object_table_loads.get(), 1);
    }

    #[test]
    fn constructed_records_are_dropped_from_the_table() {
        let source = Rc::new(MemorySource::standard());
        let mut registry = registry(&source);
        registry.get_object("oak").expect("oak");
        assert!(registry.table().get("oak").is_none());
        assert!(registry.table().contains_key("rock"));
    }

    #[test]
    fn terrain_reads_height() {
        let source = Rc::new(MemorySource::standard());
        let mut registry = registry(&source);
        let rock = registry.get_terrain("rock").expect("rock");
        assert!(approx_eq(rock.height(), 24.0));
        assert_eq!(rock.id(), "rock");
    }

    #[test]
    fn type_mismatch_keeps_the_record_for_the_right_getter() {
        let source = Rc::new(MemorySource::standard());
        let mut registry = registry(&source);
        assert!(registry.get_object("rock").is_none());
        assert!(registry.get_terrain("rock").is_some());
    }

    #[test]
    fn unknown_types_yield_none() {
        let source = Rc::new(MemorySource::standard());
        let mut registry = registry(&source);
        assert!(registry.get_object("ghost").is_none());
        assert!(registry.get_terrain("ghost").is_none());
    }

    #[test]
    fn failed_table_load_behaves_as_empty() {
        let source = Rc::new(MemorySource::default());
        let mut registry = registry(&source);
        assert!(registry.get_object("oak").is_none());
        assert!(registry.get_terrain("rock").is_none());
        assert_eq!(source.object_table_loads.get(), 1);
    }

    #[test]
    fn billboard_stands_up_and_faces_the_camera() {
        let sprite = SpriteRef::new("objects/trees", 0);
        let mut canvas = RecordingCanvas::new();
        draw_billboard(&mut canvas, &sprite, &Palette::IDENTITY, 0.0);
        let draw = &canvas.draws()[0];
        assert_eq!(canvas.depth(), 0);

        // Bottom edge of the image rests on the tile centre line.
        let bottom_left = draw.local_point(Vec3::new(0.0, GRID_TILE_SIZE, 0.0));
        assert!(approx_eq(bottom_left.z, 0.0));
        assert!(approx_eq(bottom_left.x, 0.0));
        // Top edge is raised.
        let top_left = draw.local_point(Vec3::ZERO);
        assert!(top_left.z > 0.0);

        // Counter-rotation: the sprite plane is parallel to the screen.
        let view = glam::Mat4::from_rotation_x(-TILT);
        let normal = (view * draw.transform).transform_vector3(Vec3::Z);
        assert!(approx_eq(normal.x, 0.0));
        assert!(approx_eq(normal.y, 0.0));
    }
}
