use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::content::{MapRecord, TilePlacement};

use super::objects::{BattleObject, ObjectRegistry, Terrain};
use super::tile_catalog::{TileCatalog, TileSet, TileType};

/// Largest width or height a map record may grow the grid to.
pub const MAX_GRID_EXTENT: i32 = 1024;

/// One grid cell. A tile without a kind is a hole: addressable, but never
/// drawn and never a wall neighbour.
#[derive(Debug, Clone, Default)]
pub struct Tile {
    pub kind: Option<Rc<TileType>>,
    pub height: u32,
    pub occupant: Option<Rc<BattleObject>>,
    pub terrain: Option<Rc<Terrain>>,
}

impl Tile {
    pub fn terrain_height(&self) -> f32 {
        self.terrain.as_ref().map_or(0.0, |terrain| terrain.height())
    }
}

/// Dense row-major tile storage. `revision` changes on every mutation.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    revision: u64,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::default(); width as usize * height as usize],
            revision: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.index(x, y).map(|index| &self.tiles[index])
    }

    fn tile_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        let index = self.index(x, y)?;
        Some(&mut self.tiles[index])
    }

    /// Reallocates to at least `width × height`, keeping every tile at its
    /// coordinate. Never shrinks.
    pub fn grow_to(&mut self, width: u32, height: u32) {
        let width = width.max(self.width);
        let height = height.max(self.height);
        if width == self.width && height == self.height {
            return;
        }
        let mut tiles = vec![Tile::default(); width as usize * height as usize];
        for (index, tile) in self.tiles.drain(..).enumerate() {
            let x = index % self.width as usize;
            let y = index / self.width as usize;
            tiles[y * width as usize + x] = tile;
        }
        debug!(
            from_width = self.width,
            from_height = self.height,
            width,
            height,
            "grid_grown"
        );
        self.width = width;
        self.height = height;
        self.tiles = tiles;
        self.revision += 1;
    }

    /// Stamps a rectangle with `kind` and `height`, growing the grid as
    /// needed. Returns false for a negative origin, an empty extent or a
    /// rectangle reaching past `MAX_GRID_EXTENT`.
    pub fn stamp_rect(
        &mut self,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
        kind: Rc<TileType>,
        height: u32,
    ) -> bool {
        if x < 0 || y < 0 || dx <= 0 || dy <= 0 {
            return false;
        }
        let (Some(right), Some(bottom)) = (x.checked_add(dx), y.checked_add(dy)) else {
            return false;
        };
        if right > MAX_GRID_EXTENT || bottom > MAX_GRID_EXTENT {
            return false;
        }
        self.grow_to(right as u32, bottom as u32);
        for ty in y..bottom {
            for tx in x..right {
                if let Some(tile) = self.tile_mut(tx, ty) {
                    tile.kind = Some(Rc::clone(&kind));
                    tile.height = height;
                }
            }
        }
        self.revision += 1;
        true
    }

    /// Returns false when the coordinate is outside the grid. Setting the
    /// value already present leaves the revision unchanged.
    pub fn set_occupant(&mut self, x: i32, y: i32, occupant: Option<Rc<BattleObject>>) -> bool {
        let Some(tile) = self.tile_mut(x, y) else {
            return false;
        };
        if !same_rc(&tile.occupant, &occupant) {
            tile.occupant = occupant;
            self.revision += 1;
        }
        true
    }

    pub fn set_terrain(&mut self, x: i32, y: i32, terrain: Option<Rc<Terrain>>) -> bool {
        let Some(tile) = self.tile_mut(x, y) else {
            return false;
        };
        if !same_rc(&tile.terrain, &terrain) {
            tile.terrain = terrain;
            self.revision += 1;
        }
        true
    }

    /// Builds a grid by applying records strictly in order. Records that
    /// cannot be applied are skipped.
    pub fn from_records(
        records: &[MapRecord],
        catalog: &mut TileCatalog,
        registry: &mut ObjectRegistry,
    ) -> Self {
        let mut grid = Grid::default();
        let mut active_set: Option<Rc<TileSet>> = None;
        let mut skipped = 0_usize;

        for record in records {
            let applied = match record {
                MapRecord::TileSet { tile_set_id } => {
                    active_set = catalog.get(tile_set_id);
                    active_set.is_some()
                }
                MapRecord::Tiles(placement) => {
                    grid.apply_placement(placement, active_set.as_deref())
                }
                MapRecord::Object { x, y, object_id } => match registry.get_object(object_id) {
                    Some(object) => grid.set_occupant(*x, *y, Some(object)),
                    None => false,
                },
                MapRecord::Terrain { x, y, terrain_id } => {
                    match registry.get_terrain(terrain_id) {
                        Some(terrain) => grid.set_terrain(*x, *y, Some(terrain)),
                        None => false,
                    }
                }
            };
            if !applied {
                skipped += 1;
                debug!(record = ?record, "map_record_not_applied");
            }
        }

        info!(
            width = grid.width,
            height = grid.height,
            records = records.len(),
            skipped,
            "grid_built"
        );
        grid
    }

    fn apply_placement(&mut self, placement: &TilePlacement, active_set: Option<&TileSet>) -> bool {
        let Some(kind) = active_set.and_then(|set| set.get(&placement.tile_type)) else {
            warn!(
                tile_type = placement.tile_type.as_str(),
                has_tile_set = active_set.is_some(),
                "tile_record_skipped"
            );
            return false;
        };
        let stamped = self.stamp_rect(
            placement.x,
            placement.y,
            placement.dx,
            placement.dy,
            kind,
            placement.height,
        );
        if !stamped {
            warn!(
                x = placement.x,
                y = placement.y,
                dx = placement.dx,
                dy = placement.dy,
                "tile_record_skipped"
            );
        }
        stamped
    }
}

fn same_rc<T>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SpriteRef;
    use crate::battle::test_support::MemorySource;
    use crate::content::{parse_map_records, ContentSource};
    use std::path::Path;

    fn kind(name: &str) -> Rc<TileType> {
        Rc::new(TileType {
            name: name.to_string(),
            top: SpriteRef::new("tiles", 0),
            side: SpriteRef::new("tiles", 1),
        })
    }

    fn build(raw: &str) -> (Grid, Rc<MemorySource>) {
        let source = Rc::new(MemorySource::standard());
        let shared = Rc::clone(&source) as Rc<dyn ContentSource>;
        let mut catalog = TileCatalog::new(Rc::clone(&shared));
        let mut registry = ObjectRegistry::new(shared);
        let records = parse_map_records(Path::new("test.map"), raw);
        (
            Grid::from_records(&records, &mut catalog, &mut registry),
            source,
        )
    }

    fn assert_storage_invariant(grid: &Grid) {
        assert_eq!(
            grid.tiles.len(),
            grid.width() as usize * grid.height() as usize
        );
    }

    #[test]
    fn out_of_range_access_returns_none() {
        let grid = Grid::new(2, 3);
        assert!(grid.get_tile(0, 0).is_some());
        assert!(grid.get_tile(1, 2).is_some());
        for (x, y) in [(-1, 0), (0, -1), (2, 0), (0, 3), (i32::MAX, i32::MAX)] {
            assert!(grid.get_tile(x, y).is_none(), "({x}, {y})");
        }
    }

    #[test]
    fn growth_preserves_existing_tiles_by_coordinate() {
        let mut grid = Grid::new(2, 2);
        grid.stamp_rect(1, 1, 1, 1, kind("grass"), 5);
        grid.grow_to(4, 3);

        assert_eq!((grid.width(), grid.height()), (4, 3));
        assert_storage_invariant(&grid);
        let kept = grid.get_tile(1, 1).expect("kept");
        assert_eq!(kept.height, 5);
        assert!(kept.kind.is_some());
        let fresh = grid.get_tile(3, 2).expect("fresh");
        assert!(fresh.kind.is_none());
        assert_eq!(fresh.height, 0);
        assert!(grid.get_tile(0, 1).expect("old empty").kind.is_none());
    }

    #[test]
    fn growth_never_shrinks() {
        let mut grid = Grid::new(4, 4);
        let revision = grid.revision();
        grid.grow_to(2, 8);
        assert_eq!((grid.width(), grid.height()), (4, 8));
        assert!(grid.revision() > revision);
        let revision = grid.revision();
        grid.grow_to(1, 1);
        assert_eq!(grid.revision(), revision);
    }

    #[test]
    fn stamp_rejects_negative_origin_and_empty_extent() {
        let mut grid = Grid::default();
        assert!(!grid.stamp_rect(-1, 0, 2, 2, kind("grass"), 1));
        assert!(!grid.stamp_rect(0, 0, 0, 2, kind("grass"), 1));
        assert!(!grid.stamp_rect(0, 0, 2, -1, kind("grass"), 1));
        assert!(!grid.stamp_rect(MAX_GRID_EXTENT, 0, 1, 1, kind("grass"), 1));
        assert!(grid.is_empty());
    }

    #[test]
    fn records_apply_in_order_with_later_tiles_overwriting() {
        let (grid, _) = build(
            "tileset id=grassland\n\
             tiles x=0 y=0 dx=3 dy=1 height=1 type=grass\n\
             tiles x=1 y=0 dx=1 dy=1 height=4 type=stone\n",
        );
        assert_eq!((grid.width(), grid.height()), (3, 1));
        let middle = grid.get_tile(1, 0).expect("middle");
        assert_eq!(middle.height, 4);
        assert_eq!(middle.kind.as_ref().map(|k| k.name.as_str()), Some("stone"));
        assert_eq!(grid.get_tile(2, 0).expect("right").height, 1);
    }

    #[test]
    fn unresolved_tile_types_are_skipped() {
        let (grid, _) = build(
            "tiles x=0 y=0 dx=1 dy=1 height=1 type=grass\n\
             tileset id=grassland\n\
             tiles x=0 y=0 dx=2 dy=2 height=1 type=lava\n\
             tileset id=desert\n\
             tiles x=0 y=0 dx=5 dy=5 height=1 type=grass\n",
        );
        assert!(grid.is_empty());
    }

    #[test]
    fn objects_and_terrain_attach_only_to_existing_tiles() {
        let (grid, source) = build(
            "tileset id=grassland\n\
             tiles x=0 y=0 dx=2 dy=2 height=1 type=grass\n\
             object x=1 y=1 id=oak\n\
             object x=5 y=5 id=oak\n\
             terrain x=0 y=1 id=rock\n\
             object x=0 y=0 id=unknown\n",
        );
        assert_eq!((grid.width(), grid.height()), (2, 2));
        let occupant = grid
            .get_tile(1, 1)
            .and_then(|tile| tile.occupant.as_ref())
            .expect("occupant");
        assert_eq!(occupant.id(), "oak");
        assert!(grid.get_tile(0, 0).expect("tile").occupant.is_none());
        assert!((grid.get_tile(0, 1).expect("tile").terrain_height() - 24.0).abs() < 1e-6);
        assert_eq!(source.object_table_loads.get(), 1);
    }

    #[test]
    fn every_mutation_bumps_the_revision() {
        let mut grid = Grid::new(1, 1);
        let start = grid.revision();
        let rock = Rc::new(Terrain::Static {
            id: "rock".to_string(),
            sprite: SpriteRef::new("objects/rocks", 0),
            height: 24.0,
        });
        assert!(grid.set_terrain(0, 0, Some(rock)));
        assert!(grid.revision() > start);
        let after = grid.revision();
        assert!(!grid.set_terrain(3, 3, None));
        assert_eq!(grid.revision(), after);
    }

    #[test]
    fn reads_and_unchanged_writes_keep_the_revision() {
        let mut grid = Grid::default();
        grid.stamp_rect(0, 0, 2, 2, kind("grass"), 1);
        let stamped = grid.revision();
        assert!(grid.get_tile(1, 1).is_some());
        assert!(grid.set_occupant(1, 1, None));
        assert!(grid.set_terrain(0, 0, None));
        assert_eq!(grid.revision(), stamped);

        let tree = Rc::new(BattleObject::Billboard {
            id: "oak".to_string(),
            sprite: SpriteRef::new("objects/trees", 0),
        });
        assert!(grid.set_occupant(1, 1, Some(Rc::clone(&tree))));
        let occupied = grid.revision();
        assert!(occupied > stamped);
        assert!(grid.set_occupant(1, 1, Some(tree)));
        assert_eq!(grid.revision(), occupied);
    }
}
