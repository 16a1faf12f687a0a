use std::path::Path;
use std::str::FromStr;

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePlacement {
    pub x: i32,
    pub y: i32,
    pub dx: i32,
    pub dy: i32,
    pub height: u32,
    pub tile_type: String,
}

/// One line of a map file. Records are applied in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapRecord {
    TileSet { tile_set_id: String },
    Tiles(TilePlacement),
    Object { x: i32, y: i32, object_id: String },
    Terrain { x: i32, y: i32, terrain_id: String },
}

/// Parses a map file. Lines that cannot be parsed are skipped with a warning.
pub fn parse_map_records(file_path: &Path, raw: &str) -> Vec<MapRecord> {
    let mut records = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(record) => records.push(record),
            Err(reason) => warn!(
                file = %file_path.display(),
                line = index + 1,
                reason = %reason,
                "map_record_skipped"
            ),
        }
    }
    records
}

fn parse_line(line: &str) -> Result<MapRecord, String> {
    let mut tokens = line.split_whitespace();
    let keyword = tokens.next().unwrap_or_default();
    let fields = Fields::parse(tokens)?;
    match keyword {
        "tileset" => Ok(MapRecord::TileSet {
            tile_set_id: fields.text("id")?,
        }),
        "tiles" => Ok(MapRecord::Tiles(TilePlacement {
            x: fields.number("x")?,
            y: fields.number("y")?,
            dx: fields.number("dx")?,
            dy: fields.number("dy")?,
            height: fields.number("height")?,
            tile_type: fields.text("type")?,
        })),
        "object" => Ok(MapRecord::Object {
            x: fields.number("x")?,
            y: fields.number("y")?,
            object_id: fields.text("id")?,
        }),
        "terrain" => Ok(MapRecord::Terrain {
            x: fields.number("x")?,
            y: fields.number("y")?,
            terrain_id: fields.text("id")?,
        }),
        other => Err(format!("unknown record kind '{other}'")),
    }
}

struct Fields<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Fields<'a> {
    fn parse(tokens: impl Iterator<Item = &'a str>) -> Result<Self, String> {
        let mut pairs = Vec::new();
        for token in tokens {
            let Some((key, value)) = token.split_once('=') else {
                return Err(format!("expected key=value, found '{token}'"));
            };
            if pairs.iter().any(|(existing, _)| *existing == key) {
                return Err(format!("duplicate field '{key}'"));
            }
            pairs.push((key, value));
        }
        Ok(Self { pairs })
    }

    fn raw(&self, key: &str) -> Result<&'a str, String> {
        self.pairs
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| *value)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| format!("missing field '{key}'"))
    }

    fn text(&self, key: &str) -> Result<String, String> {
        self.raw(key).map(str::to_string)
    }

    fn number<T: FromStr>(&self, key: &str) -> Result<T, String> {
        let value = self.raw(key)?;
        value
            .parse::<T>()
            .map_err(|_| format!("field '{key}' has invalid value '{value}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Vec<MapRecord> {
        parse_map_records(Path::new("test.map"), raw)
    }

    #[test]
    fn parses_every_record_kind_in_order() {
        let records = parse(
            "# debug arena\n\
             tileset id=grassland\n\
             tiles x=0 y=0 dx=2 dy=3 height=1 type=grass\n\
             object x=1 y=1 id=oak\n\
             terrain x=0 y=2 id=rock # trailing comment\n",
        );
        assert_eq!(
            records,
            vec![
                MapRecord::TileSet {
                    tile_set_id: "grassland".to_string()
                },
                MapRecord::Tiles(TilePlacement {
                    x: 0,
                    y: 0,
                    dx: 2,
                    dy: 3,
                    height: 1,
                    tile_type: "grass".to_string(),
                }),
                MapRecord::Object {
                    x: 1,
                    y: 1,
                    object_id: "oak".to_string()
                },
                MapRecord::Terrain {
                    x: 0,
                    y: 2,
                    terrain_id: "rock".to_string()
                },
            ]
        );
    }

    #[test]
    fn field_order_does_not_matter() {
        let records = parse("object id=oak y=4 x=3");
        assert_eq!(
            records,
            vec![MapRecord::Object {
                x: 3,
                y: 4,
                object_id: "oak".to_string()
            }]
        );
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let records = parse(
            "bogus x=1\n\
             tiles x=0 y=0 dx=1 dy=1 type=grass\n\
             tiles x=0 y=0 dx=1 dy=1 height=-2 type=grass\n\
             object x=1 y\n\
             object x=1 x=2 y=0 id=a\n\
             tileset id=ok\n",
        );
        assert_eq!(
            records,
            vec![MapRecord::TileSet {
                tile_set_id: "ok".to_string()
            }]
        );
    }

    #[test]
    fn negative_coordinates_are_parsed_for_the_grid_to_reject() {
        let records = parse("tiles x=-1 y=0 dx=0 dy=1 height=0 type=grass");
        assert!(matches!(
            records.as_slice(),
            [MapRecord::Tiles(TilePlacement { x: -1, dx: 0, .. })]
        ));
    }
}
