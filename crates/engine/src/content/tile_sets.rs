use std::path::Path;

use roxmltree::{Document, Node};

use crate::asset_keys::validate_asset_key;

use super::error::{error_at_node, parse_document, ContentError, ContentErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteRole {
    Top,
    Side,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSpriteDef {
    pub name: String,
    pub role: SpriteRole,
    /// Cell in the sheet, equal to the position of the `<Sprite>` element.
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSetDef {
    pub sheet: String,
    pub sprites: Vec<TileSpriteDef>,
}

pub fn parse_tile_set(file_path: &Path, raw: &str) -> Result<TileSetDef, ContentError> {
    let doc = parse_document(file_path, raw)?;
    let root = doc.root_element();
    if root.tag_name().name() != "TileSet" {
        return Err(error_at_node(
            ContentErrorCode::InvalidRoot,
            "root element must be <TileSet>".to_string(),
            file_path,
            &doc,
            root,
        ));
    }

    let sheet = required_attribute(file_path, &doc, root, "sheet")?;
    validate_asset_key(&sheet).map_err(|error| {
        error_at_node(
            ContentErrorCode::InvalidValue,
            format!("sheet '{sheet}' is not a valid asset key: {error}"),
            file_path,
            &doc,
            root,
        )
    })?;

    let mut sprites = Vec::new();
    for (index, child) in root.children().filter(|node| node.is_element()).enumerate() {
        if child.tag_name().name() != "Sprite" {
            return Err(error_at_node(
                ContentErrorCode::UnknownElement,
                format!(
                    "unsupported element <{}> in <TileSet>; expected <Sprite>",
                    child.tag_name().name()
                ),
                file_path,
                &doc,
                child,
            ));
        }
        let name = required_attribute(file_path, &doc, child, "name")?;
        let role = match required_attribute(file_path, &doc, child, "role")?.as_str() {
            "top" => SpriteRole::Top,
            "side" => SpriteRole::Side,
            other => {
                return Err(error_at_node(
                    ContentErrorCode::InvalidValue,
                    format!("invalid role '{other}'; allowed values: top, side"),
                    file_path,
                    &doc,
                    child,
                ))
            }
        };
        sprites.push(TileSpriteDef {
            name,
            role,
            index: index as u32,
        });
    }

    Ok(TileSetDef { sheet, sprites })
}

fn required_attribute(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &str,
) -> Result<String, ContentError> {
    let value = node.attribute(name).map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(error_at_node(
            ContentErrorCode::MissingField,
            format!(
                "missing required attribute '{}' on <{}>",
                name,
                node.tag_name().name()
            ),
            file_path,
            doc,
            node,
        ));
    }
    Ok(value.to_string())
}
