use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::warn;

use super::error::{error_at_node, parse_document, ContentError, ContentErrorCode};

/// Raw `<Object>` entry. Field values are kept as text; the registry decides
/// which fields a given `object_type` needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub id: String,
    pub object_type: String,
    pub fields: BTreeMap<String, String>,
}

impl ObjectRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

pub fn parse_object_table(
    file_path: &Path,
    raw: &str,
) -> Result<HashMap<String, ObjectRecord>, ContentError> {
    let doc = parse_document(file_path, raw)?;
    let root = doc.root_element();
    if root.tag_name().name() != "Objects" {
        return Err(error_at_node(
            ContentErrorCode::InvalidRoot,
            "root element must be <Objects>".to_string(),
            file_path,
            &doc,
            root,
        ));
    }

    let mut records = HashMap::new();
    for node in root.children().filter(|node| node.is_element()) {
        if node.tag_name().name() != "Object" {
            return Err(error_at_node(
                ContentErrorCode::UnknownElement,
                format!(
                    "unsupported element <{}> in <Objects>; expected <Object>",
                    node.tag_name().name()
                ),
                file_path,
                &doc,
                node,
            ));
        }
        let id = node.attribute("id").map(str::trim).unwrap_or_default();
        if id.is_empty() {
            return Err(error_at_node(
                ContentErrorCode::MissingField,
                "missing required attribute 'id' on <Object>".to_string(),
                file_path,
                &doc,
                node,
            ));
        }

        let mut fields = BTreeMap::new();
        for field in node.children().filter(|child| child.is_element()) {
            let value = field.text().map(str::trim).unwrap_or_default();
            fields.insert(field.tag_name().name().to_string(), value.to_string());
        }
        let Some(object_type) = fields.remove("type").filter(|value| !value.is_empty()) else {
            return Err(error_at_node(
                ContentErrorCode::MissingField,
                format!("object '{id}' is missing required field <type>"),
                file_path,
                &doc,
                node,
            ));
        };

        let record = ObjectRecord {
            id: id.to_string(),
            object_type,
            fields,
        };
        if records.insert(record.id.clone(), record).is_some() {
            warn!(file = %file_path.display(), id, "object_record_duplicate");
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<HashMap<String, ObjectRecord>, ContentError> {
        parse_object_table(Path::new("objects.xml"), raw)
    }

    #[test]
    fn collects_type_and_fields() {
        let table = parse(
            r#"<Objects>
                 <Object id="oak">
                   <type>billboard</type>
                   <sprite_sheet>objects/trees</sprite_sheet>
                   <sprite> 2 </sprite>
                 </Object>
               </Objects>"#,
        )
        .expect("parse");
        let oak = table.get("oak").expect("oak");
        assert_eq!(oak.object_type, "billboard");
        assert_eq!(oak.field("sprite_sheet"), Some("objects/trees"));
        assert_eq!(oak.field("sprite"), Some("2"));
        assert_eq!(oak.field("type"), None);
    }

    #[test]
    fn duplicate_ids_keep_the_last_entry() {
        let table = parse(
            r#"<Objects>
                 <Object id="a"><type>billboard</type><sprite>1</sprite></Object>
                 <Object id="a"><type>billboard</type><sprite>5</sprite></Object>
               </Objects>"#,
        )
        .expect("parse");
        assert_eq!(table.len(), 1);
        assert_eq!(table["a"].field("sprite"), Some("5"));
    }

    #[test]
    fn missing_type_is_rejected() {
        let error = parse(r#"<Objects><Object id="a"><sprite>1</sprite></Object></Objects>"#)
            .expect_err("must fail");
        assert_eq!(error.code, ContentErrorCode::MissingField);
        assert!(error.message.contains("'a'"));
    }

    #[test]
    fn unknown_child_is_rejected() {
        let error = parse("<Objects><Thing/></Objects>").expect_err("must fail");
        assert_eq!(error.code, ContentErrorCode::UnknownElement);
    }
}
