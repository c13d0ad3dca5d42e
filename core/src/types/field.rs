use serde::{Deserialize, Serialize};

use super::{flag, require, text, Resource, Updatable};
use crate::id::{self, Id};

/// A custom contact field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: Id,
    #[serde(default, deserialize_with = "text")]
    pub title: String,
    #[serde(rename = "descript", default, deserialize_with = "text")]
    pub description: String,
    #[serde(rename = "type", default, deserialize_with = "text")]
    pub field_type: String,
    #[serde(rename = "isrequired", default, deserialize_with = "flag")]
    pub is_required: bool,
    #[serde(rename = "perstag", default, deserialize_with = "text")]
    pub personalization_tag: String,
    #[serde(rename = "defval", default, deserialize_with = "text")]
    pub default_value: String,
    #[serde(rename = "visible", default, deserialize_with = "flag")]
    pub is_visible: bool,
    #[serde(rename = "ordernum", default, deserialize_with = "id::loose_count")]
    pub order: u64,
    #[serde(rename = "cdate", default)]
    pub created: Option<String>,
    #[serde(rename = "udate", default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewField {
    pub title: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(rename = "descript", skip_serializing_if = "String::is_empty", default)]
    pub description: String,
    #[serde(rename = "perstag", skip_serializing_if = "String::is_empty", default)]
    pub personalization_tag: String,
    #[serde(rename = "defval", skip_serializing_if = "String::is_empty", default)]
    pub default_value: String,
}

impl NewField {
    pub fn new(title: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            field_type: field_type.into(),
            ..Self::default()
        }
    }
}

impl From<&Field> for NewField {
    fn from(field: &Field) -> Self {
        Self {
            title: field.title.clone(),
            field_type: field.field_type.clone(),
            description: field.description.clone(),
            personalization_tag: field.personalization_tag.clone(),
            default_value: field.default_value.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "descript", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "defval", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Resource for Field {
    const KIND: &'static str = "field";
    const PATH: &'static str = "/api/3/fields";
    const SINGULAR: &'static str = "field";
    const PLURAL: &'static str = "fields";

    type Create = NewField;

    fn check_create(payload: &NewField) -> Result<(), String> {
        require(&payload.title, "title")?;
        require(&payload.field_type, "type")
    }
}

impl Updatable for Field {
    type Update = FieldUpdate;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_string_flags_and_order() {
        let field: Field = serde_json::from_str(
            r#"{"id":"2","title":"Plan","descript":"","type":"dropdown","isrequired":"1","perstag":"PLAN","defval":"","visible":"0","ordernum":"3","options":[],"relations":["4"]}"#,
        )
        .unwrap();
        assert_eq!(field.id, Id::new(2));
        assert!(field.is_required);
        assert!(!field.is_visible);
        assert_eq!(field.order, 3);
    }
}
