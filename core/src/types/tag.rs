use serde::{Deserialize, Serialize};

use super::{require, text, Resource, Updatable};
use crate::id::{self, Id};

/// The two kinds of tag the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Contact,
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Id,
    #[serde(rename = "tag", default, deserialize_with = "text")]
    pub name: String,
    #[serde(rename = "tagType", default, deserialize_with = "text")]
    pub tag_type: String,
    #[serde(default, deserialize_with = "text")]
    pub description: String,
    #[serde(rename = "cdate", default)]
    pub created: Option<String>,
    #[serde(default, deserialize_with = "id::loose_count")]
    pub subscriber_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTag {
    #[serde(rename = "tag")]
    pub name: String,
    pub description: String,
    #[serde(rename = "tagType")]
    pub tag_type: TagType,
}

impl NewTag {
    pub fn new(name: impl Into<String>, description: impl Into<String>, tag_type: TagType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tag_type,
        }
    }
}

impl From<&Tag> for NewTag {
    fn from(tag: &Tag) -> Self {
        let tag_type = match tag.tag_type.as_str() {
            "template" => TagType::Template,
            _ => TagType::Contact,
        };
        Self::new(tag.name.clone(), tag.description.clone(), tag_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUpdate {
    #[serde(rename = "tag", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "tagType", skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<TagType>,
}

impl Resource for Tag {
    const KIND: &'static str = "tag";
    const PATH: &'static str = "/api/3/tags";
    const SINGULAR: &'static str = "tag";
    const PLURAL: &'static str = "tags";
    const SEARCH_FILTER: Option<&'static str> = Some("tag");

    type Create = NewTag;

    fn check_create(payload: &NewTag) -> Result<(), String> {
        require(&payload.name, "name")?;
        require(&payload.description, "description")
    }
}

impl Updatable for Tag {
    type Update = TagUpdate;
}
