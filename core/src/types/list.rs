use serde::{Deserialize, Serialize};

use super::{require, text, Resource, Updatable};
use crate::id::{self, Id};

/// A mailing list contacts can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: Id,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(rename = "stringid", default, deserialize_with = "text")]
    pub string_id: String,
    #[serde(default, deserialize_with = "text")]
    pub sender_url: String,
    #[serde(default, deserialize_with = "text")]
    pub sender_reminder: String,
    #[serde(rename = "userid", default, deserialize_with = "id::optional")]
    pub user_id: Option<Id>,
    #[serde(rename = "cdate", default)]
    pub created: Option<String>,
    #[serde(rename = "udate", default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewList {
    pub name: String,
    #[serde(rename = "stringid")]
    pub string_id: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub sender_url: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub sender_reminder: String,
}

impl NewList {
    pub fn new(name: impl Into<String>, string_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            string_id: string_id.into(),
            ..Self::default()
        }
    }
}

impl From<&List> for NewList {
    fn from(list: &List) -> Self {
        Self {
            name: list.name.clone(),
            string_id: list.string_id.clone(),
            sender_url: list.sender_url.clone(),
            sender_reminder: list.sender_reminder.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_reminder: Option<String>,
}

impl Resource for List {
    const KIND: &'static str = "list";
    const PATH: &'static str = "/api/3/lists";
    const SINGULAR: &'static str = "list";
    const PLURAL: &'static str = "lists";
    const SEARCH_FILTER: Option<&'static str> = Some("name");

    type Create = NewList;

    fn check_create(payload: &NewList) -> Result<(), String> {
        require(&payload.name, "name")
    }
}

impl Updatable for List {
    type Update = ListUpdate;
}
