use serde::{Deserialize, Serialize};

use super::{require, text, Resource, Updatable};
use crate::id::{self, Id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Id,
    #[serde(default, deserialize_with = "text")]
    pub email: String,
    #[serde(default, deserialize_with = "text")]
    pub phone: String,
    #[serde(rename = "firstName", default, deserialize_with = "text")]
    pub first_name: String,
    #[serde(rename = "lastName", default, deserialize_with = "text")]
    pub last_name: String,
    #[serde(rename = "orgid", default, deserialize_with = "id::optional")]
    pub organization_id: Option<Id>,
    #[serde(rename = "cdate", default)]
    pub created: Option<String>,
    #[serde(rename = "udate", default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub email: String,
    #[serde(rename = "firstName", skip_serializing_if = "String::is_empty", default)]
    pub first_name: String,
    #[serde(rename = "lastName", skip_serializing_if = "String::is_empty", default)]
    pub last_name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub phone: String,
    #[serde(rename = "orgid", skip_serializing_if = "Option::is_none", default)]
    pub organization_id: Option<Id>,
}

impl NewContact {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }
}

impl From<&Contact> for NewContact {
    fn from(contact: &Contact) -> Self {
        Self {
            email: contact.email.clone(),
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            phone: contact.phone.clone(),
            organization_id: contact.organization_id.filter(|id| !id.is_zero()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "orgid", skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Id>,
}

impl Resource for Contact {
    const KIND: &'static str = "contact";
    const PATH: &'static str = "/api/3/contacts";
    const SINGULAR: &'static str = "contact";
    const PLURAL: &'static str = "contacts";
    const SEARCH_FILTER: Option<&'static str> = Some("email");

    type Create = NewContact;

    fn check_create(payload: &NewContact) -> Result<(), String> {
        require(&payload.email, "email")
    }
}

impl Updatable for Contact {
    type Update = ContactUpdate;
}
