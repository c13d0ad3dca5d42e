use serde::{Deserialize, Serialize};

use super::{require, text, Resource, Updatable};
use crate::id::{self, Id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Id,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    // Absent from read responses; only list responses carry the counts.
    #[serde(rename = "contactCount", default, deserialize_with = "id::loose_count")]
    pub contact_count: u64,
    #[serde(rename = "dealCount", default, deserialize_with = "id::loose_count")]
    pub deal_count: u64,
    #[serde(rename = "created_timestamp", default)]
    pub created: Option<String>,
    #[serde(rename = "updated_timestamp", default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
}

impl NewOrganization {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl From<&Organization> for NewOrganization {
    fn from(org: &Organization) -> Self {
        Self::new(org.name.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Resource for Organization {
    const KIND: &'static str = "organization";
    const PATH: &'static str = "/api/3/organizations";
    const SINGULAR: &'static str = "organization";
    const PLURAL: &'static str = "organizations";
    const SEARCH_FILTER: Option<&'static str> = Some("name");

    type Create = NewOrganization;

    fn check_create(payload: &NewOrganization) -> Result<(), String> {
        require(&payload.name, "name")
    }
}

impl Updatable for Organization {
    type Update = OrganizationUpdate;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_default_when_missing() {
        let org: Organization = serde_json::from_str(r#"{"id":"4","name":"Acme"}"#).unwrap();
        assert_eq!(org.id, Id::new(4));
        assert_eq!(org.contact_count, 0);

        let listed: Organization =
            serde_json::from_str(r#"{"id":"4","name":"Acme","contactCount":"3","dealCount":"0"}"#)
                .unwrap();
        assert_eq!(listed.contact_count, 3);
    }
}
