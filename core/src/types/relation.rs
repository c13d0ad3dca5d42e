//! Records linking two resources.

use serde::{Deserialize, Serialize};

use super::{text, Resource};
use crate::id::{self, Id};

/// Subscription status sent when adding a contact to a list.
pub const SUBSCRIBED: u8 = 1;

fn check_ids(pairs: &[(&str, Id)]) -> Result<(), String> {
    for (what, id) in pairs {
        if id.is_zero() {
            return Err(format!("{what} id must be positive"));
        }
    }
    Ok(())
}

/// A tag applied to a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactTag {
    pub id: Id,
    pub contact: Id,
    pub tag: Id,
    #[serde(rename = "cdate", default)]
    pub created: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContactTag {
    pub contact: Id,
    pub tag: Id,
}

impl Resource for ContactTag {
    const KIND: &'static str = "contact tag";
    const PATH: &'static str = "/api/3/contactTags";
    const SINGULAR: &'static str = "contactTag";
    const PLURAL: &'static str = "contactTags";
    const CREATED: &'static [u16] = &[200, 201];

    type Create = NewContactTag;

    fn check_create(payload: &NewContactTag) -> Result<(), String> {
        check_ids(&[("contact", payload.contact), ("tag", payload.tag)])
    }
}

/// A contact's subscription to a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactList {
    pub id: Id,
    pub contact: Id,
    pub list: Id,
    #[serde(default, deserialize_with = "id::loose_count")]
    pub status: u64,
    #[serde(rename = "sdate", default)]
    pub subscribed: Option<String>,
    #[serde(rename = "udate", default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContactList {
    pub list: Id,
    pub contact: Id,
    pub status: u8,
}

impl Resource for ContactList {
    const KIND: &'static str = "contact list";
    const PATH: &'static str = "/api/3/contactLists";
    const SINGULAR: &'static str = "contactList";
    const PLURAL: &'static str = "contactLists";
    const CREATED: &'static [u16] = &[200, 201];

    type Create = NewContactList;

    fn check_create(payload: &NewContactList) -> Result<(), String> {
        check_ids(&[("list", payload.list), ("contact", payload.contact)])
    }
}

/// A subscription decorated with the display name of its list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactListMembership {
    #[serde(flatten)]
    pub subscription: ContactList,
    pub list_name: String,
}

/// A custom field value stored on a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub id: Id,
    pub contact: Id,
    pub field: Id,
    #[serde(default, deserialize_with = "text")]
    pub value: String,
    #[serde(rename = "cdate", default)]
    pub created: Option<String>,
    #[serde(rename = "udate", default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFieldValue {
    pub contact: Id,
    pub field: Id,
    pub value: String,
}

impl Resource for FieldValue {
    const KIND: &'static str = "field value";
    const PATH: &'static str = "/api/3/fieldValues";
    const SINGULAR: &'static str = "fieldValue";
    const PLURAL: &'static str = "fieldValues";
    const CREATED: &'static [u16] = &[200, 201];

    type Create = NewFieldValue;

    fn check_create(payload: &NewFieldValue) -> Result<(), String> {
        check_ids(&[("contact", payload.contact), ("field", payload.field)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_tag_reads_mixed_encodings() {
        let link: ContactTag =
            serde_json::from_str(
                r#"{"id":"31","contact":"9","tag":7,"cdate":"2019-05-01T00:00:00-05:00"}"#,
            )
                .unwrap();
        assert_eq!(link.id, Id::new(31));
        assert_eq!(link.contact, Id::new(9));
        assert_eq!(link.tag, Id::new(7));
    }

    #[test]
    fn zero_ids_fail_local_checks() {
        let bad = NewContactTag {
            contact: Id::new(0),
            tag: Id::new(5),
        };
        assert_eq!(
            ContactTag::check_create(&bad).unwrap_err(),
            "contact id must be positive"
        );
    }

    #[test]
    fn membership_flattens_subscription() {
        let membership = ContactListMembership {
            subscription: ContactList {
                id: Id::new(1),
                contact: Id::new(2),
                list: Id::new(3),
                status: 1,
                subscribed: None,
                updated: None,
            },
            list_name: "Newsletter".into(),
        };
        let value = serde_json::to_value(&membership).unwrap();
        assert_eq!(value["list"], 3);
        assert_eq!(value["list_name"], "Newsletter");
    }
}
