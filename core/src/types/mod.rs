//! Records mirrored from the remote catalog.
//!
//! # Design
//! Every kind implements `Resource`, which names its collection path and the
//! JSON keys the service wraps single records (`"tag"`) and collections
//! (`"tags"`) in. `ApiClient` is generic over `Resource`, so list, find,
//! read, create and delete are written once. Create and update payloads are
//! separate types carrying only the fields the service accepts; a record
//! read from the service cannot be echoed back as-is.
//!
//! String fields tolerate `null`, and counts tolerate quoted numbers, since
//! the service emits both.

mod contact;
mod field;
mod list;
mod organization;
mod relation;
mod tag;

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

pub use contact::{Contact, ContactUpdate, NewContact};
pub use field::{Field, FieldUpdate, NewField};
pub use list::{List, ListUpdate, NewList};
pub use organization::{NewOrganization, Organization, OrganizationUpdate};
pub use relation::{
    ContactList, ContactListMembership, ContactTag, FieldValue, NewContactList, NewContactTag,
    NewFieldValue, SUBSCRIBED,
};
pub use tag::{NewTag, Tag, TagType, TagUpdate};

/// A kind of record the service exposes as a REST collection.
pub trait Resource: DeserializeOwned + Debug {
    /// Human-readable kind, used in error messages.
    const KIND: &'static str;
    /// Collection path, e.g. `/api/3/tags`.
    const PATH: &'static str;
    /// Key wrapping a single record.
    const SINGULAR: &'static str;
    /// Key wrapping a collection.
    const PLURAL: &'static str;
    /// Field accepted by `filters[...]` for find calls.
    const SEARCH_FILTER: Option<&'static str> = None;
    /// Statuses that mean a create succeeded. Relationship endpoints answer
    /// 200 when the link already existed.
    const CREATED: &'static [u16] = &[201];

    type Create: Serialize;

    /// Local checks run before a create request is built.
    fn check_create(_payload: &Self::Create) -> Result<(), String> {
        Ok(())
    }
}

/// A resource that accepts partial updates.
pub trait Updatable: Resource {
    type Update: Serialize;
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total reported by the service (`meta.total`), which may exceed the
    /// page length.
    pub total: u64,
}

pub(crate) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `"1"`, `1` and `true` are all truthy; `null` is false.
pub(crate) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Bool(bool),
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Loose>::deserialize(deserializer)? {
        None => false,
        Some(Loose::Bool(b)) => b,
        Some(Loose::Number(n)) => n != 0,
        Some(Loose::Text(s)) => !matches!(s.trim(), "" | "0" | "false"),
    })
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub(crate) fn require(value: &str, what: &str) -> Result<(), String> {
    if is_blank(value) {
        Err(format!("{what} is empty"))
    } else {
        Ok(())
    }
}
