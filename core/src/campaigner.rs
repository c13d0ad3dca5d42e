//! Executing client: `ApiClient` plus a `Transport`.
//!
//! Every resource operation issues exactly one request. Relationship
//! operations first read each referenced resource, one after the other, and
//! only then write; the service itself would happily link a contact to a tag
//! that does not exist.

use tracing::debug;

use crate::client::ApiClient;
use crate::config::{Config, ConfigError};
use crate::endpoint::Pagination;
use crate::error::{ApiError, ErrorKind, Operation};
use crate::http::{HttpRequest, HttpResponse};
use crate::id::Id;
use crate::transport::Transport;
use crate::types::{
    Contact, ContactList, ContactListMembership, ContactTag, Field, FieldValue, List,
    NewContactList, NewContactTag, NewFieldValue, Page, Resource, Tag, Updatable, SUBSCRIBED,
};

#[derive(Debug, Clone)]
pub struct Campaigner<T> {
    api: ApiClient,
    transport: T,
}

impl<T: Transport> Campaigner<T> {
    pub fn new(config: &Config, transport: T) -> Result<Self, ConfigError> {
        Ok(Self {
            api: ApiClient::new(config)?,
            transport,
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn send(&self, operation: &Operation, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(%operation, method = request.method.as_str(), url = %request.url, "sending request");
        self.transport
            .execute(&request)
            .map_err(|source| ApiError::Transport {
                operation: operation.to_string(),
                source,
            })
    }

    // -----------------------------------------------------------------------
    // Uniform resource operations
    // -----------------------------------------------------------------------

    pub fn list<R: Resource>(&self, page: Pagination) -> Result<Page<R>, ApiError> {
        let request = self.api.build_list::<R>(page);
        let response = self.send(&Operation::new(R::KIND, "list"), request)?;
        self.api.parse_list(response)
    }

    pub fn find<R: Resource>(&self, term: &str) -> Result<Page<R>, ApiError> {
        let request = self.api.build_find::<R>(term)?;
        let response = self.send(&Operation::new(R::KIND, "find"), request)?;
        self.api.parse_find(response)
    }

    pub fn read<R: Resource>(&self, id: Id) -> Result<R, ApiError> {
        let request = self.api.build_read::<R>(id);
        let response = self.send(&Operation::on(R::KIND, "read", id), request)?;
        self.api.parse_read(id, response)
    }

    pub fn create<R: Resource>(&self, payload: &R::Create) -> Result<R, ApiError> {
        let request = self.api.build_create::<R>(payload)?;
        let response = self.send(&Operation::new(R::KIND, "create"), request)?;
        self.api.parse_create(response)
    }

    pub fn update<R: Updatable>(&self, id: Id, payload: &R::Update) -> Result<R, ApiError> {
        let request = self.api.build_update::<R>(id, payload)?;
        let response = self.send(&Operation::on(R::KIND, "update", id), request)?;
        self.api.parse_update(id, response)
    }

    pub fn delete<R: Resource>(&self, id: Id) -> Result<(), ApiError> {
        let request = self.api.build_delete::<R>(id);
        let response = self.send(&Operation::on(R::KIND, "delete", id), request)?;
        self.api.parse_delete::<R>(id, response)
    }

    // -----------------------------------------------------------------------
    // Relationships
    // -----------------------------------------------------------------------

    /// Read a resource a relationship depends on. A 404 becomes
    /// `RelatedNotFound`; every other failure passes through unchanged.
    fn require<R: Resource>(&self, operation: &Operation, id: Id) -> Result<R, ApiError> {
        self.read::<R>(id).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ApiError::RelatedNotFound {
                operation: operation.to_string(),
                message: format!("could not find {} {id}", R::KIND),
                source: Box::new(err),
            },
            _ => err,
        })
    }

    fn ensure_positive(operation: &Operation, pairs: &[(&str, Id)]) -> Result<(), ApiError> {
        match pairs.iter().find(|(_, id)| id.is_zero()) {
            Some((what, _)) => Err(ApiError::invalid_argument(
                operation,
                format!("{what} id must be positive"),
            )),
            None => Ok(()),
        }
    }

    /// Tag a contact. Succeeds whether the link is new (201) or already
    /// existed (200).
    pub fn contact_tag_create(&self, contact_id: Id, tag_id: Id) -> Result<ContactTag, ApiError> {
        let operation = Operation::new(ContactTag::KIND, "create");
        Self::ensure_positive(&operation, &[("contact", contact_id), ("tag", tag_id)])?;
        self.require::<Contact>(&operation, contact_id)?;
        self.require::<Tag>(&operation, tag_id)?;

        self.create::<ContactTag>(&NewContactTag {
            contact: contact_id,
            tag: tag_id,
        })
    }

    /// Tags currently applied to a contact.
    pub fn contact_tags(&self, contact_id: Id) -> Result<Vec<ContactTag>, ApiError> {
        let request = self.api.build_contact_tags(contact_id);
        let response = self.send(&Operation::on("contact", "tag listing", contact_id), request)?;
        self.api.parse_contact_tags(contact_id, response)
    }

    /// Remove a tag from a contact, returning the link that was deleted.
    pub fn contact_tag_delete(&self, contact_id: Id, tag_id: Id) -> Result<ContactTag, ApiError> {
        let operation = Operation::new(ContactTag::KIND, "delete");
        Self::ensure_positive(&operation, &[("contact", contact_id), ("tag", tag_id)])?;
        self.require::<Contact>(&operation, contact_id)?;
        self.require::<Tag>(&operation, tag_id)?;

        let link = self
            .contact_tags(contact_id)?
            .into_iter()
            .find(|link| link.tag == tag_id)
            .ok_or_else(|| ApiError::NotFound {
                operation: operation.to_string(),
                message: format!(
                    "{operation} failed, contact {contact_id} is not tagged with {tag_id}"
                ),
            })?;

        self.delete::<ContactTag>(link.id)?;
        Ok(link)
    }

    /// Subscribe a contact to a list. The result carries the list's name.
    pub fn contact_list_add(
        &self,
        list_id: Id,
        contact_id: Id,
    ) -> Result<ContactListMembership, ApiError> {
        let operation = Operation::new(ContactList::KIND, "create");
        Self::ensure_positive(&operation, &[("list", list_id), ("contact", contact_id)])?;
        self.require::<Contact>(&operation, contact_id)?;
        let list = self.require::<List>(&operation, list_id)?;

        let subscription = self.create::<ContactList>(&NewContactList {
            list: list_id,
            contact: contact_id,
            status: SUBSCRIBED,
        })?;

        Ok(ContactListMembership {
            subscription,
            list_name: list.name,
        })
    }

    /// Set a custom field value on a contact.
    pub fn contact_field_update(
        &self,
        contact_id: Id,
        field_id: Id,
        value: &str,
    ) -> Result<FieldValue, ApiError> {
        let operation = Operation::new(FieldValue::KIND, "update");
        Self::ensure_positive(&operation, &[("contact", contact_id), ("field", field_id)])?;
        self.require::<Contact>(&operation, contact_id)?;
        self.require::<Field>(&operation, field_id)?;

        self.create::<FieldValue>(&NewFieldValue {
            contact: contact_id,
            field: field_id,
            value: value.to_string(),
        })
    }
}
