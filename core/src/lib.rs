//! Client core for a remote CRM REST API.
//!
//! # Overview
//! Manages contacts, tags, organizations, custom fields, lists and the links
//! between them, while absorbing the API's quirks: identifiers that arrive
//! as numbers or quoted strings, statuses as the only error signal, and
//! relationship endpoints whose response shape depends on whether the link
//! already existed.
//!
//! # Design
//! - `ApiClient` is stateless: `build_*` produces an `HttpRequest`, `parse_*`
//!   consumes an `HttpResponse`. Both are generic over `types::Resource`.
//! - `Campaigner` pairs it with a `Transport` and adds the relationship
//!   operations, which check that both ends exist before writing.
//! - `error::classify` turns a status and body into exactly one `ApiError`
//!   kind.
//! - `codegen` renders the live tag/field/list catalog as PHP constants.

pub mod campaigner;
pub mod client;
pub mod codegen;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod id;
pub mod transport;
pub mod types;

pub use campaigner::Campaigner;
pub use client::ApiClient;
pub use codegen::{Catalog, CatalogKind, CodegenError, CollisionPolicy, Generator};
pub use config::{Config, ConfigError};
pub use endpoint::{Endpoint, Pagination, Query};
pub use error::{classify, ApiError, ErrorKind, Operation, ValidationEntry, ValidationErrors};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use id::{Id, IdError};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    Contact, ContactList, ContactListMembership, ContactTag, Field, FieldValue, List, Organization,
    Page, Resource, Tag, TagType, Updatable,
};
