//! Error taxonomy for the CRM client.
//!
//! # Design
//! The remote API has no uniform error envelope; the status code is the only
//! reliable signal. `classify` maps a response onto exactly one outcome:
//! an accepted status is success, 404 is `NotFound`, 422 carrying an error
//! list is `Validation`, and anything else is `Unspecified` with the raw body
//! kept byte-for-byte. Callers branch on `ApiError::kind()` rather than on
//! message text.

use std::fmt;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::http::HttpResponse;
use crate::id::Id;
use crate::transport::TransportError;

/// Longest excerpt of a payload carried by a decode error.
const FRAGMENT_LIMIT: usize = 512;

/// Discriminant of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    InvalidArgument,
    Transport,
    Validation,
    NotFound,
    RelatedNotFound,
    Unspecified,
    Decode,
    Serialization,
}

/// Errors returned by every client operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A local precondition failed; nothing was sent.
    #[error("{operation} failed, invalid argument: {reason}")]
    InvalidArgument { operation: String, reason: String },

    /// The request could not be sent or no status was received.
    #[error("{operation} failed, transport error: {source}")]
    Transport {
        operation: String,
        #[source]
        source: TransportError,
    },

    /// 422 with a structured list of field problems.
    #[error("{operation} failed, {errors}")]
    Validation {
        operation: String,
        errors: ValidationErrors,
    },

    /// 404 for the addressed resource.
    #[error("{message}")]
    NotFound { operation: String, message: String },

    /// A resource referenced by a relationship does not exist.
    #[error("{operation} failed, {message}")]
    RelatedNotFound {
        operation: String,
        message: String,
        #[source]
        source: Box<ApiError>,
    },

    /// Any other non-success status.
    #[error("{message}: {}", String::from_utf8_lossy(.raw_body))]
    Unspecified {
        status: u16,
        raw_body: Vec<u8>,
        message: String,
    },

    /// A success response whose body could not be read.
    #[error("{operation} failed, could not decode response ({reason}): {fragment}")]
    Decode {
        operation: String,
        fragment: String,
        reason: String,
    },

    #[error("{operation} failed, could not encode request: {reason}")]
    Serialization { operation: String, reason: String },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Config(_) => ErrorKind::Config,
            ApiError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            ApiError::Transport { .. } => ErrorKind::Transport,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::RelatedNotFound { .. } => ErrorKind::RelatedNotFound,
            ApiError::Unspecified { .. } => ErrorKind::Unspecified,
            ApiError::Decode { .. } => ErrorKind::Decode,
            ApiError::Serialization { .. } => ErrorKind::Serialization,
        }
    }

    pub fn invalid_argument(operation: &Operation, reason: impl Into<String>) -> Self {
        ApiError::InvalidArgument {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    pub fn decode(operation: &Operation, fragment: &[u8], reason: impl fmt::Display) -> Self {
        ApiError::Decode {
            operation: operation.to_string(),
            fragment: excerpt(&String::from_utf8_lossy(fragment)),
            reason: reason.to_string(),
        }
    }

    pub fn serialization(operation: &Operation, reason: impl fmt::Display) -> Self {
        ApiError::Serialization {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= FRAGMENT_LIMIT {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(FRAGMENT_LIMIT).collect();
        cut.push_str("...");
        cut
    }
}

/// What a call is doing, used to label errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub resource: &'static str,
    pub action: &'static str,
    pub id: Option<Id>,
}

impl Operation {
    pub const fn new(resource: &'static str, action: &'static str) -> Self {
        Self {
            resource,
            action,
            id: None,
        }
    }

    pub const fn on(resource: &'static str, action: &'static str, id: Id) -> Self {
        Self {
            resource,
            action,
            id: Some(id),
        }
    }

    fn not_found_message(&self) -> String {
        match self.id {
            Some(id) => format!("{self} failed, {} with id {id} not found", self.resource),
            None => format!("{self} failed, {} not found", self.resource),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource, self.action)
    }
}

/// One problem reported in a 422 body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationEntry {
    pub code: String,
    pub detail: String,
    pub source_pointer: String,
    pub title: String,
}

/// The problems reported in a 422 body, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationEntry>);

impl ValidationErrors {
    pub fn entries(&self) -> &[ValidationEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a `{"errors":[...]}` body. `None` if the body has no such list.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let envelope: WireErrors = serde_json::from_slice(body).ok()?;
        Some(Self(
            envelope
                .errors
                .into_iter()
                .map(|line| ValidationEntry {
                    code: line.code,
                    detail: line.detail,
                    source_pointer: line.source.pointer,
                    title: line.title,
                })
                .collect(),
        ))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("remote validation error: ")?;
        for (index, entry) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                r#"<error index="{index}" title="{}" detail="{}" code="{}" />"#,
                entry.title, entry.detail, entry.code
            )?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct WireErrors {
    errors: Vec<WireErrorLine>,
}

#[derive(Deserialize)]
struct WireErrorLine {
    #[serde(default)]
    code: String,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    source: WireErrorSource,
    #[serde(default)]
    title: String,
}

#[derive(Deserialize, Default)]
struct WireErrorSource {
    #[serde(default)]
    pointer: String,
}

/// Map a response onto success or exactly one error kind.
///
/// `accepted` lists the statuses that count as success for this operation.
/// A 422 whose body is not an error list falls back to `Unspecified`.
pub fn classify(
    operation: &Operation,
    response: &HttpResponse,
    accepted: &[u16],
) -> Result<(), ApiError> {
    if accepted.contains(&response.status) {
        return Ok(());
    }

    match response.status {
        404 => Err(ApiError::NotFound {
            operation: operation.to_string(),
            message: operation.not_found_message(),
        }),
        422 => match ValidationErrors::parse(&response.body) {
            Some(errors) => Err(ApiError::Validation {
                operation: operation.to_string(),
                errors,
            }),
            None => Err(unspecified(operation, response)),
        },
        _ => Err(unspecified(operation, response)),
    }
}

fn unspecified(operation: &Operation, response: &HttpResponse) -> ApiError {
    ApiError::Unspecified {
        status: response.status,
        raw_body: response.body.clone(),
        message: format!(
            "{operation} failed, unspecified error ({})",
            response.status
        ),
    }
}
