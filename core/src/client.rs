//! Stateless request builder and response parser for the CRM API.
//!
//! # Design
//! `ApiClient` holds only the endpoint and the credential and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`, both generic over `Resource`. Nothing here performs
//! I/O; `Campaigner` pairs this with a `Transport`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{Config, ConfigError};
use crate::endpoint::{Endpoint, Pagination, Query};
use crate::error::{classify, ApiError, Operation};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::id::{self, Id};
use crate::types::{ContactTag, Page, Resource, Updatable};

/// Header carrying the credential.
pub const TOKEN_HEADER: &str = "Api-Token";

#[derive(Debug, Clone)]
pub struct ApiClient {
    endpoint: Endpoint,
    api_token: String,
}

impl ApiClient {
    /// Fails fast on an incomplete configuration.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            endpoint: Endpoint::new(&config.base_url),
            api_token: config.api_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        let mut headers = vec![(TOKEN_HEADER.to_string(), self.api_token.clone())];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    fn item_path<R: Resource>(id: Id) -> String {
        format!("{}/{id}", R::PATH)
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    pub fn build_list<R: Resource>(&self, page: Pagination) -> HttpRequest {
        let url = self
            .endpoint
            .url_with_query(R::PATH, &Query::new().page(page));
        self.request(HttpMethod::Get, url, None)
    }

    /// Search by the kind's filter field. Blank terms are rejected locally.
    pub fn build_find<R: Resource>(&self, term: &str) -> Result<HttpRequest, ApiError> {
        let operation = Operation::new(R::KIND, "find");
        let Some(field) = R::SEARCH_FILTER else {
            return Err(ApiError::invalid_argument(
                &operation,
                format!("{} does not support searching", R::KIND),
            ));
        };
        if term.trim().is_empty() {
            return Err(ApiError::invalid_argument(&operation, "search term is empty"));
        }
        let url = self
            .endpoint
            .url_with_query(R::PATH, &Query::new().filter(field, term));
        Ok(self.request(HttpMethod::Get, url, None))
    }

    pub fn build_read<R: Resource>(&self, id: Id) -> HttpRequest {
        let url = self.endpoint.url(&Self::item_path::<R>(id));
        self.request(HttpMethod::Get, url, None)
    }

    pub fn build_create<R: Resource>(&self, payload: &R::Create) -> Result<HttpRequest, ApiError> {
        let operation = Operation::new(R::KIND, "create");
        R::check_create(payload).map_err(|reason| ApiError::invalid_argument(&operation, reason))?;
        let body = wrap(&operation, R::SINGULAR, payload)?;
        let url = self.endpoint.url(R::PATH);
        Ok(self.request(HttpMethod::Post, url, Some(body)))
    }

    pub fn build_update<R: Updatable>(
        &self,
        id: Id,
        payload: &R::Update,
    ) -> Result<HttpRequest, ApiError> {
        let operation = Operation::on(R::KIND, "update", id);
        let body = wrap(&operation, R::SINGULAR, payload)?;
        let url = self.endpoint.url(&Self::item_path::<R>(id));
        Ok(self.request(HttpMethod::Put, url, Some(body)))
    }

    pub fn build_delete<R: Resource>(&self, id: Id) -> HttpRequest {
        let url = self.endpoint.url(&Self::item_path::<R>(id));
        self.request(HttpMethod::Delete, url, None)
    }

    /// Tags applied to one contact.
    pub fn build_contact_tags(&self, contact_id: Id) -> HttpRequest {
        let url = self
            .endpoint
            .url(&format!("/api/3/contacts/{contact_id}/contactTags"));
        self.request(HttpMethod::Get, url, None)
    }

    // -----------------------------------------------------------------------
    // Parse
    // -----------------------------------------------------------------------

    pub fn parse_list<R: Resource>(&self, response: HttpResponse) -> Result<Page<R>, ApiError> {
        let operation = Operation::new(R::KIND, "list");
        classify(&operation, &response, &[200])?;
        decode_page(&operation, &response.body, R::PLURAL)
    }

    pub fn parse_find<R: Resource>(&self, response: HttpResponse) -> Result<Page<R>, ApiError> {
        let operation = Operation::new(R::KIND, "find");
        classify(&operation, &response, &[200])?;
        decode_page(&operation, &response.body, R::PLURAL)
    }

    pub fn parse_read<R: Resource>(&self, id: Id, response: HttpResponse) -> Result<R, ApiError> {
        let operation = Operation::on(R::KIND, "read", id);
        classify(&operation, &response, &[200])?;
        decode_member(&operation, &response.body, R::SINGULAR)
    }

    pub fn parse_create<R: Resource>(&self, response: HttpResponse) -> Result<R, ApiError> {
        let operation = Operation::new(R::KIND, "create");
        classify(&operation, &response, R::CREATED)?;
        decode_member(&operation, &response.body, R::SINGULAR)
    }

    pub fn parse_update<R: Updatable>(
        &self,
        id: Id,
        response: HttpResponse,
    ) -> Result<R, ApiError> {
        let operation = Operation::on(R::KIND, "update", id);
        classify(&operation, &response, &[200])?;
        decode_member(&operation, &response.body, R::SINGULAR)
    }

    pub fn parse_delete<R: Resource>(
        &self,
        id: Id,
        response: HttpResponse,
    ) -> Result<(), ApiError> {
        let operation = Operation::on(R::KIND, "delete", id);
        classify(&operation, &response, &[200])
    }

    pub fn parse_contact_tags(
        &self,
        contact_id: Id,
        response: HttpResponse,
    ) -> Result<Vec<ContactTag>, ApiError> {
        let operation = Operation::on("contact", "tag listing", contact_id);
        classify(&operation, &response, &[200])?;
        decode_member(&operation, &response.body, ContactTag::PLURAL)
    }
}

fn wrap<T: Serialize>(operation: &Operation, key: &str, payload: &T) -> Result<String, ApiError> {
    let value = serde_json::to_value(payload).map_err(|e| ApiError::serialization(operation, e))?;
    let mut envelope = Map::new();
    envelope.insert(key.to_string(), value);
    serde_json::to_string(&Value::Object(envelope))
        .map_err(|e| ApiError::serialization(operation, e))
}

fn parse_body(operation: &Operation, body: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::decode(operation, body, e))
}

/// Pull `key` out of the response object and decode it. Sibling members
/// (embedded contacts, field options, ...) are ignored.
fn decode_member<T: DeserializeOwned>(
    operation: &Operation,
    body: &[u8],
    key: &str,
) -> Result<T, ApiError> {
    let mut value = parse_body(operation, body)?;
    let member = value
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| ApiError::decode(operation, body, format!("missing `{key}` member")))?;
    from_member(operation, member)
}

fn from_member<T: DeserializeOwned>(operation: &Operation, member: Value) -> Result<T, ApiError> {
    T::deserialize(&member)
        .map_err(|e| ApiError::decode(operation, member.to_string().as_bytes(), e))
}

/// Decode a collection one record at a time, so a failure reports the
/// offending record rather than the whole array.
fn from_items<T: DeserializeOwned>(
    operation: &Operation,
    member: Value,
    key: &str,
) -> Result<Vec<T>, ApiError> {
    match member {
        Value::Array(items) => items
            .into_iter()
            .map(|item| from_member(operation, item))
            .collect(),
        other => Err(ApiError::decode(
            operation,
            other.to_string().as_bytes(),
            format!("`{key}` is not an array"),
        )),
    }
}

fn decode_page<T: DeserializeOwned>(
    operation: &Operation,
    body: &[u8],
    key: &str,
) -> Result<Page<T>, ApiError> {
    let mut value = parse_body(operation, body)?;
    let Some(member) = value.get_mut(key).map(Value::take) else {
        let reason = format!("missing `{key}` member");
        return Err(ApiError::decode(operation, body, reason));
    };
    let items: Vec<T> = from_items(operation, member, key)?;

    // A null total is treated like an absent `meta`.
    let total = match value.pointer("/meta/total").filter(|raw| !raw.is_null()) {
        Some(raw) => id::loose_count(raw)
            .map_err(|e| ApiError::decode(operation, raw.to_string().as_bytes(), e))?,
        None => items.len() as u64,
    };
    Ok(Page { items, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{Contact, NewContactTag, NewTag, Organization, Tag, TagType, TagUpdate};

    fn client() -> ApiClient {
        ApiClient::new(&Config::new("http://localhost:3000", "secret")).unwrap()
    }

    fn body_json(request: &HttpRequest) -> Value {
        serde_json::from_str(request.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn incomplete_config_is_rejected() {
        let err = ApiClient::new(&Config::new("http://localhost:3000", "")).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiToken);
    }

    #[test]
    fn every_request_carries_the_token() {
        let req = client().build_read::<Tag>(Id::new(1));
        assert_eq!(req.header(TOKEN_HEADER), Some("secret"));
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn build_list_uses_pagination() {
        let req = client().build_list::<Organization>(Pagination::default());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://localhost:3000/api/3/organizations?limit=100&offset=0"
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn build_find_rejects_blank_terms() {
        let err = client().build_find::<Tag>("   ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn build_find_rejects_kinds_without_filter() {
        let err = client().build_find::<crate::types::Field>("x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn build_find_filters_by_name() {
        let req = client().build_find::<Tag>("Onboarding - Account Activated").unwrap();
        assert_eq!(
            req.url,
            "http://localhost:3000/api/3/tags?filters%5Btag%5D=Onboarding+-+Account+Activated"
        );
    }

    #[test]
    fn build_create_wraps_payload() {
        let req = client()
            .build_create::<Tag>(&NewTag::new("VIP", "Very important", TagType::Contact))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/api/3/tags");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(
            body_json(&req),
            serde_json::json!({
                "tag": {"tag": "VIP", "description": "Very important", "tagType": "contact"}
            })
        );
    }

    #[test]
    fn build_create_runs_local_checks() {
        let err = client()
            .build_create::<ContactTag>(&NewContactTag {
                contact: Id::new(5),
                tag: Id::new(0),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn build_update_uses_put_on_item() {
        let update = TagUpdate {
            name: Some("Renamed".into()),
            ..TagUpdate::default()
        };
        let req = client().build_update::<Tag>(Id::new(7), &update).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:3000/api/3/tags/7");
        assert_eq!(body_json(&req), serde_json::json!({"tag":{"tag":"Renamed"}}));
    }

    #[test]
    fn build_delete_targets_item() {
        let req = client().build_delete::<Contact>(Id::new(12));
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://localhost:3000/api/3/contacts/12");
    }

    #[test]
    fn parse_list_decodes_items_and_total() {
        let response = HttpResponse::new(
            200,
            r#"{"tags":[{"id":"7","tag":"VIP"}],"meta":{"total":"1"}}"#,
        );
        let page = client().parse_list::<Tag>(response).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, Id::new(7));
        assert_eq!(page.items[0].name, "VIP");
    }

    #[test]
    fn parse_list_without_meta_counts_items() {
        let response = HttpResponse::new(200, r#"{"tags":[{"id":1},{"id":"2"}]}"#);
        let page = client().parse_list::<Tag>(response).unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn parse_list_tolerates_null_counts() {
        let response = HttpResponse::new(
            200,
            r#"{"tags":[{"id":"7","tag":"VIP","subscriber_count":null}],"meta":{"total":"1"}}"#,
        );
        let page = client().parse_list::<Tag>(response).unwrap();
        assert_eq!(page.items[0].subscriber_count, 0);

        let response = HttpResponse::new(
            200,
            r#"{"organizations":[{"id":"4","name":"Acme","contactCount":null}]}"#,
        );
        let page = client().parse_list::<Organization>(response).unwrap();
        assert_eq!(page.items[0].contact_count, 0);
    }

    #[test]
    fn parse_list_null_total_counts_items() {
        let response = HttpResponse::new(
            200,
            r#"{"tags":[{"id":"7","tag":"VIP"},{"id":"8","tag":"Lead"}],"meta":{"total":null}}"#,
        );
        let page = client().parse_list::<Tag>(response).unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn parse_list_reports_the_failing_record() {
        let padding = "x".repeat(600);
        let body = format!(
            r#"{{"tags":[{{"id":"1","tag":"{padding}"}},{{"id":"nothing","tag":"Bad"}}]}}"#
        );
        let err = client()
            .parse_list::<Tag>(HttpResponse::new(200, body))
            .unwrap_err();
        match err {
            ApiError::Decode { fragment, .. } => {
                assert!(fragment.contains("nothing"), "{fragment}");
                assert!(!fragment.contains(&padding));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn parse_read_not_found() {
        let response = HttpResponse::new(404, r#"{"message":"No Result found"}"#);
        let err = client()
            .parse_read::<crate::types::Field>(Id::new(3), response)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "field read failed, field with id 3 not found");
    }

    #[test]
    fn parse_read_reports_malformed_identifier() {
        let response = HttpResponse::new(200, r#"{"tag":{"id":"abc","tag":"VIP"}}"#);
        let err = client().parse_read::<Tag>(Id::new(1), response).unwrap_err();
        let ApiError::Decode {
            operation,
            fragment,
            ..
        } = err
        else {
            panic!("expected decode error");
        };
        assert_eq!(operation, "tag read");
        assert!(fragment.contains("abc"));
    }

    #[test]
    fn parse_read_reports_bad_json() {
        let response = HttpResponse::new(200, "not json");
        let err = client().parse_read::<Tag>(Id::new(1), response).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("not json"));
    }

    #[test]
    fn parse_create_validation_failure() {
        let response = HttpResponse::new(
            422,
            r#"{"errors":[{"title":"Email address is not valid.","detail":"","code":"email_invalid","source":{"pointer":"/data/attributes/email"}}]}"#,
        );
        let err = client().parse_create::<Contact>(response).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn parse_create_accepts_both_relationship_shapes() {
        let created = HttpResponse::new(
            201,
            r#"{"contacts":[{"id":"9","email":"a@b.c"}],"contactTag":{"id":"31","contact":"9","tag":"7"}}"#,
        );
        let existing = HttpResponse::new(200, r#"{"contactTag":{"id":"31","contact":9,"tag":7}}"#);
        let a = client().parse_create::<ContactTag>(created).unwrap();
        let b = client().parse_create::<ContactTag>(existing).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_create_rejects_200_for_plain_resources() {
        let response = HttpResponse::new(200, r#"{"tag":{"id":"1"}}"#);
        let err = client().parse_create::<Tag>(response).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unspecified);
    }

    #[test]
    fn parse_delete_statuses() {
        assert!(client()
            .parse_delete::<Tag>(Id::new(1), HttpResponse::new(200, "{}"))
            .is_ok());
        let err = client()
            .parse_delete::<Tag>(Id::new(1), HttpResponse::new(404, ""))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = client()
            .parse_delete::<Tag>(Id::new(1), HttpResponse::new(500, "oops"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unspecified);
    }

    #[test]
    fn parse_contact_tags_reads_collection() {
        let response = HttpResponse::new(
            200,
            r#"{"contactTags":[{"id":"1","contact":"9","tag":"7"},{"id":"2","contact":9,"tag":"8"}]}"#,
        );
        let tags = client().parse_contact_tags(Id::new(9), response).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].tag, Id::new(8));
    }
}
