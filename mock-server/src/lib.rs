//! In-memory stand-in for the remote CRM API.
//!
//! Reproduces the behaviour clients have to cope with rather than an ideal
//! REST service: identifiers are sent as quoted strings except for some
//! relationship foreign keys, `meta.total` is a string, and the link
//! endpoints (`contactTags`, `contactLists`, `fieldValues`) answer 201 with
//! an embedded `contacts` list for a new link but 200 without it when the
//! link already exists. Links are never checked against their referenced
//! records. Every route requires a non-empty `Api-Token` header.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

/// Timestamp stamped on every record the server creates.
pub const CREATED_AT: &str = "2019-01-01T00:00:00-06:00";

const DEFAULT_LIMIT: usize = 20;

/// A plain resource collection.
pub struct Collection {
    pub path: &'static str,
    pub singular: &'static str,
    pub plural: &'static str,
    pub search: Option<&'static str>,
    pub required: &'static [&'static str],
}

pub const CONTACTS: Collection = Collection {
    path: "/api/3/contacts",
    singular: "contact",
    plural: "contacts",
    search: Some("email"),
    required: &["email"],
};

pub const TAGS: Collection = Collection {
    path: "/api/3/tags",
    singular: "tag",
    plural: "tags",
    search: Some("tag"),
    required: &["tag", "tagType"],
};

pub const ORGANIZATIONS: Collection = Collection {
    path: "/api/3/organizations",
    singular: "organization",
    plural: "organizations",
    search: Some("name"),
    required: &["name"],
};

pub const FIELDS: Collection = Collection {
    path: "/api/3/fields",
    singular: "field",
    plural: "fields",
    search: None,
    required: &["title", "type"],
};

pub const LISTS: Collection = Collection {
    path: "/api/3/lists",
    singular: "list",
    plural: "lists",
    search: Some("name"),
    required: &["name", "stringid"],
};

/// A collection of links between a contact and another record.
pub struct Link {
    pub path: &'static str,
    pub singular: &'static str,
    pub plural: &'static str,
    /// Key of the non-contact end.
    pub target: &'static str,
    /// Extra member updated in place when the link already exists.
    pub payload: Option<&'static str>,
}

pub const CONTACT_TAGS: Link = Link {
    path: "/api/3/contactTags",
    singular: "contactTag",
    plural: "contactTags",
    target: "tag",
    payload: None,
};

pub const CONTACT_LISTS: Link = Link {
    path: "/api/3/contactLists",
    singular: "contactList",
    plural: "contactLists",
    target: "list",
    payload: Some("status"),
};

pub const FIELD_VALUES: Link = Link {
    path: "/api/3/fieldValues",
    singular: "fieldValue",
    plural: "fieldValues",
    target: "field",
    payload: Some("value"),
};

#[derive(Default)]
pub struct Store {
    next_id: u64,
    records: HashMap<&'static str, BTreeMap<u64, Value>>,
}

impl Store {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn table(&mut self, plural: &'static str) -> &mut BTreeMap<u64, Value> {
        self.records.entry(plural).or_default()
    }

    fn get(&self, plural: &str, id: u64) -> Option<&Value> {
        self.records.get(plural).and_then(|t| t.get(&id))
    }

    fn all(&self, plural: &str) -> Vec<Value> {
        self.records
            .get(plural)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop links whose `key` end points at `id`.
    fn cascade(&mut self, key: &str, id: u64) {
        for link in [&CONTACT_TAGS, &CONTACT_LISTS, &FIELD_VALUES] {
            if key == "contact" || key == link.target {
                self.table(link.plural)
                    .retain(|_, record| id_of(&record[key]) != Some(id));
            }
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let mut router = Router::new();
    for collection in [&CONTACTS, &TAGS, &ORGANIZATIONS, &FIELDS, &LISTS] {
        router = collection_routes(router, collection);
    }
    for link in [&CONTACT_TAGS, &CONTACT_LISTS, &FIELD_VALUES] {
        router = link_routes(router, link);
    }
    router
        .route("/api/3/contacts/{id}/contactTags", get(contact_tags))
        .layer(middleware::from_fn(require_token))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn collection_routes(router: Router<Db>, c: &'static Collection) -> Router<Db> {
    router
        .route(
            c.path,
            get(
                move |State(db): State<Db>, Query(q): Query<HashMap<String, String>>| {
                    list(db, q, c)
                },
            )
            .post(move |State(db): State<Db>, Json(body): Json<Value>| create(db, body, c)),
        )
        .route(
            &format!("{}/{{id}}", c.path),
            get(move |State(db): State<Db>, Path(id): Path<String>| read(db, id, c))
                .put(
                    move |State(db): State<Db>, Path(id): Path<String>, Json(body): Json<Value>| {
                        update(db, id, body, c)
                    },
                )
                .delete(move |State(db): State<Db>, Path(id): Path<String>| delete(db, id, c)),
        )
}

fn link_routes(router: Router<Db>, l: &'static Link) -> Router<Db> {
    router
        .route(
            l.path,
            get(move |State(db): State<Db>| list_links(db, l))
                .post(move |State(db): State<Db>, Json(body): Json<Value>| {
                    upsert_link(db, body, l)
                }),
        )
        .route(
            &format!("{}/{{id}}", l.path),
            get(move |State(db): State<Db>, Path(id): Path<String>| read_link(db, id, l))
                .delete(move |State(db): State<Db>, Path(id): Path<String>| delete_link(db, id, l)),
        )
}

async fn require_token(request: Request, next: Next) -> Response {
    let authorised = request
        .headers()
        .get("api-token")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().is_empty());
    if !authorised {
        return (StatusCode::FORBIDDEN, Json(json!({"message": "Forbidden"}))).into_response();
    }
    debug!(method = %request.method(), uri = %request.uri(), "request");
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read an identifier the way the real service does: digits only.
fn id_of(value: &Value) -> Option<u64> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return None,
    };
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Path segments are read with the same tolerance as body values.
fn parse_id(raw: &str) -> Option<u64> {
    id_of(&Value::String(raw.to_string()))
}

fn not_found(kind: &str, id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": format!("No Result found for {kind} with id {id}")})),
    )
        .into_response()
}

fn validation(problems: Vec<Value>) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"errors": problems}))).into_response()
}

fn problem(field: &str, title: String, code: &str) -> Value {
    json!({
        "title": title,
        "detail": "",
        "code": code,
        "source": {"pointer": format!("/data/attributes/{field}")}
    })
}

fn wrapped(key: &str, value: Value) -> Json<Value> {
    let mut envelope = Map::new();
    envelope.insert(key.to_string(), value);
    Json(Value::Object(envelope))
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Stringify a bare number the way the service echoes most fields.
fn quoted(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        other => other.clone(),
    }
}

fn decorate(store: &Store, c: &Collection, mut record: Value) -> Value {
    if c.plural == ORGANIZATIONS.plural {
        let id = id_of(&record["id"]);
        let contacts = store
            .all(CONTACTS.plural)
            .iter()
            .filter(|contact| id_of(&contact["orgid"]).is_some() && id_of(&contact["orgid"]) == id)
            .count();
        record["contactCount"] = Value::String(contacts.to_string());
        record["dealCount"] = Value::String("0".to_string());
    }
    record
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

async fn list(db: Db, query: HashMap<String, String>, c: &'static Collection) -> Response {
    let store = db.read().await;
    let mut records = store.all(c.plural);

    if let Some(field) = c.search {
        if let Some(term) = query.get(&format!("filters[{field}]")) {
            records.retain(|r| r[field].as_str().is_some_and(|v| v.eq_ignore_ascii_case(term)));
        }
    }

    let total = records.len();
    let limit = query
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_LIMIT);
    let offset = query
        .get("offset")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let page: Vec<Value> = records
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|r| decorate(&store, c, r))
        .collect();

    let mut body = Map::new();
    body.insert(c.plural.to_string(), Value::Array(page));
    body.insert("meta".to_string(), json!({"total": total.to_string()}));
    Json(Value::Object(body)).into_response()
}

async fn create(db: Db, body: Value, c: &'static Collection) -> Response {
    let Some(fields) = body.get(c.singular).and_then(Value::as_object) else {
        return validation(vec![problem(
            c.singular,
            format!("{} is required", c.singular),
            "field_missing",
        )]);
    };

    let mut problems: Vec<Value> = c
        .required
        .iter()
        .filter(|name| is_blank(fields.get(**name)))
        .map(|name| problem(name, format!("{name} is required"), "field_missing"))
        .collect();

    let mut store = db.write().await;
    if c.plural == CONTACTS.plural {
        if let Some(email) = fields.get("email").and_then(Value::as_str) {
            let taken = store
                .all(CONTACTS.plural)
                .iter()
                .any(|r| r["email"].as_str() == Some(email));
            if taken {
                let title = "Email address already exists in the system.".to_string();
                problems.push(problem("email", title, "duplicate"));
            }
        }
    }
    if !problems.is_empty() {
        return validation(problems);
    }

    let id = store.allocate();
    let mut record: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), quoted(v)))
        .collect();
    record.insert("id".to_string(), Value::String(id.to_string()));
    record.insert("cdate".to_string(), Value::String(CREATED_AT.to_string()));
    if c.plural == TAGS.plural {
        record.insert("subscriber_count".to_string(), Value::String("0".to_string()));
    }
    let record = Value::Object(record);
    store.table(c.plural).insert(id, record.clone());

    (StatusCode::CREATED, wrapped(c.singular, record)).into_response()
}

async fn read(db: Db, raw_id: String, c: &'static Collection) -> Response {
    let store = db.read().await;
    let Some(record) = parse_id(&raw_id).and_then(|id| store.get(c.plural, id)) else {
        return not_found(c.singular, &raw_id);
    };

    let mut body = Map::new();
    body.insert(c.singular.to_string(), record.clone());
    // Contact reads carry the contact's links alongside the record.
    if c.plural == CONTACTS.plural {
        let id = id_of(&record["id"]);
        let links: Vec<Value> = store
            .all(CONTACT_TAGS.plural)
            .into_iter()
            .filter(|l| id_of(&l["contact"]) == id)
            .collect();
        body.insert(CONTACT_TAGS.plural.to_string(), Value::Array(links));
    }
    Json(Value::Object(body)).into_response()
}

async fn update(db: Db, raw_id: String, body: Value, c: &'static Collection) -> Response {
    let mut store = db.write().await;
    let Some(id) = parse_id(&raw_id) else {
        return not_found(c.singular, &raw_id);
    };
    let Some(record) = store.table(c.plural).get_mut(&id) else {
        return not_found(c.singular, &raw_id);
    };

    if let Some(changes) = body.get(c.singular).and_then(Value::as_object) {
        for (key, value) in changes {
            if key != "id" {
                record[key.as_str()] = quoted(value);
            }
        }
    }
    record["udate"] = Value::String(CREATED_AT.to_string());
    let record = record.clone();

    wrapped(c.singular, record).into_response()
}

async fn delete(db: Db, raw_id: String, c: &'static Collection) -> Response {
    let mut store = db.write().await;
    let removed = parse_id(&raw_id).and_then(|id| store.table(c.plural).remove(&id));
    match removed {
        Some(record) => {
            if let Some(id) = id_of(&record["id"]) {
                store.cascade(c.singular, id);
            }
            Json(json!({})).into_response()
        }
        None => not_found(c.singular, &raw_id),
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

async fn list_links(db: Db, l: &'static Link) -> Response {
    let store = db.read().await;
    let records = store.all(l.plural);
    let total = records.len();
    let mut body = Map::new();
    body.insert(l.plural.to_string(), Value::Array(records));
    body.insert("meta".to_string(), json!({"total": total.to_string()}));
    Json(Value::Object(body)).into_response()
}

/// Renders foreign keys as bare numbers, the way repeat calls answer.
fn numeric_keys(mut record: Value, l: &Link) -> Value {
    for key in ["contact", l.target] {
        if let Some(id) = id_of(&record[key]) {
            record[key] = json!(id);
        }
    }
    record
}

async fn upsert_link(db: Db, body: Value, l: &'static Link) -> Response {
    let Some(fields) = body.get(l.singular).and_then(Value::as_object) else {
        let title = format!("{} is required", l.singular);
        return validation(vec![problem(l.singular, title, "field_missing")]);
    };
    let contact = fields.get("contact").and_then(id_of);
    let target = fields.get(l.target).and_then(id_of);
    let (Some(contact), Some(target)) = (contact, target) else {
        let title = format!("contact and {} are required", l.target);
        return validation(vec![problem(l.target, title, "field_missing")]);
    };

    let mut store = db.write().await;
    let existing = store.table(l.plural).iter_mut().find(|(_, r)| {
        id_of(&r["contact"]) == Some(contact) && id_of(&r[l.target]) == Some(target)
    });
    if let Some((_, record)) = existing {
        if let Some(key) = l.payload {
            if let Some(value) = fields.get(key) {
                record[key] = quoted(value);
                record["udate"] = Value::String(CREATED_AT.to_string());
            }
        }
        let record = numeric_keys(record.clone(), l);
        return wrapped(l.singular, record).into_response();
    }

    let id = store.allocate();
    let mut record = json!({
        "id": id.to_string(),
        "contact": contact.to_string(),
        "cdate": CREATED_AT,
    });
    record[l.target] = Value::String(target.to_string());
    if let Some(key) = l.payload {
        if let Some(value) = fields.get(key) {
            record[key] = quoted(value);
        }
    }
    store.table(l.plural).insert(id, record.clone());

    let contacts: Vec<Value> = store.get(CONTACTS.plural, contact).cloned().into_iter().collect();
    let mut response = Map::new();
    response.insert(CONTACTS.plural.to_string(), Value::Array(contacts));
    response.insert(l.singular.to_string(), record);
    (StatusCode::CREATED, Json(Value::Object(response))).into_response()
}

async fn read_link(db: Db, raw_id: String, l: &'static Link) -> Response {
    let store = db.read().await;
    match parse_id(&raw_id).and_then(|id| store.get(l.plural, id)) {
        Some(record) => wrapped(l.singular, record.clone()).into_response(),
        None => not_found(l.singular, &raw_id),
    }
}

async fn delete_link(db: Db, raw_id: String, l: &'static Link) -> Response {
    let mut store = db.write().await;
    match parse_id(&raw_id).and_then(|id| store.table(l.plural).remove(&id)) {
        Some(_) => Json(json!({})).into_response(),
        None => not_found(l.singular, &raw_id),
    }
}

async fn contact_tags(State(db): State<Db>, Path(raw_id): Path<String>) -> Response {
    let store = db.read().await;
    let known = |id: &u64| store.get(CONTACTS.plural, *id).is_some();
    let Some(contact) = parse_id(&raw_id).filter(known) else {
        return not_found(CONTACTS.singular, &raw_id);
    };
    let links: Vec<Value> = store
        .all(CONTACT_TAGS.plural)
        .into_iter()
        .filter(|l| id_of(&l["contact"]) == Some(contact))
        .collect();
    wrapped(CONTACT_TAGS.plural, Value::Array(links)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_of_accepts_both_encodings() {
        assert_eq!(id_of(&json!(7)), Some(7));
        assert_eq!(id_of(&json!("7")), Some(7));
        assert_eq!(id_of(&json!("")), None);
        assert_eq!(id_of(&Value::Null), None);
    }

    #[test]
    fn quoted_stringifies_numbers_only() {
        assert_eq!(quoted(&json!(5)), json!("5"));
        assert_eq!(quoted(&json!("x")), json!("x"));
        assert_eq!(quoted(&json!(true)), json!(true));
    }

    #[test]
    fn numeric_keys_rewrites_foreign_keys() {
        let record = json!({"id": "3", "contact": "9", "tag": "7"});
        let rendered = numeric_keys(record, &CONTACT_TAGS);
        assert_eq!(rendered, json!({"id": "3", "contact": 9, "tag": 7}));
    }

    #[test]
    fn blank_values_are_missing() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!("  "))));
        assert!(is_blank(Some(&Value::Null)));
        assert!(!is_blank(Some(&json!("x"))));
    }

    #[test]
    fn cascade_drops_links_of_deleted_records() {
        let mut store = Store::default();
        store
            .table(CONTACT_TAGS.plural)
            .insert(1, json!({"id": "1", "contact": "9", "tag": "7"}));
        store
            .table(CONTACT_TAGS.plural)
            .insert(2, json!({"id": "2", "contact": "8", "tag": "7"}));
        store.cascade("contact", 9);
        assert_eq!(store.all(CONTACT_TAGS.plural).len(), 1);
        store.cascade("tag", 7);
        assert!(store.all(CONTACT_TAGS.plural).is_empty());
    }
}
