//! URL composition for the remote API.
//!
//! `Endpoint::url` joins the configured base address with a relative path,
//! dropping one leading slash from the path so `"/x"` and `"x"` resolve to
//! the same URL. `Query` keeps its parameters in a `BTreeMap`, so the encoded
//! query string is deterministic regardless of insertion order.

use std::collections::BTreeMap;

use url::form_urlencoded;

/// Default page size for list calls.
pub const DEFAULT_LIMIT: u32 = 100;

/// Default page offset for list calls.
pub const DEFAULT_OFFSET: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
}

impl Endpoint {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}", self.base, path)
    }

    pub fn url_with_query(&self, path: &str, query: &Query) -> String {
        let url = self.url(path);
        if query.is_empty() {
            url
        } else {
            format!("{url}?{}", query.encode())
        }
    }
}

/// Page window for list calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIMIT),
            offset: offset.unwrap_or(DEFAULT_OFFSET),
        }
    }
}

/// Query parameters, percent-encoded in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: BTreeMap<String, String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: Pagination) -> Self {
        self.params.insert("limit".to_string(), page.limit.to_string());
        self.params.insert("offset".to_string(), page.offset.to_string());
        self
    }

    pub fn filter(mut self, field: &str, value: &str) -> Self {
        self.params
            .insert(format!("filters[{field}]"), value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }
}
