//! Wire shapes returned by the CMS REST API

use serde::Deserialize;
use std::fmt;
use url::Url;

use super::CmsError;

/// API root document; only the refs matter here
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiInfo {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// One page of a document search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    pub next_page: Option<String>,
    #[serde(default)]
    pub results: Vec<RawDocument>,
}

/// An untyped CMS document. `data` holds the custom-type fields as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub first_publication_date: Option<String>,
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Opaque pointer to the next page of a search, as handed out by the CMS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(Url);

impl Cursor {
    pub fn parse(raw: &str) -> Result<Self, CmsError> {
        Url::parse(raw)
            .map(Cursor)
            .map_err(|source| CmsError::InvalidCursor {
                cursor: raw.to_string(),
                source,
            })
    }

    /// Read the `next_page` field of a response; `None` ends pagination
    pub fn from_next_page(next_page: Option<&str>) -> Result<Option<Self>, CmsError> {
        match next_page {
            Some(raw) if !raw.trim().is_empty() => Cursor::parse(raw).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Copy of the cursor without the query parameter `name`
    pub fn without_param(&self, name: &str) -> Self {
        if !self.0.query_pairs().any(|(key, _)| key == name) {
            return self.clone();
        }

        let kept: Vec<(String, String)> = self
            .0
            .query_pairs()
            .filter(|(key, _)| key != name)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.0.clone();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        Cursor(url)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
