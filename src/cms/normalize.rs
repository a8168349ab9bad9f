//! Validation of raw CMS documents into post models

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::{CmsError, Cursor, RawDocument, SearchResponse};
use crate::content::{
    is_valid_uid, Banner, ContentBlock, Dimensions, PostDetail, PostSummary, RichText,
};
use crate::listing::PostsPage;

/// Normalize a search response into a listing page
pub fn page(response: &SearchResponse) -> Result<PostsPage, CmsError> {
    Ok(PostsPage {
        posts: summaries(&response.results),
        next_page: Cursor::from_next_page(response.next_page.as_deref())?,
    })
}

/// Normalize a document into a listing entry
pub fn summary(doc: &RawDocument) -> Result<PostSummary, CmsError> {
    Ok(PostSummary {
        uid: uid(doc)?,
        published_at: publication_date(doc)?,
        title: required_text(doc, "title")?,
        subtitle: text_field(&doc.data, "subtitle").unwrap_or_default(),
        author: text_field(&doc.data, "author").unwrap_or_default(),
    })
}

/// Normalize every document of a page, dropping the ones that do not validate
pub fn summaries(docs: &[RawDocument]) -> Vec<PostSummary> {
    docs.iter()
        .filter_map(|doc| match summary(doc) {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::warn!("Skipping document in listing: {}", e);
                None
            }
        })
        .collect()
}

/// Normalize a document into a full post
pub fn detail(doc: &RawDocument) -> Result<PostDetail, CmsError> {
    Ok(PostDetail {
        uid: uid(doc)?,
        published_at: publication_date(doc)?,
        title: required_text(doc, "title")?,
        subtitle: text_field(&doc.data, "subtitle").unwrap_or_default(),
        author: text_field(&doc.data, "author").unwrap_or_default(),
        banner: banner(doc)?,
        content: content(doc)?,
    })
}

/// Parse a CMS timestamp. Both `+00:00` and `+0000` offsets occur.
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}

fn uid(doc: &RawDocument) -> Result<String, CmsError> {
    match doc.uid.as_deref() {
        Some(uid) if is_valid_uid(uid) => Ok(uid.to_string()),
        Some(uid) => Err(CmsError::malformed(
            &doc.id,
            format!("uid {:?} is not a valid slug", uid),
        )),
        None => Err(CmsError::malformed(&doc.id, "missing uid")),
    }
}

fn publication_date(doc: &RawDocument) -> Result<Option<DateTime<FixedOffset>>, CmsError> {
    match doc.first_publication_date.as_deref() {
        None => Ok(None),
        Some(raw) => parse_date(raw).map(Some).ok_or_else(|| {
            CmsError::malformed(&doc.id, format!("unparseable publication date {:?}", raw))
        }),
    }
}

fn required_text(doc: &RawDocument, key: &str) -> Result<String, CmsError> {
    text_field(&doc.data, key)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CmsError::malformed(&doc.id, format!("missing {}", key)))
}

/// Read a key-text field, flattening it when it arrives as rich text
fn text_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        value @ Value::Array(_) => serde_json::from_value::<RichText>(value.clone())
            .ok()
            .map(|rt| rt.as_text()),
        _ => None,
    }
}

fn banner(doc: &RawDocument) -> Result<Option<Banner>, CmsError> {
    let Some(image) = doc.data.get("banner").filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let Some(url) = image.get("url").and_then(Value::as_str) else {
        // an unset image field is an empty object
        return Ok(None);
    };

    let dimensions = match image.get("dimensions") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<Dimensions>(value.clone())
                .map_err(|e| CmsError::malformed(&doc.id, format!("banner dimensions: {}", e)))?,
        ),
    };

    Ok(Some(Banner {
        url: url.to_string(),
        alt: image
            .get("alt")
            .and_then(Value::as_str)
            .map(str::to_string),
        dimensions,
    }))
}

fn content(doc: &RawDocument) -> Result<Vec<ContentBlock>, CmsError> {
    let items = match doc.data.get("content") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(CmsError::malformed(&doc.id, "content is not a list")),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let body = match item.get("body") {
                None | Some(Value::Null) => RichText::default(),
                Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                    CmsError::malformed(&doc.id, format!("content[{}].body: {}", i, e))
                })?,
            };
            Ok(ContentBlock {
                heading: text_field(item, "heading").unwrap_or_default(),
                body,
            })
        })
        .collect()
}
