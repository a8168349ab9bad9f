//! CMS adapter
//!
//! Talks to a headless CMS over its REST API and turns the untyped documents
//! it returns into post models. Nothing outside this module sees the raw
//! document shape.

mod client;
mod document;
mod error;
pub mod normalize;
mod predicate;

pub use client::{CmsClient, QueryOptions};
pub use document::{ApiInfo, ApiRef, Cursor, RawDocument, SearchResponse};
pub use error::CmsError;
pub use predicate::{to_query, Predicate};
