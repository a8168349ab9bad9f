//! Query predicates in the CMS filter syntax

use std::fmt;

/// A single `at(path, value)` filter, rendered as `[at(document.type, "posts")]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    path: String,
    value: String,
}

impl Predicate {
    /// Match documents whose field at `path` equals `value`
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Match documents of the given custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    /// Match the document of `doc_type` carrying `uid`
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{}.uid", doc_type), uid)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        write!(f, "[at({}, \"{}\")]", self.path, value)
    }
}

/// Render the `q` parameter for a list of predicates
pub fn to_query(predicates: &[Predicate]) -> String {
    let mut q = String::from("[");
    for predicate in predicates {
        q.push_str(&predicate.to_string());
    }
    q.push(']');
    q
}
