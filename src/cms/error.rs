//! Errors raised by the CMS adapter

use thiserror::Error;

/// Failure modes of a CMS round trip.
#[derive(Debug, Error)]
pub enum CmsError {
    /// Network or TLS failure, timeout, or an unreadable body.
    #[error("CMS request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The CMS answered with a non-success status.
    #[error("CMS returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// No document of the given type carries this uid.
    #[error("no {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },

    /// The API root did not advertise a master ref.
    #[error("CMS API did not report a master ref")]
    NoMasterRef,

    /// A document is missing a required field or has the wrong shape.
    #[error("malformed document {id}: {reason}")]
    Malformed { id: String, reason: String },

    /// A next-page cursor that is not an absolute URL.
    #[error("invalid cursor {cursor:?}: {source}")]
    InvalidCursor {
        cursor: String,
        #[source]
        source: url::ParseError,
    },

    /// The configured endpoint is not a valid URL.
    #[error("invalid CMS endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

impl CmsError {
    pub fn malformed(id: &str, reason: impl Into<String>) -> Self {
        CmsError::Malformed {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CmsError::NotFound { .. })
    }
}
