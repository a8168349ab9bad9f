//! Post models

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::rich_text::RichText;

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    /// Document uid, also the URL slug
    pub uid: String,

    /// First publication date, when the CMS reports one
    pub published_at: Option<DateTime<FixedOffset>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A fully resolved post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,

    /// Header image; empty image fields come through as `None`
    pub banner: Option<Banner>,

    /// Content sections in CMS order
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Banner {
    pub url: String,
    pub alt: Option<String>,
    pub dimensions: Option<Dimensions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A heading followed by a rich-text body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: RichText,
}

impl PostDetail {
    /// Total whitespace-delimited words across all content bodies
    pub fn word_count(&self) -> usize {
        self.content.iter().map(|block| block.body.word_count()).sum()
    }

    /// Estimated minutes to read the post
    pub fn reading_time(&self) -> u32 {
        super::reading_time::minutes_for_words(self.word_count())
    }

    /// Strip down to the listing shape
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            uid: self.uid.clone(),
            published_at: self.published_at,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }
}

/// Path of a post page relative to the site root
pub fn post_path(uid: &str) -> String {
    format!("/post/{}", uid)
}

/// Whether a uid is safe to use as a single URL path segment and directory name
pub fn is_valid_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && uid
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
