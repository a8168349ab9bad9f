//! Content module - post models, rich text and reading time

mod post;
pub mod reading_time;
pub mod rich_text;

pub use post::{is_valid_uid, post_path, Banner, ContentBlock, Dimensions, PostDetail, PostSummary};
pub use rich_text::{RichText, RichTextBlock};
