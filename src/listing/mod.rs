//! Post listing with cursor-driven "load more" pagination
//!
//! A [`Listing`] starts from the first page of posts and grows by following
//! the CMS's next-page cursor. Posts are only ever appended; once the CMS
//! stops handing out a cursor the listing is exhausted and never fetches
//! again.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::cms::{CmsError, Cursor};
use crate::content::PostSummary;

/// One page of normalized posts plus the cursor to the page after it
#[derive(Debug, Clone, PartialEq)]
pub struct PostsPage {
    pub posts: Vec<PostSummary>,
    pub next_page: Option<Cursor>,
}

/// Something that can resolve a cursor into the next page of posts
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, cursor: &Cursor) -> Result<PostsPage, CmsError>;
}

/// Pagination state of a listing
#[derive(Debug, Clone, PartialEq)]
pub enum ListingState {
    /// More posts are available behind the cursor
    Idle(Cursor),
    /// A fetch of the cursor is in flight
    Fetching(Cursor),
    /// The CMS reported no further page
    Exhausted,
}

/// Append-only list of posts
#[derive(Debug, Clone)]
pub struct Listing {
    posts: Vec<PostSummary>,
    state: ListingState,
    /// uids in `posts`
    uids: HashSet<String>,
    /// Cursors already handed out for fetching
    fetched: HashSet<String>,
}

impl Listing {
    /// Seed a listing from its first page
    pub fn new(first: PostsPage) -> Self {
        let state = match first.next_page {
            Some(cursor) => ListingState::Idle(cursor),
            None => ListingState::Exhausted,
        };
        let mut listing = Self {
            posts: Vec::with_capacity(first.posts.len()),
            state,
            uids: HashSet::new(),
            fetched: HashSet::new(),
        };
        listing.append(first.posts);
        listing
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn state(&self) -> &ListingState {
        &self.state
    }

    /// Cursor of the next page, unless exhausted
    pub fn cursor(&self) -> Option<&Cursor> {
        match &self.state {
            ListingState::Idle(cursor) | ListingState::Fetching(cursor) => Some(cursor),
            ListingState::Exhausted => None,
        }
    }

    /// Whether a "load more" control should be offered
    pub fn has_more(&self) -> bool {
        !matches!(self.state, ListingState::Exhausted)
    }

    /// Move from `Idle` to `Fetching` and hand out the cursor to fetch.
    ///
    /// Returns `None` while another fetch is in flight or once exhausted.
    pub fn begin_fetch(&mut self) -> Option<Cursor> {
        match &self.state {
            ListingState::Idle(cursor) => {
                let cursor = cursor.clone();
                self.fetched.insert(cursor.as_str().to_string());
                self.state = ListingState::Fetching(cursor.clone());
                Some(cursor)
            }
            ListingState::Fetching(_) => {
                tracing::debug!("Ignoring load more while a fetch is in flight");
                None
            }
            ListingState::Exhausted => None,
        }
    }

    /// Append a fetched page and advance to its cursor.
    ///
    /// Returns the number of posts appended; a page arriving outside of a
    /// fetch is dropped. A cursor that was already fetched ends the listing.
    pub fn complete_fetch(&mut self, page: PostsPage) -> usize {
        if !matches!(self.state, ListingState::Fetching(_)) {
            tracing::warn!("Dropping page that arrived without a fetch in flight");
            return 0;
        }

        self.state = match page.next_page {
            Some(cursor) if self.fetched.contains(cursor.as_str()) => {
                tracing::warn!("Cursor {} was already fetched, stopping", cursor);
                ListingState::Exhausted
            }
            Some(cursor) => ListingState::Idle(cursor),
            None => ListingState::Exhausted,
        };
        self.append(page.posts)
    }

    /// Give up on the in-flight fetch; the same cursor can be retried
    pub fn abort_fetch(&mut self) {
        if let ListingState::Fetching(cursor) = &self.state {
            self.state = ListingState::Idle(cursor.clone());
        }
    }

    /// Fetch and append the next page, if any
    pub async fn load_more<S>(&mut self, source: &S) -> Result<usize, CmsError>
    where
        S: PageSource + ?Sized,
    {
        let Some(cursor) = self.begin_fetch() else {
            return Ok(0);
        };

        match source.fetch_page(&cursor).await {
            Ok(page) => Ok(self.complete_fetch(page)),
            Err(e) => {
                self.abort_fetch();
                Err(e)
            }
        }
    }

    /// Follow cursors until the listing is exhausted
    pub async fn load_all<S>(&mut self, source: &S) -> Result<usize, CmsError>
    where
        S: PageSource + ?Sized,
    {
        let mut total = 0;
        while self.has_more() {
            total += self.load_more(source).await?;
        }
        Ok(total)
    }

    /// Append posts whose uid is not listed yet
    fn append(&mut self, posts: Vec<PostSummary>) -> usize {
        let before = self.posts.len();
        for post in posts {
            if !self.uids.insert(post.uid.clone()) {
                tracing::debug!("Skipping duplicate post {}", post.uid);
                continue;
            }
            self.posts.push(post);
        }
        self.posts.len() - before
    }
}
