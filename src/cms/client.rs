//! HTTP client for the CMS REST API

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::document::{ApiInfo, Cursor, RawDocument, SearchResponse};
use super::normalize;
use super::predicate::{to_query, Predicate};
use super::CmsError;
use crate::config::CmsConfig;
use crate::content::PostDetail;
use crate::listing::{PageSource, PostsPage};

const ACCESS_TOKEN: &str = "access_token";

/// Options of a document search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: u32,
    pub page: Option<u32>,
    pub orderings: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page_size: 20,
            page: None,
            orderings: None,
        }
    }
}

/// Read-only client bound to one CMS repository
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    endpoint: Url,
    config: CmsConfig,
}

impl CmsClient {
    /// Create a client from an immutable connection config
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|source| CmsError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            source,
        })?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("space-traveling/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            endpoint,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    /// Whether a cursor points at this client's CMS host
    pub fn owns(&self, cursor: &Cursor) -> bool {
        let url = cursor.as_url();
        url.scheme() == self.endpoint.scheme()
            && url.host_str() == self.endpoint.host_str()
            && url.port_or_known_default() == self.endpoint.port_or_known_default()
    }

    /// Resolve the ref of the currently published content
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn master_ref(&self) -> Result<String, CmsError> {
        let info: ApiInfo = self.get_json(self.endpoint.clone(), &[]).await?;
        info.master_ref()
            .map(str::to_string)
            .ok_or(CmsError::NoMasterRef)
    }

    /// Search documents matching all `predicates`
    #[instrument(skip(self, predicates), fields(endpoint = %self.endpoint))]
    pub async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse, CmsError> {
        let reference = self.master_ref().await?;

        let mut params = vec![
            ("ref", reference),
            ("q", to_query(predicates)),
            ("pageSize", options.page_size.to_string()),
        ];
        if let Some(page) = options.page {
            params.push(("page", page.to_string()));
        }
        if let Some(orderings) = &options.orderings {
            params.push(("orderings", orderings.clone()));
        }
        if let Some(token) = &self.config.access_token {
            params.push((ACCESS_TOKEN, token.clone()));
        }

        let response: SearchResponse = self.get_json(self.search_url(), &params).await?;
        debug!(
            results = response.results.len(),
            page = response.page,
            total_pages = response.total_pages,
            "CMS query done"
        );
        Ok(response)
    }

    /// Fetch the single document of `doc_type` carrying `uid`
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<RawDocument, CmsError> {
        let options = QueryOptions {
            page_size: 1,
            ..QueryOptions::default()
        };
        let response = self
            .query(&[Predicate::uid(doc_type, uid)], &options)
            .await?;

        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }

    /// Follow a next-page URL exactly as the CMS handed it out
    #[instrument(skip(self, cursor), fields(cursor = %cursor))]
    pub async fn fetch_cursor(&self, cursor: &Cursor) -> Result<SearchResponse, CmsError> {
        let mut url = cursor.as_url().clone();
        if let Some(token) = &self.config.access_token {
            if !url.query_pairs().any(|(key, _)| key == ACCESS_TOKEN) {
                url.query_pairs_mut().append_pair(ACCESS_TOKEN, token);
            }
        }
        self.get_json(url, &[]).await
    }

    /// Options used for the post listing
    pub fn listing_options(&self) -> QueryOptions {
        QueryOptions {
            page_size: self.config.page_size,
            page: None,
            orderings: self.config.orderings.clone(),
        }
    }

    /// First page of posts
    pub async fn first_page(&self) -> Result<PostsPage, CmsError> {
        let response = self
            .query(
                &[Predicate::document_type(&self.config.document_type)],
                &self.listing_options(),
            )
            .await?;
        normalize::page(&response).map(scrub_cursor)
    }

    /// A single post by slug
    pub async fn post_by_uid(&self, uid: &str) -> Result<PostDetail, CmsError> {
        let doc = self.get_by_uid(&self.config.document_type, uid).await?;
        normalize::detail(&doc)
    }

    fn search_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("documents").push("search");
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, CmsError> {
        let mut request = self.http.get(url.clone());
        if !params.is_empty() {
            request = request.query(params);
        }
        debug!(%url, "CMS request");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PageSource for CmsClient {
    async fn fetch_page(&self, cursor: &Cursor) -> Result<PostsPage, CmsError> {
        let response = self.fetch_cursor(cursor).await?;
        normalize::page(&response).map(scrub_cursor)
    }
}

/// Cursors end up in public HTML, so they never carry the access token.
/// `fetch_cursor` adds it back.
fn scrub_cursor(mut page: PostsPage) -> PostsPage {
    page.next_page = page.next_page.map(|c| c.without_param(ACCESS_TOKEN));
    page
}
