//! Hosting server with stale-while-revalidate snapshots
//!
//! The listing and pre-generated posts are served from memory and re-rendered
//! in the background once their window has passed. Posts that were not
//! pre-generated answer a loading page on first request while they render.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::{RenderCache, Resolution};
use crate::cms::Cursor;
use crate::content::{is_valid_uid, post_path};
use crate::generator::{Generator, RenderedPage, INDEX_ROUTE};
use crate::SpaceTraveling;

/// A route the server knows how to render
#[derive(Debug, Clone, PartialEq, Eq)]
enum Page {
    Index,
    Post(String),
}

impl Page {
    fn route(&self) -> String {
        match self {
            Page::Index => INDEX_ROUTE.to_string(),
            Page::Post(uid) => post_path(uid),
        }
    }
}

/// Server state
pub struct ServerState {
    generator: Generator,
    cache: RenderCache,
}

impl ServerState {
    pub fn new(generator: Generator) -> Self {
        Self {
            generator,
            cache: RenderCache::new(),
        }
    }

    /// Preload snapshots rendered by `generate`
    pub async fn seed(&self, pages: Vec<RenderedPage>) {
        for page in pages {
            self.cache.store(&page.route, page.html).await;
        }
    }

    fn window(&self, page: &Page) -> Duration {
        let revalidate = &self.generator.site().config.revalidate;
        match page {
            Page::Index => revalidate.index_window(),
            Page::Post(_) => revalidate.post_window(),
        }
    }

    /// Render `page` into the cache. The caller must hold the claim.
    async fn render(&self, page: &Page) -> Result<Option<String>> {
        let route = page.route();
        let rendered = match page {
            Page::Index => self.generator.render_index().await.map(Some),
            Page::Post(uid) => self.generator.render_post(uid).await,
        };

        match rendered {
            Ok(Some(html)) => {
                self.cache.store(&route, html.clone()).await;
                tracing::debug!("Rendered {}", route);
                Ok(Some(html))
            }
            Ok(None) => {
                self.cache.store_not_found(&route, self.window(page)).await;
                tracing::debug!("No content for {}", route);
                Ok(None)
            }
            Err(e) => {
                self.cache.release(&route).await;
                Err(e)
            }
        }
    }

    fn loading(&self) -> Response {
        match self.generator.render_loading() {
            Ok(html) => Html(html).into_response(),
            Err(e) => internal_error(e),
        }
    }

    fn not_found(&self) -> Response {
        match self.generator.render_not_found() {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => internal_error(e),
        }
    }
}

/// Build the router over `state`
pub fn router(state: Arc<ServerState>) -> Router {
    let public_dir = state.generator.site().public_dir.clone();

    Router::new()
        .route("/", get(index_handler))
        .route("/post/:slug", get(post_handler))
        .route("/posts/more", get(more_handler))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Generate the site, then host it
pub async fn start(site: &SpaceTraveling, ip: &str, port: u16, open: bool) -> Result<()> {
    let generator = Generator::new(site)?;
    let summary = generator.generate().await?;

    let state = Arc::new(ServerState::new(generator));
    state.seed(summary.pages).await;
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let page = Page::Index;
    match state.cache.resolve(&page.route(), state.window(&page)).await {
        Resolution::Cached { html, refresh } => {
            if refresh {
                spawn_render(state.clone(), page);
            }
            Html(html).into_response()
        }
        // the listing has no fallback page, so the first render blocks
        Resolution::Claimed => match state.render(&page).await {
            Ok(Some(html)) => Html(html).into_response(),
            Ok(None) => state.not_found(),
            Err(e) => bad_gateway(e),
        },
        Resolution::Pending => state.loading(),
        Resolution::NotFound => state.not_found(),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    if !is_valid_uid(&slug) {
        return state.not_found();
    }

    let page = Page::Post(slug);
    match state.cache.resolve(&page.route(), state.window(&page)).await {
        Resolution::Cached { html, refresh } => {
            if refresh {
                spawn_render(state.clone(), page);
            }
            Html(html).into_response()
        }
        Resolution::Claimed => {
            spawn_render(state.clone(), page);
            state.loading()
        }
        Resolution::Pending => state.loading(),
        Resolution::NotFound => state.not_found(),
    }
}

#[derive(Debug, Deserialize)]
struct MoreQuery {
    cursor: String,
    /// Comma-separated uids the page already lists
    #[serde(default)]
    shown: String,
}

impl MoreQuery {
    fn shown(&self) -> HashSet<String> {
        self.shown
            .split(',')
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .map(str::to_string)
            .collect()
    }
}

async fn more_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<MoreQuery>,
) -> Response {
    let cursor = match Cursor::parse(&query.cursor) {
        Ok(cursor) if state.generator.client().owns(&cursor) => cursor,
        Ok(cursor) => {
            tracing::warn!("Rejected foreign cursor {}", cursor);
            return (StatusCode::BAD_REQUEST, "Invalid cursor").into_response();
        }
        Err(e) => {
            tracing::debug!("{}", e);
            return (StatusCode::BAD_REQUEST, "Invalid cursor").into_response();
        }
    };

    match state.generator.render_more(&cursor, &query.shown()).await {
        Ok(more) => Json(more).into_response(),
        Err(e) => bad_gateway(e),
    }
}

fn spawn_render(state: Arc<ServerState>, page: Page) {
    tokio::spawn(async move {
        if let Err(e) = state.render(&page).await {
            tracing::error!("Failed to render {}: {:#}", page.route(), e);
        }
    });
}

fn bad_gateway(e: anyhow::Error) -> Response {
    tracing::error!("{:#}", e);
    (StatusCode::BAD_GATEWAY, "Failed to load content").into_response()
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!("{:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
