//! Generator module - renders pages from CMS content using built-in Tera templates

use anyhow::{Context as _, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tera::Context;

use crate::cache::{self, CacheDb};
use crate::cms::{CmsClient, Cursor};
use crate::content::{post_path, PostDetail, PostSummary};
use crate::helpers::{date_xml, display_date};
use crate::listing::{Listing, PageSource};
use crate::templates::{
    BannerData, PostPageData, PostSummaryData, SectionData, SiteData, TemplateRenderer, LOGO_SVG,
    STYLE_CSS,
};
use crate::SpaceTraveling;

/// Route of the listing page
pub const INDEX_ROUTE: &str = "/";

/// A rendered page and where it lives
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub route: String,
    pub html: String,
}

/// Outcome of a full generation
#[derive(Debug, Clone, Default)]
pub struct GenerateSummary {
    /// Every page rendered in this run, listing first
    pub pages: Vec<RenderedPage>,
    pub written: usize,
    pub unchanged: usize,
    pub removed: usize,
}

/// Next page of the listing, as answered to "load more"
#[derive(Debug, Clone, Serialize)]
pub struct MorePosts {
    pub html: String,
    pub next_page: Option<String>,
}

/// Page renderer bound to one site and its CMS
pub struct Generator {
    site: SpaceTraveling,
    client: CmsClient,
    renderer: TemplateRenderer,
    tz: chrono_tz::Tz,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &SpaceTraveling) -> Result<Self> {
        let client = CmsClient::new(&site.config.cms).context("failed to set up CMS client")?;
        let renderer = TemplateRenderer::new()?;
        let tz = site.config.tz()?;

        Ok(Self {
            site: site.clone(),
            client,
            renderer,
            tz,
        })
    }

    pub fn site(&self) -> &SpaceTraveling {
        &self.site
    }

    pub fn client(&self) -> &CmsClient {
        &self.client
    }

    /// Fetch the first page of posts into a fresh listing
    pub async fn first_listing(&self) -> Result<Listing> {
        let first = self
            .client
            .first_page()
            .await
            .context("failed to fetch posts")?;
        Ok(Listing::new(first))
    }

    /// Render the listing page
    pub fn render_listing(&self, listing: &Listing) -> Result<String> {
        let posts: Vec<PostSummaryData> =
            listing.posts().iter().map(|p| self.summary_data(p)).collect();

        let mut context = self.base_context();
        context.insert("posts", &posts);
        context.insert("next_page", &listing.cursor().map(Cursor::as_str));

        self.renderer.render("index.html", &context)
    }

    /// Fetch and render the listing page
    pub async fn render_index(&self) -> Result<String> {
        let listing = self.first_listing().await?;
        self.render_listing(&listing)
    }

    /// Render a resolved post
    pub fn render_post_page(&self, post: &PostDetail) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", &self.post_data(post));
        self.renderer.render("post.html", &context)
    }

    /// Fetch and render a post; `None` when the CMS has no such post
    pub async fn render_post(&self, uid: &str) -> Result<Option<String>> {
        match self.client.post_by_uid(uid).await {
            Ok(post) => self.render_post_page(&post).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to fetch post {:?}", uid)),
        }
    }

    /// Fetch the page behind `cursor` and render its entries as a fragment.
    ///
    /// Posts whose uid is in `shown` are already on the reader's page and
    /// are left out.
    pub async fn render_more(&self, cursor: &Cursor, shown: &HashSet<String>) -> Result<MorePosts> {
        let page = self
            .client
            .fetch_page(cursor)
            .await
            .context("failed to fetch next page")?;

        let posts: Vec<PostSummaryData> = page
            .posts
            .iter()
            .filter(|p| !shown.contains(&p.uid))
            .map(|p| self.summary_data(p))
            .collect();
        let mut context = Context::new();
        context.insert("posts", &posts);
        let html = self.renderer.render("partials/post_list.html", &context)?;

        Ok(MorePosts {
            html,
            next_page: page.next_page.map(|c| c.to_string()),
        })
    }

    /// Placeholder served while a page is generated on demand
    pub fn render_loading(&self) -> Result<String> {
        self.renderer.render("loading.html", &self.base_context())
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.renderer.render("not_found.html", &self.base_context())
    }

    /// Render the listing and every pre-generated post, then write what changed
    pub async fn generate(&self) -> Result<GenerateSummary> {
        let public_dir = &self.site.public_dir;
        fs::create_dir_all(public_dir)?;
        write_assets(public_dir)?;

        let listing = self.first_listing().await?;
        let static_paths: Vec<String> = listing.posts().iter().map(|p| p.uid.clone()).collect();
        tracing::info!("Pre-generating {} posts", static_paths.len());

        let mut pages = vec![RenderedPage {
            route: INDEX_ROUTE.to_string(),
            html: self.render_listing(&listing)?,
        }];

        for uid in &static_paths {
            match self.render_post(uid).await? {
                Some(html) => pages.push(RenderedPage {
                    route: post_path(uid),
                    html,
                }),
                None => tracing::warn!("Post {} disappeared while generating", uid),
            }
        }

        let mut summary = self.write_pages(&pages)?;
        summary.pages = pages;
        Ok(summary)
    }

    /// Write pages whose content changed since the last run and drop stale ones
    fn write_pages(&self, pages: &[RenderedPage]) -> Result<GenerateSummary> {
        let base_dir = &self.site.base_dir;
        let public_dir = &self.site.public_dir;
        let mut db = CacheDb::load(base_dir);
        let mut summary = GenerateSummary::default();

        for page in pages {
            let hash = cache::hash_content(&page.html);
            if db.is_unchanged(&page.route, hash, public_dir) {
                tracing::debug!("Unchanged: {}", page.route);
                summary.unchanged += 1;
                continue;
            }

            let output_path = output_path_for(&page.route);
            let dest = public_dir.join(&output_path);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, &page.html)
                .with_context(|| format!("failed to write {}", dest.display()))?;
            db.record(&page.route, hash, &output_path);
            summary.written += 1;
        }

        let routes: Vec<String> = pages.iter().map(|p| p.route.clone()).collect();
        for (route, entry) in db.retain_routes(&routes) {
            let stale = public_dir.join(&entry.output_path);
            if stale.exists() {
                fs::remove_file(&stale)?;
                if let Some(parent) = stale.parent().filter(|p| *p != public_dir.as_path()) {
                    // only succeeds when the post directory is now empty
                    let _ = fs::remove_dir(parent);
                }
            }
            tracing::info!("Removed: {}", route);
            summary.removed += 1;
        }

        db.save(base_dir)?;
        tracing::info!(
            "Wrote {} pages ({} unchanged, {} removed)",
            summary.written,
            summary.unchanged,
            summary.removed
        );

        Ok(summary)
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteData {
                title: self.site.config.title.clone(),
                language: self.site.config.language.clone(),
            },
        );
        context
    }

    fn format_date(
        &self,
        date: Option<&chrono::DateTime<chrono::FixedOffset>>,
    ) -> (Option<String>, Option<String>) {
        match date {
            Some(date) => {
                let local = date.with_timezone(&self.tz);
                (
                    Some(display_date(&local, &self.site.config.language)),
                    Some(date_xml(&local)),
                )
            }
            None => (None, None),
        }
    }

    fn summary_data(&self, post: &PostSummary) -> PostSummaryData {
        let (date, datetime) = self.format_date(post.published_at.as_ref());
        PostSummaryData {
            uid: post.uid.clone(),
            path: post_path(&post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date,
            datetime,
        }
    }

    fn post_data(&self, post: &PostDetail) -> PostPageData {
        let (date, datetime) = self.format_date(post.published_at.as_ref());
        PostPageData {
            uid: post.uid.clone(),
            title: post.title.clone(),
            author: post.author.clone(),
            date,
            datetime,
            reading_time: post.reading_time(),
            banner: post.banner.as_ref().map(|b| BannerData {
                url: b.url.clone(),
                alt: b.alt.clone().unwrap_or_default(),
                width: b.dimensions.map(|d| d.width),
                height: b.dimensions.map(|d| d.height),
            }),
            sections: post
                .content
                .iter()
                .map(|block| SectionData {
                    heading: block.heading.clone(),
                    html: block.body.as_html(),
                })
                .collect(),
        }
    }
}

/// File a route is written to, relative to the public dir
pub fn output_path_for(route: &str) -> String {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        "index.html".to_string()
    } else {
        format!("{}/index.html", trimmed)
    }
}

/// Copy the embedded stylesheet and logo
fn write_assets(public_dir: &Path) -> Result<()> {
    fs::write(public_dir.join("style.css"), STYLE_CSS)?;
    fs::write(public_dir.join("logo.svg"), LOGO_SVG)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::Cursor;
    use crate::config::SiteConfig;
    use crate::content::{Banner, ContentBlock, RichText, RichTextBlock};
    use crate::listing::PostsPage;
    use chrono::DateTime;

    fn generator(config: SiteConfig) -> Generator {
        let site = SpaceTraveling::with_config("/tmp/space-traveling-test", config);
        Generator::new(&site).unwrap()
    }

    fn summary(uid: &str, date: Option<&str>) -> PostSummary {
        PostSummary {
            uid: uid.to_string(),
            published_at: date.map(|d| DateTime::parse_from_rfc3339(d).unwrap()),
            title: format!("Post {}", uid),
            subtitle: "Subtitle".to_string(),
            author: "Joseph Oliveira".to_string(),
        }
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(output_path_for("/"), "index.html");
        assert_eq!(output_path_for("/post/hello"), "post/hello/index.html");
    }

    #[test]
    fn test_listing_with_more_posts() {
        let gen = generator(SiteConfig::default());
        let listing = Listing::new(PostsPage {
            posts: vec![summary("p1", Some("2021-03-15T19:25:28+00:00"))],
            next_page: Some(Cursor::parse("https://cms/page2").unwrap()),
        });

        let html = gen.render_listing(&listing).unwrap();
        assert!(html.contains(r#"href="/post/p1""#));
        assert!(html.contains("Post p1"));
        assert!(html.contains("15 mar 2021"));
        assert!(html.contains(r#"id="load-more""#));
        assert!(html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_listing_script_sends_shown_uids_and_restores_label() {
        let gen = generator(SiteConfig::default());
        let listing = Listing::new(PostsPage {
            posts: vec![summary("p1", None)],
            next_page: Some(Cursor::parse("https://cms/page2").unwrap()),
        });

        let html = gen.render_listing(&listing).unwrap();
        assert!(html.contains(r#"data-uid="p1""#));
        assert!(html.contains("'&shown='"));
        assert!(html.contains("button.textContent = label;"));
    }

    #[test]
    fn test_exhausted_listing_has_no_load_more() {
        let gen = generator(SiteConfig::default());
        let listing = Listing::new(PostsPage {
            posts: vec![summary("p1", None)],
            next_page: None,
        });

        let html = gen.render_listing(&listing).unwrap();
        assert!(html.contains("Post p1"));
        assert!(!html.contains("load-more"));
        assert!(!html.contains("<time"));
    }

    #[test]
    fn test_dates_use_site_timezone() {
        let gen = generator(SiteConfig::default());
        // still March 31st in São Paulo
        let (date, datetime) = gen.format_date(Some(
            &DateTime::parse_from_rfc3339("2021-04-01T01:00:00+00:00").unwrap(),
        ));
        assert_eq!(date.as_deref(), Some("31 mar 2021"));
        assert_eq!(datetime.as_deref(), Some("2021-03-31T22:00:00-03:00"));
    }

    #[test]
    fn test_post_page() {
        let gen = generator(SiteConfig::default());
        let post = PostDetail {
            uid: "p1".to_string(),
            published_at: None,
            title: "Criando um app CRA do zero".to_string(),
            subtitle: String::new(),
            author: "Danilo Vieira".to_string(),
            banner: Some(Banner {
                url: "https://images.prismic.io/banner.png".to_string(),
                alt: None,
                dimensions: None,
            }),
            content: vec![
                ContentBlock {
                    heading: "Proin et varius".to_string(),
                    body: RichText::new(vec![RichTextBlock::paragraph("hello world")]),
                },
                ContentBlock {
                    heading: "Cras laoreet".to_string(),
                    body: RichText::new(vec![RichTextBlock::paragraph("one two three")]),
                },
            ],
        };

        let html = gen.render_post_page(&post).unwrap();
        assert!(html.contains("Criando um app CRA do zero"));
        assert!(html.contains("1 min"));
        assert!(html.contains("<p>hello world</p>"));
        assert!(html.contains("image-container"));

        let first = html.find("Proin et varius").unwrap();
        let second = html.find("Cras laoreet").unwrap();
        assert!(first < second);
    }
}
