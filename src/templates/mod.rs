//! Built-in Space Traveling templates using Tera template engine
//!
//! Templates and static assets are embedded in the binary. HTML escaping is
//! left on; rich-text bodies are the only values marked `safe`.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Stylesheet served as `/style.css`
pub const STYLE_CSS: &str = include_str!("space/assets/style.css");

/// Header logo served as `/logo.svg`
pub const LOGO_SVG: &str = include_str!("space/assets/logo.svg");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("space/layout.html")),
            ("index.html", include_str!("space/index.html")),
            ("post.html", include_str!("space/post.html")),
            ("loading.html", include_str!("space/loading.html")),
            ("not_found.html", include_str!("space/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("space/partials/header.html"),
            ),
            (
                "partials/post_list.html",
                include_str!("space/partials/post_list.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummaryData {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: Option<String>,
    pub datetime: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub uid: String,
    pub title: String,
    pub author: String,
    pub date: Option<String>,
    pub datetime: Option<String>,
    pub reading_time: u32,
    pub banner: Option<BannerData>,
    pub sections: Vec<SectionData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BannerData {
    pub url: String,
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    /// Trusted HTML rendered from rich text
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteData {
        SiteData {
            title: "Space Traveling".to_string(),
            language: "pt-BR".to_string(),
        }
    }

    #[test]
    fn test_templates_parse() {
        assert!(TemplateRenderer::new().is_ok());
    }

    #[test]
    fn test_loading_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        let html = renderer.render("loading.html", &context).unwrap();
        assert!(html.contains("Carregando..."));
        assert!(html.contains(r#"http-equiv="refresh""#));
    }

    #[test]
    fn test_section_html_is_trusted_but_heading_is_escaped() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert(
            "post",
            &PostPageData {
                uid: "p1".to_string(),
                title: "Title".to_string(),
                author: "Ana".to_string(),
                date: None,
                datetime: None,
                reading_time: 3,
                banner: None,
                sections: vec![SectionData {
                    heading: "<b>A</b>".to_string(),
                    html: "<p><strong>body</strong></p>".to_string(),
                }],
            },
        );
        let html = renderer.render("post.html", &context).unwrap();
        assert!(html.contains("<p><strong>body</strong></p>"));
        assert!(html.contains("&lt;b&gt;A&lt;"));
        assert!(html.contains("3 min"));
        assert!(!html.contains("<time"));
    }
}
