//! Structured rich text and its HTML serialization
//!
//! The CMS delivers formatted content as a list of blocks, each carrying
//! plain text plus a list of styled ranges ("spans"). Span offsets count
//! UTF-16 code units, so they are mapped onto chars while rendering.

use serde::{Deserialize, Serialize};

use super::post::{post_path, Dimensions};
use super::reading_time::count_words;

/// An ordered list of rich-text blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(Vec<RichTextBlock>);

/// One block of rich text. Fields that do not apply to a kind are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,

    // image blocks
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,

    // embed blocks
    #[serde(default)]
    pub oembed: Option<Embed>,
}

fn default_kind() -> String {
    "paragraph".to_string()
}

/// A styled range over a block's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<SpanData>,
}

/// Payload of hyperlink and label spans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    pub link_type: Option<String>,
    pub url: Option<String>,
    pub target: Option<String>,
    pub uid: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub html: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub provider_name: Option<String>,
    pub embed_url: Option<String>,
}

impl RichTextBlock {
    /// A plain paragraph without spans
    pub fn paragraph(text: &str) -> Self {
        Self {
            kind: default_kind(),
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
            dimensions: None,
            oembed: None,
        }
    }

    fn list_tag(&self) -> Option<&'static str> {
        match self.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        }
    }
}

impl RichText {
    pub fn new(blocks: Vec<RichTextBlock>) -> Self {
        Self(blocks)
    }

    pub fn blocks(&self) -> &[RichTextBlock] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text of all blocks joined by single spaces
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .map(|b| b.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whitespace-delimited words over every block's text
    pub fn word_count(&self) -> usize {
        self.0.iter().map(|b| count_words(&b.text)).sum()
    }

    /// Serialize to HTML. The output is meant to be injected verbatim.
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        let mut open_list: Option<&'static str> = None;

        for block in &self.0 {
            let list = block.list_tag();
            if list != open_list {
                if let Some(tag) = open_list {
                    html.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list {
                    html.push_str(&format!("<{}>", tag));
                }
                open_list = list;
            }
            render_block(block, &mut html);
        }

        if let Some(tag) = open_list {
            html.push_str(&format!("</{}>", tag));
        }

        html
    }
}

fn render_block(block: &RichTextBlock, html: &mut String) {
    let tag = match block.kind.as_str() {
        "paragraph" => "p",
        "heading1" => "h1",
        "heading2" => "h2",
        "heading3" => "h3",
        "heading4" => "h4",
        "heading5" => "h5",
        "heading6" => "h6",
        "preformatted" => "pre",
        "list-item" | "o-list-item" => "li",
        "image" => {
            render_image(block, html);
            return;
        }
        "embed" => {
            render_embed(block, html);
            return;
        }
        other => {
            tracing::debug!("Skipping unsupported rich text block {:?}", other);
            return;
        }
    };

    html.push_str(&format!("<{}>", tag));
    html.push_str(&render_spans(&block.text, &block.spans));
    html.push_str(&format!("</{}>", tag));
}

fn render_image(block: &RichTextBlock, html: &mut String) {
    let Some(url) = block.url.as_deref() else {
        return;
    };
    html.push_str(r#"<p class="block-img"><img src=""#);
    html.push_str(&escape_html(url));
    html.push_str(r#"" alt=""#);
    html.push_str(&escape_html(block.alt.as_deref().unwrap_or("")));
    html.push('"');
    if let Some(d) = block.dimensions {
        html.push_str(&format!(r#" width="{}" height="{}""#, d.width, d.height));
    }
    html.push_str(" /></p>");
}

fn render_embed(block: &RichTextBlock, html: &mut String) {
    let Some(embed) = block.oembed.as_ref() else {
        return;
    };
    html.push_str(&format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">"#,
        escape_html(embed.embed_url.as_deref().unwrap_or("")),
        escape_html(embed.kind.as_deref().unwrap_or("")),
        escape_html(embed.provider_name.as_deref().unwrap_or("")),
    ));
    html.push_str(embed.html.as_deref().unwrap_or(""));
    html.push_str("</div>");
}

/// Render text with its spans as nested inline tags.
///
/// At every character the open-tag stack is made equal to the list of spans
/// covering that character; overlapping spans are closed and reopened so the
/// output is always well-formed.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let mut ordered: Vec<&Span> = spans.iter().filter(|s| s.start < s.end).collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<&Span> = Vec::new();
    let mut pos = 0;
    let mut chars = text.chars();

    loop {
        let next = chars.next();

        let active: Vec<&Span> = match next {
            Some(_) => ordered
                .iter()
                .copied()
                .filter(|s| s.start <= pos && pos < s.end)
                .collect(),
            None => Vec::new(),
        };

        let keep = stack
            .iter()
            .zip(active.iter())
            .take_while(|(a, b)| std::ptr::eq(**a, **b))
            .count();
        while stack.len() > keep {
            if let Some(span) = stack.pop() {
                out.push_str(&close_tag(span));
            }
        }
        for &span in &active[keep..] {
            out.push_str(&open_tag(span));
            stack.push(span);
        }

        match next {
            Some('\n') => out.push_str("<br />"),
            Some(c) => push_escaped(&mut out, c),
            None => break,
        }
        pos += next.map_or(0, char::len_utf16);
    }

    out
}

fn open_tag(span: &Span) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let data = span.data.clone().unwrap_or_default();
            let href = link_href(&data).unwrap_or_default();
            if data.target.is_some() {
                format!(
                    r#"<a href="{}" target="_blank" rel="noopener">"#,
                    escape_html(&href)
                )
            } else {
                format!(r#"<a href="{}">"#, escape_html(&href))
            }
        }
        "label" => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.label.as_deref())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, escape_html(label))
        }
        _ => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

/// Resolve a link span to an href. Document links point at post pages.
fn link_href(data: &SpanData) -> Option<String> {
    match data.link_type.as_deref() {
        Some("Document") => data.uid.as_deref().map(post_path),
        _ => data.url.clone(),
    }
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(c),
    }
}

/// Escape HTML special characters
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_escaped(&mut out, c);
    }
    out
}
