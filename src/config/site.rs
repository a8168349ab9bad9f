//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // Directory
    pub public_dir: String,

    // Content source
    #[serde(default)]
    pub cms: CmsConfig,

    // Hosting
    #[serde(default)]
    pub revalidate: RevalidateConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Space Traveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
            public_dir: "public".to_string(),
            cms: CmsConfig::default(),
            revalidate: RevalidateConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Parse the configured timezone, falling back to UTC when unset
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        if self.timezone.trim().is_empty() {
            return Ok(chrono_tz::UTC);
        }
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone {:?}: {}", self.timezone, e))
    }
}

/// Headless CMS connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: u32,
    /// Ordering expression, e.g. `[document.first_publication_date desc]`.
    /// `None` leaves ordering to the CMS default.
    pub orderings: Option<String>,
    pub timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 2,
            orderings: Some("[document.first_publication_date desc]".to_string()),
            timeout_secs: 30,
        }
    }
}

impl CmsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Freshness windows for hosted snapshots, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevalidateConfig {
    pub index: u64,
    pub post: u64,
}

impl Default for RevalidateConfig {
    fn default() -> Self {
        Self {
            index: 1800,
            post: 1800,
        }
    }
}

impl RevalidateConfig {
    pub fn index_window(&self) -> Duration {
        Duration::from_secs(self.index)
    }

    pub fn post_window(&self) -> Duration {
        Duration::from_secs(self.post)
    }
}
