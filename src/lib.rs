//! space-traveling: a static blog front-end backed by a headless CMS
//!
//! Posts are fetched from the CMS at build time and rendered with embedded
//! Tera templates. The built-in server hosts the snapshots, revalidates them
//! in the background and renders posts that were not pre-generated on their
//! first request.

pub mod cache;
pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod listing;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Configuration file at the site root
pub const CONFIG_FILE: &str = "_config.yml";

/// The main application
#[derive(Debug, Clone)]
pub struct SpaceTraveling {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl SpaceTraveling {
    /// Create a new instance from a directory, reading its `_config.yml`
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config = Self::load_config(base_dir.as_ref())?;
        Ok(Self::with_config(base_dir, config))
    }

    /// Create a new instance with an already resolved configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Read `_config.yml` from `base_dir`, or defaults when there is none
    pub fn load_config(base_dir: &Path) -> Result<config::SiteConfig> {
        let config_path = base_dir.join(CONFIG_FILE);
        if config_path.exists() {
            config::SiteConfig::load(&config_path)
        } else {
            tracing::debug!("No {} in {:?}, using defaults", CONFIG_FILE, base_dir);
            Ok(config::SiteConfig::default())
        }
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<generator::GenerateSummary> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
