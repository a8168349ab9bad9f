//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::SiteConfig;
use crate::CONFIG_FILE;

/// Write a default `_config.yml` into `target_dir`
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{} already exists in {:?}", CONFIG_FILE, target_dir);
    }

    let config = serde_yaml::to_string(&SiteConfig::default())?;
    let content = format!(
        "# Space Traveling configuration\n# The CMS access token may also be given with PRISMIC_ACCESS_TOKEN\n\n{}",
        config
    );
    fs::write(&config_path, content)?;

    Ok(())
}
