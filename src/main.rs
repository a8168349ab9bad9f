//! CLI entry point for space-traveling

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use space_traveling::SpaceTraveling;

#[derive(Parser)]
#[command(name = "space-traveling")]
#[command(version)]
#[command(about = "A blog front-end that renders posts from a headless CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// CMS access token, overriding the one in _config.yml
    #[arg(long, global = true, env = "PRISMIC_ACCESS_TOKEN", hide_env_values = true)]
    cms_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate,

    /// Generate, then host the site with background revalidation
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Clean the public folder and cache
    Clean,

    /// List posts from the CMS
    List {
        /// Follow every page instead of the first one
        #[arg(short, long)]
        all: bool,
    },

    /// Display version information
    Version,
}

/// Load the site, letting the command line token win over the config file
fn load_site(base_dir: &Path, cms_token: Option<String>) -> Result<SpaceTraveling> {
    let mut config = SpaceTraveling::load_config(base_dir)?;
    if let Some(token) = cms_token.filter(|t| !t.is_empty()) {
        config.cms.access_token = Some(token);
    }
    Ok(SpaceTraveling::with_config(base_dir, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "space_traveling=debug,info"
    } else {
        "space_traveling=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to read current directory")?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            space_traveling::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::Generate => {
            let site = load_site(&base_dir, cli.cms_token)?;
            tracing::info!("Generating static files...");
            let summary = site.generate().await?;
            println!(
                "Generated successfully! {} written, {} unchanged, {} removed",
                summary.written, summary.unchanged, summary.removed
            );
        }

        Commands::Server { port, ip, open } => {
            let site = load_site(&base_dir, cli.cms_token)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            space_traveling::server::start(&site, &ip, port, open).await?;
        }

        Commands::Clean => {
            let site = load_site(&base_dir, cli.cms_token)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { all } => {
            let site = load_site(&base_dir, cli.cms_token)?;
            space_traveling::commands::list::run(&site, all).await?;
        }

        Commands::Version => {
            println!("space-traveling version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
