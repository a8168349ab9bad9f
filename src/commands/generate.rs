//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateSummary, Generator};
use crate::SpaceTraveling;

/// Fetch posts from the CMS and write the static site
pub async fn run(site: &SpaceTraveling) -> Result<GenerateSummary> {
    let start = std::time::Instant::now();

    let generator = Generator::new(site)?;
    let summary = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(summary)
}
