//! List posts straight from the CMS

use anyhow::Result;

use crate::cms::CmsClient;
use crate::listing::Listing;
use crate::SpaceTraveling;

/// Print the first page of posts, or every page with `all`
pub async fn run(site: &SpaceTraveling, all: bool) -> Result<()> {
    let client = CmsClient::new(&site.config.cms)?;
    let tz = site.config.tz()?;

    let mut listing = Listing::new(client.first_page().await?);
    if all {
        listing.load_all(&client).await?;
    }

    println!("Posts ({}):", listing.posts().len());
    for post in listing.posts() {
        let date = post
            .published_at
            .map(|d| d.with_timezone(&tz).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        println!("  {} - {} [{}]", date, post.title, post.uid);
    }

    if listing.has_more() {
        println!("More posts available, use --all to list them");
    }

    Ok(())
}
