//! Print the generated sitemap.xml and robots.txt

use anyhow::Result;

use crate::Blog;

/// Print sitemap.xml built from the current content
pub async fn run(blog: &Blog) -> Result<()> {
    let xml = blog.sitemap().await?;
    print!("{}", xml);
    tracing::info!("Generated sitemap for {}", blog.config.base_url());
    Ok(())
}

/// Print robots.txt
pub fn robots(blog: &Blog) -> Result<()> {
    print!("{}", blog.robots());
    Ok(())
}
