//! List site content

use anyhow::{Context, Result};
use std::fmt::Write;

use crate::content::unique_categories;
use crate::Blog;

/// List site content by type
pub async fn run(blog: &Blog, content_type: &str) -> Result<()> {
    print!("{}", render(blog, content_type).await?);
    Ok(())
}

/// Build the listing text for a content type
pub async fn render(blog: &Blog, content_type: &str) -> Result<String> {
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            let posts = blog
                .store
                .list_posts(None)
                .await
                .context("failed to fetch posts")?;
            writeln!(out, "Posts ({}):", posts.len())?;
            for post in posts {
                write!(
                    out,
                    "  {} - {} [#{}]",
                    post.created_at.format("%Y-%m-%d"),
                    post.title,
                    post.id
                )?;
                if let Some(category) = post.category.as_deref().filter(|c| !c.is_empty()) {
                    write!(out, " ({})", category)?;
                }
                writeln!(out)?;
            }
        }
        "page" | "pages" => {
            let pages = blog
                .store
                .list_pages()
                .await
                .context("failed to fetch pages")?;
            writeln!(out, "Pages ({}):", pages.len())?;
            for page in pages {
                writeln!(out, "  {} [/page/{}]", page.title, page.slug)?;
            }
        }
        "category" | "categories" => {
            let posts = blog
                .store
                .list_posts(None)
                .await
                .context("failed to fetch posts")?;
            let categories = unique_categories(&posts);
            writeln!(out, "Categories ({}):", categories.len())?;
            for category in categories {
                let count = posts
                    .iter()
                    .filter(|p| p.category.as_deref() == Some(category.as_str()))
                    .count();
                writeln!(out, "  {} ({})", category, count)?;
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, page, category",
                content_type
            );
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{PageInput, PostInput};

    async fn seeded_blog() -> Blog {
        let blog = Blog::in_memory(".").unwrap();
        for (title, category) in [("Halving", "Bitcoin"), ("Merge", "Ethereum"), ("ETF", "Bitcoin")] {
            let input = PostInput {
                title: title.to_string(),
                category: Some(category.to_string()),
                ..Default::default()
            };
            blog.store.create_post(&input, None).await.unwrap();
        }
        let page = PageInput {
            title: "About Us".to_string(),
            ..Default::default()
        };
        blog.store.create_page(&page, None).await.unwrap();
        blog
    }

    #[tokio::test]
    async fn test_list_posts() {
        let blog = seeded_blog().await;
        let out = render(&blog, "post").await.unwrap();
        assert!(out.starts_with("Posts (3):\n"));
        assert!(out.contains("ETF [#3] (Bitcoin)"));
    }

    #[tokio::test]
    async fn test_list_pages_and_categories() {
        let blog = seeded_blog().await;
        let out = render(&blog, "pages").await.unwrap();
        assert!(out.contains("About Us [/page/about-us]"));

        let out = render(&blog, "category").await.unwrap();
        assert!(out.contains("Bitcoin (2)"));
        assert!(out.contains("Ethereum (1)"));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let blog = seeded_blog().await;
        assert!(render(&blog, "tags").await.is_err());
    }
}
