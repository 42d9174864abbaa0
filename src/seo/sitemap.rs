//! sitemap.xml and robots.txt

use chrono::{DateTime, Utc};
use std::fmt;

use crate::content::{Page, Post};
use crate::helpers::{escape_xml, full_url, iso_millis, page_path, post_path};

/// How often a URL is expected to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
        })
    }
}

/// One `<url>` entry
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: DateTime<Utc>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

/// Fixed site sections: path, change frequency, priority
const STATIC_ENTRIES: [(&str, ChangeFreq, f32); 4] = [
    ("/", ChangeFreq::Daily, 1.0),
    ("/blog", ChangeFreq::Daily, 0.9),
    ("/contact", ChangeFreq::Monthly, 0.7),
    ("/privacy", ChangeFreq::Yearly, 0.5),
];

/// All sitemap entries: the static sections, then posts, then pages
pub fn sitemap_urls(
    base_url: &str,
    now: DateTime<Utc>,
    posts: &[Post],
    pages: &[Page],
) -> Vec<SitemapUrl> {
    let statics = STATIC_ENTRIES
        .iter()
        .map(|(path, changefreq, priority)| SitemapUrl {
            loc: full_url(base_url, path),
            lastmod: now,
            changefreq: *changefreq,
            priority: *priority,
        });

    let posts = posts.iter().map(|post| SitemapUrl {
        loc: full_url(base_url, &post_path(post.id)),
        lastmod: post.last_modified(),
        changefreq: ChangeFreq::Weekly,
        priority: 0.8,
    });

    let pages = pages.iter().map(|page| SitemapUrl {
        loc: full_url(base_url, &page_path(&page.slug)),
        lastmod: page.last_modified(),
        changefreq: ChangeFreq::Monthly,
        priority: 0.6,
    });

    statics.chain(posts).chain(pages).collect()
}

/// Render the sitemap document
pub fn sitemap_xml(base_url: &str, now: DateTime<Utc>, posts: &[Post], pages: &[Page]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    xml.push('\n');

    for url in sitemap_urls(base_url, now, posts, pages) {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&url.loc)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", iso_millis(&url.lastmod)));
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", url.changefreq));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", url.priority));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Render robots.txt
pub fn robots_txt(base_url: &str) -> String {
    format!(
        "User-agent: *
Allow: /

# Sitemaps
Sitemap: {}

# Disallow admin areas
Disallow: /admin/
Disallow: /login

# Allow all other content
Allow: /blog/
Allow: /post/
Allow: /page/
Allow: /contact
Allow: /privacy
Allow: /sitemap

Crawl-delay: 1
",
        full_url(base_url, "/sitemap.xml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BASE: &str = "https://merncryptoblog.com";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn post(id: i64, updated: bool) -> Post {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        Post {
            id,
            created_at: created,
            updated_at: updated.then(|| Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    fn page(slug: &str) -> Page {
        Page {
            slug: slug.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_one_url_per_item_plus_static_entries() {
        let posts = vec![post(1, false), post(2, true), post(3, false)];
        let pages = vec![page("about-us"), page("privacy-policy")];
        let xml = sitemap_xml(BASE, now(), &posts, &pages);
        assert_eq!(xml.matches("<url>").count(), 4 + 3 + 2);
        assert_eq!(xml.matches("</url>").count(), 9);
    }

    #[test]
    fn test_empty_sitemap_has_static_entries() {
        let xml = sitemap_xml(BASE, now(), &[], &[]);
        assert_eq!(xml.matches("<url>").count(), 4);
        assert!(xml.contains("<loc>https://merncryptoblog.com</loc>"));
        assert!(xml.contains("<loc>https://merncryptoblog.com/privacy</loc>"));
        assert!(xml.contains("<changefreq>yearly</changefreq>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<lastmod>2024-06-01T12:00:00.000Z</lastmod>"));
    }

    #[test]
    fn test_post_lastmod_prefers_updated_at() {
        let urls = sitemap_urls(BASE, now(), &[post(1, false), post(2, true)], &[]);
        assert_eq!(urls[4].loc, "https://merncryptoblog.com/post/1");
        assert_eq!(iso_millis(&urls[4].lastmod), "2024-01-15T10:30:00.000Z");
        assert_eq!(iso_millis(&urls[5].lastmod), "2024-02-01T00:00:00.000Z");
        assert_eq!(urls[5].changefreq, ChangeFreq::Weekly);
        assert_eq!(urls[5].priority, 0.8);
    }

    #[test]
    fn test_page_entries_escape_text() {
        let xml = sitemap_xml(BASE, now(), &[], &[page("a&b")]);
        assert!(xml.contains("<loc>https://merncryptoblog.com/page/a%26b</loc>"));
        assert!(xml.contains("<priority>0.6</priority>"));
    }

    #[test]
    fn test_robots_txt() {
        let robots = robots_txt("https://merncryptoblog.com/");
        assert!(robots.starts_with("User-agent: *\nAllow: /\n"));
        assert!(robots.contains("Sitemap: https://merncryptoblog.com/sitemap.xml"));
        assert!(robots.contains("Disallow: /admin/"));
        assert!(robots.contains("Disallow: /login"));
        assert!(robots.contains("Allow: /privacy"));
        assert!(robots.trim_end().ends_with("Crawl-delay: 1"));
    }
}
