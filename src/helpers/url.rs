//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left alone by `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Join the public base URL and a site path
///
/// # Examples
/// ```ignore
/// full_url("https://merncryptoblog.com/", "/post/3") // -> "https://merncryptoblog.com/post/3"
/// full_url("https://merncryptoblog.com", "") // -> "https://merncryptoblog.com"
/// ```
pub fn full_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Site path of a post
pub fn post_path(id: i64) -> String {
    format!("/post/{}", id)
}

/// Site path of a page
pub fn page_path(slug: &str) -> String {
    format!("/page/{}", encode_component(slug))
}

/// Percent-encode a single query or path component
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Blog listing URL filtered to a category
pub fn category_path(category: &str) -> String {
    format!("/blog?category={}", encode_component(category))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url() {
        assert_eq!(
            full_url("https://merncryptoblog.com/", "/post/3"),
            "https://merncryptoblog.com/post/3"
        );
        assert_eq!(
            full_url("https://merncryptoblog.com", "blog"),
            "https://merncryptoblog.com/blog"
        );
        assert_eq!(
            full_url("https://merncryptoblog.com/", "/"),
            "https://merncryptoblog.com"
        );
    }

    #[test]
    fn test_content_paths() {
        assert_eq!(post_path(42), "/post/42");
        assert_eq!(page_path("about-us"), "/page/about-us");
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("DeFi & NFTs"), "DeFi%20%26%20NFTs");
        assert_eq!(encode_component("layer-2_(L2)"), "layer-2_(L2)");
        assert_eq!(category_path("Web 3"), "/blog?category=Web%203");
    }
}
