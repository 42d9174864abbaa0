//! Page slugs

/// Derive a URL-safe slug from a page title.
///
/// Lowercases, drops everything except `a-z`, `0-9`, spaces and hyphens,
/// turns each whitespace run into a single hyphen, collapses repeated
/// hyphens and trims hyphens from both ends.
///
/// # Examples
/// ```ignore
/// generate_slug("Privacy Policy") // -> "privacy-policy"
/// generate_slug("  Bitcoin: What's Next?  ") // -> "bitcoin-whats-next"
/// ```
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for c in title.to_lowercase().chars() {
        let c = match c {
            'a'..='z' | '0'..='9' | '-' => c,
            ' ' => '-',
            _ => continue,
        };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }

    slug.trim_matches('-').to_string()
}
