/// Normalize a storefront domain: trim, lowercase, drop the scheme, a leading
/// `www.`, and anything from the first `/` onward.
///
/// ```
/// use promodb_core::normalize_domain;
/// assert_eq!(normalize_domain(" https://www.Example.com/sale "), "example.com");
/// ```
#[must_use]
pub fn normalize_domain(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let without_www = without_scheme
        .strip_prefix("www.")
        .unwrap_or(without_scheme);
    without_www
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Normalize a promo code: trim surrounding whitespace and uppercase.
#[must_use]
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}
