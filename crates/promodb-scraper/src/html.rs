use scraper::Html;

use crate::extract::{dedup, extract_tokens, TokenRules};

/// Characters taken on each side of a keyword hit.
pub const PROXIMITY_RADIUS: usize = 160;

const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Collect the visible text nodes of `html`, trimmed, non-empty, and joined
/// with newlines.
#[must_use]
pub fn visible_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| INVISIBLE_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join("\n")
}

/// Scrape candidate codes from raw HTML.
///
/// Tokens found within [`PROXIMITY_RADIUS`] characters of any keyword hit come
/// first, followed by tokens from the whole page. The merged list is
/// deduplicated and stop-filtered.
#[must_use]
pub fn scrape_html(html: &str, rules: &TokenRules) -> Vec<String> {
    let text = visible_text(html);
    if text.is_empty() {
        return Vec::new();
    }

    let global = extract_tokens(&text, rules.pattern());
    let upper = text.to_uppercase();

    let mut near = Vec::new();
    for keyword in rules.keywords() {
        let needle = keyword.to_uppercase();
        for excerpt in keyword_windows(&upper, &needle, PROXIMITY_RADIUS) {
            near.extend(extract_tokens(excerpt, rules.pattern()));
        }
    }

    rules.filter(dedup(near.into_iter().chain(global)))
}

/// Every window of `radius` characters either side of each (possibly
/// overlapping) occurrence of `needle` in `haystack`.
fn keyword_windows<'a>(haystack: &'a str, needle: &str, radius: usize) -> Vec<&'a str> {
    let mut windows = Vec::new();
    if needle.is_empty() {
        return windows;
    }

    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let at = from + offset;
        windows.push(window_around(haystack, at, radius));

        // advance by one character so overlapping hits are still seen
        let step = haystack[at..].chars().next().map_or(1, char::len_utf8);
        from = at + step;
        if from >= haystack.len() {
            break;
        }
    }
    windows
}

/// Slice `radius` characters before and after byte offset `at`, clamped to
/// the string bounds. `at` must be on a char boundary.
pub(crate) fn window_around(text: &str, at: usize, radius: usize) -> &str {
    let start = if radius == 0 {
        at
    } else {
        text[..at]
            .char_indices()
            .rev()
            .nth(radius - 1)
            .map_or(0, |(i, _)| i)
    };
    let end = text[at..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| at + i);
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use promodb_core::DEFAULT_TOKEN_PATTERN;

    fn rules(keywords: &[&str], stop: &[&str]) -> TokenRules {
        let keywords: Vec<String> = keywords.iter().map(|s| (*s).to_string()).collect();
        let stop: Vec<String> = stop.iter().map(|s| (*s).to_string()).collect();
        TokenRules::new(DEFAULT_TOKEN_PATTERN, &keywords, &stop).unwrap()
    }

    #[test]
    fn visible_text_skips_scripts_and_styles() {
        let html = r"<html><head><title>SHOPTITLE</title><style>.x{}</style></head>
            <body><p>Hello</p><script>var HIDDEN1 = 1;</script><div> World </div>
            <noscript>NOJS12345</noscript></body></html>";
        assert_eq!(visible_text(html), "Hello\nWorld");
    }

    #[test]
    fn visible_text_of_empty_input_is_empty() {
        assert_eq!(visible_text(""), "");
        assert_eq!(visible_text("   "), "");
    }

    #[test]
    fn malformed_html_does_not_panic() {
        let out = scrape_html("<div><p>Code <b>SAVE15NOW</div></p><<<>", &rules(&[], &[]));
        assert_eq!(out, vec!["SAVE15NOW"]);
    }

    #[test]
    fn proximity_tokens_come_before_global_tokens() {
        let filler = "x ".repeat(200);
        let html = format!(
            "<body><p>EARLYBIRD sale</p><p>{filler}</p><p>promo code: LATECODE1</p></body>"
        );
        let out = scrape_html(&html, &rules(&["promo code"], &["PROMO"]));
        assert_eq!(out, vec!["LATECODE1", "EARLYBIRD"]);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let html = "<p>Some BANNER text</p><p>USE COUPON: WINTER20</p>";
        let out = scrape_html(html, &rules(&["coupon"], &["BANNER", "COUPON"]));
        assert_eq!(out, vec!["WINTER20"]);
    }

    #[test]
    fn stop_list_applies_after_merge() {
        let html = "<p>Use code SAVE20NOW at checkout</p>";
        let out = scrape_html(html, &rules(&["code"], &["CHECKOUT"]));
        assert_eq!(out, vec!["SAVE20NOW"]);
    }

    #[test]
    fn keyword_windows_find_overlapping_hits() {
        let windows = keyword_windows("AAAA", "AA", 0);
        assert_eq!(windows.len(), 3);
    }

    #[test]
    fn keyword_windows_skip_empty_needle() {
        assert!(keyword_windows("ANYTHING", "", 10).is_empty());
    }

    #[test]
    fn window_around_counts_characters_not_bytes() {
        let text = "ééééCODEéééé";
        let at = text.find("CODE").unwrap();
        assert_eq!(window_around(text, at, 2), "ééCO");
        assert_eq!(window_around(text, at, 6), "ééééCODEéé");
    }

    #[test]
    fn window_around_clamps_to_bounds() {
        let text = "short";
        assert_eq!(window_around(text, 0, 160), "short");
        assert_eq!(window_around(text, 3, 1), "or");
    }
}
