//! Unit tests for URL canonicalization and validation.

use linkshelf::services::url_normalizer::{is_valid_url, normalize_url};
use rstest::rstest;

#[rstest]
#[case("HTTP://Example.com:80/foo/", "http://example.com/foo")]
#[case("https://Example.COM/", "https://example.com")]
#[case("https://example.com:443/a", "https://example.com/a")]
#[case("https://example.com:8443/a/", "https://example.com:8443/a")]
#[case("https://example.com/a//", "https://example.com/a")]
#[case("https://example.com/a?", "https://example.com/a")]
#[case("https://example.com/a#", "https://example.com/a")]
#[case("https://example.com/a/?q=1#top", "https://example.com/a?q=1#top")]
#[case("https://example.com/Path/Case", "https://example.com/Path/Case")]
#[case("http://localhost:3000/", "http://localhost:3000")]
fn test_normalize(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(normalize_url(input), expected);
}

/// Path, query and fragment keep the characters the user typed.
#[rstest]
#[case("https://example.com/search?q=it's", "https://example.com/search?q=it's")]
#[case("https://example.com/search?q=a b", "https://example.com/search?q=a b")]
#[case("https://example.com/doc#sec tion", "https://example.com/doc#sec tion")]
#[case("https://example.com/a/../b/", "https://example.com/a/../b")]
#[case("https://Example.com/café/", "https://example.com/café")]
#[case("https://example.com/%7Euser?x=%41", "https://example.com/%7Euser?x=%41")]
#[case("  https://me@Example.com:443/a b/  ", "https://me@example.com/a b")]
fn test_normalize_keeps_raw_text(#[case] input: &str, #[case] expected: &str) {
    let normalized = normalize_url(input);
    assert_eq!(normalized, expected);
    assert_eq!(normalize_url(&normalized), normalized);
}

/// Query parameter order is significant and left alone.
#[test]
fn test_query_order_preserved() {
    assert_eq!(
        normalize_url("https://example.com/s?b=2&a=1"),
        "https://example.com/s?b=2&a=1"
    );
}

/// Unparsable input passes through unchanged.
#[rstest]
#[case("not a url")]
#[case("/relative/path")]
#[case("")]
fn test_unparsable_passthrough(#[case] input: &str) {
    assert_eq!(normalize_url(input), input);
}

#[rstest]
#[case("https://example.com", true)]
#[case("  http://example.com/a  ", true)]
#[case("ftp://files.example.com/x", true)]
#[case("example.com", false)]
#[case("mailto:someone@example.com", false)]
#[case("", false)]
fn test_is_valid_url(#[case] input: &str, #[case] expected: bool) {
    assert_eq!(is_valid_url(input), expected);
}
