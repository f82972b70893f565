//! Display titles for ranked URLs.
//!
//! Preference order: a title several owners agree on, the live page title,
//! then a name synthesized from the domain.

use std::collections::BTreeMap;
use std::time::Duration;

use url::{Host, Url};

use crate::services::page_fetcher::{fetch_page_title, PageFetcher};

/// Shown when no title can be derived at all.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Most frequent non-blank title, if it occurs more than once.
///
/// Ties go to the lexicographically smallest title.
pub fn representative_title(titles: &[String]) -> Option<String> {
    let counts = titles
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .fold(BTreeMap::<&str, usize>::new(), |mut acc, t| {
            *acc.entry(t).or_insert(0) += 1;
            acc
        });

    // BTreeMap iterates in ascending key order, so `max_by` keeps the last max;
    // reverse to make the smallest title win ties.
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .filter(|(_, count)| *count > 1)
        .map(|(title, _)| title.to_string())
}

/// Synthesizes a title from the URL's host.
///
/// `https://www.github.com/x` gives `Github`, `https://docs.rust-lang.org` gives
/// `DocsRust-lang`. IP hosts are returned verbatim.
pub fn domain_as_title(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return UNKNOWN_TITLE.to_string(),
    };
    let host = match parsed.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_ascii_lowercase(),
        Some(Host::Ipv4(ip)) => return ip.to_string(),
        Some(Host::Ipv6(ip)) => return ip.to_string(),
        _ => return UNKNOWN_TITLE.to_string(),
    };

    if host == "localhost" {
        return "Localhost".to_string();
    }

    let host = host.trim_end_matches('.');
    let without_suffix = match psl::suffix_str(host) {
        Some(suffix) if suffix.len() < host.len() => &host[..host.len() - suffix.len() - 1],
        _ => host,
    };
    let name = without_suffix.strip_prefix("www.").unwrap_or(without_suffix);

    let title: String = name
        .split('.')
        .filter(|label| !label.is_empty())
        .map(capitalize)
        .collect();
    if title.is_empty() {
        UNKNOWN_TITLE.to_string()
    } else {
        title
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Resolves the display title of a ranked URL.
pub async fn resolve_title(
    fetcher: &dyn PageFetcher,
    url: &str,
    titles: &[String],
    timeout: Duration,
) -> String {
    if let Some(title) = representative_title(titles) {
        return title;
    }
    if let Some(title) = fetch_page_title(fetcher, url, timeout).await {
        return title;
    }
    domain_as_title(url)
}
