//! Similar-URL suggestions over the live set of public URLs.
//!
//! Candidates are gathered in three passes: the raw input itself, the
//! ancestors of the normalized input walking toward the host, then public
//! URLs that start with the raw input. Results are deduplicated in first-seen
//! order and capped at [`MAX_SUGGESTIONS`].

use rusqlite::Connection;
use url::Url;

use crate::services::ranking_aggregator::RankingAggregator;
use crate::services::url_normalizer::{base_url, normalize_url, raw_parts};
use crate::types::errors::RankingError;

pub const MAX_SUGGESTIONS: usize = 5;

pub struct SuggestionEngine<'a> {
    aggregator: RankingAggregator<'a>,
}

impl<'a> SuggestionEngine<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            aggregator: RankingAggregator::new(conn),
        }
    }

    pub fn suggest(&self, input: &str) -> Result<Vec<String>, RankingError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let mut found: Vec<String> = Vec::new();

        if self.aggregator.is_public(input)? {
            push_unique(&mut found, input.to_string());
        }

        for ancestor in ancestor_urls(&normalize_url(input)) {
            if found.len() >= MAX_SUGGESTIONS {
                break;
            }
            if self.aggregator.is_public(&ancestor)? {
                push_unique(&mut found, ancestor);
            }
        }

        if found.len() < MAX_SUGGESTIONS {
            // Earlier passes contribute at most MAX_SUGGESTIONS entries.
            for url in self.aggregator.public_urls_with_prefix(input, MAX_SUGGESTIONS * 2)? {
                push_unique(&mut found, url);
            }
        }

        found.truncate(MAX_SUGGESTIONS);
        Ok(found)
    }
}

fn push_unique(found: &mut Vec<String>, url: String) {
    if !found.contains(&url) {
        found.push(url);
    }
}

/// Ancestors of a normalized URL, nearest first, ending with the bare host.
///
/// `https://example.com/a/b/c` yields `https://example.com/a/b`,
/// `https://example.com/a` and `https://example.com`. Each ancestor is
/// `scheme://host[:port]` plus a prefix of the path, so userinfo, query and
/// fragment never appear in the result.
pub fn ancestor_urls(normalized: &str) -> Vec<String> {
    let base = match Url::parse(normalized).ok().as_ref().and_then(base_url) {
        Some(base) => base,
        None => return Vec::new(),
    };
    let path = raw_parts(normalized).map_or("", |parts| parts.path);

    let mut ancestors = Vec::new();
    let mut current = path;
    while let Some(idx) = current.rfind('/').filter(|idx| *idx > 0) {
        current = &current[..idx];
        ancestors.push(format!("{}{}", base, current));
    }
    if !path.is_empty() && path != "/" {
        ancestors.push(base);
    }
    ancestors
}
