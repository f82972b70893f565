//! Weighted overall score.
//!
//! `overall = 2 * unique_users + 1 * total_clicks + 3 * recent_clicks`, where a
//! URL missing from one input list contributes 0 for that term.

use std::collections::BTreeMap;

use crate::services::url_normalizer::normalize_url;
use crate::types::ranking::{
    RankingItem, RECENT_CLICK_WEIGHT, TOTAL_CLICK_WEIGHT, UNIQUE_USER_WEIGHT,
};

/// Folds the three metric lists into overall scores keyed by normalized URL.
///
/// Output is sorted by score descending, then URL ascending.
pub fn combine(
    unique_users: &[RankingItem],
    total_clicks: &[RankingItem],
    recent_clicks: &[RankingItem],
) -> Vec<RankingItem> {
    let weighted = [
        (unique_users, UNIQUE_USER_WEIGHT),
        (total_clicks, TOTAL_CLICK_WEIGHT),
        (recent_clicks, RECENT_CLICK_WEIGHT),
    ];

    let scores = weighted
        .iter()
        .flat_map(|(items, weight)| items.iter().map(move |item| (item, *weight)))
        .fold(BTreeMap::<String, i64>::new(), |mut acc, (item, weight)| {
            *acc.entry(normalize_url(&item.url)).or_insert(0) += weight * item.value;
            acc
        });

    let mut combined: Vec<RankingItem> = scores
        .into_iter()
        .map(|(url, score)| RankingItem::new(url, score))
        .collect();
    sort_ranking(&mut combined);
    combined
}

/// Value descending, URL ascending.
pub fn sort_ranking(items: &mut [RankingItem]) {
    items.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.url.cmp(&b.url)));
}
