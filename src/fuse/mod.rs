//! Rank-level fusion of recommendation signals.
//!
//! Reciprocal rank fusion (RRF) combines per-signal rankings without
//! trusting their raw score scales: each list contributes
//! `w * 1 / (rank + k)` per item. A legacy two-list weighted merge is kept
//! for callers that still want score-level mixing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Where a ranked list came from.
///
/// Ordered so `BTreeMap` iteration over sources is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalSource {
    ContentBased,
    Collaborative,
    ActivityBased,
}

/// One item of a per-signal ranking, best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntry {
    pub id: Uuid,
    pub score: f32,
    pub explanation: String,
}

/// Fusion parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// RRF dampening constant; larger flattens rank differences.
    pub k: f32,
    /// Per-source weight. A source without an entry contributes nothing.
    pub weights: BTreeMap<SignalSource, f32>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(SignalSource::ContentBased, 0.35);
        weights.insert(SignalSource::Collaborative, 0.45);
        weights.insert(SignalSource::ActivityBased, 0.20);
        Self { k: 60.0, weights }
    }
}

/// A fused item: summed contributions plus merged explanations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedItem {
    pub id: Uuid,
    pub score: f32,
    pub explanation: String,
}

/// Reciprocal rank fusion over per-source rankings.
///
/// Items collect `weight * 1 / (rank + k)` from every list they appear in.
/// Entries with equal scores share a rank (competition ranking), so a tie
/// within one signal cannot decide the final order by itself. Explanations
/// are deduplicated and joined with "; ". The result is sorted by fused
/// score descending, id ascending on ties, making the output fully
/// deterministic for a given input.
#[must_use]
pub fn fuse(
    lists: &BTreeMap<SignalSource, Vec<RankedEntry>>,
    config: &FusionConfig,
) -> Vec<FusedItem> {
    // BTreeMap keeps accumulation order independent of insertion order.
    let mut scores: BTreeMap<Uuid, f32> = BTreeMap::new();
    let mut explanations: BTreeMap<Uuid, Vec<String>> = BTreeMap::new();

    for (source, entries) in lists {
        let weight = config.weights.get(source).copied().unwrap_or(0.0);
        let mut rank = 0usize;
        for (idx, entry) in entries.iter().enumerate() {
            if idx > 0 && entries[idx - 1].score > entry.score {
                rank = idx;
            }
            let contribution = weight / (rank as f32 + config.k);
            *scores.entry(entry.id).or_insert(0.0) += contribution;

            let reasons = explanations.entry(entry.id).or_default();
            for part in entry.explanation.split("; ") {
                if !part.is_empty() && !reasons.iter().any(|r| r == part) {
                    reasons.push(part.to_string());
                }
            }
        }
    }

    let mut fused: Vec<FusedItem> = scores
        .into_iter()
        .map(|(id, score)| FusedItem {
            id,
            score,
            explanation: explanations.remove(&id).unwrap_or_default().join("; "),
        })
        .collect();

    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    fused
}

/// Legacy score-level merge of exactly two rankings.
///
/// Per-source scores are normalized by each list's maximum, then combined
/// as a plain weighted sum. Kept for compatibility; [`fuse`] is the
/// default path.
#[must_use]
pub fn weighted_merge(
    a: &[RankedEntry],
    weight_a: f32,
    b: &[RankedEntry],
    weight_b: f32,
) -> Vec<FusedItem> {
    fn max_score(entries: &[RankedEntry]) -> f32 {
        entries
            .iter()
            .map(|e| e.score)
            .fold(0.0_f32, f32::max)
            .max(f32::MIN_POSITIVE)
    }

    let max_a = max_score(a);
    let max_b = max_score(b);

    let mut scores: BTreeMap<Uuid, f32> = BTreeMap::new();
    let mut explanations: BTreeMap<Uuid, Vec<String>> = BTreeMap::new();

    for (entries, weight, max) in [(a, weight_a, max_a), (b, weight_b, max_b)] {
        for entry in entries {
            *scores.entry(entry.id).or_insert(0.0) += weight * entry.score / max;
            let reasons = explanations.entry(entry.id).or_default();
            if !entry.explanation.is_empty() && !reasons.contains(&entry.explanation) {
                reasons.push(entry.explanation.clone());
            }
        }
    }

    let mut merged: Vec<FusedItem> = scores
        .into_iter()
        .map(|(id, score)| FusedItem {
            id,
            score,
            explanation: explanations.remove(&id).unwrap_or_default().join("; "),
        })
        .collect();

    merged.sort_by(|x, y| {
        y.score
            .partial_cmp(&x.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| x.id.cmp(&y.id))
    });

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u128, score: f32, explanation: &str) -> RankedEntry {
        RankedEntry {
            id: Uuid::from_u128(id),
            score,
            explanation: explanation.to_string(),
        }
    }

    #[test]
    fn test_single_list_preserves_order() {
        let mut lists = BTreeMap::new();
        lists.insert(
            SignalSource::ContentBased,
            vec![entry(1, 0.9, "a"), entry(2, 0.5, "b"), entry(3, 0.1, "c")],
        );
        let fused = fuse(&lists, &FusionConfig::default());
        let ids: Vec<u128> = fused.iter().map(|f| f.id.as_u128()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_item_in_all_lists_wins() {
        let mut lists = BTreeMap::new();
        lists.insert(
            SignalSource::ContentBased,
            vec![entry(1, 0.9, "content"), entry(2, 0.8, "also content")],
        );
        lists.insert(
            SignalSource::Collaborative,
            vec![entry(1, 0.7, "peers"), entry(3, 0.6, "other peers")],
        );
        lists.insert(
            SignalSource::ActivityBased,
            vec![entry(1, 0.5, "active"), entry(4, 0.4, "less active")],
        );
        let fused = fuse(&lists, &FusionConfig::default());
        assert_eq!(fused[0].id.as_u128(), 1);
        assert!(fused[0].score > fused[1].score);
    }

    #[test]
    fn test_contribution_formula() {
        let mut lists = BTreeMap::new();
        lists.insert(SignalSource::ContentBased, vec![entry(1, 0.9, "")]);
        let config = FusionConfig::default();
        let fused = fuse(&lists, &config);
        // rank 0 -> weight / (0 + k)
        let expected = 0.35 / 60.0;
        assert!((fused[0].score - expected).abs() < 1e-7);
    }

    #[test]
    fn test_explanations_deduplicated() {
        let mut lists = BTreeMap::new();
        lists.insert(
            SignalSource::ContentBased,
            vec![entry(1, 0.9, "fits your schedule; open slots")],
        );
        lists.insert(
            SignalSource::Collaborative,
            vec![entry(1, 0.8, "fits your schedule; popular")],
        );
        let fused = fuse(&lists, &FusionConfig::default());
        assert_eq!(
            fused[0].explanation,
            "fits your schedule; open slots; popular"
        );
    }

    #[test]
    fn test_tie_breaks_by_id() {
        let mut lists = BTreeMap::new();
        lists.insert(
            SignalSource::ContentBased,
            vec![entry(7, 0.9, "")],
        );
        lists.insert(
            SignalSource::Collaborative,
            vec![entry(2, 0.9, "")],
        );
        let config = FusionConfig {
            k: 60.0,
            weights: BTreeMap::from([
                (SignalSource::ContentBased, 1.0),
                (SignalSource::Collaborative, 1.0),
            ]),
        };
        let fused = fuse(&lists, &config);
        // Equal contributions, lower id first.
        assert_eq!(fused[0].id.as_u128(), 2);
        assert_eq!(fused[1].id.as_u128(), 7);
    }

    #[test]
    fn test_fusing_a_list_with_itself_preserves_order() {
        let ranking = vec![entry(5, 0.9, ""), entry(2, 0.6, ""), entry(9, 0.3, "")];
        let mut lists = BTreeMap::new();
        lists.insert(SignalSource::ContentBased, ranking.clone());
        lists.insert(SignalSource::Collaborative, ranking.clone());
        let config = FusionConfig {
            k: 60.0,
            weights: BTreeMap::from([
                (SignalSource::ContentBased, 0.5),
                (SignalSource::Collaborative, 0.5),
            ]),
        };
        let fused = fuse(&lists, &config);
        let ids: Vec<u128> = fused.iter().map(|f| f.id.as_u128()).collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[test]
    fn test_tied_entries_share_a_rank() {
        let mut lists = BTreeMap::new();
        lists.insert(
            SignalSource::ContentBased,
            vec![entry(1, 0.9, ""), entry(2, 0.9, ""), entry(3, 0.5, "")],
        );
        let config = FusionConfig {
            k: 60.0,
            weights: BTreeMap::from([(SignalSource::ContentBased, 1.0)]),
        };
        let fused = fuse(&lists, &config);
        // Items 1 and 2 both sit at rank 0; item 3 drops to rank 2.
        assert!((fused[0].score - fused[1].score).abs() < 1e-9);
        assert!((fused[0].score - 1.0 / 60.0).abs() < 1e-7);
        assert!((fused[2].score - 1.0 / 62.0).abs() < 1e-7);
    }

    #[test]
    fn test_result_deterministic_across_runs() {
        let mut lists = BTreeMap::new();
        lists.insert(
            SignalSource::Collaborative,
            vec![entry(3, 0.9, "x"), entry(1, 0.8, "y"), entry(2, 0.7, "z")],
        );
        lists.insert(
            SignalSource::ActivityBased,
            vec![entry(2, 0.9, "w"), entry(3, 0.2, "v")],
        );
        let config = FusionConfig::default();
        let a = fuse(&lists, &config);
        let b = fuse(&lists, &config);
        let ids_a: Vec<Uuid> = a.iter().map(|f| f.id).collect();
        let ids_b: Vec<Uuid> = b.iter().map(|f| f.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_unconfigured_source_contributes_nothing() {
        let mut lists = BTreeMap::new();
        lists.insert(SignalSource::ContentBased, vec![entry(1, 0.9, "")]);
        lists.insert(SignalSource::Collaborative, vec![entry(2, 0.9, "")]);
        let config = FusionConfig {
            k: 60.0,
            weights: BTreeMap::from([(SignalSource::Collaborative, 0.5)]),
        };
        let fused = fuse(&lists, &config);
        // Only the configured source moves the ranking.
        assert_eq!(fused[0].id.as_u128(), 2);
        assert!((fused[0].score - 0.5 / 60.0).abs() < 1e-7);
        let unweighted = fused.iter().find(|f| f.id.as_u128() == 1).unwrap();
        assert_eq!(unweighted.score, 0.0);
    }

    #[test]
    fn test_weighted_merge_normalizes_and_sums() {
        let a = vec![entry(1, 2.0, "from a"), entry(2, 1.0, "")];
        let b = vec![entry(1, 0.5, "from b")];
        let merged = weighted_merge(&a, 0.6, &b, 0.4);
        // Item 1: 0.6 * (2.0/2.0) + 0.4 * (0.5/0.5) = 1.0
        assert_eq!(merged[0].id.as_u128(), 1);
        assert!((merged[0].score - 1.0).abs() < 1e-6);
        // Item 2: 0.6 * (1.0/2.0) = 0.3
        assert!((merged[1].score - 0.3).abs() < 1e-6);
        assert_eq!(merged[0].explanation, "from a; from b");
    }

    #[test]
    fn test_weighted_merge_empty_lists() {
        let merged = weighted_merge(&[], 0.5, &[], 0.5);
        assert!(merged.is_empty());
    }
}
