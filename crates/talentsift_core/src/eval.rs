//! Evaluation metrics.
//!
//! Shared by the offline evaluation scripts; kept in the core so the URL
//! normalization used for comparing predictions to ground truth has exactly
//! one definition.

use std::collections::{HashMap, HashSet};

/// Normalize a URL for comparison: trim whitespace, strip trailing slashes,
/// and collapse the `/solutions/products/` vs `/products/` path
/// inconsistency (ground truth uses the latter). `None` maps to the empty
/// string. Idempotent.
pub fn normalize_url(url: Option<&str>) -> String {
    let url = match url {
        Some(url) => url,
        None => return String::new(),
    };
    let url = url.trim().trim_end_matches('/');
    let url = url.replace("/solutions/products/", "/products/");
    url.replace("/solutions/", "/")
}

/// Mean Recall@K over queries.
///
/// For each query present in both maps with non-empty ground truth:
/// `|top-k predictions ∩ truth| / |truth|` over normalized URLs. Queries
/// with no predictions are skipped; returns 0.0 when no query qualifies.
pub fn recall_at_k(
    predictions: &HashMap<String, Vec<String>>,
    ground_truth: &HashMap<String, Vec<String>>,
    k: usize,
) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;

    for (query, truth_urls) in ground_truth {
        let predicted = match predictions.get(query) {
            Some(predicted) => predicted,
            None => continue,
        };

        let truth: HashSet<String> = truth_urls
            .iter()
            .map(|u| normalize_url(Some(u)))
            .filter(|u| !u.is_empty())
            .collect();
        if truth.is_empty() {
            continue;
        }

        let predicted: HashSet<String> = predicted
            .iter()
            .take(k)
            .map(|u| normalize_url(Some(u)))
            .collect();

        let matches = truth.intersection(&predicted).count();
        total += matches as f64 / truth.len() as f64;
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
