//! Ranking metrics for validation reporting.

use crate::error::{ModelError, Result};

/// Average precision of a scored ranking.
///
/// Rows are ranked by descending score (ties broken by input order) and the
/// precision at each positive row is averaged over all positives. Errors on
/// inputs where the metric is undefined: empty data or a single-class label
/// vector.
pub fn average_precision(labels: &[u8], scores: &[f32]) -> Result<f64> {
    if labels.len() != scores.len() {
        return Err(ModelError::LabelMismatch {
            rows: scores.len(),
            labels: labels.len(),
        });
    }
    if labels.is_empty() {
        return Err(ModelError::DegenerateLabels("no rows".to_string()));
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    if positives == 0 {
        return Err(ModelError::DegenerateLabels("no positive rows".to_string()));
    }
    if positives == labels.len() {
        return Err(ModelError::DegenerateLabels("no negative rows".to_string()));
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut true_positives = 0usize;
    let mut summed_precision = 0.0f64;
    for (rank, &row) in order.iter().enumerate() {
        if labels[row] == 1 {
            true_positives += 1;
            summed_precision += true_positives as f64 / (rank + 1) as f64;
        }
    }
    Ok(summed_precision / positives as f64)
}

// ── Tests ────────────────────────────────────────────────────────────────────
