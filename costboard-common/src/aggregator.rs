//! Turns raw upstream rows into a rectangular bucket x category matrix.
//!
//! Amount strings that do not parse as a finite number are skipped one by one
//! (the cell keeps its zero) instead of failing the whole report: the cost API
//! occasionally sends placeholders where a number is expected.
//!
//! When the same (bucket, category) pair appears more than once, the last
//! parsable entry wins.

use std::collections::BTreeSet;

use crate::{BucketTotals, CostMatrix, RawCostEntry};

pub fn aggregate(entries: &[RawCostEntry]) -> CostMatrix {
    let categories: BTreeSet<&str> = entries.iter().map(|e| e.category.as_str()).collect();
    let buckets: BTreeSet<&str> = entries.iter().map(|e| e.bucket.as_str()).collect();

    let mut matrix: CostMatrix = buckets
        .iter()
        .map(|bucket| {
            let row = categories
                .iter()
                .map(|category| (category.to_string(), 0.0))
                .collect();
            (bucket.to_string(), row)
        })
        .collect();

    let mut skipped = 0usize;
    for entry in entries {
        let Some(amount) = parse_amount(&entry.amount) else {
            skipped += 1;
            tracing::debug!(
                bucket = %entry.bucket,
                category = %entry.category,
                amount = %entry.amount,
                "skipping unparsable cost amount"
            );
            continue;
        };
        if let Some(row) = matrix.get_mut(&entry.bucket) {
            row.insert(entry.category.clone(), amount);
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, total = entries.len(), "cost entries skipped during aggregation");
    }

    matrix
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Sum of every category per bucket. The source matrix is left untouched.
pub fn totals_by_bucket(matrix: &CostMatrix) -> BucketTotals {
    matrix
        .iter()
        .map(|(bucket, row)| (bucket.clone(), row.values().sum()))
        .collect()
}

/// Union of category names across all buckets.
pub fn categories(matrix: &CostMatrix) -> BTreeSet<String> {
    matrix
        .values()
        .flat_map(|row| row.keys().cloned())
        .collect()
}

/// True when every bucket carries exactly the category union.
pub fn is_rectangular(matrix: &CostMatrix) -> bool {
    let all = categories(matrix);
    matrix
        .values()
        .all(|row| row.len() == all.len() && row.keys().all(|k| all.contains(k)))
}
