use crate::models::Dataset;
use tracing::debug;

/// Line items filed under different names that mean the same thing.
const LIKE_TERMS: [(&str, &str); 4] = [
    ("cash_trend", "cash_and_cash_equivalents_trend"),
    ("cash_recent", "cash_and_cash_equivalents_recent"),
    ("total_shareholders_equity_trend", "total_stockholders_equity_trend"),
    ("total_shareholders_equity_recent", "total_stockholders_equity_recent"),
];

/// Fill gaps in a column from its synonym. Only applies when both exist.
pub fn combine_like_terms(ds: &mut Dataset) {
    for (target, source) in LIKE_TERMS {
        let (Some(t), Some(s)) = (ds.column_index(target), ds.column_index(source)) else {
            continue;
        };
        let mut filled = 0;
        for row in &mut ds.rows {
            if row[t].is_none() && row[s].is_some() {
                row[t] = row[s].clone();
                filled += 1;
            }
        }
        debug!("{}: filled {} rows from {}", target, filled, source);
    }
}

/// Keep columns populated in at least `threshold` of rows; `url` always goes.
pub fn drop_sparse_columns(ds: &mut Dataset, threshold: f64) -> usize {
    let min = threshold * ds.len() as f64;
    let counts: Vec<usize> = (0..ds.columns.len()).map(|c| ds.non_empty_count(c)).collect();
    let before = ds.columns.len();
    ds.drop_columns(|i, name| name == "url" || (counts[i] as f64) < min);
    before - ds.columns.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let mut ds = Dataset::new();
        ds.push_record([("symbol", "A"), ("cash_recent", "5"), ("url", "a.htm"), ("rare", "1")]);
        ds.push_record([("symbol", "B"), ("cash_and_cash_equivalents_recent", "7"), ("url", "b.htm")]);
        ds.push_record([("symbol", "C"), ("cash_recent", "9"), ("url", "c.htm")]);
        ds
    }

    #[test]
    fn fills_from_synonyms() {
        let mut ds = dataset();
        combine_like_terms(&mut ds);
        assert_eq!(ds.get(1, "cash_recent"), Some("7"));
        assert_eq!(ds.get(0, "cash_recent"), Some("5"));
        assert!(ds.column_index("total_shareholders_equity_trend").is_none());
    }

    #[test]
    fn drops_sparse_columns_and_url() {
        let mut ds = dataset();
        combine_like_terms(&mut ds);
        let dropped = drop_sparse_columns(&mut ds, 0.60);
        assert_eq!(ds.columns, vec!["symbol", "cash_recent"]);
        assert_eq!(dropped, 3);
    }
}
