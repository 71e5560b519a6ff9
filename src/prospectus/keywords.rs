use crate::models::{Dataset, Grid, OfferingTerms};
use crate::prospectus::cleaner::parse_number;
use anyhow::Result;
use regex::Regex;

/// Characters either side of an underwriter name searched for deal wording.
const CONTEXT_WINDOW: usize = 200;

const TABLE_TERMS: [&str; 3] = ["underwriter", "book-running manager", "lead manager"];
const TEXT_TERMS: [&str; 4] = ["underwriter", "book-running", "lead manager", "offering"];

// ── Keyword frequencies ───────────────────────────────────────────────────────

/// Whole-word, case-insensitive occurrences of each keyword, in keyword order.
pub fn keyword_counts(text: &str, keywords: &[String]) -> Result<Vec<(String, usize)>> {
    keywords
        .iter()
        .map(|kw| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(kw)))?;
            Ok((kw.clone(), re.find_iter(text).count()))
        })
        .collect()
}

// ── Underwriters ──────────────────────────────────────────────────────────────

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn floor_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i.min(s.len())
}

fn table_text(grid: &Grid) -> String {
    grid.cells().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Known underwriter names mentioned in an underwriting context, title-cased
/// and sorted.
pub fn underwriters(text: &str, tables: &[Grid], names: &[String]) -> Vec<String> {
    let names: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    let mut found: Vec<String> = Vec::new();

    for table in tables.iter().map(table_text) {
        if !TABLE_TERMS.iter().any(|t| table.contains(t)) {
            continue;
        }
        found.extend(names.iter().filter(|n| table.contains(n.as_str())).cloned());
    }

    let lower = text.to_lowercase();
    for name in &names {
        let in_context = lower.match_indices(name.as_str()).any(|(start, m)| {
            let from = floor_boundary(&lower, start.saturating_sub(CONTEXT_WINDOW));
            let to = ceil_boundary(&lower, start + m.len() + CONTEXT_WINDOW);
            let window = &lower[from..to];
            TEXT_TERMS.iter().any(|t| window.contains(t))
        });
        if in_context {
            found.push(name.clone());
        }
    }

    let mut titled: Vec<String> = found.iter().map(|n| title_case(n)).collect();
    titled.sort();
    titled.dedup();
    titled
}

// ── Offering terms ────────────────────────────────────────────────────────────

fn first_number(row: &[String], cols: &[usize]) -> Option<f64> {
    cols.iter().find_map(|&c| row.get(c).and_then(|cell| parse_number(cell)))
}

/// Price, discount and proceeds from the cover-page offering table.
///
/// The table must mention "public offering price" and carry a header row with
/// a per-share (or per-unit) column and a total column. Spanned header cells
/// cover several physical columns; the first number under any of them wins.
pub fn offering_terms(grids: &[Grid]) -> OfferingTerms {
    let mut terms = OfferingTerms::default();

    for grid in grids {
        if !grid.cells().any(|c| c.to_lowercase().contains("public offering price")) {
            continue;
        }

        let header = grid.rows.iter().position(|row| {
            let lower: Vec<String> = row.iter().map(|c| c.to_lowercase()).collect();
            lower.iter().any(|c| c.contains("per share") || c.contains("per unit"))
                && lower.iter().any(|c| c.contains("total"))
        });
        let Some(header) = header else { continue };

        let lower: Vec<String> = grid.rows[header].iter().map(|c| c.to_lowercase()).collect();
        let per_share: Vec<usize> = (0..lower.len())
            .filter(|&i| lower[i].contains("per share") || lower[i].contains("per unit"))
            .collect();
        let total: Vec<usize> = (0..lower.len()).filter(|&i| lower[i].contains("total")).collect();

        for row in &grid.rows[header + 1..] {
            let label = row
                .iter()
                .find(|c| !c.trim().is_empty())
                .map(|c| c.to_lowercase())
                .unwrap_or_default();

            let (unit, sum) = if label.contains("public offering price") {
                (&mut terms.public_offering_price_per_share, &mut terms.public_offering_price_total)
            } else if label.contains("underwriting discount") {
                (&mut terms.underwriting_discount_per_share, &mut terms.underwriting_discount_total)
            } else if label.contains("proceeds") {
                (&mut terms.proceeds_per_share, &mut terms.proceeds_total)
            } else {
                continue;
            };

            if unit.is_none() {
                *unit = first_number(row, &per_share);
            }
            if sum.is_none() {
                *sum = first_number(row, &total);
            }
        }
        break;
    }

    terms
}

// ── Column pruning ────────────────────────────────────────────────────────────

/// Drop columns whose name contains an excluded word, then columns with at
/// most `max_count` values. Columns in `keep` are never dropped.
///
/// Returns the low-count report as `column_name, count`, lowest first.
pub fn prune_columns(
    dataset: &mut Dataset,
    exclude_words: &[String],
    max_count: usize,
    keep: &[&str],
) -> Dataset {
    let protected = |name: &str| keep.iter().any(|k| k.eq_ignore_ascii_case(name));

    dataset.drop_columns(|_, name| {
        !protected(name) && exclude_words.iter().any(|w| name.contains(w.as_str()))
    });

    let mut low: Vec<(String, usize)> = dataset
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !protected(name))
        .map(|(i, name)| (name.clone(), dataset.non_empty_count(i)))
        .filter(|(_, count)| *count <= max_count)
        .collect();
    low.sort_by_key(|(_, count)| *count);

    dataset.drop_columns(|_, name| low.iter().any(|(n, _)| n == name));

    let mut report = Dataset::with_columns(&["column_name", "count"]);
    for (name, count) in low {
        report.push_record([("column_name", name), ("count", count.to_string())]);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn counts_whole_words_only() {
        let text = "Our AI platform uses AI. Aid and said are not ai; machine learning, Machine  Learning.";
        let counts = keyword_counts(text, &strings(&["ai", "machine learning", "cloud"])).unwrap();
        assert_eq!(
            counts,
            vec![
                ("ai".to_string(), 3),
                ("machine learning".to_string(), 1),
                ("cloud".to_string(), 0)
            ]
        );
    }

    #[test]
    fn finds_underwriters_in_tables_and_context() {
        let tables = vec![grid(&[&["Underwriter", "Shares"], &["Goldman Sachs & Co. LLC", "1,000"]])];
        let filler = "x".repeat(400);
        let text = format!(
            "Jefferies is acting as book-running manager. {filler} Barclays appears far from any deal words."
        );
        let names = strings(&["goldman sachs", "jefferies", "barclays", "lazard"]);

        assert_eq!(underwriters(&text, &tables, &names), vec!["Goldman Sachs", "Jefferies"]);
    }

    #[test]
    fn context_window_respects_multibyte_text() {
        let text = format!("{}ubs underwriter", "é".repeat(150));
        assert_eq!(underwriters(&text, &[], &strings(&["ubs"])), vec!["Ubs"]);
    }

    #[test]
    fn reads_offering_terms() {
        let table = grid(&[
            &["", "Per Share", "Per Share", "Total", "Total"],
            &["Initial public offering price", "$", "10.00", "$", "50,000,000"],
            &["Underwriting discounts and commissions(1)", "$", "0.70", "$", "3,500,000"],
            &["Proceeds, before expenses, to us", "$", "9.30", "$", "46,500,000"],
        ]);
        let other = grid(&[&["Revenue", "10"]]);
        let terms = offering_terms(&[other, table]);

        assert_eq!(terms.public_offering_price_per_share, Some(10.0));
        assert_eq!(terms.public_offering_price_total, Some(50_000_000.0));
        assert_eq!(terms.underwriting_discount_per_share, Some(0.70));
        assert_eq!(terms.proceeds_total, Some(46_500_000.0));
        assert!(offering_terms(&[grid(&[&["Revenue", "10"]])]).is_empty());
    }

    #[test]
    fn prunes_excluded_and_sparse_columns() {
        let mut ds = Dataset::new();
        for i in 0..8 {
            let mut record = vec![
                ("symbol".to_string(), format!("S{i}")),
                ("software".to_string(), i.to_string()),
                ("Nasdaq".to_string(), "1".to_string()),
            ];
            if i < 2 {
                record.push(("Morgan Stanley".to_string(), "1".to_string()));
            }
            ds.push_record(record);
        }

        let report = prune_columns(&mut ds, &strings(&["Nasdaq"]), 6, &["symbol"]);
        assert_eq!(ds.columns, vec!["symbol", "software"]);
        assert_eq!(report.columns, vec!["column_name", "count"]);
        assert_eq!(report.get(0, "column_name"), Some("Morgan Stanley"));
        assert_eq!(report.get(0, "count"), Some("2"));
    }
}
