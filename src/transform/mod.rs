//! Reconcile a company's combined finance tables into one summary row.
//!
//! sanitize → locate_values → filter_observations → summarise → pivot

pub mod reduce;

use crate::error::ExtractError;
use crate::models::{Dataset, Grid, IpoListing, Observation, OfferingTerms};
use crate::prospectus::cleaner::{
    is_date_header_row, is_exact_date, is_placeholder, normalise_label, parse_date, parse_number,
    to_snake_case,
};
use crate::utils::fmt_value;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

static ANNUAL_CONTEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)years?\s+ended?|as\s+of").expect("annual context pattern")
});

// ── 1. Sanitize ───────────────────────────────────────────────────────────────

/// Blank placeholder tokens outside the label column, drop value columns that
/// hold no number, then drop empty rows.
pub fn sanitize(mut grid: Grid) -> Result<Grid, ExtractError> {
    for row in &mut grid.rows {
        for cell in row.iter_mut().skip(1) {
            if is_placeholder(cell) {
                cell.clear();
            }
        }
    }

    let width = grid.width();
    let numeric: Vec<bool> = (0..width)
        .map(|c| c == 0 || grid.rows.iter().any(|r| parse_number(&r[c]).is_some()))
        .collect();
    grid.retain_columns(|c| numeric[c]);
    grid.rows.retain(|r| r.iter().any(|c| !c.trim().is_empty()));

    if grid.width() < 2 || grid.is_empty() {
        return Err(ExtractError::EmptyStage("sanitize"));
    }
    Ok(grid)
}

// ── 2. Locate values ──────────────────────────────────────────────────────────

type ColumnDate = (chrono::NaiveDate, String);

/// Columns of one header group whose stacked parts parse as a date, left to
/// right. The label column never carries a date.
fn header_dates(headers: &[&Vec<String>], width: usize) -> Vec<(usize, ColumnDate)> {
    (1..width)
        .filter_map(|col| {
            let parts: Vec<&str> = headers
                .iter()
                .filter_map(|h| h.get(col))
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect();
            if parts.is_empty() {
                return None;
            }
            let context = parts.join(" ");
            parse_date(&context).map(|date| (col, (date, context)))
        })
        .collect()
}

/// Columns holding at least one number in any of `rows`.
fn value_columns(rows: &[Vec<String>], width: usize) -> Vec<usize> {
    (1..width)
        .filter(|&col| {
            rows.iter()
                .any(|r| r.get(col).is_some_and(|cell| parse_number(cell).is_some()))
        })
        .collect()
}

/// Pair every number with the date of the header above its column.
///
/// Consecutive header rows are stacked; at the next data row each column's
/// parts are joined and parsed. When the data rows up to the next header
/// group use as many value columns as the group has dates, the two are
/// matched left to right, so `$ | 1,000` cells line up with a header sitting
/// over the `$`. Otherwise each date stays on its own column. A column keeps
/// its date until a later header group gives it a new one.
pub fn locate_values(grid: &Grid) -> Result<Vec<Observation>, ExtractError> {
    let width = grid.width();
    let mut dates: Vec<Option<ColumnDate>> = vec![None; width];
    let mut headers: Vec<&Vec<String>> = Vec::new();
    let mut out = Vec::new();

    for (i, row) in grid.rows.iter().enumerate() {
        if is_date_header_row(row) {
            headers.push(row);
            continue;
        }

        if !headers.is_empty() {
            let dated = header_dates(&headers, width);
            let block_len = grid.rows[i..]
                .iter()
                .take_while(|r| !is_date_header_row(r))
                .count();
            let values = value_columns(&grid.rows[i..i + block_len], width);

            if values.len() == dated.len() {
                for (col, (_, date)) in values.into_iter().zip(dated) {
                    dates[col] = Some(date);
                }
            } else {
                for (col, date) in dated {
                    dates[col] = Some(date);
                }
            }
            headers.clear();
        }

        let label = row.first().cloned().unwrap_or_default();
        for (col, cell) in row.iter().enumerate().skip(1) {
            let (Some(value), Some((date, context))) = (parse_number(cell), &dates[col]) else {
                continue;
            };
            out.push(Observation {
                label: label.clone(),
                date: *date,
                context: context.clone(),
                value,
            });
        }
    }

    if out.is_empty() {
        return Err(ExtractError::EmptyStage("locate_values"));
    }
    Ok(out)
}

// ── 3. Filter ─────────────────────────────────────────────────────────────────

fn annual_context(context: &str) -> bool {
    is_exact_date(context) || ANNUAL_CONTEXT_RE.is_match(context)
}

/// Keep short finance line items reported at annual or point-in-time dates,
/// one value per label and date.
pub fn filter_observations(
    observations: Vec<Observation>,
    keywords: &[String],
    max_label_len: usize,
) -> Result<Vec<Observation>, ExtractError> {
    let keywords: Vec<String> = keywords.iter().map(|k| to_snake_case(k)).collect();

    let mut seen = HashSet::new();
    let mut kept: Vec<Observation> = observations
        .into_iter()
        .filter(|o| seen.insert((o.label.clone(), o.value.to_bits(), o.context.clone(), o.date)))
        .map(|mut o| {
            o.label = to_snake_case(&normalise_label(&o.label));
            o
        })
        .filter(|o| o.label.len() < max_label_len)
        .filter(|o| keywords.iter().any(|k| o.label.contains(k.as_str())))
        .collect();

    // largest value wins per (label, date)
    kept.sort_by(|a, b| a.value.total_cmp(&b.value));
    let mut best: BTreeMap<(String, chrono::NaiveDate), Observation> = BTreeMap::new();
    for o in kept {
        best.insert((o.label.clone(), o.date), o);
    }

    let filtered: Vec<Observation> = best
        .into_values()
        .filter(|o| annual_context(&o.context))
        .collect();

    if filtered.is_empty() {
        return Err(ExtractError::EmptyStage("filter_observations"));
    }
    debug!("{} observations after filtering", filtered.len());
    Ok(filtered)
}

// ── 4. Summarise ──────────────────────────────────────────────────────────────

/// `<label>_trend` (last − first) and `<label>_recent` (last) per label.
/// Expects observations sorted by label then date.
pub fn summarise(observations: &[Observation]) -> Result<Vec<(String, f64)>, ExtractError> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < observations.len() {
        let label = &observations[i].label;
        let end = observations[i..]
            .iter()
            .position(|o| &o.label != label)
            .map(|n| i + n)
            .unwrap_or(observations.len());

        let first = observations[i].value;
        let last = observations[end - 1].value;
        out.push((format!("{label}_trend"), last - first));
        out.push((format!("{label}_recent"), last));
        i = end;
    }

    if out.is_empty() {
        return Err(ExtractError::EmptyStage("summarise"));
    }
    Ok(out)
}

// ── 5. Pivot ──────────────────────────────────────────────────────────────────

/// One row: summary columns, the document length when known, the cover-page
/// offering terms when found, then the listing's own columns.
pub fn pivot(
    summary: &[(String, f64)],
    listing: &IpoListing,
    document_length: Option<usize>,
    offering: Option<&OfferingTerms>,
) -> Dataset {
    let mut record: Vec<(String, String)> = summary
        .iter()
        .map(|(name, value)| (name.clone(), fmt_value(*value)))
        .collect();
    if let Some(len) = document_length {
        record.push(("document_length".to_string(), len.to_string()));
    }
    if let Some(terms) = offering {
        for (name, value) in terms.columns() {
            record.push((name.to_string(), value.map(fmt_value).unwrap_or_default()));
        }
    }
    record.push(("symbol".to_string(), listing.symbol.clone()));
    record.push(("url".to_string(), listing.url.clone()));
    record.extend(listing.extra.iter().cloned());

    let mut ds = Dataset::new();
    ds.push_record(record);
    ds
}

/// Run every stage over a combined grid.
pub fn reconcile(
    combined: Grid,
    keywords: &[String],
    max_label_len: usize,
) -> Result<Vec<(String, f64)>, ExtractError> {
    let grid = sanitize(combined)?;
    let observations = locate_values(&grid)?;
    let observations = filter_observations(observations, keywords, max_label_len)?;
    summarise(&observations)
}
