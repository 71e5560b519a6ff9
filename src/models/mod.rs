use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Listing index ─────────────────────────────────────────────────────────────

/// One row of the listing index. `extra` keeps every other column (first-day
/// volume, open, close, offer price, ...) in file order so it can be copied
/// onto the company's output row.
#[derive(Debug, Clone, PartialEq)]
pub struct IpoListing {
    pub symbol: String,
    pub url: String,
    pub extra: Vec<(String, String)>,
}

impl IpoListing {
    /// Filing file name: last path segment of the URL.
    pub fn file_name(&self) -> String {
        if let Ok(parsed) = url::Url::parse(&self.url) {
            if let Some(last) = parsed.path_segments().and_then(|mut s| s.next_back()) {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
        self.url.rsplit('/').next().unwrap_or_default().to_string()
    }
}

// ── Table grid ────────────────────────────────────────────────────────────────

/// Rectangular text table. Every row has `width` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    /// Build a grid, padding ragged rows with empty cells.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width() == 0
    }

    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flat_map(|r| r.iter().map(|c| c.as_str()))
    }

    /// Keep only the columns for which `keep(index)` is true.
    pub fn retain_columns(&mut self, keep: impl Fn(usize) -> bool) {
        for row in &mut self.rows {
            let mut i = 0;
            row.retain(|_| {
                let k = keep(i);
                i += 1;
                k
            });
        }
    }
}

// ── Located values ────────────────────────────────────────────────────────────

/// A number found under a dated column header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub label: String,
    pub date: NaiveDate,
    /// Raw combined header text the date was parsed from.
    pub context: String,
    pub value: f64,
}

// ── Inline XBRL ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XbrlContext {
    pub entity: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub instant: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct XbrlFact {
    pub id: String,
    pub name: String,
    pub prefix: String,
    pub local_name: String,
    pub value: Option<f64>,
    pub unit: String,
    pub context_ref: String,
    pub entity: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub instant: Option<NaiveDate>,
    pub decimals: Option<String>,
    pub is_nil: bool,
}

// ── Offering terms ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferingTerms {
    pub public_offering_price_per_share: Option<f64>,
    pub public_offering_price_total: Option<f64>,
    pub underwriting_discount_per_share: Option<f64>,
    pub underwriting_discount_total: Option<f64>,
    pub proceeds_per_share: Option<f64>,
    pub proceeds_total: Option<f64>,
}

impl OfferingTerms {
    pub fn is_empty(&self) -> bool {
        self.columns().iter().all(|(_, v)| v.is_none())
    }

    pub fn columns(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("public_offering_price_per_share", self.public_offering_price_per_share),
            ("public_offering_price_total", self.public_offering_price_total),
            ("underwriting_discount_per_share", self.underwriting_discount_per_share),
            ("underwriting_discount_total", self.underwriting_discount_total),
            ("proceeds_per_share", self.proceeds_per_share),
            ("proceeds_total", self.proceeds_total),
        ]
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// Column-ordered table of optional cells. Pushing a row that names a new
/// column appends that column; rows written earlier read it as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty dataset that still writes a header.
    pub fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(i) = self.column_index(name) {
            return i;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
        self.columns.len() - 1
    }

    /// Append a row given as `(column, value)` pairs. A repeated column keeps
    /// its first value.
    pub fn push_record<K, V, I>(&mut self, record: I)
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut row: Vec<Option<String>> = vec![None; self.columns.len()];
        for (name, value) in record {
            let idx = self.ensure_column(name.as_ref());
            if row.len() < self.columns.len() {
                row.resize(self.columns.len(), None);
            }
            if row[idx].is_none() {
                let value: String = value.into();
                row[idx] = if value.is_empty() { None } else { Some(value) };
            }
        }
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Union-concatenate another dataset below this one.
    pub fn append(&mut self, other: &Dataset) {
        for row in &other.rows {
            let record = other
                .columns
                .iter()
                .zip(row)
                .filter_map(|(c, v)| v.as_ref().map(|v| (c.as_str(), v.clone())));
            self.push_record(record);
        }
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    pub fn get_f64(&self, row: usize, column: &str) -> Option<f64> {
        self.get(row, column)?.trim().parse().ok()
    }

    pub fn set(&mut self, row: usize, column: &str, value: Option<String>) {
        let idx = self.ensure_column(column);
        if let Some(r) = self.rows.get_mut(row) {
            r[idx] = value;
        }
    }

    pub fn non_empty_count(&self, column: usize) -> usize {
        self.rows.iter().filter(|r| r[column].is_some()).count()
    }

    pub fn drop_columns(&mut self, drop: impl Fn(usize, &str) -> bool) {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| !drop(i, c))
            .collect();
        let mut i = 0;
        self.columns.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
        for row in &mut self.rows {
            let mut i = 0;
            row.retain(|_| {
                let k = keep[i];
                i += 1;
                k
            });
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
