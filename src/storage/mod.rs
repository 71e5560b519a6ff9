use crate::config::PathsConfig;
use crate::fetch::filing_path;
use crate::models::{Dataset, Grid, IpoListing};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

// ── Layout ────────────────────────────────────────────────────────────────────

pub const COMBINED_CSV: &str = "combined.csv";
pub const CLEAN_FINANCIAL_CSV: &str = "clean_financial.csv";
pub const FACTS_CSV: &str = "facts.csv";
pub const PIVOT_CSV: &str = "pivot_table.csv";
pub const WORD_ANALYSIS_CSV: &str = "word_analysis.csv";
pub const OFFERING_JSON: &str = "offering.json";

pub const ALL_FINANCIAL_CSV: &str = "all_financial.csv";
pub const ALL_FINANCIAL_REDUCED_CSV: &str = "all_financial_reduced.csv";
pub const FULL_EDA_CSV: &str = "full_eda.csv";
pub const NO_FILES_FOUND_CSV: &str = "no_files_found.csv";
pub const UNPARSED_CSV: &str = "unparsed.csv";
pub const KEYWORD_DATASET_CSV: &str = "keyword_dataset.csv";
pub const LOW_COUNT_COLUMNS_CSV: &str = "low_count_columns.csv";
pub const IPO_FEATURES_CSV: &str = "ipo_features.csv";
pub const TRAINING_DATASET_CSV: &str = "training_dataset.csv";

// ── Repository ────────────────────────────────────────────────────────────────

/// The shared directory tree every stage reads from and writes to.
pub struct Repository {
    paths: PathsConfig,
}

impl Repository {
    pub fn open(paths: &PathsConfig) -> Result<Self> {
        for dir in [&paths.filings_dir, &paths.finance_dir, &paths.output_dir] {
            std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
        }
        Ok(Self {
            paths: paths.clone(),
        })
    }

    pub fn index_csv(&self) -> &Path {
        &self.paths.index_csv
    }

    pub fn filings_dir(&self) -> &Path {
        &self.paths.filings_dir
    }

    pub fn filing(&self, listing: &IpoListing) -> PathBuf {
        filing_path(&self.paths.filings_dir, listing)
    }

    /// Per-company file next to the filing (`facts.csv`, `pivot_table.csv`, ...).
    pub fn filing_file(&self, symbol: &str, name: &str) -> PathBuf {
        self.paths.filings_dir.join(symbol).join(name)
    }

    pub fn finance_dir(&self, symbol: &str) -> PathBuf {
        self.paths.finance_dir.join(symbol)
    }

    pub fn finance_file(&self, symbol: &str, name: &str) -> PathBuf {
        self.finance_dir(symbol).join(name)
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.paths.output_dir.join(name)
    }
}

// ── Writers ───────────────────────────────────────────────────────────────────

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }
    Ok(())
}

/// Write a grid under a header of column positions `0,1,2,...`.
pub fn write_grid(path: &Path, grid: &Grid) -> Result<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    writer.write_record((0..grid.width()).map(|i| i.to_string()))?;
    for row in &grid.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    debug!("Wrote {} rows to {:?}", grid.height(), path);
    Ok(())
}

pub fn write_dataset(path: &Path, ds: &Dataset) -> Result<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    writer.write_record(&ds.columns)?;
    for row in &ds.rows {
        writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or_default()))?;
    }
    writer.flush()?;
    debug!("Wrote {} rows x {} columns to {:?}", ds.len(), ds.columns.len(), path);
    Ok(())
}

pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut ds = Dataset::new();
    ds.columns = columns.clone();

    for result in reader.records() {
        let record = result.with_context(|| format!("Malformed row in {:?}", path))?;
        let mut row: Vec<Option<String>> = record
            .iter()
            .take(columns.len())
            .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
            .collect();
        row.resize(columns.len(), None);
        ds.rows.push(row);
    }
    Ok(ds)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    create_parent(path)?;
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("Failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OfferingTerms;

    #[test]
    fn grid_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SMLR/0.csv");
        let grid = Grid::from_rows(vec![
            vec!["Revenue".into(), "1,000".into()],
            vec!["Cash, end of period".into(), "".into()],
        ]);
        write_grid(&path, &grid).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("0,1\n"));
        assert_eq!(crate::loader::load_grid(&path).unwrap(), grid);
    }

    #[test]
    fn dataset_keeps_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all.csv");
        let mut ds = Dataset::new();
        ds.push_record([("symbol", "A"), ("revenue_recent", "10")]);
        ds.push_record([("symbol", "B"), ("cash_recent", "3")]);
        write_dataset(&path, &ds).unwrap();

        let back = read_dataset(&path).unwrap();
        assert_eq!(back, ds);
        assert_eq!(back.get(1, "revenue_recent"), None);
    }

    #[test]
    fn repository_lays_out_per_company_paths() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig {
            index_csv: dir.path().join("ipo_day_summary.csv"),
            filings_dir: dir.path().join("sec-ipo-files"),
            finance_dir: dir.path().join("sec-ipo-finance"),
            output_dir: dir.path().to_path_buf(),
        };
        let repo = Repository::open(&paths).unwrap();
        assert!(paths.finance_dir.is_dir());
        assert_eq!(
            repo.finance_file("SMLR", COMBINED_CSV),
            dir.path().join("sec-ipo-finance/SMLR/combined.csv")
        );

        let terms = OfferingTerms {
            public_offering_price_per_share: Some(10.0),
            ..Default::default()
        };
        let json = repo.finance_file("SMLR", OFFERING_JSON);
        write_json(&json, &terms).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(value["public_offering_price_per_share"], 10.0);
    }
}
