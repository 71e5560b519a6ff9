//! Readers for the listing index and intermediate table CSVs.

use crate::models::{Grid, IpoListing};
use crate::prospectus::cleaner::clean_cell;
use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Read the listing index. `symbol` and `url` are required columns (any
/// case); every other column rides along in `extra`. Repeated symbols keep
/// their first row.
pub fn load_listings(path: &Path) -> Result<Vec<IpoListing>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open listing index {:?}", path))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("No header row in {:?}", path))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let (Some(symbol_idx), Some(url_idx)) = (find("symbol"), find("url")) else {
        bail!("{:?} needs `symbol` and `url` columns, found {:?}", path, headers);
    };

    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Row {} in {:?}: {}", i + 1, path, e);
                continue;
            }
        };

        let symbol = record.get(symbol_idx).unwrap_or_default().trim().to_string();
        if symbol.is_empty() {
            warn!("Row {} in {:?}: no symbol", i + 1, path);
            continue;
        }
        if !seen.insert(symbol.clone()) {
            debug!("{}: duplicate listing row skipped", symbol);
            continue;
        }

        let extra = headers
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != symbol_idx && *j != url_idx)
            .map(|(j, h)| (h.clone(), record.get(j).unwrap_or_default().trim().to_string()))
            .collect();

        listings.push(IpoListing {
            symbol,
            url: record.get(url_idx).unwrap_or_default().trim().to_string(),
            extra,
        });
    }

    info!("{} listings loaded from {:?}", listings.len(), path);
    Ok(listings)
}

/// Read a table CSV written by the extract stage. The header row only holds
/// column positions and is skipped.
pub fn load_grid(path: &Path) -> Result<Grid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.with_context(|| format!("Malformed row in {:?}", path))?;
        rows.push(record.iter().map(clean_cell).collect());
    }
    Ok(Grid::from_rows(rows))
}

/// CSV files directly under `dir`, sorted by name.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|e| e == "csv").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_keep_extra_columns_and_first_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.csv");
        std::fs::write(
            &path,
            "Symbol,url,volume,close\n\
             SMLR,https://www.sec.gov/a/form424b4.htm,1000,12.5\n\
             SMLR,https://www.sec.gov/b/other.htm,1,1\n\
             ,https://www.sec.gov/c/none.htm,1,1\n\
             ABCD,https://www.sec.gov/d/abcd.htm,,9\n",
        )
        .unwrap();

        let listings = load_listings(&path).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].symbol, "SMLR");
        assert_eq!(listings[0].file_name(), "form424b4.htm");
        assert_eq!(listings[0].extra[1], ("close".to_string(), "12.5".to_string()));
        assert_eq!(
            listings[1].extra,
            vec![
                ("volume".to_string(), String::new()),
                ("close".to_string(), "9".to_string())
            ]
        );
    }

    #[test]
    fn listings_require_key_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.csv");
        std::fs::write(&path, "ticker,link\nA,b\n").unwrap();
        assert!(load_listings(&path).is_err());
    }

    #[test]
    fn grid_skips_position_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.csv");
        std::fs::write(&path, "0,1,2\nRevenue, 10 ,\nCash,3\n").unwrap();

        let grid = load_grid(&path).unwrap();
        assert_eq!(grid.rows, vec![vec!["Revenue", "10", ""], vec!["Cash", "3", ""]]);
    }

    #[test]
    fn discovers_sorted_csvs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["1.csv", "0.csv", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let files = discover_csv_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["0.csv", "1.csv"]);
        assert!(discover_csv_files(&dir.path().join("missing")).unwrap().is_empty());
    }
}
