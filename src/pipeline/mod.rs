//! Stage orchestrator: listing index → per-company files → aggregate CSVs.
//!
//! ## Stages
//!
//! `extract`   — filing → finance tables (`<i>.csv`, `combined.csv`, `offering.json`)
//! `transform` — `combined.csv` → `clean_financial.csv`, all rows → `all_financial.csv`
//! `reduce`    — `all_financial.csv` → `all_financial_reduced.csv`
//! `xbrl`      — filing → `facts.csv`, `pivot_table.csv`, all rows → `full_eda.csv`
//! `keywords`  — filing → `word_analysis.csv`, all rows → `keyword_dataset.csv`
//! `features`  — `full_eda.csv` → `ipo_features.csv`
//! `merge`     — reduced financials ⋈ keyword dataset → `training_dataset.csv`
//!
//! One company failing is logged and counted, never fatal. Aggregates are
//! built from whichever companies made it through.

use crate::config::AppConfig;
use crate::error::ExtractError;
use crate::features::derive_features;
use crate::fetch::{self, FetchStats};
use crate::loader::{discover_csv_files, load_grid, load_listings};
use crate::models::{Dataset, IpoListing, OfferingTerms};
use crate::prospectus::html::visible_text;
use crate::prospectus::keywords::{keyword_counts, offering_terms, prune_columns, underwriters};
use crate::prospectus::tables::{combine, find_finance_tables, remove_empty_columns};
use crate::prospectus::xbrl::{facts_dataset, filter_facts, parse_facts, summarise_facts};
use crate::prospectus::Prospectus;
use crate::storage::{self, Repository, read_dataset, write_dataset, write_grid, write_json};
use crate::transform::reduce::{combine_like_terms, drop_sparse_columns};
use crate::transform::{pivot, reconcile};
use crate::utils::{Timer, fmt_number};
use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct StageStats {
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub rows_written: usize,
}

impl fmt::Display for StageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} companies | {} ok | {} skipped | {} rows",
            fmt_number(self.processed),
            fmt_number(self.succeeded),
            fmt_number(self.skipped),
            fmt_number(self.rows_written)
        )
    }
}

/// File counts for `stats`.
#[derive(Debug, Default)]
pub struct WorkspaceStats {
    pub listings: usize,
    pub filings: usize,
    pub finance_tables: usize,
    pub per_company: Vec<(&'static str, usize)>,
    pub aggregates: Vec<(&'static str, Option<usize>)>,
}

fn log_skip(symbol: &str, stage: &str, e: &anyhow::Error) {
    match e.downcast_ref::<ExtractError>() {
        Some(reason) => info!("{}: skipped by {} ({})", symbol, stage, reason),
        None => warn!("{}: {} failed: {:#}", symbol, stage, e),
    }
}

fn listing_record(listing: &IpoListing) -> Vec<(String, String)> {
    let mut record = vec![
        ("symbol".to_string(), listing.symbol.clone()),
        ("url".to_string(), listing.url.clone()),
    ];
    record.extend(listing.extra.iter().cloned());
    record
}

pub struct Pipeline {
    config: AppConfig,
    repo: Repository,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Result<Self> {
        let repo = Repository::open(&config.paths).context("Failed to prepare data directories")?;
        Ok(Self { config, repo })
    }

    fn listings(&self) -> Result<Vec<IpoListing>> {
        load_listings(self.repo.index_csv())
    }

    fn open_filing(&self, listing: &IpoListing) -> Result<Prospectus> {
        Prospectus::open(&self.repo.filing(listing))
    }

    /// Run `step` for every listing, counting outcomes.
    fn for_each_company<F>(&self, stage: &str, listings: &[IpoListing], mut step: F) -> StageStats
    where
        F: FnMut(&IpoListing) -> Result<usize>,
    {
        let mut stats = StageStats::default();
        for listing in listings {
            stats.processed += 1;
            match step(listing) {
                Ok(rows) => {
                    stats.succeeded += 1;
                    stats.rows_written += rows;
                }
                Err(e) => {
                    log_skip(&listing.symbol, stage, &e);
                    stats.skipped += 1;
                }
            }
        }
        stats
    }

    fn write_aggregate(&self, name: &str, ds: &Dataset) -> Result<()> {
        if ds.is_empty() {
            warn!("{}: nothing to write", name);
            return Ok(());
        }
        write_dataset(&self.repo.output(name), ds)?;
        info!("{}: {} rows x {} columns", name, ds.len(), ds.columns.len());
        Ok(())
    }

    // ── Extract ───────────────────────────────────────────────────────────────

    pub fn extract(&self) -> Result<StageStats> {
        let _t = Timer::start("Extract finance tables");
        let listings = self.listings()?;
        let cfg = &self.config.extract;

        let stats = self.for_each_company("extract", &listings, |listing| {
            let symbol = &listing.symbol;
            let grids = self.open_filing(listing)?.tables()?;

            let terms = offering_terms(&grids);
            if !terms.is_empty() {
                write_json(&self.repo.finance_file(symbol, storage::OFFERING_JSON), &terms)?;
            }

            let mut finance = find_finance_tables(grids, &cfg.table_keywords, cfg.min_table_rows)?;
            for (i, grid) in finance.iter_mut().enumerate() {
                remove_empty_columns(grid);
                write_grid(&self.repo.finance_file(symbol, &format!("{i}.csv")), grid)?;
            }

            let combined = combine(&finance);
            write_grid(&self.repo.finance_file(symbol, storage::COMBINED_CSV), &combined)?;
            debug!("{}: {} finance tables, {} rows combined", symbol, finance.len(), combined.height());
            Ok(combined.height())
        });

        info!("Extract: {}", stats);
        Ok(stats)
    }

    // ── Transform ─────────────────────────────────────────────────────────────

    fn offering(&self, symbol: &str) -> Option<OfferingTerms> {
        let path = self.repo.finance_file(symbol, storage::OFFERING_JSON);
        let body = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&body).ok()
    }

    pub fn transform(&self) -> Result<StageStats> {
        let _t = Timer::start("Transform finance tables");
        let listings = self.listings()?;
        let cfg = &self.config.extract;
        let mut all = Dataset::new();

        let stats = self.for_each_company("transform", &listings, |listing| {
            let symbol = &listing.symbol;
            let combined_path = self.repo.finance_file(symbol, storage::COMBINED_CSV);
            if !combined_path.exists() {
                return Err(ExtractError::MissingFiling(combined_path.display().to_string()).into());
            }

            let summary = reconcile(load_grid(&combined_path)?, &cfg.line_item_keywords, cfg.max_label_len)?;
            let document_length = self.open_filing(listing).ok().map(|doc| doc.document_length());

            let offering = self.offering(symbol);
            let row = pivot(&summary, listing, document_length, offering.as_ref());

            write_dataset(&self.repo.finance_file(symbol, storage::CLEAN_FINANCIAL_CSV), &row)?;
            all.append(&row);
            Ok(1)
        });

        self.write_aggregate(storage::ALL_FINANCIAL_CSV, &all)?;
        info!("Transform: {}", stats);
        Ok(stats)
    }

    // ── Reduce ────────────────────────────────────────────────────────────────

    pub fn reduce(&self) -> Result<StageStats> {
        let _t = Timer::start("Reduce financial dataset");
        let path = self.repo.output(storage::ALL_FINANCIAL_CSV);
        if !path.exists() {
            bail!("{:?} not found, run `transform` first", path);
        }

        let mut ds = read_dataset(&path)?;
        combine_like_terms(&mut ds);
        let dropped = drop_sparse_columns(&mut ds, self.config.extract.sparse_column_threshold);
        info!("Dropped {} sparse columns, {} remain", dropped, ds.columns.len());
        self.write_aggregate(storage::ALL_FINANCIAL_REDUCED_CSV, &ds)?;

        Ok(StageStats {
            processed: ds.len(),
            succeeded: ds.len(),
            skipped: 0,
            rows_written: ds.len(),
        })
    }

    // ── XBRL ──────────────────────────────────────────────────────────────────

    pub fn xbrl(&self) -> Result<StageStats> {
        let _t = Timer::start("Inline XBRL facts");
        let listings = self.listings()?;
        let mut all = Dataset::new();
        let mut no_files = Dataset::with_columns(&["symbol", "file"]);
        let mut unparsed = Dataset::with_columns(&["symbol", "reason"]);

        let stats = self.for_each_company("xbrl", &listings, |listing| {
            let symbol = &listing.symbol;
            let filing = self.repo.filing(listing);
            if !filing.exists() {
                no_files.push_record([("symbol", symbol.clone()), ("file", listing.file_name())]);
                return Err(ExtractError::MissingFiling(filing.display().to_string()).into());
            }

            let doc = Prospectus::open(&filing)?;
            let facts = match filter_facts(parse_facts(&doc.document()), &self.config.extract.xbrl_patterns) {
                Ok(facts) => facts,
                Err(e) => {
                    unparsed.push_record([("symbol", symbol.clone()), ("reason", e.to_string())]);
                    return Err(e.into());
                }
            };

            write_dataset(&self.repo.filing_file(symbol, storage::FACTS_CSV), &facts_dataset(&facts))?;

            let mut record = summarise_facts(&facts);
            record.extend(listing_record(listing));
            let mut row = Dataset::new();
            row.push_record(record);
            write_dataset(&self.repo.filing_file(symbol, storage::PIVOT_CSV), &row)?;
            all.append(&row);
            Ok(facts.len())
        });

        self.write_aggregate(storage::FULL_EDA_CSV, &all)?;
        write_dataset(&self.repo.output(storage::NO_FILES_FOUND_CSV), &no_files)?;
        write_dataset(&self.repo.output(storage::UNPARSED_CSV), &unparsed)?;
        info!("XBRL: {} ({} without filings, {} unparsed)", stats, no_files.len(), unparsed.len());
        Ok(stats)
    }

    // ── Keywords ──────────────────────────────────────────────────────────────

    pub fn keywords(&self) -> Result<StageStats> {
        let _t = Timer::start("Keyword analysis");
        let listings = self.listings()?;
        let cfg = &self.config.extract;
        let mut all = Dataset::new();

        let stats = self.for_each_company("keywords", &listings, |listing| {
            let doc = self.open_filing(listing)?;
            let text = visible_text(&doc.cleaned());
            let tables = doc.tables().unwrap_or_default();

            let mut record: Vec<(String, String)> = keyword_counts(&text, &cfg.text_keywords)?
                .into_iter()
                .map(|(kw, n)| (kw, n.to_string()))
                .collect();
            record.extend(
                underwriters(&text, &tables, &cfg.underwriters)
                    .into_iter()
                    .map(|name| (name, "1".to_string())),
            );
            record.extend(listing_record(listing));

            let mut row = Dataset::new();
            row.push_record(record);
            write_dataset(&self.repo.filing_file(&listing.symbol, storage::WORD_ANALYSIS_CSV), &row)?;
            all.append(&row);
            Ok(1)
        });

        let mut keep: Vec<&str> = vec!["symbol", "url"];
        if let Some(first) = listings.first() {
            keep.extend(first.extra.iter().map(|(name, _)| name.as_str()));
        }
        let low = prune_columns(&mut all, &cfg.excluded_column_words, cfg.low_count_max, &keep);
        write_dataset(&self.repo.output(storage::LOW_COUNT_COLUMNS_CSV), &low)?;
        self.write_aggregate(storage::KEYWORD_DATASET_CSV, &all)?;

        info!("Keywords: {} ({} low-count columns dropped)", stats, low.len());
        Ok(stats)
    }

    // ── Features ──────────────────────────────────────────────────────────────

    pub fn features(&self) -> Result<StageStats> {
        let _t = Timer::start("Feature engineering");
        let path = self.repo.output(storage::FULL_EDA_CSV);
        if !path.exists() {
            bail!("{:?} not found, run `xbrl` first", path);
        }

        let features = derive_features(&read_dataset(&path)?);
        self.write_aggregate(storage::IPO_FEATURES_CSV, &features)?;
        Ok(StageStats {
            processed: features.len(),
            succeeded: features.len(),
            skipped: 0,
            rows_written: features.len(),
        })
    }

    // ── Merge ─────────────────────────────────────────────────────────────────

    pub fn merge(&self) -> Result<StageStats> {
        let _t = Timer::start("Merge training dataset");
        let fin_path = self.repo.output(storage::ALL_FINANCIAL_REDUCED_CSV);
        let kw_path = self.repo.output(storage::KEYWORD_DATASET_CSV);
        for path in [&fin_path, &kw_path] {
            if !path.exists() {
                bail!("{:?} not found", path);
            }
        }

        let financial = read_dataset(&fin_path)?;
        let keywords = read_dataset(&kw_path)?;
        let joined = inner_join(&financial, &keywords, "symbol")?;
        self.write_aggregate(storage::TRAINING_DATASET_CSV, &joined)?;

        Ok(StageStats {
            processed: financial.len(),
            succeeded: joined.len(),
            skipped: financial.len().saturating_sub(joined.len()),
            rows_written: joined.len(),
        })
    }

    /// extract → transform → reduce
    pub fn run(&self) -> Result<Vec<(&'static str, StageStats)>> {
        let _t = Timer::start("Financial pipeline");
        Ok(vec![
            ("extract", self.extract()?),
            ("transform", self.transform()?),
            ("reduce", self.reduce()?),
        ])
    }

    // ── Fetch ─────────────────────────────────────────────────────────────────

    pub async fn fetch(&self) -> Result<FetchStats> {
        let _t = Timer::start("Fetch filings");
        let listings = self.listings()?;
        let sources = fetch::default_sources(&self.config.fetch)?;
        fetch::fetch_all(&sources, &listings, self.repo.filings_dir()).await
    }

    // ── Stats ─────────────────────────────────────────────────────────────────

    pub fn stats(&self) -> Result<WorkspaceStats> {
        let listings = self.listings()?;
        let repo = &self.repo;

        let per_company = vec![
            (
                storage::COMBINED_CSV,
                count_existing(&listings, |l| repo.finance_file(&l.symbol, storage::COMBINED_CSV)),
            ),
            (
                storage::CLEAN_FINANCIAL_CSV,
                count_existing(&listings, |l| repo.finance_file(&l.symbol, storage::CLEAN_FINANCIAL_CSV)),
            ),
            (
                storage::FACTS_CSV,
                count_existing(&listings, |l| repo.filing_file(&l.symbol, storage::FACTS_CSV)),
            ),
            (
                storage::WORD_ANALYSIS_CSV,
                count_existing(&listings, |l| repo.filing_file(&l.symbol, storage::WORD_ANALYSIS_CSV)),
            ),
        ];

        let mut aggregates = Vec::new();
        for name in [
            storage::ALL_FINANCIAL_CSV,
            storage::ALL_FINANCIAL_REDUCED_CSV,
            storage::FULL_EDA_CSV,
            storage::KEYWORD_DATASET_CSV,
            storage::IPO_FEATURES_CSV,
            storage::TRAINING_DATASET_CSV,
        ] {
            aggregates.push((name, row_count(&repo.output(name))?));
        }

        let mut finance_tables = 0;
        for listing in &listings {
            finance_tables += self.table_files(&listing.symbol)?.len();
        }

        Ok(WorkspaceStats {
            listings: listings.len(),
            filings: count_existing(&listings, |l| repo.filing(l)),
            finance_tables,
            per_company,
            aggregates,
        })
    }

    /// Finance table CSVs written for one company.
    pub fn table_files(&self, symbol: &str) -> Result<Vec<PathBuf>> {
        Ok(discover_csv_files(&self.repo.finance_dir(symbol))?
            .into_iter()
            .filter(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.parse::<usize>().is_ok())
                    .unwrap_or(false)
            })
            .collect())
    }
}

fn count_existing(listings: &[IpoListing], path_of: impl Fn(&IpoListing) -> PathBuf) -> usize {
    listings.iter().filter(|l| path_of(l).exists()).count()
}

fn row_count(path: &Path) -> Result<Option<usize>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(read_dataset(path)?.len()))
}

/// Rows of `left` with a matching `key` in `right`, right-hand columns
/// appended. A column on both sides is taken from `left` only, empty cells
/// included.
pub fn inner_join(left: &Dataset, right: &Dataset, key: &str) -> Result<Dataset> {
    let (Some(lk), Some(rk)) = (left.column_index(key), right.column_index(key)) else {
        bail!("both datasets need a `{}` column", key);
    };

    let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows.iter().enumerate() {
        if let Some(k) = row[rk].as_deref() {
            by_key.entry(k).or_default().push(i);
        }
    }

    let mut joined = Dataset::new();
    for row in &left.rows {
        let Some(k) = row[lk].as_deref() else { continue };
        for &ri in by_key.get(k).into_iter().flatten() {
            let left_cells = left.columns.iter().zip(row);
            let right_cells = right
                .columns
                .iter()
                .zip(&right.rows[ri])
                .filter(|(c, _)| left.column_index(c).is_none());
            let record = left_cells
                .chain(right_cells)
                .map(|(c, v)| (c.as_str(), v.clone().unwrap_or_default()));
            joined.push_record(record);
        }
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractConfig, FetchConfig, PathsConfig};

    const FILING: &str = r#"<html><body>
<div style="display:none">
  <xbrli:context id="c2022"><xbrli:entity><xbrli:identifier>0001</xbrli:identifier></xbrli:entity><xbrli:period><xbrli:instant>2022-12-31</xbrli:instant></xbrli:period></xbrli:context>
  <xbrli:context id="c2023"><xbrli:entity><xbrli:identifier>0001</xbrli:identifier></xbrli:entity><xbrli:period><xbrli:instant>2023-12-31</xbrli:instant></xbrli:period></xbrli:context>
  <xbrli:context id="fy2023"><xbrli:entity><xbrli:identifier>0001</xbrli:identifier></xbrli:entity><xbrli:period><xbrli:startDate>2023-01-01</xbrli:startDate><xbrli:endDate>2023-12-31</xbrli:endDate></xbrli:period></xbrli:context>
</div>
<p>Goldman Sachs is acting as lead book-running manager for this offering. We sell cloud software.</p>
<table>
<tr><td></td><td>Per Share</td><td>Total</td></tr>
<tr><td>Public offering price</td><td>$10.00</td><td>$50,000,000</td></tr>
<tr><td>Underwriting discounts</td><td>$0.70</td><td>$3,500,000</td></tr>
<tr><td>Proceeds to us</td><td>$9.30</td><td>$46,500,000</td></tr>
</table>
<table>
<tr><th></th><th colspan="2">Year Ended December 31,</th></tr>
<tr><th></th><th>2022</th><th>2023</th></tr>
<tr><td>Revenue</td><td>$1,000</td><td><ix:nonFraction name="us-gaap:Revenues" contextRef="fy2023" unitRef="usd">1,500</ix:nonFraction></td></tr>
<tr><td>Net loss</td><td>(200)</td><td>(50)</td></tr>
<tr><td>Total assets</td><td><ix:nonFraction name="us-gaap:Assets" contextRef="c2022" unitRef="usd">4,000</ix:nonFraction></td><td><ix:nonFraction name="us-gaap:Assets" contextRef="c2023" unitRef="usd">5,000</ix:nonFraction></td></tr>
</table>
</body></html>"#;

    fn pipeline(root: &Path) -> Pipeline {
        let paths = PathsConfig {
            index_csv: root.join("ipo_day_summary.csv"),
            filings_dir: root.join("sec-ipo-files"),
            finance_dir: root.join("sec-ipo-finance"),
            output_dir: root.to_path_buf(),
        };
        std::fs::write(
            &paths.index_csv,
            "symbol,url,volume,public_price_per_share\n\
             SMLR,https://www.sec.gov/Archives/edgar/data/1/000/form424b4.htm,1000,10\n\
             MISS,https://www.sec.gov/Archives/edgar/data/2/000/missing.htm,5,8\n",
        )
        .unwrap();
        std::fs::create_dir_all(paths.filings_dir.join("SMLR")).unwrap();
        std::fs::write(paths.filings_dir.join("SMLR/form424b4.htm"), FILING).unwrap();

        let config = AppConfig {
            paths,
            fetch: FetchConfig::default(),
            extract: ExtractConfig {
                low_count_max: 0,
                ..Default::default()
            },
        };
        Pipeline::new(config).unwrap()
    }

    #[test]
    fn financial_stages_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());

        let stages = p.run().unwrap();
        assert_eq!(stages[0].1, StageStats { processed: 2, succeeded: 1, skipped: 1, rows_written: 5 });
        assert_eq!(stages[1].1.succeeded, 1);
        assert_eq!(p.table_files("SMLR").unwrap().len(), 1);

        let clean = read_dataset(&dir.path().join("sec-ipo-finance/SMLR/clean_financial.csv")).unwrap();
        assert_eq!(clean.get(0, "revenue_recent"), Some("1500"));
        assert_eq!(clean.get(0, "revenue_trend"), Some("500"));
        assert_eq!(clean.get(0, "net_loss_recent"), Some("-50"));
        assert_eq!(clean.get(0, "total_assets_trend"), Some("1000"));
        assert_eq!(clean.get(0, "public_offering_price_per_share"), Some("10"));
        assert_eq!(clean.get(0, "symbol"), Some("SMLR"));
        assert!(clean.get_f64(0, "document_length").unwrap() > 0.0);

        let reduced = read_dataset(&dir.path().join("all_financial_reduced.csv")).unwrap();
        assert_eq!(reduced.len(), 1);
        assert!(reduced.column_index("url").is_none());
    }

    #[test]
    fn xbrl_features_keywords_and_merge() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());

        let xbrl = p.xbrl().unwrap();
        assert_eq!(xbrl.succeeded, 1);
        let eda = read_dataset(&dir.path().join("full_eda.csv")).unwrap();
        assert_eq!(eda.get(0, "Assets_current"), Some("5000"));
        assert_eq!(eda.get(0, "Assets_trend"), Some("1000"));
        assert_eq!(eda.get(0, "Revenues_current"), Some("1500"));
        let missing = read_dataset(&dir.path().join("no_files_found.csv")).unwrap();
        assert_eq!(missing.get(0, "symbol"), Some("MISS"));

        p.features().unwrap();
        let features = read_dataset(&dir.path().join("ipo_features.csv")).unwrap();
        assert_eq!(features.get(0, "asset_turnover"), Some("0.3"));

        p.keywords().unwrap();
        let kw = read_dataset(&dir.path().join("keyword_dataset.csv")).unwrap();
        assert_eq!(kw.get(0, "cloud"), Some("1"));
        assert_eq!(kw.get(0, "Goldman Sachs"), Some("1"));

        p.run().unwrap();
        let merged = p.merge().unwrap();
        assert_eq!(merged.rows_written, 1);
        let training = read_dataset(&dir.path().join("training_dataset.csv")).unwrap();
        assert_eq!(training.get(0, "revenue_recent"), Some("1500"));
        assert_eq!(training.get(0, "software"), Some("1"));

        let stats = p.stats().unwrap();
        assert_eq!(stats.listings, 2);
        assert_eq!(stats.filings, 1);
        assert_eq!(stats.finance_tables, 1);
        assert!(stats.aggregates.iter().all(|(_, rows)| rows.is_some()));
    }

    #[test]
    fn join_matches_on_key() {
        let mut left = Dataset::new();
        left.push_record([("symbol", "A"), ("x", "1")]);
        left.push_record([("symbol", "B"), ("x", "2")]);
        let mut right = Dataset::new();
        right.push_record([("symbol", "B"), ("y", "3"), ("x", "9")]);

        let joined = inner_join(&left, &right, "symbol").unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.columns, vec!["symbol", "x", "y"]);
        assert_eq!(joined.get(0, "x"), Some("2"));
        assert_eq!(joined.get(0, "y"), Some("3"));
    }

    #[test]
    fn join_leaves_empty_left_cells_empty() {
        let mut left = Dataset::new();
        left.push_record([("symbol", "A"), ("close", "")]);
        let mut right = Dataset::new();
        right.push_record([("symbol", "A"), ("close", "99"), ("ai", "4")]);

        let joined = inner_join(&left, &right, "symbol").unwrap();
        assert_eq!(joined.columns, vec!["symbol", "close", "ai"]);
        assert_eq!(joined.get(0, "close"), None);
        assert_eq!(joined.get(0, "ai"), Some("4"));
    }
}
