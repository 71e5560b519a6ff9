use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

/// Directory layout shared by every stage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Listing index: one row per IPO with at least `symbol` and `url`.
    #[serde(default = "default_index_csv")]
    pub index_csv: PathBuf,

    /// `<filings_dir>/<SYMBOL>/<file>` holds the raw prospectus.
    #[serde(default = "default_filings_dir")]
    pub filings_dir: PathBuf,

    /// `<finance_dir>/<SYMBOL>/` holds extracted tables and per-company outputs.
    #[serde(default = "default_finance_dir")]
    pub finance_dir: PathBuf,

    /// Aggregate outputs land here.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// Filing acquisition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// SEC asks for a contact in the User-Agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Local mirror roots, searched in order, laid out as `<root>/<SYMBOL>/<file>`.
    #[serde(default)]
    pub mirror_dirs: Vec<PathBuf>,
}

/// Heuristics for table, fact and keyword extraction
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractConfig {
    #[serde(default = "default_table_keywords")]
    pub table_keywords: Vec<String>,

    #[serde(default = "default_min_table_rows")]
    pub min_table_rows: usize,

    #[serde(default = "default_line_item_keywords")]
    pub line_item_keywords: Vec<String>,

    #[serde(default = "default_max_label_len")]
    pub max_label_len: usize,

    #[serde(default = "default_sparse_threshold")]
    pub sparse_column_threshold: f64,

    #[serde(default = "default_xbrl_patterns")]
    pub xbrl_patterns: Vec<String>,

    #[serde(default = "default_text_keywords")]
    pub text_keywords: Vec<String>,

    #[serde(default = "default_underwriters")]
    pub underwriters: Vec<String>,

    #[serde(default = "default_excluded_columns")]
    pub excluded_column_words: Vec<String>,

    #[serde(default = "default_low_count_max")]
    pub low_count_max: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_index_csv() -> PathBuf {
    PathBuf::from("data/ipo_day_summary.csv")
}
fn default_filings_dir() -> PathBuf {
    PathBuf::from("data/sec-ipo-files")
}
fn default_finance_dir() -> PathBuf {
    PathBuf::from("data/sec-ipo-finance")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay_ms() -> u64 {
    150
}
fn default_jitter_ms() -> u64 {
    100
}
fn default_max_retries() -> u32 {
    3
}
fn default_user_agent() -> String {
    "ipo-prospectus-etl/0.1 research@example.com".to_string()
}
fn default_min_table_rows() -> usize {
    4
}
fn default_max_label_len() -> usize {
    30
}
fn default_sparse_threshold() -> f64 {
    0.60
}
fn default_low_count_max() -> usize {
    6
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_table_keywords() -> Vec<String> {
    strings(&[
        "Revenue", "Accounts Receivable", "Liabilities", "Assets", "Cash", "Common Stock",
        "Deferred Tax", "Inventory", "Earnings", "Operating Loss", "Months Ended", "Year Ended",
        "Depreciation",
    ])
}

fn default_line_item_keywords() -> Vec<String> {
    strings(&[
        "Revenue", "Accounts Receivable", "Earnings", "Accounts Payable", "Liabilities", "Assets",
        "Expense", "Interest", "Cash", "Debt", "Inventory", "Depreciation", "Cost", "Income",
        "Inventories", "Land", "Machinery", "Equipment", "Profit", "Operating",
        "Other Liabilities", "Property", "Sales", "Loss", "Deposits", "Capital", "Reserves",
        "Interests", "Deficit", "Equity", "Capitalization",
    ])
}

fn default_xbrl_patterns() -> Vec<String> {
    strings(&[
        "Revenue", "CostOfGoods", "CostOfRevenue", "GrossProfit", "OperatingIncome", "NetIncome",
        "EarningsPerShare", "Assets", "Cash", "AccountsReceivable", "Inventory", "Liabilities",
        "StockholdersEquity", "RetainedEarnings", "NetCashProvidedByUsedInOperating",
        "NetCashProvidedByUsedInInvesting", "NetCashProvidedByUsedInFinancing",
        "WeightedAverageNumberOfShares", "SharesOutstanding", "DepreciationAndAmortization",
        "ShareBasedCompensation", "InterestExpense", "IncomeTaxExpense",
        "EmployeeBenefitsAndShareBasedCompensation",
    ])
}

fn default_text_keywords() -> Vec<String> {
    strings(&[
        // technology
        "technology", "software", "ai", "machine learning", "cloud", "saas", "platform",
        "digital", "data", "analytics", "algorithm", "automation", "blockchain",
        "cryptocurrency", "cybersecurity", "subscription", "recurring", "e-commerce", "mobile",
        "app", "virtual",
        // industry
        "healthcare", "biotech", "pharmaceutical", "medical", "clinical", "energy", "renewable",
        "solar", "electric", "battery", "real estate", "logistics", "transportation",
        "automotive",
    ])
}

fn default_underwriters() -> Vec<String> {
    strings(&[
        "morgan stanley", "goldman sachs", "jp morgan", "jpmorgan", "citigroup", "citi",
        "bank of america", "merrill lynch", "wells fargo", "barclays", "credit suisse",
        "deutsche bank", "ubs", "jefferies", "cowen", "piper sandler", "raymond james",
        "william blair", "stifel", "canaccord", "rbc capital", "bmo capital", "evercore",
        "lazard", "moelis", "centerview",
    ])
}

fn default_excluded_columns() -> Vec<String> {
    strings(&[
        "Incorporated", "LLP", "Voting", "Shareholder", "Rights", "CEO", "CFO", "COO", "Nasdaq",
        "NYSE", "Listing", "Investor", "Bulletin", "Limited", "Adjusted", "EBITDA", "Deferred",
        "Scenario", "Plan", "Incentive", "Lease", "Trademark", "Salary", "Award", "Option",
        "Patent", "Royalty", "License", "Series", "Preference", "Officer", "Stockholder",
        "Proposal", "Compensation", "Tax", "Offering", "Warrant", "Prospectus", "Registration",
        "Exercise", "Insurance", "Mr.", "Mrs.", "Ms.",
    ])
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            index_csv: default_index_csv(),
            filings_dir: default_filings_dir(),
            finance_dir: default_finance_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
            mirror_dirs: Vec::new(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            table_keywords: default_table_keywords(),
            min_table_rows: default_min_table_rows(),
            line_item_keywords: default_line_item_keywords(),
            max_label_len: default_max_label_len(),
            sparse_column_threshold: default_sparse_threshold(),
            xbrl_patterns: default_xbrl_patterns(),
            text_keywords: default_text_keywords(),
            underwriters: default_underwriters(),
            excluded_column_words: default_excluded_columns(),
            low_count_max: default_low_count_max(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("IPO").separator("__"))
            .build()?;

        let app_cfg = cfg.try_deserialize().unwrap_or_else(|e| {
            warn!("Invalid configuration ({}), using defaults", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            fetch: FetchConfig::default(),
            extract: ExtractConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_field_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[paths]\noutput_dir = \"out\"\n[extract]\nmin_table_rows = 2\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.paths.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.paths.index_csv, default_index_csv());
        assert_eq!(cfg.extract.min_table_rows, 2);
        assert_eq!(cfg.extract.max_label_len, 30);
        assert_eq!(cfg.fetch.max_retries, 3);
    }
}
