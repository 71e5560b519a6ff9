//! Financial ratios and valuation features from the XBRL pivot.
//!
//! Inputs are the `<Element>_current` columns written by the xbrl stage and
//! the listing's `public_price_per_share`. A feature is written only when all
//! of its inputs are present and its denominator is non-zero.

use crate::models::Dataset;
use crate::utils::fmt_value;

const PRICE_COLUMN: &str = "public_price_per_share";

/// One company's latest reported values.
struct Financials<'a> {
    ds: &'a Dataset,
    row: usize,
}

impl Financials<'_> {
    fn get(&self, element: &str) -> Option<f64> {
        self.ds.get_f64(self.row, &format!("{element}_current"))
    }

    fn price(&self) -> Option<f64> {
        self.ds.get_f64(self.row, PRICE_COLUMN)
    }
}

fn div(n: Option<f64>, d: Option<f64>) -> Option<f64> {
    let (n, d) = (n?, d?);
    if d == 0.0 { None } else { Some(n / d) }
}

fn sub(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

fn add(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? + b?)
}

fn mul(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? * b?)
}

/// Every feature for one company, in a fixed order.
fn company_features(f: &Financials) -> Vec<(&'static str, Option<f64>)> {
    let revenue = f.get("Revenues");
    let assets = f.get("Assets");
    let liabilities = f.get("Liabilities");
    let net_income = f.get("NetIncomeLoss");
    let operating = f.get("OperatingIncomeLoss");
    let cogs = f.get("CostOfGoodsAndServicesSold");
    let inventory = f.get("InventoryNet");
    let receivables = f.get("AccountsReceivableNet");
    let assets_current = f.get("AssetsCurrent");
    let liabilities_current = f.get("LiabilitiesCurrent");
    let cash = f.get("Cash");
    let shares = f.get("SharesOutstanding");
    let depreciation = f.get("DepreciationAndAmortization");
    let eps_basic = f.get("EarningsPerShareBasic");
    let price = f.price();

    let equity = sub(assets, liabilities);
    let book_value_per_share = div(equity, shares);
    let working_capital = sub(assets_current, liabilities_current);
    let market_cap = mul(price, shares);
    let enterprise_value = sub(add(market_cap, liabilities), cash);

    vec![
        // profitability
        ("gross_margin", div(f.get("GrossProfit"), revenue)),
        ("operating_margin", div(operating, revenue)),
        ("net_margin", div(net_income, revenue)),
        ("roa", div(net_income, assets)),
        ("roe", div(net_income, equity)),
        // efficiency
        ("asset_turnover", div(revenue, assets)),
        ("receivables_turnover", div(revenue, receivables)),
        ("inventory_turnover", div(cogs, inventory)),
        // liquidity
        ("current_ratio", div(assets_current, liabilities_current)),
        ("quick_ratio", div(sub(assets_current, inventory), liabilities_current)),
        ("cash_ratio", div(cash, liabilities_current)),
        // leverage
        ("debt_to_assets", div(liabilities, assets)),
        ("debt_to_equity", div(liabilities, equity)),
        // per share
        ("book_value_per_share", book_value_per_share),
        ("revenue_per_share", div(revenue, shares)),
        ("cash_per_share", div(cash, shares)),
        // cost structure
        ("working_capital", working_capital),
        ("working_capital_ratio", div(working_capital, revenue)),
        ("cogs_ratio", div(cogs, revenue)),
        (
            "employee_cost_ratio",
            div(f.get("EmployeeBenefitsAndShareBasedCompensation"), revenue),
        ),
        ("capex_intensity", div(depreciation, revenue)),
        // valuation at the offer price
        ("market_cap_at_ipo", market_cap),
        ("price_to_sales", div(market_cap, revenue)),
        ("price_to_book", div(price, book_value_per_share)),
        ("price_to_earnings", div(price, eps_basic)),
        ("enterprise_value", enterprise_value),
        ("ev_to_revenue", div(enterprise_value, revenue)),
        ("ev_to_ebitda", div(enterprise_value, add(operating, depreciation))),
        ("cash_as_pct_of_market_cap", div(cash, market_cap)),
        // IPO specific
        ("cash_runway_months", div(cash, operating.map(|o| o.abs() / 12.0))),
        ("dilution_ratio", div(f.get("EarningsPerShareDiluted"), eps_basic)),
        ("interest_coverage", div(operating, f.get("InterestExpense"))),
        ("days_sales_outstanding", div(receivables, revenue).map(|r| r * 365.0)),
        ("days_inventory_outstanding", div(inventory, cogs).map(|r| r * 365.0)),
    ]
}

// ── Scores ────────────────────────────────────────────────────────────────────

const PROFITABILITY: [&str; 5] = ["gross_margin", "operating_margin", "net_margin", "roa", "roe"];
const HEALTH: [&str; 3] = ["current_ratio", "quick_ratio", "cash_ratio"];
const EFFICIENCY: [&str; 3] = ["asset_turnover", "receivables_turnover", "inventory_turnover"];

/// Percentile rank of each present value (ties share their average rank).
fn percentile_ranks(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut present: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    present.sort_by(|a, b| a.1.total_cmp(&b.1));

    let n = present.len() as f64;
    let mut ranks = vec![None; values.len()];
    let mut i = 0;
    while i < present.len() {
        let mut j = i;
        while j + 1 < present.len() && present[j + 1].1 == present[i].1 {
            j += 1;
        }
        // 1-based average rank of the tie group
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &(idx, _) in &present[i..=j] {
            ranks[idx] = Some(rank / n);
        }
        i = j + 1;
    }
    ranks
}

fn column_values(ds: &Dataset, column: &str) -> Vec<Option<f64>> {
    (0..ds.len()).map(|r| ds.get_f64(r, column)).collect()
}

/// Sum of per-component percentile ranks scaled by `weight`, each capped at
/// `cap`. Missing components contribute nothing.
fn score(ds: &Dataset, components: &[&str], weight: f64, cap: f64) -> Vec<f64> {
    let mut total = vec![0.0; ds.len()];
    for component in components {
        for (row, rank) in percentile_ranks(&column_values(ds, component)).into_iter().enumerate() {
            if let Some(rank) = rank {
                total[row] += (rank * weight).min(cap);
            }
        }
    }
    total
}

/// Add every derivable feature and the cross-sectional quality scores.
pub fn derive_features(pivot: &Dataset) -> Dataset {
    let mut out = pivot.clone();

    for row in 0..pivot.len() {
        let financials = Financials { ds: pivot, row };
        for (name, value) in company_features(&financials) {
            if let Some(value) = value.filter(|v| v.is_finite()) {
                out.set(row, name, Some(fmt_value(value)));
            }
        }
    }

    let scores = [
        ("profitability_score", score(&out, &PROFITABILITY, 20.0, 20.0)),
        ("financial_health_score", score(&out, &HEALTH, 33.33, 33.33)),
        ("efficiency_score", score(&out, &EFFICIENCY, 33.33, 33.33)),
    ];
    for (name, values) in scores {
        for (row, value) in values.into_iter().enumerate() {
            out.set(row, name, Some(fmt_value(value)));
        }
    }

    out
}
