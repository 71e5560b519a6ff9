use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

// ── Patterns ──────────────────────────────────────────────────────────────────

const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTHS})\.?\s*(\d{{1,2}})(?:st|nd|rd|th)?,?\s*(\d{{4}})\b"
    ))
    .expect("date pattern")
});

/// "December 31," or "June 30" on its own, the upper half of a split header.
static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^({MONTHS})\.?\s+\d{{1,2}},?$")).expect("month-day pattern")
});

static PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:years?\s+ended?|months?\s+ended?|weeks?\s+ended?|quarters?\s+ended?|as\s+of|period\s+from)\b",
    )
    .expect("period pattern")
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:19|20)\d{2}$").expect("year pattern"));

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    let n = r"([0-9][0-9,]*(?:\.[0-9]+)?)";
    Regex::new(&format!(
        r"^(?:\$\s*\(\s*{n}\s*\)?|\(\s*\$?\s*{n}\s*\)?|[-−]\s*\$?\s*{n}|\$\s*{n}|{n})$"
    ))
    .expect("number pattern")
});

static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

// ── Cells ─────────────────────────────────────────────────────────────────────

/// Normalise raw cell text: no non-breaking or zero-width spaces, single
/// spaces, trimmed.
pub fn clean_cell(s: &str) -> String {
    let s: String = s
        .chars()
        .filter(|c| !matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}'))
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .collect();
    WS_RE.replace_all(s.trim(), " ").into_owned()
}

/// Dashes and lone currency signs that stand for "no value".
pub fn is_placeholder(s: &str) -> bool {
    matches!(s.trim(), "$" | "$—" | "—" | "$ —" | "–" | "-")
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// Parse a financial-statement number.
/// "$(21.94)" → -21.94 | "$46,624" → 46624 | "(631)" → -631 | "1,234" → 1234
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || is_placeholder(s) {
        return None;
    }

    let caps = NUMBER_RE.captures(s)?;
    // groups 1-3 are the parenthesised or minus-prefixed forms
    let (idx, m) = caps
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(i, g)| g.map(|g| (i, g)))?;

    let value: f64 = m.as_str().replace(',', "").parse().ok()?;
    if idx <= 3 { Some(-value) } else { Some(value) }
}

// ── Dates ─────────────────────────────────────────────────────────────────────

fn month_number(name: &str) -> Option<u32> {
    let m = match name.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(m)
}

/// First "Month D, YYYY" anywhere in the text.
/// "Year Ended December 31, 2023" → 2023-12-31 | "June 30th 2022" → 2022-06-30
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(s)?;
    let month = month_number(caps.get(1)?.as_str())?;
    let day: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year: i32 = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Context is exactly a "Month DD, YYYY" date.
pub fn is_exact_date(s: &str) -> bool {
    static EXACT: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^[a-z]+\s+\d{1,2},\s+\d{4}$").expect("exact date pattern")
    });
    EXACT.is_match(s.trim())
}

pub fn is_year(s: &str) -> bool {
    YEAR_RE.is_match(s.trim())
}

/// A row that carries (part of) a column's date rather than values.
pub fn is_date_header_row(cells: &[String]) -> bool {
    if cells
        .iter()
        .any(|c| parse_date(c).is_some() || PERIOD_RE.is_match(c))
    {
        return true;
    }

    // "        | 2023 | 2022" or "        | December 31, | June 30,"
    let Some((label, rest)) = cells.split_first() else {
        return false;
    };
    if !label.trim().is_empty() {
        return false;
    }
    let mut filled = rest.iter().map(|c| c.trim()).filter(|c| !c.is_empty()).peekable();
    filled.peek().is_some() && filled.all(|c| is_year(c) || MONTH_DAY_RE.is_match(c))
}

// ── Labels ────────────────────────────────────────────────────────────────────

/// Lowercase, drop punctuation, collapse whitespace.
/// "Total stockholders’ equity (deficit):" → "total stockholders equity deficit"
pub fn normalise_label(s: &str) -> String {
    let s: String = s
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '"' | ',' | '\'' | '\u{2019}' | ':' | ';' | '(' | ')' | '.' | '·'))
        .collect();
    WS_RE.replace_all(s.trim(), " ").into_owned()
}

/// "Cash and cash equivalents" → "cash_and_cash_equivalents"
pub fn to_snake_case(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
