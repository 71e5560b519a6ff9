//! Inline XBRL (`ix:nonFraction`) fact extraction.
//!
//! The HTML parser lowercases tag and attribute names, so elements are matched
//! on their lowercased local name (`nonfraction`, `context`, `instant`, ...)
//! regardless of the prefix the filer chose.

use crate::error::ExtractError;
use crate::models::{Dataset, XbrlContext, XbrlFact};
use crate::prospectus::html::element_text;
use crate::utils::fmt_value;
use chrono::{Datelike, NaiveDate};
use scraper::{ElementRef, Html};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

fn local_name<'a>(el: &ElementRef<'a>) -> &'a str {
    let name = el.value().name();
    name.rsplit(':').next().unwrap_or(name)
}

fn elements<'a>(doc: &'a Html) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    doc.root_element().descendants().filter_map(ElementRef::wrap)
}

fn child_date(el: &ElementRef, local: &str) -> Option<NaiveDate> {
    el.descendants()
        .filter_map(ElementRef::wrap)
        .find(|c| local_name(c) == local)
        .and_then(|c| NaiveDate::parse_from_str(&element_text(&c), "%Y-%m-%d").ok())
}

// ── Contexts ──────────────────────────────────────────────────────────────────

pub fn parse_contexts(doc: &Html) -> HashMap<String, XbrlContext> {
    let mut contexts = HashMap::new();
    for el in elements(doc).filter(|e| local_name(e) == "context") {
        let Some(id) = el.value().attr("id") else { continue };
        let entity = el
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|c| local_name(c) == "identifier")
            .map(|c| element_text(&c))
            .unwrap_or_default();

        contexts.insert(
            id.to_string(),
            XbrlContext {
                entity,
                start: child_date(&el, "startdate"),
                end: child_date(&el, "enddate"),
                instant: child_date(&el, "instant"),
            },
        );
    }
    contexts
}

// ── Facts ─────────────────────────────────────────────────────────────────────

/// Numeric value of an `ix:nonFraction`, honouring `format`, `scale` and `sign`.
pub fn fact_value(text: &str, format: Option<&str>, scale: Option<&str>, sign: Option<&str>) -> Option<f64> {
    let format = format.unwrap_or_default().to_ascii_lowercase();
    let text = text.trim();

    let mut value: f64 = if format.contains("zerodash") || format.contains("fixed-zero") || text == "-" || text == "—" {
        0.0
    } else if format.contains("numcommadecimal") || format.contains("num-comma-decimal") {
        text.replace(['.', ' '], "").replace(',', ".").parse().ok()?
    } else {
        text.replace([',', ' '], "").parse().ok()?
    };

    if let Some(scale) = scale.and_then(|s| s.trim().parse::<i32>().ok()) {
        value *= 10f64.powi(scale);
    }
    if sign == Some("-") {
        value = -value;
    }
    value.is_finite().then_some(value)
}

pub fn parse_facts(doc: &Html) -> Vec<XbrlFact> {
    let contexts = parse_contexts(doc);
    let mut facts = Vec::new();

    for el in elements(doc).filter(|e| local_name(e) == "nonfraction") {
        let attrs = el.value();
        let name = attrs.attr("name").unwrap_or_default().to_string();
        let (prefix, local) = match name.split_once(':') {
            Some((p, l)) => (p.to_string(), l.to_string()),
            None => (String::new(), name.clone()),
        };
        let context_ref = attrs.attr("contextref").unwrap_or_default().to_string();
        let ctx = contexts.get(&context_ref);
        let is_nil = attrs.attr("xsi:nil").map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false);

        facts.push(XbrlFact {
            id: attrs.attr("id").unwrap_or_default().to_string(),
            value: if is_nil {
                None
            } else {
                fact_value(&element_text(&el), attrs.attr("format"), attrs.attr("scale"), attrs.attr("sign"))
            },
            name,
            prefix,
            local_name: local,
            unit: attrs.attr("unitref").unwrap_or_default().to_string(),
            entity: ctx.map(|c| c.entity.clone()).unwrap_or_default(),
            period_start: ctx.and_then(|c| c.start),
            period_end: ctx.and_then(|c| c.end),
            instant: ctx.and_then(|c| c.instant),
            context_ref,
            decimals: attrs.attr("decimals").map(|s| s.to_string()),
            is_nil,
        });
    }

    debug!("{} inline XBRL facts, {} contexts", facts.len(), contexts.len());
    facts
}

/// Non-nil numeric us-gaap facts whose name matches a key pattern, one per
/// element and period.
pub fn filter_facts(facts: Vec<XbrlFact>, patterns: &[String]) -> Result<Vec<XbrlFact>, ExtractError> {
    if facts.is_empty() {
        return Err(ExtractError::NoXbrlFacts);
    }
    let patterns: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();
    let mut seen = HashSet::new();

    let kept: Vec<XbrlFact> = facts
        .into_iter()
        .filter(|f| !f.is_nil && f.value.is_some())
        .filter(|f| f.prefix.eq_ignore_ascii_case("us-gaap"))
        .filter(|f| {
            let local = f.local_name.to_lowercase();
            patterns.iter().any(|p| local.contains(p.as_str()))
        })
        .filter(|f| {
            seen.insert((
                f.local_name.clone(),
                f.period_start,
                f.period_end,
                f.instant,
                f.entity.clone(),
            ))
        })
        .collect();

    if kept.is_empty() {
        return Err(ExtractError::EmptyStage("filter_facts"));
    }
    Ok(kept)
}

// ── Periods ───────────────────────────────────────────────────────────────────

/// "2023_Annual", "2023_Q2", "2023-05", "2023-12-31_Instant" or "Unknown".
pub fn period_label(fact: &XbrlFact) -> String {
    match (fact.period_start, fact.period_end, fact.instant) {
        (Some(start), Some(end), _) => {
            let days = (end - start).num_days();
            if days > 300 {
                format!("{}_Annual", end.year())
            } else if days > 80 {
                format!("{}_Q{}", end.year(), (end.month() - 1) / 3 + 1)
            } else {
                end.format("%Y-%m").to_string()
            }
        }
        (None, Some(end), _) => end.format("%Y-%m-%d").to_string(),
        (_, None, Some(instant)) => format!("{}_Instant", instant.format("%Y-%m-%d")),
        _ => "Unknown".to_string(),
    }
}

fn date_cell(d: Option<NaiveDate>) -> String {
    d.map(|d| d.to_string()).unwrap_or_default()
}

/// Flat one-row-per-fact table.
pub fn facts_dataset(facts: &[XbrlFact]) -> Dataset {
    let mut ds = Dataset::new();
    for f in facts {
        ds.push_record([
            ("fact_id", f.id.clone()),
            ("element_name", f.name.clone()),
            ("element_local_name", f.local_name.clone()),
            ("value", f.value.map(fmt_value).unwrap_or_default()),
            ("unit", f.unit.clone()),
            ("decimals", f.decimals.clone().unwrap_or_default()),
            ("context_ref", f.context_ref.clone()),
            ("entity_id", f.entity.clone()),
            ("period_start", date_cell(f.period_start)),
            ("period_end", date_cell(f.period_end)),
            ("instant_date", date_cell(f.instant)),
            ("taxonomy_prefix", f.prefix.clone()),
            ("period_label", period_label(f)),
        ]);
    }
    ds
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// Per element: `<Element>_current` (latest value) and `<Element>_trend`
/// (latest minus earliest). Instant facts are used when an element has any,
/// otherwise its duration facts by period end.
pub fn summarise_facts(facts: &[XbrlFact]) -> Vec<(String, String)> {
    let mut by_element: BTreeMap<&str, Vec<&XbrlFact>> = BTreeMap::new();
    for f in facts {
        by_element.entry(f.local_name.as_str()).or_default().push(f);
    }

    let mut columns = Vec::new();
    for (element, group) in by_element {
        let mut series: Vec<(NaiveDate, f64)> = group
            .iter()
            .filter_map(|f| Some((f.instant?, f.value?)))
            .collect();
        if series.is_empty() {
            series = group
                .iter()
                .filter_map(|f| Some((f.period_end?, f.value?)))
                .collect();
        }
        series.sort_by_key(|(d, _)| *d);

        let (Some(first), Some(last)) = (series.first(), series.last()) else { continue };
        columns.push((format!("{element}_current"), fmt_value(last.1)));
        columns.push((format!("{element}_trend"), fmt_value(last.1 - first.1)));
    }

    if let Some(latest) = facts.iter().filter_map(|f| f.instant).max() {
        columns.push(("instant_date".to_string(), latest.to_string()));
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILING: &str = r#"
<html><body>
<div style="display:none"><ix:header><ix:resources>
  <xbrli:context id="c2022"><xbrli:entity><xbrli:identifier scheme="http://www.sec.gov/CIK">0001178697</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:instant>2022-12-31</xbrli:instant></xbrli:period></xbrli:context>
  <xbrli:context id="c2023"><xbrli:entity><xbrli:identifier scheme="http://www.sec.gov/CIK">0001178697</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:instant>2023-12-31</xbrli:instant></xbrli:period></xbrli:context>
  <xbrli:context id="fy2023"><xbrli:entity><xbrli:identifier scheme="http://www.sec.gov/CIK">0001178697</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:startDate>2023-01-01</xbrli:startDate><xbrli:endDate>2023-12-31</xbrli:endDate></xbrli:period></xbrli:context>
</ix:resources></ix:header></div>
<table>
<tr><td>Cash</td><td>$<ix:nonFraction name="us-gaap:Cash" contextRef="c2023" unitRef="usd" decimals="-3" scale="3" id="f1">1,500</ix:nonFraction></td>
<td><ix:nonFraction name="us-gaap:Cash" contextRef="c2022" unitRef="usd" scale="3" id="f2">1,000</ix:nonFraction></td></tr>
<tr><td>Cash again</td><td><ix:nonFraction name="us-gaap:Cash" contextRef="c2023" unitRef="usd" scale="3" id="f3">1,500</ix:nonFraction></td></tr>
<tr><td>Revenue</td><td><ix:nonFraction name="us-gaap:Revenues" contextRef="fy2023" unitRef="usd" id="f4">900</ix:nonFraction></td></tr>
<tr><td>Net loss</td><td>(<ix:nonFraction name="us-gaap:NetIncomeLoss" contextRef="fy2023" unitRef="usd" sign="-" id="f5">250</ix:nonFraction>)</td></tr>
<tr><td>Custom</td><td><ix:nonFraction name="abc:CashThing" contextRef="c2023" unitRef="usd" id="f6">7</ix:nonFraction></td></tr>
<tr><td>Nil</td><td><ix:nonFraction name="us-gaap:Liabilities" contextRef="c2023" unitRef="usd" xsi:nil="true" id="f7"></ix:nonFraction></td></tr>
</table></body></html>"#;

    fn patterns() -> Vec<String> {
        vec!["Cash".into(), "Revenue".into(), "NetIncome".into(), "Liabilities".into()]
    }

    #[test]
    fn parses_contexts_and_facts() {
        let doc = Html::parse_document(FILING);
        let contexts = parse_contexts(&doc);
        assert_eq!(contexts.len(), 3);
        assert_eq!(contexts["c2023"].instant, NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(contexts["fy2023"].start, NaiveDate::from_ymd_opt(2023, 1, 1));

        let facts = parse_facts(&doc);
        assert_eq!(facts.len(), 7);
        assert_eq!(facts[0].value, Some(1_500_000.0));
        assert_eq!(facts[0].entity, "0001178697");
        assert_eq!(facts[4].value, Some(-250.0));
        assert!(facts[6].is_nil);
    }

    #[test]
    fn filters_to_deduplicated_us_gaap() {
        let doc = Html::parse_document(FILING);
        let kept = filter_facts(parse_facts(&doc), &patterns()).unwrap();
        let ids: Vec<&str> = kept.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f1", "f2", "f4", "f5"]);
    }

    #[test]
    fn summarises_latest_and_trend() {
        let doc = Html::parse_document(FILING);
        let kept = filter_facts(parse_facts(&doc), &patterns()).unwrap();
        let summary = summarise_facts(&kept);
        let get = |k: &str| summary.iter().find(|(c, _)| c == k).map(|(_, v)| v.as_str());

        assert_eq!(get("Cash_current"), Some("1500000"));
        assert_eq!(get("Cash_trend"), Some("500000"));
        assert_eq!(get("Revenues_current"), Some("900"));
        assert_eq!(get("Revenues_trend"), Some("0"));
        assert_eq!(get("instant_date"), Some("2023-12-31"));
    }

    #[test]
    fn labels_periods() {
        let doc = Html::parse_document(FILING);
        let facts = parse_facts(&doc);
        assert_eq!(period_label(&facts[0]), "2023-12-31_Instant");
        assert_eq!(period_label(&facts[3]), "2023_Annual");

        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        let over = |start, end| XbrlFact {
            period_start: start,
            period_end: end,
            ..Default::default()
        };
        assert_eq!(period_label(&over(d(2023, 4, 1), d(2023, 6, 30))), "2023_Q2");
        assert_eq!(period_label(&over(d(2023, 6, 1), d(2023, 6, 30))), "2023-06");
        assert_eq!(period_label(&over(None, d(2023, 6, 30))), "2023-06-30");
        assert_eq!(period_label(&XbrlFact::default()), "Unknown");
    }

    #[test]
    fn values_honour_format() {
        assert_eq!(fact_value("—", Some("ixt:fixed-zero"), None, None), Some(0.0));
        assert_eq!(fact_value("1.234,5", Some("ixt:num-comma-decimal"), None, None), Some(1234.5));
        assert_eq!(fact_value("2.5", None, Some("6"), Some("-")), Some(-2_500_000.0));
        assert_eq!(fact_value("n/a", None, None, None), None);
        assert_eq!(fact_value("NaN", None, None, None), None);
        assert_eq!(fact_value("inf", None, Some("3"), None), None);
    }

    #[test]
    fn empty_document_has_no_facts() {
        let doc = Html::parse_document("<html><body><p>no facts</p></body></html>");
        assert!(matches!(
            filter_facts(parse_facts(&doc), &patterns()),
            Err(ExtractError::NoXbrlFacts)
        ));
    }
}
