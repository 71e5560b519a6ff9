use crate::models::Grid;
use crate::prospectus::cleaner::clean_cell;
use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Upper bound on `colspan`/`rowspan` so a malformed attribute cannot blow up a grid.
const MAX_SPAN: usize = 64;

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

/// Strip comments and lowercase tag markup.
pub fn clean_html(raw: &str) -> String {
    let no_comments = COMMENT_RE.replace_all(raw, "");
    TAG_RE
        .replace_all(&no_comments, |caps: &regex::Captures| caps[0].to_lowercase())
        .into_owned()
}

/// Length of the cleaned document; a rough proxy for prospectus size.
pub fn document_length(raw: &str) -> usize {
    clean_html(raw).len()
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("selector {}: {:?}", css, e))
}

/// Concatenated text of an element, one space between text nodes.
pub fn element_text(el: &ElementRef) -> String {
    clean_cell(&el.text().collect::<Vec<_>>().join(" "))
}

// ── Tables ────────────────────────────────────────────────────────────────────

fn span(el: &ElementRef, attr: &str) -> usize {
    el.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

/// Every `<table>` in the document as a grid. Only the table's own rows are
/// read; nested tables become grids of their own.
pub fn parse_tables(doc: &Html) -> Result<Vec<Grid>> {
    let table_sel = selector("table")?;
    let tr_sel = selector("tr")?;

    let mut grids = Vec::new();
    for table in doc.select(&table_sel) {
        let own_rows = table.select(&tr_sel).filter(|tr| {
            tr.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| a.value().name() == "table")
                .map(|a| a.id() == table.id())
                .unwrap_or(false)
        });

        let grid = read_rows(own_rows);
        if !grid.is_empty() {
            grids.push(grid);
        }
    }
    Ok(grids)
}

type Carried = Vec<Option<(String, usize)>>;

fn fill_carried(row: &mut Vec<String>, col: &mut usize, carried: &mut Carried) {
    while let Some(Some((text, left))) = carried.get_mut(*col) {
        row.push(text.clone());
        *left -= 1;
        if *left == 0 {
            carried[*col] = None;
        }
        *col += 1;
    }
}

fn read_rows<'a>(rows: impl Iterator<Item = ElementRef<'a>>) -> Grid {
    // per column: (text, rows still to fill) carried down by rowspan
    let mut carried: Carried = Vec::new();
    let mut out = Vec::new();

    for tr in rows {
        let mut row: Vec<String> = Vec::new();
        let mut col = 0usize;

        for cell in tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
        {
            fill_carried(&mut row, &mut col, &mut carried);

            let text = element_text(&cell);
            let colspan = span(&cell, "colspan");
            let rowspan = span(&cell, "rowspan");

            for _ in 0..colspan {
                if rowspan > 1 {
                    if carried.len() <= col {
                        carried.resize(col + 1, None);
                    }
                    carried[col] = Some((text.clone(), rowspan - 1));
                }
                row.push(text.clone());
                col += 1;
            }
        }
        fill_carried(&mut row, &mut col, &mut carried);

        // cells carried past a gap in a short row
        while col < carried.len() {
            match carried[col].take() {
                Some((text, left)) => {
                    if left > 1 {
                        carried[col] = Some((text.clone(), left - 1));
                    }
                    row.push(text);
                }
                None => row.push(String::new()),
            }
            col += 1;
        }

        if !row.is_empty() {
            out.push(row);
        }
    }

    Grid::from_rows(out)
}

// ── Text ──────────────────────────────────────────────────────────────────────

/// Document text outside `<script>` and `<style>`.
pub fn visible_text(doc: &Html) -> String {
    let mut out = String::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else { continue };
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(|e| matches!(e.name(), "script" | "style"));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}
