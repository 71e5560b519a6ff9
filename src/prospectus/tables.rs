use crate::error::ExtractError;
use crate::models::Grid;
use crate::prospectus::cleaner::clean_cell;

/// Tables that mention a finance keyword and are big enough to be a statement.
pub fn find_finance_tables(
    grids: Vec<Grid>,
    keywords: &[String],
    min_rows: usize,
) -> Result<Vec<Grid>, ExtractError> {
    if grids.is_empty() {
        return Err(ExtractError::NoTables);
    }
    let total = grids.len();
    let needles: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

    let finance: Vec<Grid> = grids
        .into_iter()
        .filter(|g| g.height() >= min_rows)
        .filter(|g| {
            g.cells().any(|cell| {
                let cell = cell.to_lowercase();
                needles.iter().any(|k| cell.contains(k.as_str()))
            })
        })
        .collect();

    if finance.is_empty() {
        return Err(ExtractError::NoFinanceTables(total));
    }
    Ok(finance)
}

fn is_blank(cell: &str) -> bool {
    let c = clean_cell(cell);
    c.is_empty() || c.eq_ignore_ascii_case("nan")
}

/// Drop columns with nothing in them.
pub fn remove_empty_columns(grid: &mut Grid) {
    let width = grid.width();
    let keep: Vec<bool> = (0..width)
        .map(|c| grid.rows.iter().any(|r| !is_blank(&r[c])))
        .collect();
    grid.retain_columns(|c| keep[c]);
}

/// Stack tables vertically into one grid, padded to the widest, with empty
/// columns removed.
pub fn combine(grids: &[Grid]) -> Grid {
    let rows: Vec<Vec<String>> = grids.iter().flat_map(|g| g.rows.iter().cloned()).collect();
    let mut combined = Grid::from_rows(rows);
    remove_empty_columns(&mut combined);
    combined
}
