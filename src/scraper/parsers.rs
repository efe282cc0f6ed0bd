use crate::error::{ExplorerError, Result};
use crate::models::{RawTable, TableLocator};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| ExplorerError::InvalidLocator(css.to_string()))
}

// ── Table lookup ──────────────────────────────────────────────────────────────

/// Locate a table in `html` and read it into a [`RawTable`].
///
/// basketball-reference ships most secondary tables inside HTML comments and
/// un-comments them client side, so an id lookup that misses the live DOM
/// retries inside every comment that mentions the id.
pub fn extract_table(html: &str, locator: &TableLocator) -> Result<RawTable> {
    let doc = Html::parse_document(html);

    if let Some(table) = find_table(&doc, locator)? {
        return read_table(table, locator);
    }

    if let TableLocator::Id(id) = locator {
        for node in doc.tree.values() {
            let Some(comment) = node.as_comment() else { continue };
            let text: &str = comment;
            if !text.contains(id.as_str()) {
                continue;
            }
            let fragment = Html::parse_fragment(text);
            if let Some(table) = find_table(&fragment, locator)? {
                debug!("Table {} found inside an HTML comment", locator);
                return read_table(table, locator);
            }
        }
    }

    warn!("Table {} not present in page", locator);
    Err(ExplorerError::TableNotFound {
        locator: locator.clone(),
    })
}

fn find_table<'a>(doc: &'a Html, locator: &TableLocator) -> Result<Option<ElementRef<'a>>> {
    let table_sel = selector("table")?;
    let mut tables = doc.select(&table_sel);

    Ok(match locator {
        TableLocator::Id(id) => tables.find(|t| t.value().id() == Some(id.as_str())),
        TableLocator::Index(i) => tables.nth(*i),
    })
}

// ── Table reading ─────────────────────────────────────────────────────────────

fn row_cells(tr: ElementRef<'_>, cell_sel: &Selector) -> Vec<String> {
    tr.select(cell_sel)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

fn read_table(table: ElementRef<'_>, locator: &TableLocator) -> Result<RawTable> {
    let head_sel = selector("thead tr")?;
    let body_sel = selector("tbody tr")?;
    let cell_sel = selector("th, td")?;

    // Multi-row headers carry group labels above the real column names
    let mut headers = table
        .select(&head_sel)
        .last()
        .map(|tr| row_cells(tr, &cell_sel))
        .unwrap_or_default();

    let mut body = table.select(&body_sel).map(|tr| row_cells(tr, &cell_sel));

    // Without a <thead> the first row names the columns
    if headers.is_empty() {
        headers = body.next().unwrap_or_default();
    }

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ExplorerError::MissingHeader {
            locator: locator.clone(),
        });
    }

    let width = headers.len();
    let rows: Vec<Vec<String>> = body
        .filter(|cells| !cells.is_empty())
        .map(|mut cells| {
            cells.resize(width, String::new());
            cells
        })
        .collect();

    debug!("Table {}: {} columns, {} rows", locator, width, rows.len());
    Ok(RawTable { headers, rows })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
