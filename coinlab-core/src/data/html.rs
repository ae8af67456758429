//! HTML table extraction.
//!
//! Every `<table>` on a page becomes a [`RawTable`]. Header cells come from the
//! `<thead>` row or, failing that, the first row made only of `<th>` cells.
//! Rows of nested tables belong to the nested table only.

use scraper::{ElementRef, Html, Selector};

use super::provider::{RawRow, RawTable, TransportError};

/// Extract all tables from an HTML document, in document order.
pub fn parse_tables(html: &str) -> Result<Vec<RawTable>, TransportError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let link_sel = selector("a[href]")?;

    Ok(document
        .select(&table_sel)
        .map(|table| extract_table(table, &row_sel, &link_sel))
        .collect())
}

fn selector(css: &str) -> Result<Selector, TransportError> {
    Selector::parse(css).map_err(|e| TransportError::Setup(format!("selector '{css}': {e:?}")))
}

fn extract_table(table: ElementRef<'_>, row_sel: &Selector, link_sel: &Selector) -> RawTable {
    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<RawRow> = Vec::new();

    for tr in table.select(row_sel) {
        if !owned_by(tr, table) {
            continue;
        }

        let cells: Vec<ElementRef<'_>> = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "th" | "td"))
            .collect();
        if cells.is_empty() {
            continue;
        }

        let all_th = cells.iter().all(|c| c.value().name() == "th");
        let is_header = headers.is_empty() && rows.is_empty() && (in_thead(tr) || all_th);
        if is_header {
            headers = cells.iter().map(|c| cell_text(*c)).collect();
            continue;
        }
        if in_thead(tr) {
            continue;
        }

        rows.push(RawRow {
            id: tr.value().attr("id").map(str::to_string),
            cells: cells.iter().map(|c| cell_text(*c)).collect(),
            links: cells
                .iter()
                .map(|c| {
                    c.select(link_sel)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                        .map(str::to_string)
                })
                .collect(),
        });
    }

    RawTable { headers, rows }
}

/// True when the closest enclosing `<table>` of `tr` is `table`.
fn owned_by(tr: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
        .map(|a| a.id() == table.id())
        .unwrap_or(false)
}

fn in_thead(tr: ElementRef<'_>) -> bool {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|a| a.value().name() != "table")
        .any(|a| a.value().name() == "thead")
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_headers_rows_ids_and_links() {
        let html = r#"
            <html><body>
            <table><tr><td>navigation</td></tr></table>
            <table>
              <thead><tr><th>#</th><th>Name</th><th>Symbol</th></tr></thead>
              <tbody>
                <tr id="id-bitcoin"><td>1</td><td><a href="/currencies/bitcoin/">Bitcoin</a></td><td>BTC</td></tr>
                <tr id="id-ethereum"><td>2</td><td><a href="/currencies/ethereum/">Ether
                    eum</a></td><td> ETH </td></tr>
              </tbody>
            </table>
            </body></html>
        "#;
        let tables = parse_tables(html).unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables[0].headers.is_empty());
        assert_eq!(tables[0].rows.len(), 1);

        let data = &tables[1];
        assert_eq!(data.headers, vec!["#", "Name", "Symbol"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[0].id.as_deref(), Some("id-bitcoin"));
        assert_eq!(data.rows[0].links[1].as_deref(), Some("/currencies/bitcoin/"));
        assert_eq!(data.rows[1].cells, vec!["2", "Ether eum", "ETH"]);
    }

    #[test]
    fn th_only_first_row_is_header_without_thead() {
        let html = "<table><tr><th>Date</th><th>Open*</th></tr><tr><td>Mar 01, 2018</td><td>1.0</td></tr></table>";
        let tables = parse_tables(html).unwrap();
        assert_eq!(tables[0].headers, vec!["Date", "Open*"]);
        assert_eq!(tables[0].rows.len(), 1);
    }

    #[test]
    fn nested_table_rows_stay_nested() {
        let html = "<table><tr><th>A</th></tr><tr><td><table><tr><td>inner</td></tr></table></td></tr></table>";
        let tables = parse_tables(html).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(tables[1].rows[0].cells, vec!["inner"]);
    }

    #[test]
    fn page_without_tables() {
        assert!(parse_tables("<html><p>Not found</p></html>").unwrap().is_empty());
    }
}
