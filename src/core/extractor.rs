use crate::domain::model::Period;
use crate::utils::error::{BillingError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_placeholder, Validate};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Where the billed amount lives on a billing history page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    /// CSS selector of the billing table; the first match is used.
    pub selector: String,
    /// Header text of the amount column.
    pub amount_header: String,
    /// Text of a row's first cell. `{month}` is the unpadded month number,
    /// `{year}` the four digit year.
    pub month_label: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            selector: "div#billing > table".to_string(),
            amount_header: "請求金額".to_string(),
            month_label: "{month}月".to_string(),
        }
    }
}

impl TableLayout {
    pub fn label_for(&self, period: &Period) -> String {
        self.month_label
            .replace("{month}", &period.month().to_string())
            .replace("{year}", &period.year().to_string())
    }
}

impl Validate for TableLayout {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("table.selector", &self.selector)?;
        parse_selector(&self.selector)?;
        validate_non_empty_string("table.amount_header", &self.amount_header)?;
        validate_placeholder("table.month_label", &self.month_label, "{month}")
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| BillingError::InvalidConfigValue {
        field: "table.selector".to_string(),
        value: css.to_string(),
        reason: format!("Invalid CSS selector: {:?}", e),
    })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

fn is_named(element: &ElementRef<'_>, names: &[&str]) -> bool {
    names.contains(&element.value().name())
}

/// Rows of `table` itself; rows of tables nested inside its cells are skipped.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in child_elements(table) {
        if is_named(&child, &["tr"]) {
            rows.push(child);
        } else if is_named(&child, &["thead", "tbody", "tfoot"]) {
            rows.extend(child_elements(child).filter(|row| is_named(row, &["tr"])));
        }
    }
    rows
}

fn row_cells(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    child_elements(row).filter(|cell| is_named(cell, &["th", "td"]))
}

/// Finds the amount billed for `period` on one year's billing page.
///
/// Returns `Ok(None)` when the page has no row for the month or the cell is
/// blank. A page without the table or without the amount column is an error.
pub fn extract_billing_amount(
    html: &str,
    period: &Period,
    layout: &TableLayout,
) -> Result<Option<i64>> {
    let document = Html::parse_document(html);
    let table_selector = parse_selector(&layout.selector)?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| BillingError::Extraction {
            message: format!("billing table not found ({})", layout.selector),
        })?;

    let rows = table_rows(table);
    let header_index = rows
        .iter()
        .position(|row| row_cells(*row).any(|cell| is_named(&cell, &["th"])))
        .ok_or_else(|| BillingError::Extraction {
            message: "billing table has no header row".to_string(),
        })?;

    let column = row_cells(rows[header_index])
        .position(|cell| cell_text(cell) == layout.amount_header)
        .ok_or_else(|| BillingError::Extraction {
            message: format!(
                "failed to get billing amount column index (no '{}' header)",
                layout.amount_header
            ),
        })?;

    let label = layout.label_for(period);
    let Some(row) = rows[header_index + 1..].iter().find(|row| {
        row_cells(**row)
            .next()
            .is_some_and(|first| cell_text(first) == label)
    }) else {
        tracing::debug!("No '{}' row in the billing table", label);
        return Ok(None);
    };

    let amount = match row_cells(*row).nth(column) {
        Some(cell) => normalize_amount(&cell_text(cell)),
        None => Ok(None),
    };
    amount
}

/// Strips currency decoration (`¥1,234 円` becomes `1234`) and parses the rest.
pub fn normalize_amount(raw: &str) -> Result<Option<i64>> {
    let digits: String = raw
        .chars()
        .filter(|c| {
            !matches!(c, '¥' | '￥' | ',' | '，' | '円' | '\u{3000}') && !c.is_whitespace()
        })
        .collect();

    if digits.is_empty() || digits == "-" || digits == "－" {
        return Ok(None);
    }

    digits
        .parse::<i64>()
        .map(Some)
        .map_err(|_| BillingError::Extraction {
            message: format!("unrecognized amount '{}'", raw),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<div id="billing">
  <table>
    <tbody>
      <tr><th>請求月</th><th>使用量</th><th>請求金額</th></tr>
      <tr><td>8月</td><td>250kWh</td><td>¥7,123</td></tr>
      <tr><td>7月</td><td>310kWh</td><td> ¥ 8,450 </td></tr>
      <tr><td>6月</td><td>-</td><td>-</td></tr>
    </tbody>
  </table>
</div>
</body></html>
"#;

    fn period(month: u32) -> Period {
        Period::new(2020, month).unwrap()
    }

    #[test]
    fn test_extracts_amount_for_month() {
        let layout = TableLayout::default();
        assert_eq!(
            extract_billing_amount(PAGE, &period(8), &layout).unwrap(),
            Some(7123)
        );
        assert_eq!(
            extract_billing_amount(PAGE, &period(7), &layout).unwrap(),
            Some(8450)
        );
    }

    #[test]
    fn test_missing_month_and_blank_amount_are_none() {
        let layout = TableLayout::default();
        assert_eq!(extract_billing_amount(PAGE, &period(6), &layout).unwrap(), None);
        assert_eq!(extract_billing_amount(PAGE, &period(1), &layout).unwrap(), None);
    }

    #[test]
    fn test_missing_amount_header_is_error() {
        let layout = TableLayout {
            amount_header: "Amount".to_string(),
            ..TableLayout::default()
        };
        let err = extract_billing_amount(PAGE, &period(8), &layout).unwrap_err();
        assert!(matches!(err, BillingError::Extraction { .. }));
    }

    #[test]
    fn test_missing_table_is_error() {
        let err = extract_billing_amount("<html></html>", &period(8), &TableLayout::default())
            .unwrap_err();
        assert!(err.to_string().contains("billing table not found"));
    }

    #[test]
    fn test_nested_table_in_a_cell_is_not_read_as_rows() {
        let page = r#"
<div id="billing">
  <table>
    <thead><tr><th>月</th><th>使用量</th><th>請求金額</th></tr></thead>
    <tbody>
      <tr>
        <td>8月</td>
        <td><table><tr><td>8月</td><td>x</td></tr></table></td>
        <td>¥100</td>
      </tr>
    </tbody>
  </table>
</div>
"#;
        assert_eq!(
            extract_billing_amount(page, &period(8), &TableLayout::default()).unwrap(),
            Some(100)
        );
    }

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("¥12,345").unwrap(), Some(12345));
        assert_eq!(normalize_amount("￥ 980 円").unwrap(), Some(980));
        assert_eq!(normalize_amount("").unwrap(), None);
        assert!(normalize_amount("N/A").is_err());
    }

    #[test]
    fn test_layout_validation() {
        assert!(TableLayout::default().validate().is_ok());

        let bad = TableLayout {
            month_label: "月".to_string(),
            ..TableLayout::default()
        };
        assert!(bad.validate().is_err());
    }
}
