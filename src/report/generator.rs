//! Markdown and JSON report generation.
//!
//! This module renders a [`Report`] (metadata, summary lines and one data
//! table) as a Markdown document or as pretty-printed JSON.

use crate::models::{Report, ReportMetadata, Table, SPENDING_COLUMN};
use crate::purchases::format_currency;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Columns holding dollar amounts.
const CURRENCY_COLUMNS: &[&str] = &[SPENDING_COLUMN, "Cost"];

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.title));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_data_section(report));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    if !metadata.agencies.is_empty() {
        section.push_str(&format!(
            "- **Agency:** {}\n",
            metadata.agencies.join(" vs. ")
        ));
    }
    if !metadata.fiscal_years.is_empty() {
        section.push_str(&format!("- **Fiscal Years:** {}\n", metadata.fiscal_years));
    }
    section.push_str(&format!("- **Rows:** {}\n", metadata.rows));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

fn generate_summary_section(summary: &[(String, String)]) -> String {
    if summary.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Summary\n\n");
    for (label, value) in summary {
        section.push_str(&format!("- **{}:** {}\n", label, value));
    }
    section.push('\n');

    section
}

/// Generate the data table, or the empty message when there are no rows.
fn generate_data_section(report: &Report) -> String {
    let mut section = String::new();
    section.push_str("## Data\n\n");

    if report.table.is_empty() {
        section.push_str(&format!("*{}*\n\n", report.empty_message));
        return section;
    }

    let columns: Vec<&str> = report.display_columns.iter().map(String::as_str).collect();
    let table = report.table.select(&columns);
    section.push_str(&generate_markdown_table(&table));
    section.push('\n');

    section
}

fn generate_markdown_table(table: &Table) -> String {
    let mut out = String::new();

    out.push_str("| ");
    out.push_str(&table.columns().join(" | "));
    out.push_str(" |\n|");
    for (index, _) in table.columns().iter().enumerate() {
        let numeric = table
            .rows()
            .iter()
            .map(|row| &row[index])
            .find(|cell| !cell.is_null())
            .is_some_and(Value::is_number);
        out.push_str(if numeric { "---:|" } else { "---|" });
    }
    out.push('\n');

    for row in table.rows() {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .zip(row)
            .map(|(column, cell)| format_cell(column, cell))
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    out
}

/// Render one cell for Markdown output.
fn format_cell(column: &str, cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(text) => escape(text),
        Value::Number(number) => match number.as_f64() {
            Some(amount) if CURRENCY_COLUMNS.contains(&column) => format_currency(amount),
            _ => number.to_string(),
        },
        Value::Bool(flag) => flag.to_string(),
        Value::Array(items) if items.iter().all(Value::is_string) => {
            let texts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            escape(&texts.join("; "))
        }
        other => escape(&other.to_string()),
    }
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Data from [USAspending.gov](https://www.usaspending.gov)*\n");

    footer
}

#[derive(Serialize)]
struct JsonSummaryLine<'a> {
    label: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    metadata: &'a ReportMetadata,
    summary: Vec<JsonSummaryLine<'a>>,
    columns: &'a [String],
    rows: Vec<Map<String, Value>>,
}

/// Generate a JSON report. Every table column is included.
pub fn generate_json_report(report: &Report) -> Result<String> {
    let view = JsonReport {
        title: &report.title,
        metadata: &report.metadata,
        summary: report
            .summary
            .iter()
            .map(|(label, value)| JsonSummaryLine { label, value })
            .collect(),
        columns: report.table.columns(),
        rows: report.table.to_records(),
    };
    serde_json::to_string_pretty(&view).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn create_test_report() -> Report {
        let mut table = Table::new(vec![
            "Fiscal Year".to_string(),
            "Spending".to_string(),
            "transaction_count".to_string(),
            "messages".to_string(),
        ]);
        table.push_row(vec![json!("2008"), json!(1500.5), json!(12), json!([])]);
        table.push_row(vec![
            json!("2009"),
            json!(2_000_000.0),
            Value::Null,
            json!(["partial | year"]),
        ]);

        let metadata = ReportMetadata {
            agencies: vec!["Department of Energy".to_string()],
            fiscal_years: "2008-2009".to_string(),
            generated_at: Utc::now(),
            rows: table.len(),
        };

        Report::new("Department of Energy Spending", metadata, table)
            .with_display_columns(&["Fiscal Year", "Spending", "transaction_count", "messages"])
            .with_summary("Total Spending", "$2,001,500.50")
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert!(markdown.starts_with("# Department of Energy Spending\n"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Agency:** Department of Energy"));
        assert!(markdown.contains("- **Fiscal Years:** 2008-2009"));
        assert!(markdown.contains("- **Total Spending:** $2,001,500.50"));
        assert!(markdown.contains("| Fiscal Year | Spending | transaction_count | messages |"));
        assert!(markdown.contains("|---|---:|---:|---|"));
        assert!(markdown.contains("| 2008 | $1,500.50 | 12 |  |"));
        assert!(markdown.contains("| 2009 | $2,000,000.00 |  | partial \\| year |"));
        assert!(markdown.contains("USAspending.gov"));
    }

    #[test]
    fn test_only_currency_columns_get_dollars() {
        let mut table = Table::new(vec![
            "Item".to_string(),
            "Quantity".to_string(),
            "Cost".to_string(),
        ]);
        table.push_row(vec![json!("Buy the Mona Lisa"), json!(2), json!(1.8e9)]);
        let metadata = ReportMetadata {
            agencies: Vec::new(),
            fiscal_years: "2021".to_string(),
            generated_at: Utc::now(),
            rows: 1,
        };
        let markdown = generate_markdown_report(&Report::new("Cart", metadata, table));

        assert!(markdown.contains("| Buy the Mona Lisa | 2 | $1,800,000,000.00 |"));
    }

    #[test]
    fn test_display_columns_limit_markdown() {
        let report = create_test_report().with_display_columns(&["Fiscal Year", "Spending"]);
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("| Fiscal Year | Spending |\n"));
        assert!(!markdown.contains("transaction_count"));
    }

    #[test]
    fn test_empty_table_shows_message() {
        let mut report = create_test_report();
        report.table = Table::new(vec!["Fiscal Year".to_string()]);
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("*Sorry, no data was found! Try a different agency.*"));
        assert!(!markdown.contains("| Fiscal Year |"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["title"], "Department of Energy Spending");
        assert_eq!(parsed["metadata"]["rows"], 2);
        assert_eq!(parsed["summary"][0]["label"], "Total Spending");
        assert_eq!(parsed["columns"].as_array().unwrap().len(), 4);
        assert_eq!(parsed["rows"][0]["Fiscal Year"], "2008");
        assert_eq!(parsed["rows"][1]["Spending"], 2_000_000.0);
        assert!(parsed["rows"][1]["transaction_count"].is_null());
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_report("# Report\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report\n");
    }
}
