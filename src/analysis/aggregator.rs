//! Merging per-year responses into normalized tables.
//!
//! This module turns raw API bodies into [`Table`]s and provides the
//! summary statistics shown alongside them.

use crate::api::fetcher::YearResponse;
use crate::models::{
    BreakdownRecord, DataKind, ResultsPage, SubAgencyRecord, Table, YearlyRecord,
    FISCAL_YEAR_COLUMN, SPENDING_COLUMN,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Combine per-year responses into one table with normalized columns.
///
/// A response that does not decode contributes no rows. With no usable
/// responses the result is empty but still carries every column.
pub fn aggregate(responses: &[YearResponse], kind: DataKind) -> Table {
    let mut table = Table::new(kind.raw_columns().iter().map(|c| c.to_string()).collect());

    for response in responses {
        match decode_year(response, kind) {
            Ok(rows) => {
                for row in rows {
                    table.push_row(row);
                }
            }
            Err(e) => debug!("Dropping FY{} {} response: {}", response.fiscal_year, kind, e),
        }
    }

    // Concurrent fetches finish in any order.
    table.sort_by_column("fiscal_year");
    table.rename_columns(kind.renames());
    table
}

/// Decode one year completely, or not at all.
fn decode_year(response: &YearResponse, kind: DataKind) -> Result<Vec<Vec<Value>>, serde_json::Error> {
    match kind {
        DataKind::Historical => {
            let record = YearlyRecord::deserialize(&response.body)?;
            Ok(vec![record.into_row()])
        }
        DataKind::Category => {
            let records = decode_results::<SubAgencyRecord>(&response.body)?;
            let fiscal_year = response.fiscal_year.to_string();
            Ok(records
                .into_iter()
                .map(|mut record| {
                    record.fiscal_year = fiscal_year.clone();
                    record.into_row()
                })
                .collect())
        }
    }
}

/// Decode the `results` list of a list endpoint.
pub fn decode_results<T: DeserializeOwned>(body: &Value) -> Result<Vec<T>, serde_json::Error> {
    ResultsPage::<T>::deserialize(body).map(|page| page.results)
}

/// Table of `Breakdown`/`Spending` pairs in record order.
pub fn breakdown_table(records: Vec<BreakdownRecord>) -> Table {
    let mut table = Table::new(vec!["Breakdown".to_string(), SPENDING_COLUMN.to_string()]);
    for record in records {
        table.push_row(vec![
            Value::String(record.breakdown_label),
            Value::from(record.spending_amount),
        ]);
    }
    table
}

/// Total spending per fiscal year, in year order.
pub fn spending_by_year(table: &Table) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for row in 0..table.len() {
        let year = table.value(row, FISCAL_YEAR_COLUMN).and_then(Value::as_str);
        let amount = table.value(row, SPENDING_COLUMN).and_then(Value::as_f64);
        if let (Some(year), Some(amount)) = (year, amount) {
            *totals.entry(year.to_string()).or_insert(0.0) += amount;
        }
    }
    totals
}

/// Sum of the spending column.
pub fn total_spending(table: &Table) -> f64 {
    (0..table.len())
        .filter_map(|row| table.value(row, SPENDING_COLUMN).and_then(Value::as_f64))
        .sum()
}

/// The `n` labels with the most total spending across all rows.
pub fn top_spenders(table: &Table, label_column: &str, n: usize) -> Vec<(String, f64)> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for row in 0..table.len() {
        let label = table.value(row, label_column).and_then(Value::as_str);
        let amount = table.value(row, SPENDING_COLUMN).and_then(Value::as_f64);
        if let (Some(label), Some(amount)) = (label, amount) {
            *totals.entry(label.to_string()).or_default() += amount;
        }
    }

    let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(n);
    ranked
}

/// Each label's share of the total spending, as a percentage.
pub fn spending_shares(table: &Table, label_column: &str) -> Vec<(String, f64)> {
    let total = total_spending(table);
    if total == 0.0 {
        return Vec::new();
    }

    (0..table.len())
        .filter_map(|row| {
            let label = table.value(row, label_column).and_then(Value::as_str)?;
            let amount = table.value(row, SPENDING_COLUMN).and_then(Value::as_f64)?;
            Some((label.to_string(), amount / total * 100.0))
        })
        .collect()
}
