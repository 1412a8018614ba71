//! Data models for the spending dashboard.
//!
//! This module contains the records decoded from the USAspending API,
//! the selectors used to query it, and the [`Table`] every query is
//! normalized into.

use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::ops::RangeInclusive;

/// First fiscal year queried by default.
pub const FIRST_FISCAL_YEAR: i32 = 2008;
/// Last fiscal year queried by default.
pub const LAST_FISCAL_YEAR: i32 = 2022;
/// Fiscal year used for single-year breakdowns.
pub const BREAKDOWN_FISCAL_YEAR: i32 = 2021;

/// Longest fiscal year range a single query may cover.
pub const MAX_YEAR_SPAN: usize = 100;

/// Display name of the fiscal year column after normalization.
pub const FISCAL_YEAR_COLUMN: &str = "Fiscal Year";
/// Display name of the spending column after normalization.
pub const SPENDING_COLUMN: &str = "Spending";

/// Closed interval of fiscal years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    first: i32,
    last: i32,
}

impl YearRange {
    /// Create a range covering `first..=last`, at most [`MAX_YEAR_SPAN`] years.
    pub fn new(first: i32, last: i32) -> Result<Self, ApiError> {
        if first > last || last.abs_diff(first) as usize >= MAX_YEAR_SPAN {
            return Err(ApiError::InvalidRange { first, last });
        }
        Ok(Self { first, last })
    }

    /// Iterate over every fiscal year in the range.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.first..=self.last
    }

    /// Number of fiscal years in the range.
    pub fn len(&self) -> usize {
        self.last.abs_diff(self.first) as usize + 1
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years().contains(&year)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            first: FIRST_FISCAL_YEAR,
            last: LAST_FISCAL_YEAR,
        }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// Which per-year data set to fetch for an agency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Yearly award totals (`awards` endpoint).
    Historical,
    /// Sub-agency split of each year (`sub_agency` endpoint).
    Category,
}

impl DataKind {
    /// URL path segment selecting the endpoint.
    pub fn path_suffix(&self) -> &'static str {
        match self {
            DataKind::Historical => "awards",
            DataKind::Category => "sub_agency",
        }
    }

    /// Column names as they arrive from the API, in table order.
    pub fn raw_columns(&self) -> &'static [&'static str] {
        match self {
            DataKind::Historical => &[
                "fiscal_year",
                "latest_action_date",
                "toptier_code",
                "transaction_count",
                "obligations",
                "messages",
            ],
            DataKind::Category => &[
                "fiscal_year",
                "name",
                "abbreviation",
                "total_obligations",
                "transaction_count",
                "new_award_count",
                "children",
            ],
        }
    }

    /// Raw-to-display column renames.
    pub fn renames(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            DataKind::Historical => &[
                ("fiscal_year", FISCAL_YEAR_COLUMN),
                ("obligations", SPENDING_COLUMN),
            ],
            DataKind::Category => &[
                ("name", "Subagency"),
                ("fiscal_year", FISCAL_YEAR_COLUMN),
                ("total_obligations", SPENDING_COLUMN),
            ],
        }
    }

    /// Display column names after renames, in table order.
    #[cfg(test)]
    pub fn columns(&self) -> Vec<String> {
        let mut table = Table::new(self.raw_columns().iter().map(|c| c.to_string()).collect());
        table.rename_columns(self.renames());
        table.columns().to_vec()
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Historical => write!(f, "historical"),
            DataKind::Category => write!(f, "category"),
        }
    }
}

/// Axis along which a single year's spending is split.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownDimension {
    BudgetFunction,
    ObjectClass,
}

impl BreakdownDimension {
    /// URL path segment selecting the endpoint.
    pub fn path_suffix(&self) -> &'static str {
        match self {
            BreakdownDimension::BudgetFunction => "budget_function",
            BreakdownDimension::ObjectClass => "object_class",
        }
    }
}

impl fmt::Display for BreakdownDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakdownDimension::BudgetFunction => write!(f, "Budget Function"),
            BreakdownDimension::ObjectClass => write!(f, "Object Class"),
        }
    }
}

/// A federal agency from the CGAC directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgencyRecord {
    /// Zero-padded CGAC code, e.g. `"097"`.
    pub code: String,
    /// Display name.
    pub name: String,
    pub website: String,
    pub description: String,
}

impl AgencyRecord {
    /// The blank entry standing for "no agency selected yet".
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn is_sentinel(&self) -> bool {
        self.code.is_empty() && self.name.trim().is_empty()
    }
}

/// One agency's award totals for one fiscal year.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct YearlyRecord {
    #[serde(deserialize_with = "fiscal_year_text")]
    pub fiscal_year: String,
    #[serde(default)]
    pub toptier_code: Option<String>,
    #[serde(default)]
    pub transaction_count: Option<u64>,
    pub obligations: f64,
    #[serde(default)]
    pub latest_action_date: Option<String>,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl YearlyRecord {
    /// Cells in [`DataKind::Historical`] raw column order.
    pub fn into_row(self) -> Vec<Value> {
        vec![
            Value::String(self.fiscal_year),
            self.latest_action_date.map_or(Value::Null, Value::String),
            self.toptier_code.map_or(Value::Null, Value::String),
            self.transaction_count.map_or(Value::Null, Value::from),
            Value::from(self.obligations),
            Value::from(self.messages),
        ]
    }
}

/// One sub-agency's totals for one fiscal year.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubAgencyRecord {
    /// Filled from the requested year, not the body.
    #[serde(skip_deserializing)]
    pub fiscal_year: String,
    #[serde(rename = "name")]
    pub subagency_name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    pub total_obligations: f64,
    #[serde(default)]
    pub transaction_count: Option<u64>,
    #[serde(default)]
    pub new_award_count: Option<u64>,
    #[serde(default)]
    pub children: Value,
}

impl SubAgencyRecord {
    /// Cells in [`DataKind::Category`] raw column order.
    pub fn into_row(self) -> Vec<Value> {
        vec![
            Value::String(self.fiscal_year),
            Value::String(self.subagency_name),
            self.abbreviation.map_or(Value::Null, Value::String),
            Value::from(self.total_obligations),
            self.transaction_count.map_or(Value::Null, Value::from),
            self.new_award_count.map_or(Value::Null, Value::from),
            self.children,
        ]
    }
}

/// One slice of a single-year breakdown.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BreakdownRecord {
    #[serde(rename = "name")]
    pub breakdown_label: String,
    #[serde(rename = "obligated_amount")]
    pub spending_amount: f64,
}

/// Envelope of the list endpoints (`sub_agency`, `budget_function`, ...).
#[derive(Debug, Deserialize)]
pub struct ResultsPage<T> {
    pub results: Vec<T>,
}

/// Fiscal years arrive as numbers or strings; both become text.
fn fiscal_year_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid fiscal year: {}",
            other
        ))),
    }
}

/// A normalized table: named columns and rows of JSON cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }

    /// Rename columns in place; names not present are ignored.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for (from, to) in renames {
            if let Some(index) = self.column_index(from) {
                self.columns[index] = (*to).to_string();
            }
        }
    }

    /// Insert a column holding `value` in every row.
    pub fn insert_column(&mut self, index: usize, name: &str, value: Value) {
        let index = index.min(self.columns.len());
        self.columns.insert(index, name.to_string());
        for row in &mut self.rows {
            row.insert(index, value.clone());
        }
    }

    /// Append the rows of `other`, matching cells by column name.
    ///
    /// Columns only `other` has are added; cells missing on either side
    /// become `null`.
    pub fn append(&mut self, other: Table) {
        for column in &other.columns {
            if self.column_index(column).is_none() {
                self.columns.push(column.clone());
                for row in &mut self.rows {
                    row.push(Value::Null);
                }
            }
        }

        let positions: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();

        for row in other.rows {
            let mut aligned = vec![Value::Null; self.columns.len()];
            for (cell, &position) in row.into_iter().zip(&positions) {
                aligned[position] = cell;
            }
            self.rows.push(aligned);
        }
    }

    /// Stable sort of rows by the text of one column.
    pub fn sort_by_column(&mut self, column: &str) {
        let Some(index) = self.column_index(column) else {
            return;
        };
        self.rows.sort_by(|a, b| compare_cells(&a[index], &b[index]));
    }

    /// A copy restricted to the named columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> Table {
        let indices: Vec<(usize, &str)> = columns
            .iter()
            .filter_map(|name| self.column_index(name).map(|i| (i, *name)))
            .collect();

        Table {
            columns: indices.iter().map(|(_, name)| name.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|(i, _)| row[*i].clone()).collect())
                .collect(),
        }
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Metadata printed above every report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Agencies the report is about.
    pub agencies: Vec<String>,
    /// Fiscal years covered, e.g. `"2008-2022"` or `"2021"`.
    pub fiscal_years: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of data rows.
    pub rows: usize,
}

/// A titled table plus summary lines, ready to render.
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub metadata: ReportMetadata,
    /// Label/value pairs shown above the table.
    pub summary: Vec<(String, String)>,
    /// Columns shown in Markdown output.
    pub display_columns: Vec<String>,
    pub table: Table,
    /// Message shown instead of the table when it is empty.
    pub empty_message: String,
}

impl Report {
    /// Creates a report over the whole table.
    pub fn new(title: impl Into<String>, metadata: ReportMetadata, table: Table) -> Self {
        Self {
            title: title.into(),
            metadata,
            summary: Vec::new(),
            display_columns: table.columns().to_vec(),
            table,
            empty_message: "Sorry, no data was found! Try a different agency.".to_string(),
        }
    }

    /// Restrict Markdown output to these columns.
    pub fn with_display_columns(mut self, columns: &[&str]) -> Self {
        self.display_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_summary(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.summary.push((label.into(), value.into()));
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_table() -> Table {
        let mut table = Table::new(vec!["Fiscal Year".to_string(), "Spending".to_string()]);
        table.push_row(vec![json!("2010"), json!(30.0)]);
        table.push_row(vec![json!("2008"), json!(10.0)]);
        table.push_row(vec![json!("2009"), json!(20.0)]);
        table
    }

    #[test]
    fn test_year_range() {
        let range = YearRange::default();
        assert_eq!(range.years().start(), &2008);
        assert_eq!(range.years().end(), &2022);
        assert_eq!(range.len(), 15);
        assert_eq!(range.years().count(), 15);
        assert_eq!(range.to_string(), "2008-2022");

        let single = YearRange::new(2021, 2021).unwrap();
        assert_eq!(single.len(), 1);
        assert!(YearRange::new(2022, 2008).is_err());
    }

    #[test]
    fn test_year_range_rejects_oversized_spans() {
        assert!(YearRange::new(i32::MIN, i32::MAX).is_err());
        assert!(YearRange::new(2000, 2000 + MAX_YEAR_SPAN as i32).is_err());

        let widest = YearRange::new(2000, 2000 + MAX_YEAR_SPAN as i32 - 1).unwrap();
        assert_eq!(widest.len(), MAX_YEAR_SPAN);
        assert_eq!(widest.years().count(), MAX_YEAR_SPAN);
    }

    #[test]
    fn test_kind_columns_are_renamed() {
        let columns = |kind: DataKind| {
            let mut table = Table::new(kind.raw_columns().iter().map(|c| c.to_string()).collect());
            table.rename_columns(kind.renames());
            table.columns().to_vec()
        };
        assert_eq!(
            columns(DataKind::Historical),
            vec![
                "Fiscal Year",
                "latest_action_date",
                "toptier_code",
                "transaction_count",
                "Spending",
                "messages"
            ]
        );
        assert_eq!(
            columns(DataKind::Category),
            vec![
                "Fiscal Year",
                "Subagency",
                "abbreviation",
                "Spending",
                "transaction_count",
                "new_award_count",
                "children"
            ]
        );
    }

    #[test]
    fn test_yearly_record_accepts_numeric_year() {
        let record: YearlyRecord =
            serde_json::from_value(json!({"fiscal_year": 2009, "obligations": 1000})).unwrap();
        assert_eq!(record.fiscal_year, "2009");
        assert_eq!(record.obligations, 1000.0);
        assert!(record.messages.is_empty());

        let row = record.into_row();
        assert_eq!(row.len(), DataKind::Historical.raw_columns().len());
        assert_eq!(row[0], json!("2009"));
    }

    #[test]
    fn test_yearly_record_requires_obligations() {
        let result = serde_json::from_value::<YearlyRecord>(json!({"fiscal_year": 2009}));
        assert!(result.is_err());
    }

    #[test]
    fn test_sentinel() {
        assert!(AgencyRecord::sentinel().is_sentinel());
        let nasa = AgencyRecord {
            code: "080".to_string(),
            name: "National Aeronautics and Space Administration".to_string(),
            ..Default::default()
        };
        assert!(!nasa.is_sentinel());
    }

    #[test]
    fn test_table_sort_and_value() {
        let mut table = sample_table();
        table.sort_by_column("Fiscal Year");
        assert_eq!(table.value(0, "Fiscal Year"), Some(&json!("2008")));
        assert_eq!(table.value(2, "Spending"), Some(&json!(30.0)));
        assert_eq!(table.value(3, "Spending"), None);
        assert_eq!(table.value(0, "Missing"), None);
    }

    #[test]
    fn test_table_insert_and_append() {
        let mut first = sample_table();
        first.insert_column(1, "Agency", json!("NASA"));
        let mut second = sample_table();
        second.insert_column(1, "Agency", json!("DOE"));

        first.append(second);
        assert_eq!(first.columns(), ["Fiscal Year", "Agency", "Spending"]);
        assert_eq!(first.len(), 6);
        assert_eq!(first.value(5, "Agency"), Some(&json!("DOE")));
    }

    #[test]
    fn test_table_append_aligns_by_name() {
        let mut left = Table::new(vec!["a".to_string(), "b".to_string()]);
        left.push_row(vec![json!(1), json!(2)]);
        let mut right = Table::new(vec!["b".to_string(), "c".to_string()]);
        right.push_row(vec![json!(3), json!(4)]);

        left.append(right);
        assert_eq!(left.columns(), ["a", "b", "c"]);
        assert_eq!(left.rows()[0], vec![json!(1), json!(2), Value::Null]);
        assert_eq!(left.rows()[1], vec![Value::Null, json!(3), json!(4)]);
    }

    #[test]
    fn test_table_select_and_records() {
        let table = sample_table().select(&["Spending", "Nope"]);
        assert_eq!(table.columns(), ["Spending"]);
        let records = table.to_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("Spending"), Some(&json!(30.0)));
    }
}
