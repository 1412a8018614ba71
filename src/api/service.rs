//! Session-scoped spending queries with memoization.

use crate::analysis::aggregate;
use crate::api::fetcher::{fetch_breakdown, fetch_years, FetchMode};
use crate::api::source::SpendingSource;
use crate::error::ApiError;
use crate::models::{
    AgencyRecord, BreakdownDimension, DataKind, Table, YearRange, FISCAL_YEAR_COLUMN,
    SPENDING_COLUMN,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct YearTableKey {
    agency_code: String,
    kind: DataKind,
    years: YearRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BreakdownKey {
    agency_code: String,
    dimension: BreakdownDimension,
    fiscal_year: i32,
}

/// Query settings fixed for the lifetime of a [`SpendingService`].
#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub years: YearRange,
    pub breakdown_year: i32,
    pub mode: FetchMode,
}

/// Front door for every spending query.
///
/// Identical queries within a session are answered from memory. Entries
/// are never evicted.
pub struct SpendingService<S> {
    source: S,
    settings: ServiceSettings,
    year_tables: Mutex<HashMap<YearTableKey, Table>>,
    breakdowns: Mutex<HashMap<BreakdownKey, Table>>,
}

impl<S: SpendingSource> SpendingService<S> {
    pub fn new(source: S, settings: ServiceSettings) -> Self {
        Self {
            source,
            settings,
            year_tables: Mutex::new(HashMap::new()),
            breakdowns: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Yearly award totals for one agency.
    pub async fn history(&self, agency_code: &str) -> Table {
        self.year_table(agency_code, DataKind::Historical).await
    }

    /// Yearly sub-agency totals for one agency.
    pub async fn subagencies(&self, agency_code: &str) -> Table {
        self.year_table(agency_code, DataKind::Category).await
    }

    async fn year_table(&self, agency_code: &str, kind: DataKind) -> Table {
        let key = YearTableKey {
            agency_code: agency_code.to_string(),
            kind,
            years: self.settings.years,
        };

        let cached = self
            .year_tables
            .lock()
            .ok()
            .and_then(|tables| tables.get(&key).cloned());
        if let Some(table) = cached {
            debug!("Cache hit for {} {} {}", agency_code, kind, key.years);
            return table;
        }

        info!(
            "Fetching {} data for {} (FY{}, {:?})",
            kind, agency_code, key.years, self.settings.mode
        );
        let responses = fetch_years(
            &self.source,
            agency_code,
            kind,
            self.settings.years,
            self.settings.mode,
        )
        .await;
        let table = aggregate(&responses, kind);

        if let Ok(mut tables) = self.year_tables.lock() {
            tables.insert(key, table.clone());
        }
        table
    }

    /// Breakdown of the configured breakdown year along `dimension`.
    ///
    /// Failures are not cached.
    pub async fn breakdown(
        &self,
        agency_code: &str,
        dimension: BreakdownDimension,
    ) -> Result<Table, ApiError> {
        let key = BreakdownKey {
            agency_code: agency_code.to_string(),
            dimension,
            fiscal_year: self.settings.breakdown_year,
        };

        let cached = self
            .breakdowns
            .lock()
            .ok()
            .and_then(|tables| tables.get(&key).cloned());
        if let Some(table) = cached {
            debug!("Cache hit for {} breakdown by {}", agency_code, dimension);
            return Ok(table);
        }

        info!(
            "Fetching FY{} breakdown by {} for {}",
            key.fiscal_year, dimension, agency_code
        );
        let table = fetch_breakdown(&self.source, agency_code, dimension, key.fiscal_year).await?;

        if let Ok(mut tables) = self.breakdowns.lock() {
            tables.insert(key, table.clone());
        }
        Ok(table)
    }

    /// Historical tables of two agencies stacked, tagged with an `Agency` column.
    pub async fn compare(
        &self,
        first: &AgencyRecord,
        second: &AgencyRecord,
    ) -> Result<Table, ApiError> {
        if first.code == second.code || first.name == second.name {
            return Err(ApiError::SameAgency);
        }

        let mut combined = self.history(&first.code).await;
        if combined.is_empty() {
            return Err(ApiError::NoData(first.name.clone()));
        }
        let mut other = self.history(&second.code).await;
        if other.is_empty() {
            return Err(ApiError::NoData(second.name.clone()));
        }

        combined.insert_column(1, "Agency", Value::String(first.name.clone()));
        other.insert_column(1, "Agency", Value::String(second.name.clone()));
        combined.append(other);
        Ok(combined)
    }
}

/// Spending recorded for `fiscal_year`, if the table has that year.
pub fn spending_in(table: &Table, fiscal_year: i32) -> Option<f64> {
    let year = fiscal_year.to_string();
    (0..table.len())
        .find(|&row| {
            table.value(row, FISCAL_YEAR_COLUMN).and_then(Value::as_str) == Some(year.as_str())
        })
        .and_then(|row| table.value(row, SPENDING_COLUMN))
        .and_then(Value::as_f64)
}
