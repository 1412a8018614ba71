//! Per-year and single-year fetches against a [`SpendingSource`].

use crate::analysis::{breakdown_table, decode_results};
use crate::api::source::{agency_path, SpendingSource};
use crate::error::ApiError;
use crate::models::{BreakdownDimension, BreakdownRecord, DataKind, Table, YearRange};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// How the requests for a year range are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Build every request, then await them as one batch.
    #[default]
    Concurrent,
    /// Await each year before issuing the next.
    Sequential,
}

/// A successful response for one fiscal year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearResponse {
    pub fiscal_year: i32,
    pub body: Value,
}

/// Fetch `kind` for every year in `years`.
///
/// Years that fail for any reason are left out of the result.
pub async fn fetch_years<S: SpendingSource>(
    source: &S,
    agency_code: &str,
    kind: DataKind,
    years: YearRange,
    mode: FetchMode,
) -> Vec<YearResponse> {
    let path = agency_path(agency_code, kind.path_suffix());

    let outcomes = match mode {
        FetchMode::Concurrent => {
            let requests: Vec<_> = years
                .years()
                .map(|year| fetch_year(source, &path, year))
                .collect();
            join_all(requests).await
        }
        FetchMode::Sequential => {
            let mut outcomes = Vec::with_capacity(years.len());
            for year in years.years() {
                outcomes.push(fetch_year(source, &path, year).await);
            }
            outcomes
        }
    };

    let responses: Vec<YearResponse> = outcomes.into_iter().flatten().collect();
    debug!(
        "{} {}: {}/{} years returned data",
        agency_code,
        kind,
        responses.len(),
        years.len()
    );
    responses
}

async fn fetch_year<S: SpendingSource>(source: &S, path: &str, year: i32) -> Option<YearResponse> {
    match source.get_json(path, year).await {
        Ok(Value::Null) => None,
        Ok(body) => Some(YearResponse {
            fiscal_year: year,
            body,
        }),
        Err(e) => {
            debug!("No data for {} in FY{}: {}", path, year, e);
            None
        }
    }
}

/// Fetch one year's spending split along `dimension`.
///
/// Returns the `Breakdown`/`Spending` pairs in the order the API lists them.
pub async fn fetch_breakdown<S: SpendingSource>(
    source: &S,
    agency_code: &str,
    dimension: BreakdownDimension,
    fiscal_year: i32,
) -> Result<Table, ApiError> {
    let path = agency_path(agency_code, dimension.path_suffix());
    let body = source.get_json(&path, fiscal_year).await?;

    let records = decode_results::<BreakdownRecord>(&body)
        .map_err(|source| ApiError::Decode { url: path, source })?;

    Ok(breakdown_table(records))
}
