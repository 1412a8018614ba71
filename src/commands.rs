//! Report builders for each CLI command.

use crate::analysis::{spending_by_year, spending_shares, top_spenders, total_spending};
use crate::api::source::SpendingSource;
use crate::api::{spending_in, SpendingService};
use crate::cli::Command;
use crate::directory::AgencyDirectory;
use crate::error::ApiError;
use crate::models::{
    AgencyRecord, BreakdownDimension, Report, ReportMetadata, Table, FISCAL_YEAR_COLUMN,
    SPENDING_COLUMN,
};
use crate::purchases::{checkout, format_currency, format_short, Purchase, CATALOGUE};
use chrono::Utc;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::debug;

const HISTORY_COLUMNS: &[&str] = &[
    FISCAL_YEAR_COLUMN,
    SPENDING_COLUMN,
    "transaction_count",
    "latest_action_date",
];

const SUBAGENCY_COLUMNS: &[&str] = &[
    FISCAL_YEAR_COLUMN,
    "Subagency",
    "abbreviation",
    SPENDING_COLUMN,
    "transaction_count",
    "new_award_count",
];

const COMPARE_COLUMNS: &[&str] = &[
    FISCAL_YEAR_COLUMN,
    "Agency",
    SPENDING_COLUMN,
    "transaction_count",
];

const TOP_SUBAGENCIES: usize = 5;
const TOP_BREAKDOWN_SHARES: usize = 3;

/// Whether an empty table from this command means "no data found".
pub fn expects_data(command: &Command) -> bool {
    !matches!(command, Command::Budget { .. } | Command::Items)
}

/// Build the report for `command`.
pub async fn build_report<S: SpendingSource>(
    command: &Command,
    directory: &AgencyDirectory,
    service: &SpendingService<S>,
) -> Result<Report, ApiError> {
    match command {
        Command::Agencies { filter } => Ok(agencies_report(directory, filter.as_deref())),
        Command::History { agency } => Ok(history_report(service, directory.resolve(agency)?).await),
        Command::Subagencies { agency } => {
            Ok(subagencies_report(service, directory.resolve(agency)?).await)
        }
        Command::Compare { agency, other } => {
            let first = directory.resolve(agency)?;
            let second = directory.resolve(other)?;
            compare_report(service, first, second).await
        }
        Command::Breakdown { agency, by } => {
            breakdown_report(service, directory.resolve(agency)?, *by).await
        }
        Command::Budget { agency, buy } => {
            budget_report(service, directory.resolve(agency)?, buy).await
        }
        Command::Items => Ok(items_report()),
    }
}

fn metadata(agencies: &[&AgencyRecord], fiscal_years: String, table: &Table) -> ReportMetadata {
    ReportMetadata {
        agencies: agencies.iter().map(|a| a.name.clone()).collect(),
        fiscal_years,
        generated_at: Utc::now(),
        rows: table.len(),
    }
}

fn with_agency_details(mut report: Report, agency: &AgencyRecord) -> Report {
    report = report.with_summary("CGAC Code", agency.code.clone());
    if !agency.website.is_empty() {
        report = report.with_summary("Website", agency.website.clone());
    }
    if !agency.description.is_empty() {
        report = report.with_summary("About", agency.description.clone());
    }
    report
}

fn agencies_report(directory: &AgencyDirectory, filter: Option<&str>) -> Report {
    let needle = filter.map(|f| f.trim().to_lowercase());
    let mut table = Table::new(vec![
        "Code".to_string(),
        "Agency".to_string(),
        "Website".to_string(),
    ]);

    for agency in directory.agencies() {
        let keep = match &needle {
            Some(needle) => agency.name.to_lowercase().contains(needle) || agency.code == *needle,
            None => true,
        };
        if keep {
            table.push_row(vec![
                Value::String(agency.code.clone()),
                Value::String(agency.name.clone()),
                Value::String(agency.website.clone()),
            ]);
        }
    }

    let meta = metadata(&[], String::new(), &table);
    let empty = match filter {
        Some(filter) => format!("No agencies match '{}'.", filter),
        None => "The agency directory is empty.".to_string(),
    };
    let count = table.len();
    Report::new("Federal Agencies", meta, table)
        .with_summary("Agencies", count.to_string())
        .with_empty_message(empty)
}

async fn history_report<S: SpendingSource>(
    service: &SpendingService<S>,
    agency: &AgencyRecord,
) -> Report {
    let table = service.history(&agency.code).await;
    let by_year = spending_by_year(&table);
    let peak = by_year
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
        .map(|(year, amount)| format!("{} ({})", year, format_currency(*amount)));

    let meta = metadata(&[agency], service.settings().years.to_string(), &table);
    let total = total_spending(&table);
    let mut report = Report::new(format!("{}: Spending by Fiscal Year", agency.name), meta, table)
        .with_display_columns(HISTORY_COLUMNS)
        .with_empty_message(ApiError::NoData(agency.name.clone()).to_string());

    report = with_agency_details(report, agency);
    if let Some(peak) = peak {
        report = report
            .with_summary("Total Spending", format_currency(total))
            .with_summary("Years With Data", by_year.len().to_string())
            .with_summary("Peak Year", peak);
    }
    report
}

async fn subagencies_report<S: SpendingSource>(
    service: &SpendingService<S>,
    agency: &AgencyRecord,
) -> Report {
    let table = service.subagencies(&agency.code).await;
    let top = top_spenders(&table, "Subagency", TOP_SUBAGENCIES);
    let total = total_spending(&table);

    let meta = metadata(&[agency], service.settings().years.to_string(), &table);
    let mut report = Report::new(format!("{}: Spending by Sub-Agency", agency.name), meta, table)
        .with_display_columns(SUBAGENCY_COLUMNS)
        .with_empty_message(ApiError::NoData(agency.name.clone()).to_string());

    report = with_agency_details(report, agency);
    if !top.is_empty() {
        report = report.with_summary("Total Spending", format_currency(total));
        for (name, amount) in top {
            report = report.with_summary(name, format_currency(amount));
        }
    }
    report
}

async fn compare_report<S: SpendingSource>(
    service: &SpendingService<S>,
    first: &AgencyRecord,
    second: &AgencyRecord,
) -> Result<Report, ApiError> {
    let table = service.compare(first, second).await?;
    let totals = top_spenders(&table, "Agency", 2);

    let meta = metadata(&[first, second], service.settings().years.to_string(), &table);
    let mut report = Report::new(format!("{} vs. {}", first.name, second.name), meta, table)
        .with_display_columns(COMPARE_COLUMNS);
    for (name, amount) in totals {
        report = report.with_summary(format!("{} Total", name), format_currency(amount));
    }
    Ok(report)
}

async fn breakdown_report<S: SpendingSource>(
    service: &SpendingService<S>,
    agency: &AgencyRecord,
    dimension: BreakdownDimension,
) -> Result<Report, ApiError> {
    let year = service.settings().breakdown_year;
    let table = service.breakdown(&agency.code, dimension).await?;

    let mut shares = spending_shares(&table, "Breakdown");
    shares.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    shares.truncate(TOP_BREAKDOWN_SHARES);
    let total = total_spending(&table);

    let meta = metadata(&[agency], year.to_string(), &table);
    let mut report = Report::new(
        format!("{}: FY{} Spending by {}", agency.name, year, dimension),
        meta,
        table,
    )
    .with_empty_message(format!(
        "Sorry, no {} breakdown was found for {} in FY{}!",
        dimension.to_string().to_lowercase(),
        agency.name,
        year
    ));

    report = with_agency_details(report, agency);
    if !shares.is_empty() {
        report = report.with_summary("Total Spending", format_currency(total));
        for (label, share) in shares {
            report = report.with_summary(label, format!("{:.1}%", share));
        }
    }
    Ok(report)
}

async fn budget_report<S: SpendingSource>(
    service: &SpendingService<S>,
    agency: &AgencyRecord,
    purchases: &[Purchase],
) -> Result<Report, ApiError> {
    let settings = service.settings();
    let year = settings.breakdown_year;
    if !settings.years.contains(year) {
        debug!("FY{} is outside {}", year, settings.years);
        return Err(ApiError::NoData(format!("{} in FY{}", agency.name, year)));
    }

    let history = service.history(&agency.code).await;
    let budget = spending_in(&history, year)
        .ok_or_else(|| ApiError::NoData(format!("{} in FY{}", agency.name, year)))?;
    let receipt = checkout(budget, purchases);

    let mut table = Table::new(vec![
        "Item".to_string(),
        "Quantity".to_string(),
        "Cost".to_string(),
    ]);
    for purchase in &receipt.purchases {
        table.push_row(vec![
            Value::String(purchase.item.label.to_string()),
            Value::from(purchase.quantity),
            Value::from(purchase.cost()),
        ]);
    }

    let meta = metadata(&[agency], year.to_string(), &table);
    let mut report = Report::new(
        format!("What could {} buy in FY{}?", agency.name, year),
        meta,
        table,
    )
    .with_summary(format!("FY{} Spending", year), format_currency(receipt.budget))
    .with_summary("Receipt", format_currency(receipt.receipt))
    .with_summary("Left to Spend", format_currency(receipt.remaining))
    .with_empty_message("Your cart is empty. Add items with --buy ITEM=QTY (see `spendscope items`).");

    if receipt.is_over_budget() {
        report = report.with_summary("Status", "Over budget! Remove some items.");
    }
    Ok(report)
}

fn items_report() -> Report {
    let mut table = Table::new(vec![
        "Key".to_string(),
        "Item".to_string(),
        "Cost".to_string(),
        "Category".to_string(),
    ]);
    for item in CATALOGUE {
        let category = if item.just_for_fun {
            "Just for fun"
        } else {
            "Costly essentials"
        };
        table.push_row(vec![
            Value::String(item.key.to_string()),
            Value::String(item.label.to_string()),
            Value::from(item.cost),
            Value::String(category.to_string()),
        ]);
    }

    let meta = metadata(&[], String::new(), &table);
    let cheapest = CATALOGUE
        .iter()
        .map(|item| item.cost)
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(format_short)
        .unwrap_or_default();
    Report::new("Budget Calculator Items", meta, table).with_summary("Cheapest Item", cheapest)
}
