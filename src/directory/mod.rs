//! Agency directory loading.
//!
//! The directory maps agency display names to CGAC codes. It comes from
//! the USAspending reference endpoint or from a CSV export of the CGAC
//! list (local file or URL), and is cleaned into an [`AgencyDirectory`].

mod names;

pub use names::clean_agency_name;

use crate::error::ApiError;
use crate::models::AgencyRecord;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Reference endpoint listing every top-tier agency.
pub const TOPTIER_AGENCIES_PATH: &str = "/api/v2/references/toptier_agencies/";

/// Width CGAC codes are zero-padded to.
const CODE_WIDTH: usize = 3;

/// Where the directory is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorySource {
    /// The USAspending toptier agency reference list.
    Api,
    /// CSV export served over HTTP(S).
    Url(String),
    /// CSV export on disk.
    File(PathBuf),
}

impl DirectorySource {
    /// Interpret a config/CLI value: `"api"`, a URL, or a file path.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("api") {
            DirectorySource::Api
        } else if value.starts_with("http://") || value.starts_with("https://") {
            DirectorySource::Url(value.to_string())
        } else {
            DirectorySource::File(PathBuf::from(value))
        }
    }
}

impl fmt::Display for DirectorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectorySource::Api => write!(f, "USAspending reference API"),
            DirectorySource::Url(url) => write!(f, "{}", url),
            DirectorySource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Cleaned, name-sorted agency list with a blank sentinel at the head.
#[derive(Debug, Clone, Default)]
pub struct AgencyDirectory {
    records: Vec<AgencyRecord>,
}

impl AgencyDirectory {
    /// Clean, deduplicate by name, sort by name, and prepend the sentinel.
    ///
    /// Records with a blank name or a non-numeric code are skipped. The
    /// first record seen for a name wins.
    pub fn from_records(raw: Vec<AgencyRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut agencies = Vec::with_capacity(raw.len());

        for record in raw {
            let name = clean_agency_name(&record.name);
            if name.is_empty() {
                continue;
            }
            let Some(code) = normalize_code(&record.code) else {
                debug!("Skipping {}: invalid code {:?}", name, record.code);
                continue;
            };
            if !seen.insert(name.clone()) {
                continue;
            }

            agencies.push(AgencyRecord {
                code,
                name,
                website: record.website.trim().to_string(),
                description: record.description.trim().to_string(),
            });
        }

        agencies.sort_by(|a, b| a.name.cmp(&b.name));

        let mut records = Vec::with_capacity(agencies.len() + 1);
        records.push(AgencyRecord::sentinel());
        records.extend(agencies);
        Self { records }
    }

    /// Every record, sentinel first.
    #[cfg(test)]
    pub fn records(&self) -> &[AgencyRecord] {
        &self.records
    }

    /// Real agencies, without the sentinel.
    pub fn agencies(&self) -> impl Iterator<Item = &AgencyRecord> {
        self.records.iter().filter(|r| !r.is_sentinel())
    }

    /// Number of real agencies.
    pub fn len(&self) -> usize {
        self.agencies().count()
    }

    pub fn by_name(&self, name: &str) -> Option<&AgencyRecord> {
        self.agencies().find(|r| r.name == name)
    }

    pub fn by_code(&self, code: &str) -> Option<&AgencyRecord> {
        self.agencies().find(|r| r.code == code)
    }

    /// Find an agency by code, exact name, case-insensitive name, or a
    /// substring that matches exactly one name.
    pub fn resolve(&self, query: &str) -> Result<&AgencyRecord, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::UnknownAgency(query.to_string()));
        }

        if let Some(record) = normalize_code(query).and_then(|code| self.by_code(&code)) {
            return Ok(record);
        }
        if let Some(record) = self.by_name(query) {
            return Ok(record);
        }
        if let Some(record) = self.agencies().find(|r| r.name.eq_ignore_ascii_case(query)) {
            return Ok(record);
        }

        let lowered = query.to_lowercase();
        let matches: Vec<&AgencyRecord> = self
            .agencies()
            .filter(|r| r.name.to_lowercase().contains(&lowered))
            .collect();
        match matches.as_slice() {
            [only] => Ok(*only),
            _ => Err(ApiError::UnknownAgency(query.to_string())),
        }
    }
}

/// Zero-pad a numeric code to [`CODE_WIDTH`] digits.
///
/// Spreadsheet exports sometimes render codes as floats (`"97.0"`).
pub fn normalize_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{:0>width$}", digits, width = CODE_WIDTH))
}

/// Load and clean the directory from `source`.
pub async fn load_agencies(
    source: &DirectorySource,
    client: &reqwest::Client,
    api_base: &str,
) -> Result<AgencyDirectory, ApiError> {
    let raw = match source {
        DirectorySource::Api => {
            let url = format!("{}{}", api_base.trim_end_matches('/'), TOPTIER_AGENCIES_PATH);
            let text = fetch_text(client, &url).await?;
            parse_toptier_json(&text, &url)?
        }
        DirectorySource::Url(url) => parse_csv(&fetch_text(client, url).await?)?,
        DirectorySource::File(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ApiError::Io {
                    path: path.clone(),
                    source,
                })?;
            parse_csv(&text)?
        }
    };

    let directory = AgencyDirectory::from_records(raw);
    info!("Loaded {} agencies from {}", directory.len(), source);
    Ok(directory)
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, ApiError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    response.text().await.map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })
}

/// Parse a CGAC CSV export.
///
/// Requires an agency name column (`AGENCY NAME`, `NAME`) and a code column
/// (`CGAC`, `CODE`); `WEBSITE` and `DESCRIPTION` are optional.
pub fn parse_csv(text: &str) -> Result<Vec<AgencyRecord>, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();

    let name_column = find_column(&headers, &["AGENCY NAME", "AGENCY_NAME", "NAME"])
        .ok_or_else(|| ApiError::Directory("missing AGENCY NAME column".to_string()))?;
    let code_column = find_column(&headers, &["CGAC", "CODE", "TOPTIER_CODE"])
        .ok_or_else(|| ApiError::Directory("missing CGAC column".to_string()))?;
    let website_column = find_column(&headers, &["WEBSITE"]);
    let description_column = find_column(&headers, &["DESCRIPTION", "MISSION"]);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |column: Option<usize>| {
            column
                .and_then(|i| row.get(i))
                .unwrap_or_default()
                .to_string()
        };

        records.push(AgencyRecord {
            code: field(Some(code_column)),
            name: field(Some(name_column)),
            website: field(website_column),
            description: field(description_column),
        });
    }
    Ok(records)
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

#[derive(Debug, Deserialize)]
struct ToptierAgency {
    agency_name: String,
    toptier_code: String,
    #[serde(default)]
    website: Option<String>,
    #[serde(default, alias = "mission")]
    description: Option<String>,
}

/// Parse the `toptier_agencies` reference response.
fn parse_toptier_json(text: &str, url: &str) -> Result<Vec<AgencyRecord>, ApiError> {
    #[derive(Deserialize)]
    struct Page {
        results: Vec<ToptierAgency>,
    }

    let page: Page = serde_json::from_str(text).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })?;

    Ok(page
        .results
        .into_iter()
        .map(|agency| AgencyRecord {
            code: agency.toptier_code,
            name: agency.agency_name,
            website: agency.website.unwrap_or_default(),
            description: agency.description.unwrap_or_default(),
        })
        .collect())
}
