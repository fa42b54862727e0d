use serde::Deserialize;

use crate::error::JobError;
use crate::types::ScanFlow;

const DEFAULT_LOOKBACK_DAYS: u32 = 7;
const DEFAULT_PAGE_SIZE: u32 = 1000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Job configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// How many days of history the candidate scan covers (default: 7)
    pub lookback_days: u32,

    /// Page size for the candidate scan (default: 1000)
    pub page_size: u32,

    /// Override for the per-flow source tag on emitted records
    pub source_label: Option<String>,

    /// Which funnels to scan this run (default: all)
    pub flows: Vec<ScanFlow>,

    /// Maximum number of PostgreSQL connections in the pool (default: 5)
    pub db_max_connections: u32,
}

impl JobConfig {
    /// Load configuration from environment variables.
    ///
    /// Only `DATABASE_URL` is required. Malformed optional values fall back
    /// to their defaults with a warning instead of aborting the run.
    pub fn from_env() -> Result<Self, JobError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| {
                JobError::Config("DATABASE_URL environment variable is required".to_string())
            })?,
            lookback_days: parse_lookback_days(std::env::var("LOOKBACK_DAYS").ok()),
            page_size: parse_page_size(std::env::var("PAGE_SIZE").ok()),
            source_label: std::env::var("SOURCE").ok().filter(|s| !s.is_empty()),
            flows: parse_scan_flows(std::env::var("SCAN_FLOWS").ok()),
            db_max_connections: parse_db_max_connections(
                std::env::var("DB_MAX_CONNECTIONS").ok(),
            ),
        })
    }
}

fn parse_lookback_days(raw: Option<String>) -> u32 {
    let Some(raw) = raw else {
        return DEFAULT_LOOKBACK_DAYS;
    };
    match raw.parse::<u32>() {
        Ok(days) if (1..=3650).contains(&days) => days,
        _ => {
            tracing::warn!(
                value = %raw,
                default = DEFAULT_LOOKBACK_DAYS,
                "Invalid LOOKBACK_DAYS, using default"
            );
            DEFAULT_LOOKBACK_DAYS
        }
    }
}

fn parse_page_size(raw: Option<String>) -> u32 {
    let Some(raw) = raw else {
        return DEFAULT_PAGE_SIZE;
    };
    match raw.parse::<u32>() {
        Ok(size) if size > 0 => size,
        _ => {
            tracing::warn!(
                value = %raw,
                default = DEFAULT_PAGE_SIZE,
                "Invalid PAGE_SIZE, using default"
            );
            DEFAULT_PAGE_SIZE
        }
    }
}

fn parse_db_max_connections(raw: Option<String>) -> u32 {
    let Some(raw) = raw else {
        return DEFAULT_DB_MAX_CONNECTIONS;
    };
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            tracing::warn!(
                value = %raw,
                default = DEFAULT_DB_MAX_CONNECTIONS,
                "Invalid DB_MAX_CONNECTIONS, using default"
            );
            DEFAULT_DB_MAX_CONNECTIONS
        }
    }
}

/// `SCAN_FLOWS` is a comma-separated list of flow names. Unknown entries are
/// skipped with a warning; an empty result falls back to scanning all flows.
fn parse_scan_flows(raw: Option<String>) -> Vec<ScanFlow> {
    let Some(raw) = raw else {
        return ScanFlow::ALL.to_vec();
    };

    let mut flows = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match ScanFlow::parse(part) {
            Some(flow) if !flows.contains(&flow) => flows.push(flow),
            Some(_) => {}
            None => tracing::warn!(value = %part, "Unknown entry in SCAN_FLOWS, skipping"),
        }
    }

    if flows.is_empty() {
        tracing::warn!(value = %raw, "SCAN_FLOWS selected no flows, scanning all");
        return ScanFlow::ALL.to_vec();
    }
    flows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_lookback_days_default_and_valid() {
        assert_eq!(parse_lookback_days(None), 7);
        assert_eq!(parse_lookback_days(some("14")), 14);
        assert_eq!(parse_lookback_days(some("1")), 1);
        assert_eq!(parse_lookback_days(some("3650")), 3650);
    }

    #[test]
    fn test_lookback_days_rejects_garbage_and_out_of_range() {
        assert_eq!(parse_lookback_days(some("abc")), 7);
        assert_eq!(parse_lookback_days(some("0")), 7);
        assert_eq!(parse_lookback_days(some("-3")), 7);
        assert_eq!(parse_lookback_days(some("3651")), 7);
    }

    #[test]
    fn test_page_size_default_and_bounds() {
        assert_eq!(parse_page_size(None), 1000);
        assert_eq!(parse_page_size(some("250")), 250);
        assert_eq!(parse_page_size(some("0")), 1000);
        assert_eq!(parse_page_size(some("xyz")), 1000);
    }

    #[test]
    fn test_db_max_connections_default_and_bounds() {
        assert_eq!(parse_db_max_connections(None), 5);
        assert_eq!(parse_db_max_connections(some("20")), 20);
        assert_eq!(parse_db_max_connections(some("0")), 5);
        assert_eq!(parse_db_max_connections(some("nope")), 5);
    }

    #[test]
    fn test_scan_flows_defaults_to_all() {
        assert_eq!(parse_scan_flows(None), ScanFlow::ALL.to_vec());
        assert_eq!(parse_scan_flows(some("")), ScanFlow::ALL.to_vec());
        assert_eq!(parse_scan_flows(some("bogus")), ScanFlow::ALL.to_vec());
    }

    #[test]
    fn test_scan_flows_parses_named_flows() {
        assert_eq!(parse_scan_flows(some("card")), vec![ScanFlow::CardDecline]);
        assert_eq!(
            parse_scan_flows(some("verification")),
            vec![ScanFlow::IdentityVerification]
        );
        assert_eq!(
            parse_scan_flows(some("card, verification")),
            ScanFlow::ALL.to_vec()
        );
    }

    #[test]
    fn test_scan_flows_skips_unknown_and_duplicate_entries() {
        assert_eq!(
            parse_scan_flows(some("card,bogus,card")),
            vec![ScanFlow::CardDecline]
        );
        assert_eq!(
            parse_scan_flows(some("VERIFICATION,card")),
            vec![ScanFlow::IdentityVerification, ScanFlow::CardDecline]
        );
    }
}
