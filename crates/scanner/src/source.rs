use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use nudge_common::config::JobConfig;
use nudge_common::error::JobError;
use nudge_common::types::{CandidateEvent, ScanFlow};

use crate::classify::classify;

/// Rank-1 history row as fetched, before classification.
#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    subject_key: String,
    status: String,
    occurred_at: DateTime<Utc>,
    completed_verification: bool,
}

/// Paged scanner over one flow's history table. Yields at most one
/// candidate per subject: the most recent row inside the lookback window,
/// classified into a notification event.
pub struct CandidateScanner {
    pool: PgPool,
    flow: ScanFlow,
    lookback_days: u32,
    page_size: u32,
}

impl CandidateScanner {
    pub fn new(pool: PgPool, flow: ScanFlow, config: &JobConfig) -> Self {
        Self {
            pool,
            flow,
            lookback_days: config.lookback_days,
            page_size: config.page_size,
        }
    }

    /// Run the full paged scan.
    ///
    /// Pages with LIMIT/OFFSET until a short page comes back. Any page-fetch
    /// error aborts the run; an empty result set is a normal outcome.
    pub async fn fetch_candidates(&self) -> Result<Vec<CandidateEvent>, JobError> {
        let query = candidate_query(self.flow);
        let mut candidates = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut offset: i64 = 0;

        tracing::info!(
            flow = %self.flow,
            lookback_days = self.lookback_days,
            page_size = self.page_size,
            "Scanning for candidates"
        );

        loop {
            let rows: Vec<HistoryRow> = sqlx::query_as(query)
                .bind(self.lookback_days as i32)
                .bind(i64::from(self.page_size))
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
            let fetched = rows.len();

            for row in rows {
                if row.subject_key.is_empty() {
                    tracing::warn!(flow = %self.flow, "Skipping history row with empty subject key");
                    continue;
                }
                // Rows landing mid-scan can shift OFFSET pages; the first
                // occurrence of a subject wins.
                if !seen.insert(row.subject_key.clone()) {
                    continue;
                }
                let Some(event_type) = classify(self.flow, &row.status, row.completed_verification)
                else {
                    tracing::debug!(
                        flow = %self.flow,
                        status = %row.status,
                        "Most recent status not actionable, excluding subject"
                    );
                    continue;
                };
                candidates.push(CandidateEvent {
                    subject_key: row.subject_key,
                    raw_status: row.status,
                    occurred_at: row.occurred_at,
                    event_type,
                });
            }

            tracing::debug!(
                flow = %self.flow,
                page_rows = fetched,
                offset,
                total = candidates.len(),
                "Fetched candidate page"
            );

            if fetched < self.page_size as usize {
                break;
            }
            offset += i64::from(self.page_size);
        }

        if candidates.is_empty() {
            tracing::info!(
                flow = %self.flow,
                lookback_days = self.lookback_days,
                "No candidates in window; check source data or widen LOOKBACK_DAYS"
            );
        } else {
            tracing::info!(flow = %self.flow, candidates = candidates.len(), "Candidate scan complete");
        }

        Ok(candidates)
    }
}

/// Per-flow candidate SQL. Both shapes rank a subject's rows most recent
/// first and keep rank 1; the outer ORDER BY keeps LIMIT/OFFSET pages
/// deterministic. Parameters: $1 lookback days, $2 limit, $3 offset.
fn candidate_query(flow: ScanFlow) -> &'static str {
    match flow {
        ScanFlow::CardDecline => {
            r#"
            SELECT subject_key, status, occurred_at, completed_verification
            FROM (
                SELECT mobile_number AS subject_key,
                       status,
                       created_at AS occurred_at,
                       false AS completed_verification,
                       ROW_NUMBER() OVER (
                           PARTITION BY mobile_number ORDER BY created_at DESC
                       ) AS rn
                FROM card_statuses
                WHERE status = 'DECLINED'
                  AND created_at >= NOW() - make_interval(days => $1)
            ) ranked
            WHERE rn = 1
            ORDER BY subject_key
            LIMIT $2 OFFSET $3
            "#
        }
        ScanFlow::IdentityVerification => {
            r#"
            SELECT subject_key, status, occurred_at, completed_verification
            FROM (
                SELECT fs.mobile_number AS subject_key,
                       fs.status,
                       fs.created_at AS occurred_at,
                       EXISTS (
                           SELECT 1 FROM flow_statuses done
                           WHERE done.mobile_number = fs.mobile_number
                             AND done.status = 'AADHAR'
                       ) AS completed_verification,
                       ROW_NUMBER() OVER (
                           PARTITION BY fs.mobile_number ORDER BY fs.created_at DESC
                       ) AS rn
                FROM flow_statuses fs
                WHERE fs.created_at >= NOW() - make_interval(days => $1)
            ) ranked
            WHERE rn = 1
            ORDER BY subject_key
            LIMIT $2 OFFSET $3
            "#
        }
    }
}
