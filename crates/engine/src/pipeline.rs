//! Flow pipeline.
//!
//! Runs one flow end to end:
//! 1. Scan the flow's history for candidates (via `CandidateScanner`)
//! 2. Batch-resolve profiles and devices (via `SubjectDirectory` + `DeviceIndex`)
//! 3. Per candidate: number the attempt, resolve the policy, schedule
//! 4. Collect ready records and non-fatal lookup failures for the reporter
//!
//! Stage 1 and 2 failures abort the run; stage 3 failures skip only the
//! candidate they belong to.

use chrono::Utc;
use sqlx::PgPool;

use nudge_common::config::JobConfig;
use nudge_common::error::{CandidateFailure, JobError};
use nudge_common::types::{DeviceMetadata, NotificationRecord, ScanFlow};
use nudge_scanner::source::CandidateScanner;

use crate::attempts::AttemptLedger;
use crate::devices::DeviceIndex;
use crate::directory::SubjectDirectory;
use crate::policy::PolicyResolver;
use crate::scheduler::{EnrichedCandidate, ScheduleOutcome, assemble};

/// Everything one flow pass produced.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub notifications: Vec<NotificationRecord>,
    pub failures: Vec<CandidateFailure>,
}

/// Run one flow's discovery-to-schedule pass.
pub async fn run_flow(
    pool: &PgPool,
    config: &JobConfig,
    flow: ScanFlow,
) -> Result<PipelineOutcome, JobError> {
    let scanner = CandidateScanner::new(pool.clone(), flow, config);
    let candidates = scanner.fetch_candidates().await?;
    if candidates.is_empty() {
        return Ok(PipelineOutcome::default());
    }

    // One candidate per subject, so the key list is just the projection.
    let subject_keys: Vec<String> = candidates
        .iter()
        .map(|candidate| candidate.subject_key.clone())
        .collect();

    let directory = SubjectDirectory::load(pool, &subject_keys).await?;
    if directory.is_empty() {
        tracing::info!(
            flow = %flow,
            subjects = subject_keys.len(),
            "None of the scanned subjects have a profile"
        );
    }
    let devices = DeviceIndex::load(pool, &directory.identity_ids()).await?;

    tracing::debug!(
        flow = %flow,
        subjects = subject_keys.len(),
        profiles = directory.len(),
        devices = devices.len(),
        "Batch lookups complete"
    );

    let source = config
        .source_label
        .clone()
        .unwrap_or_else(|| flow.default_source().to_string());

    let mut outcome = PipelineOutcome::default();
    let mut suppressed = 0u32;
    let mut unresolved = 0u32;
    let mut unconfigured = 0u32;

    for candidate in &candidates {
        let Some(profile) = directory.get(&candidate.subject_key) else {
            tracing::debug!(
                subject_key = %candidate.subject_key,
                "No profile for subject, dropping candidate"
            );
            unresolved += 1;
            continue;
        };

        let device = devices
            .get(profile.id)
            .cloned()
            .unwrap_or_else(DeviceMetadata::placeholder);

        let attempt = match AttemptLedger::next_attempt(pool, profile.id, candidate.event_type)
            .await
        {
            Ok(attempt) => attempt,
            Err(err) => {
                outcome.failures.push(CandidateFailure::AttemptLookup {
                    identity_id: profile.id,
                    event: candidate.event_type,
                    source: err,
                });
                continue;
            }
        };

        let policy = match PolicyResolver::resolve(pool, candidate.event_type, attempt).await {
            Ok(Some(policy)) => policy,
            Ok(None) => {
                tracing::debug!(
                    identity_id = profile.id,
                    event = %candidate.event_type,
                    attempt,
                    "No policy for this attempt, sequence ends"
                );
                unconfigured += 1;
                continue;
            }
            Err(err) => {
                outcome.failures.push(CandidateFailure::PolicyLookup {
                    identity_id: profile.id,
                    event: candidate.event_type,
                    attempt,
                    source: err,
                });
                continue;
            }
        };

        let enriched = EnrichedCandidate {
            candidate,
            profile,
            device,
            policy,
            attempt,
        };
        let status_at_capture = flow.status_at_capture(candidate);

        match assemble(&enriched, &status_at_capture, &source, Utc::now()) {
            ScheduleOutcome::Ready(record) => {
                tracing::debug!(
                    identity_id = record.identity_id,
                    event = %record.event,
                    attempt = record.attempt,
                    delay_seconds = record.delay_seconds,
                    "Notification scheduled"
                );
                outcome.notifications.push(record);
            }
            ScheduleOutcome::PastDue { delay_seconds } => {
                tracing::debug!(
                    identity_id = profile.id,
                    event = %candidate.event_type,
                    delay_seconds,
                    "Send time already elapsed, suppressing"
                );
                suppressed += 1;
            }
        }
    }

    tracing::info!(
        flow = %flow,
        candidates = candidates.len(),
        scheduled = outcome.notifications.len(),
        suppressed,
        unresolved,
        unconfigured,
        failures = outcome.failures.len(),
        "Flow pass complete"
    );

    Ok(outcome)
}
