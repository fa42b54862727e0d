//! Scheduler — turns a fully enriched candidate into a notification
//! record, or suppresses it when its send time already elapsed.
//!
//! The send time is the triggering event's timestamp plus the policy
//! delay. What gets emitted is the remainder of that delay at assembly
//! time, so a downstream dispatcher can sleep exactly that long.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use nudge_common::types::{
    CandidateEvent, DeliveryPolicy, DeviceMetadata, NotificationRecord, SubjectProfile,
};

/// A candidate with every per-candidate lookup resolved.
#[derive(Debug)]
pub struct EnrichedCandidate<'a> {
    pub candidate: &'a CandidateEvent,
    pub profile: &'a SubjectProfile,
    /// Resolved device row, or the placeholder when none exists
    pub device: DeviceMetadata,
    pub policy: DeliveryPolicy,
    pub attempt: i32,
}

/// Outcome of scheduling one candidate.
#[derive(Debug)]
pub enum ScheduleOutcome {
    /// Dispatch after `delay_seconds` (the record's own field).
    Ready(NotificationRecord),
    /// The send time already passed; the candidate is dropped silently.
    PastDue { delay_seconds: f64 },
}

/// Assemble the notification record for one enriched candidate.
///
/// The remaining delay is signed seconds with millisecond precision.
/// Negative suppresses the record; exactly zero still emits.
pub fn assemble(
    enriched: &EnrichedCandidate<'_>,
    status_at_capture: &str,
    source: &str,
    now: DateTime<Utc>,
) -> ScheduleOutcome {
    let candidate = enriched.candidate;
    let send_at =
        candidate.occurred_at + Duration::seconds(i64::from(enriched.policy.delay_seconds));
    let remaining = (send_at - now).num_milliseconds() as f64 / 1000.0;

    if remaining < 0.0 {
        return ScheduleOutcome::PastDue {
            delay_seconds: remaining,
        };
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("name".to_string(), enriched.profile.full_name.clone());

    ScheduleOutcome::Ready(NotificationRecord {
        event: candidate.event_type,
        delay_seconds: remaining,
        identity_id: enriched.profile.id,
        subject_key: candidate.subject_key.clone(),
        raw_contact: enriched.profile.plain_mobile_number.clone(),
        status_at_capture: status_at_capture.to_string(),
        attempt: enriched.attempt,
        source: source.to_string(),
        channel: enriched.policy.channel.clone(),
        metadata,
        device_token: enriched.device.device_token.clone(),
        policy_id: enriched.policy.policy_id,
    })
}
