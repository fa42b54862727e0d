use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Card-application status that marks a declined application.
pub const CARD_DECLINED_STATUS: &str = "DECLINED";

/// Platform recorded when an identity has no device row.
pub const UNKNOWN_PLATFORM: &str = "Unknown";

/// Device token recorded when an identity has no device row.
pub const MISSING_DEVICE_TOKEN: &str = "Not Available";

/// Notification events the job can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    CardDeclined,
    VerificationRejected,
    VerificationFailed,
    FormDropoff,
}

/// Wire labels as stored in the policy and attempt-ledger tables.
impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::CardDeclined => write!(f, "CREDIT_CARD_REJECTED"),
            EventType::VerificationRejected => write!(f, "AADHAAR_REJECT"),
            EventType::VerificationFailed => write!(f, "AADHAAR_FAILURE"),
            // Single-A spelling matches the stored label; do not "fix" it.
            EventType::FormDropoff => write!(f, "AADHAR_FORM_DROPOFF"),
        }
    }
}

/// The funnels the job can scan. Each flow carries its own candidate
/// query, classification rule, default source tag, and rule for the
/// status snapshot on emitted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanFlow {
    CardDecline,
    IdentityVerification,
}

impl ScanFlow {
    pub const ALL: [ScanFlow; 2] = [ScanFlow::CardDecline, ScanFlow::IdentityVerification];

    /// Parse a flow name from configuration (`card` / `verification`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "card" => Some(ScanFlow::CardDecline),
            "verification" => Some(ScanFlow::IdentityVerification),
            _ => None,
        }
    }

    /// Source tag stamped on emitted records when the SOURCE override is unset.
    pub fn default_source(&self) -> &'static str {
        match self {
            ScanFlow::CardDecline => "card-decline-batch",
            ScanFlow::IdentityVerification => "identity-verification-batch",
        }
    }

    /// Status snapshot carried on the emitted record. The card flow pins the
    /// decline literal; the verification flow carries the row's raw status.
    pub fn status_at_capture(&self, candidate: &CandidateEvent) -> String {
        match self {
            ScanFlow::CardDecline => CARD_DECLINED_STATUS.to_string(),
            ScanFlow::IdentityVerification => candidate.raw_status.clone(),
        }
    }
}

impl std::fmt::Display for ScanFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanFlow::CardDecline => write!(f, "card"),
            ScanFlow::IdentityVerification => write!(f, "verification"),
        }
    }
}

/// One subject's most recent qualifying event, as produced by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvent {
    /// Formatted mobile number identifying the subject in the history tables
    pub subject_key: String,
    /// Raw status string from the winning history row
    pub raw_status: String,
    /// When the winning history row was recorded
    pub occurred_at: DateTime<Utc>,
    /// Classified notification event
    pub event_type: EventType,
}

/// A subject's profile row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubjectProfile {
    pub id: i64,
    pub full_name: String,
    pub mobile_number: String,
    pub plain_mobile_number: String,
}

/// Push metadata for a subject's most recently seen device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    pub platform: String,
    pub device_token: String,
}

impl DeviceMetadata {
    /// Substitute for identities with no device row. A missing device never
    /// drops a candidate; downstream channels decide what to do with it.
    pub fn placeholder() -> Self {
        Self {
            platform: UNKNOWN_PLATFORM.to_string(),
            device_token: MISSING_DEVICE_TOKEN.to_string(),
        }
    }
}

/// Most recent row of the attempt ledger for an (identity, event) pair.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttemptRecord {
    pub event_name: String,
    pub attempt: i32,
}

/// Delivery policy configured for an (event, attempt) pair.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryPolicy {
    /// Seconds to wait after the triggering event before sending
    pub delay_seconds: i32,
    /// Delivery channel (e.g. push, sms)
    pub channel: String,
    pub event_name: String,
    pub policy_id: i32,
}

/// A fully assembled notification, ready for the reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub event: EventType,
    /// Remaining delay at assembly time, in seconds (millisecond precision)
    pub delay_seconds: f64,
    pub identity_id: i64,
    pub subject_key: String,
    pub raw_contact: String,
    pub status_at_capture: String,
    pub attempt: i32,
    pub source: String,
    pub channel: String,
    pub metadata: BTreeMap<String, String>,
    pub device_token: String,
    pub policy_id: i32,
}
