//! Status classification — maps raw history statuses to notification events.
//!
//! The candidate queries rank rows and hand the winning status here; the
//! mapping itself is a pure function so the rules are testable without a
//! database. A status that classifies to `None` excludes the subject from
//! this run.

use nudge_common::types::{CARD_DECLINED_STATUS, EventType, ScanFlow};

/// Verification status meaning the subject declared intent (filled the PAN
/// form) but may not have completed the Aadhaar step.
const INTENT_DECLARED_STATUS: &str = "PAN_FORM";

/// Statuses where verification was explicitly rejected.
pub const REJECT_STATUSES: &[&str] = &[
    "AADHAAR_EXPIRED_VID",
    "AADHAAR_FORBIDDEN_ERR",
    "AADHAAR_INVALID",
    "AADHAAR_INVALID_VID",
    "AADHAAR_MOBILE_ERR",
    "AADHAAR_SUSPENDED",
];

/// Statuses where the verification attempt failed mid-flight (OTP
/// exhaustion, timeouts, upstream errors).
pub const FAILURE_STATUSES: &[&str] = &[
    "AADHAAR_EXCEEDED_OTP",
    "AADHAAR_DEMOAUTH_FAILED",
    "AADHAAR_OTP_FAILED",
    "AADHAAR_SERVER_ERR",
    "AADHAR_VERIFY_4XX",
    "AADHAR_VERIFY_500",
    "AADHAR_VERIFY_INVALID_OTP",
    "AADHAAR_SENDOTP_TIMEOUT",
    "AADHAR_VERIFY_TIMEOUT",
    "AADHAR_VERIFY_MAXOTP_ATTEMPS",
    "AADHAAR_RATELIMIT",
];

/// Classify a subject's most recent history status into a notification event.
///
/// `completed_verification` is the per-subject existence check computed by
/// the candidate query: whether any completed-verification row exists for
/// the subject. Declared intent without that prerequisite is a drop-off,
/// which is distinct from an explicit rejection.
pub fn classify(flow: ScanFlow, status: &str, completed_verification: bool) -> Option<EventType> {
    match flow {
        ScanFlow::CardDecline => {
            (status == CARD_DECLINED_STATUS).then_some(EventType::CardDeclined)
        }
        ScanFlow::IdentityVerification => {
            if status == INTENT_DECLARED_STATUS && !completed_verification {
                Some(EventType::FormDropoff)
            } else if REJECT_STATUSES.contains(&status) {
                Some(EventType::VerificationRejected)
            } else if FAILURE_STATUSES.contains(&status) {
                Some(EventType::VerificationFailed)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_flow_classifies_only_declines() {
        assert_eq!(
            classify(ScanFlow::CardDecline, "DECLINED", false),
            Some(EventType::CardDeclined)
        );
        assert_eq!(classify(ScanFlow::CardDecline, "APPROVED", false), None);
        assert_eq!(classify(ScanFlow::CardDecline, "PAN_FORM", false), None);
    }

    #[test]
    fn test_intent_without_completion_is_dropoff() {
        assert_eq!(
            classify(ScanFlow::IdentityVerification, "PAN_FORM", false),
            Some(EventType::FormDropoff)
        );
    }

    #[test]
    fn test_intent_with_completion_is_not_actionable() {
        assert_eq!(
            classify(ScanFlow::IdentityVerification, "PAN_FORM", true),
            None
        );
    }

    #[test]
    fn test_every_reject_status_maps_to_rejected() {
        for status in REJECT_STATUSES {
            assert_eq!(
                classify(ScanFlow::IdentityVerification, status, false),
                Some(EventType::VerificationRejected),
                "status {status} should classify as a rejection"
            );
        }
    }

    #[test]
    fn test_every_failure_status_maps_to_failed() {
        for status in FAILURE_STATUSES {
            assert_eq!(
                classify(ScanFlow::IdentityVerification, status, false),
                Some(EventType::VerificationFailed),
                "status {status} should classify as a failure"
            );
        }
    }

    #[test]
    fn test_unrelated_statuses_are_not_actionable() {
        assert_eq!(classify(ScanFlow::IdentityVerification, "AADHAR", false), None);
        assert_eq!(
            classify(ScanFlow::IdentityVerification, "SELFIE_UPLOADED", true),
            None
        );
        assert_eq!(classify(ScanFlow::IdentityVerification, "", false), None);
    }

    #[test]
    fn test_event_wire_labels() {
        assert_eq!(EventType::CardDeclined.to_string(), "CREDIT_CARD_REJECTED");
        assert_eq!(EventType::VerificationRejected.to_string(), "AADHAAR_REJECT");
        assert_eq!(EventType::VerificationFailed.to_string(), "AADHAAR_FAILURE");
        assert_eq!(EventType::FormDropoff.to_string(), "AADHAR_FORM_DROPOFF");
    }
}
