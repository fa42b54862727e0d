//! Run report — human-readable rendering of scheduled notifications and
//! collected failures.
//!
//! Field order inside a notification block is part of the output contract;
//! downstream tooling scrapes it. Change it only together with consumers.

use std::io;

use nudge_common::error::CandidateFailure;
use nudge_common::types::NotificationRecord;

/// Render each record as one block in fixed field order, followed by a
/// summary count.
pub fn render_notifications(
    out: &mut impl io::Write,
    records: &[NotificationRecord],
) -> io::Result<()> {
    for record in records {
        writeln!(out, "Notification:")?;
        writeln!(out, "  Event: {}", record.event)?;
        writeln!(out, "  Delay (seconds): {:.2}", record.delay_seconds)?;
        writeln!(out, "  Identity ID: {}", record.identity_id)?;
        writeln!(out, "  Subject Key: {}", record.subject_key)?;
        writeln!(out, "  Contact: {}", record.raw_contact)?;
        writeln!(out, "  Status: {}", record.status_at_capture)?;
        writeln!(out, "  Attempt: {}", record.attempt)?;
        writeln!(out, "  Source: {}", record.source)?;
        writeln!(out, "  Channel: {}", record.channel)?;
        let metadata = record
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "  Metadata: {{{metadata}}}")?;
        writeln!(out, "  Device Token: {}", record.device_token)?;
        writeln!(out, "  Policy ID: {}", record.policy_id)?;
        writeln!(out)?;
    }
    writeln!(out, "Scheduled notifications: {}", records.len())?;
    Ok(())
}

/// Render the collected per-candidate failures as a numbered list.
/// Writes nothing when there are none.
pub fn render_failures(out: &mut impl io::Write, failures: &[CandidateFailure]) -> io::Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "Errors ({}):", failures.len())?;
    for (index, failure) in failures.iter().enumerate() {
        writeln!(out, "  {}. {}", index + 1, failure)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use nudge_common::types::EventType;

    fn make_record() -> NotificationRecord {
        let mut metadata = BTreeMap::new();
        metadata.insert("name".to_string(), "Asha Rao".to_string());
        NotificationRecord {
            event: EventType::CardDeclined,
            delay_seconds: 1800.0,
            identity_id: 42,
            subject_key: "+919990001111".to_string(),
            raw_contact: "9990001111".to_string(),
            status_at_capture: "DECLINED".to_string(),
            attempt: 1,
            source: "card-decline-batch".to_string(),
            channel: "push".to_string(),
            metadata,
            device_token: "tok-1".to_string(),
            policy_id: 7,
        }
    }

    fn render_to_string(records: &[NotificationRecord]) -> String {
        let mut buf = Vec::new();
        render_notifications(&mut buf, records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_notification_block_field_order() {
        let expected = "\
Notification:
  Event: CREDIT_CARD_REJECTED
  Delay (seconds): 1800.00
  Identity ID: 42
  Subject Key: +919990001111
  Contact: 9990001111
  Status: DECLINED
  Attempt: 1
  Source: card-decline-batch
  Channel: push
  Metadata: {name: Asha Rao}
  Device Token: tok-1
  Policy ID: 7

Scheduled notifications: 1
";
        assert_eq!(render_to_string(&[make_record()]), expected);
    }

    #[test]
    fn test_summary_counts_all_records() {
        let output = render_to_string(&[make_record(), make_record()]);
        assert!(output.ends_with("Scheduled notifications: 2\n"));
    }

    #[test]
    fn test_failures_render_as_numbered_list() {
        let failures = vec![
            CandidateFailure::AttemptLookup {
                identity_id: 5,
                event: EventType::CardDeclined,
                source: sqlx::Error::RowNotFound,
            },
            CandidateFailure::PolicyLookup {
                identity_id: 6,
                event: EventType::FormDropoff,
                attempt: 2,
                source: sqlx::Error::RowNotFound,
            },
        ];

        let mut buf = Vec::new();
        render_failures(&mut buf, &failures).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.contains("Errors (2):"));
        assert!(output.contains("  1. attempt lookup failed for identity 5"));
        assert!(output.contains("  2. policy lookup failed for identity 6"));
        assert!(output.contains("event AADHAR_FORM_DROPOFF, attempt 2"));
    }

    #[test]
    fn test_no_failures_renders_nothing() {
        let mut buf = Vec::new();
        render_failures(&mut buf, &[]).unwrap();
        assert!(buf.is_empty());
    }
}
