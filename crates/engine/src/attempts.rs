//! Attempt ledger — where each (identity, event) pair stands in its
//! notification sequence.
//!
//! The ledger is append-only history written by the delivery side; this
//! job only reads the most recent row to number the next attempt.

use sqlx::PgPool;

use nudge_common::types::{AttemptRecord, EventType};

/// Read-side accessor over the historical notification attempts.
pub struct AttemptLedger;

impl AttemptLedger {
    /// Next attempt number for an (identity, event) pair.
    ///
    /// The most recent recorded attempt plus one, or 1 when nothing was
    /// ever recorded. Attempt numbers never reset.
    pub async fn next_attempt(
        pool: &PgPool,
        identity_id: i64,
        event: EventType,
    ) -> sqlx::Result<i32> {
        let latest: Option<AttemptRecord> = sqlx::query_as(
            r#"
            SELECT event_name, attempt
            FROM notification_status
            WHERE user_id = $1 AND event_name = $2
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(identity_id)
        .bind(event.to_string())
        .fetch_optional(pool)
        .await?;

        Ok(next_attempt_number(latest.as_ref()))
    }
}

/// Sequencing rule: attempts are 1-based and advance by one per record.
pub fn next_attempt_number(latest: Option<&AttemptRecord>) -> i32 {
    match latest {
        Some(record) => record.attempt + 1,
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(attempt: i32) -> AttemptRecord {
        AttemptRecord {
            event_name: "CREDIT_CARD_REJECTED".to_string(),
            attempt,
        }
    }

    #[test]
    fn test_no_history_starts_at_one() {
        assert_eq!(next_attempt_number(None), 1);
    }

    #[test]
    fn test_history_advances_by_one() {
        assert_eq!(next_attempt_number(Some(&make_record(1))), 2);
        assert_eq!(next_attempt_number(Some(&make_record(4))), 5);
    }
}
