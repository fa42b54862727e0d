//! Policy resolution — the delivery policy configured for an
//! (event, attempt) pair.
//!
//! Lookup is exact-match only. `Ok(None)` means no policy is configured
//! for that attempt number, which is how a notification sequence ends;
//! only transport and query failures are errors.

use sqlx::PgPool;

use nudge_common::types::{DeliveryPolicy, EventType};

/// Read-side accessor over the notification policy table.
pub struct PolicyResolver;

impl PolicyResolver {
    /// Resolve the policy for exactly this (event, attempt) pair.
    pub async fn resolve(
        pool: &PgPool,
        event: EventType,
        attempt: i32,
    ) -> sqlx::Result<Option<DeliveryPolicy>> {
        sqlx::query_as(
            r#"
            SELECT delay AS delay_seconds, channel, event_name, event_id AS policy_id
            FROM notification_config
            WHERE event_name = $1 AND attempt = $2
            LIMIT 1
            "#,
        )
        .bind(event.to_string())
        .bind(attempt)
        .fetch_optional(pool)
        .await
    }
}
