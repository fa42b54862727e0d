use thiserror::Error;

use crate::types::EventType;

/// Run-aborting errors: a fetch-stage query failure or broken configuration.
/// Anything already scheduled is discarded when one of these surfaces.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Per-candidate lookup failures. The candidate is skipped, the failure is
/// collected, and the run continues; the reporter lists them at the end.
#[derive(Debug, Error)]
pub enum CandidateFailure {
    #[error("attempt lookup failed for identity {identity_id}, event {event}: {source}")]
    AttemptLookup {
        identity_id: i64,
        event: EventType,
        source: sqlx::Error,
    },

    #[error("policy lookup failed for identity {identity_id}, event {event}, attempt {attempt}: {source}")]
    PolicyLookup {
        identity_id: i64,
        event: EventType,
        attempt: i32,
        source: sqlx::Error,
    },
}
