//! Subject directory — batch profile resolution for scanned subject keys.
//!
//! One query per run resolves every candidate's profile. A key with no
//! profile row is simply absent from the map; the pipeline drops such
//! candidates without raising an error.

use std::collections::HashMap;

use sqlx::PgPool;

use nudge_common::types::SubjectProfile;

/// Immutable subject-key to profile mapping built once per flow pass.
pub struct SubjectDirectory {
    profiles: HashMap<String, SubjectProfile>,
}

impl SubjectDirectory {
    /// Batch-resolve profiles for the given subject keys in one query.
    pub async fn load(pool: &PgPool, subject_keys: &[String]) -> sqlx::Result<Self> {
        let rows: Vec<SubjectProfile> = sqlx::query_as(
            r#"
            SELECT id, full_name, mobile_number, plain_mobile_number
            FROM users
            WHERE mobile_number = ANY($1)
            "#,
        )
        .bind(subject_keys)
        .fetch_all(pool)
        .await?;

        let profiles = rows
            .into_iter()
            .map(|profile| (profile.mobile_number.clone(), profile))
            .collect();

        Ok(Self { profiles })
    }

    pub fn get(&self, subject_key: &str) -> Option<&SubjectProfile> {
        self.profiles.get(subject_key)
    }

    /// Identity ids of every resolved profile, for the device lookup.
    pub fn identity_ids(&self) -> Vec<i64> {
        self.profiles.values().map(|profile| profile.id).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
