//! Device index — most recently seen device metadata per identity.
//!
//! Identities can have many device rows (one per app install or header
//! refresh); only the freshest row matters for push delivery. Absence is
//! normal and maps to `DeviceMetadata::placeholder()` downstream.

use std::collections::HashMap;

use sqlx::PgPool;

use nudge_common::types::DeviceMetadata;

#[derive(Debug, sqlx::FromRow)]
struct DeviceRow {
    user_id: i64,
    platform: String,
    device_token: String,
}

/// Immutable identity to device-metadata mapping built once per flow pass.
pub struct DeviceIndex {
    devices: HashMap<i64, DeviceMetadata>,
}

impl DeviceIndex {
    /// Batch-resolve device metadata for the given identities in one query.
    pub async fn load(pool: &PgPool, identity_ids: &[i64]) -> sqlx::Result<Self> {
        let rows: Vec<DeviceRow> = sqlx::query_as(
            r#"
            SELECT user_id, x_platform AS platform, x_device_token AS device_token
            FROM custom_headers
            WHERE user_id = ANY($1)
            ORDER BY user_id, updated_at DESC
            "#,
        )
        .bind(identity_ids)
        .fetch_all(pool)
        .await?;

        Ok(Self {
            devices: index_rows(rows),
        })
    }

    /// Most recent metadata for an identity, if any row exists.
    pub fn get(&self, identity_id: i64) -> Option<&DeviceMetadata> {
        self.devices.get(&identity_id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Fold rows into the map. Rows arrive sorted most recent first per
/// identity, so the first writer wins and older rows never overwrite it.
fn index_rows(rows: Vec<DeviceRow>) -> HashMap<i64, DeviceMetadata> {
    let mut devices = HashMap::new();
    for row in rows {
        devices.entry(row.user_id).or_insert_with(|| DeviceMetadata {
            platform: row.platform,
            device_token: row.device_token,
        });
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(user_id: i64, token: &str) -> DeviceRow {
        DeviceRow {
            user_id,
            platform: "android".to_string(),
            device_token: token.to_string(),
        }
    }

    #[test]
    fn test_first_row_per_identity_wins() {
        let rows = vec![make_row(1, "fresh"), make_row(1, "stale"), make_row(2, "other")];
        let devices = index_rows(rows);

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[&1].device_token, "fresh");
        assert_eq!(devices[&2].device_token, "other");
    }

    #[test]
    fn test_empty_rows_build_empty_index() {
        assert!(index_rows(Vec::new()).is_empty());
    }
}
