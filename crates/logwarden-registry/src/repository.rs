//! SQLite implementation of IDeviceRegistry
//!
//! This module provides the concrete SQLite-based implementation of the
//! device registry port defined in logwarden-core. It handles mapping
//! between device records and rows of the `devices` table.
//!
//! ## Type Mapping
//!
//! | Domain Type            | Column(s)                  | Strategy                             |
//! |------------------------|----------------------------|--------------------------------------|
//! | DeviceId               | dev_id INTEGER             | AUTOINCREMENT, assigned on insert    |
//! | DeviceName             | dev_name TEXT              | `.as_str()` / `DeviceName::new()`    |
//! | first/last seen        | first_seen, last_seen TEXT | `YYYY-MM-DD`, NULL when never seen   |
//! | Frequency              | freq INTEGER               | days / `Frequency::new()`            |
//! | critical               | crit_sys INTEGER           | 0 / 1                                |
//! | inactive since         | inactive, inactive_date    | flag 1 plus date, or flag 0          |
//! | not logging since      | not_log, notlog_date       | flag 1 plus date, or flag 0          |

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use logwarden_core::domain::{DeviceId, DeviceName, DeviceRecord, Frequency, DATE_FORMAT};
use logwarden_core::ports::{Activity, IDeviceRegistry, RegistryBatch};

use crate::RegistryError;

const SELECT_DEVICES: &str = "SELECT dev_id, dev_name, first_seen, last_seen, freq, crit_sys, \
     inactive, inactive_date, not_log, notlog_date FROM devices";

/// SQLite-based implementation of the device registry port
pub struct SqliteDeviceRegistry {
    pool: SqlitePool,
}

impl SqliteDeviceRegistry {
    /// Creates a new registry instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, sql: &str, bind: Option<i64>) -> anyhow::Result<Vec<DeviceRecord>> {
        let mut query = sqlx::query(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let records = rows
            .iter()
            .map(device_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

fn date_to_string(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn parse_optional_date(s: Option<String>) -> Result<Option<NaiveDate>, RegistryError> {
    match s {
        Some(ref val) if !val.is_empty() => NaiveDate::parse_from_str(val, DATE_FORMAT)
            .map(Some)
            .map_err(|e| {
                RegistryError::SerializationError(format!("Failed to parse date '{}': {}", val, e))
            }),
        _ => Ok(None),
    }
}

/// Combine a stored flag with its date column
///
/// A cleared flag ignores any leftover date; a set flag must carry one.
fn flag_since(
    device: &str,
    column: &str,
    flag: i64,
    date: Option<String>,
) -> Result<Option<NaiveDate>, RegistryError> {
    if flag == 0 {
        return Ok(None);
    }
    match parse_optional_date(date)? {
        Some(since) => Ok(Some(since)),
        None => Err(RegistryError::SerializationError(format!(
            "Device '{}' has {} set without a date",
            device, column
        ))),
    }
}

// ============================================================================
// Row mapping functions
// ============================================================================

/// Reconstruct a DeviceRecord from a `devices` row
fn device_from_row(row: &SqliteRow) -> Result<DeviceRecord, RegistryError> {
    let id: i64 = row.get("dev_id");
    let name_str: String = row.get("dev_name");
    let first_seen: Option<String> = row.get("first_seen");
    let last_seen: Option<String> = row.get("last_seen");
    let freq: i64 = row.get("freq");
    let crit_sys: i64 = row.get("crit_sys");
    let inactive: i64 = row.get("inactive");
    let inactive_date: Option<String> = row.get("inactive_date");
    let not_log: i64 = row.get("not_log");
    let notlog_date: Option<String> = row.get("notlog_date");

    let name = DeviceName::new(name_str.clone()).map_err(|e| {
        RegistryError::SerializationError(format!("Invalid device name '{}': {}", name_str, e))
    })?;

    let frequency = Frequency::new(freq).map_err(|e| {
        RegistryError::SerializationError(format!("Device '{}': {}", name_str, e))
    })?;

    Ok(DeviceRecord::new(name, frequency)
        .with_id(DeviceId::new(id))
        .with_seen(parse_optional_date(first_seen)?, parse_optional_date(last_seen)?)
        .with_critical(crit_sys != 0)
        .with_inactive_since(flag_since(&name_str, "inactive", inactive, inactive_date)?)
        .with_not_logging_since(flag_since(&name_str, "not_log", not_log, notlog_date)?))
}

// ============================================================================
// IDeviceRegistry implementation
// ============================================================================

#[async_trait::async_trait]
impl IDeviceRegistry for SqliteDeviceRegistry {
    async fn query_all(&self) -> anyhow::Result<Vec<DeviceRecord>> {
        self.fetch(&format!("{SELECT_DEVICES} ORDER BY dev_name, dev_id"), None)
            .await
    }

    async fn query_by_activity(&self, activity: Activity) -> anyhow::Result<Vec<DeviceRecord>> {
        let flag = match activity {
            Activity::Active => 0,
            Activity::Inactive => 1,
        };
        self.fetch(
            &format!("{SELECT_DEVICES} WHERE (inactive != 0) = ? ORDER BY dev_name, dev_id"),
            Some(flag),
        )
        .await
    }

    async fn query_critical(&self) -> anyhow::Result<Vec<DeviceRecord>> {
        self.fetch(
            &format!("{SELECT_DEVICES} WHERE crit_sys != 0 ORDER BY dev_name, dev_id"),
            None,
        )
        .await
    }

    async fn is_empty(&self) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
            .fetch_one(&self.pool)
            .await?;
        Ok(count == 0)
    }

    async fn duplicate_names(&self) -> anyhow::Result<Vec<DeviceName>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT dev_name FROM devices GROUP BY dev_name HAVING COUNT(*) > 1 ORDER BY dev_name",
        )
        .fetch_all(&self.pool)
        .await?;

        let names = names
            .into_iter()
            .map(|n| {
                DeviceName::new(n.clone()).map_err(|e| {
                    RegistryError::SerializationError(format!(
                        "Invalid device name '{}': {}",
                        n, e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    async fn commit_batch(&self, batch: &RegistryBatch) -> anyhow::Result<()> {
        // Dropping the transaction without commit rolls everything back
        let mut tx = self.pool.begin().await?;

        for record in &batch.updates {
            let Some(id) = record.id() else {
                anyhow::bail!("Cannot update device '{}' without an id", record.name());
            };

            let result = sqlx::query(
                "UPDATE devices SET dev_name = ?, first_seen = ?, last_seen = ?, freq = ?, \
                 crit_sys = ?, inactive = ?, inactive_date = ?, not_log = ?, notlog_date = ? \
                 WHERE dev_id = ?",
            )
            .bind(record.name().as_str())
            .bind(date_to_string(record.first_seen()))
            .bind(date_to_string(record.last_seen()))
            .bind(record.frequency().days())
            .bind(i64::from(record.is_critical()))
            .bind(i64::from(record.is_inactive()))
            .bind(date_to_string(record.inactive_since()))
            .bind(i64::from(record.is_not_logging()))
            .bind(date_to_string(record.not_logging_since()))
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() != 1 {
                anyhow::bail!("Device '{}' (id {}) no longer exists", record.name(), id);
            }
        }

        for record in &batch.inserts {
            if record.id().is_some() {
                anyhow::bail!("Cannot insert device '{}' that already has an id", record.name());
            }

            sqlx::query(
                "INSERT INTO devices \
                 (dev_name, first_seen, last_seen, freq, crit_sys, inactive, inactive_date, \
                  not_log, notlog_date) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(record.name().as_str())
            .bind(date_to_string(record.first_seen()))
            .bind(date_to_string(record.last_seen()))
            .bind(record.frequency().days())
            .bind(i64::from(record.is_critical()))
            .bind(i64::from(record.is_inactive()))
            .bind(date_to_string(record.inactive_since()))
            .bind(i64::from(record.is_not_logging()))
            .bind(date_to_string(record.not_logging_since()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            updates = batch.updates.len(),
            inserts = batch.inserts.len(),
            "Committed registry batch"
        );
        Ok(())
    }
}
