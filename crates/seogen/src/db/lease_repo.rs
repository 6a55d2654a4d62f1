//! Run leases: at most one live holder per lease name.
//!
//! A lease is a row with an expiry. Acquiring succeeds when the row is
//! missing, expired, or already ours; the holder renews it while working and
//! deletes it when done. A crashed holder simply lets it expire.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// A raw lease row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseRow {
    pub name: String,
    pub holder: String,
    pub acquired_at: String,
    pub expires_at: String,
}

impl LeaseRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            name: row.get("name")?,
            holder: row.get("holder")?,
            acquired_at: row.get("acquired_at")?,
            expires_at: row.get("expires_at")?,
        })
    }
}

// Fixed-width UTC timestamps compare correctly as strings.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Acquires `name` for `holder` unless someone else holds an unexpired lease.
pub fn acquire(
    db: &Database,
    name: &str,
    holder: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<LeaseRow, DatabaseError> {
    let now_str = timestamp(now);
    let expires = timestamp(now + ttl);

    let changed = db.with_conn(|conn| {
        Ok(conn.execute(
            "INSERT INTO run_leases (name, holder, acquired_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
               holder = excluded.holder,
               acquired_at = excluded.acquired_at,
               expires_at = excluded.expires_at
             WHERE run_leases.expires_at <= ?3 OR run_leases.holder = ?2",
            params![name, holder, now_str, expires],
        )?)
    })?;

    match current(db, name)? {
        Some(row) if changed > 0 && row.holder == holder => Ok(row),
        Some(row) => Err(DatabaseError::LeaseHeld {
            name: row.name,
            holder: row.holder,
            expires_at: row.expires_at,
        }),
        None => Err(DatabaseError::LeaseHeld {
            name: name.to_string(),
            holder: "<unknown>".to_string(),
            expires_at: "<unknown>".to_string(),
        }),
    }
}

/// Extends a lease we still hold. Returns false when it was lost.
pub fn renew(
    db: &Database,
    name: &str,
    holder: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE run_leases SET expires_at = ?3 WHERE name = ?1 AND holder = ?2",
            params![name, holder, timestamp(now + ttl)],
        )?;
        Ok(changed > 0)
    })
}

/// Deletes a lease we hold. Returns false when it was not ours.
pub fn release(db: &Database, name: &str, holder: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "DELETE FROM run_leases WHERE name = ?1 AND holder = ?2",
            params![name, holder],
        )?;
        Ok(changed > 0)
    })
}

pub fn current(db: &Database, name: &str) -> Result<Option<LeaseRow>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM run_leases WHERE name = ?1",
                params![name],
                LeaseRow::from_row,
            )
            .optional()?)
    })
}

/// A held lease, released on drop.
pub struct RunLease {
    db: Database,
    name: String,
    holder: String,
    ttl: Duration,
    released: bool,
}

impl RunLease {
    /// Acquires `name` under a fresh holder id.
    pub fn acquire(db: &Database, name: &str, ttl: Duration) -> Result<Self, DatabaseError> {
        let holder = format!("{}@{}", uuid::Uuid::new_v4(), std::process::id());
        acquire(db, name, &holder, ttl, Utc::now())?;
        log::info!("Acquired lease '{}' as {}", name, holder);

        Ok(Self {
            db: db.clone(),
            name: name.to_string(),
            holder,
            ttl,
            released: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Pushes the expiry forward by one TTL.
    pub fn renew(&self) -> Result<(), DatabaseError> {
        if renew(&self.db, &self.name, &self.holder, self.ttl, Utc::now())? {
            return Ok(());
        }
        // Lost it: someone took over after expiry.
        let row = current(&self.db, &self.name)?;
        Err(DatabaseError::LeaseHeld {
            name: self.name.clone(),
            holder: row
                .as_ref()
                .map(|r| r.holder.clone())
                .unwrap_or_else(|| "<none>".to_string()),
            expires_at: row
                .map(|r| r.expires_at)
                .unwrap_or_else(|| "<none>".to_string()),
        })
    }

    pub fn release(mut self) -> Result<(), DatabaseError> {
        self.released = true;
        release(&self.db, &self.name, &self.holder)?;
        log::info!("Released lease '{}'", self.name);
        Ok(())
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = release(&self.db, &self.name, &self.holder) {
            log::warn!("Failed to release lease '{}': {}", self.name, e);
        }
    }
}
