//! Record repository: batch ingestion and the read path for `content_records`.

use rusqlite::types::Type;
use rusqlite::{params, Row};

use crate::synth::{ContentRecord, ContentStatus};

use super::{Database, DatabaseError};

/// A record as stored, with the row-level status and timestamps.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub record: ContentRecord,
    pub created_at: String,
    pub published_at: Option<String>,
}

impl StoredRecord {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let payload: String = row.get("payload")?;
        let mut record: ContentRecord = serde_json::from_str(&payload).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
        })?;

        // The column is authoritative: publishing never rewrites the payload.
        let status: String = row.get("status")?;
        record.status = status.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?;

        Ok(Self {
            record,
            created_at: row.get("created_at")?,
            published_at: row.get("published_at")?,
        })
    }
}

/// Outcome of [`insert_batch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchInsertResult {
    pub inserted: u64,
    pub duplicates: Vec<String>,
}

/// Listing filter. Every `(catalog, value)` pair must match.
#[derive(Debug, Default, Clone)]
pub struct RecordFilter {
    pub dimensions: Vec<(String, String)>,
    pub status: Option<ContentStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a batch in one transaction without stopping at duplicates.
///
/// A slug that already exists is reported in `duplicates` and skipped; the
/// rest of the batch is still written. Any other error rolls back the whole
/// batch, so the committed row count only ever moves by acknowledged batches.
pub fn insert_batch(
    db: &Database,
    records: &[ContentRecord],
    created_at: &str,
) -> Result<BatchInsertResult, DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        let mut result = BatchInsertResult::default();

        {
            let mut insert_record = tx.prepare_cached(
                "INSERT INTO content_records (slug, idx, title, status, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut insert_dimension = tx.prepare_cached(
                "INSERT INTO record_dimensions (slug, catalog, value) VALUES (?1, ?2, ?3)",
            )?;

            for record in records {
                let payload = serde_json::to_string(record)?;
                let outcome = insert_record.execute(params![
                    record.slug,
                    record.index as i64,
                    record.title,
                    record.status.as_str(),
                    payload,
                    created_at,
                ]);

                match outcome {
                    Ok(_) => {}
                    Err(ref e) if is_duplicate_key(e) => {
                        result.duplicates.push(record.slug.clone());
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }

                for entry in record.dimensions.entries() {
                    insert_dimension.execute(params![record.slug, entry.catalog, entry.value])?;
                }
                result.inserted += 1;
            }
        }

        tx.commit()?;
        Ok(result)
    })
}

fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

/// Total number of stored records.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM content_records", [], |r| r.get(0))?;
        Ok(count as u64)
    })
}

/// Finds a record by its slug.
pub fn find_by_slug(db: &Database, slug: &str) -> Result<Option<StoredRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM content_records WHERE slug = ?1")?;
        let mut rows = stmt.query_map(params![slug], StoredRecord::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Queries records with filters, returning (rows, total_count) in index order.
pub fn query(
    db: &Database,
    filter: &RecordFilter,
) -> Result<(Vec<StoredRecord>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        for (catalog, value) in &filter.dimensions {
            conditions.push(format!(
                "slug IN (SELECT slug FROM record_dimensions WHERE catalog = ?{} AND value = ?{})",
                param_values.len() + 1,
                param_values.len() + 2
            ));
            param_values.push(Box::new(catalog.clone()));
            param_values.push(Box::new(value.clone()));
        }
        if let Some(status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM content_records {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: i64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM content_records {} ORDER BY idx ASC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<StoredRecord> = stmt
            .query_map(params_ref.as_slice(), StoredRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total as u64))
    })
}

/// Number of records per value of `catalog`, most frequent first.
pub fn count_by_value(db: &Database, catalog: &str) -> Result<Vec<(String, u64)>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT value, COUNT(*) AS n FROM record_dimensions
             WHERE catalog = ?1 GROUP BY value ORDER BY n DESC, value ASC",
        )?;
        let rows = stmt
            .query_map(params![catalog], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Marks a record as published. Returns false when the slug is unknown or
/// the record was already published.
pub fn publish(db: &Database, slug: &str, published_at: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE content_records SET status = ?2, published_at = ?3
             WHERE slug = ?1 AND status != ?2",
            params![slug, ContentStatus::Published.as_str(), published_at],
        )?;
        Ok(changed > 0)
    })
}
