//! SQLite-backed mapping store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::config::BackendKind;
use crate::describer::Description;
use crate::optimizer::OptimizationSpec;
use crate::publisher::PublishedArtifact;

use super::store::MappingStore;
use super::types::{MappingError, MappingRecord};

/// SQLite-backed mapping store.
///
/// A single `INSERT … ON CONFLICT DO UPDATE` statement per upsert keeps
/// writes atomic; the connection mutex gives the single-writer discipline.
pub struct SqliteMappingStore {
    conn: Mutex<Connection>,
}

impl SqliteMappingStore {
    /// Open (or create) the store at the given path.
    pub fn new(path: &Path) -> Result<Self, MappingError> {
        let conn = Connection::open(path).map_err(|e| MappingError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, MappingError> {
        let conn =
            Connection::open_in_memory().map_err(|e| MappingError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), MappingError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS mappings (
                source_id TEXT PRIMARY KEY,
                backend TEXT NOT NULL,
                public_url TEXT NOT NULL,
                remote_name TEXT NOT NULL,
                artifact_extra TEXT NOT NULL,
                max_width INTEGER,
                quality INTEGER NOT NULL,
                smart_format INTEGER NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_mappings_remote_name
                ON mappings(remote_name);
            CREATE INDEX IF NOT EXISTS idx_mappings_created_at
                ON mappings(created_at);
            "#,
        )
        .map_err(|e| MappingError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<MappingRecord> {
        let source_id: String = row.get(0)?;
        let backend_str: String = row.get(1)?;
        let public_url: String = row.get(2)?;
        let remote_name: String = row.get(3)?;
        let artifact_extra_json: String = row.get(4)?;
        let max_width: Option<u32> = row.get(5)?;
        let quality: u8 = row.get(6)?;
        let smart_format: bool = row.get(7)?;
        let description_json: Option<String> = row.get(8)?;
        let created_at_str: String = row.get(9)?;
        let updated_at_str: String = row.get(10)?;

        let backend = match backend_str.as_str() {
            "cloudinary" => BackendKind::Cloudinary,
            _ => BackendKind::Cloudfront,
        };

        let extra = serde_json::from_str(&artifact_extra_json)
            .unwrap_or(serde_json::Value::Null);
        let description: Option<Description> =
            description_json.and_then(|json| serde_json::from_str(&json).ok());

        let created_at = parse_timestamp(&created_at_str);
        let updated_at = parse_timestamp(&updated_at_str);

        Ok(MappingRecord {
            source_id,
            artifact: PublishedArtifact {
                backend,
                public_url,
                remote_name,
                extra,
            },
            spec: OptimizationSpec {
                max_width,
                quality,
                smart_format,
            },
            description,
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

const RECORD_COLUMNS: &str = "source_id, backend, public_url, remote_name, artifact_extra, \
     max_width, quality, smart_format, description, created_at, updated_at";

impl MappingStore for SqliteMappingStore {
    fn lookup(&self, source_id: &str) -> Result<Option<MappingRecord>, MappingError> {
        let conn = self.conn.lock().expect("mapping store mutex poisoned");
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM mappings WHERE source_id = ?",
                RECORD_COLUMNS
            ))
            .map_err(|e| MappingError::Database(e.to_string()))?;

        let mut rows = stmt
            .query_map(params![source_id], Self::row_to_record)
            .map_err(|e| MappingError::Database(e.to_string()))?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(|e| MappingError::Database(e.to_string()))?)),
            None => Ok(None),
        }
    }

    fn find_by_artifact(&self, remote_name: &str) -> Result<Option<MappingRecord>, MappingError> {
        let conn = self.conn.lock().expect("mapping store mutex poisoned");
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM mappings WHERE remote_name = ?",
                RECORD_COLUMNS
            ))
            .map_err(|e| MappingError::Database(e.to_string()))?;

        let mut rows = stmt
            .query_map(params![remote_name], Self::row_to_record)
            .map_err(|e| MappingError::Database(e.to_string()))?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(|e| MappingError::Database(e.to_string()))?)),
            None => Ok(None),
        }
    }

    fn upsert(&self, record: &MappingRecord) -> Result<(), MappingError> {
        let artifact_extra = serde_json::to_string(&record.artifact.extra)
            .map_err(|e| MappingError::Serialization(e.to_string()))?;
        let description = record
            .description
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| MappingError::Serialization(e.to_string()))?;

        let conn = self.conn.lock().expect("mapping store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO mappings (
                source_id, backend, public_url, remote_name, artifact_extra,
                max_width, quality, smart_format, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(source_id) DO UPDATE SET
                backend = excluded.backend,
                public_url = excluded.public_url,
                remote_name = excluded.remote_name,
                artifact_extra = excluded.artifact_extra,
                max_width = excluded.max_width,
                quality = excluded.quality,
                smart_format = excluded.smart_format,
                description = excluded.description,
                updated_at = excluded.updated_at
            "#,
            params![
                record.source_id,
                record.artifact.backend.as_str(),
                record.artifact.public_url,
                record.artifact.remote_name,
                artifact_extra,
                record.spec.max_width,
                record.spec.quality,
                record.spec.smart_format,
                description,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| MappingError::Database(e.to_string()))?;

        Ok(())
    }

    fn all(&self) -> Result<Vec<MappingRecord>, MappingError> {
        let conn = self.conn.lock().expect("mapping store mutex poisoned");
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM mappings ORDER BY created_at, source_id",
                RECORD_COLUMNS
            ))
            .map_err(|e| MappingError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_record)
            .map_err(|e| MappingError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| MappingError::Database(e.to_string()))?);
        }
        Ok(records)
    }
}
