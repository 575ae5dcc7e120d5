//! Mapping storage trait.

use super::types::{MappingError, MappingRecord};

/// Trait for mapping storage backends.
///
/// `upsert` is the only mutation path and must be atomic: a crash mid-write
/// never leaves a half-written record. Implementations serialize writers;
/// lookups may run concurrently.
pub trait MappingStore: Send + Sync {
    /// Find the record for a source identifier.
    fn lookup(&self, source_id: &str) -> Result<Option<MappingRecord>, MappingError>;

    /// Find a record by its remote artifact name. Used to detect content
    /// that is already uploaded independently of the source mapping.
    fn find_by_artifact(&self, remote_name: &str) -> Result<Option<MappingRecord>, MappingError>;

    /// Insert or update the record for `record.source_id` in place.
    fn upsert(&self, record: &MappingRecord) -> Result<(), MappingError>;

    /// All records, oldest first.
    fn all(&self) -> Result<Vec<MappingRecord>, MappingError>;
}
