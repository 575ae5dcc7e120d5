//! Durable source → published-artifact mapping.
//!
//! The mapping store is the single source of truth for idempotency: a batch
//! consults it before doing any work, and only the store mutates mapping
//! records. Mapping and local-file description CSVs are exported from it.

mod export;
mod sqlite;
mod store;
mod types;

pub use export::{export_local_descriptions_csv, export_mapping_csv};
pub use sqlite::SqliteMappingStore;
pub use store::MappingStore;
pub use types::{MappingError, MappingRecord};
