//! Image optimization and multi-provider CDN publishing pipeline.
//!
//! The pipeline ingests a list of image sources (remote URLs or local
//! files), optimizes each one (resize, recompress, pick the smallest
//! encoding), uploads the result to an interchangeable storage/CDN backend,
//! optionally attaches an AI-generated accessibility description, and keeps
//! a durable source → artifact mapping so repeated runs are idempotent.

pub mod config;
pub mod describer;
pub mod mapping;
pub mod metrics;
pub mod optimizer;
pub mod orchestrator;
pub mod publisher;
pub mod retry;
pub mod source;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, BackendKind, Config, ConfigError,
};
pub use describer::{AltTextClient, Describer, Description, DescriptionStatus};
pub use mapping::{
    export_local_descriptions_csv, export_mapping_csv, MappingError, MappingRecord, MappingStore,
    SqliteMappingStore,
};
pub use optimizer::{optimize, ImageKind, OptimizationResult, OptimizationSpec, OptimizerError};
pub use orchestrator::{
    BatchReport, BatchRunner, ItemOutcome, ItemState, OrchestratorConfig, OrchestratorError,
};
pub use publisher::{
    create_publisher, CloudFrontPublisher, CloudinaryPublisher, PublishedArtifact, Publisher,
    PublisherError,
};
pub use retry::RetryPolicy;
pub use source::{parse_source_list, SourceFetcher, SourceId};
