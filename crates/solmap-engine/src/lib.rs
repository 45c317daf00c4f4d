//! Solmap engine - classification-and-linking logic
//!
//! This crate implements the solution-level steps:
//! - Query enrichment
//! - Connector de-duplication and graph assembly
//! - The sequential visualization pipeline

pub mod enrichment;
pub mod assembler;
pub mod pipeline;

pub use enrichment::{connector_tables, enrich, normalization_tokens};
pub use assembler::{dedup_connectors, partition_duplicates, GraphAssembler, DEFAULT_SOLUTION_NAME};
pub use pipeline::{PipelineError, SolutionPipeline};
