//! sqlscout: hybrid schema retrieval and self-repairing SQL generation.
//!
//! Maps a natural-language question over a warehouse catalog to a minimal
//! relevant schema subset (embedding similarity fused with foreign-key graph
//! traversal) and to a SQL query validated against that catalog through a
//! bounded draft → validate → repair loop.

pub mod adapters;
pub mod catalog;
pub mod config;
pub mod context;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod repair;
pub mod retriever;
pub mod validator;

pub use catalog::{Column, ColumnType, ForeignKey, SchemaCatalog, Table};
pub use config::{EngineConfig, RepairConfig, RetrievalConfig};
pub use engine::QueryEngine;
pub use error::{Result, ScoutError};
pub use repair::{Generation, GenerationStatus};
pub use retriever::{Provenance, Retrieval, RetrievalCandidate};
pub use validator::{FindingCategory, Severity, SqlValidator, ValidationFinding};
