use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Schema load error: {0}")]
    SchemaLoad(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Adapter '{adapter}' timed out after {timeout_ms}ms")]
    AdapterTimeout { adapter: String, timeout_ms: u64 },

    #[error("Adapter '{adapter}' unavailable: {message}")]
    AdapterUnavailable { adapter: String, message: String },

    #[error("No relevant schema for question: {0}")]
    NoRelevantSchema(String),

    #[error("Drafting error: {0}")]
    Drafting(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScoutError {
    /// Stable category tag so callers can tell "no data" from "system failure"
    /// without string-matching the message.
    pub fn category(&self) -> &'static str {
        match self {
            ScoutError::SchemaLoad(_) => "schema-load",
            ScoutError::TableNotFound(_) => "not-found",
            ScoutError::AdapterTimeout { .. } => "adapter-timeout",
            ScoutError::AdapterUnavailable { .. } => "adapter-unavailable",
            ScoutError::NoRelevantSchema(_) => "no-relevant-schema",
            ScoutError::Drafting(_) => "drafting",
            ScoutError::Config(_) => "config",
            ScoutError::Io(_) => "io",
            ScoutError::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;
