//! Error taxonomy (§7). Library crates expose typed `thiserror` enums;
//! the orchestrator and CLI collapse them into `anyhow::Result` at the edge.

use thiserror::Error;

/// Per-file error recorded in an analysis response's `errors` list. Never
/// aborts an analysis on its own as long as two or more fingerprints survive.
#[derive(Debug, Error, Clone)]
pub enum PipelineError {
    #[error("{filename}: unsupported file extension")]
    UnsupportedFile { filename: String },

    #[error("{filename}: could not decode as UTF-8")]
    DecodeError { filename: String },

    #[error("{filename}: parse error at line {line}: {message}")]
    ParseError {
        filename: String,
        line: u32,
        message: String,
    },
}

impl PipelineError {
    pub fn filename(&self) -> &str {
        match self {
            PipelineError::UnsupportedFile { filename } => filename,
            PipelineError::DecodeError { filename } => filename,
            PipelineError::ParseError { filename, .. } => filename,
        }
    }
}

/// Caller-facing errors surfaced at the boundary (§7).
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("at least two processable files are required, got {0}")]
    InsufficientFiles(usize),

    #[error("no analysis found for id {0}")]
    UnknownAnalysisId(String),

    #[error("external collaborator failed: {0}")]
    ExternalFailure(String),

    #[error("analysis cancelled")]
    Cancelled,
}
