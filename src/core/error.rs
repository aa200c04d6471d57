//! Core Error Types
//!
//! Unified error handling for criteria execution.

use std::fmt;

use thiserror::Error;

/// Core module result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Stage of the pipeline that raised a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// A filter unit in the middleware chain
    Filter,
    /// The adapter's `execute`
    Adapter,
    /// A result mapper
    Mapper,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Filter => "filter",
            PipelineStage::Adapter => "adapter",
            PipelineStage::Mapper => "mapper",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Core error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// No usable adapter
    #[error("Invalid adapter: {0}")]
    InvalidAdapter(String),

    /// Criteria does not have the required shape
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    /// No library on the search path provides the filter
    #[error("\"{0}\" filter not found")]
    FilterNotFound(String),

    /// A filter factory rejected its options
    #[error("Invalid options for filter \"{filter}\": {reason}")]
    InvalidFilterOptions { filter: String, reason: String },

    /// Failure raised while the pipeline was running
    #[error("Pipeline error in {stage}: {message}")]
    Pipeline {
        stage: PipelineStage,
        message: String,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Create an invalid adapter error
    pub fn invalid_adapter(msg: impl Into<String>) -> Self {
        Self::InvalidAdapter(msg.into())
    }

    /// Create an invalid criteria error
    pub fn invalid_criteria(msg: impl Into<String>) -> Self {
        Self::InvalidCriteria(msg.into())
    }

    /// Create a filter not found error
    pub fn filter_not_found(name: impl Into<String>) -> Self {
        Self::FilterNotFound(name.into())
    }

    /// Create an invalid filter options error
    pub fn invalid_options(filter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilterOptions {
            filter: filter.into(),
            reason: reason.into(),
        }
    }

    /// Failure inside a filter unit
    pub fn filter(msg: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: PipelineStage::Filter,
            message: msg.into(),
        }
    }

    /// Failure inside the adapter
    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: PipelineStage::Adapter,
            message: msg.into(),
        }
    }

    /// Failure inside a mapper
    pub fn mapper(msg: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: PipelineStage::Mapper,
            message: msg.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get a stable error code for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAdapter(_) => "INVALID_ADAPTER",
            Self::InvalidCriteria(_) => "INVALID_CRITERIA",
            Self::FilterNotFound(_) => "FILTER_NOT_FOUND",
            Self::InvalidFilterOptions { .. } => "INVALID_FILTER_OPTIONS",
            Self::Pipeline { .. } => "PIPELINE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Pipeline stage that raised the error, if any
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Pipeline { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
