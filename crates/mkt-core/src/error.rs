//! # Error Types
//!
//! Operational errors for the marketplace tree schemas. Validation
//! failures are not errors in this sense: they are reported as
//! [`ValidationIssues`](crate::ValidationIssues) and never mixed in here.

use thiserror::Error;

/// Top-level error type for the `mkt-*` crates.
#[derive(Error, Debug)]
pub enum MktError {
    /// An issue kind string did not match any known kind.
    #[error("unknown issue kind: {0:?}")]
    UnknownIssueKind(String),

    /// A failure report was built from an empty issue list.
    #[error("an issue list must contain at least one issue")]
    EmptyIssueList,

    /// A schema name did not match any registered tree schema.
    #[error("unknown schema {0:?}; expected one of: navigation, component")]
    UnknownSchema(String),

    /// A validated tree could not be rendered as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
