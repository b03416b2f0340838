//! # mkt-core: Foundational Types for the Marketplace Tree Schemas
//!
//! Defines the vocabulary shared by every crate in the workspace: where a
//! problem is ([`IssuePath`]), what kind of problem it is ([`IssueKind`]),
//! and how it is reported ([`ValidationIssue`], [`ValidationIssues`],
//! [`ErrorPayload`]).
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mkt-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public report types implement `Serialize`/`Deserialize` so they can
//!   be returned verbatim in API error responses.

pub mod error;
pub mod issue;
pub mod path;

pub use error::MktError;
pub use issue::{ErrorPayload, IssueKind, ValidationIssue, ValidationIssues};
pub use path::{IssuePath, PathSegment};
