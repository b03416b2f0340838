//! # mkt-schema: Recursive Tree Validation
//!
//! Validates self-referential, variant-tagged trees (navigation menus and
//! nested UI component definitions) at the platform's trust boundary and
//! turns them into normalized, strongly-typed values.
//!
//! ## Validation (`tree`)
//!
//! [`TreeValidator`] walks an untyped document with an explicit work stack,
//! dispatches each node on its discriminator, applies field defaults and
//! collects every issue in one pass. Each [`TreeSchema`] declares its
//! variants and field readers:
//!
//! - [`navigation`]: `link`, `group` and `divider` items tagged by `kind`.
//! - [`component`]: `text`, `image`, `button`, `stack` and `card`
//!   components tagged by `type`, with open `props` bags.
//!
//! ## Input (`input`)
//!
//! Documents arrive as `serde_json::Value` or as a [`SharedValue`] host
//! graph that may contain cycles. Both are lowered into a [`RawGraph`]
//! arena that keeps container identity, so cycles are found rather than
//! followed forever.
//!
//! ## Crate Policy
//!
//! - Depends only on `mkt-core` internally.
//! - No recursion on untrusted input: lowering, validation and value
//!   extraction all use explicit stacks.
//! - Validation failures are data ([`ValidationIssues`]), never panics.

pub mod catalog;
pub mod component;
pub mod document;
pub mod fields;
pub mod input;
pub mod navigation;
pub mod tree;
pub mod walk;

pub use catalog::{SchemaKind, SchemaOutcome};
pub use component::{Component, ComponentSchema, ComponentValidator};
pub use document::{load_document, validate_file, DocumentError};
pub use input::{RawGraph, SharedValue};
pub use mkt_core::{IssueKind, IssuePath, ValidationIssue, ValidationIssues};
pub use navigation::{NavItem, NavigationSchema, NavigationValidator};
pub use tree::{
    outcome_json, ChildPolicy, TreeSchema, TreeValidator, UnknownFieldPolicy, ValidatorOptions,
};
pub use walk::TreeNode;
