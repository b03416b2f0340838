//! # Schema Catalog
//!
//! Runtime selection of a tree schema by name, for callers (the CLI, HTTP
//! handlers) that only learn which schema applies from their input.

use std::fmt;
use std::str::FromStr;

use mkt_core::{MktError, ValidationIssues};
use serde_json::Value;

use crate::component::ComponentSchema;
use crate::navigation::NavigationSchema;
use crate::tree::{TreeSchema, TreeValidator, ValidatorOptions};

/// A registered tree schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Navigation,
    Component,
}

/// Result of validating against a schema chosen at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaOutcome {
    /// The normalized tree, rendered as JSON.
    Valid(Value),
    Invalid(ValidationIssues),
}

impl SchemaOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Same shape as [`outcome_json`](crate::tree::outcome_json).
    pub fn to_json(&self) -> Result<Value, MktError> {
        Ok(match self {
            Self::Valid(value) => serde_json::json!({ "ok": true, "value": value }),
            Self::Invalid(issues) => {
                serde_json::json!({ "ok": false, "errors": serde_json::to_value(issues)? })
            }
        })
    }
}

impl SchemaKind {
    pub fn all() -> &'static [SchemaKind] {
        &[Self::Navigation, Self::Component]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Navigation => NavigationSchema::NAME,
            Self::Component => ComponentSchema::NAME,
        }
    }

    /// Key holding the variant tag.
    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Navigation => NavigationSchema::DISCRIMINATOR,
            Self::Component => ComponentSchema::DISCRIMINATOR,
        }
    }

    pub fn variants(&self) -> &'static [&'static str] {
        match self {
            Self::Navigation => NavigationSchema::variants(),
            Self::Component => ComponentSchema::variants(),
        }
    }

    /// Fields declared by one variant of this schema.
    pub fn fields(&self, tag: &str) -> &'static [&'static str] {
        match self {
            Self::Navigation => NavigationSchema::fields(tag),
            Self::Component => ComponentSchema::fields(tag),
        }
    }

    /// Validate `input` and render the normalized tree as JSON.
    pub fn validate(
        &self,
        input: &Value,
        options: ValidatorOptions,
    ) -> Result<SchemaOutcome, MktError> {
        match self {
            Self::Navigation => run::<NavigationSchema>(input, options),
            Self::Component => run::<ComponentSchema>(input, options),
        }
    }
}

fn run<S>(input: &Value, options: ValidatorOptions) -> Result<SchemaOutcome, MktError>
where
    S: TreeSchema,
    S::Node: serde::Serialize,
{
    match TreeValidator::<S>::new(options).validate(input) {
        Ok(node) => Ok(SchemaOutcome::Valid(serde_json::to_value(&node)?)),
        Err(issues) => Ok(SchemaOutcome::Invalid(issues)),
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemaKind {
    type Err = MktError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| MktError::UnknownSchema(s.to_string()))
    }
}
