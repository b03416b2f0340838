//! # Validation Issues
//!
//! Structured reports produced when a document fails tree validation.
//!
//! ## Design
//!
//! - Every issue carries the path of the offending value, the constraint
//!   that was expected, and (when safe to surface) what was received.
//! - Issues are plain serializable data. They can be returned as-is in an
//!   API error response; see [`ErrorPayload`].
//! - A failed validation always yields a non-empty [`ValidationIssues`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MktError;
use crate::path::IssuePath;

/// Taxonomy of validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Discriminator missing, not a string, or not one of the known tags.
    UnrecognizedVariant,
    /// A field mandated by the matched variant is absent.
    MissingRequiredField,
    /// A field is present but has the wrong JSON type.
    TypeMismatch,
    /// A field has the right type but violates a bound (length, range,
    /// enum membership, format, uniqueness, depth).
    ConstraintViolation,
    /// A key that the matched variant does not declare.
    UnrecognizedField,
    /// The input graph contains a cycle reachable through `children`
    /// or through an opaque value.
    CyclicStructure,
}

impl IssueKind {
    /// Returns all issue kinds in declaration order.
    pub fn all() -> &'static [IssueKind] {
        &[
            Self::UnrecognizedVariant,
            Self::MissingRequiredField,
            Self::TypeMismatch,
            Self::ConstraintViolation,
            Self::UnrecognizedField,
            Self::CyclicStructure,
        ]
    }

    /// Returns the snake_case identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnrecognizedVariant => "unrecognized_variant",
            Self::MissingRequiredField => "missing_required_field",
            Self::TypeMismatch => "type_mismatch",
            Self::ConstraintViolation => "constraint_violation",
            Self::UnrecognizedField => "unrecognized_field",
            Self::CyclicStructure => "cyclic_structure",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueKind {
    type Err = MktError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| MktError::UnknownIssueKind(s.to_string()))
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Failure class.
    pub kind: IssueKind,
    /// Location of the offending value.
    pub path: IssuePath,
    /// Human-readable description.
    pub message: String,
    /// Description of the constraint that was expected.
    pub expected: String,
    /// Type or value that was found, when safe to surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
}

impl ValidationIssue {
    pub fn new(
        kind: IssueKind,
        path: IssuePath,
        message: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
            expected: expected.into(),
            received: None,
        }
    }

    /// Attach the received type or value.
    pub fn with_received(mut self, received: impl Into<String>) -> Self {
        self.received = Some(received.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.path, self.message, self.kind)?;
        if let Some(received) = &self.received {
            write!(f, " (expected {}, received {received})", self.expected)?;
        }
        Ok(())
    }
}

/// Ordered, non-empty collection of validation issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ValidationIssue>", into = "Vec<ValidationIssue>")]
pub struct ValidationIssues {
    issues: Vec<ValidationIssue>,
}

impl ValidationIssues {
    /// Wrap a list of issues. Returns `None` when the list is empty, since
    /// an empty issue list is not a failure.
    pub fn new(issues: Vec<ValidationIssue>) -> Option<Self> {
        if issues.is_empty() {
            None
        } else {
            Some(Self { issues })
        }
    }

    pub fn single(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Always false for a constructed value.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationIssue> {
        self.issues.iter()
    }

    /// Number of issues of the given kind.
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }

    pub fn into_inner(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

impl TryFrom<Vec<ValidationIssue>> for ValidationIssues {
    type Error = MktError;

    fn try_from(issues: Vec<ValidationIssue>) -> Result<Self, Self::Error> {
        Self::new(issues).ok_or(MktError::EmptyIssueList)
    }
}

impl From<ValidationIssues> for Vec<ValidationIssue> {
    fn from(issues: ValidationIssues) -> Self {
        issues.issues
    }
}

impl<'a> IntoIterator for &'a ValidationIssues {
    type Item = &'a ValidationIssue;
    type IntoIter = std::slice::Iter<'a, ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {issue}")?;
        }
        Ok(())
    }
}

/// Body of a 400-style API error response carrying validation issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Machine-readable error code, always `"validation_failed"`.
    pub error: String,
    /// Summary line.
    pub message: String,
    /// Every issue found, in validation order.
    pub issues: Vec<ValidationIssue>,
}

impl ErrorPayload {
    pub const ERROR_CODE: &'static str = "validation_failed";

    /// Build a payload for a document that failed against `schema_name`.
    pub fn new(schema_name: &str, issues: &ValidationIssues) -> Self {
        let noun = if issues.len() == 1 { "issue" } else { "issues" };
        Self {
            error: Self::ERROR_CODE.to_string(),
            message: format!(
                "{schema_name} document failed validation with {} {noun}",
                issues.len()
            ),
            issues: issues.issues().to_vec(),
        }
    }
}
