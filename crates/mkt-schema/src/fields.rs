//! # Field Readers
//!
//! [`FieldReader`] reads the declared fields of one node object. Each
//! accessor validates a single field, records an issue when it fails, and
//! applies the documented default when the key is absent. Accessors never
//! stop early: a variant reader calls every accessor first and only then
//! combines the results, so one pass reports every field problem.
//!
//! Defaults apply only to *absent* keys. An explicit `null` is a type
//! mismatch for every field type offered here.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use mkt_core::{IssueKind, IssuePath, ValidationIssue};
use serde_json::{Map, Value};
use url::Url;

use crate::input::{CopyError, EntryRef, RawEntry, RawGraph};

/// Maximum number of characters of a string echoed back in `received`.
const RECEIVED_PREVIEW_CHARS: usize = 64;

/// Format a string field must follow in addition to its length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Any text.
    Free,
    /// `[A-Za-z0-9_.:-]` only.
    Identifier,
    /// `/path`, `#anchor`, or an absolute `http`, `https` or `mailto` URL.
    Href,
}

/// Length and format constraint for a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRule {
    pub min_chars: usize,
    pub max_chars: usize,
    pub format: TextFormat,
}

impl TextRule {
    pub const fn new(min_chars: usize, max_chars: usize) -> Self {
        Self {
            min_chars,
            max_chars,
            format: TextFormat::Free,
        }
    }

    pub const fn with_format(self, format: TextFormat) -> Self {
        Self { format, ..self }
    }

    /// Node identifiers.
    pub const IDENTIFIER: TextRule = TextRule::new(1, 128).with_format(TextFormat::Identifier);

    /// Link targets and media sources.
    pub const HREF: TextRule = TextRule::new(1, 2048).with_format(TextFormat::Href);

    /// Human-readable description of the rule, used as `expected`.
    pub fn describe(&self) -> String {
        let length = format!("{}..={} characters", self.min_chars, self.max_chars);
        match self.format {
            TextFormat::Free => format!("string of {length}"),
            TextFormat::Identifier => format!("identifier of {length} from [A-Za-z0-9_.:-]"),
            TextFormat::Href => {
                format!("href of {length} (/path, #anchor, or http, https or mailto URL)")
            }
        }
    }

    fn check(&self, value: &str) -> Result<(), &'static str> {
        let chars = value.chars().count();
        if chars < self.min_chars {
            return Err("is too short");
        }
        if chars > self.max_chars {
            return Err("is too long");
        }
        match self.format {
            TextFormat::Free => Ok(()),
            TextFormat::Identifier if is_identifier(value) => Ok(()),
            TextFormat::Identifier => Err("is not a valid identifier"),
            TextFormat::Href if is_href(value) => Ok(()),
            TextFormat::Href => Err("is not a valid href"),
        }
    }
}

fn is_identifier(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-'))
}

fn is_href(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    if let Some(rest) = value.strip_prefix('/') {
        // `//host/...` is protocol-relative, not a site path.
        return !rest.starts_with('/');
    }
    if value.starts_with('#') {
        return value.len() > 1;
    }
    match Url::parse(value) {
        Ok(url) => match url.scheme() {
            "http" | "https" => url.has_host(),
            "mailto" => !url.path().is_empty(),
            _ => false,
        },
        Err(_) => false,
    }
}

/// A closed set of string values accepted by an enum field.
pub trait FieldEnum: Sized + Copy + 'static {
    /// Every accepted value, in documentation order.
    fn all() -> &'static [Self];

    /// Wire representation.
    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        Self::all().iter().copied().find(|v| v.as_str() == value)
    }

    fn describe() -> String {
        let names: Vec<&str> = Self::all().iter().map(|v| v.as_str()).collect();
        format!("one of: {}", names.join(", "))
    }
}

/// Render a received string, shortened for issue reports.
pub(crate) fn preview(value: &str) -> String {
    if value.chars().count() <= RECEIVED_PREVIEW_CHARS {
        format!("{value:?}")
    } else {
        let head: String = value.chars().take(RECEIVED_PREVIEW_CHARS).collect();
        format!("{head:?}...")
    }
}

/// Reads and validates the fields of one node object.
pub struct FieldReader<'a> {
    graph: &'a RawGraph,
    object: EntryRef,
    path: &'a IssuePath,
    consumed: Vec<&'a str>,
    reserved: Vec<&'a str>,
    issues: &'a mut Vec<ValidationIssue>,
    claimed: &'a mut HashSet<EntryRef>,
}

impl<'a> FieldReader<'a> {
    pub fn new(
        graph: &'a RawGraph,
        object: EntryRef,
        path: &'a IssuePath,
        issues: &'a mut Vec<ValidationIssue>,
        claimed: &'a mut HashSet<EntryRef>,
    ) -> Self {
        Self {
            graph,
            object,
            path,
            consumed: Vec::new(),
            reserved: Vec::new(),
            issues,
            claimed,
        }
    }

    /// Path of the node being read.
    pub fn path(&self) -> &IssuePath {
        self.path
    }

    /// True if the key is present, whatever its value.
    pub fn has(&self, key: &str) -> bool {
        self.graph.member(self.object, key).is_some()
    }

    /// Mark a key as handled without reading it.
    pub fn mark(&mut self, key: &'a str) {
        if !self.consumed.contains(&key) {
            self.consumed.push(key);
        }
    }

    /// Exclude a key from [`collect_rest`](Self::collect_rest) while leaving
    /// it unconsumed, so it is still reported as unrecognized.
    pub fn reserve(&mut self, key: &'a str) {
        if !self.reserved.contains(&key) {
            self.reserved.push(key);
        }
    }

    fn take(&mut self, key: &'a str) -> Option<(EntryRef, &'a RawEntry)> {
        self.mark(key);
        let graph = self.graph;
        graph
            .member(self.object, key)
            .map(|member| (member, graph.entry(member)))
    }

    fn field_path(&self, key: &str) -> IssuePath {
        self.path.key(key)
    }

    fn missing(&mut self, key: &str, expected: String) {
        let issue = ValidationIssue::new(
            IssueKind::MissingRequiredField,
            self.field_path(key),
            format!("missing required field `{key}`"),
            expected,
        );
        self.issues.push(issue);
    }

    fn mismatch(&mut self, key: &str, expected: impl Into<String>, received: impl Into<String>) {
        let expected = expected.into();
        let issue = ValidationIssue::new(
            IssueKind::TypeMismatch,
            self.field_path(key),
            format!("field `{key}` has the wrong type"),
            expected,
        )
        .with_received(received);
        self.issues.push(issue);
    }

    fn violation(
        &mut self,
        key: &str,
        message: String,
        expected: impl Into<String>,
        received: impl Into<String>,
    ) {
        let issue = ValidationIssue::new(
            IssueKind::ConstraintViolation,
            self.field_path(key),
            message,
            expected,
        )
        .with_received(received);
        self.issues.push(issue);
    }

    fn read_text(&mut self, key: &'a str, rule: &TextRule, required: bool) -> Option<String> {
        let Some((_, entry)) = self.take(key) else {
            if required {
                self.missing(key, rule.describe());
            }
            return None;
        };
        match entry {
            RawEntry::String(value) => match rule.check(value) {
                Ok(()) => Some(value.clone()),
                Err(problem) => {
                    self.violation(
                        key,
                        format!("field `{key}` {problem}"),
                        rule.describe(),
                        preview(value),
                    );
                    None
                }
            },
            other => {
                self.mismatch(key, rule.describe(), other.type_name());
                None
            }
        }
    }

    /// A string field that must be present.
    pub fn required_text(&mut self, key: &'a str, rule: &TextRule) -> Option<String> {
        self.read_text(key, rule, true)
    }

    /// A string field without default. `None` if absent or invalid.
    pub fn optional_text(&mut self, key: &'a str, rule: &TextRule) -> Option<String> {
        self.read_text(key, rule, false)
    }

    /// A boolean field, `default` if absent.
    pub fn bool_or(&mut self, key: &'a str, default: bool) -> bool {
        match self.take(key) {
            None => default,
            Some((_, RawEntry::Bool(value))) => *value,
            Some((_, other)) => {
                self.mismatch(key, "boolean", other.type_name());
                default
            }
        }
    }

    fn read_u32(&mut self, key: &'a str, range: RangeInclusive<u32>) -> Option<Option<u32>> {
        let expected = format!("integer in {}..={}", range.start(), range.end());
        let (_, entry) = self.take(key)?;
        let RawEntry::Number(number) = entry else {
            self.mismatch(key, expected, entry.type_name());
            return Some(None);
        };
        let Some(value) = number.as_u64() else {
            // Negative or fractional.
            self.mismatch(key, expected, number.to_string());
            return Some(None);
        };
        match u32::try_from(value) {
            Ok(value) if range.contains(&value) => Some(Some(value)),
            _ => {
                self.violation(
                    key,
                    format!("field `{key}` is out of range"),
                    expected,
                    number.to_string(),
                );
                Some(None)
            }
        }
    }

    /// An unsigned integer field without default.
    pub fn optional_u32(&mut self, key: &'a str, range: RangeInclusive<u32>) -> Option<u32> {
        self.read_u32(key, range).flatten()
    }

    /// An unsigned integer field, `default` if absent.
    pub fn u32_or(&mut self, key: &'a str, default: u32, range: RangeInclusive<u32>) -> u32 {
        match self.read_u32(key, range) {
            None => default,
            Some(value) => value.unwrap_or(default),
        }
    }

    fn read_enum<E: FieldEnum>(&mut self, key: &'a str, required: bool) -> Option<E> {
        let Some((_, entry)) = self.take(key) else {
            if required {
                self.missing(key, E::describe());
            }
            return None;
        };
        match entry {
            RawEntry::String(value) => {
                let parsed = E::parse(value);
                if parsed.is_none() {
                    self.violation(
                        key,
                        format!("field `{key}` has an unsupported value"),
                        E::describe(),
                        preview(value),
                    );
                }
                parsed
            }
            other => {
                self.mismatch(key, E::describe(), other.type_name());
                None
            }
        }
    }

    /// An enum field that must be present.
    pub fn required_enum<E: FieldEnum>(&mut self, key: &'a str) -> Option<E> {
        self.read_enum(key, true)
    }

    /// An enum field, `default` if absent.
    pub fn enum_or<E: FieldEnum>(&mut self, key: &'a str, default: E) -> E {
        self.read_enum(key, false).unwrap_or(default)
    }

    /// The raw elements of an array field holding child nodes. An absent
    /// key yields no children, reported as missing when `required`.
    pub fn children(&mut self, key: &'a str, required: bool) -> Vec<EntryRef> {
        match self.take(key) {
            None => {
                if required {
                    self.missing(key, "array of nodes".to_string());
                }
                Vec::new()
            }
            Some((_, RawEntry::Array(items))) => items.clone(),
            Some((_, other)) => {
                self.mismatch(key, "array of nodes", other.type_name());
                Vec::new()
            }
        }
    }

    /// Collect every key not yet consumed or reserved into an open
    /// property bag, preserving input order. Values are copied verbatim.
    /// A value that encloses itself, or repeats a container already used
    /// elsewhere in the document, is reported and left out.
    pub fn collect_rest(&mut self) -> Map<String, Value> {
        let graph = self.graph;
        let RawEntry::Object(members) = graph.entry(self.object) else {
            return Map::new();
        };
        let mut bag = Map::new();
        for (key, member) in members {
            if self.consumed.contains(&key.as_str()) || self.reserved.contains(&key.as_str()) {
                continue;
            }
            self.mark(key.as_str());
            let err = match graph.to_json(*member, self.claimed) {
                Ok(value) => {
                    bag.insert(key.clone(), value);
                    continue;
                }
                Err(err) => err,
            };
            let path = self.field_path(key).join(err.path());
            let issue = match err {
                CopyError::Cycle(_) => {
                    tracing::warn!(%path, "cyclic value in open properties");
                    ValidationIssue::new(
                        IssueKind::CyclicStructure,
                        path,
                        format!("field `{key}` contains a value that references itself"),
                        "acyclic value",
                    )
                    .with_received("reference to an enclosing container")
                }
                CopyError::Shared(_) => {
                    tracing::warn!(%path, "shared value in open properties");
                    ValidationIssue::new(
                        IssueKind::ConstraintViolation,
                        path,
                        format!("field `{key}` repeats a value used elsewhere in the document"),
                        "each value used once",
                    )
                    .with_received("shared reference")
                }
            };
            self.issues.push(issue);
        }
        bag
    }

    /// Keys present on the object that no accessor consumed, with the
    /// JSON type of their value, in input order.
    pub fn unconsumed(&self) -> Vec<(String, &'static str)> {
        match self.graph.entry(self.object) {
            RawEntry::Object(members) => members
                .iter()
                .filter(|(key, _)| !self.consumed.contains(&key.as_str()))
                .map(|(key, member)| (key.clone(), self.graph.entry(*member).type_name()))
                .collect(),
            _ => Vec::new(),
        }
    }
}
