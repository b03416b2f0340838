//! # Tree Validation Engine
//!
//! Validates documents against a recursive, variant-tagged node type
//! described by a [`TreeSchema`], and produces either a normalized, typed
//! tree or the complete list of [`ValidationIssue`]s.
//!
//! ## Algorithm
//!
//! 1. Read the discriminator. A missing, non-string or unknown tag is one
//!    `UnrecognizedVariant` issue; the node is not guessed at and its
//!    children are not visited.
//! 2. Dispatch to the variant's field reader.
//! 3. Queue the node's `children` (container variants only), with paths
//!    extended by `children` and the element index.
//! 4. Report keys the variant does not declare, per [`UnknownFieldPolicy`].
//! 5. Continue with the next queued node. Nothing short-circuits; a single
//!    call reports every independent issue.
//!
//! Traversal is an explicit depth-first work stack. An ancestor identity
//! set detects nodes that contain themselves; such a back edge is reported
//! once as `CyclicStructure` and not followed. Every input container is
//! expanded at most once per call: a node referenced a second time from a
//! host graph is reported as shared and not descended into, so the work
//! done is linear in the size of the input graph.
//!
//! Per-node work never copies the running path; issue paths are built only
//! when an issue is recorded.
//!
//! ## Issue Order
//!
//! Per node: discriminator, declared fields in reader order, unrecognized
//! keys in input order, duplicate id; then children depth-first by index.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use mkt_core::{IssueKind, IssuePath, ValidationIssue, ValidationIssues};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::{preview, FieldReader};
use crate::input::{EntryRef, RawEntry, RawGraph, SharedValue};
use crate::walk::TreeNode;

/// Key holding the child list of container variants.
pub const CHILDREN: &str = "children";

/// Key holding a node's optional identifier.
pub const ID: &str = "id";

/// Whether a variant carries child nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPolicy {
    /// No children; a `children` key is an unrecognized field.
    Leaf,
    /// `children` may be omitted and defaults to an empty list.
    Optional,
    /// `children` must be present.
    Required,
}

/// Declaration of a recursive, variant-tagged node type.
pub trait TreeSchema {
    /// Typed node produced by a successful validation.
    type Node: TreeNode;

    /// Schema name used in logs and error payloads.
    const NAME: &'static str;

    /// Key holding the variant tag.
    const DISCRIMINATOR: &'static str;

    /// Every known variant tag.
    fn variants() -> &'static [&'static str];

    /// Fields declared by a variant, excluding the discriminator.
    fn fields(tag: &str) -> &'static [&'static str];

    fn child_policy(tag: &str) -> ChildPolicy;

    /// Read the variant-specific fields of a node whose tag is `tag`
    /// (always one of [`variants`](Self::variants)). Returns `None` if a
    /// required field could not be read; the reader has recorded why.
    fn read_variant(tag: &str, fields: &mut FieldReader<'_>) -> Option<Self::Node>;

    /// Install validated children on a container node.
    fn attach_children(node: &mut Self::Node, children: Vec<Self::Node>);
}

/// What to do with keys a variant does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Report each one as `UnrecognizedField`.
    #[default]
    Reject,
    /// Drop them silently.
    Strip,
}

/// Validator configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorOptions {
    pub unknown_fields: UnknownFieldPolicy,
    /// Require node ids to be unique across the whole tree.
    pub unique_ids: bool,
    /// Deepest allowed node depth (the root is depth 0). Unbounded if unset.
    pub max_depth: Option<usize>,
}

/// Validates documents against the tree schema `S`.
///
/// Stateless between calls; a single validator can be shared across
/// threads.
#[derive(Debug, Clone, Copy)]
pub struct TreeValidator<S> {
    options: ValidatorOptions,
    _schema: PhantomData<fn() -> S>,
}

impl<S: TreeSchema> Default for TreeValidator<S> {
    fn default() -> Self {
        Self::new(ValidatorOptions::default())
    }
}

/// A node whose children are being validated. The frame at stack index
/// `k` sits at a path of exactly `2 * k` segments (`children`, index).
struct Frame<N> {
    entry: EntryRef,
    visit: usize,
    node: Option<N>,
    children: Vec<EntryRef>,
    next: usize,
    built: Vec<N>,
}

/// Per-call mutable state.
struct Run<'g> {
    graph: &'g RawGraph,
    options: ValidatorOptions,
    issues: Vec<ValidationIssue>,
    /// Containers already expanded, as nodes or inside open properties.
    claimed: HashSet<EntryRef>,
    /// Parent visit and child index of every entered node; `None` for the
    /// root. Paths are rebuilt from these only when an issue needs one.
    links: Vec<Option<(usize, usize)>>,
    nodes: HashMap<EntryRef, usize>,
    ids: HashMap<String, usize>,
}

impl<S: TreeSchema> TreeValidator<S> {
    pub fn new(options: ValidatorOptions) -> Self {
        Self {
            options,
            _schema: PhantomData,
        }
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Validate a parsed JSON document.
    pub fn validate(&self, input: &Value) -> Result<S::Node, ValidationIssues> {
        self.validate_graph(&RawGraph::from(input))
    }

    /// Validate a host object graph, which may contain cycles.
    pub fn validate_shared(&self, input: &SharedValue) -> Result<S::Node, ValidationIssues> {
        self.validate_graph(&RawGraph::from(input))
    }

    /// Validate a lowered input graph.
    pub fn validate_graph(&self, graph: &RawGraph) -> Result<S::Node, ValidationIssues> {
        let mut run = Run {
            graph,
            options: self.options,
            issues: Vec::new(),
            claimed: HashSet::new(),
            links: Vec::new(),
            nodes: HashMap::new(),
            ids: HashMap::new(),
        };
        let mut stack: Vec<Frame<S::Node>> = Vec::new();
        let mut on_path: HashSet<EntryRef> = HashSet::new();
        let mut root: Option<S::Node> = None;
        let mut path = IssuePath::root();

        if let Some(frame) = run.enter::<S>(graph.root(), &path, None) {
            on_path.insert(frame.entry);
            stack.push(frame);
        }

        loop {
            let depth = stack.len();
            let Some(top) = stack.last_mut() else {
                break;
            };

            let Some(&child) = top.children.get(top.next) else {
                let Some(frame) = stack.pop() else {
                    break;
                };
                on_path.remove(&frame.entry);
                path.truncate(2 * stack.len().saturating_sub(1));
                let node = frame.node.map(|mut node| {
                    S::attach_children(&mut node, frame.built);
                    node
                });
                match (stack.last_mut(), node) {
                    (Some(parent), Some(node)) => parent.built.push(node),
                    (Some(_), None) => {}
                    (None, node) => root = node,
                }
                continue;
            };

            let index = top.next;
            let parent = top.visit;
            top.next += 1;
            path.push(CHILDREN);
            path.push(index);

            if on_path.contains(&child) {
                let ancestor = stack
                    .iter()
                    .position(|frame| frame.entry == child)
                    .map(|level| path.prefix(2 * level))
                    .unwrap_or_default();
                run.cycle(path.clone(), &ancestor);
                path.truncate(2 * (depth - 1));
                continue;
            }

            if let Some(max_depth) = self.options.max_depth {
                if depth > max_depth {
                    run.too_deep(path.clone(), depth, max_depth);
                    path.truncate(2 * (depth - 1));
                    continue;
                }
            }

            match run.enter::<S>(child, &path, Some((parent, index))) {
                Some(frame) => {
                    on_path.insert(child);
                    stack.push(frame);
                }
                None => path.truncate(2 * (depth - 1)),
            }
        }

        tracing::debug!(
            schema = S::NAME,
            nodes = run.links.len(),
            issues = run.issues.len(),
            "tree validation finished"
        );

        match (ValidationIssues::new(run.issues), root) {
            (None, Some(node)) => Ok(node),
            (Some(issues), _) => Err(issues),
            // A variant reader rejected the root without recording why.
            (None, None) => Err(ValidationIssues::single(ValidationIssue::new(
                IssueKind::ConstraintViolation,
                IssuePath::root(),
                format!("document is not a valid {} tree", S::NAME),
                format!("{} node", S::NAME),
            ))),
        }
    }
}

impl<'g> Run<'g> {
    fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Validate one node's own fields. Returns `None` when the node is not
    /// an object, was already entered, or its variant is unknown; its
    /// children are then skipped.
    fn enter<S: TreeSchema>(
        &mut self,
        entry: EntryRef,
        path: &IssuePath,
        link: Option<(usize, usize)>,
    ) -> Option<Frame<S::Node>> {
        let graph = self.graph;
        let variants = S::variants();

        let raw = graph.entry(entry);
        if !matches!(raw, RawEntry::Object(_)) {
            self.push(
                ValidationIssue::new(
                    IssueKind::TypeMismatch,
                    path.clone(),
                    format!("expected a {} node", S::NAME),
                    "object",
                )
                .with_received(raw.type_name()),
            );
            return None;
        }

        if !self.claimed.insert(entry) {
            self.shared(entry, path);
            return None;
        }
        let visit = self.links.len();
        self.links.push(link);
        self.nodes.insert(entry, visit);

        let tag = match graph.member(entry, S::DISCRIMINATOR).map(|m| graph.entry(m)) {
            Some(RawEntry::String(tag)) if variants.contains(&tag.as_str()) => tag.as_str(),
            Some(RawEntry::String(tag)) => {
                self.unrecognized_variant::<S>(
                    path,
                    format!("unrecognized {} variant {}", S::NAME, preview(tag)),
                    Some(preview(tag)),
                );
                return None;
            }
            Some(other) => {
                self.unrecognized_variant::<S>(
                    path,
                    format!("discriminator `{}` must be a string", S::DISCRIMINATOR),
                    Some(other.type_name().to_string()),
                );
                return None;
            }
            None => {
                self.unrecognized_variant::<S>(
                    path,
                    format!("missing discriminator `{}`", S::DISCRIMINATOR),
                    None,
                );
                return None;
            }
        };

        tracing::trace!(schema = S::NAME, %path, tag, "validating node");

        let (node, children, leftover) = {
            let mut fields =
                FieldReader::new(graph, entry, path, &mut self.issues, &mut self.claimed);
            fields.mark(S::DISCRIMINATOR);
            let policy = S::child_policy(tag);
            // Children are read last but must never land in an open bag.
            match policy {
                ChildPolicy::Leaf => fields.reserve(CHILDREN),
                ChildPolicy::Optional | ChildPolicy::Required => fields.mark(CHILDREN),
            }
            let node = S::read_variant(tag, &mut fields);
            let children = match policy {
                ChildPolicy::Leaf => Vec::new(),
                ChildPolicy::Optional => fields.children(CHILDREN, false),
                ChildPolicy::Required => fields.children(CHILDREN, true),
            };
            (node, children, fields.unconsumed())
        };

        match self.options.unknown_fields {
            UnknownFieldPolicy::Reject if !leftover.is_empty() => {
                let declared = S::fields(tag).join(", ");
                for (key, type_name) in leftover {
                    let message = format!("unrecognized field `{key}` on `{tag}` node");
                    self.push(
                        ValidationIssue::new(
                            IssueKind::UnrecognizedField,
                            path.key(key),
                            message,
                            format!("one of: {declared}"),
                        )
                        .with_received(type_name),
                    );
                }
            }
            UnknownFieldPolicy::Reject => {}
            UnknownFieldPolicy::Strip => {
                for (key, _) in leftover {
                    tracing::debug!(schema = S::NAME, %path, field = %key, "stripping unrecognized field");
                }
            }
        }

        // Ids are taken from the input, so a node rejected for another
        // field still claims its id.
        if self.options.unique_ids {
            if let Some(RawEntry::String(id)) = graph.member(entry, ID).map(|m| graph.entry(m)) {
                match self.ids.get(id.as_str()) {
                    Some(&first) => {
                        let first = self.path_of(first);
                        let issue = ValidationIssue::new(
                            IssueKind::ConstraintViolation,
                            path.key(ID),
                            format!("duplicate id {}; first used at {first}", preview(id)),
                            "id unique within the tree",
                        )
                        .with_received(preview(id));
                        self.push(issue);
                    }
                    None => {
                        self.ids.insert(id.clone(), visit);
                    }
                }
            }
        }

        Some(Frame {
            entry,
            visit,
            node,
            children,
            next: 0,
            built: Vec::new(),
        })
    }

    /// Path of an entered node, rebuilt from its visit links.
    fn path_of(&self, visit: usize) -> IssuePath {
        let mut indices = Vec::new();
        let mut current = visit;
        while let Some(Some((parent, index))) = self.links.get(current) {
            indices.push(*index);
            current = *parent;
        }
        let mut path = IssuePath::root();
        for index in indices.into_iter().rev() {
            path.push(CHILDREN);
            path.push(index);
        }
        path
    }

    /// The root's discriminator problem rejects the document as a whole;
    /// nested ones point at the child's tag field.
    fn unrecognized_variant<S: TreeSchema>(
        &mut self,
        path: &IssuePath,
        message: String,
        received: Option<String>,
    ) {
        let tag_path = if path.is_root() {
            IssuePath::root()
        } else {
            path.key(S::DISCRIMINATOR)
        };
        let issue = ValidationIssue::new(
            IssueKind::UnrecognizedVariant,
            tag_path,
            message,
            format!("one of: {}", S::variants().join(", ")),
        );
        self.push(match received {
            Some(received) => issue.with_received(received),
            None => issue,
        });
    }

    fn shared(&mut self, entry: EntryRef, path: &IssuePath) {
        let message = match self.nodes.get(&entry) {
            Some(&first) => format!("node is already used at {}", self.path_of(first)),
            None => "node is already used elsewhere in the document".to_string(),
        };
        tracing::warn!(%path, "shared node in children");
        self.push(
            ValidationIssue::new(
                IssueKind::ConstraintViolation,
                path.clone(),
                message,
                "each node used once",
            )
            .with_received("shared reference"),
        );
    }

    fn cycle(&mut self, path: IssuePath, ancestor: &IssuePath) {
        tracing::warn!(%path, %ancestor, "cyclic structure in children");
        self.push(
            ValidationIssue::new(
                IssueKind::CyclicStructure,
                path,
                format!("node contains itself; it is the node at {ancestor}"),
                "acyclic tree",
            )
            .with_received(format!("reference to ancestor at {ancestor}")),
        );
    }

    fn too_deep(&mut self, path: IssuePath, depth: usize, max_depth: usize) {
        self.push(
            ValidationIssue::new(
                IssueKind::ConstraintViolation,
                path,
                format!("tree exceeds the maximum depth of {max_depth}"),
                format!("depth <= {max_depth}"),
            )
            .with_received(format!("depth {depth}")),
        );
    }
}

/// Render a validation result as `{"ok": true, "value": ..}` or
/// `{"ok": false, "errors": [..]}`.
pub fn outcome_json<N: Serialize>(
    result: &Result<N, ValidationIssues>,
) -> Result<Value, serde_json::Error> {
    Ok(match result {
        Ok(node) => serde_json::json!({ "ok": true, "value": serde_json::to_value(node)? }),
        Err(issues) => serde_json::json!({ "ok": false, "errors": serde_json::to_value(issues)? }),
    })
}
