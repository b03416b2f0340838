//! # Input Graph
//!
//! Every document is lowered into a [`RawGraph`] before validation: an
//! arena of JSON-like entries where arrays and objects reference their
//! members by [`EntryRef`]. The arena keeps container *identity*, so the
//! validator can tell a shared subtree from a genuine cycle.
//!
//! Two sources are supported:
//!
//! - `serde_json::Value`, the usual boundary input. It is a tree, so its
//!   graph never contains a cycle.
//! - [`SharedValue`], a host object graph with shared, mutable containers.
//!   Callers can wire a container into itself (directly or transitively),
//!   and lowering preserves that back edge instead of looping on it.
//!
//! ## Resource Bounds
//!
//! Lowering and [`RawGraph::to_json`] use explicit work stacks. Neither
//! recurses on the host stack, so arbitrarily deep documents cannot
//! exhaust it. Copies claim the containers they expand, so a small host
//! graph that references one subtree many times cannot fan out into an
//! exponentially large value.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use mkt_core::{IssuePath, PathSegment};
use serde_json::{Map, Number, Value};

/// Handle to an entry in a [`RawGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryRef(usize);

/// One lowered value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEntry {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<EntryRef>),
    /// Object members in input order.
    Object(Vec<(String, EntryRef)>),
}

impl RawEntry {
    /// JSON type name, used in `received` descriptions.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_))
    }
}

static NULL_ENTRY: RawEntry = RawEntry::Null;

/// Arena of lowered values with a designated root.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGraph {
    entries: Vec<RawEntry>,
    root: EntryRef,
}

impl RawGraph {
    pub fn root(&self) -> EntryRef {
        self.root
    }

    /// Number of entries in the arena.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry. A handle from another graph that falls outside
    /// this arena resolves to `null`.
    pub fn entry(&self, entry: EntryRef) -> &RawEntry {
        self.entries.get(entry.0).unwrap_or(&NULL_ENTRY)
    }

    /// Look up a member of an object entry by key.
    pub fn member(&self, object: EntryRef, key: &str) -> Option<EntryRef> {
        match self.entry(object) {
            RawEntry::Object(members) => members
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| *value),
            _ => None,
        }
    }

    /// Rebuild a `serde_json::Value` for the subgraph rooted at `start`.
    ///
    /// Every container copied is added to `claimed`. A container that is
    /// already claimed, by this copy or an earlier one, is not copied again:
    /// the copy fails with [`CopyError::Cycle`] if the container encloses
    /// itself and [`CopyError::Shared`] otherwise. Each container is thus
    /// expanded at most once, however often the host graph references it.
    pub fn to_json(
        &self,
        start: EntryRef,
        claimed: &mut HashSet<EntryRef>,
    ) -> Result<Value, CopyError> {
        enum Frame<'g> {
            Array {
                id: EntryRef,
                items: &'g [EntryRef],
                next: usize,
                out: Vec<Value>,
            },
            Object {
                id: EntryRef,
                members: &'g [(String, EntryRef)],
                next: usize,
                out: Map<String, Value>,
            },
        }

        let mut stack = match open(self, start) {
            Ok(frame) => vec![frame],
            Err(scalar) => return Ok(scalar),
        };
        if !claimed.insert(start) {
            return Err(CopyError::Shared(IssuePath::root()));
        }
        let mut on_path: HashSet<EntryRef> = HashSet::from([start]);
        // Segments leading from `start` to the frame on top of the stack.
        let mut trail: Vec<PathSegment> = Vec::new();

        loop {
            let Some(top) = stack.last_mut() else {
                return Ok(Value::Null);
            };

            let step = match top {
                Frame::Array { items, next, .. } => items.get(*next).map(|child| {
                    *next += 1;
                    (*child, PathSegment::Index(*next - 1))
                }),
                Frame::Object { members, next, .. } => members.get(*next).map(|(key, child)| {
                    *next += 1;
                    (*child, PathSegment::Key(key.clone()))
                }),
            };

            match step {
                Some((child, segment)) => match open(self, child) {
                    Err(scalar) => push_value(top, scalar),
                    Ok(frame) => {
                        trail.push(segment);
                        if on_path.contains(&child) {
                            return Err(CopyError::Cycle(trail.into_iter().collect()));
                        }
                        if !claimed.insert(child) {
                            return Err(CopyError::Shared(trail.into_iter().collect()));
                        }
                        on_path.insert(child);
                        stack.push(frame);
                    }
                },
                None => {
                    let (id, value) = match stack.pop() {
                        Some(Frame::Array { id, out, .. }) => (id, Value::Array(out)),
                        Some(Frame::Object { id, out, .. }) => (id, Value::Object(out)),
                        None => return Ok(Value::Null),
                    };
                    on_path.remove(&id);
                    match stack.last_mut() {
                        Some(parent) => {
                            trail.pop();
                            push_value(parent, value);
                        }
                        None => return Ok(value),
                    }
                }
            }
        }

        fn open(graph: &RawGraph, id: EntryRef) -> Result<Frame<'_>, Value> {
            match graph.entry(id) {
                RawEntry::Array(items) => Ok(Frame::Array {
                    id,
                    items: items.as_slice(),
                    next: 0,
                    out: Vec::with_capacity(items.len()),
                }),
                RawEntry::Object(members) => Ok(Frame::Object {
                    id,
                    members: members.as_slice(),
                    next: 0,
                    out: Map::new(),
                }),
                RawEntry::Null => Err(Value::Null),
                RawEntry::Bool(b) => Err(Value::Bool(*b)),
                RawEntry::Number(n) => Err(Value::Number(n.clone())),
                RawEntry::String(s) => Err(Value::String(s.clone())),
            }
        }

        fn push_value(frame: &mut Frame<'_>, value: Value) {
            match frame {
                Frame::Array { out, .. } => out.push(value),
                Frame::Object {
                    members, next, out, ..
                } => {
                    if let Some((key, _)) = members.get(*next - 1) {
                        out.insert(key.clone(), value);
                    }
                }
            }
        }
    }
}

/// Why a subgraph could not be copied out as a tree. Paths are relative
/// to the start of the copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyError {
    /// A container reachable from itself; the path is the back edge.
    Cycle(IssuePath),
    /// A container already expanded elsewhere; the path is the repeat
    /// reference.
    Shared(IssuePath),
}

impl CopyError {
    pub fn path(&self) -> &IssuePath {
        match self {
            Self::Cycle(path) | Self::Shared(path) => path,
        }
    }
}

/// Incremental arena builder shared by both lowering paths.
struct Lowering {
    entries: Vec<RawEntry>,
}

impl Lowering {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn alloc(&mut self, entry: RawEntry) -> EntryRef {
        self.entries.push(entry);
        EntryRef(self.entries.len() - 1)
    }

    fn set(&mut self, slot: EntryRef, entry: RawEntry) {
        if let Some(target) = self.entries.get_mut(slot.0) {
            *target = entry;
        }
    }

    fn finish(self, root: EntryRef) -> RawGraph {
        RawGraph {
            entries: self.entries,
            root,
        }
    }
}

impl From<&Value> for RawGraph {
    fn from(value: &Value) -> Self {
        let mut lowering = Lowering::new();
        let root = lowering.alloc(RawEntry::Null);
        let mut pending: Vec<(&Value, EntryRef)> = vec![(value, root)];

        while let Some((value, slot)) = pending.pop() {
            let entry = match value {
                Value::Null => RawEntry::Null,
                Value::Bool(b) => RawEntry::Bool(*b),
                Value::Number(n) => RawEntry::Number(n.clone()),
                Value::String(s) => RawEntry::String(s.clone()),
                Value::Array(items) => RawEntry::Array(
                    items
                        .iter()
                        .map(|item| {
                            let child = lowering.alloc(RawEntry::Null);
                            pending.push((item, child));
                            child
                        })
                        .collect(),
                ),
                Value::Object(members) => RawEntry::Object(
                    members
                        .iter()
                        .map(|(key, item)| {
                            let child = lowering.alloc(RawEntry::Null);
                            pending.push((item, child));
                            (key.clone(), child)
                        })
                        .collect(),
                ),
            };
            lowering.set(slot, entry);
        }

        lowering.finish(root)
    }
}

impl From<Value> for RawGraph {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

/// Shared, mutable array storage of a [`SharedValue`].
pub type SharedArray = Rc<RefCell<Vec<SharedValue>>>;

/// Shared, mutable object storage of a [`SharedValue`]; members keep
/// insertion order.
pub type SharedObject = Rc<RefCell<Vec<(String, SharedValue)>>>;

/// A JSON-like host object graph whose containers are reference counted
/// and mutable after construction.
///
/// Cloning a `SharedValue` clones the handle, not the container, so the
/// same array or object can appear at several places in a graph, including
/// inside itself. Reference cycles are never freed; break them (for
/// example with [`SharedValue::clear`]) when the graph must be dropped.
#[derive(Clone)]
pub enum SharedValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(SharedArray),
    Object(SharedObject),
}

impl SharedValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn array(items: Vec<SharedValue>) -> Self {
        Self::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object<K: Into<String>>(members: impl IntoIterator<Item = (K, SharedValue)>) -> Self {
        Self::Object(Rc::new(RefCell::new(
            members
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )))
    }

    /// Set `key` on an object, replacing an existing member in place.
    /// Returns false if `self` is not an object.
    pub fn insert(&self, key: impl Into<String>, value: SharedValue) -> bool {
        let Self::Object(members) = self else {
            return false;
        };
        let key = key.into();
        let mut members = members.borrow_mut();
        match members.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = value,
            None => members.push((key, value)),
        }
        true
    }

    /// Append to an array. Returns false if `self` is not an array.
    pub fn push(&self, value: SharedValue) -> bool {
        let Self::Array(items) = self else {
            return false;
        };
        items.borrow_mut().push(value);
        true
    }

    /// Member of an object, by key.
    pub fn get(&self, key: &str) -> Option<SharedValue> {
        match self {
            Self::Object(members) => members
                .borrow()
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }

    /// Element of an array, by index.
    pub fn get_index(&self, index: usize) -> Option<SharedValue> {
        match self {
            Self::Array(items) => items.borrow().get(index).cloned(),
            _ => None,
        }
    }

    /// Empty a container, releasing any cycle that passes through it.
    pub fn clear(&self) {
        match self {
            Self::Array(items) => items.borrow_mut().clear(),
            Self::Object(members) => members.borrow_mut().clear(),
            _ => {}
        }
    }

    /// True if both handles point at the same container.
    pub fn ptr_eq(&self, other: &SharedValue) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn identity(&self) -> Option<usize> {
        match self {
            Self::Array(items) => Some(Rc::as_ptr(items) as *const () as usize),
            Self::Object(members) => Some(Rc::as_ptr(members) as *const () as usize),
            _ => None,
        }
    }
}

/// Shallow rendering; containers may be cyclic.
impl fmt::Debug for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Array(items) => match items.try_borrow() {
                Ok(items) => write!(f, "Array(len={})", items.len()),
                Err(_) => f.write_str("Array(<borrowed>)"),
            },
            Self::Object(members) => match members.try_borrow() {
                Ok(members) => {
                    let keys: Vec<&str> = members.iter().map(|(k, _)| k.as_str()).collect();
                    write!(f, "Object({keys:?})")
                }
                Err(_) => f.write_str("Object(<borrowed>)"),
            },
        }
    }
}

impl From<&Value> for SharedValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::array(items.iter().map(Self::from).collect()),
            Value::Object(members) => {
                Self::object(members.iter().map(|(key, item)| (key.clone(), Self::from(item))))
            }
        }
    }
}

impl From<&SharedValue> for RawGraph {
    fn from(value: &SharedValue) -> Self {
        let mut lowering = Lowering::new();
        let mut interned: HashMap<usize, EntryRef> = HashMap::new();
        let mut pending: Vec<(SharedValue, EntryRef)> = Vec::new();

        let mut intern = |value: &SharedValue,
                          lowering: &mut Lowering,
                          pending: &mut Vec<(SharedValue, EntryRef)>|
         -> EntryRef {
            match value {
                SharedValue::Null => lowering.alloc(RawEntry::Null),
                SharedValue::Bool(b) => lowering.alloc(RawEntry::Bool(*b)),
                SharedValue::Number(n) => lowering.alloc(RawEntry::Number(n.clone())),
                SharedValue::String(s) => lowering.alloc(RawEntry::String(s.clone())),
                SharedValue::Array(_) | SharedValue::Object(_) => {
                    let identity = value.identity().unwrap_or_default();
                    if let Some(existing) = interned.get(&identity) {
                        return *existing;
                    }
                    let slot = lowering.alloc(RawEntry::Null);
                    interned.insert(identity, slot);
                    pending.push((value.clone(), slot));
                    slot
                }
            }
        };

        let root = intern(value, &mut lowering, &mut pending);

        while let Some((value, slot)) = pending.pop() {
            let entry = match &value {
                SharedValue::Array(items) => {
                    let items: Vec<SharedValue> = items.borrow().clone();
                    RawEntry::Array(
                        items
                            .iter()
                            .map(|item| intern(item, &mut lowering, &mut pending))
                            .collect(),
                    )
                }
                SharedValue::Object(members) => {
                    let members: Vec<(String, SharedValue)> = members.borrow().clone();
                    RawEntry::Object(
                        members
                            .iter()
                            .map(|(key, item)| (key.clone(), intern(item, &mut lowering, &mut pending)))
                            .collect(),
                    )
                }
                _ => continue,
            };
            lowering.set(slot, entry);
        }

        lowering.finish(root)
    }
}
