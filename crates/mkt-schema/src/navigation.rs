//! # Navigation Menus
//!
//! Self-referential menu trees tagged by `kind`:
//!
//! - `link`: a labelled target (`href`), optionally external or badged.
//! - `group`: a labelled, collapsible container of further items.
//! - `divider`: a visual separator.
//!
//! Navigation nodes are closed records. Keys a variant does not declare
//! are unrecognized fields.

use serde::Serialize;
use serde_json::Value;

use mkt_core::ValidationIssues;

use crate::fields::{FieldReader, TextRule};
use crate::tree::{ChildPolicy, TreeSchema, TreeValidator};
use crate::walk::TreeNode;

const LABEL: TextRule = TextRule::new(1, 64);
const BADGE: TextRule = TextRule::new(1, 16);

/// A link to a page, anchor or external site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Opens outside the application. Defaults to `false`.
    pub external: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

/// A collapsible section holding nested items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Initially open. Defaults to `false`.
    pub expanded: bool,
    pub children: Vec<NavItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavDivider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// One validated navigation node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavItem {
    Link(NavLink),
    Group(NavGroup),
    Divider(NavDivider),
}

impl NavItem {
    /// Visible label; dividers have none.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Link(link) => Some(&link.label),
            Self::Group(group) => Some(&group.label),
            Self::Divider(_) => None,
        }
    }
}

impl TreeNode for NavItem {
    fn tag(&self) -> &'static str {
        match self {
            Self::Link(_) => "link",
            Self::Group(_) => "group",
            Self::Divider(_) => "divider",
        }
    }

    fn id(&self) -> Option<&str> {
        match self {
            Self::Link(link) => link.id.as_deref(),
            Self::Group(group) => group.id.as_deref(),
            Self::Divider(divider) => divider.id.as_deref(),
        }
    }

    fn children(&self) -> &[Self] {
        match self {
            Self::Group(group) => &group.children,
            Self::Link(_) | Self::Divider(_) => &[],
        }
    }
}

/// Schema for navigation menus.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationSchema;

impl TreeSchema for NavigationSchema {
    type Node = NavItem;

    const NAME: &'static str = "navigation";
    const DISCRIMINATOR: &'static str = "kind";

    fn variants() -> &'static [&'static str] {
        &["link", "group", "divider"]
    }

    fn fields(tag: &str) -> &'static [&'static str] {
        match tag {
            "link" => &["id", "label", "href", "icon", "external", "badge"],
            "group" => &["id", "label", "icon", "expanded", "children"],
            "divider" => &["id"],
            _ => &[],
        }
    }

    fn child_policy(tag: &str) -> ChildPolicy {
        match tag {
            "group" => ChildPolicy::Required,
            _ => ChildPolicy::Leaf,
        }
    }

    fn read_variant(tag: &str, fields: &mut FieldReader<'_>) -> Option<NavItem> {
        match tag {
            "link" => {
                let id = fields.optional_text("id", &TextRule::IDENTIFIER);
                let label = fields.required_text("label", &LABEL);
                let href = fields.required_text("href", &TextRule::HREF);
                let icon = fields.optional_text("icon", &TextRule::IDENTIFIER);
                let external = fields.bool_or("external", false);
                let badge = fields.optional_text("badge", &BADGE);
                Some(NavItem::Link(NavLink {
                    id,
                    label: label?,
                    href: href?,
                    icon,
                    external,
                    badge,
                }))
            }
            "group" => {
                let id = fields.optional_text("id", &TextRule::IDENTIFIER);
                let label = fields.required_text("label", &LABEL);
                let icon = fields.optional_text("icon", &TextRule::IDENTIFIER);
                let expanded = fields.bool_or("expanded", false);
                Some(NavItem::Group(NavGroup {
                    id,
                    label: label?,
                    icon,
                    expanded,
                    children: Vec::new(),
                }))
            }
            "divider" => {
                let id = fields.optional_text("id", &TextRule::IDENTIFIER);
                Some(NavItem::Divider(NavDivider { id }))
            }
            _ => None,
        }
    }

    fn attach_children(node: &mut NavItem, children: Vec<NavItem>) {
        if let NavItem::Group(group) = node {
            group.children = children;
        }
    }
}

pub type NavigationValidator = TreeValidator<NavigationSchema>;

/// Validate a navigation tree with default options.
pub fn validate(input: &Value) -> Result<NavItem, ValidationIssues> {
    NavigationValidator::default().validate(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkt_core::IssueKind;
    use serde_json::json;

    fn paths(issues: &ValidationIssues) -> Vec<String> {
        issues.iter().map(|i| i.path.to_string()).collect()
    }

    #[test]
    fn test_group_defaults_expanded_false() {
        let item = validate(&json!({
            "kind": "group",
            "label": "Catalog",
            "children": [{"kind": "link", "label": "All", "href": "/listings"}]
        }))
        .unwrap();
        let NavItem::Group(group) = &item else {
            panic!("expected a group, got {item:?}");
        };
        assert!(!group.expanded);
        assert_eq!(group.children.len(), 1);
        assert_eq!(group.children[0].tag(), "link");
        let NavItem::Link(link) = &group.children[0] else {
            panic!("expected a link");
        };
        assert!(!link.external);
    }

    #[test]
    fn test_explicit_non_default_is_kept() {
        let item = validate(&json!({
            "kind": "group", "label": "Account", "expanded": true, "children": []
        }))
        .unwrap();
        assert_eq!(serde_json::to_value(&item).unwrap()["expanded"], json!(true));
    }

    #[test]
    fn test_link_requires_label_and_href() {
        let issues = validate(&json!({"kind": "link"})).unwrap_err();
        assert_eq!(paths(&issues), vec!["label", "href"]);
        assert_eq!(issues.count(IssueKind::MissingRequiredField), 2);
    }

    #[test]
    fn test_group_requires_children() {
        let issues = validate(&json!({"kind": "group", "label": "Empty"})).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.issues()[0].kind, IssueKind::MissingRequiredField);
        assert_eq!(issues.issues()[0].path.to_string(), "children");
    }

    #[test]
    fn test_children_on_link_is_unrecognized() {
        let issues = validate(&json!({
            "kind": "link", "label": "Home", "href": "/", "children": []
        }))
        .unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.issues()[0].kind, IssueKind::UnrecognizedField);
        assert_eq!(issues.issues()[0].path.to_string(), "children");
    }

    #[test]
    fn test_divider_rejects_link_fields() {
        let issues = validate(&json!({"kind": "divider", "label": "x"})).unwrap_err();
        assert_eq!(issues.issues()[0].kind, IssueKind::UnrecognizedField);
        assert_eq!(issues.issues()[0].expected, "one of: id");
    }

    #[test]
    fn test_invalid_href() {
        let issues = validate(&json!({
            "kind": "link", "label": "Bad", "href": "javascript:void(0)"
        }))
        .unwrap_err();
        assert_eq!(issues.issues()[0].kind, IssueKind::ConstraintViolation);
        assert_eq!(issues.issues()[0].path.to_string(), "href");
    }

    #[test]
    fn test_serialized_form_is_flat_and_tagged() {
        let item = validate(&json!({"kind": "link", "label": "Docs", "href": "https://docs.example.com"}))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"kind": "link", "label": "Docs", "href": "https://docs.example.com", "external": false})
        );
        assert_eq!(item.label(), Some("Docs"));
    }
}
