//! # UI Component Trees
//!
//! Arbitrarily nested component definitions tagged by `type`. Leaf
//! components (`text`, `image`, `button`) render content; layout
//! components (`stack`, `card`) hold further components.
//!
//! Components are open records: keys a variant does not declare are kept
//! verbatim in its `props` bag and serialized back next to the known
//! fields. Only `children` on a leaf component is rejected, since it would
//! otherwise smuggle a subtree past validation.

use serde::Serialize;
use serde_json::{Map, Value};

use mkt_core::ValidationIssues;

use crate::fields::{FieldEnum, FieldReader, TextRule};
use crate::tree::{ChildPolicy, TreeSchema, TreeValidator};
use crate::walk::TreeNode;

const CONTENT: TextRule = TextRule::new(1, 10_000);
const ALT: TextRule = TextRule::new(0, 256);
const LABEL: TextRule = TextRule::new(1, 64);
const TITLE: TextRule = TextRule::new(1, 128);

const DIMENSION: std::ops::RangeInclusive<u32> = 1..=8192;
const GAP: std::ops::RangeInclusive<u32> = 0..=256;

/// Typography of a text component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextVariant {
    #[default]
    Body,
    Caption,
    Heading,
    Label,
}

impl FieldEnum for TextVariant {
    fn all() -> &'static [Self] {
        &[Self::Body, Self::Caption, Self::Heading, Self::Label]
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Caption => "caption",
            Self::Heading => "heading",
            Self::Label => "label",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    Navigate,
    Submit,
    OpenModal,
    Dismiss,
}

impl FieldEnum for ButtonAction {
    fn all() -> &'static [Self] {
        &[Self::Navigate, Self::Submit, Self::OpenModal, Self::Dismiss]
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Submit => "submit",
            Self::OpenModal => "open_modal",
            Self::Dismiss => "dismiss",
        }
    }
}

/// Main axis of a stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Vertical,
    Horizontal,
}

impl FieldEnum for Direction {
    fn all() -> &'static [Self] {
        &[Self::Vertical, Self::Horizontal]
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: String,
    pub variant: TextVariant,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub src: String,
    /// Alternative text; empty marks the image as decorative.
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    pub action: ButtonAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub disabled: bool,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stack {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub direction: Direction,
    pub gap: u32,
    pub children: Vec<Component>,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub elevated: bool,
    pub children: Vec<Component>,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

/// One validated UI component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Text(Text),
    Image(Image),
    Button(Button),
    Stack(Stack),
    Card(Card),
}

impl Component {
    /// Undeclared properties carried by this component.
    pub fn props(&self) -> &Map<String, Value> {
        match self {
            Self::Text(c) => &c.props,
            Self::Image(c) => &c.props,
            Self::Button(c) => &c.props,
            Self::Stack(c) => &c.props,
            Self::Card(c) => &c.props,
        }
    }
}

impl TreeNode for Component {
    fn tag(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Button(_) => "button",
            Self::Stack(_) => "stack",
            Self::Card(_) => "card",
        }
    }

    fn id(&self) -> Option<&str> {
        match self {
            Self::Text(c) => c.id.as_deref(),
            Self::Image(c) => c.id.as_deref(),
            Self::Button(c) => c.id.as_deref(),
            Self::Stack(c) => c.id.as_deref(),
            Self::Card(c) => c.id.as_deref(),
        }
    }

    fn children(&self) -> &[Self] {
        match self {
            Self::Stack(c) => &c.children,
            Self::Card(c) => &c.children,
            Self::Text(_) | Self::Image(_) | Self::Button(_) => &[],
        }
    }
}

/// Schema for UI component trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentSchema;

impl TreeSchema for ComponentSchema {
    type Node = Component;

    const NAME: &'static str = "component";
    const DISCRIMINATOR: &'static str = "type";

    fn variants() -> &'static [&'static str] {
        &["text", "image", "button", "stack", "card"]
    }

    fn fields(tag: &str) -> &'static [&'static str] {
        match tag {
            "text" => &["id", "content", "variant"],
            "image" => &["id", "src", "alt", "width", "height"],
            "button" => &["id", "label", "action", "href", "disabled"],
            "stack" => &["id", "direction", "gap", "children"],
            "card" => &["id", "title", "elevated", "children"],
            _ => &[],
        }
    }

    fn child_policy(tag: &str) -> ChildPolicy {
        match tag {
            "stack" | "card" => ChildPolicy::Optional,
            _ => ChildPolicy::Leaf,
        }
    }

    fn read_variant(tag: &str, fields: &mut FieldReader<'_>) -> Option<Component> {
        let id = fields.optional_text("id", &TextRule::IDENTIFIER);
        let node = match tag {
            "text" => {
                let content = fields.required_text("content", &CONTENT);
                let variant = fields.enum_or("variant", TextVariant::default());
                let props = fields.collect_rest();
                Component::Text(Text {
                    id,
                    content: content?,
                    variant,
                    props,
                })
            }
            "image" => {
                let src = fields.required_text("src", &TextRule::HREF);
                let alt = fields.required_text("alt", &ALT);
                let width = fields.optional_u32("width", DIMENSION);
                let height = fields.optional_u32("height", DIMENSION);
                let props = fields.collect_rest();
                Component::Image(Image {
                    id,
                    src: src?,
                    alt: alt?,
                    width,
                    height,
                    props,
                })
            }
            "button" => {
                let label = fields.required_text("label", &LABEL);
                let action = fields.required_enum::<ButtonAction>("action");
                let href = fields.optional_text("href", &TextRule::HREF);
                let disabled = fields.bool_or("disabled", false);
                let props = fields.collect_rest();
                Component::Button(Button {
                    id,
                    label: label?,
                    action: action?,
                    href,
                    disabled,
                    props,
                })
            }
            "stack" => {
                let direction = fields.enum_or("direction", Direction::default());
                let gap = fields.u32_or("gap", 0, GAP);
                let props = fields.collect_rest();
                Component::Stack(Stack {
                    id,
                    direction,
                    gap,
                    children: Vec::new(),
                    props,
                })
            }
            "card" => {
                let title = fields.optional_text("title", &TITLE);
                let elevated = fields.bool_or("elevated", false);
                let props = fields.collect_rest();
                Component::Card(Card {
                    id,
                    title,
                    elevated,
                    children: Vec::new(),
                    props,
                })
            }
            _ => return None,
        };
        Some(node)
    }

    fn attach_children(node: &mut Component, children: Vec<Component>) {
        match node {
            Component::Stack(stack) => stack.children = children,
            Component::Card(card) => card.children = children,
            Component::Text(_) | Component::Image(_) | Component::Button(_) => {}
        }
    }
}

pub type ComponentValidator = TreeValidator<ComponentSchema>;

/// Validate a component tree with default options.
pub fn validate(input: &Value) -> Result<Component, ValidationIssues> {
    ComponentValidator::default().validate(input)
}
