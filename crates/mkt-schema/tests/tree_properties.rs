//! Property tests: validation is deterministic, and validating the
//! serialized form of a normalized tree yields the same tree.

use mkt_schema::{component, navigation, walk};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn nav_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        (
            "[A-Za-z ]{1,20}",
            "/[a-z0-9-]{0,12}",
            proptest::option::of(any::<bool>()),
            proptest::option::of("[a-z_]{1,8}"),
        )
            .prop_map(|(label, href, external, icon)| {
                let mut link = json!({"kind": "link", "label": label, "href": href});
                if let Some(external) = external {
                    link["external"] = json!(external);
                }
                if let Some(icon) = icon {
                    link["icon"] = json!(icon);
                }
                link
            }),
        proptest::option::of("[a-z]{1,6}").prop_map(|id| match id {
            Some(id) => json!({"kind": "divider", "id": id}),
            None => json!({"kind": "divider"}),
        }),
    ]
}

fn nav_tree() -> impl Strategy<Value = Value> {
    nav_leaf().prop_recursive(4, 48, 5, |inner| {
        (
            "[A-Za-z]{1,16}",
            proptest::option::of(any::<bool>()),
            prop::collection::vec(inner, 0..5),
        )
            .prop_map(|(label, expanded, children)| {
                let mut group = json!({"kind": "group", "label": label, "children": children});
                if let Some(expanded) = expanded {
                    group["expanded"] = json!(expanded);
                }
                group
            })
    })
}

fn props() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(
        "data-[a-z]{1,6}",
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z ]{0,10}".prop_map(Value::String),
        ],
        0..3,
    )
    .prop_map(|bag| bag.into_iter().collect())
}

fn with_props(mut node: Value, bag: Map<String, Value>) -> Value {
    if let Value::Object(object) = &mut node {
        object.extend(bag);
    }
    node
}

fn component_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        ("[A-Za-z ]{1,40}", props()).prop_map(|(content, bag)| {
            with_props(json!({"type": "text", "content": content}), bag)
        }),
        ("/img/[a-z]{1,8}", "[a-z ]{0,20}", proptest::option::of(1u32..=8192), props()).prop_map(
            |(src, alt, width, bag)| {
                let mut image = json!({"type": "image", "src": src, "alt": alt});
                if let Some(width) = width {
                    image["width"] = json!(width);
                }
                with_props(image, bag)
            }
        ),
        (
            "[A-Za-z]{1,20}",
            prop_oneof![Just("navigate"), Just("submit"), Just("open_modal"), Just("dismiss")],
            props(),
        )
            .prop_map(|(label, action, bag)| {
                with_props(json!({"type": "button", "label": label, "action": action}), bag)
            }),
    ]
}

fn component_tree() -> impl Strategy<Value = Value> {
    component_leaf().prop_recursive(4, 48, 5, |inner| {
        (
            any::<bool>(),
            proptest::option::of(0u32..=256),
            prop::collection::vec(inner, 0..5),
            props(),
        )
            .prop_map(|(is_stack, gap, children, bag)| {
                let mut node = if is_stack {
                    json!({"type": "stack", "children": children})
                } else {
                    json!({"type": "card", "children": children})
                };
                if let (true, Some(gap)) = (is_stack, gap) {
                    node["gap"] = json!(gap);
                }
                with_props(node, bag)
            })
    })
}

/// Arbitrary JSON built from the keys and tags the schemas care about,
/// so that a good share of inputs are almost-valid.
fn near_miss() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..300).prop_map(|n| json!(n)),
        prop_oneof![
            Just("link"),
            Just("group"),
            Just("text"),
            Just("stack"),
            Just("/home"),
            Just(""),
            Just("bogus"),
        ]
        .prop_map(|s| Value::String(s.to_string())),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(
                prop_oneof![
                    Just("kind"),
                    Just("type"),
                    Just("label"),
                    Just("href"),
                    Just("content"),
                    Just("children"),
                    Just("gap"),
                    Just("extra"),
                ]
                .prop_map(str::to_string),
                inner,
                0..6,
            )
            .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// Every generated navigation tree is valid, and re-validating its
    /// normalized form reproduces it exactly.
    #[test]
    fn navigation_normalization_is_idempotent(input in nav_tree()) {
        let first = navigation::validate(&input);
        prop_assert!(first.is_ok(), "generated tree rejected: {:?}", first.err());
        let first = first.unwrap();
        let normalized = serde_json::to_value(&first).unwrap();
        let second = navigation::validate(&normalized).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(serde_json::to_value(&second).unwrap(), normalized);
    }

    /// Component props survive normalization untouched.
    #[test]
    fn component_normalization_is_idempotent(input in component_tree()) {
        let first = component::validate(&input);
        prop_assert!(first.is_ok(), "generated tree rejected: {:?}", first.err());
        let first = first.unwrap();
        let normalized = serde_json::to_value(&first).unwrap();
        let second = component::validate(&normalized).unwrap();
        prop_assert_eq!(walk::count(&first), walk::count(&second));
        prop_assert_eq!(first, second);
    }

    /// The same input always gives the same outcome, issues in the same order.
    #[test]
    fn validation_is_deterministic(input in near_miss()) {
        prop_assert_eq!(navigation::validate(&input), navigation::validate(&input));
        prop_assert_eq!(component::validate(&input), component::validate(&input));
    }

    /// Failures always carry at least one issue with a well-formed path.
    #[test]
    fn failures_are_never_empty(input in near_miss()) {
        if let Err(issues) = navigation::validate(&input) {
            prop_assert!(!issues.is_empty());
            for issue in issues.iter() {
                prop_assert!(!issue.message.is_empty());
                prop_assert!(!issue.expected.is_empty());
            }
        }
    }
}
