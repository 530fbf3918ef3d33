//! The AST's JSON shape is part of the layer-2 cache contract (any
//! `PersistentStore` reads back whatever a previous process wrote), so the
//! `#[serde(tag = "type")]` encoding of every node variant is covered here
//! directly rather than only through round-trips inside `cache.rs`.

use pcrekit_core::ast::{AnchorKind, CharTypeKind, Node, Span};
use pcrekit_core::{Config, Facade};

#[test]
fn literal_tags_as_its_variant_name() {
    let node = Node::literal("abc", Span::new(0, 3));
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["type"], "Literal");
    assert_eq!(json["value"], "abc");
}

#[test]
fn anchor_kind_round_trips() {
    let node = Node::Anchor(pcrekit_core::ast::Anchor {
        at: AnchorKind::Start,
        span: Span::point(0),
    });
    let json = serde_json::to_string(&node).unwrap();
    let back: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(node, back);
}

#[test]
fn char_type_kind_round_trips() {
    let node = Node::CharType(pcrekit_core::ast::CharType {
        kind: CharTypeKind::BigW,
        span: Span::new(0, 2),
    });
    let json = serde_json::to_string(&node).unwrap();
    let back: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(node, back);
}

#[test]
fn a_full_parsed_tree_round_trips_through_json() {
    let facade = Facade::new(Config::default());
    let parsed = facade.parse("/(?<tag>\\w+)*[a-z-]+/i").unwrap();
    let json = serde_json::to_string(&*parsed.pattern).unwrap();
    let back: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(*parsed.pattern, back);
}

#[test]
fn unknown_tag_fails_to_deserialize() {
    let json = r#"{"type":"NotARealNode","span":{"start":0,"end":1}}"#;
    let result: Result<Node, _> = serde_json::from_str(json);
    assert!(result.is_err());
}
