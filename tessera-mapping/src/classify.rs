//! Field classification.
//!
//! Turns one member descriptor into a mapping node. Scalars map directly,
//! collections wrap their element's node, and object members are expanded
//! through the builder when the recursion guard allows it.

use crate::builder::map_members;
use crate::descriptor::{MemberDescriptor, TypeDescriptor, TypeShape};
use crate::guard::RecursionState;
use crate::node::{DEFAULT_DATE_FORMAT, FieldKind, MappingNode};
use tessera_log::debug;

/// Classify `member`. Never fails: anything unrecognized becomes an object.
pub fn classify(member: &MemberDescriptor, state: &mut RecursionState) -> MappingNode {
    let name = member.mapped_name().to_string();
    let overrides = &member.overrides;

    // Arrays are implicit on the wire, so overrides describe the element.
    let mut shape = &member.shape;
    let mut nesting = 0usize;
    while let TypeShape::Collection(element) = shape {
        shape = element.as_ref();
        nesting += 1;
    }

    let mut node = classify_shape(shape, overrides.kind, state);

    match overrides.kind {
        Some(FieldKind::Array) if nesting == 0 => nesting = 1,
        Some(FieldKind::Array) | None => {}
        Some(kind) => node.kind = kind,
    }

    // A scalar declared as a composite has no structure to expand, which is
    // not the same as a structure the guard cut short.
    if node.kind.is_composite() && !matches!(shape, TypeShape::Object(_)) {
        node.properties.get_or_insert_with(Default::default);
    }

    node.attributes.merge_from(&overrides.attributes);

    if node.kind == FieldKind::Date && node.attributes.format.is_none() {
        node.attributes.format = Some(DEFAULT_DATE_FORMAT.to_string());
    }

    let mut node = node.named(name.clone());
    for _ in 0..nesting {
        node = MappingNode::array(node).named(name.clone());
    }
    node
}

fn classify_shape(
    shape: &TypeShape,
    kind_override: Option<FieldKind>,
    state: &mut RecursionState,
) -> MappingNode {
    match shape {
        TypeShape::Text => MappingNode::of_kind(FieldKind::Text),
        TypeShape::Date => MappingNode::of_kind(FieldKind::Date),
        TypeShape::Integral => MappingNode::of_kind(FieldKind::Long),
        TypeShape::Floating => MappingNode::of_kind(FieldKind::Double),
        TypeShape::Boolean => MappingNode::of_kind(FieldKind::Boolean),
        TypeShape::Binary => MappingNode::of_kind(FieldKind::Binary),
        TypeShape::Collection(element) => {
            MappingNode::array(classify_shape(element, kind_override, state))
        }
        TypeShape::Object(describe) => match kind_override {
            // Declared as a scalar: keep the field, skip the structure.
            Some(kind) if !kind.is_composite() && kind != FieldKind::Array => {
                MappingNode::of_kind(kind)
            }
            Some(FieldKind::Nested) => expand(&describe(), FieldKind::Nested, state),
            _ => expand(&describe(), FieldKind::Object, state),
        },
    }
}

fn expand(descriptor: &TypeDescriptor, kind: FieldKind, state: &mut RecursionState) -> MappingNode {
    if !state.should_expand(descriptor) {
        debug!(
            target: "tessera::classify",
            "Truncating {} at depth {}",
            descriptor.name(),
            state.depth()
        );
        return MappingNode::stub(kind);
    }

    let mut scope = state.enter(descriptor);
    let properties = map_members(descriptor, &mut scope);

    MappingNode {
        properties: Some(properties),
        ..MappingNode::of_kind(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldOverrides;
    use crate::guard::UNBOUNDED;
    use crate::node::{FieldAttributes, IndexOption};
    use serde_json::json;

    fn author() -> TypeDescriptor {
        TypeDescriptor::new("Author", "test::Author")
            .member("name", TypeShape::Text)
            .member("born", TypeShape::Date)
    }

    fn classify_root(member: MemberDescriptor) -> MappingNode {
        let root = TypeDescriptor::new("Root", "test::Root");
        let mut state = RecursionState::rooted_at(&root, UNBOUNDED);
        classify(&member, &mut state)
    }

    #[test]
    fn test_primitive_kinds() {
        let cases = [
            (TypeShape::Text, FieldKind::Text),
            (TypeShape::Date, FieldKind::Date),
            (TypeShape::Integral, FieldKind::Long),
            (TypeShape::Floating, FieldKind::Double),
            (TypeShape::Boolean, FieldKind::Boolean),
            (TypeShape::Binary, FieldKind::Binary),
        ];

        for (shape, kind) in cases {
            let node = classify_root(MemberDescriptor::new("f", shape));
            assert_eq!(node.kind, kind);
            assert_eq!(node.name, "f");
        }
    }

    #[test]
    fn test_date_gets_default_format() {
        let node = classify_root(MemberDescriptor::new("created", TypeShape::Date));
        assert_eq!(node.to_json(), json!({"type": "date", "format": DEFAULT_DATE_FORMAT}));
    }

    #[test]
    fn test_overrides_win() {
        let member = MemberDescriptor::new("created", TypeShape::Date).overrides(FieldOverrides {
            name: Some("created_at".to_string()),
            attributes: FieldAttributes {
                format: Some("yyyy-MM-dd".to_string()),
                store: Some(true),
                ..Default::default()
            },
            ..Default::default()
        });

        let node = classify_root(member);
        assert_eq!(node.name, "created_at");
        assert_eq!(
            node.to_json(),
            json!({"type": "date", "format": "yyyy-MM-dd", "store": true})
        );
    }

    #[test]
    fn test_kind_override_drops_default_date_format() {
        let member = MemberDescriptor::new("stamp", TypeShape::Date).overrides(FieldOverrides {
            kind: Some(FieldKind::Keyword),
            ..Default::default()
        });
        assert_eq!(classify_root(member).to_json(), json!({"type": "keyword"}));
    }

    #[test]
    fn test_collection_wraps_element_and_overrides_apply_to_element() {
        let member = MemberDescriptor::new("tags", TypeShape::collection(TypeShape::Text))
            .overrides(FieldOverrides {
                attributes: FieldAttributes {
                    index: Some(IndexOption::NotAnalyzed),
                    ..Default::default()
                },
                ..Default::default()
            });

        let node = classify_root(member);
        assert_eq!(node.kind, FieldKind::Array);
        assert_eq!(node.leaf().kind, FieldKind::Text);
        assert_eq!(node.to_json(), json!({"type": "text", "index": "not_analyzed"}));
    }

    #[test]
    fn test_collection_of_objects_expands_element() {
        let node = classify_root(MemberDescriptor::new(
            "authors",
            TypeShape::collection(TypeShape::Object(author)),
        ));

        let leaf = node.leaf();
        assert_eq!(leaf.kind, FieldKind::Object);
        let properties = leaf.properties.as_ref().expect("expanded");
        assert_eq!(properties.keys().collect::<Vec<_>>(), ["name", "born"]);
    }

    #[test]
    fn test_nested_override_keeps_expansion() {
        let member = MemberDescriptor::new("author", TypeShape::Object(author)).overrides(
            FieldOverrides {
                kind: Some(FieldKind::Nested),
                ..Default::default()
            },
        );

        let node = classify_root(member);
        assert_eq!(node.kind, FieldKind::Nested);
        assert_eq!(node.properties.as_ref().map(|p| p.len()), Some(2));
    }

    #[test]
    fn test_scalar_override_on_object_skips_expansion() {
        let member = MemberDescriptor::new("author", TypeShape::Object(author)).overrides(
            FieldOverrides {
                kind: Some(FieldKind::Keyword),
                ..Default::default()
            },
        );
        assert_eq!(classify_root(member).to_json(), json!({"type": "keyword"}));
    }

    #[test]
    fn test_composite_override_on_scalar_is_not_truncated() {
        for kind in [FieldKind::Object, FieldKind::Nested] {
            let member = MemberDescriptor::new("labels", TypeShape::Text).overrides(FieldOverrides {
                kind: Some(kind),
                ..Default::default()
            });

            let node = classify_root(member);
            assert_eq!(node.kind, kind);
            assert!(!node.is_truncated());
            assert_eq!(
                node.to_json(),
                json!({"type": kind.as_str(), "properties": {}})
            );
        }
    }

    #[test]
    fn test_classify_leaves_state_untouched() {
        let root = TypeDescriptor::new("Root", "test::Root");
        let mut state = RecursionState::rooted_at(&root, UNBOUNDED);
        classify(&MemberDescriptor::new("author", TypeShape::Object(author)), &mut state);

        assert_eq!(state.depth(), 0);
        assert_eq!(state.path().len(), 1);
    }
}
