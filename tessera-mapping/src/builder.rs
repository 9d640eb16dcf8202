//! Type mapping builder.
//!
//! Walks a type depth-first in member declaration order, classifying each
//! member and expanding object members as far as the recursion guard allows.

use crate::classify::classify;
use crate::descriptor::{Mappable, TypeDescriptor};
use crate::guard::{RecursionState, UNBOUNDED};
use crate::node::{MappingNode, RootMapping};
use indexmap::IndexMap;
use tessera_log::{debug, trace, warn};

/// Builds root mappings from type descriptors.
#[derive(Debug, Clone, Copy)]
pub struct TypeMappingBuilder {
    max_recursion: usize,
}

impl Default for TypeMappingBuilder {
    fn default() -> Self {
        Self::new(UNBOUNDED)
    }
}

impl TypeMappingBuilder {
    /// Create a builder. A `max_recursion` of 0 leaves only cycle detection
    /// in place.
    pub fn new(max_recursion: usize) -> Self {
        Self { max_recursion }
    }

    /// Configured bound.
    pub fn max_recursion(&self) -> usize {
        self.max_recursion
    }

    /// Infer the mapping of `descriptor`, registered as `type_name`.
    pub fn build(&self, descriptor: &TypeDescriptor, type_name: &str) -> RootMapping {
        debug!(
            "Building mapping for {} as '{}' (max recursion {})",
            descriptor.name(),
            type_name,
            self.max_recursion
        );

        let mut state = RecursionState::rooted_at(descriptor, self.max_recursion);
        let properties = map_members(descriptor, &mut state);
        let attributes = descriptor.attributes();

        RootMapping {
            properties,
            dynamic: attributes.dynamic,
            date_detection: attributes.date_detection,
            numeric_detection: attributes.numeric_detection,
            index_analyzer: attributes.index_analyzer.clone(),
            search_analyzer: attributes.search_analyzer.clone(),
            ..RootMapping::new(type_name)
        }
    }

    /// Infer the mapping of `T`.
    pub fn build_for<T: Mappable>(&self, type_name: &str) -> RootMapping {
        self.build(&T::descriptor(), type_name)
    }
}

/// Infer the mapping of `descriptor` with the given recursion bound.
pub fn build(descriptor: &TypeDescriptor, type_name: &str, max_recursion: usize) -> RootMapping {
    TypeMappingBuilder::new(max_recursion).build(descriptor, type_name)
}

/// Classify every member of `descriptor` in declaration order.
pub(crate) fn map_members(
    descriptor: &TypeDescriptor,
    state: &mut RecursionState,
) -> IndexMap<String, MappingNode> {
    let mut properties = IndexMap::with_capacity(descriptor.members().len());

    for member in descriptor.members() {
        if member.overrides.opt_out {
            trace!("{}.{} opted out of the mapping", descriptor.name(), member.name);
            continue;
        }

        let node = classify(member, state);
        if properties.contains_key(&node.name) {
            warn!(
                "{} maps more than one member to '{}'; the last one wins",
                descriptor.name(),
                node.name
            );
        }
        properties.insert(node.name.clone(), node);
    }

    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldOverrides, MemberDescriptor, TypeAttributes, TypeShape};
    use crate::node::{DynamicMapping, FieldKind};
    use serde_json::json;

    fn names(properties: &IndexMap<String, MappingNode>) -> Vec<&str> {
        properties.keys().map(String::as_str).collect()
    }

    // Self-referencing type.
    fn category() -> TypeDescriptor {
        TypeDescriptor::new("Category", "test::Category")
            .member("label", TypeShape::Text)
            .member("parent", TypeShape::Object(category))
    }

    // Mutual cycle: Person -> Company -> Person.
    fn person() -> TypeDescriptor {
        TypeDescriptor::new("Person", "test::Person")
            .member("name", TypeShape::Text)
            .member("employer", TypeShape::Object(company))
    }

    fn company() -> TypeDescriptor {
        TypeDescriptor::new("Company", "test::Company")
            .member("title", TypeShape::Text)
            .member("ceo", TypeShape::Object(person))
    }

    fn address() -> TypeDescriptor {
        TypeDescriptor::new("Address", "test::Address").member("city", TypeShape::Text)
    }

    fn customer() -> TypeDescriptor {
        TypeDescriptor::new("Customer", "test::Customer")
            .member("a", TypeShape::Text)
            .member("b", TypeShape::Integral)
            .member("c", TypeShape::Object(address))
    }

    // Chain L0 -> L1 -> ... -> L5 of distinct types.
    fn level(n: usize) -> TypeDescriptor {
        const NEXT: [fn() -> TypeDescriptor; 5] = [l1, l2, l3, l4, l5];
        let descriptor = TypeDescriptor::new(format!("L{}", n), format!("test::L{}", n))
            .member("depth", TypeShape::Integral);
        match NEXT.get(n) {
            Some(next) => descriptor.member("next", TypeShape::Object(*next)),
            None => descriptor,
        }
    }
    fn l0() -> TypeDescriptor {
        level(0)
    }
    fn l1() -> TypeDescriptor {
        level(1)
    }
    fn l2() -> TypeDescriptor {
        level(2)
    }
    fn l3() -> TypeDescriptor {
        level(3)
    }
    fn l4() -> TypeDescriptor {
        level(4)
    }
    fn l5() -> TypeDescriptor {
        level(5)
    }

    /// Depth (below the root) of the first truncated `next`, if any.
    fn truncation_depth(root: &RootMapping) -> Option<usize> {
        let mut current = root.properties.get("next");
        let mut depth = 1;
        while let Some(node) = current {
            match &node.properties {
                None => return Some(depth),
                Some(properties) => current = properties.get("next"),
            }
            depth += 1;
        }
        None
    }

    #[test]
    fn test_member_order_follows_declaration() {
        let root = build(&customer(), "customer", UNBOUNDED);
        assert_eq!(root.name, "customer");
        assert_eq!(names(&root.properties), ["a", "b", "c"]);
    }

    #[test]
    fn test_self_reference_is_truncated_regardless_of_bound() {
        for max in [UNBOUNDED, 1, 5] {
            let root = build(&category(), "category", max);
            let parent = &root.properties["parent"];
            assert_eq!(parent.kind, FieldKind::Object);
            assert!(parent.is_truncated(), "max_recursion {}", max);
        }
    }

    #[test]
    fn test_mutual_cycle_truncates_second_occurrence() {
        let root = build(&person(), "person", UNBOUNDED);

        let employer = &root.properties["employer"];
        let employer_props = employer.properties.as_ref().expect("company expanded");
        assert_eq!(names(employer_props), ["title", "ceo"]);
        assert!(employer_props["ceo"].is_truncated());
    }

    #[test]
    fn test_unbounded_expands_nested_objects() {
        let root = build(&customer(), "customer", UNBOUNDED);
        let address = &root.properties["c"];
        assert_eq!(
            address.to_json(),
            json!({"type": "object", "properties": {"city": {"type": "text"}}})
        );
    }

    #[test]
    fn test_unbounded_expands_acyclic_chain_fully() {
        let root = build(&l0(), "l0", UNBOUNDED);
        assert_eq!(truncation_depth(&root), None);
    }

    #[test]
    fn test_bound_truncates_chain_at_n_plus_one() {
        // A chain of N + 2 types: L0 (root) through L(N + 1).
        for n in 1..=4 {
            let root = build(&l0(), "l0", n);
            assert_eq!(truncation_depth(&root), Some(n + 1), "max_recursion {}", n);
        }
    }

    #[test]
    fn test_opt_out_members_are_skipped() {
        let descriptor = TypeDescriptor::new("Secret", "test::Secret")
            .member("visible", TypeShape::Text)
            .with_member(MemberDescriptor::new("hidden", TypeShape::Text).overrides(
                FieldOverrides {
                    opt_out: true,
                    ..Default::default()
                },
            ))
            .member("unannotated", TypeShape::Boolean);

        let root = build(&descriptor, "secret", UNBOUNDED);
        assert_eq!(names(&root.properties), ["visible", "unannotated"]);
    }

    #[test]
    fn test_type_attributes_reach_root() {
        let descriptor = customer().with_attributes(TypeAttributes {
            dynamic: Some(DynamicMapping::Strict),
            date_detection: Some(false),
            search_analyzer: Some("standard".to_string()),
            ..Default::default()
        });

        let json = build(&descriptor, "customer", UNBOUNDED).to_json();
        assert_eq!(json["dynamic"], "strict");
        assert_eq!(json["date_detection"], false);
        assert_eq!(json["search_analyzer"], "standard");
        assert!(json.get("numeric_detection").is_none());
    }

    #[test]
    fn test_builds_are_independent() {
        let builder = TypeMappingBuilder::new(2);
        let first = builder.build(&person(), "person");
        let second = builder.build(&person(), "person");
        assert_eq!(first, second);
    }
}
