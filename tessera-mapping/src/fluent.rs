//! Fluent mapping declarations.
//!
//! A declaration is a closure over a [`RootMappingDescriptor`]. Besides the
//! mapping itself it can carry the target index, the type name and the
//! ignore-conflicts flag, all of which are handed straight to submission.
//!
//! ```rust
//! use tessera_mapping::{DynamicMapping, RootMappingDescriptor, Untyped};
//!
//! let declaration = |d: RootMappingDescriptor<Untyped>| {
//!     d.type_name("post")
//!         .index_name("blog")
//!         .dynamic(DynamicMapping::Strict)
//!         .properties(|p| {
//!             p.text("title", |f| f.analyzer("english"))
//!                 .keyword("tags", |f| f.ignore_above(64))
//!                 .date("published", |f| f)
//!         })
//! };
//!
//! let descriptor = declaration(RootMappingDescriptor::new());
//! assert_eq!(descriptor.mapping().properties.len(), 3);
//! ```

use crate::builder::TypeMappingBuilder;
use crate::descriptor::Mappable;
use crate::node::{DynamicMapping, MappingNode, RootMapping};
use indexmap::IndexMap;
use std::marker::PhantomData;

/// Type parameter of declarations not tied to a Rust type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Untyped;

/// Fluent declaration of a root mapping for `T`.
pub struct RootMappingDescriptor<T = Untyped> {
    mapping: RootMapping,
    index_name: Option<String>,
    type_name: Option<String>,
    ignore_conflicts: bool,
    _type: PhantomData<fn() -> T>,
}

/// What a declaration hands to submission.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Declaration {
    pub(crate) mapping: RootMapping,
    pub(crate) index_name: Option<String>,
    pub(crate) type_name: Option<String>,
    pub(crate) ignore_conflicts: bool,
}

impl<T> Default for RootMappingDescriptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for RootMappingDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootMappingDescriptor")
            .field("mapping", &self.mapping)
            .field("index_name", &self.index_name)
            .field("type_name", &self.type_name)
            .field("ignore_conflicts", &self.ignore_conflicts)
            .finish()
    }
}

impl<T> RootMappingDescriptor<T> {
    /// Create an empty declaration.
    pub fn new() -> Self {
        Self {
            mapping: RootMapping::new(""),
            index_name: None,
            type_name: None,
            ignore_conflicts: false,
            _type: PhantomData,
        }
    }

    /// Target index. The type's default index is used when unset.
    pub fn index_name(mut self, index: impl Into<String>) -> Self {
        self.index_name = Some(index.into());
        self
    }

    /// Type name to register the mapping under.
    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.mapping.name = name.clone();
        self.type_name = Some(name);
        self
    }

    /// Accept conflicting field definitions.
    pub fn ignore_conflicts(mut self, ignore: bool) -> Self {
        self.ignore_conflicts = ignore;
        self
    }

    /// Dynamic mapping policy.
    pub fn dynamic(mut self, dynamic: DynamicMapping) -> Self {
        self.mapping.dynamic = Some(dynamic);
        self
    }

    /// Date detection for unmapped fields.
    pub fn date_detection(mut self, detect: bool) -> Self {
        self.mapping.date_detection = Some(detect);
        self
    }

    /// Numeric detection for unmapped fields.
    pub fn numeric_detection(mut self, detect: bool) -> Self {
        self.mapping.numeric_detection = Some(detect);
        self
    }

    /// Default index analyzer.
    pub fn index_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.mapping.index_analyzer = Some(analyzer.into());
        self
    }

    /// Default search analyzer.
    pub fn search_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.mapping.search_analyzer = Some(analyzer.into());
        self
    }

    /// Declare top-level fields. Fields already declared under the same name
    /// are replaced in place.
    pub fn properties<F>(mut self, declare: F) -> Self
    where
        F: FnOnce(PropertiesDescriptor) -> PropertiesDescriptor,
    {
        let properties = std::mem::take(&mut self.mapping.properties);
        self.mapping.properties = declare(PropertiesDescriptor::from_map(properties)).into_map();
        self
    }

    /// Mapping declared so far.
    pub fn mapping(&self) -> &RootMapping {
        &self.mapping
    }

    pub(crate) fn into_declaration(self) -> Declaration {
        Declaration {
            mapping: self.mapping,
            index_name: self.index_name.filter(|index| !index.is_empty()),
            type_name: self.type_name.filter(|name| !name.is_empty()),
            ignore_conflicts: self.ignore_conflicts,
        }
    }
}

impl<T: Mappable> RootMappingDescriptor<T> {
    /// Seed the properties from `T`'s inferred mapping.
    ///
    /// Fields declared explicitly, before or after this call, win over the
    /// inferred ones. Root attributes already set are kept.
    pub fn map_from_attributes(mut self, max_recursion: usize) -> Self {
        let inferred = TypeMappingBuilder::new(max_recursion).build_for::<T>(&self.mapping.name);

        let mut properties = inferred.properties;
        for (name, node) in std::mem::take(&mut self.mapping.properties) {
            properties.insert(name, node);
        }
        self.mapping.properties = properties;

        let mapping = &mut self.mapping;
        mapping.dynamic = mapping.dynamic.or(inferred.dynamic);
        mapping.date_detection = mapping.date_detection.or(inferred.date_detection);
        mapping.numeric_detection = mapping.numeric_detection.or(inferred.numeric_detection);
        if mapping.index_analyzer.is_none() {
            mapping.index_analyzer = inferred.index_analyzer;
        }
        if mapping.search_analyzer.is_none() {
            mapping.search_analyzer = inferred.search_analyzer;
        }
        self
    }
}

/// Field declarations of one object level.
#[derive(Debug, Clone, Default)]
pub struct PropertiesDescriptor {
    properties: IndexMap<String, MappingNode>,
}

impl PropertiesDescriptor {
    /// Create an empty level.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_map(properties: IndexMap<String, MappingNode>) -> Self {
        Self { properties }
    }

    fn into_map(self) -> IndexMap<String, MappingNode> {
        self.properties
    }

    /// Declare a field from a prepared node.
    pub fn field(mut self, name: impl Into<String>, node: MappingNode) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), node.named(name));
        self
    }

    fn configured<F>(self, name: impl Into<String>, base: MappingNode, configure: F) -> Self
    where
        F: FnOnce(MappingNode) -> MappingNode,
    {
        self.field(name, configure(base))
    }

    /// Declare a text field.
    pub fn text<F>(self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(MappingNode) -> MappingNode,
    {
        self.configured(name, MappingNode::text(), configure)
    }

    /// Declare a keyword field.
    pub fn keyword<F>(self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(MappingNode) -> MappingNode,
    {
        self.configured(name, MappingNode::keyword(), configure)
    }

    /// Declare a date field. The default date format applies unless
    /// `configure` sets another.
    pub fn date<F>(self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(MappingNode) -> MappingNode,
    {
        self.configured(name, MappingNode::date(), configure)
    }

    /// Declare a long field.
    pub fn long<F>(self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(MappingNode) -> MappingNode,
    {
        self.configured(name, MappingNode::long(), configure)
    }

    /// Declare a double field.
    pub fn double<F>(self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(MappingNode) -> MappingNode,
    {
        self.configured(name, MappingNode::double(), configure)
    }

    /// Declare a boolean field.
    pub fn boolean<F>(self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(MappingNode) -> MappingNode,
    {
        self.configured(name, MappingNode::boolean(), configure)
    }

    /// Declare a binary field.
    pub fn binary<F>(self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(MappingNode) -> MappingNode,
    {
        self.configured(name, MappingNode::binary(), configure)
    }

    /// Declare an object field with its own properties.
    pub fn object<F>(self, name: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(PropertiesDescriptor) -> PropertiesDescriptor,
    {
        let properties = declare(PropertiesDescriptor::new()).into_map();
        self.field(name, MappingNode::object(properties))
    }

    /// Declare a nested field with its own properties.
    pub fn nested<F>(self, name: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(PropertiesDescriptor) -> PropertiesDescriptor,
    {
        let properties = declare(PropertiesDescriptor::new()).into_map();
        self.field(name, MappingNode::nested(properties))
    }

    /// Declare an array of `element`.
    pub fn array(self, name: impl Into<String>, element: MappingNode) -> Self {
        self.field(name, MappingNode::array(element))
    }

    /// Declared fields so far.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{TypeAttributes, TypeDescriptor, TypeShape};
    use crate::node::{DEFAULT_DATE_FORMAT, IndexOption};
    use serde_json::json;

    struct Article;

    impl Mappable for Article {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Article>("Article")
                .member("title", TypeShape::Text)
                .member("views", TypeShape::Integral)
                .member("published", TypeShape::Date)
                .with_attributes(TypeAttributes {
                    dynamic: Some(DynamicMapping::Disabled),
                    ..Default::default()
                })
        }
    }

    #[test]
    fn test_declaration_carries_submission_options() {
        let descriptor = RootMappingDescriptor::<Untyped>::new()
            .index_name("blog")
            .type_name("post")
            .ignore_conflicts(true)
            .properties(|p| p.keyword("slug", |f| f));

        let declaration = descriptor.into_declaration();
        assert_eq!(declaration.index_name.as_deref(), Some("blog"));
        assert_eq!(declaration.type_name.as_deref(), Some("post"));
        assert!(declaration.ignore_conflicts);
        assert_eq!(declaration.mapping.name, "post");
    }

    #[test]
    fn test_empty_names_are_unset() {
        let declaration = RootMappingDescriptor::<Untyped>::new()
            .index_name("")
            .type_name("")
            .into_declaration();
        assert!(declaration.index_name.is_none());
        assert!(declaration.type_name.is_none());
    }

    #[test]
    fn test_nested_declarations_serialize_in_order() {
        let descriptor = RootMappingDescriptor::<Untyped>::new()
            .type_name("order")
            .properties(|p| {
                p.keyword("id", |f| f.index(IndexOption::NotAnalyzed))
                    .nested("lines", |l| l.keyword("sku", |f| f).long("quantity", |f| f))
                    .object("customer", |c| c.text("name", |f| f))
                    .array("notes", MappingNode::text())
            });

        assert_eq!(
            descriptor.mapping().to_document("order"),
            json!({"order": {"properties": {
                "id": {"type": "keyword", "index": "not_analyzed"},
                "lines": {"type": "nested", "properties": {
                    "sku": {"type": "keyword"},
                    "quantity": {"type": "long"}
                }},
                "customer": {"type": "object", "properties": {"name": {"type": "text"}}},
                "notes": {"type": "text"}
            }}})
        );
    }

    #[test]
    fn test_map_from_attributes_seeds_and_explicit_fields_win() {
        let descriptor = RootMappingDescriptor::<Article>::new()
            .properties(|p| p.keyword("title", |f| f.ignore_above(128)))
            .map_from_attributes(0)
            .properties(|p| p.text("summary", |f| f));

        let mapping = descriptor.mapping();
        let names: Vec<&str> = mapping.properties.keys().map(String::as_str).collect();
        assert_eq!(names, ["title", "views", "published", "summary"]);
        assert_eq!(
            mapping.properties["title"].to_json(),
            json!({"type": "keyword", "ignore_above": 128})
        );
        assert_eq!(
            mapping.properties["published"].attributes.format.as_deref(),
            Some(DEFAULT_DATE_FORMAT)
        );
        assert_eq!(mapping.dynamic, Some(DynamicMapping::Disabled));
    }

    #[test]
    fn test_explicit_root_attributes_survive_inference() {
        let descriptor = RootMappingDescriptor::<Article>::new()
            .dynamic(DynamicMapping::Strict)
            .map_from_attributes(0);
        assert_eq!(descriptor.mapping().dynamic, Some(DynamicMapping::Strict));
    }
}
