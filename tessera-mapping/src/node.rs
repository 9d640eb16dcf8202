//! Mapping document tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Date format emitted for date fields that don't specify one.
pub const DEFAULT_DATE_FORMAT: &str = "strict_date_optional_time||epoch_millis";

/// Wire-format field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Full-text searchable field.
    Text,
    /// Exact match keyword field.
    Keyword,
    /// Date.
    Date,
    /// 64-bit integer.
    Long,
    /// Double precision float.
    Double,
    /// Boolean.
    Boolean,
    /// Base64 binary data.
    Binary,
    /// Object with its own properties.
    Object,
    /// Object indexed as a separate hidden document.
    Nested,
    /// Collection of the element node's kind.
    Array,
}

impl FieldKind {
    /// Name used in the `type` key. `Array` has none of its own.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Keyword => "keyword",
            FieldKind::Date => "date",
            FieldKind::Long => "long",
            FieldKind::Double => "double",
            FieldKind::Boolean => "boolean",
            FieldKind::Binary => "binary",
            FieldKind::Object => "object",
            FieldKind::Nested => "nested",
            FieldKind::Array => "array",
        }
    }

    /// Object and nested kinds carry properties.
    pub fn is_composite(&self) -> bool {
        matches!(self, FieldKind::Object | FieldKind::Nested)
    }
}

/// Per-field index option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOption {
    /// Run the value through an analyzer.
    Analyzed,
    /// Index the value verbatim.
    NotAnalyzed,
    /// Don't index the field at all.
    No,
}

impl IndexOption {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexOption::Analyzed => "analyzed",
            IndexOption::NotAnalyzed => "not_analyzed",
            IndexOption::No => "no",
        }
    }
}

/// Handling of fields absent from the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicMapping {
    /// Add unknown fields to the mapping.
    Enabled,
    /// Keep unknown fields in `_source` without indexing them.
    Disabled,
    /// Reject documents with unknown fields.
    Strict,
}

impl DynamicMapping {
    fn to_json(self) -> Value {
        match self {
            DynamicMapping::Enabled => json!(true),
            DynamicMapping::Disabled => json!(false),
            DynamicMapping::Strict => json!("strict"),
        }
    }
}

/// Kind-specific field attributes. `None` means "leave to the engine".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldAttributes {
    /// Date format.
    pub format: Option<String>,
    /// Index option.
    pub index: Option<IndexOption>,
    /// Store the value separately from `_source`.
    pub store: Option<bool>,
    /// Analyzer used at index and search time.
    pub analyzer: Option<String>,
    /// Analyzer used at index time.
    pub index_analyzer: Option<String>,
    /// Analyzer used at search time.
    pub search_analyzer: Option<String>,
    /// Strings longer than this aren't indexed.
    pub ignore_above: Option<u32>,
    /// Value indexed in place of an explicit null.
    pub null_value: Option<Value>,
    /// Index-time boost.
    pub boost: Option<f64>,
    /// Copy the field into `_all`.
    pub include_in_all: Option<bool>,
}

impl FieldAttributes {
    /// Overwrite every attribute `other` specifies.
    pub fn merge_from(&mut self, other: &FieldAttributes) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        take(&mut self.format, &other.format);
        take(&mut self.index, &other.index);
        take(&mut self.store, &other.store);
        take(&mut self.analyzer, &other.analyzer);
        take(&mut self.index_analyzer, &other.index_analyzer);
        take(&mut self.search_analyzer, &other.search_analyzer);
        take(&mut self.ignore_above, &other.ignore_above);
        take(&mut self.null_value, &other.null_value);
        take(&mut self.boost, &other.boost);
        take(&mut self.include_in_all, &other.include_in_all);
    }

    fn write_json(&self, field: &mut serde_json::Map<String, Value>) {
        if let Some(format) = &self.format {
            field.insert("format".to_string(), json!(format));
        }
        if let Some(index) = self.index {
            field.insert("index".to_string(), json!(index.as_str()));
        }
        if let Some(store) = self.store {
            field.insert("store".to_string(), json!(store));
        }
        if let Some(analyzer) = &self.analyzer {
            field.insert("analyzer".to_string(), json!(analyzer));
        }
        if let Some(analyzer) = &self.index_analyzer {
            field.insert("index_analyzer".to_string(), json!(analyzer));
        }
        if let Some(analyzer) = &self.search_analyzer {
            field.insert("search_analyzer".to_string(), json!(analyzer));
        }
        if let Some(limit) = self.ignore_above {
            field.insert("ignore_above".to_string(), json!(limit));
        }
        if let Some(null_value) = &self.null_value {
            field.insert("null_value".to_string(), null_value.clone());
        }
        if let Some(boost) = self.boost {
            field.insert("boost".to_string(), json!(boost));
        }
        if let Some(include) = self.include_in_all {
            field.insert("include_in_all".to_string(), json!(include));
        }
    }
}

/// One field of a mapping document.
///
/// Object and nested nodes hold their children in `properties`, in insertion
/// order. A composite node without properties is a truncated stub: the field
/// is declared but its structure was not expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingNode {
    /// Field name. Set when the node is inserted into a parent.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Kind-specific attributes.
    pub attributes: FieldAttributes,
    /// Child fields of object/nested nodes.
    pub properties: Option<IndexMap<String, MappingNode>>,
    /// Element node of an array.
    pub element: Option<Box<MappingNode>>,
}

impl MappingNode {
    /// Create a node of the given kind with no attributes.
    pub fn of_kind(kind: FieldKind) -> Self {
        Self {
            name: String::new(),
            kind,
            attributes: FieldAttributes::default(),
            properties: None,
            element: None,
        }
    }

    /// Create a new text field.
    pub fn text() -> Self {
        Self::of_kind(FieldKind::Text)
    }

    /// Create a new keyword field.
    pub fn keyword() -> Self {
        Self::of_kind(FieldKind::Keyword)
    }

    /// Create a new date field with [`DEFAULT_DATE_FORMAT`].
    pub fn date() -> Self {
        Self::of_kind(FieldKind::Date).format(DEFAULT_DATE_FORMAT)
    }

    /// Create a new long field.
    pub fn long() -> Self {
        Self::of_kind(FieldKind::Long)
    }

    /// Create a new double field.
    pub fn double() -> Self {
        Self::of_kind(FieldKind::Double)
    }

    /// Create a new boolean field.
    pub fn boolean() -> Self {
        Self::of_kind(FieldKind::Boolean)
    }

    /// Create a new binary field.
    pub fn binary() -> Self {
        Self::of_kind(FieldKind::Binary)
    }

    /// Create an object field with the given children.
    pub fn object(properties: IndexMap<String, MappingNode>) -> Self {
        Self {
            properties: Some(properties),
            ..Self::of_kind(FieldKind::Object)
        }
    }

    /// Create a nested field with the given children.
    pub fn nested(properties: IndexMap<String, MappingNode>) -> Self {
        Self {
            properties: Some(properties),
            ..Self::of_kind(FieldKind::Nested)
        }
    }

    /// Create an array of `element`.
    pub fn array(element: MappingNode) -> Self {
        Self {
            element: Some(Box::new(element)),
            ..Self::of_kind(FieldKind::Array)
        }
    }

    /// Create a property-less composite node.
    pub fn stub(kind: FieldKind) -> Self {
        Self::of_kind(kind)
    }

    /// Set the field name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set date format.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.attributes.format = Some(format.into());
        self
    }

    /// Set index option.
    pub fn index(mut self, index: IndexOption) -> Self {
        self.attributes.index = Some(index);
        self
    }

    /// Set whether the value is stored.
    pub fn store(mut self, store: bool) -> Self {
        self.attributes.store = Some(store);
        self
    }

    /// Set analyzer.
    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.attributes.analyzer = Some(analyzer.into());
        self
    }

    /// Set index analyzer.
    pub fn index_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.attributes.index_analyzer = Some(analyzer.into());
        self
    }

    /// Set search analyzer.
    pub fn search_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.attributes.search_analyzer = Some(analyzer.into());
        self
    }

    /// Set ignore-above length.
    pub fn ignore_above(mut self, limit: u32) -> Self {
        self.attributes.ignore_above = Some(limit);
        self
    }

    /// Set null value.
    pub fn null_value(mut self, value: impl Into<Value>) -> Self {
        self.attributes.null_value = Some(value.into());
        self
    }

    /// Set boost.
    pub fn boost(mut self, boost: f64) -> Self {
        self.attributes.boost = Some(boost);
        self
    }

    /// Set whether the field is copied into `_all`.
    pub fn include_in_all(mut self, include: bool) -> Self {
        self.attributes.include_in_all = Some(include);
        self
    }

    /// Add a child property, turning the node into a composite if needed.
    pub fn property(mut self, name: impl Into<String>, field: MappingNode) -> Self {
        let name = name.into();
        self.properties
            .get_or_insert_with(IndexMap::new)
            .insert(name.clone(), field.named(name));
        self
    }

    /// Whether this is a composite node whose expansion was cut short.
    pub fn is_truncated(&self) -> bool {
        self.kind.is_composite() && self.properties.is_none()
    }

    /// The innermost non-array node.
    pub fn leaf(&self) -> &MappingNode {
        match (&self.kind, &self.element) {
            (FieldKind::Array, Some(element)) => element.leaf(),
            _ => self,
        }
    }

    /// Field-definition object. Arrays are implicit on the wire, so an array
    /// node serializes as its element.
    pub fn to_json(&self) -> Value {
        if let (FieldKind::Array, Some(element)) = (&self.kind, &self.element) {
            return element.to_json();
        }

        let mut field = serde_json::Map::new();

        field.insert("type".to_string(), json!(self.kind.as_str()));
        self.attributes.write_json(&mut field);

        if let Some(properties) = &self.properties {
            field.insert("properties".to_string(), properties_to_json(properties));
        }

        Value::Object(field)
    }
}

pub(crate) fn properties_to_json(properties: &IndexMap<String, MappingNode>) -> Value {
    let mut props = serde_json::Map::new();
    for (name, prop) in properties {
        props.insert(name.clone(), prop.to_json());
    }
    Value::Object(props)
}

/// A complete type mapping: the root object's fields, root-level settings
/// and the options it is submitted with.
#[derive(Debug, Clone, PartialEq)]
pub struct RootMapping {
    /// Type name embedded in the mapping.
    pub name: String,
    /// Top-level fields in insertion order.
    pub properties: IndexMap<String, MappingNode>,
    /// Dynamic mapping policy.
    pub dynamic: Option<DynamicMapping>,
    /// Detect dates in unmapped string fields.
    pub date_detection: Option<bool>,
    /// Detect numbers in unmapped string fields.
    pub numeric_detection: Option<bool>,
    /// Default index analyzer for the type.
    pub index_analyzer: Option<String>,
    /// Default search analyzer for the type.
    pub search_analyzer: Option<String>,
    /// Target index; the default index is used when absent.
    pub index: Option<String>,
    /// Type name to submit under instead of `name`.
    pub type_name: Option<String>,
    /// Ask the engine to accept conflicting field definitions.
    pub ignore_conflicts: bool,
}

impl RootMapping {
    /// Create an empty mapping for `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            name: type_name.into(),
            properties: IndexMap::new(),
            dynamic: None,
            date_detection: None,
            numeric_detection: None,
            index_analyzer: None,
            search_analyzer: None,
            index: None,
            type_name: None,
            ignore_conflicts: false,
        }
    }

    /// Add a top-level field.
    pub fn field(mut self, name: impl Into<String>, field: MappingNode) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), field.named(name));
        self
    }

    /// Set dynamic mapping.
    pub fn dynamic(mut self, dynamic: DynamicMapping) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    /// The root as an object node named after the type.
    pub fn as_node(&self) -> MappingNode {
        MappingNode::object(self.properties.clone()).named(self.name.clone())
    }

    /// Mapping body without the type-name wrapper.
    pub fn to_json(&self) -> Value {
        let mut mapping = serde_json::Map::new();

        if let Some(dynamic) = self.dynamic {
            mapping.insert("dynamic".to_string(), dynamic.to_json());
        }
        if let Some(detect) = self.date_detection {
            mapping.insert("date_detection".to_string(), json!(detect));
        }
        if let Some(detect) = self.numeric_detection {
            mapping.insert("numeric_detection".to_string(), json!(detect));
        }
        if let Some(analyzer) = &self.index_analyzer {
            mapping.insert("index_analyzer".to_string(), json!(analyzer));
        }
        if let Some(analyzer) = &self.search_analyzer {
            mapping.insert("search_analyzer".to_string(), json!(analyzer));
        }

        mapping.insert("properties".to_string(), properties_to_json(&self.properties));

        Value::Object(mapping)
    }

    /// Full mapping document: `{ "<type_name>": { ... } }`.
    pub fn to_document(&self, type_name: &str) -> Value {
        let mut document = serde_json::Map::new();
        document.insert(type_name.to_string(), self.to_json());
        Value::Object(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_field_json() {
        let field = MappingNode::text()
            .index(IndexOption::NotAnalyzed)
            .store(true)
            .ignore_above(256);

        assert_eq!(
            field.to_json(),
            json!({"type": "text", "index": "not_analyzed", "store": true, "ignore_above": 256})
        );
    }

    #[test]
    fn test_date_has_default_format() {
        assert_eq!(
            MappingNode::date().to_json(),
            json!({"type": "date", "format": DEFAULT_DATE_FORMAT})
        );
    }

    #[test]
    fn test_array_serializes_as_element() {
        let tags = MappingNode::array(MappingNode::keyword().null_value("none"));
        assert_eq!(tags.to_json(), json!({"type": "keyword", "null_value": "none"}));
        assert_eq!(tags.leaf().kind, FieldKind::Keyword);
    }

    #[test]
    fn test_stub_has_no_properties() {
        let stub = MappingNode::stub(FieldKind::Object);
        assert!(stub.is_truncated());
        assert_eq!(stub.to_json(), json!({"type": "object"}));
        assert!(!MappingNode::object(IndexMap::new()).is_truncated());
    }

    #[test]
    fn test_property_order_is_insertion_order() {
        let node = MappingNode::object(IndexMap::new())
            .property("zeta", MappingNode::long())
            .property("alpha", MappingNode::boolean())
            .property("mid", MappingNode::double());

        let json = node.to_json();
        let keys: Vec<&String> = json["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_merge_from_only_overwrites_specified() {
        let mut base = MappingNode::date().store(false).attributes;
        let overrides = FieldAttributes {
            store: Some(true),
            boost: Some(2.0),
            ..Default::default()
        };
        base.merge_from(&overrides);

        assert_eq!(base.format.as_deref(), Some(DEFAULT_DATE_FORMAT));
        assert_eq!(base.store, Some(true));
        assert_eq!(base.boost, Some(2.0));
    }

    #[test]
    fn test_root_document_wraps_under_type_name() {
        let root = RootMapping::new("post")
            .dynamic(DynamicMapping::Strict)
            .field("title", MappingNode::text());

        assert_eq!(
            root.to_document("post"),
            json!({"post": {"dynamic": "strict", "properties": {"title": {"type": "text"}}}})
        );
    }

    #[test]
    fn test_kind_wire_names_match_serde() {
        for kind in [FieldKind::Text, FieldKind::Keyword, FieldKind::Nested, FieldKind::Boolean] {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }
}
