//! Type shapes consumed by mapping inference.
//!
//! A [`TypeDescriptor`] lists a type's members in declaration order together
//! with their declared shape and any explicit overrides. Descriptors are
//! normally produced by `#[derive(Mappable)]`, but can be assembled by hand
//! for types that are only known at runtime.

use crate::node::{DynamicMapping, FieldAttributes, FieldKind};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

/// Lazily produces the descriptor of an object-typed member.
///
/// Object shapes hold a function rather than the descriptor itself so that
/// self-referential and mutually referential types can be described.
pub type DescriptorFn = fn() -> TypeDescriptor;

/// Declared shape of a member.
#[derive(Debug, Clone)]
pub enum TypeShape {
    /// String-like.
    Text,
    /// Date or timestamp.
    Date,
    /// Any integer type.
    Integral,
    /// Any floating point type.
    Floating,
    /// Boolean.
    Boolean,
    /// Raw bytes.
    Binary,
    /// Array, list or set of the element shape.
    Collection(Box<TypeShape>),
    /// Composite type with its own members.
    Object(DescriptorFn),
}

impl TypeShape {
    /// Collection of `element`.
    pub fn collection(element: TypeShape) -> Self {
        TypeShape::Collection(Box::new(element))
    }

    /// Object shape of `T`.
    pub fn object<T: Mappable>() -> Self {
        TypeShape::Object(T::descriptor)
    }

    /// Object shape of a type whose members aren't described. It maps to an
    /// object with no declared properties.
    pub fn opaque<T: ?Sized>() -> Self {
        TypeShape::Object(TypeDescriptor::opaque::<T>)
    }
}

/// Types that can be inferred into a mapping.
///
/// Usually derived:
///
/// ```rust
/// use tessera_mapping::{Mappable, MemberDescriptor, TypeDescriptor, TypeShape};
///
/// struct Tag {
///     label: String,
/// }
///
/// impl Mappable for Tag {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::of::<Self>("Tag")
///             .with_member(MemberDescriptor::of::<String>("label"))
///     }
/// }
///
/// assert_eq!(Tag::descriptor().members().len(), 1);
/// ```
pub trait Mappable {
    /// Shape of this type.
    fn descriptor() -> TypeDescriptor;
}

/// Maps a Rust type onto the shape of a member declared with it.
pub trait MapField {
    /// Whether a member of this type may be absent.
    const NULLABLE: bool = false;

    /// Shape of a member of this type.
    fn shape() -> TypeShape;
}

/// Explicit per-member overrides. Every attribute that is set wins over the
/// inferred value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOverrides {
    /// Field name in the mapping.
    pub name: Option<String>,
    /// Field kind.
    pub kind: Option<FieldKind>,
    /// Kind-specific attributes.
    pub attributes: FieldAttributes,
    /// Leave the member out of the mapping.
    pub opt_out: bool,
}

/// Type-level overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeAttributes {
    /// Type name to register the mapping under.
    pub type_name: Option<String>,
    /// Default index for this type.
    pub index: Option<String>,
    /// Dynamic mapping policy.
    pub dynamic: Option<DynamicMapping>,
    /// Date detection for unmapped fields.
    pub date_detection: Option<bool>,
    /// Numeric detection for unmapped fields.
    pub numeric_detection: Option<bool>,
    /// Default index analyzer.
    pub index_analyzer: Option<String>,
    /// Default search analyzer.
    pub search_analyzer: Option<String>,
}

/// One member of a type.
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    /// Member name as serialized.
    pub name: String,
    /// Declared shape.
    pub shape: TypeShape,
    /// Whether the member may be absent.
    pub nullable: bool,
    /// Explicit overrides.
    pub overrides: FieldOverrides,
}

impl MemberDescriptor {
    /// Create a member with an explicit shape.
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            shape,
            nullable: false,
            overrides: FieldOverrides::default(),
        }
    }

    /// Create a member declared with Rust type `T`.
    pub fn of<T: MapField + ?Sized>(name: impl Into<String>) -> Self {
        Self {
            nullable: T::NULLABLE,
            ..Self::new(name, T::shape())
        }
    }

    /// Mark the member nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Attach overrides.
    pub fn overrides(mut self, overrides: FieldOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Name the member will have in the mapping.
    pub fn mapped_name(&self) -> &str {
        self.overrides.name.as_deref().unwrap_or(&self.name)
    }
}

/// Shape of a data type: name, identity and ordered members.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    key: String,
    attributes: TypeAttributes,
    members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    /// Create a descriptor. `key` identifies the type for cycle detection and
    /// settings lookups and must differ between distinct types.
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            attributes: TypeAttributes::default(),
            members: Vec::new(),
        }
    }

    /// Create a descriptor keyed by `T`'s full type path.
    pub fn of<T: ?Sized>(name: impl Into<String>) -> Self {
        Self::new(name, std::any::type_name::<T>())
    }

    /// Descriptor of a composite type without declared members, keyed by
    /// `T`'s full type path.
    pub fn opaque<T: ?Sized>() -> Self {
        let path = std::any::type_name::<T>();
        let base = path.split('<').next().unwrap_or(path);
        let name = base.rsplit("::").next().unwrap_or(base);
        Self::new(name, path)
    }

    /// Append a member with an explicit shape.
    pub fn member(self, name: impl Into<String>, shape: TypeShape) -> Self {
        self.with_member(MemberDescriptor::new(name, shape))
    }

    /// Append a member.
    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Set type-level attributes.
    pub fn with_attributes(mut self, attributes: TypeAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Type-level attributes.
    pub fn attributes(&self) -> &TypeAttributes {
        &self.attributes
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }
}

// ============================================================================
// MapField implementations
// ============================================================================

macro_rules! map_scalar {
    ($shape:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl MapField for $ty {
                fn shape() -> TypeShape {
                    TypeShape::$shape
                }
            }
        )+
    };
}

map_scalar!(Text => String, str, char);
map_scalar!(Integral => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
map_scalar!(Floating => f32, f64);
map_scalar!(Boolean => bool);
map_scalar!(Date => std::time::SystemTime, chrono::NaiveDate, chrono::NaiveDateTime);

impl<Tz: chrono::TimeZone> MapField for chrono::DateTime<Tz> {
    fn shape() -> TypeShape {
        TypeShape::Date
    }
}

impl<T: MapField> MapField for Option<T> {
    const NULLABLE: bool = true;

    fn shape() -> TypeShape {
        T::shape()
    }
}

macro_rules! map_transparent {
    ($($wrapper:ident),+) => {
        $(
            impl<T: MapField + ?Sized> MapField for $wrapper<T> {
                const NULLABLE: bool = T::NULLABLE;

                fn shape() -> TypeShape {
                    T::shape()
                }
            }
        )+
    };
}

map_transparent!(Box, Rc, Arc);

impl<T: MapField + ?Sized> MapField for &T {
    const NULLABLE: bool = T::NULLABLE;

    fn shape() -> TypeShape {
        T::shape()
    }
}

impl<T: MapField + ToOwned + ?Sized> MapField for Cow<'_, T> {
    const NULLABLE: bool = T::NULLABLE;

    fn shape() -> TypeShape {
        T::shape()
    }
}

macro_rules! map_collection {
    ($($collection:ident),+) => {
        $(
            impl<T: MapField> MapField for $collection<T> {
                fn shape() -> TypeShape {
                    TypeShape::collection(T::shape())
                }
            }
        )+
    };
}

map_collection!(Vec, VecDeque, LinkedList, BTreeSet);

impl<T: MapField, S> MapField for HashSet<T, S> {
    fn shape() -> TypeShape {
        TypeShape::collection(T::shape())
    }
}

impl<T: MapField> MapField for [T] {
    fn shape() -> TypeShape {
        TypeShape::collection(T::shape())
    }
}

impl<T: MapField, const N: usize> MapField for [T; N] {
    fn shape() -> TypeShape {
        TypeShape::collection(T::shape())
    }
}

// Keyed collections and free-form JSON map to objects whose keys are only
// known at index time.

impl<K, V, S> MapField for HashMap<K, V, S> {
    fn shape() -> TypeShape {
        TypeShape::opaque::<Self>()
    }
}

impl<K, V> MapField for BTreeMap<K, V> {
    fn shape() -> TypeShape {
        TypeShape::opaque::<Self>()
    }
}

impl MapField for serde_json::Map<String, serde_json::Value> {
    fn shape() -> TypeShape {
        TypeShape::opaque::<Self>()
    }
}

impl MapField for serde_json::Value {
    fn shape() -> TypeShape {
        TypeShape::opaque::<Self>()
    }
}

map_scalar!(Binary => bytes::Bytes, bytes::BytesMut);

// ============================================================================
// Derive support
// ============================================================================

/// Describes a member declared with type `T`.
///
/// `(&Member::<T>::new()).describe(name)` goes through [`MapField`] when `T`
/// implements it and falls back to an opaque object otherwise, so a derived
/// type never fails to map because of one member type.
#[doc(hidden)]
pub struct Member<T: ?Sized>(PhantomData<fn() -> Box<T>>);

impl<T: ?Sized> Member<T> {
    /// Marker for `T`.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Member(PhantomData)
    }
}

/// Member description through [`MapField`].
#[doc(hidden)]
pub trait DescribeDeclared {
    /// Describe the member called `name`.
    fn describe(&self, name: &str) -> MemberDescriptor;
}

impl<T: MapField + ?Sized> DescribeDeclared for Member<T> {
    fn describe(&self, name: &str) -> MemberDescriptor {
        MemberDescriptor::of::<T>(name)
    }
}

/// Member description for types without [`MapField`].
#[doc(hidden)]
pub trait DescribeOpaque {
    /// Describe the member called `name`.
    fn describe(&self, name: &str) -> MemberDescriptor;
}

impl<T: ?Sized> DescribeOpaque for &Member<T> {
    fn describe(&self, name: &str) -> MemberDescriptor {
        MemberDescriptor::new(name, TypeShape::opaque::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node;

    impl Mappable for Node {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Node>("Node")
                .with_member(MemberDescriptor::of::<String>("label"))
                .with_member(MemberDescriptor::of::<Option<Box<Node>>>("next"))
        }
    }

    impl MapField for Node {
        fn shape() -> TypeShape {
            TypeShape::object::<Node>()
        }
    }

    #[test]
    fn test_scalar_shapes() {
        assert!(matches!(String::shape(), TypeShape::Text));
        assert!(matches!(u16::shape(), TypeShape::Integral));
        assert!(matches!(f32::shape(), TypeShape::Floating));
        assert!(matches!(bool::shape(), TypeShape::Boolean));
        assert!(matches!(chrono::NaiveDate::shape(), TypeShape::Date));
        assert!(matches!(<chrono::DateTime<chrono::Utc>>::shape(), TypeShape::Date));
    }

    #[test]
    fn test_option_is_nullable_and_transparent() {
        let member = MemberDescriptor::of::<Option<i64>>("count");
        assert!(member.nullable);
        assert!(matches!(member.shape, TypeShape::Integral));
        assert!(!MemberDescriptor::of::<i64>("count").nullable);
    }

    #[test]
    fn test_collections_wrap_element() {
        match <Vec<HashSet<String>>>::shape() {
            TypeShape::Collection(outer) => match *outer {
                TypeShape::Collection(inner) => assert!(matches!(*inner, TypeShape::Text)),
                other => panic!("unexpected inner shape {:?}", other),
            },
            other => panic!("unexpected shape {:?}", other),
        }
        assert!(matches!(<[u8; 4]>::shape(), TypeShape::Collection(_)));
    }

    #[test]
    fn test_self_reference_is_lazy() {
        let descriptor = Node::descriptor();
        assert_eq!(descriptor.members().len(), 2);
        assert_eq!(descriptor.key(), std::any::type_name::<Node>());

        match &descriptor.members()[1].shape {
            TypeShape::Object(describe) => assert_eq!(describe().name(), "Node"),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_maps_and_json_are_opaque_objects() {
        let describe = |shape: TypeShape| match shape {
            TypeShape::Object(describe) => describe(),
            other => panic!("unexpected shape {:?}", other),
        };

        let labels = describe(<HashMap<String, String>>::shape());
        assert_eq!(labels.name(), "HashMap");
        assert!(labels.members().is_empty());

        let counts = describe(<HashMap<String, i64>>::shape());
        assert_ne!(labels.key(), counts.key());

        assert_eq!(describe(<BTreeMap<String, f64>>::shape()).name(), "BTreeMap");
        assert_eq!(describe(serde_json::Value::shape()).name(), "Value");
    }

    #[test]
    fn test_byte_buffers_are_binary() {
        assert!(matches!(bytes::Bytes::shape(), TypeShape::Binary));
        assert!(matches!(<Option<bytes::BytesMut>>::shape(), TypeShape::Binary));
    }

    struct Unmapped;

    #[test]
    fn test_member_falls_back_to_opaque_object() {
        let declared = (&Member::<Vec<String>>::new()).describe("tags");
        assert!(matches!(declared.shape, TypeShape::Collection(_)));

        let nullable = (&Member::<Option<i64>>::new()).describe("count");
        assert!(nullable.nullable);

        let fallback = (&Member::<Unmapped>::new()).describe("extra");
        assert_eq!(fallback.name, "extra");
        match fallback.shape {
            TypeShape::Object(describe) => {
                assert_eq!(describe().name(), "Unmapped");
                assert!(describe().members().is_empty());
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_mapped_name_prefers_override() {
        let member = MemberDescriptor::of::<String>("title").overrides(FieldOverrides {
            name: Some("headline".to_string()),
            ..Default::default()
        });
        assert_eq!(member.mapped_name(), "headline");
    }
}
