//! Shapes and trait applications.

use indexmap::IndexMap;

use crate::event::SourceLocation;
use crate::id::ShapeId;
use crate::value::NodeValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Blob,
    Boolean,
    String,
    Timestamp,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    Document,
    Enum,
    IntEnum,
    List,
    Set,
    Map,
    Structure,
    Union,
    Member,
    Service,
    Resource,
    Operation,
}

impl ShapeType {
    pub fn from_keyword(keyword: &str) -> Option<ShapeType> {
        Some(match keyword {
            "blob" => ShapeType::Blob,
            "boolean" => ShapeType::Boolean,
            "string" => ShapeType::String,
            "timestamp" => ShapeType::Timestamp,
            "byte" => ShapeType::Byte,
            "short" => ShapeType::Short,
            "integer" => ShapeType::Integer,
            "long" => ShapeType::Long,
            "float" => ShapeType::Float,
            "double" => ShapeType::Double,
            "bigInteger" => ShapeType::BigInteger,
            "bigDecimal" => ShapeType::BigDecimal,
            "document" => ShapeType::Document,
            "enum" => ShapeType::Enum,
            "intEnum" => ShapeType::IntEnum,
            "list" => ShapeType::List,
            "set" => ShapeType::Set,
            "map" => ShapeType::Map,
            "structure" => ShapeType::Structure,
            "union" => ShapeType::Union,
            "service" => ShapeType::Service,
            "resource" => ShapeType::Resource,
            "operation" => ShapeType::Operation,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            ShapeType::Blob => "blob",
            ShapeType::Boolean => "boolean",
            ShapeType::String => "string",
            ShapeType::Timestamp => "timestamp",
            ShapeType::Byte => "byte",
            ShapeType::Short => "short",
            ShapeType::Integer => "integer",
            ShapeType::Long => "long",
            ShapeType::Float => "float",
            ShapeType::Double => "double",
            ShapeType::BigInteger => "bigInteger",
            ShapeType::BigDecimal => "bigDecimal",
            ShapeType::Document => "document",
            ShapeType::Enum => "enum",
            ShapeType::IntEnum => "intEnum",
            ShapeType::List => "list",
            ShapeType::Set => "set",
            ShapeType::Map => "map",
            ShapeType::Structure => "structure",
            ShapeType::Union => "union",
            ShapeType::Member => "member",
            ShapeType::Service => "service",
            ShapeType::Resource => "resource",
            ShapeType::Operation => "operation",
        }
    }

    /// Whether members of this shape hold object-like node values.
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            ShapeType::Structure | ShapeType::Union | ShapeType::Map
        )
    }

    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            ShapeType::Blob
                | ShapeType::Boolean
                | ShapeType::String
                | ShapeType::Timestamp
                | ShapeType::Byte
                | ShapeType::Short
                | ShapeType::Integer
                | ShapeType::Long
                | ShapeType::Float
                | ShapeType::Double
                | ShapeType::BigInteger
                | ShapeType::BigDecimal
                | ShapeType::Document
        )
    }
}

/// One applied trait: its id, its value, and where the application was
/// written. Array traits merged from several files keep one location per
/// element so incremental reloads can tell the fragments apart.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitApplication {
    pub id: ShapeId,
    pub value: NodeValue,
    pub location: SourceLocation,
    /// Per-element source locations, parallel to an `Arr` value.
    pub element_locations: Option<Vec<SourceLocation>>,
    /// Synthetic applications (doc-comment sugar and the like) are
    /// ignored by the rebuild index.
    pub synthetic: bool,
}

impl TraitApplication {
    pub fn new(id: ShapeId, value: NodeValue, location: SourceLocation) -> Self {
        Self {
            id,
            value,
            location,
            element_locations: None,
            synthetic: false,
        }
    }

    pub fn synthetic(id: ShapeId, value: NodeValue, location: SourceLocation) -> Self {
        Self {
            id,
            value,
            location,
            element_locations: None,
            synthetic: true,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.value, NodeValue::Arr(_))
    }
}

/// A shape in the semantic model. Members are stored flat in the model
/// under `container$member` ids; the member map here holds their names
/// in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: ShapeId,
    pub shape_type: ShapeType,
    /// Member name to member shape id, in declaration order.
    pub members: IndexMap<String, ShapeId>,
    pub traits: Vec<TraitApplication>,
    pub location: SourceLocation,
    /// Target shape (member shapes only).
    pub target: Option<ShapeId>,
    pub mixins: Vec<ShapeId>,
    /// Resource identifiers and properties (resource shapes only).
    pub identifiers: IndexMap<String, ShapeId>,
}

impl Shape {
    pub fn new(id: ShapeId, shape_type: ShapeType, location: SourceLocation) -> Self {
        Self {
            id,
            shape_type,
            members: IndexMap::new(),
            traits: Vec::new(),
            location,
            target: None,
            mixins: Vec::new(),
            identifiers: IndexMap::new(),
        }
    }

    pub fn get_member(&self, name: &str) -> Option<&ShapeId> {
        self.members.get(name)
    }

    pub fn get_trait(&self, id: &ShapeId) -> Option<&TraitApplication> {
        self.traits.iter().find(|t| &t.id == id)
    }

    pub fn has_trait_named(&self, absolute: &str) -> bool {
        self.traits.iter().any(|t| t.id.to_string() == absolute)
    }

    /// The documentation trait's string value, when present.
    pub fn documentation(&self) -> Option<&str> {
        self.traits
            .iter()
            .find(|t| t.id.namespace() == "smithy.api" && t.id.name() == "documentation")
            .and_then(|t| t.value.as_str())
    }
}
