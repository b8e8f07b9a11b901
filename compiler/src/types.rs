use indexmap::IndexMap;
use serde::Serialize;

use crate::span::Span;

/// Built-in scalar types, keyed by the names the grammar recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BaseType {
    Bool,
    Byte,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Guid,
    Date,
}

pub const BASE_TYPES: [(&str, BaseType); 15] = [
    ("bool", BaseType::Bool),
    ("byte", BaseType::Byte),
    ("uint8", BaseType::UInt8),
    ("uint16", BaseType::UInt16),
    ("uint32", BaseType::UInt32),
    ("uint64", BaseType::UInt64),
    ("int8", BaseType::Int8),
    ("int16", BaseType::Int16),
    ("int32", BaseType::Int32),
    ("int64", BaseType::Int64),
    ("float32", BaseType::Float32),
    ("float64", BaseType::Float64),
    ("string", BaseType::String),
    ("guid", BaseType::Guid),
    ("date", BaseType::Date),
];

impl BaseType {
    pub fn from_name(name: &str) -> Option<BaseType> {
        BASE_TYPES.iter().find(|(n, _)| *n == name).map(|(_, t)| *t)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BaseType::Bool    => "bool",
            BaseType::Byte    => "byte",
            BaseType::UInt8   => "uint8",
            BaseType::UInt16  => "uint16",
            BaseType::UInt32  => "uint32",
            BaseType::UInt64  => "uint64",
            BaseType::Int8    => "int8",
            BaseType::Int16   => "int16",
            BaseType::Int32   => "int32",
            BaseType::Int64   => "int64",
            BaseType::Float32 => "float32",
            BaseType::Float64 => "float64",
            BaseType::String  => "string",
            BaseType::Guid    => "guid",
            BaseType::Date    => "date",
        }
    }
}

/// A field type. `display` is the canonical rendering used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum TypeBase {
    Scalar {
        base:    BaseType,
        span:    Span,
        display: String,
    },
    Array {
        element: Box<TypeBase>,
        span:    Span,
        display: String,
    },
    Map {
        key:     Box<TypeBase>,
        value:   Box<TypeBase>,
        span:    Span,
        display: String,
    },
    Defined {
        name:    String,
        span:    Span,
        display: String,
    },
}

impl TypeBase {
    pub fn scalar(base: BaseType, span: Span) -> TypeBase {
        TypeBase::Scalar { base, span, display: base.name().to_string() }
    }

    /// `array[T]` and `T[]` both build this; only the rendering differs.
    pub fn array(element: TypeBase, span: Span, display: String) -> TypeBase {
        TypeBase::Array { element: Box::new(element), span, display }
    }

    pub fn map(key: TypeBase, value: TypeBase, span: Span) -> TypeBase {
        let display = format!("map[{}, {}]", key.display(), value.display());
        TypeBase::Map { key: Box::new(key), value: Box::new(value), span, display }
    }

    pub fn defined(name: &str, span: Span) -> TypeBase {
        TypeBase::Defined { name: name.to_string(), span, display: name.to_string() }
    }

    pub fn display(&self) -> &str {
        match self {
            TypeBase::Scalar { display, .. }
            | TypeBase::Array { display, .. }
            | TypeBase::Map { display, .. }
            | TypeBase::Defined { display, .. } => display,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeBase::Scalar { span, .. }
            | TypeBase::Array { span, .. }
            | TypeBase::Map { span, .. }
            | TypeBase::Defined { span, .. } => *span,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeBase::Scalar { .. })
    }

    /// Structural equality, ignoring spans and spelling.
    pub fn same_shape(&self, other: &TypeBase) -> bool {
        match (self, other) {
            (TypeBase::Scalar { base: a, .. }, TypeBase::Scalar { base: b, .. }) => a == b,
            (TypeBase::Array { element: a, .. }, TypeBase::Array { element: b, .. }) => a.same_shape(b),
            (TypeBase::Map { key: ka, value: va, .. }, TypeBase::Map { key: kb, value: vb, .. }) => {
                ka.same_shape(kb) && va.same_shape(vb)
            }
            (TypeBase::Defined { name: a, .. }, TypeBase::Defined { name: b, .. }) => a == b,
            _ => false,
        }
    }

    /// Every defined-type name referenced anywhere inside this type.
    pub fn defined_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_defined_names(&mut names);
        names
    }

    fn collect_defined_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            TypeBase::Scalar { .. } => {}
            TypeBase::Array { element, .. } => element.collect_defined_names(names),
            TypeBase::Map { key, value, .. } => {
                key.collect_defined_names(names);
                value.collect_defined_names(names);
            }
            TypeBase::Defined { name, .. } => names.push(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Attribute {
    Deprecated { reason: String },
    Opcode { value: String, is_number: bool },
    Query { value: String },
    Command,
    AuthorizeWhenHasAnyOf { permissions: Vec<String> },
}

impl Attribute {
    /// Build an attribute from its keyword and (possibly empty) argument.
    /// Returns `None` for keywords outside the recognized set.
    pub fn from_keyword(keyword: &str, value: String, is_number: bool) -> Option<Attribute> {
        let attribute = match keyword {
            "deprecated" => Attribute::Deprecated { reason: value },
            "opcode" => Attribute::Opcode { value, is_number },
            "query" => Attribute::Query { value },
            "command" => Attribute::Command,
            "authorizeWhenHasAnyOf" => Attribute::AuthorizeWhenHasAnyOf {
                permissions: value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            _ => return None,
        };
        Some(attribute)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Deprecated { .. } => "deprecated",
            Attribute::Opcode { .. } => "opcode",
            Attribute::Query { .. } => "query",
            Attribute::Command => "command",
            Attribute::AuthorizeWhenHasAnyOf { .. } => "authorizeWhenHasAnyOf",
        }
    }

    /// The textual payload as generators print it.
    pub fn value(&self) -> String {
        match self {
            Attribute::Deprecated { reason } => reason.clone(),
            Attribute::Opcode { value, .. } | Attribute::Query { value } => value.clone(),
            Attribute::Command => String::new(),
            Attribute::AuthorizeWhenHasAnyOf { permissions } => permissions
                .iter()
                .map(|p| format!("\"{}\"", p))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn try_validate(&self) -> Result<(), String> {
        match self {
            Attribute::Opcode { value, is_number: true } => value
                .parse::<u32>()
                .map(|_| ())
                .map_err(|_| format!("\"{}\" is not a valid uint32 opcode", value)),
            Attribute::Opcode { value, is_number: false } => {
                if value.len() == 4 && value.is_ascii() {
                    Ok(())
                } else {
                    Err(format!("\"{}\" is not a valid FourCC; string opcodes must be exactly four ASCII characters", value))
                }
            }
            Attribute::Deprecated { .. }
            | Attribute::Query { .. }
            | Attribute::Command
            | Attribute::AuthorizeWhenHasAnyOf { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AggregateKind {
    Enum    = 0,
    Struct  = 1,
    Message = 2,
}

impl AggregateKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            AggregateKind::Enum    => "enum",
            AggregateKind::Struct  => "struct",
            AggregateKind::Message => "message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name:           String,
    #[serde(rename = "type")]
    pub type_:          TypeBase,
    pub span:           Span,
    pub deprecated:     Option<Attribute>,
    /// Wire index for message fields, constant value for enum members, zero for struct fields.
    pub index_or_value: i32,
    pub documentation:  String,
}

impl Field {
    pub fn deprecated_reason(&self) -> Option<&str> {
        match &self.deprecated {
            Some(Attribute::Deprecated { reason }) => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub name:          String,
    pub is_read_only:  bool,
    pub span:          Span,
    pub kind:          AggregateKind,
    pub fields:        Vec<Field>,
    pub documentation: String,
    pub attributes:    Vec<Attribute>,
}

impl Definition {
    fn first_attribute(&self, f: impl Fn(&Attribute) -> bool) -> Option<&Attribute> {
        self.attributes.iter().find(|a| f(a))
    }

    pub fn deprecated_attribute(&self) -> Option<&Attribute> {
        self.first_attribute(|a| matches!(a, Attribute::Deprecated { .. }))
    }

    pub fn opcode_attribute(&self) -> Option<&Attribute> {
        self.first_attribute(|a| matches!(a, Attribute::Opcode { .. }))
    }

    pub fn command_attribute(&self) -> Option<&Attribute> {
        self.first_attribute(|a| matches!(a, Attribute::Command))
    }

    pub fn query_attribute(&self) -> Option<&Attribute> {
        self.first_attribute(|a| matches!(a, Attribute::Query { .. }))
    }

    pub fn authorize_attribute(&self) -> Option<&Attribute> {
        self.first_attribute(|a| matches!(a, Attribute::AuthorizeWhenHasAnyOf { .. }))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Definitions keyed by name, in declaration order.
pub type DefinitionMap = IndexMap<String, Definition>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub namespace:   String,
    pub definitions: DefinitionMap,
}

impl Schema {
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }
}
