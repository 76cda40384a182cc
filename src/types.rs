//! Coercion targets.
//!
//! A [`ValueType`] names what a value should become. Boolean, character and
//! fixed-width numeric targets come in a primitive flavour that never accepts
//! `null`, and a boxed flavour that does.

use std::fmt;
use std::sync::Arc;

use crate::value::{EnumType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    /// Any member of the numeric tower
    Any,
}

impl NumericKind {
    pub fn name(self) -> &'static str {
        match self {
            NumericKind::Byte => "Byte",
            NumericKind::Short => "Short",
            NumericKind::Integer => "Integer",
            NumericKind::Long => "Long",
            NumericKind::Float => "Float",
            NumericKind::Double => "Double",
            NumericKind::BigInteger => "BigInteger",
            NumericKind::BigDecimal => "BigDecimal",
            NumericKind::Any => "Number",
        }
    }

    pub fn primitive_name(self) -> Option<&'static str> {
        match self {
            NumericKind::Byte => Some("byte"),
            NumericKind::Short => Some("short"),
            NumericKind::Integer => Some("int"),
            NumericKind::Long => Some("long"),
            NumericKind::Float => Some("float"),
            NumericKind::Double => Some("double"),
            _ => None,
        }
    }

    /// Kind of a numeric value, `None` for everything else
    pub fn of(value: &Value) -> Option<NumericKind> {
        let kind = match value {
            Value::Byte(_) => NumericKind::Byte,
            Value::Short(_) => NumericKind::Short,
            Value::Integer(_) => NumericKind::Integer,
            Value::Long(_) => NumericKind::Long,
            Value::Float(_) => NumericKind::Float,
            Value::Double(_) => NumericKind::Double,
            Value::BigInteger(_) => NumericKind::BigInteger,
            Value::BigDecimal(_) => NumericKind::BigDecimal,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericType {
    pub kind: NumericKind,
    /// Primitive targets never yield `null`
    pub primitive: bool,
}

/// One method of an [`InterfaceType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub arity: usize,
    pub is_abstract: bool,
}

/// A host capability contract a lambda may be adapted to.
///
/// Only interfaces with exactly one abstract method are functional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    name: String,
    methods: Vec<MethodSignature>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>, methods: Vec<MethodSignature>) -> Arc<Self> {
        Arc::new(InterfaceType {
            name: name.into(),
            methods,
        })
    }

    /// Interface with a single abstract method and nothing else
    pub fn functional(name: impl Into<String>, method: impl Into<String>, arity: usize) -> Arc<Self> {
        InterfaceType::new(
            name,
            vec![MethodSignature {
                name: method.into(),
                arity,
                is_abstract: true,
            }],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    pub fn single_abstract_method(&self) -> Option<&MethodSignature> {
        let mut abstract_methods = self.methods.iter().filter(|m| m.is_abstract);
        match (abstract_methods.next(), abstract_methods.next()) {
            (Some(method), None) => Some(method),
            _ => None,
        }
    }
}

/// A coercion target.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    /// The universal type; every value is already assignable
    Object,
    String,
    Boolean { primitive: bool },
    Character { primitive: bool },
    Number(NumericType),
    Enum(Arc<EnumType>),
    Instant,
    Date,
    List,
    Set,
    Map,
    Array(Box<ValueType>),
    Interface(Arc<InterfaceType>),
    Lambda,
    /// A host object type, matched by [`HostObject::type_name`](crate::HostObject::type_name)
    Host(String),
}

impl ValueType {
    pub fn number(kind: NumericKind) -> Self {
        ValueType::Number(NumericType {
            kind,
            primitive: false,
        })
    }

    pub fn primitive(kind: NumericKind) -> Self {
        ValueType::Number(NumericType {
            kind,
            primitive: kind.primitive_name().is_some(),
        })
    }

    pub fn array_of(element: ValueType) -> Self {
        ValueType::Array(Box::new(element))
    }

    /// Resolve a textual type name: `Long`, `long`, `BigDecimal`, `String[]`...
    ///
    /// Enumerations, interfaces and host types are not known here; see
    /// [`EvalContext::resolve_type`](crate::EvalContext::resolve_type).
    pub fn from_name(name: &str) -> Option<ValueType> {
        if let Some(element) = name.strip_suffix("[]") {
            return ValueType::from_name(element).map(ValueType::array_of);
        }
        let ty = match name {
            "Object" => ValueType::Object,
            "String" => ValueType::String,
            "Boolean" => ValueType::Boolean { primitive: false },
            "boolean" => ValueType::Boolean { primitive: true },
            "Character" => ValueType::Character { primitive: false },
            "char" => ValueType::Character { primitive: true },
            "Byte" => ValueType::number(NumericKind::Byte),
            "byte" => ValueType::primitive(NumericKind::Byte),
            "Short" => ValueType::number(NumericKind::Short),
            "short" => ValueType::primitive(NumericKind::Short),
            "Integer" => ValueType::number(NumericKind::Integer),
            "int" => ValueType::primitive(NumericKind::Integer),
            "Long" => ValueType::number(NumericKind::Long),
            "long" => ValueType::primitive(NumericKind::Long),
            "Float" => ValueType::number(NumericKind::Float),
            "float" => ValueType::primitive(NumericKind::Float),
            "Double" => ValueType::number(NumericKind::Double),
            "double" => ValueType::primitive(NumericKind::Double),
            "BigInteger" => ValueType::number(NumericKind::BigInteger),
            "BigDecimal" => ValueType::number(NumericKind::BigDecimal),
            "Number" => ValueType::number(NumericKind::Any),
            "Instant" => ValueType::Instant,
            "Date" => ValueType::Date,
            "List" => ValueType::List,
            "Set" => ValueType::Set,
            "Map" => ValueType::Map,
            "Lambda" => ValueType::Lambda,
            _ => return None,
        };
        Some(ty)
    }

    /// The natural type of a value: the target that round-trips it.
    pub fn of(value: &Value) -> ValueType {
        match value {
            Value::Null => ValueType::Object,
            Value::Boolean(_) => ValueType::Boolean { primitive: false },
            Value::Char(_) => ValueType::Character { primitive: false },
            Value::String(_) => ValueType::String,
            Value::Enum(e) => ValueType::Enum(Arc::clone(e.enum_type())),
            Value::Instant(_) => ValueType::Instant,
            Value::Date(_) => ValueType::Date,
            Value::List(_) => ValueType::List,
            Value::Set(_) => ValueType::Set,
            Value::Map(_) => ValueType::Map,
            Value::Array(_) => ValueType::array_of(ValueType::Object),
            Value::Lambda(_) => ValueType::Lambda,
            Value::Adapter(a) => ValueType::Interface(Arc::clone(a.interface())),
            other => match NumericKind::of(other) {
                Some(kind) => ValueType::number(kind),
                None => ValueType::Host(other.kind_name()),
            },
        }
    }

    pub fn is_primitive(&self) -> bool {
        match self {
            ValueType::Boolean { primitive } | ValueType::Character { primitive } => *primitive,
            ValueType::Number(n) => n.primitive,
            _ => false,
        }
    }

    /// Is `value` already of this type, so coercion can hand it back as-is?
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Object, _) => true,
            (_, Value::Null) => false,
            (ValueType::String, Value::String(_))
            | (ValueType::Boolean { .. }, Value::Boolean(_))
            | (ValueType::Character { .. }, Value::Char(_))
            | (ValueType::Instant, Value::Instant(_))
            | (ValueType::Date, Value::Date(_))
            | (ValueType::List, Value::List(_))
            | (ValueType::Set, Value::Set(_))
            | (ValueType::Map, Value::Map(_))
            | (ValueType::Lambda, Value::Lambda(_)) => true,
            (ValueType::Number(n), v) => match NumericKind::of(v) {
                Some(kind) => n.kind == NumericKind::Any || n.kind == kind,
                None => false,
            },
            (ValueType::Enum(ty), Value::Enum(e)) => e.is_of(ty),
            (ValueType::Array(element), Value::Array(items)) => {
                **element == ValueType::Object || items.iter().all(|item| element.accepts(item))
            }
            (ValueType::Interface(iface), Value::Adapter(a)) => a.interface().name() == iface.name(),
            (ValueType::Interface(iface), Value::Object(o)) => o.type_name() == iface.name(),
            (ValueType::Host(name), v) => v.kind_name() == *name,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Object => f.write_str("Object"),
            ValueType::String => f.write_str("String"),
            ValueType::Boolean { primitive: true } => f.write_str("boolean"),
            ValueType::Boolean { primitive: false } => f.write_str("Boolean"),
            ValueType::Character { primitive: true } => f.write_str("char"),
            ValueType::Character { primitive: false } => f.write_str("Character"),
            ValueType::Number(n) => match n.kind.primitive_name() {
                Some(name) if n.primitive => f.write_str(name),
                _ => f.write_str(n.kind.name()),
            },
            ValueType::Enum(ty) => f.write_str(ty.name()),
            ValueType::Instant => f.write_str("Instant"),
            ValueType::Date => f.write_str("Date"),
            ValueType::List => f.write_str("List"),
            ValueType::Set => f.write_str("Set"),
            ValueType::Map => f.write_str("Map"),
            ValueType::Array(element) => write!(f, "{}[]", element),
            ValueType::Interface(iface) => f.write_str(iface.name()),
            ValueType::Lambda => f.write_str("Lambda"),
            ValueType::Host(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for name in ["long", "Long", "BigDecimal", "char", "Number", "String[]", "int[]"] {
            let ty = ValueType::from_name(name).unwrap();
            assert_eq!(ty.to_string(), name);
        }
        assert!(ValueType::from_name("Widget").is_none());
    }

    #[test]
    fn test_primitive_flags() {
        assert!(ValueType::primitive(NumericKind::Long).is_primitive());
        assert!(!ValueType::primitive(NumericKind::BigDecimal).is_primitive());
        assert!(!ValueType::number(NumericKind::Long).is_primitive());
    }

    #[test]
    fn test_single_abstract_method() {
        let supplier = InterfaceType::functional("Supplier", "get", 0);
        assert_eq!(supplier.single_abstract_method().map(|m| m.name.as_str()), Some("get"));

        let two = InterfaceType::new(
            "Pair",
            vec![
                MethodSignature { name: "left".into(), arity: 0, is_abstract: true },
                MethodSignature { name: "right".into(), arity: 0, is_abstract: true },
            ],
        );
        assert!(two.single_abstract_method().is_none());
    }
}
