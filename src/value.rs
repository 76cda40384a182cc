use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use num_bigint::BigInt;

use crate::adapter::LambdaAdapter;
use crate::ast::Expr;
use crate::error::EvalError;

/// A dynamically typed value flowing through the engine.
///
/// Numbers keep their width and precision so the coercion engine can apply
/// the numeric tower: `BigDecimal > Double/Float > BigInteger > Long and
/// narrower`. `Char` joins the integral rank when compared or combined.
///
/// # Examples
///
/// ```
/// use elexpr::Value;
///
/// let long = Value::Long(42);
/// let text = Value::from("hello");
/// let list = Value::List(vec![Value::Long(1), Value::Long(2)]);
/// assert_eq!(list.to_string(), "[1, 2]");
/// assert_eq!(long.kind_name(), "Long");
/// assert!(text.is_text());
/// ```
#[derive(Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInteger(BigInt),
    BigDecimal(bigdecimal::BigDecimal),
    String(String),
    Enum(EnumValue),
    /// A point on the UTC time-line
    Instant(DateTime<Utc>),
    /// Legacy date: an instant with millisecond precision
    Date(DateTime<Utc>),
    /// Date-time carrying its own offset
    Temporal(DateTime<FixedOffset>),
    /// Source of "now"
    Clock(Arc<dyn Clock>),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Array(Vec<Value>),
    Lambda(Arc<LambdaValue>),
    /// A lambda bound to a single-abstract-method interface
    Adapter(Arc<LambdaAdapter>),
    Object(Arc<dyn HostObject>),
}

/// An object supplied by the host application.
///
/// Only [`type_name`](HostObject::type_name), [`to_text`](HostObject::to_text)
/// and [`as_any`](HostObject::as_any) are required. Objects that have a
/// natural ordering override [`compare_to`](HostObject::compare_to).
pub trait HostObject: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    /// Textual form. Failures that are not [`EvalError`]s are wrapped by
    /// the engine.
    fn to_text(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;

    fn equals(&self, _other: &dyn HostObject) -> bool {
        false
    }

    /// Native ordering against `other`; `None` when the object has none
    fn compare_to(&self, _other: &Value) -> Option<Result<Ordering, EvalError>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Source of the current instant.
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A declared enumeration: a name and its members in ordinal order.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumType {
    name: String,
    members: Vec<String>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(EnumType {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Member by exact, case-sensitive name
    pub fn value_of(self: &Arc<Self>, member: &str) -> Option<EnumValue> {
        let ordinal = self.members.iter().position(|m| m == member)?;
        Some(EnumValue {
            ty: Arc::clone(self),
            ordinal,
        })
    }
}

/// One member of an [`EnumType`].
#[derive(Debug, Clone)]
pub struct EnumValue {
    ty: Arc<EnumType>,
    ordinal: usize,
}

impl EnumValue {
    pub fn name(&self) -> &str {
        &self.ty.members[self.ordinal]
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn enum_type(&self) -> &Arc<EnumType> {
        &self.ty
    }

    pub fn is_of(&self, ty: &EnumType) -> bool {
        *self.ty == *ty
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal && self.is_of(&other.ty)
    }
}

/// A lambda expression evaluated to a value.
///
/// Captures the lambda arguments visible where it was created; everything
/// else is looked up in the context it is invoked with.
#[derive(Debug)]
pub struct LambdaValue {
    pub params: Vec<String>,
    pub body: Arc<Expr>,
    pub captured: HashMap<String, Value>,
}

impl Value {
    /// Name of the value's kind, used in diagnostics
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "Null".into(),
            Value::Boolean(_) => "Boolean".into(),
            Value::Char(_) => "Character".into(),
            Value::Byte(_) => "Byte".into(),
            Value::Short(_) => "Short".into(),
            Value::Integer(_) => "Integer".into(),
            Value::Long(_) => "Long".into(),
            Value::Float(_) => "Float".into(),
            Value::Double(_) => "Double".into(),
            Value::BigInteger(_) => "BigInteger".into(),
            Value::BigDecimal(_) => "BigDecimal".into(),
            Value::String(_) => "String".into(),
            Value::Enum(e) => e.enum_type().name().to_string(),
            Value::Instant(_) => "Instant".into(),
            Value::Date(_) => "Date".into(),
            Value::Temporal(_) => "Temporal".into(),
            Value::Clock(_) => "Clock".into(),
            Value::List(_) => "List".into(),
            Value::Set(_) => "Set".into(),
            Value::Map(_) => "Map".into(),
            Value::Array(_) => "Array".into(),
            Value::Lambda(_) => "Lambda".into(),
            Value::Adapter(a) => a.interface().name().to_string(),
            Value::Object(o) => o.type_name().to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Member of the numeric tower (characters are not numbers)
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Byte(_)
                | Value::Short(_)
                | Value::Integer(_)
                | Value::Long(_)
                | Value::Float(_)
                | Value::Double(_)
                | Value::BigInteger(_)
                | Value::BigDecimal(_)
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Value::Instant(_) | Value::Date(_) | Value::Temporal(_) | Value::Clock(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list, set or array
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) | Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Build a set, dropping structural duplicates
    pub fn set_of(items: impl IntoIterator<Item = Value>) -> Value {
        let mut unique: Vec<Value> = vec![];
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    /// Look up a map entry by structural key equality
    pub fn map_get<'a>(entries: &'a [(Value, Value)], key: &Value) -> Option<&'a Value> {
        entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn map_insert(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }
}

/// `f64` in the conventional textual form: `1.0`, `0.5`, `1.0E10`, `NaN`
pub fn format_double(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    let magnitude = n.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let text = n.to_string();
        if text.contains('.') {
            text
        } else {
            format!("{}.0", text)
        }
    } else {
        let text = format!("{:e}", n);
        let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
        if mantissa.contains('.') {
            format!("{}E{}", mantissa, exponent)
        } else {
            format!("{}.0E{}", mantissa, exponent)
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::Byte(n) => write!(f, "{}", n),
            Value::Short(n) => write!(f, "{}", n),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::Float(n) => f.write_str(&format_double(f64::from(*n))),
            Value::Double(n) => f.write_str(&format_double(*n)),
            Value::BigInteger(n) => write!(f, "{}", n),
            Value::BigDecimal(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Enum(e) => f.write_str(e.name()),
            Value::Instant(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Date(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Temporal(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            Value::Clock(c) => write!(f, "{:?}", c),
            Value::List(items) | Value::Set(items) | Value::Array(items) => write_joined(f, items),
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Lambda(l) => write!(f, "lambda({})", l.params.join(", ")),
            Value::Adapter(a) => write!(f, "{}[lambda]", a.interface().name()),
            Value::Object(o) => match o.to_text() {
                Ok(text) => f.write_str(&text),
                Err(_) => write!(f, "<{}>", o.type_name()),
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Object(o) => write!(f, "Object({:?})", o),
            Value::Null => f.write_str("Null"),
            other => write!(f, "{}({})", other.kind_name(), other),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality. The engine's coercing equality lives in
    /// [`crate::compare::equals`].
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            // total order: NaN equals itself, -0.0 does not equal 0.0
            (Float(a), Float(b)) => a.total_cmp(b).is_eq(),
            (Double(a), Double(b)) => a.total_cmp(b).is_eq(),
            (BigInteger(a), BigInteger(b)) => a == b,
            (BigDecimal(a), BigDecimal(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Enum(a), Enum(b)) => a == b,
            (Instant(a), Instant(b)) | (Date(a), Date(b)) => a == b,
            (Temporal(a), Temporal(b)) => a == b,
            (Clock(a), Clock(b)) => Arc::ptr_eq(a, b),
            (List(a), List(b)) | (Array(a), Array(b)) => a == b,
            (Set(a), Set(b)) => a.len() == b.len() && a.iter().all(|item| b.contains(item)),
            (Map(a), Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| Value::map_get(b, k) == Some(v))
            }
            (Lambda(a), Lambda(b)) => Arc::ptr_eq(a, b),
            (Adapter(a), Adapter(b)) => Arc::ptr_eq(a, b),
            (Object(a), Object(b)) => Arc::ptr_eq(a, b) || a.equals(b.as_ref()),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::BigInteger(n)
    }
}

impl From<bigdecimal::BigDecimal> for Value {
    fn from(n: bigdecimal::BigDecimal) -> Self {
        Value::BigDecimal(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_text() {
        assert_eq!(format_double(1.0), "1.0");
        assert_eq!(format_double(0.5), "0.5");
        assert_eq!(format_double(-2.25), "-2.25");
        assert_eq!(format_double(1e10), "1.0E10");
        assert_eq!(format_double(1.5e-5), "1.5E-5");
        assert_eq!(format_double(f64::NAN), "NaN");
        assert_eq!(format_double(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_enum_members() {
        let color = EnumType::new("Color", ["RED", "GREEN"]);
        let green = color.value_of("GREEN").unwrap();
        assert_eq!(green.ordinal(), 1);
        assert_eq!(green.name(), "GREEN");
        assert!(color.value_of("green").is_none());
    }

    #[test]
    fn test_set_of_drops_duplicates() {
        let set = Value::set_of(vec![Value::Long(1), Value::Long(1), Value::Long(2)]);
        assert_eq!(set.as_elements().map(<[Value]>::len), Some(2));
    }
}
