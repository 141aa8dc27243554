//! Runtime values for the decoded-object graph, and declared-type tags.

use indexmap::IndexMap;

/// A single decoded value in the live object graph that expressions resolve
/// against. Containers are [`Value::Struct`]; field order is preserved so
/// enumeration matches declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Bool(bool),
    Float(f32),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Struct(IndexMap<String, Value>),
    List(Vec<Value>),
}

impl Value {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U8(x) => Some(*x as u64),
            Value::U16(x) => Some(*x as u64),
            Value::U32(x) => Some(*x as u64),
            Value::U64(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(x) => Some(*x as i64),
            Value::I16(x) => Some(*x as i64),
            Value::I32(x) => Some(*x as i64),
            Value::I64(x) => Some(*x),
            Value::U8(x) => Some(*x as i64),
            Value::U16(x) => Some(*x as i64),
            Value::U32(x) => Some(*x as i64),
            // Values past i64::MAX are an overflow, not a negative number.
            Value::U64(x) => i64::try_from(*x).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Struct(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }
}

/// Declared type of a bound field. A binding declares one or more tags; more
/// than one means the field's static type is a union and references to it fan
/// out per branch.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
    Uint,
    Int,
    Bool,
    Float,
    Text,
    Bytes,
    /// A named compound type whose attributes can be selected by name.
    Struct(String),
    Array(Box<TypeTag>),
    /// Statically unknown, as produced by duck-typed attribute selection.
    Any,
}

impl TypeTag {
    /// Assignability between declared tags. `Any` is compatible with
    /// everything in either direction; arrays compare element-wise.
    pub fn compatible_with(&self, other: &TypeTag) -> bool {
        match (self, other) {
            (TypeTag::Any, _) | (_, TypeTag::Any) => true,
            (TypeTag::Array(a), TypeTag::Array(b)) => a.compatible_with(b),
            (a, b) => a == b,
        }
    }

    /// Whether a runtime value fits this declared tag. Used by
    /// multi-reference resolution to pick the branch that applies.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeTag::Any, _) => true,
            (TypeTag::Uint, Value::U8(_) | Value::U16(_) | Value::U32(_) | Value::U64(_)) => true,
            (TypeTag::Int, Value::I8(_) | Value::I16(_) | Value::I32(_) | Value::I64(_)) => true,
            (TypeTag::Bool, Value::Bool(_)) => true,
            (TypeTag::Float, Value::Float(_) | Value::Double(_)) => true,
            (TypeTag::Text, Value::Text(_)) => true,
            (TypeTag::Bytes, Value::Bytes(_)) => true,
            (TypeTag::Struct(_), Value::Struct(_)) => true,
            (TypeTag::Array(elem), Value::List(items)) => {
                items.first().map_or(true, |v| elem.matches(v))
            }
            _ => false,
        }
    }
}
