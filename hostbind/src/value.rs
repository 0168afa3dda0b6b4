//! Runtime values exchanged with the guest runtime.
//!
//! A single [`Value`] enum covers both what the guest pushes (nil, booleans,
//! integers, numbers, strings, functions, userdata) and what the conversion
//! engine hands to the host (narrow integers, big numbers, arrays, host
//! objects).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use rust_decimal::Decimal;

use crate::callsite::TypeTag;
use crate::types::{ClassRef, HostType};

/// An instance of a host class.
#[derive(Clone)]
pub struct HostObject {
    class: ClassRef,
    payload: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    pub fn new<T: Any + Send + Sync>(class: &ClassRef, payload: T) -> Self {
        Self {
            class: class.clone(),
            payload: Arc::new(payload),
        }
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Identity comparison: same class and same payload allocation.
    pub fn same_instance(&self, other: &HostObject) -> bool {
        self.class == other.class && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl PartialEq for HostObject {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.class.name(), Arc::as_ptr(&self.payload))
    }
}

/// A guest function value, identified by the guest runtime's reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionRef(pub u64);

/// Opaque guest userdata, optionally wrapping a host object.
#[derive(Debug, Clone, PartialEq)]
pub struct Userdata {
    pub handle: u64,
    pub object: Option<HostObject>,
}

impl Userdata {
    pub fn opaque(handle: u64) -> Self {
        Self { handle, object: None }
    }

    pub fn wrapping(handle: u64, object: HostObject) -> Self {
        Self {
            handle,
            object: Some(object),
        }
    }
}

/// A typed host array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub element: HostType,
    pub items: Vec<Value>,
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    BigInt(BigInt),
    Decimal(Decimal),
    Str(Arc<str>),
    Bytes(Arc<[u8]>),
    Array(Arc<ArrayValue>),
    Object(HostObject),
    Function(FunctionRef),
    Userdata(Userdata),
}

impl Value {
    pub fn str(text: impl Into<Arc<str>>) -> Self {
        Value::Str(text.into())
    }

    pub fn bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Value::Bytes(bytes.into())
    }

    pub fn array(element: HostType, items: Vec<Value>) -> Self {
        Value::Array(Arc::new(ArrayValue { element, items }))
    }

    /// The type tag a call site records for this value.
    ///
    /// Guest integers tag as `int` when they fit in 32 bits and as `long`
    /// otherwise, so small literals prefer `int` overloads.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Nil => TypeTag::Nil,
            Value::I64(v) if i32::try_from(*v).is_ok() => TypeTag::Type(HostType::Int),
            Value::Function(_) => TypeTag::Function,
            Value::Userdata(data) => {
                TypeTag::Userdata(data.object.as_ref().map(|o| HostType::class(o.class())))
            }
            other => match other.host_type() {
                Some(ty) => TypeTag::Type(ty),
                None => TypeTag::Nil,
            },
        }
    }

    /// The static type of this value, if it has one.
    pub fn host_type(&self) -> Option<HostType> {
        let ty = match self {
            Value::Nil => return None,
            Value::Bool(_) => HostType::Bool,
            Value::Char(_) => HostType::Char,
            Value::I8(_) => HostType::Byte,
            Value::I16(_) => HostType::Short,
            Value::I32(_) => HostType::Int,
            Value::I64(_) => HostType::Long,
            Value::F32(_) => HostType::Float,
            Value::F64(_) => HostType::Double,
            Value::BigInt(_) => HostType::BigInteger,
            Value::Decimal(_) => HostType::BigDecimal,
            Value::Str(_) => HostType::String,
            Value::Bytes(_) => HostType::Bytes,
            Value::Array(array) => HostType::array(array.element.clone()),
            Value::Object(object) => HostType::class(object.class()),
            Value::Function(_) => HostType::Function,
            Value::Userdata(_) => HostType::Handle,
        };
        Some(ty)
    }

    /// Short description used in error messages.
    pub fn type_name(&self) -> String {
        self.tag().to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
            Value::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Value::Array(array) => {
                f.write_str("[")?;
                for (i, item) in array.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(object) => write!(f, "{:?}", object),
            Value::Function(func) => write!(f, "function: 0x{:08x}", func.0),
            Value::Userdata(data) => write!(f, "userdata: 0x{:08x}", data.handle),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}
