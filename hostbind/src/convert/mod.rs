//! Conversion between guest values and host static types.
//!
//! Two questions are answered here, and they always agree:
//!
//! 1. **Distance**: how good a conversion from a value (or a type, or a call
//!    site tag) to a host type is. Higher is better; `0` means no conversion
//!    is known. Distance never fails.
//! 2. **Convert**: perform that conversion, failing with `Overflow` or
//!    `ParseFailure` when the value does not fit, and with `Unsupported`
//!    exactly when the distance is `0`.
//!
//! # Scale
//!
//! | Rule                                                    | Distance |
//! |---------------------------------------------------------|----------|
//! | identical or assignable (arrays recursively)            | 5        |
//! | `String` <-> `bytes`                                    | 5        |
//! | numeric -> numeric                                      | 4        |
//! | one-character string / integral code point -> `char`    | 3        |
//! | `char` -> numeric                                       | 3        |
//! | primitive boxed into `Object`                           | 2        |
//! | anything -> `String` through its text                   | 2        |
//! | `String` -> numeric by parsing                          | 1        |
//! | nothing applies                                         | 0        |

mod numeric;
mod text;

use std::fmt;

use tracing::trace;

use crate::callsite::TypeTag;
use crate::error::ConversionError;
use crate::types::HostType;
use crate::value::{ArrayValue, Value};

use numeric::{convert_number, Number};

/// How good a conversion is. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Distance(u8);

impl Distance {
    pub const NONE: Distance = Distance(0);
    pub const PARSE: Distance = Distance(1);
    pub const TEXT: Distance = Distance(2);
    pub const BOXED: Distance = Distance(2);
    pub const CHARACTER: Distance = Distance(3);
    pub const NUMERIC: Distance = Distance(4);
    pub const EXACT: Distance = Distance(5);

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_applicable(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scores how well a call-site argument fits a declared parameter type.
///
/// The resolver only needs this one question answered; the conversion engine
/// is the default oracle.
pub trait DistanceOracle: Send + Sync {
    fn distance(&self, tag: &TypeTag, target: &HostType) -> Distance;
}

/// The conversion engine. Stateless; every method is a pure function.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversionEngine;

impl DistanceOracle for ConversionEngine {
    fn distance(&self, tag: &TypeTag, target: &HostType) -> Distance {
        self.tag_distance(tag, target)
    }
}

impl ConversionEngine {
    pub fn new() -> Self {
        ConversionEngine
    }

    /// Class-level distance between two host types.
    ///
    /// Array types recurse on their component types.
    pub fn type_distance(&self, from: &HostType, to: &HostType) -> Distance {
        if *from == HostType::Void || *to == HostType::Void {
            return Distance::NONE;
        }
        if let (HostType::Array(from), HostType::Array(to)) = (from, to) {
            return self.type_distance(from, to);
        }
        if to.is_assignable_from(from) {
            return if *to == HostType::Object && from.is_primitive() {
                Distance::BOXED
            } else {
                Distance::EXACT
            };
        }
        match (from, to) {
            (HostType::String, HostType::Bytes) | (HostType::Bytes, HostType::String) => Distance::EXACT,
            (from, to) if from.is_numeric() && to.is_numeric() => Distance::NUMERIC,
            (HostType::String, HostType::Char) => Distance::CHARACTER,
            (from, HostType::Char) if from.is_integral() => Distance::CHARACTER,
            (HostType::Char, to) if to.is_numeric() => Distance::CHARACTER,
            (_, HostType::String) => Distance::TEXT,
            (HostType::String, to) if to.is_numeric() => Distance::PARSE,
            _ => Distance::NONE,
        }
    }

    /// Distance from a call-site tag to a declared parameter type.
    pub fn tag_distance(&self, tag: &TypeTag, to: &HostType) -> Distance {
        match tag {
            TypeTag::Nil => {
                if to.is_reference() {
                    Distance::EXACT
                } else {
                    Distance::NONE
                }
            }
            TypeTag::Type(from) => self.type_distance(from, to),
            TypeTag::Function => match to {
                HostType::Function | HostType::Object => Distance::EXACT,
                HostType::String => Distance::TEXT,
                _ => Distance::NONE,
            },
            TypeTag::Userdata(carried) => {
                let opaque = match to {
                    HostType::Handle | HostType::Object => Distance::EXACT,
                    HostType::String => Distance::TEXT,
                    _ => Distance::NONE,
                };
                let typed = carried
                    .as_ref()
                    .map_or(Distance::NONE, |from| self.type_distance(from, to));
                opaque.max(typed)
            }
        }
    }

    /// Instance-level distance from a value to a host type.
    ///
    /// Refines [`ConversionEngine::tag_distance`] where the value itself
    /// matters: string length for `char` targets and element values for arrays.
    pub fn distance(&self, value: &Value, to: &HostType) -> Distance {
        match (value, to) {
            (Value::Str(s), HostType::Char) => {
                if s.chars().count() == 1 {
                    Distance::CHARACTER
                } else {
                    Distance::NONE
                }
            }
            (Value::Array(array), HostType::Array(element)) => self.array_distance(array, element),
            _ => self.tag_distance(&value.tag(), to),
        }
    }

    fn array_distance(&self, array: &ArrayValue, element: &HostType) -> Distance {
        let declared = self.type_distance(&array.element, element);
        if declared == Distance::EXACT || array.items.is_empty() {
            return declared;
        }
        array
            .items
            .iter()
            .map(|item| self.distance(item, element))
            .min()
            .unwrap_or(Distance::NONE)
    }

    /// Coerce a value into a host type.
    pub fn convert(&self, value: &Value, to: &HostType) -> Result<Value, ConversionError> {
        trace!(value = %value, target = %to, "convert");
        let unsupported = || ConversionError::unsupported(value.type_name(), to);

        if *to == HostType::Void {
            return Err(unsupported());
        }

        match value {
            Value::Nil => {
                return if to.is_reference() { Ok(Value::Nil) } else { Err(unsupported()) };
            }
            Value::Function(_) => {
                return match to {
                    HostType::Function | HostType::Object => Ok(value.clone()),
                    HostType::String => Ok(Value::str(value.to_string())),
                    _ => Err(unsupported()),
                };
            }
            Value::Userdata(data) => {
                if matches!(to, HostType::Handle | HostType::Object) {
                    return Ok(value.clone());
                }
                if let Some(object) = &data.object {
                    if to.is_assignable_from(&HostType::class(object.class())) {
                        return Ok(Value::Object(object.clone()));
                    }
                }
                return match to {
                    HostType::String => Ok(Value::str(value.to_string())),
                    _ => Err(unsupported()),
                };
            }
            Value::Array(array) => {
                if let HostType::Array(element) = to {
                    return self.convert_array(array, element, to);
                }
            }
            _ => {}
        }

        // Identity, subclassing and boxing into `Object` keep the value as is.
        if let Some(from) = value.host_type() {
            if to.is_assignable_from(&from) {
                return Ok(value.clone());
            }
        }

        match (value, to) {
            (Value::Str(s), HostType::Bytes) => Ok(Value::bytes(s.as_bytes())),
            (Value::Bytes(b), HostType::String) => Ok(Value::str(String::from_utf8_lossy(b).as_ref())),
            (_, HostType::String) => Ok(Value::str(value.to_string())),
            (Value::Str(s), HostType::Char) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(unsupported()),
                }
            }
            (Value::Str(s), to) if to.is_numeric() => text::parse_number(s, to),
            (Value::Char(_), to) if to.is_numeric() => self.convert_numeric(value, to),
            (value, HostType::Char) => match Number::of(value) {
                Some(number) if number.is_integral() => convert_number(number, to),
                _ => Err(unsupported()),
            },
            (value, to) if to.is_numeric() => self.convert_numeric(value, to),
            _ => Err(unsupported()),
        }
    }

    fn convert_numeric(&self, value: &Value, to: &HostType) -> Result<Value, ConversionError> {
        match Number::of(value) {
            Some(number) => convert_number(number, to),
            None => Err(ConversionError::unsupported(value.type_name(), to)),
        }
    }

    /// Element-wise array conversion. Assignable arrays are passed through.
    fn convert_array(
        &self,
        array: &ArrayValue,
        element: &HostType,
        to: &HostType,
    ) -> Result<Value, ConversionError> {
        if element.is_assignable_from(&array.element) {
            return Ok(Value::Array(std::sync::Arc::new(array.clone())));
        }
        if !self.array_distance(array, element).is_applicable() {
            return Err(ConversionError::unsupported(
                HostType::array(array.element.clone()),
                to,
            ));
        }
        let items = array
            .items
            .iter()
            .map(|item| self.convert(item, element))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::array(element.clone(), items))
    }

    /// Normalize a host result for the guest runtime.
    ///
    /// Narrow integers widen to 64 bits, `float` widens to `double`, and
    /// characters become one-character strings. Arrays, objects and big
    /// numbers are handed over as they are.
    pub fn to_guest(&self, value: Value) -> Value {
        match value {
            Value::I8(v) => Value::I64(v as i64),
            Value::I16(v) => Value::I64(v as i64),
            Value::I32(v) => Value::I64(v as i64),
            Value::F32(v) => Value::F64(v as f64),
            Value::Char(c) => Value::str(c.to_string()),
            other => other,
        }
    }
}
