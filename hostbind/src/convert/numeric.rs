//! Numeric coercion with range checks.
//!
//! Every numeric source is first lifted into a [`Number`], then narrowed into
//! the target. Bounded integer targets are range-checked, arbitrary-precision
//! sources are compared as big integers before narrowing, floating-point
//! targets never range-check, and decimals built from floating-point numbers
//! go through the number's text.

use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::ConversionError;
use crate::types::HostType;
use crate::value::Value;

/// A numeric value lifted out of its source type.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float32(f32),
    Float64(f64),
    Big(BigInt),
    Dec(Decimal),
}

impl Number {
    /// Lift a numeric or character value. Characters lift to their code point.
    pub(crate) fn of(value: &Value) -> Option<Number> {
        let number = match value {
            Value::I8(v) => Number::Int(*v as i64),
            Value::I16(v) => Number::Int(*v as i64),
            Value::I32(v) => Number::Int(*v as i64),
            Value::I64(v) => Number::Int(*v),
            Value::F32(v) => Number::Float32(*v),
            Value::F64(v) => Number::Float64(*v),
            Value::BigInt(v) => Number::Big(v.clone()),
            Value::Decimal(v) => Number::Dec(*v),
            Value::Char(c) => Number::Int(*c as i64),
            _ => return None,
        };
        Some(number)
    }

    pub(crate) fn is_integral(&self) -> bool {
        matches!(self, Number::Int(_) | Number::Big(_))
    }

    fn render(&self) -> String {
        match self {
            Number::Int(v) => v.to_string(),
            Number::Float32(v) => v.to_string(),
            Number::Float64(v) => v.to_string(),
            Number::Big(v) => v.to_string(),
            Number::Dec(v) => v.to_string(),
        }
    }

    fn overflow(&self, target: &HostType) -> ConversionError {
        ConversionError::overflow(self.render(), target)
    }

    fn to_f64(&self) -> f64 {
        match self {
            Number::Int(v) => *v as f64,
            Number::Float32(v) => *v as f64,
            Number::Float64(v) => *v,
            Number::Big(v) => v.to_f64().unwrap_or(f64::NAN),
            Number::Dec(v) => v.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Truncate towards zero into a big integer.
    fn to_bigint(&self, target: &HostType) -> Result<BigInt, ConversionError> {
        match self {
            Number::Int(v) => Ok(BigInt::from(*v)),
            Number::Big(v) => Ok(v.clone()),
            Number::Float32(v) => float_to_bigint(*v as f64).ok_or_else(|| self.overflow(target)),
            Number::Float64(v) => float_to_bigint(*v).ok_or_else(|| self.overflow(target)),
            Number::Dec(v) => v
                .trunc()
                .to_i128()
                .map(BigInt::from)
                .ok_or_else(|| self.overflow(target)),
        }
    }
}

fn float_to_bigint(v: f64) -> Option<BigInt> {
    if !v.is_finite() {
        return None;
    }
    BigInt::from_f64(v.trunc())
}

/// Convert a number into the given numeric target.
pub(crate) fn convert_number(number: Number, target: &HostType) -> Result<Value, ConversionError> {
    if let Some((min, max)) = target.integral_bounds() {
        let v = narrow_to_i64(&number, target, min, max)?;
        return Ok(integral_value(target, v));
    }

    match target {
        HostType::Float => Ok(Value::F32(match number {
            Number::Float32(v) => v,
            other => other.to_f64() as f32,
        })),
        HostType::Double => Ok(Value::F64(number.to_f64())),
        HostType::BigInteger => number.to_bigint(target).map(Value::BigInt),
        HostType::BigDecimal => to_decimal(&number, target).map(Value::Decimal),
        HostType::Char => to_char(&number, target).map(Value::Char),
        _ => Err(ConversionError::unsupported(number.render(), target)),
    }
}

fn narrow_to_i64(number: &Number, target: &HostType, min: i64, max: i64) -> Result<i64, ConversionError> {
    let v = match number {
        Number::Int(v) => *v,
        Number::Float32(_) | Number::Float64(_) => {
            let f = number.to_f64();
            // `max as f64 + 1.0` is exact for every bound, including 2^63.
            if !f.is_finite() || f.trunc() < min as f64 || f.trunc() >= max as f64 + 1.0 {
                return Err(number.overflow(target));
            }
            f.trunc() as i64
        }
        Number::Big(_) | Number::Dec(_) => {
            let big = number.to_bigint(target)?;
            if big < BigInt::from(min) || big > BigInt::from(max) {
                return Err(number.overflow(target));
            }
            big.to_i64().ok_or_else(|| number.overflow(target))?
        }
    };
    if v < min || v > max {
        return Err(number.overflow(target));
    }
    Ok(v)
}

fn integral_value(target: &HostType, v: i64) -> Value {
    match target {
        HostType::Byte => Value::I8(v as i8),
        HostType::Short => Value::I16(v as i16),
        HostType::Int => Value::I32(v as i32),
        _ => Value::I64(v),
    }
}

fn to_decimal(number: &Number, target: &HostType) -> Result<Decimal, ConversionError> {
    match number {
        Number::Int(v) => Ok(Decimal::from(*v)),
        Number::Dec(v) => Ok(*v),
        // Never build a decimal from the binary value directly.
        Number::Float32(_) | Number::Float64(_) | Number::Big(_) => {
            let text = number.render();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map_err(|_| number.overflow(target))
        }
    }
}

fn to_char(number: &Number, target: &HostType) -> Result<char, ConversionError> {
    let code = match number {
        Number::Int(v) => u32::try_from(*v).ok(),
        Number::Big(v) => v.to_u32(),
        _ => return Err(ConversionError::unsupported(number.render(), target)),
    };
    code.and_then(char::from_u32).ok_or_else(|| number.overflow(target))
}
