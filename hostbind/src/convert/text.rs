//! Parsing text into numeric targets.
//!
//! Whitespace anywhere in the text is ignored and blank text converts to nil.
//! An optionally negated `0x`, `0X` or `#` prefix selects hexadecimal for
//! every numeric target. A leading `0` followed by more digits selects octal,
//! but only for `BigInteger` targets; everything else is decimal.

use std::str::FromStr;

use num_bigint::BigInt;
use rust_decimal::Decimal;

use super::numeric::{convert_number, Number};
use crate::error::ConversionError;
use crate::types::HostType;
use crate::value::Value;

pub(crate) fn parse_number(text: &str, target: &HostType) -> Result<Value, ConversionError> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Ok(Value::Nil);
    }

    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    if let Some(digits) = hex_digits(body) {
        let big = parse_integer(digits, negative, 16, &cleaned, target)?;
        return convert_number(Number::Big(big), target);
    }

    match target {
        HostType::Byte | HostType::Short | HostType::Int | HostType::Long => {
            let big = parse_integer(body, negative, 10, &cleaned, target)?;
            convert_number(Number::Big(big), target)
        }
        HostType::BigInteger => {
            let radix = if body.len() > 1 && body.starts_with('0') { 8 } else { 10 };
            parse_integer(body, negative, radix, &cleaned, target).map(Value::BigInt)
        }
        HostType::Float => cleaned
            .parse::<f32>()
            .map(Value::F32)
            .map_err(|_| ConversionError::parse_failure(&cleaned, target, 10)),
        HostType::Double => cleaned
            .parse::<f64>()
            .map(Value::F64)
            .map_err(|_| ConversionError::parse_failure(&cleaned, target, 10)),
        HostType::BigDecimal => Decimal::from_str(&cleaned)
            .or_else(|_| Decimal::from_scientific(&cleaned))
            .map(Value::Decimal)
            .map_err(|_| ConversionError::parse_failure(&cleaned, target, 10)),
        _ => Err(ConversionError::unsupported(format!("{:?}", text), target)),
    }
}

fn hex_digits(body: &str) -> Option<&str> {
    body.strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .or_else(|| body.strip_prefix('#'))
}

fn parse_integer(
    digits: &str,
    negative: bool,
    radix: u32,
    text: &str,
    target: &HostType,
) -> Result<BigInt, ConversionError> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ConversionError::parse_failure(text, target, radix));
    }
    let magnitude = BigInt::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| ConversionError::parse_failure(text, target, radix))?;
    Ok(if negative { -magnitude } else { magnitude })
}
