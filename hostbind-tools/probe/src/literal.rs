//! Command-line spellings of type tags and guest values.

use thiserror::Error;

use hostbind::{FunctionRef, TypeTag, Userdata, Value};

use crate::model::Model;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LiteralError {
    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("unterminated string literal {0}")]
    Unterminated(String),
}

/// Parse a call-site tag: `nil`, `function`, `userdata`, `userdata<T>` or a
/// type name.
pub fn parse_tag(text: &str, model: &Model) -> Result<TypeTag, LiteralError> {
    let text = text.trim();
    match text {
        "nil" => return Ok(TypeTag::Nil),
        "function" => return Ok(TypeTag::Function),
        "userdata" => return Ok(TypeTag::Userdata(None)),
        _ => {}
    }
    if let Some(inner) = text.strip_prefix("userdata<").and_then(|t| t.strip_suffix('>')) {
        return model
            .parse_type(inner)
            .map(|ty| TypeTag::Userdata(Some(ty)))
            .ok_or_else(|| LiteralError::UnknownType(inner.to_string()));
    }
    model
        .parse_type(text)
        .map(TypeTag::Type)
        .ok_or_else(|| LiteralError::UnknownType(text.to_string()))
}

/// Parse a guest value the way a script would write it.
///
/// `nil`, `true` and `false` are themselves, integers become 64-bit guest
/// integers, other numbers become doubles, `fn:N` and `ud:N` name a
/// function or userdata handle, and everything else is a string. Quote a
/// value to force a string.
pub fn parse_value(text: &str) -> Result<Value, LiteralError> {
    if let Some(quoted) = text.strip_prefix('"') {
        return quoted
            .strip_suffix('"')
            .map(Value::str)
            .ok_or_else(|| LiteralError::Unterminated(text.to_string()));
    }
    let value = match text {
        "nil" => Value::Nil,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(v) = text.parse::<i64>() {
                Value::I64(v)
            } else if let Some(handle) = text.strip_prefix("fn:").and_then(|h| h.parse().ok()) {
                Value::Function(FunctionRef(handle))
            } else if let Some(handle) = text.strip_prefix("ud:").and_then(|h| h.parse().ok()) {
                Value::Userdata(Userdata::opaque(handle))
            } else if let Ok(v) = text.parse::<f64>() {
                Value::F64(v)
            } else {
                Value::str(text)
            }
        }
    };
    Ok(value)
}
