//! Error types for conversion, resolution, invocation and member access.

use std::error::Error as StdError;

use thiserror::Error;

use crate::dispatch::ResolutionError;
use crate::types::HostType;

/// A failure raised by the host while running an invoked member.
pub type HostFailure = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced while coercing a value into a host type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("value {value} does not fit in {target}")]
    Overflow { value: String, target: HostType },

    #[error("no conversion from {from} to {target}")]
    Unsupported { from: String, target: HostType },

    #[error("cannot parse {text:?} as {target} in radix {radix}")]
    ParseFailure {
        text: String,
        target: HostType,
        radix: u32,
    },
}

impl ConversionError {
    pub(crate) fn overflow(value: impl ToString, target: &HostType) -> Self {
        ConversionError::Overflow {
            value: value.to_string(),
            target: target.clone(),
        }
    }

    pub(crate) fn unsupported(from: impl ToString, target: &HostType) -> Self {
        ConversionError::Unsupported {
            from: from.to_string(),
            target: target.clone(),
        }
    }

    pub(crate) fn parse_failure(text: &str, target: &HostType, radix: u32) -> Self {
        ConversionError::ParseFailure {
            text: text.to_string(),
            target: target.clone(),
            radix,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ConversionError::Unsupported { .. })
    }
}

/// A failure raised by an invoked host member.
///
/// The original failure is kept intact; [`InvocationError::cause`] and
/// [`InvocationError::into_cause`] hand it back unwrapped.
#[derive(Debug, Error)]
#[error("{owner}.{member}: {cause}")]
pub struct InvocationError {
    pub owner: String,
    pub member: String,
    #[source]
    cause: HostFailure,
}

impl InvocationError {
    pub fn new(owner: impl Into<String>, member: impl Into<String>, cause: HostFailure) -> Self {
        Self {
            owner: owner.into(),
            member: member.into(),
            cause,
        }
    }

    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    pub fn into_cause(self) -> HostFailure {
        self.cause
    }
}

/// Reading or writing a member that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("{what} `{owner}.{member}` is read-only")]
    ReadOnly {
        owner: String,
        member: String,
        what: &'static str,
    },

    #[error("{what} `{owner}.{member}` is write-only")]
    WriteOnly {
        owner: String,
        member: String,
        what: &'static str,
    },

    #[error("`{owner}.{member}` has no readable or writable member")]
    NotAccessible { owner: String, member: String },

    #[error("`{owner}.{member}` has no invocable member")]
    NotInvocable { owner: String, member: String },

    #[error("static call on `{target}` cannot reach `{owner}.{member}`")]
    ForeignTarget {
        owner: String,
        member: String,
        target: String,
    },
}

/// Everything that can go wrong on the way from a guest call to the host.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("argument {index} of `{owner}.{member}`: {source}")]
    Argument {
        owner: String,
        member: String,
        index: usize,
        #[source]
        source: ConversionError,
    },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("`{owner}.{member}` takes {expected} arguments, got {found}")]
    Arity {
        owner: String,
        member: String,
        expected: usize,
        found: usize,
    },

    #[error("no member `{member}` on `{owner}`")]
    UnknownMember { owner: String, member: String },

    #[error("stack holds {available} values, call needs {needed}")]
    StackUnderflow { needed: usize, available: usize },
}

/// Result alias for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
