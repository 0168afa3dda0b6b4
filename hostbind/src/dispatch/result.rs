//! Resolution result types and errors.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::callsite::{render_tags, TypeTag};
use crate::member::MemberDescriptor;

/// Why an overload set could not be narrowed to one member.
#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    #[error(transparent)]
    NoMatch(#[from] NoMatchError),
    #[error(transparent)]
    Ambiguous(#[from] AmbiguityError),
}

impl ResolutionError {
    pub fn member_name(&self) -> &str {
        match self {
            ResolutionError::NoMatch(err) => &err.member_name,
            ResolutionError::Ambiguous(err) => &err.member_name,
        }
    }

    pub fn arg_tags(&self) -> &[TypeTag] {
        match self {
            ResolutionError::NoMatch(err) => &err.arg_tags,
            ResolutionError::Ambiguous(err) => &err.arg_tags,
        }
    }
}

/// Error when no member accepts the arguments.
#[derive(Debug, Clone)]
pub struct NoMatchError {
    /// The declaring type the call was made on.
    pub owner: String,
    /// The member name that was called.
    pub member_name: String,
    /// The argument tags provided.
    pub arg_tags: Vec<TypeTag>,
    /// All candidates that were considered.
    pub candidates: Vec<Arc<MemberDescriptor>>,
}

impl fmt::Display for NoMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no overload of `{}.{}` accepts {}",
            self.owner,
            self.member_name,
            render_tags(&self.arg_tags)
        )?;
        write_candidates(f, "candidates", &self.candidates)
    }
}

impl std::error::Error for NoMatchError {}

/// Error when several members remain after every elimination pass.
#[derive(Debug, Clone)]
pub struct AmbiguityError {
    /// The declaring type the call was made on.
    pub owner: String,
    /// The member name that was called.
    pub member_name: String,
    /// The argument tags provided.
    pub arg_tags: Vec<TypeTag>,
    /// The tied candidates.
    pub candidates: Vec<Arc<MemberDescriptor>>,
}

impl fmt::Display for AmbiguityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "call to `{}.{}` with {} is ambiguous",
            self.owner,
            self.member_name,
            render_tags(&self.arg_tags)
        )?;
        write_candidates(f, "tied candidates", &self.candidates)
    }
}

impl std::error::Error for AmbiguityError {}

fn write_candidates(
    f: &mut fmt::Formatter<'_>,
    heading: &str,
    candidates: &[Arc<MemberDescriptor>],
) -> fmt::Result {
    if candidates.is_empty() {
        return write!(f, "; no {} declared", heading);
    }
    write!(f, "; {}:", heading)?;
    for candidate in candidates {
        write!(f, "\n  {}", candidate)?;
    }
    Ok(())
}
