//! Overload resolution for guest calls into the host.
//!
//! This module selects which member of an overload set a dynamically typed
//! call should run, using only the runtime type tags of its arguments.
//!
//! # Algorithm Overview
//!
//! Candidates pass through successive elimination passes; each pass only
//! sees the survivors of the previous one, and order is never changed:
//!
//! 1. **Static context**: static members for static calls, instance members otherwise
//! 2. **Arity**: exact for fixed-arity members, at least the fixed prefix for variadics
//! 3. **Applicability**: every argument must have a non-zero distance to its parameter
//! 4. **Variadic suppression**: variadics drop out if any fixed-arity member survived
//! 5. **Closeness**: members dominated on distance by another member drop out
//! 6. **Specificity**: members with a strictly more specific rival drop out
//!
//! Exactly one survivor is the result; none is `NoMatch`, several is `Ambiguous`.
//!
//! # Module Structure
//!
//! - [`signature`] - Call-site signatures used as cache keys
//! - [`result`] - Resolution errors
//! - [`resolver`] - The elimination passes
//! - [`cache`] - Memoized resolutions per call-site signature

mod signature;
mod result;
mod resolver;
mod cache;

#[cfg(test)]
mod tests;

pub use signature::{
    CallSiteSignature,
    Dispatch,
};

pub use result::{
    ResolutionError,
    NoMatchError,
    AmbiguityError,
};

pub use resolver::OverloadResolver;

pub use cache::{
    CallSiteCache,
    CacheStats,
};
