//! Hostbind
//!
//! Calls from a dynamically typed guest runtime into a statically typed host
//! object model.
//!
//! # Features
//!
//! - Overload resolution from runtime argument tags alone
//! - A distance-ranked conversion engine with checked numeric narrowing
//! - Per-call-site memoization of resolution decisions, safe under concurrency
//! - Uniform invoke/read/write over fields, properties, methods and constructors
//!
//! # Example
//!
//! ```rust,ignore
//! use hostbind::{ArgumentList, CallTarget, Config, Dispatcher, MemberTable, Value};
//!
//! let mut dispatcher = Dispatcher::new(accessor, &Config::default());
//! dispatcher.register(MemberTable::new(&math, descriptors));
//!
//! let args: ArgumentList = vec![Value::I64(3)].into_iter().collect();
//! let result = dispatcher.resolve_and_invoke(&math, "abs", &CallTarget::Static(math.clone()), &args)?;
//! ```

pub mod accessor;
pub mod callsite;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod dispatcher;
pub mod error;
pub mod member;
pub mod types;
pub mod value;

pub use accessor::{AccessorFamily, CallTarget, FastAccessor};
pub use callsite::{ArgumentList, GuestStack, TypeTag};
pub use config::{CacheConfig, Config, ConfigError};
pub use convert::{ConversionEngine, Distance, DistanceOracle};
pub use dispatch::{
    AmbiguityError, CallSiteCache, CallSiteSignature, Dispatch, NoMatchError, OverloadResolver,
    ResolutionError,
};
pub use dispatcher::Dispatcher;
pub use error::{
    AccessError, ConversionError, DispatchError, DispatchResult, HostFailure, InvocationError,
};
pub use member::{Capabilities, MemberDescriptor, MemberKind, MemberTable, OverloadSet};
pub use types::{ClassRef, HostType};
pub use value::{ArrayValue, FunctionRef, HostObject, Userdata, Value};
