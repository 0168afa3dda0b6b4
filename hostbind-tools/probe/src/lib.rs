//! Hostbind Probe
//!
//! Explore overload resolution and value conversion against a host model
//! described in a JSON file, without a running host or guest.
//!
//! # Example
//!
//! ```text
//! hostbind-probe --model zoo.json resolve Dog bark int
//! hostbind-probe distance long int
//! hostbind-probe convert 0x1F --to int
//! ```

pub mod literal;
pub mod model;

pub use literal::{parse_tag, parse_value, LiteralError};
pub use model::{Model, ModelError, ModelFile};
