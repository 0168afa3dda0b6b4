//! Host model files.
//!
//! A model file describes a handful of host classes and their members in
//! JSON, so resolution can be explored without a real host:
//!
//! ```json
//! {
//!   "classes": [
//!     { "name": "Animal" },
//!     {
//!       "name": "Dog",
//!       "supertypes": ["Animal"],
//!       "members": [
//!         { "kind": "constructor", "params": ["String"] },
//!         { "name": "bark", "kind": "method", "params": ["int"], "returns": "String" },
//!         { "name": "name", "kind": "field", "returns": "String" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Supertypes must be declared before the classes deriving from them.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hostbind::{ClassRef, HostType, MemberDescriptor, MemberTable};

/// Errors raised while loading or building a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("class `{0}` is declared twice")]
    DuplicateClass(String),

    #[error("supertype `{supertype}` of `{class}` must be declared before it")]
    UnknownSupertype { class: String, supertype: String },

    #[error("unknown type `{name}` in {context}")]
    UnknownType { name: String, context: String },

    #[error("member #{index} of `{class}` needs a name")]
    MissingName { class: String, index: usize },
}

/// The on-disk model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub classes: Vec<ClassSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKindSpec {
    Method,
    Constructor,
    ProxyConstructor,
    Field,
    Property,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    /// Ignored for constructors, which are always named `new`.
    #[serde(default)]
    pub name: Option<String>,
    pub kind: MemberKindSpec,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub variadic: bool,
    /// Return type of a method, value type of a field or property.
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub raw_return: bool,
    #[serde(default = "default_true")]
    pub readable: bool,
    #[serde(default)]
    pub writable: bool,
}

fn default_true() -> bool {
    true
}

impl ModelFile {
    pub fn from_json(source: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let source = fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Resolve class names and build one member table per class.
    pub fn build(&self) -> Result<Model, ModelError> {
        let mut classes: IndexMap<String, ClassRef> = IndexMap::new();
        for spec in &self.classes {
            if classes.contains_key(&spec.name) {
                return Err(ModelError::DuplicateClass(spec.name.clone()));
            }
            let supertypes = spec
                .supertypes
                .iter()
                .map(|name| {
                    classes.get(name).cloned().ok_or_else(|| ModelError::UnknownSupertype {
                        class: spec.name.clone(),
                        supertype: name.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            classes.insert(
                spec.name.clone(),
                ClassRef::with_supertypes(spec.name.as_str(), supertypes),
            );
        }

        let mut model = Model {
            classes,
            tables: IndexMap::new(),
        };
        for spec in &self.classes {
            let table = model.build_table(spec)?;
            model.tables.insert(spec.name.clone(), table);
        }
        Ok(model)
    }
}

/// A built model: class references and their member tables.
#[derive(Debug, Clone)]
pub struct Model {
    classes: IndexMap<String, ClassRef>,
    tables: IndexMap<String, MemberTable>,
}

impl Model {
    pub fn class(&self, name: &str) -> Option<&ClassRef> {
        self.classes.get(name)
    }

    pub fn table(&self, name: &str) -> Option<&MemberTable> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &MemberTable> {
        self.tables.values()
    }

    /// Parse a type name, resolving class names against this model.
    pub fn parse_type(&self, name: &str) -> Option<HostType> {
        HostType::parse(name, |class| self.classes.get(class).cloned())
    }

    fn resolve_type(&self, name: &str, context: impl FnOnce() -> String) -> Result<HostType, ModelError> {
        self.parse_type(name).ok_or_else(|| ModelError::UnknownType {
            name: name.to_string(),
            context: context(),
        })
    }

    fn build_table(&self, spec: &ClassSpec) -> Result<MemberTable, ModelError> {
        let owner = &self.classes[spec.name.as_str()];
        let descriptors = spec
            .members
            .iter()
            .enumerate()
            .map(|(index, member)| self.build_member(owner, index, member))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MemberTable::new(owner, descriptors))
    }

    fn build_member(&self, owner: &ClassRef, index: usize, spec: &MemberSpec) -> Result<MemberDescriptor, ModelError> {
        let name = || {
            spec.name.clone().ok_or_else(|| ModelError::MissingName {
                class: owner.name().to_string(),
                index,
            })
        };
        let label = spec.name.as_deref().unwrap_or("new");
        let context = || format!("`{}.{}`", owner.name(), label);

        let params = spec
            .params
            .iter()
            .map(|p| self.resolve_type(p, context))
            .collect::<Result<Vec<_>, _>>()?;
        let returns = match &spec.returns {
            Some(ty) => self.resolve_type(ty, context)?,
            None => HostType::Void,
        };

        let mut descriptor = match spec.kind {
            MemberKindSpec::Method => MemberDescriptor::method(owner, name()?, params, returns),
            MemberKindSpec::Constructor => MemberDescriptor::constructor(owner, params),
            MemberKindSpec::ProxyConstructor => MemberDescriptor::proxy_constructor(owner),
            MemberKindSpec::Field => MemberDescriptor::field(owner, name()?, returns, spec.writable),
            MemberKindSpec::Property => {
                MemberDescriptor::property(owner, name()?, returns, spec.readable, spec.writable)
            }
        };
        if spec.is_static {
            descriptor = descriptor.into_static();
        }
        if spec.variadic {
            descriptor = descriptor.variadic();
        }
        if spec.raw_return {
            descriptor = descriptor.raw_return();
        }
        Ok(descriptor.with_index(index))
    }
}
