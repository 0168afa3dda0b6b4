//! Static types of the host object model.
//!
//! The resolver and the conversion engine only ever see host types through
//! [`HostType`]. Classes are shared, immutable records ([`ClassRef`]) that
//! know their direct supertypes; assignability walks them transitively.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A class of the host object model.
#[derive(Debug)]
pub struct HostClass {
    /// The class name. Class identity is its name.
    name: Arc<str>,
    /// Direct supertypes, in declaration order.
    supertypes: Vec<ClassRef>,
}

/// Shared handle to a [`HostClass`].
#[derive(Clone)]
pub struct ClassRef(Arc<HostClass>);

impl ClassRef {
    /// Create a root class with no supertypes.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self::with_supertypes(name, Vec::new())
    }

    /// Create a class deriving from the given supertypes.
    pub fn with_supertypes(name: impl Into<Arc<str>>, supertypes: Vec<ClassRef>) -> Self {
        ClassRef(Arc::new(HostClass {
            name: name.into(),
            supertypes,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn supertypes(&self) -> &[ClassRef] {
        &self.0.supertypes
    }

    /// Reflexive, transitive subclass check.
    pub fn is_subclass_of(&self, other: &ClassRef) -> bool {
        if self == other {
            return true;
        }
        self.supertypes().iter().any(|sup| sup.is_subclass_of(other))
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name())
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A static host type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    Bool,
    Char,
    /// 8-bit signed integer.
    Byte,
    /// 16-bit signed integer.
    Short,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    Float,
    Double,
    /// Arbitrary-precision integer.
    BigInteger,
    /// Arbitrary-precision decimal.
    BigDecimal,
    String,
    /// Raw byte sequence.
    Bytes,
    /// The top type.
    Object,
    /// A guest callable passed through to the host.
    Function,
    /// An opaque native handle.
    Handle,
    Class(ClassRef),
    Array(Box<HostType>),
    /// Only valid as a return type.
    Void,
}

impl HostType {
    pub fn array(element: HostType) -> Self {
        HostType::Array(Box::new(element))
    }

    pub fn class(class: &ClassRef) -> Self {
        HostType::Class(class.clone())
    }

    /// Primitive value types; everything else except `Void` is a reference.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            HostType::Bool
                | HostType::Char
                | HostType::Byte
                | HostType::Short
                | HostType::Int
                | HostType::Long
                | HostType::Float
                | HostType::Double
        )
    }

    pub fn is_reference(&self) -> bool {
        !self.is_primitive() && *self != HostType::Void
    }

    /// The standard numeric types, bounded and arbitrary-precision.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            HostType::Byte
                | HostType::Short
                | HostType::Int
                | HostType::Long
                | HostType::Float
                | HostType::Double
                | HostType::BigInteger
                | HostType::BigDecimal
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            HostType::Byte | HostType::Short | HostType::Int | HostType::Long | HostType::BigInteger
        )
    }

    /// `[MIN, MAX]` for the bounded integer types.
    pub fn integral_bounds(&self) -> Option<(i64, i64)> {
        match self {
            HostType::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            HostType::Short => Some((i16::MIN as i64, i16::MAX as i64)),
            HostType::Int => Some((i32::MIN as i64, i32::MAX as i64)),
            HostType::Long => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Check whether a value of type `from` can be used where `self` is
    /// expected without any conversion.
    ///
    /// - Every type is assignable to itself
    /// - `Object` is assignable from everything but `Void`
    /// - A class is assignable from its transitive subclasses
    /// - Arrays are covariant: `T[]` is assignable from `S[]` when `T` is from `S`
    pub fn is_assignable_from(&self, from: &HostType) -> bool {
        if self == from {
            return true;
        }
        match (self, from) {
            (_, HostType::Void) | (HostType::Void, _) => false,
            (HostType::Object, _) => true,
            (HostType::Class(to), HostType::Class(from)) => from.is_subclass_of(to),
            (HostType::Array(to), HostType::Array(from)) => to.is_assignable_from(from),
            _ => false,
        }
    }

    /// Parse a type name such as `int`, `String`, `Point` or `long[][]`.
    ///
    /// Class names are looked up with `classes`.
    pub fn parse<F>(name: &str, classes: F) -> Option<HostType>
    where
        F: Fn(&str) -> Option<ClassRef>,
    {
        let name = name.trim();
        if let Some(element) = name.strip_suffix("[]") {
            return HostType::parse(element, classes).map(HostType::array);
        }
        let ty = match name {
            "boolean" | "bool" => HostType::Bool,
            "char" => HostType::Char,
            "byte" => HostType::Byte,
            "short" => HostType::Short,
            "int" => HostType::Int,
            "long" => HostType::Long,
            "float" => HostType::Float,
            "double" => HostType::Double,
            "BigInteger" => HostType::BigInteger,
            "BigDecimal" => HostType::BigDecimal,
            "String" => HostType::String,
            "bytes" => HostType::Bytes,
            "Object" => HostType::Object,
            "function" => HostType::Function,
            "handle" => HostType::Handle,
            "void" => HostType::Void,
            other => HostType::Class(classes(other)?),
        };
        Some(ty)
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Bool => f.write_str("boolean"),
            HostType::Char => f.write_str("char"),
            HostType::Byte => f.write_str("byte"),
            HostType::Short => f.write_str("short"),
            HostType::Int => f.write_str("int"),
            HostType::Long => f.write_str("long"),
            HostType::Float => f.write_str("float"),
            HostType::Double => f.write_str("double"),
            HostType::BigInteger => f.write_str("BigInteger"),
            HostType::BigDecimal => f.write_str("BigDecimal"),
            HostType::String => f.write_str("String"),
            HostType::Bytes => f.write_str("bytes"),
            HostType::Object => f.write_str("Object"),
            HostType::Function => f.write_str("function"),
            HostType::Handle => f.write_str("handle"),
            HostType::Class(class) => f.write_str(class.name()),
            HostType::Array(element) => write!(f, "{}[]", element),
            HostType::Void => f.write_str("void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> (ClassRef, ClassRef, ClassRef) {
        let animal = ClassRef::new("Animal");
        let pet = ClassRef::new("Pet");
        let dog = ClassRef::with_supertypes("Dog", vec![animal.clone(), pet.clone()]);
        (animal, pet, dog)
    }

    #[test]
    fn test_subclass_is_transitive() {
        let (animal, pet, dog) = hierarchy();
        let puppy = ClassRef::with_supertypes("Puppy", vec![dog.clone()]);

        assert!(puppy.is_subclass_of(&dog));
        assert!(puppy.is_subclass_of(&animal));
        assert!(puppy.is_subclass_of(&pet));
        assert!(!animal.is_subclass_of(&dog));
    }

    #[test]
    fn test_object_is_top() {
        let (_, _, dog) = hierarchy();
        assert!(HostType::Object.is_assignable_from(&HostType::Int));
        assert!(HostType::Object.is_assignable_from(&HostType::class(&dog)));
        assert!(HostType::Object.is_assignable_from(&HostType::array(HostType::String)));
        assert!(!HostType::Object.is_assignable_from(&HostType::Void));
        assert!(!HostType::Int.is_assignable_from(&HostType::Object));
    }

    #[test]
    fn test_numeric_types_are_not_assignable() {
        assert!(!HostType::Long.is_assignable_from(&HostType::Int));
        assert!(!HostType::Int.is_assignable_from(&HostType::Long));
        assert!(HostType::Int.is_assignable_from(&HostType::Int));
    }

    #[test]
    fn test_array_covariance() {
        let (animal, _, dog) = hierarchy();
        let animals = HostType::array(HostType::class(&animal));
        let dogs = HostType::array(HostType::class(&dog));

        assert!(animals.is_assignable_from(&dogs));
        assert!(!dogs.is_assignable_from(&animals));
        assert!(HostType::array(HostType::Object).is_assignable_from(&dogs));
    }

    #[test]
    fn test_parse_and_display() {
        let (_, _, dog) = hierarchy();
        let lookup = |name: &str| (name == "Dog").then(|| dog.clone());

        let ty = HostType::parse("Dog[][]", lookup).unwrap();
        assert_eq!(ty, HostType::array(HostType::array(HostType::class(&dog))));
        assert_eq!(ty.to_string(), "Dog[][]");

        assert_eq!(HostType::parse(" long ", lookup), Some(HostType::Long));
        assert_eq!(HostType::parse("Cat", lookup), None);
    }

    #[test]
    fn test_integral_bounds() {
        assert_eq!(HostType::Byte.integral_bounds(), Some((-128, 127)));
        assert_eq!(HostType::Long.integral_bounds(), Some((i64::MIN, i64::MAX)));
        assert_eq!(HostType::BigInteger.integral_bounds(), None);
        assert!(HostType::BigInteger.is_integral());
        assert!(!HostType::Double.is_integral());
    }
}
