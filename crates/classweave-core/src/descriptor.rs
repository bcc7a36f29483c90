//! Declarative type, method, and constructor descriptors.
//!
//! The synthesis core never inspects live objects; everything it needs to
//! know about a base type and its interfaces is stated up front as a
//! [`TypeDescriptor`]: the method surface, the visible constructor set, the
//! ancestor chain, and the implemented interfaces. Descriptors are built
//! once through [`TypeDescriptorBuilder`] and then shared immutably via
//! `Arc`.
//!
//! Method identity for override deduplication is [`MethodKey`]: the name
//! plus the parameter types. Return type and owner are deliberately
//! excluded.
//!
//! # Example
//!
//! ```
//! use classweave_core::{Modifiers, ParamType, TypeDescriptor};
//!
//! let animal = TypeDescriptor::class("Animal")
//!     .constructor(&[], Modifiers::PUBLIC)
//!     .constructor(&[ParamType::Str], Modifiers::PUBLIC)
//!     .method("speak", &[], ParamType::Str, Modifiers::PUBLIC)
//!     .method("tag", &[], ParamType::Str, Modifiers::PUBLIC | Modifiers::FINAL)
//!     .build();
//!
//! assert_eq!(animal.visible_constructors().count(), 2);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::{Modifiers, TypeHash};

/// Structural parameter and return types.
///
/// The synthesis core is agnostic to a full type system; it only needs
/// enough structure to deduplicate method signatures, select constructors,
/// and type the storage it declares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    Void,
    Bool,
    Int,
    Float,
    Str,
    /// A named object type.
    Object(Arc<str>),
    /// A callback handler reference.
    Callback,
    /// A method-descriptor constant (used for generator static fields).
    Method,
    /// A list of parameter types (explicit-argument construction).
    TypeList,
    /// A list of runtime values (explicit-argument construction).
    ValueList,
    /// A callback bundle.
    Bundle,
}

impl ParamType {
    /// Shorthand for a named object type.
    pub fn object(name: &str) -> Self {
        ParamType::Object(Arc::from(name))
    }

    /// Token mixed into identity hashes. Object types are prefixed so a
    /// type named like a primitive cannot collide with it.
    pub fn identity_token(&self) -> Cow<'_, str> {
        match self {
            ParamType::Void => Cow::Borrowed("void"),
            ParamType::Bool => Cow::Borrowed("bool"),
            ParamType::Int => Cow::Borrowed("int"),
            ParamType::Float => Cow::Borrowed("float"),
            ParamType::Str => Cow::Borrowed("str"),
            ParamType::Object(name) => Cow::Owned(format!("object:{name}")),
            ParamType::Callback => Cow::Borrowed("callback"),
            ParamType::Method => Cow::Borrowed("method"),
            ParamType::TypeList => Cow::Borrowed("typelist"),
            ParamType::ValueList => Cow::Borrowed("valuelist"),
            ParamType::Bundle => Cow::Borrowed("bundle"),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Object(name) => write!(f, "{name}"),
            other => write!(f, "{}", other.identity_token()),
        }
    }
}

/// Method identity: name plus parameter types.
///
/// Two methods with the same key are the same override slot regardless of
/// return type or owning type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub name: Arc<str>,
    pub params: Vec<ParamType>,
}

impl MethodKey {
    pub fn new(name: &str, params: &[ParamType]) -> Self {
        Self {
            name: Arc::from(name),
            params: params.to_vec(),
        }
    }

    /// Deterministic hash identity of this key.
    pub fn hash_id(&self) -> TypeHash {
        TypeHash::from_method(&self.name, &self.params)
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ")")
    }
}

/// A method on a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: Arc<str>,
    pub params: Vec<ParamType>,
    pub return_type: ParamType,
    pub modifiers: Modifiers,
    /// Name of the declaring type. Not part of identity.
    pub owner: Arc<str>,
}

impl MethodDescriptor {
    pub fn new(
        owner: &str,
        name: &str,
        params: &[ParamType],
        return_type: ParamType,
        modifiers: Modifiers,
    ) -> Self {
        Self {
            name: Arc::from(name),
            params: params.to_vec(),
            return_type,
            modifiers,
            owner: Arc::from(owner),
        }
    }

    /// Identity key: (name, parameter types).
    pub fn key(&self) -> MethodKey {
        MethodKey {
            name: self.name.clone(),
            params: self.params.clone(),
        }
    }

    /// Deterministic hash identity.
    pub fn hash_id(&self) -> TypeHash {
        TypeHash::from_method(&self.name, &self.params)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.key())
    }
}

/// A constructor on a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDescriptor {
    pub params: Vec<ParamType>,
    pub modifiers: Modifiers,
}

impl ConstructorDescriptor {
    pub fn new(params: &[ParamType], modifiers: Modifiers) -> Self {
        Self {
            params: params.to_vec(),
            modifiers,
        }
    }

    /// Deterministic hash identity (parameter types only).
    pub fn hash_id(&self) -> TypeHash {
        TypeHash::from_constructor(&self.params)
    }
}

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
}

/// A declared type: the unit the synthesis core reasons about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: Arc<str>,
    pub kind: TypeKind,
    pub methods: Vec<MethodDescriptor>,
    pub constructors: Vec<ConstructorDescriptor>,
    pub superclass: Option<Arc<TypeDescriptor>>,
    pub interfaces: Vec<Arc<TypeDescriptor>>,
}

impl TypeDescriptor {
    /// Start building a class descriptor.
    pub fn class(name: &str) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder::new(name, TypeKind::Class)
    }

    /// Start building an interface descriptor.
    pub fn interface(name: &str) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder::new(name, TypeKind::Interface)
    }

    /// Constructors visible to a subclass.
    pub fn visible_constructors(&self) -> impl Iterator<Item = &ConstructorDescriptor> {
        self.constructors
            .iter()
            .filter(|c| c.modifiers.is_visible())
    }

    /// Find a declared method by identity key.
    pub fn find_method(&self, key: &MethodKey) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| &m.key() == key)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builder for [`TypeDescriptor`].
pub struct TypeDescriptorBuilder {
    name: Arc<str>,
    kind: TypeKind,
    methods: Vec<MethodDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
    superclass: Option<Arc<TypeDescriptor>>,
    interfaces: Vec<Arc<TypeDescriptor>>,
}

impl TypeDescriptorBuilder {
    fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
            methods: Vec::new(),
            constructors: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
        }
    }

    /// Declare a method. The owner is filled in from the builder.
    pub fn method(
        mut self,
        name: &str,
        params: &[ParamType],
        return_type: ParamType,
        modifiers: Modifiers,
    ) -> Self {
        self.methods.push(MethodDescriptor::new(
            &self.name,
            name,
            params,
            return_type,
            modifiers,
        ));
        self
    }

    /// Declare a constructor.
    pub fn constructor(mut self, params: &[ParamType], modifiers: Modifiers) -> Self {
        self.constructors
            .push(ConstructorDescriptor::new(params, modifiers));
        self
    }

    /// Set the superclass.
    pub fn extends(mut self, superclass: Arc<TypeDescriptor>) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Add an implemented interface.
    pub fn implements(mut self, interface: Arc<TypeDescriptor>) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor {
            name: self.name,
            kind: self.kind,
            methods: self.methods,
            constructors: self.constructors,
            superclass: self.superclass,
            interfaces: self.interfaces,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_return_type_and_owner() {
        let a = MethodDescriptor::new("Animal", "speak", &[], ParamType::Str, Modifiers::PUBLIC);
        let b = MethodDescriptor::new("Dog", "speak", &[], ParamType::Void, Modifiers::PUBLIC);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.hash_id(), b.hash_id());
    }

    #[test]
    fn key_distinguishes_parameter_types() {
        let a = MethodKey::new("feed", &[ParamType::Int]);
        let b = MethodKey::new("feed", &[ParamType::Str]);
        assert_ne!(a, b);
    }

    #[test]
    fn visible_constructors_excludes_private() {
        let ty = TypeDescriptor::class("Animal")
            .constructor(&[], Modifiers::PUBLIC)
            .constructor(&[ParamType::Int], Modifiers::PRIVATE)
            .build();
        let visible: Vec<_> = ty.visible_constructors().collect();
        assert_eq!(visible.len(), 1);
        assert!(visible[0].params.is_empty());
    }

    #[test]
    fn display_formats_signature() {
        let key = MethodKey::new("feed", &[ParamType::Str, ParamType::Int]);
        assert_eq!(key.to_string(), "feed(str, int)");
    }
}
