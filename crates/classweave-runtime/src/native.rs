//! Native base classes.
//!
//! The reference backend extends classes whose behavior is written in
//! Rust: a [`NativeClass`] pairs a declarative [`TypeDescriptor`] with
//! native method and constructor bodies. Native constructors receive the
//! (not yet constructed) instance handle and may make virtual self-calls
//! through it — exactly the situation the transfer-cell handshake exists
//! for.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use classweave_core::{Modifiers, ParamType, TypeDescriptor, Value};
//! use classweave_runtime::NativeClass;
//!
//! let descriptor = TypeDescriptor::class("Animal")
//!     .constructor(&[], Modifiers::PUBLIC)
//!     .method("speak", &[], ParamType::Str, Modifiers::PUBLIC)
//!     .build();
//!
//! let animal = NativeClass::builder(descriptor)
//!     .constructor(&[], |_instance, _args| Ok(()))
//!     .method("speak", &[], |_instance, _args| Ok(Value::Str("...".into())))
//!     .build();
//! assert_eq!(animal.descriptor().name.as_ref(), "Animal");
//! ```

use std::sync::Arc;

use classweave_core::{
    MethodDescriptor, Modifiers, ParamType, TypeDescriptor, TypeHash, Value, WeaveError,
};
use rustc_hash::FxHashMap;

use crate::instance::Instance;

/// Native method body.
pub type NativeMethodFn =
    Arc<dyn Fn(&Instance, &[Value]) -> Result<Value, WeaveError> + Send + Sync>;

/// Native constructor body.
pub type NativeConstructorFn =
    Arc<dyn Fn(&Instance, &[Value]) -> Result<(), WeaveError> + Send + Sync>;

pub(crate) struct NativeMethod {
    pub descriptor: MethodDescriptor,
    pub body: NativeMethodFn,
}

/// A base class with native Rust behavior.
pub struct NativeClass {
    descriptor: Arc<TypeDescriptor>,
    parent: Option<Arc<NativeClass>>,
    methods: FxHashMap<TypeHash, NativeMethod>,
    constructors: FxHashMap<TypeHash, NativeConstructorFn>,
}

impl NativeClass {
    /// Start building a native class for `descriptor`.
    pub fn builder(descriptor: Arc<TypeDescriptor>) -> NativeClassBuilder {
        NativeClassBuilder {
            descriptor,
            parent: None,
            methods: FxHashMap::default(),
            constructors: FxHashMap::default(),
        }
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Find a native method by identity, walking the parent chain.
    pub(crate) fn find_method(&self, hash: TypeHash) -> Option<&NativeMethod> {
        self.methods
            .get(&hash)
            .or_else(|| self.parent.as_ref()?.find_method(hash))
    }

    /// Find a native method by name and arity, walking the parent chain.
    pub(crate) fn find_method_named(&self, name: &str, arity: usize) -> Option<&NativeMethod> {
        self.methods
            .values()
            .find(|m| &*m.descriptor.name == name && m.descriptor.params.len() == arity)
            .or_else(|| self.parent.as_ref()?.find_method_named(name, arity))
    }

    /// Find a constructor by identity. Constructors are not inherited.
    pub(crate) fn find_constructor(&self, hash: TypeHash) -> Option<&NativeConstructorFn> {
        self.constructors.get(&hash)
    }
}

/// Builder for [`NativeClass`].
pub struct NativeClassBuilder {
    descriptor: Arc<TypeDescriptor>,
    parent: Option<Arc<NativeClass>>,
    methods: FxHashMap<TypeHash, NativeMethod>,
    constructors: FxHashMap<TypeHash, NativeConstructorFn>,
}

impl NativeClassBuilder {
    /// Attach the native parent class. The descriptor chain and the
    /// native chain must agree.
    pub fn parent(mut self, parent: Arc<NativeClass>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Supply the body for a declared method. Methods not present on the
    /// descriptor get a synthetic public declaration with a void return.
    pub fn method<F>(mut self, name: &str, params: &[ParamType], body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value, WeaveError> + Send + Sync + 'static,
    {
        let key = classweave_core::MethodKey::new(name, params);
        let descriptor = self
            .descriptor
            .find_method(&key)
            .cloned()
            .unwrap_or_else(|| {
                MethodDescriptor::new(
                    &self.descriptor.name,
                    name,
                    params,
                    ParamType::Void,
                    Modifiers::PUBLIC,
                )
            });
        self.methods.insert(
            descriptor.hash_id(),
            NativeMethod {
                descriptor,
                body: Arc::new(body),
            },
        );
        self
    }

    /// Supply the body for a declared constructor.
    pub fn constructor<F>(mut self, params: &[ParamType], body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<(), WeaveError> + Send + Sync + 'static,
    {
        self.constructors
            .insert(TypeHash::from_constructor(params), Arc::new(body));
        self
    }

    pub fn build(self) -> Arc<NativeClass> {
        Arc::new(NativeClass {
            descriptor: self.descriptor,
            parent: self.parent,
            methods: self.methods,
            constructors: self.constructors,
        })
    }
}
