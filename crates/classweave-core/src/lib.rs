//! Core data model for the classweave synthesis engine.
//!
//! This crate defines everything the orchestration core and its backends
//! share: declarative type/method/constructor descriptors, deterministic
//! hash identity, member modifiers, callback slots and handler bundles,
//! runtime values, and the unified error hierarchy.
//!
//! ## Modules
//!
//! - [`descriptor`]: `TypeDescriptor`, `MethodDescriptor`, method identity
//! - [`type_hash`]: deterministic 64-bit identity hashing
//! - [`modifiers`]: member modifier bitflags
//! - [`callback`]: callback slots, handlers, bundles
//! - [`value`]: the shared runtime value representation
//! - [`error`]: per-phase error enums and the top-level wrapper

pub mod callback;
pub mod descriptor;
pub mod error;
pub mod modifiers;
pub mod type_hash;
pub mod value;

pub use callback::{Callback, CallbackRef, CallbackSlot, Callbacks, Invocation, SLOT_COUNT};
pub use descriptor::{
    ConstructorDescriptor, MethodDescriptor, MethodKey, ParamType, TypeDescriptor,
    TypeDescriptorBuilder, TypeKind,
};
pub use error::{ConstructionError, DispatchError, SynthesisError, WeaveError};
pub use modifiers::Modifiers;
pub use type_hash::TypeHash;
pub use value::{ObjectRef, Value};
