//! classweave — dynamic subclass synthesis with per-method callback
//! routing.
//!
//! Given a declarative description of a base type and a set of
//! interfaces, classweave synthesizes a subclass whose overridable
//! methods route through pluggable callback handlers, partitioned by
//! integer slot. The synthesized class carries a factory surface for
//! constructing instances with handler bindings and for inspecting and
//! rebinding handlers on live instances.
//!
//! The workspace splits into three crates, re-exported here:
//!
//! - `classweave-core`: descriptors, slots, handlers, values, errors
//! - `classweave-synth`: the backend-agnostic assembly engine
//! - `classweave-runtime`: the interpretive reference backend
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use classweave::{
//!     CallbackSlot, Callbacks, DispatchError, GeneratorRegistry, InterceptorGenerator,
//!     Invocation, MethodDescriptor, Modifiers, NativeClass, ParamType, RuntimeEmitter,
//!     SynthesisRequest, TypeDescriptor, Value, synthesize,
//! };
//!
//! # fn main() -> Result<(), classweave::WeaveError> {
//! let animal = TypeDescriptor::class("Animal")
//!     .constructor(&[], Modifiers::PUBLIC)
//!     .method("speak", &[], ParamType::Str, Modifiers::PUBLIC)
//!     .build();
//! let native = NativeClass::builder(animal.clone())
//!     .constructor(&[], |_instance, _args| Ok(()))
//!     .method("speak", &[], |_instance, _args| Ok(Value::Str("...".into())))
//!     .build();
//!
//! let slot = CallbackSlot::new(0).expect("slot 0 is valid");
//! let registry = GeneratorRegistry::new().register(slot, Box::new(InterceptorGenerator::new()));
//! let filter = |_: &MethodDescriptor| 0u32;
//! let request = SynthesisRequest {
//!     class_name: "Animal$Woven",
//!     base: &animal,
//!     interfaces: &[],
//!     filter: &filter,
//! };
//! let class = synthesize(RuntimeEmitter::new(native), &request, &registry)?;
//!
//! let handler = Arc::new(|inv: Invocation<'_>| -> Result<Value, DispatchError> {
//!     Ok(Value::Str(format!("intercepted {}", inv.method.name)))
//! });
//! let pet = class.new_instance(&Callbacks::new().with(slot, handler))?;
//! let heard = pet.call("speak", &[])?;
//! assert_eq!(heard.as_str(), Some("intercepted speak"));
//! # Ok(())
//! # }
//! ```

pub use classweave_core::{
    Callback, CallbackRef, CallbackSlot, Callbacks, ConstructionError, ConstructorDescriptor,
    DispatchError, Invocation, MethodDescriptor, MethodKey, Modifiers, ObjectRef, ParamType,
    SLOT_COUNT, SynthesisError, TypeDescriptor, TypeDescriptorBuilder, TypeHash, TypeKind, Value,
    WeaveError,
};
pub use classweave_runtime::{
    Instance, NativeClass, NativeClassBuilder, RuntimeEmitter, SynthesizedClass,
};
pub use classweave_synth::{
    BIND_THREAD_CALLBACKS, CONSTRUCTED_FIELD, CallbackBinder, CallbackFilter, CallbackGenerator,
    ClassEmitter, FACTORY_INTERFACE, GeneratorContext, GeneratorRegistry, InterceptorGenerator,
    MethodGroups, MethodSurface, PassthroughGenerator, SynthesisRequest, factory_interface,
    synthesize,
};

/// Storage naming conventions of synthesized classes.
pub mod naming {
    pub use classweave_synth::binding::{callback_field, transfer_cell_name};
}
