//! Class synthesis core.
//!
//! This crate orchestrates the synthesis of a dynamic subclass: it builds
//! the overridable method surface, partitions it by the caller's
//! classifier, drives pluggable per-slot body generators, wires the
//! callback binding handshake, and emits the factory surface — all
//! through the abstract [`ClassEmitter`] capability, never against a
//! concrete backend.
//!
//! ## Modules
//!
//! - [`surface`]: ordered, deduplicated overridable method inventory
//! - [`classify`]: classifier adapter and per-slot method groups
//! - [`generator`]: the pluggable body-generator strategy and its context
//! - [`generators`]: standard interceptor and passthrough generators
//! - [`binding`]: handler fields, transfer cells, constructed flag, and
//!   the read/write/propagation protocols
//! - [`engine`]: the phase-ordered assembly driver
//! - [`factory`]: the emitted construction and introspection surface
//! - [`emit`]: the abstract code-emission capability

pub mod binding;
pub mod classify;
pub mod emit;
pub mod engine;
pub mod factory;
pub mod generator;
pub mod generators;
pub mod surface;

pub use binding::{CallbackBinder, BIND_THREAD_CALLBACKS, CONSTRUCTED_FIELD};
pub use classify::{CallbackFilter, MethodGroups};
pub use emit::ClassEmitter;
pub use engine::{synthesize, SynthesisRequest};
pub use factory::{factory_interface, FACTORY_INTERFACE};
pub use generator::{CallbackGenerator, GeneratorContext, GeneratorRegistry};
pub use generators::{InterceptorGenerator, PassthroughGenerator};
pub use surface::MethodSurface;
