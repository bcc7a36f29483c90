//! Reference backend: an interpretive emitter.
//!
//! This crate closes the loop on the abstract emission capability with a
//! backend that needs no code generation at all: emitted bodies are stored
//! as small instruction lists and executed by an operand-stack interpreter.
//! Base-class behavior is written in Rust as a [`NativeClass`]; the
//! synthesis engine drives a [`RuntimeEmitter`] and finalizes a
//! [`SynthesizedClass`] whose [`Instance`]s dispatch emitted overrides
//! first and fall back to the native chain.
//!
//! The backend exists so every synthesized protocol — forwarding
//! constructors, the constructed-flag handshake, transfer-cell
//! propagation, the factory surface — is executable and testable, not
//! just emittable.

pub mod emitter;
pub mod instance;
pub mod native;
pub mod synthesized;

mod interp;
mod op;

pub use emitter::RuntimeEmitter;
pub use instance::Instance;
pub use native::{NativeClass, NativeClassBuilder, NativeConstructorFn, NativeMethodFn};
pub use synthesized::SynthesizedClass;
