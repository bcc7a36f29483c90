//! Standard callback generators.
//!
//! Two strategies cover the common cases; anything else is a custom
//! [`CallbackGenerator`](crate::generator::CallbackGenerator)
//! implementation.
//!
//! - [`InterceptorGenerator`] routes every call to the slot's handler,
//!   passing the receiver, the method descriptor, and the arguments. A
//!   null handler falls through to the base implementation; if the base
//!   has none, dispatch fails.
//! - [`PassthroughGenerator`] forwards straight to the base
//!   implementation. It never references its slot, so the slot stays
//!   unused and allocates no storage.

use classweave_core::{Modifiers, ParamType, SynthesisError};

use crate::emit::ClassEmitter;
use crate::generator::{CallbackGenerator, GeneratorContext};

/// Routes intercepted calls to the slot's handler.
///
/// Each method gets a static field holding its descriptor, named through
/// the context's uniquing function and populated in the static-init hook;
/// the body loads it and hands it to the handler along with the receiver
/// and arguments.
#[derive(Debug, Default)]
pub struct InterceptorGenerator;

impl InterceptorGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl<E: ClassEmitter> CallbackGenerator<E> for InterceptorGenerator {
    fn generate(
        &self,
        emitter: &mut E,
        ctx: &mut GeneratorContext<'_>,
    ) -> Result<(), SynthesisError> {
        for method in ctx.methods() {
            let descriptor_field = ctx.unique_name(method);
            emitter.declare_field(
                Modifiers::PRIVATE | Modifiers::STATIC | Modifiers::FINAL,
                ParamType::Method,
                &descriptor_field,
            );

            emitter.begin_method(ctx.modifiers(method), method);
            ctx.emit_callback(emitter);
            emitter.dup();
            let fallback = emitter.make_label();
            let end = emitter.make_label();
            emitter.jump_if_null(fallback);
            emitter.load_this();
            emitter.get_static(&descriptor_field);
            emitter.load_args();
            emitter.invoke_callback(method.params.len());
            emitter.jump(end);
            emitter.mark(fallback);
            emitter.pop();
            emitter.load_this();
            emitter.load_args();
            emitter.invoke_super(method);
            emitter.mark(end);
            emitter.return_value();
            emitter.end_member();
        }
        Ok(())
    }

    fn generate_static(
        &self,
        emitter: &mut E,
        ctx: &mut GeneratorContext<'_>,
    ) -> Result<(), SynthesisError> {
        for method in ctx.methods() {
            emitter.push_method(method);
            emitter.put_static(&ctx.unique_name(method));
        }
        Ok(())
    }
}

/// Forwards every call to the base implementation, unconditionally.
#[derive(Debug, Default)]
pub struct PassthroughGenerator;

impl PassthroughGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl<E: ClassEmitter> CallbackGenerator<E> for PassthroughGenerator {
    fn generate(
        &self,
        emitter: &mut E,
        ctx: &mut GeneratorContext<'_>,
    ) -> Result<(), SynthesisError> {
        for method in ctx.methods() {
            emitter.begin_method(ctx.modifiers(method), method);
            emitter.load_this();
            emitter.load_args();
            emitter.invoke_super(method);
            emitter.return_value();
            emitter.end_member();
        }
        Ok(())
    }
}
