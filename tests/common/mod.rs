//! Shared fixtures: an `Animal` base type with a couple of constructors,
//! an overridable surface, and a native reference behavior.

#![allow(dead_code)]

use std::sync::Arc;

use classweave::{
    CallbackFilter, CallbackRef, CallbackSlot, DispatchError, GeneratorRegistry,
    InterceptorGenerator, Invocation, Modifiers, NativeClass, ParamType, RuntimeEmitter,
    SynthesisRequest, SynthesizedClass, TypeDescriptor, Value, WeaveError, synthesize,
};

pub fn slot(index: u32) -> CallbackSlot {
    CallbackSlot::new(index).expect("fixture slot in range")
}

pub fn animal_descriptor() -> Arc<TypeDescriptor> {
    TypeDescriptor::class("Animal")
        .constructor(&[], Modifiers::PUBLIC)
        .constructor(&[ParamType::Str], Modifiers::PUBLIC)
        .method("speak", &[], ParamType::Str, Modifiers::PUBLIC)
        .method("name", &[], ParamType::Str, Modifiers::PUBLIC)
        .method("feed", &[ParamType::Str], ParamType::Str, Modifiers::PUBLIC)
        .method(
            "tag",
            &[],
            ParamType::Str,
            Modifiers::PUBLIC | Modifiers::FINAL,
        )
        .build()
}

pub fn native_animal(descriptor: &Arc<TypeDescriptor>) -> Arc<NativeClass> {
    NativeClass::builder(descriptor.clone())
        .constructor(&[], |_instance, _args| Ok(()))
        .constructor(&[ParamType::Str], |_instance, _args| Ok(()))
        .method("speak", &[], |_instance, _args| Ok(Value::Str("...".into())))
        .method("name", &[], |_instance, _args| {
            Ok(Value::Str("animal".into()))
        })
        .method("feed", &[ParamType::Str], |_instance, args| {
            let food = args[0].as_str().unwrap_or("?");
            Ok(Value::Str(format!("ate {food}")))
        })
        .method("tag", &[], |_instance, _args| Ok(Value::Str("A-1".into())))
        .build()
}

/// Handler answering every interception with `"<prefix>:<method name>"`.
pub fn prefix_handler(prefix: &str) -> CallbackRef {
    let prefix = prefix.to_string();
    Arc::new(
        move |inv: Invocation<'_>| -> Result<Value, DispatchError> {
            Ok(Value::Str(format!("{prefix}:{}", inv.method.name)))
        },
    )
}

pub fn interceptors(slots: &[u32]) -> GeneratorRegistry<RuntimeEmitter> {
    slots.iter().fold(GeneratorRegistry::new(), |registry, s| {
        registry.register(slot(*s), Box::new(InterceptorGenerator::new()))
    })
}

pub fn weave(
    class_name: &str,
    base: &Arc<TypeDescriptor>,
    native: Arc<NativeClass>,
    interfaces: &[Arc<TypeDescriptor>],
    filter: &dyn CallbackFilter,
    registry: &GeneratorRegistry<RuntimeEmitter>,
) -> Result<Arc<SynthesizedClass>, WeaveError> {
    let request = SynthesisRequest {
        class_name,
        base,
        interfaces,
        filter,
    };
    synthesize(RuntimeEmitter::new(native), &request, registry)
}

/// Everything routed to slot 0 with an interceptor.
pub fn woven_animal() -> Arc<SynthesizedClass> {
    let descriptor = animal_descriptor();
    let native = native_animal(&descriptor);
    let filter = |_: &classweave::MethodDescriptor| 0u32;
    weave(
        "Animal$Woven",
        &descriptor,
        native,
        &[],
        &filter,
        &interceptors(&[0]),
    )
    .expect("fixture synthesis succeeds")
}
