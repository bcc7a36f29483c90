//! Performance benchmarks for class synthesis and dispatch.
//!
//! Measures the two costs users of the library pay repeatedly:
//! - synthesizing a class (surface build, generation, factory emission)
//! - constructing instances and dispatching intercepted calls

use std::hint::black_box;
use std::sync::Arc;

use classweave::{
    Callbacks, DispatchError, GeneratorRegistry, InterceptorGenerator, Invocation,
    MethodDescriptor, Modifiers, NativeClass, ParamType, RuntimeEmitter, SynthesisRequest,
    SynthesizedClass, TypeDescriptor, Value, synthesize,
};
use criterion::{Criterion, criterion_group, criterion_main};

fn wide_descriptor(methods: usize) -> Arc<TypeDescriptor> {
    let mut builder = TypeDescriptor::class("Wide").constructor(&[], Modifiers::PUBLIC);
    for i in 0..methods {
        builder = builder.method(
            &format!("method_{i}"),
            &[ParamType::Int],
            ParamType::Int,
            Modifiers::PUBLIC,
        );
    }
    builder.build()
}

fn wide_native(descriptor: &Arc<TypeDescriptor>) -> Arc<NativeClass> {
    let mut builder = NativeClass::builder(descriptor.clone())
        .constructor(&[], |_instance, _args| Ok(()));
    for method in &descriptor.methods {
        builder = builder.method(&method.name, &method.params, |_instance, args| {
            Ok(Value::Int(args[0].as_int().unwrap_or(0) + 1))
        });
    }
    builder.build()
}

fn weave(methods: usize) -> Arc<SynthesizedClass> {
    let descriptor = wide_descriptor(methods);
    let native = wide_native(&descriptor);
    let slot = classweave::CallbackSlot::new(0).expect("slot 0 is valid");
    let registry = GeneratorRegistry::new().register(slot, Box::new(InterceptorGenerator::new()));
    let filter = |_: &MethodDescriptor| 0u32;
    let request = SynthesisRequest {
        class_name: "Wide$Woven",
        base: &descriptor,
        interfaces: &[],
        filter: &filter,
    };
    synthesize(RuntimeEmitter::new(native), &request, &registry).expect("benchmark synthesis")
}

fn bench_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesis");
    for methods in [4usize, 32, 128] {
        let descriptor = wide_descriptor(methods);
        let native = wide_native(&descriptor);
        let slot = classweave::CallbackSlot::new(0).expect("slot 0 is valid");
        group.bench_function(format!("methods_{methods}"), |b| {
            b.iter(|| {
                let registry = GeneratorRegistry::new()
                    .register(slot, Box::new(InterceptorGenerator::new()));
                let filter = |_: &MethodDescriptor| 0u32;
                let request = SynthesisRequest {
                    class_name: "Wide$Woven",
                    base: &descriptor,
                    interfaces: &[],
                    filter: &filter,
                };
                let class =
                    synthesize(RuntimeEmitter::new(native.clone()), &request, &registry)
                        .expect("benchmark synthesis");
                black_box(class)
            });
        });
    }
    group.finish();
}

fn bench_construction(c: &mut Criterion) {
    let class = weave(32);
    let slot = classweave::CallbackSlot::new(0).expect("slot 0 is valid");
    let handler = Arc::new(|inv: Invocation<'_>| -> Result<Value, DispatchError> {
        Ok(Value::Int(inv.args[0].as_int().unwrap_or(0) * 2))
    });
    let bundle = Callbacks::new().with(slot, handler);

    c.bench_function("construction/new_instance", |b| {
        b.iter(|| black_box(class.new_instance(&bundle).expect("construction")));
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let class = weave(32);
    let slot = classweave::CallbackSlot::new(0).expect("slot 0 is valid");
    let handler = Arc::new(|inv: Invocation<'_>| -> Result<Value, DispatchError> {
        Ok(Value::Int(inv.args[0].as_int().unwrap_or(0) * 2))
    });
    let bundle = Callbacks::new().with(slot, handler);
    let instance = class.new_instance(&bundle).expect("construction");
    let unbound = class.new_instance(&Callbacks::new()).expect("construction");

    let mut group = c.benchmark_group("dispatch");
    group.bench_function("intercepted", |b| {
        b.iter(|| {
            black_box(
                instance
                    .call("method_0", &[Value::Int(black_box(21))])
                    .expect("dispatch"),
            )
        });
    });
    group.bench_function("fallback_to_base", |b| {
        b.iter(|| {
            black_box(
                unbound
                    .call("method_0", &[Value::Int(black_box(21))])
                    .expect("dispatch"),
            )
        });
    });
    group.finish();
}

criterion_group!(benches, bench_synthesis, bench_construction, bench_dispatch);
criterion_main!(benches);
