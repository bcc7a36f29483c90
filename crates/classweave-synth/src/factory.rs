//! Factory surface generation.
//!
//! Every synthesized class implements the injected factory capability
//! interface (handler introspection and rebinding on live instances) and
//! carries three static construction entry points. Constructors cannot
//! grow extra parameters to carry handler bindings, so the entry points
//! park the bindings in the transfer cells first, construct through a
//! forwarding constructor, and then assign the handler fields.
//!
//! Emitted operations:
//!
//! - `getCallback(int)` — field read switched on the slot; unknown slots
//!   yield null rather than failing.
//! - `setCallback(int, handler)` — checked cast and field write; unknown
//!   slots are a no-op.
//! - `setCallbacks(bundle)` — bulk write protocol.
//! - static `newInstance(bundle)` — propagate, default constructor, bind.
//! - static `newInstance(handler)` — single-slot convenience; refuses to
//!   guess when more than one slot is used.
//! - static `newInstance(typelist, valuelist, bundle)` — explicit
//!   constructor selection by structural parameter match; a null bundle
//!   skips binding.

use std::sync::Arc;

use classweave_core::{
    ConstructionError, ConstructorDescriptor, MethodDescriptor, Modifiers, ParamType,
    TypeDescriptor,
};
use lazy_static::lazy_static;

use crate::binding::{self, CallbackBinder};
use crate::emit::ClassEmitter;

/// Name of the injected factory capability interface.
pub const FACTORY_INTERFACE: &str = "Factory";

lazy_static! {
    static ref FACTORY: Arc<TypeDescriptor> = TypeDescriptor::interface(FACTORY_INTERFACE)
        .method(
            "getCallback",
            &[ParamType::Int],
            ParamType::Callback,
            Modifiers::PUBLIC,
        )
        .method(
            "setCallback",
            &[ParamType::Int, ParamType::Callback],
            ParamType::Void,
            Modifiers::PUBLIC,
        )
        .method(
            "setCallbacks",
            &[ParamType::Bundle],
            ParamType::Void,
            Modifiers::PUBLIC,
        )
        .build();
}

/// The factory capability interface descriptor, injected into every
/// synthesis request's interface list and excluded from the method
/// surface.
pub fn factory_interface() -> Arc<TypeDescriptor> {
    FACTORY.clone()
}

fn descriptor(name: &str) -> MethodDescriptor {
    FACTORY
        .methods
        .iter()
        .find(|m| &*m.name == name)
        .cloned()
        .unwrap_or_else(|| unreachable!("factory interface declares {name}"))
}

fn new_instance_descriptor(class_name: &str, params: &[ParamType]) -> MethodDescriptor {
    MethodDescriptor::new(
        class_name,
        "newInstance",
        params,
        ParamType::object(class_name),
        Modifiers::PUBLIC | Modifiers::STATIC,
    )
}

/// Emit the whole factory surface.
pub fn generate<E: ClassEmitter>(
    emitter: &mut E,
    class_name: &str,
    constructors: &[ConstructorDescriptor],
    binder: &CallbackBinder,
) -> Result<(), classweave_core::SynthesisError> {
    let keys: Vec<i64> = binder.used_slots().iter().map(|s| s.raw() as i64).collect();
    let slot_of = |key: i64| {
        classweave_core::CallbackSlot::new(key as u32)
            .unwrap_or_else(|| unreachable!("keys come from used_slots"))
    };

    // getCallback(int)
    let get_callback = descriptor("getCallback");
    emitter.begin_method(get_callback.modifiers, &get_callback);
    emitter.load_this();
    emitter.load_arg(0);
    emitter.switch_int(
        &keys,
        |e, key, end| {
            e.get_field(&binding::callback_field(slot_of(key)));
            e.jump(end);
            Ok(())
        },
        |e| {
            e.pop();
            e.push_null();
            Ok(())
        },
    )?;
    emitter.return_value();
    emitter.end_member();

    // setCallback(int, handler)
    let set_callback = descriptor("setCallback");
    emitter.begin_method(set_callback.modifiers, &set_callback);
    emitter.load_this();
    emitter.load_arg(1);
    emitter.load_arg(0);
    emitter.switch_int(
        &keys,
        |e, key, end| {
            let slot = slot_of(key);
            e.check_callback_cast(slot);
            e.put_field(&binding::callback_field(slot));
            e.jump(end);
            Ok(())
        },
        |e| {
            e.pop2();
            Ok(())
        },
    )?;
    emitter.return_value();
    emitter.end_member();

    // setCallbacks(bundle)
    let set_callbacks = descriptor("setCallbacks");
    emitter.begin_method(set_callbacks.modifiers, &set_callbacks);
    emitter.load_this();
    emitter.load_arg(0);
    binder.emit_bind_callbacks(emitter);
    emitter.return_value();
    emitter.end_member();

    let bind_thread = binding::bind_thread_descriptor(class_name);

    // static newInstance(bundle)
    let by_bundle = new_instance_descriptor(class_name, &[ParamType::Bundle]);
    emitter.begin_method(by_bundle.modifiers, &by_bundle);
    emitter.load_arg(0);
    emitter.invoke_static_self(&bind_thread);
    emitter.new_instance_self();
    emitter.dup();
    emitter.invoke_constructor_self(&[]);
    emitter.dup();
    emitter.load_arg(0);
    binder.emit_bind_callbacks(emitter);
    emitter.return_value();
    emitter.end_member();

    // static newInstance(handler) — single-slot convenience
    let by_handler = new_instance_descriptor(class_name, &[ParamType::Callback]);
    emitter.begin_method(by_handler.modifiers, &by_handler);
    match binder.used_slots().as_slice() {
        [slot] => {
            emitter.load_arg(0);
            emitter.cell_store(*slot);
            emitter.new_instance_self();
            emitter.dup();
            emitter.invoke_constructor_self(&[]);
            emitter.dup();
            emitter.push_int(slot.raw() as i64);
            emitter.load_arg(0);
            emitter.invoke_self(&set_callback);
        }
        [] => {
            emitter.new_instance_self();
            emitter.dup();
            emitter.invoke_constructor_self(&[]);
        }
        used => {
            emitter.throw_construction(ConstructionError::AmbiguousCallback { used: used.len() });
        }
    }
    emitter.return_value();
    emitter.end_member();

    // static newInstance(typelist, valuelist, bundle)
    let by_args = new_instance_descriptor(
        class_name,
        &[ParamType::TypeList, ParamType::ValueList, ParamType::Bundle],
    );
    emitter.begin_method(by_args.modifiers, &by_args);
    emitter.load_arg(2);
    emitter.invoke_static_self(&bind_thread);
    emitter.new_instance_self();
    emitter.dup();
    emitter.load_arg(0);
    let class = class_name.to_owned();
    emitter.switch_constructors(
        constructors,
        |e, ctor, end| {
            for (i, ty) in ctor.params.iter().enumerate() {
                e.load_arg(1);
                e.push_int(i as i64);
                e.list_get();
                e.cast_param(ty);
            }
            e.invoke_constructor_self(&ctor.params);
            e.jump(end);
            Ok(())
        },
        |e| {
            e.throw_construction(ConstructionError::ConstructorNotFound {
                class: class.clone(),
            });
            Ok(())
        },
    )?;
    let skip_bind = emitter.make_label();
    emitter.load_arg(2);
    emitter.jump_if_null(skip_bind);
    emitter.dup();
    emitter.load_arg(2);
    binder.emit_bind_callbacks(emitter);
    emitter.mark(skip_bind);
    emitter.return_value();
    emitter.end_member();

    Ok(())
}
