//! Construction entry points: forwarding constructors, the constructed
//! flag handshake, transfer-cell propagation, and the live factory
//! surface.

mod common;

use std::sync::{Arc, Mutex};

use classweave::{
    Callbacks, ConstructionError, DispatchError, GeneratorRegistry, Invocation, MethodDescriptor,
    NativeClass, ParamType, PassthroughGenerator, TypeDescriptor, Value,
};

use common::{animal_descriptor, interceptors, native_animal, prefix_handler, slot, weave};

type Log = Arc<Mutex<Vec<String>>>;

/// Native animal whose constructors record into `log`.
fn logging_animal(descriptor: &Arc<TypeDescriptor>, log: &Log) -> Arc<NativeClass> {
    let default_log = log.clone();
    let named_log = log.clone();
    NativeClass::builder(descriptor.clone())
        .constructor(&[], move |_instance, _args| {
            default_log.lock().unwrap().push("ctor()".into());
            Ok(())
        })
        .constructor(&[ParamType::Str], move |_instance, args| {
            let name = args[0].as_str().unwrap_or("?").to_string();
            named_log.lock().unwrap().push(format!("ctor({name})"));
            Ok(())
        })
        .method("speak", &[], |_instance, _args| Ok(Value::Str("...".into())))
        .build()
}

fn filter_all(_: &MethodDescriptor) -> u32 {
    0
}

#[test]
fn forwarding_constructors_reach_the_base_and_set_the_flag() {
    let descriptor = animal_descriptor();
    let log: Log = Arc::default();
    let native = logging_animal(&descriptor, &log);
    let class = weave(
        "Animal$Woven",
        &descriptor,
        native,
        &[],
        &filter_all,
        &interceptors(&[0]),
    )
    .unwrap();

    let pet = class.new_instance(&Callbacks::new()).unwrap();
    assert!(pet.is_constructed());
    assert_eq!(*log.lock().unwrap(), vec!["ctor()".to_string()]);
}

#[test]
fn explicit_arguments_select_the_matching_constructor() {
    let descriptor = animal_descriptor();
    let log: Log = Arc::default();
    let native = logging_animal(&descriptor, &log);
    let class = weave(
        "Animal$Woven",
        &descriptor,
        native,
        &[],
        &filter_all,
        &interceptors(&[0]),
    )
    .unwrap();

    let bundle = Callbacks::new().with(slot(0), prefix_handler("h"));
    let pet = class
        .new_instance_with_args(
            &[ParamType::Str],
            &[Value::Str("rex".into())],
            Some(&bundle),
        )
        .unwrap();

    assert!(pet.is_constructed());
    assert_eq!(*log.lock().unwrap(), vec!["ctor(rex)".to_string()]);
    assert_eq!(pet.call("speak", &[]).unwrap().as_str(), Some("h:speak"));
}

#[test]
fn unmatched_argument_types_are_a_construction_error() {
    let class = common::woven_animal();
    let err = class
        .new_instance_with_args(&[ParamType::Int], &[Value::Int(3)], None)
        .unwrap_err();

    assert!(matches!(
        err.as_construction(),
        Some(ConstructionError::ConstructorNotFound { .. })
    ));
}

#[test]
fn null_bundle_skips_handler_binding() {
    let class = common::woven_animal();
    let pet = class.new_instance_with_args(&[], &[], None).unwrap();

    assert!(pet.is_constructed());
    assert!(pet.get_callback(slot(0)).unwrap().is_none());
    assert_eq!(pet.call("speak", &[]).unwrap().as_str(), Some("..."));
}

#[test]
fn self_call_from_the_base_constructor_resolves_the_parked_handler() {
    let descriptor = animal_descriptor();
    let heard: Log = Arc::default();
    let heard_in_ctor = heard.clone();
    let native = NativeClass::builder(descriptor.clone())
        .constructor(&[], move |instance, _args| {
            // Still inside construction: the flag is down and the handler
            // field is unassigned, so dispatch must go through the
            // transfer cell.
            assert!(!instance.is_constructed());
            let voice = instance.call("speak", &[])?;
            heard_in_ctor
                .lock()
                .unwrap()
                .push(voice.as_str().unwrap_or("?").to_string());
            Ok(())
        })
        .constructor(&[ParamType::Str], |_instance, _args| Ok(()))
        .method("speak", &[], |_instance, _args| Ok(Value::Str("...".into())))
        .build();
    let class = weave(
        "Animal$Woven",
        &descriptor,
        native,
        &[],
        &filter_all,
        &interceptors(&[0]),
    )
    .unwrap();

    let bundle = Callbacks::new().with(slot(0), prefix_handler("early"));
    let pet = class.new_instance(&bundle).unwrap();

    assert_eq!(*heard.lock().unwrap(), vec!["early:speak".to_string()]);
    assert!(pet.is_constructed());
    // After construction the same call resolves through the field.
    assert_eq!(
        pet.call("speak", &[]).unwrap().as_str(),
        Some("early:speak")
    );
}

#[test]
fn stale_cell_value_is_unobservable_after_construction() {
    let class = common::woven_animal();
    let first = prefix_handler("first");
    let bundle = Callbacks::new().with(slot(0), first.clone());
    let pet = class.new_instance(&bundle).unwrap();

    // The cell keeps the parked handler; nothing clears it.
    let parked = class.peek_transfer_cell(slot(0)).unwrap();
    assert_eq!(parked, Value::Callback(first.clone()));

    // Rebinding the field changes what dispatch sees, while the stale
    // cell entry stays put.
    pet.set_callback(slot(0), prefix_handler("second")).unwrap();
    assert_eq!(
        pet.call("speak", &[]).unwrap().as_str(),
        Some("second:speak")
    );
    assert_eq!(
        class.peek_transfer_cell(slot(0)).unwrap(),
        Value::Callback(first)
    );
}

#[test]
fn get_and_set_callback_round_trip() {
    let class = common::woven_animal();
    let handler = prefix_handler("h");
    let bundle = Callbacks::new().with(slot(0), handler.clone());
    let pet = class.new_instance(&bundle).unwrap();

    let bound = pet.get_callback(slot(0)).unwrap().unwrap();
    assert!(Arc::ptr_eq(&bound, &handler));

    let replacement = prefix_handler("r");
    pet.set_callback(slot(0), replacement.clone()).unwrap();
    let bound = pet.get_callback(slot(0)).unwrap().unwrap();
    assert!(Arc::ptr_eq(&bound, &replacement));
}

#[test]
fn unknown_slots_read_null_and_ignore_writes() {
    let class = common::woven_animal();
    let pet = class
        .new_instance(&Callbacks::new().with(slot(0), prefix_handler("h")))
        .unwrap();

    // Slot 5 is never used by this class.
    assert!(pet.get_callback(slot(5)).unwrap().is_none());
    pet.set_callback(slot(5), prefix_handler("ignored")).unwrap();
    assert!(pet.get_callback(slot(5)).unwrap().is_none());

    // The used slot is untouched.
    assert_eq!(pet.call("speak", &[]).unwrap().as_str(), Some("h:speak"));
}

#[test]
fn set_callbacks_rebinds_every_used_slot() {
    let descriptor = animal_descriptor();
    let native = native_animal(&descriptor);
    let filter = |m: &MethodDescriptor| if &*m.name == "speak" { 0u32 } else { 1 };
    let class = weave(
        "Animal$Woven",
        &descriptor,
        native,
        &[],
        &filter,
        &interceptors(&[0, 1]),
    )
    .unwrap();

    let pet = class.new_instance(&Callbacks::new()).unwrap();
    assert_eq!(pet.call("speak", &[]).unwrap().as_str(), Some("..."));

    let bundle = Callbacks::new()
        .with(slot(0), prefix_handler("a"))
        .with(slot(1), prefix_handler("b"));
    pet.set_callbacks(&bundle).unwrap();

    assert_eq!(pet.call("speak", &[]).unwrap().as_str(), Some("a:speak"));
    assert_eq!(pet.call("name", &[]).unwrap().as_str(), Some("b:name"));
}

#[test]
fn single_handler_construction_requires_an_unambiguous_slot() {
    // One used slot: the convenience form binds it.
    let class = common::woven_animal();
    let pet = class.new_instance_single(prefix_handler("solo")).unwrap();
    assert_eq!(pet.call("speak", &[]).unwrap().as_str(), Some("solo:speak"));

    // Two used slots: the form refuses to guess.
    let descriptor = animal_descriptor();
    let native = native_animal(&descriptor);
    let filter = |m: &MethodDescriptor| if &*m.name == "speak" { 0u32 } else { 1 };
    let class = weave(
        "Animal$Woven",
        &descriptor,
        native,
        &[],
        &filter,
        &interceptors(&[0, 1]),
    )
    .unwrap();
    let err = class
        .new_instance_single(prefix_handler("solo"))
        .unwrap_err();
    assert!(matches!(
        err.as_construction(),
        Some(ConstructionError::AmbiguousCallback { used: 2 })
    ));
}

#[test]
fn single_handler_construction_with_no_used_slots_just_constructs() {
    let descriptor = animal_descriptor();
    let native = native_animal(&descriptor);
    let registry =
        GeneratorRegistry::new().register(slot(0), Box::new(PassthroughGenerator::new()));
    let class = weave(
        "Animal$Passthrough",
        &descriptor,
        native,
        &[],
        &filter_all,
        &registry,
    )
    .unwrap();

    let pet = class.new_instance_single(prefix_handler("unused")).unwrap();
    assert!(pet.is_constructed());
    assert_eq!(pet.call("speak", &[]).unwrap().as_str(), Some("..."));
}

#[test]
fn instances_share_a_class_but_not_handler_state() {
    let class = common::woven_animal();
    let a = class
        .new_instance(&Callbacks::new().with(slot(0), prefix_handler("a")))
        .unwrap();
    let b = class
        .new_instance(&Callbacks::new().with(slot(0), prefix_handler("b")))
        .unwrap();

    assert_eq!(a.call("speak", &[]).unwrap().as_str(), Some("a:speak"));
    assert_eq!(b.call("speak", &[]).unwrap().as_str(), Some("b:speak"));
}

#[test]
fn handlers_may_delegate_back_through_the_receiver() {
    // A handler that augments the base answer by calling another method
    // on the (already constructed) receiver.
    let class = common::woven_animal();
    let handler = Arc::new(|inv: Invocation<'_>| -> Result<Value, DispatchError> {
        if &*inv.method.name != "speak" {
            return Ok(Value::Str(inv.method.name.to_string()));
        }
        let receiver = classweave::Instance::from_value(inv.target).ok_or_else(|| {
            DispatchError::TypeMismatch {
                expected: "object".into(),
                found: inv.target.type_name().into(),
            }
        })?;
        let name = receiver
            .call("name", &[])
            .map_err(|e| DispatchError::Handler(e.to_string()))?;
        Ok(Value::Str(format!(
            "{} says hello",
            name.as_str().unwrap_or("?")
        )))
    });
    let pet = class
        .new_instance(&Callbacks::new().with(slot(0), handler))
        .unwrap();

    // name() routes to the same handler, which answers with the method
    // name; speak() then embeds it.
    assert_eq!(
        pet.call("speak", &[]).unwrap().as_str(),
        Some("name says hello")
    );
}
