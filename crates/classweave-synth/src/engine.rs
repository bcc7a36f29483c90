//! The type assembly engine.
//!
//! [`synthesize`] drives one synthesis request through a fixed phase
//! order:
//!
//! 1. begin the class declaration (base + interfaces + factory capability)
//! 2. build the overridable method surface
//! 3. partition it by the caller's classifier and resolve generators
//! 4. declare the constructed-flag field
//! 5. emit one forwarding constructor per visible base constructor
//! 6. per-slot storage is declared lazily during phase 7 — a slot is used
//!    only once a generator actually references it
//! 7. run each non-empty slot's generator over its method group
//! 8. run the static-initialization hooks (every used slot's transfer
//!    cell exists by now)
//! 9. emit the factory surface and the thread-propagation method
//! 10. finalize
//!
//! Any failure aborts the whole call; no partially built type is ever
//! returned.

use std::sync::Arc;

use classweave_core::{Modifiers, SynthesisError, TypeDescriptor, WeaveError};

use crate::binding::{self, CallbackBinder};
use crate::classify::{CallbackFilter, MethodGroups};
use crate::emit::ClassEmitter;
use crate::factory;
use crate::generator::{GeneratorContext, GeneratorRegistry};
use crate::surface::MethodSurface;

/// One synthesis request.
pub struct SynthesisRequest<'a> {
    /// Name of the class to synthesize.
    pub class_name: &'a str,
    /// The base type to extend.
    pub base: &'a Arc<TypeDescriptor>,
    /// Additional interfaces to implement, in order.
    pub interfaces: &'a [Arc<TypeDescriptor>],
    /// Per-method slot classification.
    pub filter: &'a dyn CallbackFilter,
}

/// Synthesize one class through `emitter`.
pub fn synthesize<E: ClassEmitter>(
    mut emitter: E,
    request: &SynthesisRequest<'_>,
    registry: &GeneratorRegistry<E>,
) -> Result<E::Output, WeaveError> {
    let base = request.base;

    let constructors: Vec<_> = base.visible_constructors().cloned().collect();
    if constructors.is_empty() {
        return Err(SynthesisError::NoVisibleConstructor {
            type_name: base.name.to_string(),
        }
        .into());
    }

    // Phase 1: declaration. The factory capability is appended to the
    // requested interfaces.
    let mut interfaces = request.interfaces.to_vec();
    interfaces.push(factory::factory_interface());
    emitter.begin_class(Modifiers::PUBLIC, request.class_name, base, &interfaces)?;

    // Phase 2: surface (factory capability excluded).
    let surface = MethodSurface::build(base, request.interfaces);

    // Phase 3: classification; every non-empty slot must have a generator
    // before anything is emitted.
    let groups = MethodGroups::partition(&surface, request.filter)?;
    for slot in groups.non_empty() {
        if registry.get(slot).is_none() {
            return Err(SynthesisError::MissingGenerator { slot: slot.raw() }.into());
        }
    }

    // Phase 4: constructed flag.
    emitter.declare_field(
        Modifiers::PRIVATE,
        classweave_core::ParamType::Bool,
        binding::CONSTRUCTED_FIELD,
    );

    // Phase 5: forwarding constructors. Each forwards its arguments
    // unchanged to the matching base constructor and then marks the
    // instance constructed.
    for ctor in &constructors {
        emitter.begin_constructor(&ctor.params);
        emitter.load_this();
        emitter.dup();
        emitter.load_args();
        emitter.invoke_super_constructor(&ctor.params);
        emitter.push_bool(true);
        emitter.put_field(binding::CONSTRUCTED_FIELD);
        emitter.return_value();
        emitter.end_member();
    }

    // Phases 6+7: generators; storage declarations happen lazily inside
    // the binder on first reference.
    let mut binder = CallbackBinder::new(request.class_name);
    for slot in groups.non_empty() {
        let generator = registry
            .get(slot)
            .ok_or(SynthesisError::MissingGenerator { slot: slot.raw() })?;
        let mut ctx =
            GeneratorContext::new(slot, groups.group(slot), surface.force_public(), &mut binder);
        generator.generate(&mut emitter, &mut ctx)?;
    }

    // Phase 8: static initialization hooks.
    emitter.begin_static_init();
    for slot in groups.non_empty() {
        let generator = registry
            .get(slot)
            .ok_or(SynthesisError::MissingGenerator { slot: slot.raw() })?;
        let mut ctx =
            GeneratorContext::new(slot, groups.group(slot), surface.force_public(), &mut binder);
        generator.generate_static(&mut emitter, &mut ctx)?;
    }
    emitter.end_member();

    // Phase 9: factory surface + thread propagation.
    factory::generate(&mut emitter, request.class_name, &constructors, &binder)?;
    binder.emit_bind_thread_method(&mut emitter);

    // Phase 10: finalize.
    Ok(emitter.end_class()?)
}
