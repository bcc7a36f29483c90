//! Pluggable per-slot body generators.
//!
//! The assembly engine never writes an intercepted method body itself; it
//! hands each non-empty slot's method group to a [`CallbackGenerator`] and
//! supplies a [`GeneratorContext`] with everything the generator may need:
//! the group, the callback-resolution hook, per-method visibility
//! resolution, and stable per-method naming. New slot behaviors are added
//! by registering a new generator — the engine is closed to modification.

use classweave_core::{CallbackSlot, MethodDescriptor, MethodKey, Modifiers, SynthesisError};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::binding::CallbackBinder;
use crate::emit::ClassEmitter;

/// Strategy generating the bodies for one callback slot.
pub trait CallbackGenerator<E: ClassEmitter> {
    /// Emit one method body per method in the context's group.
    fn generate(
        &self,
        emitter: &mut E,
        ctx: &mut GeneratorContext<'_>,
    ) -> Result<(), SynthesisError>;

    /// Contribute to the class's static initialization. Runs after every
    /// used slot's transfer cell exists.
    fn generate_static(
        &self,
        emitter: &mut E,
        ctx: &mut GeneratorContext<'_>,
    ) -> Result<(), SynthesisError> {
        let _ = (emitter, ctx);
        Ok(())
    }
}

/// Capability handed to a generator for one slot.
pub struct GeneratorContext<'a> {
    slot: CallbackSlot,
    methods: &'a [MethodDescriptor],
    force_public: &'a FxHashSet<MethodKey>,
    binder: &'a mut CallbackBinder,
}

impl<'a> GeneratorContext<'a> {
    pub(crate) fn new(
        slot: CallbackSlot,
        methods: &'a [MethodDescriptor],
        force_public: &'a FxHashSet<MethodKey>,
        binder: &'a mut CallbackBinder,
    ) -> Self {
        Self {
            slot,
            methods,
            force_public,
            binder,
        }
    }

    /// The slot this context serves.
    pub fn slot(&self) -> CallbackSlot {
        self.slot
    }

    /// The slot's method group, in surface order.
    pub fn methods(&self) -> &'a [MethodDescriptor] {
        self.methods
    }

    /// Emit the read protocol resolving the active handler for this slot.
    /// `[] -> [handler|null]`
    ///
    /// The first call for a slot declares its storage; a generator that
    /// never calls this keeps its slot unused.
    pub fn emit_callback<E: ClassEmitter>(&mut self, emitter: &mut E) {
        self.binder.emit_current_callback(emitter, self.slot);
    }

    /// Modifiers the synthesized override should be declared with:
    /// the method's visibility, forced to public for interface-originated
    /// identities.
    pub fn modifiers(&self, method: &MethodDescriptor) -> Modifiers {
        let mut modifiers = method.modifiers.visibility();
        if self.force_public.contains(&method.key()) {
            modifiers.remove(Modifiers::PROTECTED);
            modifiers.insert(Modifiers::PUBLIC);
        }
        modifiers
    }

    /// Stable collision-free name for per-method helper members: the
    /// method name, the slot, and the method's ordinal within this slot's
    /// group. Same-named overloads can be classified to different slots,
    /// each first in its own group, so the slot must participate in the
    /// name.
    pub fn unique_name(&self, method: &MethodDescriptor) -> String {
        let ordinal = self
            .methods
            .iter()
            .position(|m| m.key() == method.key())
            .unwrap_or(self.methods.len());
        format!("{}_{}_{}", method.name, self.slot.raw(), ordinal)
    }
}

/// Per-slot generator registry.
pub struct GeneratorRegistry<E: ClassEmitter> {
    generators: FxHashMap<CallbackSlot, Box<dyn CallbackGenerator<E>>>,
}

impl<E: ClassEmitter> GeneratorRegistry<E> {
    pub fn new() -> Self {
        Self {
            generators: FxHashMap::default(),
        }
    }

    /// Register the generator for a slot, replacing any previous one.
    pub fn register(mut self, slot: CallbackSlot, generator: Box<dyn CallbackGenerator<E>>) -> Self {
        self.generators.insert(slot, generator);
        self
    }

    /// The generator for `slot`, if registered.
    pub fn get(&self, slot: CallbackSlot) -> Option<&dyn CallbackGenerator<E>> {
        self.generators.get(&slot).map(|g| g.as_ref())
    }
}

impl<E: ClassEmitter> Default for GeneratorRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
