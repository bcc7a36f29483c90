//! Callback binding and propagation.
//!
//! This module owns the storage conventions of a synthesized class — the
//! per-slot handler fields, the per-slot/per-thread transfer cells, the
//! constructed flag — and emits the three protocols that tie them
//! together:
//!
//! - the **read protocol** resolving "the currently active handler" at the
//!   top of every intercepted method body,
//! - the **write protocol** copying a bundle into the handler fields,
//! - the **thread propagation** static method that parks a bundle in the
//!   transfer cells right before construction.
//!
//! # The construction handshake
//!
//! Between the moment a factory entry point parks handler bindings in the
//! transfer cells and the moment the forwarding constructor finishes, a
//! virtual self-call dispatched from inside the base constructor must
//! still resolve a handler, while the handler fields cannot be assigned
//! yet. The read protocol therefore falls back to the calling thread's
//! transfer cell whenever the field is empty *and* the constructed flag is
//! still false.
//!
//! Cells are overwritten by the next construction on the same thread,
//! never cleared: a stale handler stays parked after construction
//! completes, but the constructed flag redirects all subsequent reads to
//! the field, so the stale value is unobservable through generated code.
//!
//! # Reentrancy hazard
//!
//! The cells are keyed per slot and per thread only. If constructing
//! instance A triggers — from inside A's base constructor, on the same
//! thread — another handler-bound construction B, then B's propagation
//! step overwrites the cells A is still reading. Handler-bound
//! construction must not recursively trigger another handler-bound
//! construction on the same thread before the first instance's
//! constructed flag is set.

use classweave_core::{CallbackSlot, MethodDescriptor, Modifiers, ParamType, SLOT_COUNT};

use crate::emit::ClassEmitter;

/// Name of the boolean constructed-flag field.
pub const CONSTRUCTED_FIELD: &str = "CW$CONSTRUCTED";

/// Name of the emitted static thread-propagation method.
pub const BIND_THREAD_CALLBACKS: &str = "CW$BIND_THREAD_CALLBACKS";

/// Name of the handler field for a slot.
pub fn callback_field(slot: CallbackSlot) -> String {
    format!("CW$CALLBACK_{}", slot.raw())
}

/// Name of the transfer cell for a slot.
pub fn transfer_cell_name(slot: CallbackSlot) -> String {
    format!("CW$TL_CALLBACK_{}", slot.raw())
}

/// Descriptor of the static thread-propagation method.
pub fn bind_thread_descriptor(class_name: &str) -> MethodDescriptor {
    MethodDescriptor::new(
        class_name,
        BIND_THREAD_CALLBACKS,
        &[ParamType::Bundle],
        ParamType::Void,
        Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL,
    )
}

/// Tracks which slots are used and emits the binding protocols.
///
/// A slot becomes used at the first [`emit_current_callback`] reference;
/// that first reference also declares the slot's handler field and
/// transfer cell (lazy, first-reference declaration — pre-declaring all
/// slots would allocate storage for slots no body references).
///
/// [`emit_current_callback`]: CallbackBinder::emit_current_callback
pub struct CallbackBinder {
    class_name: String,
    used: [bool; SLOT_COUNT],
}

impl CallbackBinder {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_owned(),
            used: [false; SLOT_COUNT],
        }
    }

    pub fn is_used(&self, slot: CallbackSlot) -> bool {
        self.used[slot.index()]
    }

    /// Used slots, ascending.
    pub fn used_slots(&self) -> Vec<CallbackSlot> {
        CallbackSlot::all().filter(|s| self.is_used(*s)).collect()
    }

    pub fn used_count(&self) -> usize {
        self.used.iter().filter(|u| **u).count()
    }

    /// Emit the read protocol for `slot`: leaves the active handler (or
    /// null) on the stack. `[] -> [handler|null]`
    ///
    /// Sequence: load the handler field; if non-null use it; else if the
    /// constructed flag is set use null (no handler bound — the generator
    /// decides what null means); else read the calling thread's transfer
    /// cell and cast it to the slot's handler type.
    pub fn emit_current_callback<E: ClassEmitter>(&mut self, emitter: &mut E, slot: CallbackSlot) {
        self.ensure_declared(emitter, slot);

        let end = emitter.make_label();
        emitter.load_this();
        emitter.get_field(&callback_field(slot));
        emitter.dup();
        emitter.jump_if_non_null(end);
        emitter.load_this();
        emitter.get_field(CONSTRUCTED_FIELD);
        emitter.jump_if_true(end);
        emitter.pop();
        emitter.cell_load(slot);
        emitter.check_callback_cast(slot);
        emitter.mark(end);
    }

    /// Emit the bulk write protocol. `[target, bundle] -> []`
    ///
    /// For every used slot, reads the bundle and assigns the handler
    /// field. With no used slots the operands are simply discarded.
    pub fn emit_bind_callbacks<E: ClassEmitter>(&self, emitter: &mut E) {
        let used = self.used_slots();
        if used.is_empty() {
            emitter.pop2();
            return;
        }
        let last = used.len() - 1;
        for (i, slot) in used.iter().enumerate() {
            if i < last {
                emitter.dup2();
            }
            emitter.push_int(slot.raw() as i64);
            emitter.bundle_get();
            emitter.check_callback_cast(*slot);
            emitter.put_field(&callback_field(*slot));
        }
    }

    /// Emit the static thread-propagation method: parks each used slot's
    /// bundle entry in that slot's transfer cell for the calling thread.
    /// A null bundle is a no-op.
    pub fn emit_bind_thread_method<E: ClassEmitter>(&self, emitter: &mut E) {
        let descriptor = bind_thread_descriptor(&self.class_name);
        emitter.begin_method(descriptor.modifiers, &descriptor);
        let end = emitter.make_label();
        emitter.load_arg(0);
        emitter.jump_if_null(end);
        for slot in self.used_slots() {
            emitter.load_arg(0);
            emitter.push_int(slot.raw() as i64);
            emitter.bundle_get();
            emitter.cell_store(slot);
        }
        emitter.mark(end);
        emitter.return_value();
        emitter.end_member();
    }

    fn ensure_declared<E: ClassEmitter>(&mut self, emitter: &mut E, slot: CallbackSlot) {
        if self.used[slot.index()] {
            return;
        }
        emitter.declare_field(Modifiers::PRIVATE, ParamType::Callback, &callback_field(slot));
        emitter.declare_transfer_cell(slot, &transfer_cell_name(slot));
        self.used[slot.index()] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deterministic() {
        let slot = CallbackSlot::new(3).unwrap();
        assert_eq!(callback_field(slot), "CW$CALLBACK_3");
        assert_eq!(transfer_cell_name(slot), "CW$TL_CALLBACK_3");
    }

    #[test]
    fn fresh_binder_uses_nothing() {
        let binder = CallbackBinder::new("Animal$Woven");
        assert_eq!(binder.used_count(), 0);
        assert!(binder.used_slots().is_empty());
    }
}
