//! Callback slots, handler objects, and handler bundles.
//!
//! Methods on a synthesized class are partitioned by an integer *callback
//! slot*; every slot that at least one generated body references gets one
//! per-instance handler field and one per-thread transfer cell. A
//! [`Callbacks`] bundle carries the handler bindings for construction, and
//! [`Callback`] is the type-erased handler object itself.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::{DispatchError, MethodDescriptor, Value};

/// Number of addressable callback slots.
pub const SLOT_COUNT: usize = 16;

/// Identifies one pluggable interception strategy.
///
/// Valid slots are `0..=CallbackSlot::MAX`. A slot is *used* only when a
/// generated method body references it; unused slots allocate no storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackSlot(u32);

impl CallbackSlot {
    /// The highest valid slot.
    pub const MAX: CallbackSlot = CallbackSlot(SLOT_COUNT as u32 - 1);

    /// Create a slot, or `None` if out of range.
    pub const fn new(index: u32) -> Option<Self> {
        if index < SLOT_COUNT as u32 {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// All valid slots in ascending order.
    pub fn all() -> impl Iterator<Item = CallbackSlot> {
        (0..SLOT_COUNT as u32).map(CallbackSlot)
    }
}

impl fmt::Display for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// One intercepted call, as presented to a handler.
pub struct Invocation<'a> {
    /// The receiver, as a runtime value (an object handle).
    pub target: &'a Value,
    /// Descriptor of the intercepted method.
    pub method: &'a MethodDescriptor,
    /// Call arguments.
    pub args: &'a [Value],
}

/// A pluggable handler supplying behavior for the methods of its slot.
///
/// Handlers are shared, type-erased objects; what a handler is *for* is
/// decided by the generator that emitted the bodies referencing its slot.
pub trait Callback: Send + Sync + 'static {
    /// Handle one intercepted call.
    fn invoke(&self, invocation: Invocation<'_>) -> Result<Value, DispatchError>;
}

/// Shared handler reference.
pub type CallbackRef = Arc<dyn Callback>;

// Closures can serve directly as handlers.
impl<F> Callback for F
where
    F: Fn(Invocation<'_>) -> Result<Value, DispatchError> + Send + Sync + 'static,
{
    fn invoke(&self, invocation: Invocation<'_>) -> Result<Value, DispatchError> {
        (self)(invocation)
    }
}

/// Handler bundle: slot → handler.
///
/// Consumed by the synthesized `setCallbacks` and `newInstance` operations.
/// Slots absent from the bundle resolve to null.
#[derive(Default, Clone)]
pub struct Callbacks {
    entries: FxHashMap<CallbackSlot, CallbackRef>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, slot: CallbackSlot, handler: CallbackRef) -> Self {
        self.entries.insert(slot, handler);
        self
    }

    pub fn set(&mut self, slot: CallbackSlot, handler: CallbackRef) {
        self.entries.insert(slot, handler);
    }

    /// The handler bound for `slot`, if any.
    pub fn get(&self, slot: CallbackSlot) -> Option<&CallbackRef> {
        self.entries.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut slots: Vec<_> = self.entries.keys().map(|s| s.index()).collect();
        slots.sort_unstable();
        f.debug_struct("Callbacks").field("slots", &slots).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn null_handler() -> CallbackRef {
        Arc::new(|_inv: Invocation<'_>| Ok(Value::Null))
    }

    #[test]
    fn slot_range_is_enforced() {
        assert!(CallbackSlot::new(0).is_some());
        assert!(CallbackSlot::new(SLOT_COUNT as u32 - 1).is_some());
        assert!(CallbackSlot::new(SLOT_COUNT as u32).is_none());
    }

    #[test]
    fn bundle_lookup() {
        let s0 = CallbackSlot::new(0).unwrap();
        let s1 = CallbackSlot::new(1).unwrap();
        let bundle = Callbacks::new().with(s0, null_handler());
        assert!(bundle.get(s0).is_some());
        assert!(bundle.get(s1).is_none());
        assert_eq!(bundle.len(), 1);
    }
}
