//! The finalized synthesized class.
//!
//! A [`SynthesizedClass`] is the reference backend's output: the emitted
//! member bodies keyed by identity hash, the instance field layout, the
//! static field store, and one per-thread transfer cell per used slot.
//! Everything is immutable after finalization except the static store and
//! the cells, both of which are interior-mutable and thread-safe.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, ThreadId};

use classweave_core::{
    CallbackRef, CallbackSlot, Callbacks, DispatchError, MethodDescriptor, ParamType,
    TypeDescriptor, TypeHash, Value, WeaveError,
};
use rustc_hash::FxHashMap;

use crate::instance::Instance;
use crate::interp;
use crate::native::NativeClass;
use crate::op::Op;

pub(crate) struct EmittedMethod {
    pub descriptor: Arc<MethodDescriptor>,
    pub body: Vec<Op>,
}

/// Per-slot, per-thread handler parking spot.
///
/// Written by the construction entry points, read by the handler-read
/// protocol while the constructed flag is still false. Entries are
/// overwritten by the next construction on the same thread, never cleared.
pub(crate) struct TransferCell {
    entries: Mutex<FxHashMap<ThreadId, Value>>,
}

impl TransferCell {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// The calling thread's parked value, or null.
    pub(crate) fn load(&self) -> Value {
        self.entries
            .lock()
            .map(|map| map.get(&thread::current().id()).cloned())
            .ok()
            .flatten()
            .unwrap_or(Value::Null)
    }

    pub(crate) fn store(&self, value: Value) {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(thread::current().id(), value);
        }
    }
}

/// A dynamically synthesized class, ready to construct instances.
pub struct SynthesizedClass {
    me: Weak<SynthesizedClass>,
    name: Arc<str>,
    base: Arc<NativeClass>,
    interfaces: Vec<Arc<TypeDescriptor>>,
    field_names: Vec<Arc<str>>,
    field_types: Vec<ParamType>,
    field_index: FxHashMap<Arc<str>, usize>,
    statics: Mutex<FxHashMap<Arc<str>, Value>>,
    cells: FxHashMap<CallbackSlot, TransferCell>,
    methods: FxHashMap<TypeHash, EmittedMethod>,
    static_methods: FxHashMap<TypeHash, EmittedMethod>,
    constructors: FxHashMap<TypeHash, Vec<Op>>,
}

impl fmt::Debug for SynthesizedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesizedClass")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl SynthesizedClass {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        name: Arc<str>,
        base: Arc<NativeClass>,
        interfaces: Vec<Arc<TypeDescriptor>>,
        fields: Vec<(Arc<str>, ParamType)>,
        static_fields: Vec<(Arc<str>, ParamType)>,
        cells: Vec<CallbackSlot>,
        methods: FxHashMap<TypeHash, EmittedMethod>,
        static_methods: FxHashMap<TypeHash, EmittedMethod>,
        constructors: FxHashMap<TypeHash, Vec<Op>>,
    ) -> Arc<Self> {
        let mut field_names = Vec::with_capacity(fields.len());
        let mut field_types = Vec::with_capacity(fields.len());
        let mut field_index = FxHashMap::default();
        for (i, (name, ty)) in fields.into_iter().enumerate() {
            field_index.insert(name.clone(), i);
            field_names.push(name);
            field_types.push(ty);
        }
        let statics = static_fields
            .into_iter()
            .map(|(name, ty)| {
                let default = Value::default_for(&ty);
                (name, default)
            })
            .collect();
        let cells = cells
            .into_iter()
            .map(|slot| (slot, TransferCell::new()))
            .collect();
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            name,
            base,
            interfaces,
            field_names,
            field_types,
            field_index,
            statics: Mutex::new(statics),
            cells,
            methods,
            static_methods,
            constructors,
        })
    }

    /// A strong handle to this class. The self-reference always upgrades
    /// while `&self` is alive.
    pub(crate) fn shared(&self) -> Arc<SynthesizedClass> {
        self.me
            .upgrade()
            .unwrap_or_else(|| unreachable!("class outlives its own borrow"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> &Arc<NativeClass> {
        &self.base
    }

    /// Implemented interfaces, in declaration order. The factory
    /// capability interface is always last.
    pub fn interfaces(&self) -> &[Arc<TypeDescriptor>] {
        &self.interfaces
    }

    /// Declared instance field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_names.iter().map(|n| n.as_ref())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_index.contains_key(name)
    }

    pub fn has_static(&self, name: &str) -> bool {
        self.statics
            .lock()
            .map(|map| map.contains_key(name))
            .unwrap_or(false)
    }

    /// Whether a transfer cell was declared for `slot`.
    pub fn has_transfer_cell(&self, slot: CallbackSlot) -> bool {
        self.cells.contains_key(&slot)
    }

    /// The calling thread's parked value in the slot's transfer cell.
    /// `None` when the slot has no cell at all.
    pub fn peek_transfer_cell(&self, slot: CallbackSlot) -> Option<Value> {
        self.cells.get(&slot).map(TransferCell::load)
    }

    /// Names of emitted instance methods, sorted.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .methods
            .values()
            .map(|m| m.descriptor.name.to_string())
            .collect();
        names.sort_unstable();
        names
    }

    // ==========================================================================
    // Construction entry points
    // ==========================================================================

    /// Construct through the default constructor, binding `callbacks`.
    pub fn new_instance(&self, callbacks: &Callbacks) -> Result<Instance, WeaveError> {
        let result = self.call_static(
            "newInstance",
            &[ParamType::Bundle],
            &[Value::Bundle(callbacks.clone())],
        )?;
        Self::expect_instance(result)
    }

    /// Construct through the default constructor with a single handler.
    /// Fails when more than one slot is in use.
    pub fn new_instance_single(&self, handler: CallbackRef) -> Result<Instance, WeaveError> {
        let result = self.call_static(
            "newInstance",
            &[ParamType::Callback],
            &[Value::Callback(handler)],
        )?;
        Self::expect_instance(result)
    }

    /// Construct through the constructor whose parameter types equal
    /// `types`, passing `values`. A `None` bundle skips handler binding.
    pub fn new_instance_with_args(
        &self,
        types: &[ParamType],
        values: &[Value],
        callbacks: Option<&Callbacks>,
    ) -> Result<Instance, WeaveError> {
        let bundle = match callbacks {
            Some(b) => Value::Bundle(b.clone()),
            None => Value::Null,
        };
        let result = self.call_static(
            "newInstance",
            &[ParamType::TypeList, ParamType::ValueList, ParamType::Bundle],
            &[
                Value::TypeList(Arc::new(types.to_vec())),
                Value::ValueList(Arc::new(values.to_vec())),
                bundle,
            ],
        )?;
        Self::expect_instance(result)
    }

    /// Invoke an emitted static method by name and structural argument
    /// match.
    pub fn invoke_static(&self, name: &str, args: &[Value]) -> Result<Value, WeaveError> {
        let method = self
            .static_methods
            .values()
            .find(|m| {
                &*m.descriptor.name == name
                    && m.descriptor.params.len() == args.len()
                    && args
                        .iter()
                        .zip(&m.descriptor.params)
                        .all(|(v, p)| v.matches(p))
            })
            .ok_or_else(|| DispatchError::MethodNotFound {
                method: format!("{}.{}", self.name, name),
            })?;
        interp::run(self, &method.body, None, args)
    }

    fn call_static(
        &self,
        name: &str,
        params: &[ParamType],
        args: &[Value],
    ) -> Result<Value, WeaveError> {
        let hash = TypeHash::from_method(name, params);
        let method =
            self.static_methods
                .get(&hash)
                .ok_or_else(|| DispatchError::MethodNotFound {
                    method: format!("{}.{}", self.name, name),
                })?;
        interp::run(self, &method.body, None, args)
    }

    fn expect_instance(value: Value) -> Result<Instance, WeaveError> {
        Instance::from_value(&value).ok_or_else(|| {
            DispatchError::Internal {
                detail: "construction entry point returned a non-instance value".into(),
            }
            .into()
        })
    }

    // ==========================================================================
    // Interpreter support
    // ==========================================================================

    pub(crate) fn field_slot(&self, name: &str) -> Option<usize> {
        self.field_index.get(name).copied()
    }

    pub(crate) fn field_default(&self, index: usize) -> Value {
        Value::default_for(&self.field_types[index])
    }

    pub(crate) fn field_count(&self) -> usize {
        self.field_types.len()
    }

    pub(crate) fn static_value(&self, name: &str) -> Option<Value> {
        self.statics.lock().ok()?.get(name).cloned()
    }

    pub(crate) fn set_static(&self, name: &str, value: Value) -> bool {
        match self.statics.lock() {
            Ok(mut map) => match map.get_mut(name) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    pub(crate) fn cell(&self, slot: CallbackSlot) -> Option<&TransferCell> {
        self.cells.get(&slot)
    }

    pub(crate) fn find_method(&self, hash: TypeHash) -> Option<&EmittedMethod> {
        self.methods.get(&hash)
    }

    pub(crate) fn find_method_by_args(&self, name: &str, args: &[Value]) -> Option<&EmittedMethod> {
        self.methods.values().find(|m| {
            &*m.descriptor.name == name
                && m.descriptor.params.len() == args.len()
                && args
                    .iter()
                    .zip(&m.descriptor.params)
                    .all(|(v, p)| v.matches(p))
        })
    }

    pub(crate) fn find_constructor(&self, hash: TypeHash) -> Option<&Vec<Op>> {
        self.constructors.get(&hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_cell_is_per_thread() {
        let cell = Arc::new(TransferCell::new());
        cell.store(Value::Int(7));
        assert_eq!(cell.load(), Value::Int(7));

        let remote = cell.clone();
        let seen = thread::spawn(move || remote.load()).join().unwrap();
        assert!(seen.is_null());
    }

    #[test]
    fn transfer_cell_overwrites_never_clears() {
        let cell = TransferCell::new();
        cell.store(Value::Int(1));
        cell.store(Value::Int(2));
        assert_eq!(cell.load(), Value::Int(2));
        assert_eq!(cell.load(), Value::Int(2));
    }
}
