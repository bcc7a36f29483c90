//! Live instances of synthesized classes.
//!
//! An [`Instance`] is a cheap clonable handle; the underlying object
//! (class reference plus field storage) is shared, so two handles to the
//! same object compare equal as [`Value::Object`] and observe each other's
//! field writes. Instances cross the interpreter boundary as opaque object
//! values and are recovered by downcast.

use std::fmt;
use std::sync::{Arc, Mutex};

use classweave_core::{CallbackRef, CallbackSlot, Callbacks, DispatchError, Value, WeaveError};
use classweave_synth::binding;

use crate::interp;
use crate::synthesized::SynthesizedClass;

pub(crate) struct InstanceInner {
    class: Arc<SynthesizedClass>,
    fields: Vec<Mutex<Value>>,
}

/// Handle to one object of a synthesized class.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.inner.class.name())
            .finish_non_exhaustive()
    }
}

impl Instance {
    /// Allocate with every field at its declared default. The constructed
    /// flag starts false; only a forwarding constructor sets it.
    pub(crate) fn new_uninit(class: &Arc<SynthesizedClass>) -> Self {
        let fields = (0..class.field_count())
            .map(|i| Mutex::new(class.field_default(i)))
            .collect();
        Self {
            inner: Arc::new(InstanceInner {
                class: class.clone(),
                fields,
            }),
        }
    }

    pub fn class(&self) -> &Arc<SynthesizedClass> {
        &self.inner.class
    }

    /// This instance as an opaque object value.
    pub fn as_value(&self) -> Value {
        Value::Object(self.inner.clone())
    }

    /// Recover an instance handle from an object value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?.clone();
        let inner = object.downcast::<InstanceInner>().ok()?;
        Some(Self { inner })
    }

    /// Whether the forwarding constructor has completed.
    pub fn is_constructed(&self) -> bool {
        self.field(binding::CONSTRUCTED_FIELD)
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Invoke a method virtually: emitted overrides first, then the native
    /// base chain.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, WeaveError> {
        let class = self.inner.class.clone();
        if let Some(method) = class.find_method_by_args(name, args) {
            return interp::run(&class, &method.body, Some(self), args);
        }
        if let Some(native) = class.base().find_method_named(name, args.len()) {
            return (native.body)(self, args);
        }
        Err(DispatchError::MethodNotFound {
            method: format!("{}.{}", class.name(), name),
        }
        .into())
    }

    /// The handler currently bound for `slot`, through the emitted
    /// introspection method. Unknown slots yield `None`.
    pub fn get_callback(&self, slot: CallbackSlot) -> Result<Option<CallbackRef>, WeaveError> {
        match self.call("getCallback", &[Value::Int(slot.raw() as i64)])? {
            Value::Callback(handler) => Ok(Some(handler)),
            Value::Null => Ok(None),
            other => Err(DispatchError::TypeMismatch {
                expected: "callback".into(),
                found: other.type_name().into(),
            }
            .into()),
        }
    }

    /// Rebind one slot's handler. Unknown slots are a no-op.
    pub fn set_callback(&self, slot: CallbackSlot, handler: CallbackRef) -> Result<(), WeaveError> {
        self.call(
            "setCallback",
            &[Value::Int(slot.raw() as i64), Value::Callback(handler)],
        )?;
        Ok(())
    }

    /// Rebind every used slot from a bundle.
    pub fn set_callbacks(&self, callbacks: &Callbacks) -> Result<(), WeaveError> {
        self.call("setCallbacks", &[Value::Bundle(callbacks.clone())])?;
        Ok(())
    }

    pub(crate) fn field(&self, name: &str) -> Result<Value, WeaveError> {
        let index = self.field_slot(name)?;
        self.inner.fields[index]
            .lock()
            .map(|v| v.clone())
            .map_err(|_| poisoned(name))
    }

    pub(crate) fn set_field(&self, name: &str, value: Value) -> Result<(), WeaveError> {
        let index = self.field_slot(name)?;
        match self.inner.fields[index].lock() {
            Ok(mut slot) => {
                *slot = value;
                Ok(())
            }
            Err(_) => Err(poisoned(name)),
        }
    }

    fn field_slot(&self, name: &str) -> Result<usize, WeaveError> {
        self.inner.class.field_slot(name).ok_or_else(|| {
            DispatchError::Internal {
                detail: format!("undeclared field {name} on {}", self.inner.class.name()),
            }
            .into()
        })
    }
}

fn poisoned(name: &str) -> WeaveError {
    DispatchError::Internal {
        detail: format!("poisoned lock on field {name}"),
    }
    .into()
}
