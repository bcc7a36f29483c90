//! Unified error types for class synthesis.
//!
//! One enum per phase, plus a top-level wrapper:
//!
//! ```text
//! WeaveError (top-level wrapper)
//! ├── SynthesisError    - configuration faults; the whole synthesis call aborts
//! ├── ConstructionError - factory entry points, surfaced at construction time
//! └── DispatchError     - intercepted-method dispatch at runtime
//! ```
//!
//! Synthesis errors are fatal to the call that raised them: no partially
//! built type is ever returned. Construction and dispatch errors surface
//! synchronously to the caller of the failing operation; nothing is retried
//! internally.

use thiserror::Error;

/// Errors that abort a synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// The base type exposes no constructor a subclass could forward to.
    #[error("no visible constructors in {type_name}")]
    NoVisibleConstructor { type_name: String },

    /// The classifier returned a slot outside the valid range.
    #[error("classifier returned slot {slot} for {method} (valid range 0..={max})")]
    SlotOutOfRange {
        method: String,
        slot: u32,
        max: u32,
    },

    /// A non-empty slot has no registered generator.
    #[error("no callback generator registered for slot {slot}")]
    MissingGenerator { slot: u32 },

    /// The emitter backend rejected a request.
    #[error("emitter backend error: {detail}")]
    Backend { detail: String },
}

/// Errors raised by the synthesized construction entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// No forwarding constructor matches the supplied argument types.
    #[error("constructor not found on {class}")]
    ConstructorNotFound { class: String },

    /// Single-handler construction attempted with more than one used slot.
    #[error("more than one callback object required ({used} slots in use)")]
    AmbiguousCallback { used: usize },
}

/// Errors raised while dispatching an intercepted method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The resolved handler was null and the slot's generator has no
    /// fallback behavior for this method.
    #[error("no handler bound and no base implementation for {method}")]
    NoHandler { method: String },

    /// No method with this identity exists on the receiver.
    #[error("method not found: {method}")]
    MethodNotFound { method: String },

    /// A value did not match the declared type at a checked cast or
    /// argument position.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A handler reported a failure of its own.
    #[error("handler error: {0}")]
    Handler(String),

    /// Interpreter invariant breach. Never expected from bodies produced
    /// by a well-formed emitter.
    #[error("internal dispatch error: {detail}")]
    Internal { detail: String },
}

/// Top-level error wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeaveError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl WeaveError {
    /// The construction error inside, if that is what this is.
    pub fn as_construction(&self) -> Option<&ConstructionError> {
        match self {
            WeaveError::Construction(e) => Some(e),
            _ => None,
        }
    }

    /// The dispatch error inside, if that is what this is.
    pub fn as_dispatch(&self) -> Option<&DispatchError> {
        match self {
            WeaveError::Dispatch(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        let e = ConstructionError::AmbiguousCallback { used: 2 };
        assert_eq!(
            e.to_string(),
            "more than one callback object required (2 slots in use)"
        );

        let e = SynthesisError::SlotOutOfRange {
            method: "speak()".into(),
            slot: 40,
            max: 15,
        };
        assert!(e.to_string().contains("slot 40"));
    }

    #[test]
    fn wrapper_conversions() {
        let e: WeaveError = ConstructionError::ConstructorNotFound {
            class: "Animal$Woven".into(),
        }
        .into();
        assert!(e.as_construction().is_some());
        assert!(e.as_dispatch().is_none());
    }
}
