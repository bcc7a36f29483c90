//! Runtime values.
//!
//! [`Value`] is the single value representation shared by the abstract
//! emitter contract and the reference backend: everything a generated body
//! loads, stores, passes, or returns is a `Value`. The shape mirrors a
//! small dynamic-dispatch VM slot: primitives, strings, opaque object
//! handles, plus the carriers the factory surface needs (handler
//! references, handler bundles, type lists, value lists, and
//! method-descriptor constants).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{CallbackRef, Callbacks, MethodDescriptor, ParamType};

/// Opaque handle to a heap object. Backends downcast to their own
/// instance representation.
pub type ObjectRef = Arc<dyn Any + Send + Sync>;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    /// Null reference.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Handle to a backend object.
    Object(ObjectRef),
    /// A handler reference.
    Callback(CallbackRef),
    /// A method-descriptor constant.
    Method(Arc<MethodDescriptor>),
    /// A list of parameter types (explicit-argument construction).
    TypeList(Arc<Vec<ParamType>>),
    /// A list of values (explicit-argument construction).
    ValueList(Arc<Vec<Value>>),
    /// A handler bundle.
    Bundle(Callbacks),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Human-readable name of this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Object(_) => "object",
            Value::Callback(_) => "callback",
            Value::Method(_) => "method",
            Value::TypeList(_) => "typelist",
            Value::ValueList(_) => "valuelist",
            Value::Bundle(_) => "bundle",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&CallbackRef> {
        match self {
            Value::Callback(c) => Some(c),
            _ => None,
        }
    }

    /// Structural match against a declared parameter type.
    ///
    /// Null matches every reference-like parameter; there is no implicit
    /// numeric conversion.
    pub fn matches(&self, param: &ParamType) -> bool {
        match (self, param) {
            (Value::Bool(_), ParamType::Bool) => true,
            (Value::Int(_), ParamType::Int) => true,
            (Value::Float(_), ParamType::Float) => true,
            (Value::Str(_), ParamType::Str) => true,
            (Value::Object(_), ParamType::Object(_)) => true,
            (Value::Callback(_), ParamType::Callback) => true,
            (Value::Method(_), ParamType::Method) => true,
            (Value::TypeList(_), ParamType::TypeList) => true,
            (Value::ValueList(_), ParamType::ValueList) => true,
            (Value::Bundle(_), ParamType::Bundle) => true,
            (Value::Null, ParamType::Str)
            | (Value::Null, ParamType::Object(_))
            | (Value::Null, ParamType::Callback)
            | (Value::Null, ParamType::Method)
            | (Value::Null, ParamType::TypeList)
            | (Value::Null, ParamType::ValueList)
            | (Value::Null, ParamType::Bundle) => true,
            _ => false,
        }
    }

    /// Default field value for a declared type: booleans start false,
    /// everything else starts null.
    pub fn default_for(param: &ParamType) -> Value {
        match param {
            ParamType::Bool => Value::Bool(false),
            ParamType::Int => Value::Int(0),
            ParamType::Float => Value::Float(0.0),
            _ => Value::Null,
        }
    }
}

// Opaque reference values compare by identity; primitives by value; type
// and value lists by contents. Bundles never compare equal. Good enough
// for assertions, not a language-level equality.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Callback(a), Value::Callback(b)) => Arc::ptr_eq(a, b),
            (Value::Method(a), Value::Method(b)) => Arc::ptr_eq(a, b),
            (Value::TypeList(a), Value::TypeList(b)) => a == b,
            (Value::ValueList(a), Value::ValueList(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Int(v) => write!(f, "Int({v})"),
            Value::Float(v) => write!(f, "Float({v})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Object(_) => write!(f, "Object(..)"),
            Value::Callback(_) => write!(f, "Callback(..)"),
            Value::Method(m) => write!(f, "Method({m})"),
            Value::TypeList(t) => write!(f, "TypeList({t:?})"),
            Value::ValueList(v) => write!(f, "ValueList({v:?})"),
            Value::Bundle(b) => write!(f, "Bundle({b:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_match() {
        assert!(Value::Int(3).matches(&ParamType::Int));
        assert!(!Value::Int(3).matches(&ParamType::Float));
        assert!(Value::Str("x".into()).matches(&ParamType::Str));
        assert!(Value::Null.matches(&ParamType::object("Animal")));
        assert!(!Value::Null.matches(&ParamType::Int));
    }

    #[test]
    fn defaults_by_type() {
        assert_eq!(Value::default_for(&ParamType::Bool), Value::Bool(false));
        assert_eq!(Value::default_for(&ParamType::Callback), Value::Null);
    }

    #[test]
    fn value_lists_compare_by_contents() {
        let a = Value::ValueList(Arc::new(vec![Value::Int(1), Value::Str("x".into())]));
        let b = Value::ValueList(Arc::new(vec![Value::Int(1), Value::Str("x".into())]));
        let c = Value::ValueList(Arc::new(vec![Value::Int(2)]));
        assert_eq!(a, a.clone());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
