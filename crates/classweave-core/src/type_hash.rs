//! Deterministic hash-based identity for types, methods, and constructors.
//!
//! This module provides [`TypeHash`], a 64-bit hash computed from names and
//! parameter types. Unlike sequential IDs, hashes are deterministic across
//! synthesis calls, which gives the synthesized classes stable member lookup
//! tables and lets a method's identity be computed before (or without) any
//! registration step.
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants so that a type, a
//! method, and a constructor never collide even when they share a name.
//! Method identity deliberately covers only the name and the parameter
//! types: return type and owning type are irrelevant for override
//! deduplication.
//!
//! # Examples
//!
//! ```
//! use classweave_core::{ParamType, TypeHash};
//!
//! let a = TypeHash::from_method("speak", &[]);
//! let b = TypeHash::from_method("speak", &[]);
//! assert_eq!(a, b); // deterministic
//!
//! let c = TypeHash::from_method("speak", &[ParamType::Int]);
//! assert_ne!(a, c); // parameter types are part of the identity
//! ```

use std::fmt;

use xxhash_rust::xxh64::xxh64;

use crate::ParamType;

/// Domain-specific mixing constants for hash computation.
///
/// These constants keep the hash domains of types, methods, and
/// constructors disjoint.
pub mod hash_constants {
    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for method hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for constructor hashes.
    pub const CONSTRUCTOR: u64 = 0x9a7f3d5e2b8c4601;

    /// Separator constant mixed in between parameter positions so that
    /// parameter order matters.
    pub const PARAM_SEP: u64 = 0x4bc94d6bd06053ad;
}

/// 64-bit deterministic identity hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHash(u64);

impl TypeHash {
    /// Create a type hash from a raw value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw hash value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Hash a type by name.
    pub fn from_name(name: &str) -> Self {
        Self(xxh64(name.as_bytes(), hash_constants::TYPE))
    }

    /// Hash a method identity: name plus parameter types.
    pub fn from_method(name: &str, params: &[ParamType]) -> Self {
        Self(mix_signature(
            xxh64(name.as_bytes(), hash_constants::METHOD),
            params,
        ))
    }

    /// Hash a constructor identity: parameter types only.
    pub fn from_constructor(params: &[ParamType]) -> Self {
        Self(mix_signature(hash_constants::CONSTRUCTOR, params))
    }
}

fn mix_signature(seed: u64, params: &[ParamType]) -> u64 {
    let mut hash = seed;
    for param in params {
        hash = xxh64(
            param.identity_token().as_bytes(),
            hash ^ hash_constants::PARAM_SEP,
        );
    }
    hash
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        assert_eq!(TypeHash::from_name("Animal"), TypeHash::from_name("Animal"));
        assert_eq!(
            TypeHash::from_method("speak", &[ParamType::Str]),
            TypeHash::from_method("speak", &[ParamType::Str]),
        );
    }

    #[test]
    fn domains_are_disjoint() {
        // A type, a no-arg method, and a no-arg constructor named alike
        // must not collide.
        let ty = TypeHash::from_name("speak");
        let method = TypeHash::from_method("speak", &[]);
        let ctor = TypeHash::from_constructor(&[]);
        assert_ne!(ty, method);
        assert_ne!(method, ctor);
    }

    #[test]
    fn parameter_order_matters() {
        let a = TypeHash::from_method("m", &[ParamType::Int, ParamType::Str]);
        let b = TypeHash::from_method("m", &[ParamType::Str, ParamType::Int]);
        assert_ne!(a, b);
    }

    #[test]
    fn object_parameter_names_matter() {
        let a = TypeHash::from_method("m", &[ParamType::object("Animal")]);
        let b = TypeHash::from_method("m", &[ParamType::object("Plant")]);
        assert_ne!(a, b);
    }
}
