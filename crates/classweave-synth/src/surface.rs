//! Overridable method surface inventory.
//!
//! Builds the ordered set of methods a synthesized subclass overrides.
//! Order is significant and fixed: the base type's declared methods, then
//! its ancestor chain (each ancestor's declared methods, then that
//! ancestor's interfaces), then each requested interface in argument
//! order. After inventory, three filters run in sequence: visibility
//! (private and static members drop out), deduplication by method identity
//! (first occurrence wins), and terminal-method removal.
//!
//! The relative order of dedup and final-removal matters: a terminal base
//! method shadows a same-identity interface method during dedup and is
//! *then* removed, so the method is not overridden at all.

use classweave_core::{MethodDescriptor, MethodKey, TypeDescriptor};
use rustc_hash::FxHashSet;

/// The surviving overridable method surface for one synthesis request.
#[derive(Debug)]
pub struct MethodSurface {
    methods: Vec<MethodDescriptor>,
    force_public: FxHashSet<MethodKey>,
}

impl MethodSurface {
    /// Build the surface for `base` plus `interfaces`.
    pub fn build(base: &TypeDescriptor, interfaces: &[std::sync::Arc<TypeDescriptor>]) -> Self {
        let mut inventory = Vec::new();
        collect_all(base, &mut inventory);

        let mut interface_methods = Vec::new();
        for interface in interfaces {
            collect_all(interface, &mut interface_methods);
        }
        // Interface methods must surface as public even where the base
        // declared the same identity protected.
        let force_public: FxHashSet<MethodKey> =
            interface_methods.iter().map(|m| m.key()).collect();
        inventory.extend(interface_methods);

        let mut seen = FxHashSet::default();
        let mut methods = Vec::new();
        for method in inventory {
            if !method.modifiers.is_visible() || method.modifiers.is_static() {
                continue;
            }
            if !seen.insert(method.key()) {
                continue;
            }
            methods.push(method);
        }
        methods.retain(|m| !m.modifiers.is_final());

        Self {
            methods,
            force_public,
        }
    }

    /// Surviving methods, in inventory order.
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Identities that must surface as public.
    pub fn force_public(&self) -> &FxHashSet<MethodKey> {
        &self.force_public
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Declared methods, then the superclass chain, then the type's own
/// interfaces.
fn collect_all(ty: &TypeDescriptor, out: &mut Vec<MethodDescriptor>) {
    out.extend(ty.methods.iter().cloned());
    if let Some(superclass) = &ty.superclass {
        collect_all(superclass, out);
    }
    for interface in &ty.interfaces {
        collect_all(interface, out);
    }
}
