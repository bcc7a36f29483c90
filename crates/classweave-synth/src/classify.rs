//! Slot classification of the method surface.
//!
//! The caller supplies a [`CallbackFilter`] assigning each surviving
//! method an integer callback slot. [`MethodGroups`] partitions the
//! surface by slot, preserving surface order within each group — group
//! order drives the stable per-method naming generators rely on.
//!
//! An out-of-range slot aborts synthesis with
//! [`SynthesisError::SlotOutOfRange`].

use classweave_core::{CallbackSlot, MethodDescriptor, SynthesisError, SLOT_COUNT};

use crate::surface::MethodSurface;

/// Per-method slot classification supplied by the caller.
///
/// Must be total over the method surface; values must lie in
/// `0..=CallbackSlot::MAX`.
pub trait CallbackFilter {
    fn accept(&self, method: &MethodDescriptor) -> u32;
}

// Plain closures work as filters.
impl<F> CallbackFilter for F
where
    F: Fn(&MethodDescriptor) -> u32,
{
    fn accept(&self, method: &MethodDescriptor) -> u32 {
        (self)(method)
    }
}

/// Methods grouped by callback slot, in surface order.
#[derive(Debug)]
pub struct MethodGroups {
    groups: Vec<Vec<MethodDescriptor>>,
}

impl MethodGroups {
    /// Partition the surface using `filter`.
    pub fn partition(
        surface: &MethodSurface,
        filter: &dyn CallbackFilter,
    ) -> Result<Self, SynthesisError> {
        let mut groups: Vec<Vec<MethodDescriptor>> = (0..SLOT_COUNT).map(|_| Vec::new()).collect();
        for method in surface.methods() {
            let raw = filter.accept(method);
            let slot = CallbackSlot::new(raw).ok_or_else(|| SynthesisError::SlotOutOfRange {
                method: method.key().to_string(),
                slot: raw,
                max: CallbackSlot::MAX.raw(),
            })?;
            groups[slot.index()].push(method.clone());
        }
        Ok(Self { groups })
    }

    /// The methods assigned to `slot`, in surface order.
    pub fn group(&self, slot: CallbackSlot) -> &[MethodDescriptor] {
        &self.groups[slot.index()]
    }

    /// Slots with at least one method, ascending.
    pub fn non_empty(&self) -> impl Iterator<Item = CallbackSlot> + '_ {
        CallbackSlot::all().filter(|s| !self.groups[s.index()].is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classweave_core::{Modifiers, ParamType, TypeDescriptor};

    fn surface() -> MethodSurface {
        let base = TypeDescriptor::class("Animal")
            .constructor(&[], Modifiers::PUBLIC)
            .method("speak", &[], ParamType::Str, Modifiers::PUBLIC)
            .method("age", &[], ParamType::Int, Modifiers::PUBLIC)
            .method("feed", &[ParamType::Str], ParamType::Void, Modifiers::PUBLIC)
            .build();
        MethodSurface::build(&base, &[])
    }

    #[test]
    fn partitions_by_slot_preserving_order() {
        let surface = surface();
        let filter = |m: &MethodDescriptor| if &*m.name == "speak" { 0 } else { 1 };
        let groups = MethodGroups::partition(&surface, &filter).unwrap();

        let s0 = CallbackSlot::new(0).unwrap();
        let s1 = CallbackSlot::new(1).unwrap();
        assert_eq!(groups.group(s0).len(), 1);
        let names: Vec<&str> = groups.group(s1).iter().map(|m| &*m.name).collect();
        assert_eq!(names, vec!["age", "feed"]);

        let non_empty: Vec<_> = groups.non_empty().collect();
        assert_eq!(non_empty, vec![s0, s1]);
    }

    #[test]
    fn out_of_range_slot_is_an_error() {
        let surface = surface();
        let filter = |_: &MethodDescriptor| 99u32;
        let err = MethodGroups::partition(&surface, &filter).unwrap_err();
        assert!(matches!(err, SynthesisError::SlotOutOfRange { slot: 99, .. }));
    }
}
