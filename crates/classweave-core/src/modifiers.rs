//! Member modifiers for descriptor types.
//!
//! Modifiers drive two decisions in the synthesis core: whether a method
//! survives the overridable surface (private, static, and final members are
//! dropped) and which visibility a synthesized override is declared with.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Modifiers attached to methods, constructors, and fields.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const PUBLIC    = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE   = 1 << 2;
        const STATIC    = 1 << 3;
        const FINAL     = 1 << 4;
        const ABSTRACT  = 1 << 5;
    }
}

impl Modifiers {
    /// Visible to a subclass: public or protected, but not private.
    pub fn is_visible(self) -> bool {
        !self.contains(Modifiers::PRIVATE)
    }

    /// Terminal members cannot be overridden.
    pub fn is_final(self) -> bool {
        self.contains(Modifiers::FINAL)
    }

    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Modifiers::ABSTRACT)
    }

    /// The visibility bits only, with everything else masked off.
    pub fn visibility(self) -> Modifiers {
        self & (Modifiers::PUBLIC | Modifiers::PROTECTED | Modifiers::PRIVATE)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, flag) in [
            ("public", Modifiers::PUBLIC),
            ("protected", Modifiers::PROTECTED),
            ("private", Modifiers::PRIVATE),
            ("static", Modifiers::STATIC),
            ("final", Modifiers::FINAL),
            ("abstract", Modifiers::ABSTRACT),
        ] {
            if self.contains(flag) {
                if !first {
                    write!(f, " ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_masks_non_visibility_bits() {
        let m = Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
        assert_eq!(m.visibility(), Modifiers::PUBLIC);
    }

    #[test]
    fn private_is_not_visible() {
        assert!(!Modifiers::PRIVATE.is_visible());
        assert!(Modifiers::PROTECTED.is_visible());
        assert!(Modifiers::PUBLIC.is_visible());
    }

    #[test]
    fn display_lists_set_flags() {
        let m = Modifiers::PUBLIC | Modifiers::FINAL;
        assert_eq!(m.to_string(), "public final");
    }
}
