//! Function flag bits.
//!
//! Every dispatch target carries a 32-bit flag word. The hook machinery saves the whole word at
//! installation, forces [`FunctionFlags::NATIVE`] while an override is armed, and restores the
//! saved word verbatim on teardown, so unknown bits survive a hook/unhook round trip untouched.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Flag bits of a script function
    pub struct FunctionFlags: u32 {
        /// The dispatch slot holds a directly callable handler; call sites must always
        /// dispatch through the slot rather than specializing the call
        const NATIVE = 0x0001;
        /// Declared with the event calling convention (fixed signature, result ignored)
        const EVENT = 0x0002;
        /// Natively dispatched and non-overridable; the dispatch slot of such a function
        /// cannot be replaced
        const FINAL = 0x0004;
        /// Bound to the class rather than an instance
        const STATIC = 0x0008;
    }
}

impl FunctionFlags {
    /// Extract the known flag bits from a raw flag word
    #[must_use]
    pub fn from_raw(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }
}
