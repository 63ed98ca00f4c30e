use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure here is a configuration error detected at the point it occurs: unresolvable
/// names, attempts to hook non-overridable targets, malformed class definitions, or a failure
/// raised by a host-supplied handler during dispatch. None of them leave partially mutated hook
/// state behind; installation validates everything before touching a target.
///
/// Invariant violations (a trampoline invocation for an unregistered target, reentrant dispatch
/// on the same record) are not represented here. They indicate corrupted dispatch state that the
/// host cannot recover from mid-call and surface as assertions instead; see the crate-level
/// documentation.
#[derive(Error, Debug)]
pub enum Error {
    /// A function name could not be resolved on the class it was looked up against.
    ///
    /// Returned by checked lookups and by override installation when either the target or the
    /// override function name does not exist on the respective class.
    #[error("No function named '{function}' in '{class}'")]
    FunctionNotFound {
        /// Name of the class the lookup ran against
        class: String,
        /// The function name that failed to resolve
        function: String,
    },

    /// The target function is natively dispatched and final; its dispatch slot cannot be
    /// replaced.
    #[error("Cannot override native final function '{function}' in '{class}'")]
    NativeFinal {
        /// Name of the class owning the function
        class: String,
        /// The non-overridable function
        function: String,
    },

    /// A class definition declared the same member name twice.
    #[error("Class '{class}' already defines a function named '{function}'")]
    DuplicateFunction {
        /// Name of the class being defined
        class: String,
        /// The duplicated member name
        function: String,
    },

    /// A class with this name is already registered with the runtime.
    #[error("A class named '{0}' is already registered")]
    DuplicateClass(String),

    /// The interned-name table is at capacity.
    ///
    /// Name references must stay within 16 bits of index space so that call-site words can be
    /// sanity-checked before being dereferenced; the table refuses to grow past that bound.
    #[error("Name table is full ({0} entries)")]
    NameTableFull(usize),

    /// A host-supplied handler reported a failure during dispatch.
    ///
    /// The hook machinery itself never produces this variant; it only propagates it, after the
    /// intercepted target has been re-armed.
    #[error("{0}")]
    Script(String),
}
