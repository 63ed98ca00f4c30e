//! Spawned instances and the dispatch entry points.
//!
//! An [`Instance`] is what dispatch runs *on*: it resolves member names through its class and
//! exposes the two calling-convention flavors of the host VM. Both flavors route through the
//! target's dispatch slot, so a hooked function is intercepted no matter how it is invoked.

use std::fmt;
use std::sync::Arc;

use crate::vm::{ClassRc, DispatchSlot, Frame, FunctionRc, Name, Value};
use crate::Result;

/// Process-unique identity of a spawned instance.
///
/// Targeting decisions and the reentrancy guard compare instances by this id rather than by
/// reference, keeping records free of borrowed instance state.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn new(raw: u64) -> Self {
        InstanceId(raw)
    }

    /// The raw id value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A spawned instance of a [`ScriptClass`](crate::vm::ScriptClass).
pub struct Instance {
    id: InstanceId,
    label: String,
    class: ClassRc,
}

/// Reference-counted handle to an [`Instance`]
pub type InstanceRc = Arc<Instance>;

impl Instance {
    pub(crate) fn new(id: InstanceId, label: String, class: ClassRc) -> InstanceRc {
        Arc::new(Instance { id, label, class })
    }

    /// The instance's process-unique id
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Diagnostic label given at spawn time
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The owning class
    #[must_use]
    pub fn class(&self) -> &ClassRc {
        &self.class
    }

    /// Looks up a member of the instance's class by interned name.
    #[must_use]
    pub fn find_function(&self, name: Name) -> Option<FunctionRc> {
        self.class.find_function(name)
    }

    /// Looks up a member by its written name, failing with a diagnostic if absent.
    ///
    /// # Errors
    /// Returns [`Error::FunctionNotFound`](crate::Error::FunctionNotFound) when the class has no
    /// member with that name.
    pub fn find_function_checked(&self, function: &str) -> Result<FunctionRc> {
        self.class.find_function_checked(function)
    }

    /// Direct-flavor invocation: frame and result slot are forwarded verbatim.
    ///
    /// Dispatches through the target's slot, so interception is transparent to the caller.
    ///
    /// # Errors
    /// Propagates whatever the invoked handler returns.
    pub fn call_function(
        self: &Arc<Self>,
        frame: &mut Frame,
        result: &mut Value,
        function: &FunctionRc,
    ) -> Result<()> {
        match function.dispatch_slot() {
            DispatchSlot::Handler(handler) => handler(self, frame, result),
            DispatchSlot::Intercepted(trampoline) => trampoline.invoke(self, frame, result),
        }
    }

    /// Event-flavor invocation: fixed signature, return value ignored at this layer.
    ///
    /// Builds a fresh event frame whose node is the invoked target and dispatches through the
    /// target's slot.
    ///
    /// # Errors
    /// Propagates whatever the invoked handler returns.
    pub fn process_event(self: &Arc<Self>, function: &FunctionRc, locals: &[Value]) -> Result<()> {
        let mut frame = Frame::event(Arc::clone(function), locals.to_vec());
        let mut result = Value::None;
        self.call_function(&mut frame, &mut result, function)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Instance {}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("class", &self.class.name())
            .finish()
    }
}
