//! Dispatch targets and their dispatch slots.
//!
//! A [`ScriptFunction`] is a named, invocable member of a class, addressed through a slot that
//! can be redirected. The slot is a tagged variant rather than a raw pointer: either the
//! function's original behavior (an opaque host-supplied handler) or a redirect through the
//! shared interception [`Trampoline`]. All dispatch, hooked or not, flows through this single
//! indirection.
//!
//! The flag word and the slot are independently replaceable whole values, which is what lets an
//! override save both at installation and restore them byte-identically on teardown.

use std::fmt;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, PoisonError, RwLock,
};

use crate::hook::Trampoline;
use crate::vm::{Frame, FunctionFlags, FunctionToken, InstanceRc, Name, Value};
use crate::Result;

/// A host-supplied callable implementing a target's original behavior.
///
/// For interpreted functions this is the host's interpreter thunk; for built-ins it is the
/// native body. The hook machinery treats it as opaque: it is saved, restored, and invoked, never
/// inspected.
pub type NativeHandler = Arc<dyn Fn(&InstanceRc, &mut Frame, &mut Value) -> Result<()> + Send + Sync>;

/// The dispatch-slot value of a [`ScriptFunction`].
///
/// Replacing a raw function pointer with a tagged variant keeps the redirect observable and the
/// original recoverable without aliasing tricks; the host VM dispatches every call through this
/// one indirection.
#[derive(Clone)]
pub enum DispatchSlot {
    /// The function's original behavior
    Handler(NativeHandler),
    /// Redirect through the shared interception trampoline
    Intercepted(Arc<Trampoline>),
}

impl DispatchSlot {
    /// True when the slot currently redirects through a trampoline
    #[must_use]
    pub fn is_intercepted(&self) -> bool {
        matches!(self, DispatchSlot::Intercepted(_))
    }
}

impl fmt::Debug for DispatchSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchSlot::Handler(_) => f.write_str("Handler(..)"),
            DispatchSlot::Intercepted(_) => f.write_str("Intercepted(..)"),
        }
    }
}

/// A named, invocable member of a class.
///
/// Identity is the [`FunctionToken`]; the interned [`Name`] is how call sites and lookups refer
/// to it. Flag word and dispatch slot are interiorly mutable so that hooks can patch and restore
/// them through shared references, the same way every other part of the runtime holds functions.
pub struct ScriptFunction {
    token: FunctionToken,
    name: Name,
    friendly_name: String,
    flags: AtomicU32,
    slot: RwLock<DispatchSlot>,
}

/// Reference-counted handle to a [`ScriptFunction`]
pub type FunctionRc = Arc<ScriptFunction>;

impl ScriptFunction {
    pub(crate) fn new(
        token: FunctionToken,
        name: Name,
        friendly_name: String,
        flags: FunctionFlags,
        handler: NativeHandler,
    ) -> FunctionRc {
        Arc::new(ScriptFunction {
            token,
            name,
            friendly_name,
            flags: AtomicU32::new(flags.bits()),
            slot: RwLock::new(DispatchSlot::Handler(handler)),
        })
    }

    /// The function's stable identity
    #[must_use]
    pub fn token(&self) -> FunctionToken {
        self.token
    }

    /// The function's interned name
    #[must_use]
    pub fn name(&self) -> Name {
        self.name
    }

    /// The function's name as written in its class definition, for diagnostics
    #[must_use]
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// The known flag bits of the current flag word
    #[must_use]
    pub fn flags(&self) -> FunctionFlags {
        FunctionFlags::from_raw(self.flags_raw())
    }

    /// The raw flag word, including any bits this crate does not model
    #[must_use]
    pub fn flags_raw(&self) -> u32 {
        self.flags.load(Ordering::Acquire)
    }

    pub(crate) fn set_flags_raw(&self, raw: u32) {
        self.flags.store(raw, Ordering::Release);
    }

    pub(crate) fn insert_flags(&self, add: FunctionFlags) {
        self.flags.fetch_or(add.bits(), Ordering::AcqRel);
    }

    /// True when declared with the event calling convention
    #[must_use]
    pub fn is_event(&self) -> bool {
        self.flags().contains(FunctionFlags::EVENT)
    }

    /// True when the function is natively dispatched and non-overridable
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.flags().contains(FunctionFlags::FINAL)
    }

    /// A snapshot of the current dispatch-slot value
    #[must_use]
    pub fn dispatch_slot(&self) -> DispatchSlot {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_dispatch_slot(&self, slot: DispatchSlot) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = slot;
    }
}

impl fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptFunction")
            .field("token", &self.token)
            .field("name", &self.friendly_name)
            .field("flags", &self.flags())
            .field("slot", &*self.slot.read().unwrap_or_else(PoisonError::into_inner))
            .finish()
    }
}
