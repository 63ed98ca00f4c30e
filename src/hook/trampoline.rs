//! The interception trampoline.
//!
//! A single shared [`Trampoline`] serves every hooked target: it is the value installed into
//! each intercepted dispatch slot, and it owns the [`OverrideRegistry`]. When the host VM
//! dispatches through an intercepted slot, the trampoline must first work out *which* target was
//! invoked; the calling convention does not say, because the slot that would have identified the
//! call is exactly the one that was overwritten.
//!
//! # Call-target recovery
//!
//! The word immediately preceding the frame's cursor holds the invoked target in one of two
//! encodings, with no discriminant: a direct target token (runtime-dispatched invocations) or an
//! interned-name reference (late-bound invocations). Recovery is speculative:
//!
//! 1. Read the word and try it as a token; membership in the override registry confirms it.
//! 2. Otherwise reinterpret the same word as a name reference, validate it with two independent
//!    sanity checks (range plausibility, table probe) before dereferencing, and resolve it
//!    through the calling instance's class.
//! 3. If neither path resolves, the invocation came straight from the host runtime for a
//!    lifecycle event and the frame's own node is the target.
//!
//! Misidentifying the encoding is expected for some call sites; the checks exist so a
//! misidentified word is discarded rather than dereferenced.

use std::sync::Arc;

use crate::hook::OverrideRegistry;
use crate::vm::{
    DispatchSlot, Frame, FunctionFlags, FunctionRc, FunctionToken, InstanceRc, Name, NameTable,
    Value,
};
use crate::Result;

/// Call-target recovery policy.
///
/// The defaults apply both sanity checks to speculatively decoded name references. A host that
/// guarantees well-formed call-site encodings can drop them with [`ResolveConfig::trusting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveConfig {
    /// Require the high 16 bits of a speculative name word to be clear before treating it as a
    /// name reference
    pub check_name_plausibility: bool,
    /// Require the name table to hold an entry for the reference before dereferencing it
    pub probe_name_table: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        ResolveConfig {
            check_name_plausibility: true,
            probe_name_table: true,
        }
    }
}

impl ResolveConfig {
    /// Disables both sanity checks.
    ///
    /// Only safe when every call site is known to encode a valid token or interned name.
    #[must_use]
    pub fn trusting() -> Self {
        ResolveConfig {
            check_name_plausibility: false,
            probe_name_table: false,
        }
    }
}

/// The shared redirect entry point installed into every intercepted dispatch slot.
pub struct Trampoline {
    registry: OverrideRegistry,
    names: Arc<NameTable>,
    config: ResolveConfig,
}

impl Trampoline {
    /// Creates a trampoline validating name references against `names` with the default policy.
    #[must_use]
    pub fn new(names: Arc<NameTable>) -> Arc<Self> {
        Self::with_config(names, ResolveConfig::default())
    }

    /// Creates a trampoline with an explicit recovery policy.
    #[must_use]
    pub fn with_config(names: Arc<NameTable>, config: ResolveConfig) -> Arc<Self> {
        Arc::new(Trampoline {
            registry: OverrideRegistry::new(),
            names,
            config,
        })
    }

    /// The registry of active overrides served by this trampoline.
    #[must_use]
    pub fn registry(&self) -> &OverrideRegistry {
        &self.registry
    }

    /// The active recovery policy
    #[must_use]
    pub fn config(&self) -> ResolveConfig {
        self.config
    }

    /// Recovers the identity of the invoked target from an execution frame.
    ///
    /// This seam isolates the decoding heuristic; a host that passes the invoked target
    /// explicitly could replace it wholesale. The frame-node fallback is only valid for
    /// host-originated lifecycle events (frames without code); a script-call frame carrying a
    /// garbage word would fall through to it and mis-resolve, which the dispatch path then
    /// reports as an invariant violation.
    #[must_use]
    pub fn resolve_call_target(&self, frame: &Frame, calling: &InstanceRc) -> FunctionRc {
        if let Some(raw) = frame.read_call_word() {
            let token = FunctionToken::new(raw);
            if let Some(record) = self.registry.lookup(token) {
                tracing::trace!(token = %token, "call site decoded as direct target token");
                return Arc::clone(record.target_function());
            }

            // Not a registered token; the same word may be an interned-name reference.
            let name = Name::from_raw(raw);
            if self.name_reference_valid(name) {
                if let Some(function) = calling.find_function(name) {
                    tracing::trace!(name = %name, function = function.friendly_name(), "call site decoded as name reference");
                    return function;
                }
            }
        }

        // No encoded reference resolved: the host runtime invoked this target directly for a
        // lifecycle event, and the frame records it as its own node.
        tracing::trace!(node = frame.node().friendly_name(), "falling back to frame node");
        Arc::clone(frame.node())
    }

    fn name_reference_valid(&self, name: Name) -> bool {
        if self.config.check_name_plausibility && !name.is_plausible() {
            return false;
        }
        if self.config.probe_name_table && !self.names.probe(name) {
            return false;
        }
        true
    }

    /// Dispatches one intercepted invocation.
    ///
    /// Recovers the invoked target, restores its original dispatch state for the duration of the
    /// call (so reentrant calls from inside the handlers run the original behavior, not the
    /// trampoline), routes to the override or the original depending on the record's targeting,
    /// and re-arms the interception before returning. Handler errors propagate only after the
    /// target is re-armed.
    ///
    /// # Errors
    /// Propagates whatever the invoked handler returns.
    ///
    /// # Panics
    /// Re-entering for a record whose dispatch is still in progress, or being invoked for a
    /// target with no registered override, is a fatal invariant violation.
    pub fn invoke(
        self: &Arc<Self>,
        calling: &InstanceRc,
        frame: &mut Frame,
        result: &mut Value,
    ) -> Result<()> {
        let function = self.resolve_call_target(frame, calling);
        let is_event = function.token() == frame.node().token();

        let Some(record) = self.registry.lookup(function.token()) else {
            unreachable!(
                "trampoline invoked for '{}' which has no registered override",
                function.friendly_name()
            );
        };

        // Restore the original dispatch state for the duration of the call. Any call to this
        // target from inside the handlers is now a plain, non-intercepted call.
        function.set_flags_raw(record.original_flags());
        function.set_dispatch_slot(record.original_slot());

        record.begin_dispatch(calling);

        let outcome = if record.applies_to(calling) {
            tracing::trace!(
                function = function.friendly_name(),
                instance = calling.label(),
                event = is_event,
                "redirecting to override"
            );
            if is_event {
                record
                    .override_object()
                    .process_event(record.override_function(), frame.locals())
            } else {
                record
                    .override_object()
                    .call_function(frame, result, record.override_function())
            }
        } else {
            // Out of scope: run the original behavior on the calling instance, unchanged.
            tracing::trace!(
                function = function.friendly_name(),
                instance = calling.label(),
                "out of scope, running original"
            );
            if is_event {
                match record.original_slot() {
                    DispatchSlot::Handler(handler) => handler(calling, frame, result),
                    DispatchSlot::Intercepted(_) => {
                        unreachable!("saved dispatch state is never an interception")
                    }
                }
            } else {
                calling.call_function(frame, result, &function)
            }
        };

        record.end_dispatch();

        // Re-arm for future invocations. A handler may have torn the override down or replaced
        // it mid-call; only re-arm while the registry still maps this target.
        if self.registry.contains(function.token()) {
            function.insert_flags(FunctionFlags::NATIVE);
            function.set_dispatch_slot(DispatchSlot::Intercepted(Arc::clone(self)));
        }

        outcome
    }
}

impl std::fmt::Debug for Trampoline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trampoline")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
