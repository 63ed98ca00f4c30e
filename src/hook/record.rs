//! Override records.
//!
//! One [`OverrideRecord`] exists per installed override. It binds the intercepted target to the
//! substitute handler, carries the saved pre-hook dispatch state needed for restoration, and owns
//! the per-record reentrancy guard.

use std::sync::{Arc, Mutex, PoisonError};

use crate::vm::{DispatchSlot, FunctionRc, InstanceId, InstanceRc};

/// Reentrancy-guard state of one override record.
///
/// The guard is a same-thread recursion detector, not a lock: dispatch is single-threaded by
/// contract, and observing [`DispatchState::Dispatching`] on entry means the trampoline was
/// re-entered for this record before the outer call completed, which is unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// No dispatch in progress
    Idle,
    /// A dispatch is running on the instance with this id
    Dispatching(InstanceId),
}

/// The association between one intercepted target and its substitute handler.
///
/// Records are created by override installation and referenced (never owned) by the registry;
/// the installing holder keeps them alive.
pub struct OverrideRecord {
    target_object: Option<InstanceRc>,
    target_function: FunctionRc,
    override_object: InstanceRc,
    override_function: FunctionRc,
    original_slot: DispatchSlot,
    original_flags: u32,
    guard: Mutex<DispatchState>,
}

impl OverrideRecord {
    /// Captures the target's current dispatch state and builds the record.
    ///
    /// Must run before the target is patched: the saved slot has to be the original,
    /// un-intercepted one, or teardown would restore a redirect.
    pub(crate) fn new(
        target_object: Option<InstanceRc>,
        target_function: FunctionRc,
        override_object: InstanceRc,
        override_function: FunctionRc,
    ) -> Arc<Self> {
        let original_slot = target_function.dispatch_slot();
        let original_flags = target_function.flags_raw();
        debug_assert!(
            !original_slot.is_intercepted(),
            "captured dispatch state of '{}' is already intercepted",
            target_function.friendly_name()
        );

        Arc::new(OverrideRecord {
            target_object,
            target_function,
            override_object,
            override_function,
            original_slot,
            original_flags,
            guard: Mutex::new(DispatchState::Idle),
        })
    }

    /// The specific instance the override applies to, or `None` for a wildcard
    #[must_use]
    pub fn target_object(&self) -> Option<&InstanceRc> {
        self.target_object.as_ref()
    }

    /// The intercepted target
    #[must_use]
    pub fn target_function(&self) -> &FunctionRc {
        &self.target_function
    }

    /// The instance the substitute handler runs on
    #[must_use]
    pub fn override_object(&self) -> &InstanceRc {
        &self.override_object
    }

    /// The substitute handler's own dispatch target
    #[must_use]
    pub fn override_function(&self) -> &FunctionRc {
        &self.override_function
    }

    /// The target's saved pre-hook dispatch slot
    #[must_use]
    pub fn original_slot(&self) -> DispatchSlot {
        self.original_slot.clone()
    }

    /// The target's saved pre-hook flag word
    #[must_use]
    pub fn original_flags(&self) -> u32 {
        self.original_flags
    }

    /// Current guard state
    #[must_use]
    pub fn state(&self) -> DispatchState {
        *self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Targeting predicate: is a call on this instance in scope for the override.
    #[must_use]
    pub fn applies_to(&self, instance: &InstanceRc) -> bool {
        match &self.target_object {
            None => true,
            Some(target) => Arc::ptr_eq(target, instance),
        }
    }

    /// Marks a dispatch as in progress on `instance`.
    ///
    /// Re-entering while a dispatch is already running is a fatal invariant violation.
    pub(crate) fn begin_dispatch(&self, instance: &InstanceRc) {
        let mut state = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert_eq!(
            *state,
            DispatchState::Idle,
            "reentrant dispatch of '{}' on instance {}",
            self.target_function.friendly_name(),
            instance.id()
        );
        *state = DispatchState::Dispatching(instance.id());
    }

    /// Clears the guard after a dispatch completes.
    pub(crate) fn end_dispatch(&self) {
        *self.guard.lock().unwrap_or_else(PoisonError::into_inner) = DispatchState::Idle;
    }

    /// Writes the saved dispatch state back to the target: flag word first, then the slot.
    pub(crate) fn restore_target(&self) {
        self.target_function.set_flags_raw(self.original_flags);
        self.target_function.set_dispatch_slot(self.original_slot.clone());
    }
}

impl std::fmt::Debug for OverrideRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideRecord")
            .field("target", &self.target_function.friendly_name())
            .field(
                "target_object",
                &self.target_object.as_ref().map(|instance| instance.label()),
            )
            .field("override", &self.override_function.friendly_name())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Runtime;

    struct Fixture {
        _runtime: Runtime,
        rifle: InstanceRc,
        pistol: InstanceRc,
        listener: InstanceRc,
        fire: FunctionRc,
        my_fire: FunctionRc,
    }

    fn fixture() -> Fixture {
        let runtime = Runtime::new();
        let weapon = runtime
            .class("Weapon")
            .function("Fire", |_, _, _| Ok(()))
            .register()
            .unwrap();
        let hooks = runtime
            .class("Hooks")
            .function("MyFire", |_, _, _| Ok(()))
            .register()
            .unwrap();

        let rifle = runtime.spawn(&weapon, "rifle");
        let pistol = runtime.spawn(&weapon, "pistol");
        let listener = runtime.spawn(&hooks, "listener");
        let fire = rifle.find_function_checked("Fire").unwrap();
        let my_fire = listener.find_function_checked("MyFire").unwrap();

        Fixture {
            _runtime: runtime,
            rifle,
            pistol,
            listener,
            fire,
            my_fire,
        }
    }

    #[test]
    fn wildcard_applies_to_every_instance() {
        let fx = fixture();
        let record = OverrideRecord::new(
            None,
            Arc::clone(&fx.fire),
            Arc::clone(&fx.listener),
            Arc::clone(&fx.my_fire),
        );
        assert!(record.applies_to(&fx.rifle));
        assert!(record.applies_to(&fx.pistol));
    }

    #[test]
    fn targeted_record_applies_to_one_instance() {
        let fx = fixture();
        let record = OverrideRecord::new(
            Some(Arc::clone(&fx.rifle)),
            Arc::clone(&fx.fire),
            Arc::clone(&fx.listener),
            Arc::clone(&fx.my_fire),
        );
        assert!(record.applies_to(&fx.rifle));
        assert!(!record.applies_to(&fx.pistol));
    }

    #[test]
    fn guard_transitions() {
        let fx = fixture();
        let record = OverrideRecord::new(
            None,
            Arc::clone(&fx.fire),
            Arc::clone(&fx.listener),
            Arc::clone(&fx.my_fire),
        );

        assert_eq!(record.state(), DispatchState::Idle);
        record.begin_dispatch(&fx.rifle);
        assert_eq!(record.state(), DispatchState::Dispatching(fx.rifle.id()));
        record.end_dispatch();
        assert_eq!(record.state(), DispatchState::Idle);
    }

    #[test]
    #[should_panic(expected = "reentrant dispatch")]
    fn reentry_is_fatal() {
        let fx = fixture();
        let record = OverrideRecord::new(
            None,
            Arc::clone(&fx.fire),
            Arc::clone(&fx.listener),
            Arc::clone(&fx.my_fire),
        );
        record.begin_dispatch(&fx.rifle);
        record.begin_dispatch(&fx.rifle);
    }

    #[test]
    fn restore_writes_back_saved_state() {
        let fx = fixture();
        let saved_flags = fx.fire.flags_raw();
        let record = OverrideRecord::new(
            None,
            Arc::clone(&fx.fire),
            Arc::clone(&fx.listener),
            Arc::clone(&fx.my_fire),
        );

        fx.fire.insert_flags(crate::vm::FunctionFlags::NATIVE);
        record.restore_target();
        assert_eq!(fx.fire.flags_raw(), saved_flags);
        assert!(!fx.fire.dispatch_slot().is_intercepted());
    }
}
