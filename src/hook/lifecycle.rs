//! Override installation and teardown.
//!
//! A [`FunctionOverride`] is the holder that owns one override's lifetime: installing patches
//! the target's dispatch slot and registers the record, uninstalling restores the saved state,
//! but only while the registry still points at this holder's record, so a superseded holder can
//! never clobber a newer registration. Dropping the holder uninstalls automatically.

use std::sync::{Arc, Mutex, PoisonError};

use crate::hook::{OverrideRecord, Trampoline};
use crate::vm::{ClassRc, DispatchSlot, FunctionFlags, InstanceRc};
use crate::{Error, Result};

/// What an override binds to.
#[derive(Clone)]
pub enum HookTarget {
    /// Intercept calls on this specific instance only
    Instance(InstanceRc),
    /// Wildcard: intercept calls on every instance of the class
    Class(ClassRc),
}

impl std::fmt::Debug for HookTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookTarget::Instance(instance) => {
                write!(f, "HookTarget::Instance({})", instance.label())
            }
            HookTarget::Class(class) => write!(f, "HookTarget::Class({})", class.name()),
        }
    }
}

/// Holder owning the lifetime of one function override.
pub struct FunctionOverride {
    trampoline: Arc<Trampoline>,
    record: Mutex<Option<Arc<OverrideRecord>>>,
}

impl FunctionOverride {
    /// Creates an empty holder bound to a trampoline.
    #[must_use]
    pub fn new(trampoline: Arc<Trampoline>) -> Self {
        FunctionOverride {
            trampoline,
            record: Mutex::new(None),
        }
    }

    /// Installs an override: calls to `target_function` on the hook target are redirected to
    /// `override_function` on `override_object`.
    ///
    /// A prior registration by this holder is uninstalled first, so repeated installation is
    /// equivalent to uninstall-then-install. If a *different* holder already hooks the same
    /// target, its saved state is restored before the new state is captured; the new record
    /// always saves the true pre-hook dispatch state, never an intermediate redirect.
    ///
    /// Everything is validated before any state is touched: on error the target, the registry,
    /// and this holder are unchanged.
    ///
    /// # Errors
    /// Returns [`Error::FunctionNotFound`] when either function name fails to resolve, and
    /// [`Error::NativeFinal`] when the target function's dispatch slot cannot be replaced.
    pub fn install(
        &self,
        target: HookTarget,
        target_function: &str,
        override_object: &InstanceRc,
        override_function: &str,
    ) -> Result<()> {
        self.uninstall();

        let (target_object, target_class) = match target {
            HookTarget::Instance(instance) => {
                let class = Arc::clone(instance.class());
                (Some(instance), class)
            }
            HookTarget::Class(class) => (None, class),
        };

        let target_fn = target_class.find_function_checked(target_function)?;
        let override_fn = override_object.find_function_checked(override_function)?;

        if target_fn.is_final() {
            return Err(Error::NativeFinal {
                class: target_class.name().to_string(),
                function: target_fn.friendly_name().to_string(),
            });
        }

        let registry = self.trampoline.registry();

        // Another holder may already have this target hooked. Put the true original state back
        // before capturing it, so the new record never saves an intermediate redirect.
        if let Some(previous) = registry.lookup(target_fn.token()) {
            if registry.remove(target_fn.token(), &previous) {
                previous.restore_target();
                tracing::debug!(
                    function = target_fn.friendly_name(),
                    "tore down superseded override"
                );
            }
        }

        let wildcard = target_object.is_none();
        let record = OverrideRecord::new(
            target_object,
            Arc::clone(&target_fn),
            Arc::clone(override_object),
            override_fn,
        );

        target_fn.insert_flags(FunctionFlags::NATIVE);
        target_fn.set_dispatch_slot(DispatchSlot::Intercepted(Arc::clone(&self.trampoline)));
        registry.install(Arc::clone(&record));

        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record);

        tracing::debug!(
            class = target_class.name(),
            function = target_fn.friendly_name(),
            wildcard,
            "installed function override"
        );
        Ok(())
    }

    /// Uninstalls this holder's override, if any.
    ///
    /// Restores the target's saved dispatch state only when the registry's current record is
    /// identity-equal to this holder's; otherwise a newer registration owns the target and
    /// global state is left untouched. The held record is cleared either way, so repeated calls
    /// (and calls on a never-installed holder) are no-ops.
    pub fn uninstall(&self) {
        let record = self
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(record) = record {
            let token = record.target_function().token();
            if self.trampoline.registry().remove(token, &record) {
                record.restore_target();
                tracing::debug!(
                    function = record.target_function().friendly_name(),
                    "uninstalled function override"
                );
            }
        }
    }

    /// True while this holder has a record installed.
    ///
    /// Note that a different holder may have superseded the registration; this only reports
    /// whether *this* holder believes it is installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for FunctionOverride {
    fn drop(&mut self) {
        self.uninstall();
    }
}

impl std::fmt::Debug for FunctionOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionOverride")
            .field("installed", &self.is_installed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Runtime;

    struct Fixture {
        _runtime: Runtime,
        trampoline: Arc<Trampoline>,
        weapon: ClassRc,
        rifle: InstanceRc,
        listener: InstanceRc,
    }

    fn fixture() -> Fixture {
        let runtime = Runtime::new();
        let weapon = runtime
            .class("Weapon")
            .function("Fire", |_, _, _| Ok(()))
            .native_final("GetAmmo", |_, _, _| Ok(()))
            .register()
            .unwrap();
        let hooks = runtime
            .class("Hooks")
            .function("MyFire", |_, _, _| Ok(()))
            .register()
            .unwrap();
        let trampoline = Trampoline::new(runtime.names().clone());
        let rifle = runtime.spawn(&weapon, "rifle");
        let listener = runtime.spawn(&hooks, "listener");

        Fixture {
            _runtime: runtime,
            trampoline,
            weapon,
            rifle,
            listener,
        }
    }

    #[test]
    fn install_patches_and_registers() {
        let fx = fixture();
        let fire = fx.rifle.find_function_checked("Fire").unwrap();
        let saved_flags = fire.flags_raw();

        let hook = FunctionOverride::new(Arc::clone(&fx.trampoline));
        hook.install(
            HookTarget::Class(Arc::clone(&fx.weapon)),
            "Fire",
            &fx.listener,
            "MyFire",
        )
        .unwrap();

        assert!(hook.is_installed());
        assert!(fire.dispatch_slot().is_intercepted());
        assert!(fire.flags().contains(FunctionFlags::NATIVE));
        assert!(fx.trampoline.registry().contains(fire.token()));

        hook.uninstall();
        assert!(!hook.is_installed());
        assert!(!fire.dispatch_slot().is_intercepted());
        assert_eq!(fire.flags_raw(), saved_flags);
        assert!(fx.trampoline.registry().is_empty());
    }

    #[test]
    fn uninstall_is_idempotent() {
        let fx = fixture();
        let hook = FunctionOverride::new(Arc::clone(&fx.trampoline));
        // Never installed: nothing to do.
        hook.uninstall();
        hook.uninstall();
        assert!(!hook.is_installed());
    }

    #[test]
    fn unresolvable_names_leave_state_untouched() {
        let fx = fixture();
        let fire = fx.rifle.find_function_checked("Fire").unwrap();
        let hook = FunctionOverride::new(Arc::clone(&fx.trampoline));

        let err = hook
            .install(
                HookTarget::Class(Arc::clone(&fx.weapon)),
                "Jump",
                &fx.listener,
                "MyFire",
            )
            .unwrap_err();
        assert!(matches!(err, Error::FunctionNotFound { .. }));

        let err = hook
            .install(
                HookTarget::Class(Arc::clone(&fx.weapon)),
                "Fire",
                &fx.listener,
                "MyJump",
            )
            .unwrap_err();
        assert!(matches!(err, Error::FunctionNotFound { .. }));

        assert!(!hook.is_installed());
        assert!(!fire.dispatch_slot().is_intercepted());
        assert!(fx.trampoline.registry().is_empty());
    }

    #[test]
    fn final_targets_are_rejected_without_mutation() {
        let fx = fixture();
        let ammo = fx.rifle.find_function_checked("GetAmmo").unwrap();
        let saved_flags = ammo.flags_raw();
        let hook = FunctionOverride::new(Arc::clone(&fx.trampoline));

        let err = hook
            .install(
                HookTarget::Instance(Arc::clone(&fx.rifle)),
                "GetAmmo",
                &fx.listener,
                "MyFire",
            )
            .unwrap_err();

        assert!(matches!(err, Error::NativeFinal { .. }));
        assert_eq!(ammo.flags_raw(), saved_flags);
        assert!(!ammo.dispatch_slot().is_intercepted());
        assert!(fx.trampoline.registry().is_empty());
    }

    #[test]
    fn drop_uninstalls() {
        let fx = fixture();
        let fire = fx.rifle.find_function_checked("Fire").unwrap();

        {
            let hook = FunctionOverride::new(Arc::clone(&fx.trampoline));
            hook.install(
                HookTarget::Class(Arc::clone(&fx.weapon)),
                "Fire",
                &fx.listener,
                "MyFire",
            )
            .unwrap();
            assert!(fire.dispatch_slot().is_intercepted());
        }

        assert!(!fire.dispatch_slot().is_intercepted());
        assert!(fx.trampoline.registry().is_empty());
    }

    #[test]
    fn superseded_holder_does_not_clobber_newer_registration() {
        let fx = fixture();
        let fire = fx.rifle.find_function_checked("Fire").unwrap();

        let first = FunctionOverride::new(Arc::clone(&fx.trampoline));
        first
            .install(
                HookTarget::Class(Arc::clone(&fx.weapon)),
                "Fire",
                &fx.listener,
                "MyFire",
            )
            .unwrap();

        let second = FunctionOverride::new(Arc::clone(&fx.trampoline));
        second
            .install(
                HookTarget::Class(Arc::clone(&fx.weapon)),
                "Fire",
                &fx.listener,
                "MyFire",
            )
            .unwrap();

        // The first holder's record was torn down during the second install; its uninstall must
        // leave the second registration armed.
        first.uninstall();
        assert!(fire.dispatch_slot().is_intercepted());
        assert!(fx.trampoline.registry().contains(fire.token()));

        second.uninstall();
        assert!(!fire.dispatch_slot().is_intercepted());
        assert!(fx.trampoline.registry().is_empty());
    }
}
