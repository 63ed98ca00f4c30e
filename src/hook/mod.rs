//! The function-override machinery.
//!
//! Intercepts calls to a named dispatch target and redirects them to a substitute handler, with
//! transparent fallback to the original behavior for out-of-scope instances. Three cooperating
//! pieces:
//!
//! - [`OverrideRegistry`] - the mapping from target identity to active [`OverrideRecord`]
//! - [`Trampoline`] - the single shared redirect entry point installed into every hooked
//!   dispatch slot; recovers the ambiguous call-site identity and routes the call
//! - [`FunctionOverride`] - the holder owning one override's install/uninstall lifecycle
//!
//! # Example
//!
//! ```rust
//! use overdub::hook::{FunctionOverride, HookTarget, Trampoline};
//! use overdub::vm::Runtime;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let runtime = Runtime::new();
//! let fired = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&fired);
//! let weapon = runtime
//!     .class("Weapon")
//!     .function("Fire", |_, _, _| Ok(()))
//!     .register()?;
//! let hooks = runtime
//!     .class("Hooks")
//!     .function("MyFire", move |_, _, _| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     })
//!     .register()?;
//!
//! let rifle = runtime.spawn(&weapon, "rifle");
//! let listener = runtime.spawn(&hooks, "listener");
//!
//! let trampoline = Trampoline::new(runtime.names().clone());
//! let hook = FunctionOverride::new(Arc::clone(&trampoline));
//! hook.install(HookTarget::Class(weapon), "Fire", &listener, "MyFire")?;
//!
//! let fire = rifle.find_function_checked("Fire")?;
//! rifle.process_event(&fire, &[])?;
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! # Ok::<(), overdub::Error>(())
//! ```

/// Override holders and their install/uninstall lifecycle
pub mod lifecycle;
/// Override records and the reentrancy guard
pub mod record;
/// The override registry
pub mod registry;
/// The shared interception trampoline
pub mod trampoline;

pub use lifecycle::{FunctionOverride, HookTarget};
pub use record::{DispatchState, OverrideRecord};
pub use registry::OverrideRegistry;
pub use trampoline::{ResolveConfig, Trampoline};
