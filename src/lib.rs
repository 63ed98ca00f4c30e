// Copyright 2026 The overdub developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! # overdub
//!
//! Transparent function overrides for scripting-VM dispatch tables.
//!
//! `overdub` solves one interception problem: redirect calls to a named dynamic dispatch target
//! to a substitute handler, even though the host VM's calling convention never says which target
//! is being invoked, and fall back to the original behavior, untouched, for calls that are out
//! of the override's scope.
//!
//! ## How it works
//!
//! Every dispatch target carries a slot the host VM calls through. Installing an override saves
//! the slot and the target's flag word, swaps in a single shared [`hook::Trampoline`], and
//! registers the override in the trampoline's registry. On each invocation the trampoline
//! recovers the true call identity from the execution frame (the call site encodes it as either
//! a direct target token or an interned-name reference, with no discriminant), temporarily
//! restores the original dispatch state, routes to the override or the original depending on the
//! targeting predicate, and re-arms itself. Uninstalling (explicitly or by dropping the holder)
//! restores the saved state byte for byte.
//!
//! ## Quick Start
//!
//! ```rust
//! use overdub::prelude::*;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let runtime = Runtime::new();
//!
//! let weapon = runtime
//!     .class("Weapon")
//!     .function("Fire", |_, _, _| Ok(()))
//!     .register()?;
//!
//! let overridden = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&overridden);
//! let hooks = runtime
//!     .class("SniperHooks")
//!     .function("MyFire", move |_, _, _| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     })
//!     .register()?;
//!
//! let rifle = runtime.spawn(&weapon, "rifle");
//! let listener = runtime.spawn(&hooks, "listener");
//!
//! // Hook "Fire" for every Weapon instance.
//! let trampoline = Trampoline::new(runtime.names().clone());
//! let hook = FunctionOverride::new(Arc::clone(&trampoline));
//! hook.install(HookTarget::Class(weapon), "Fire", &listener, "MyFire")?;
//!
//! let fire = rifle.find_function_checked("Fire")?;
//! rifle.process_event(&fire, &[])?;
//! assert_eq!(overridden.load(Ordering::SeqCst), 1);
//!
//! // Dropping the holder restores the original dispatch state.
//! drop(hook);
//! assert!(!fire.dispatch_slot().is_intercepted());
//! # Ok::<(), overdub::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`vm`] - the host VM's object model at the interface level the hook needs: classes,
//!   instances, functions with patchable dispatch slots, execution frames, interned names
//! - [`hook`] - the override machinery: registry, trampoline, and lifecycle holders
//! - [`Error`] and [`Result`] - error handling for configuration failures
//!
//! ## Error Handling
//!
//! Configuration failures (unresolvable names, non-overridable targets) surface as
//! [`Result`] errors at the point of detection, before any state is mutated. Invariant
//! violations (a trampoline invocation for an unregistered target, or reentrant dispatch on the
//! same record before the outer call completes) indicate corrupted dispatch state and surface
//! as assertions instead; there is no recovery path mid-dispatch.
//!
//! ## Concurrency
//!
//! Dispatch follows the host VM's single-threaded, cooperative execution model. The per-record
//! guard detects same-thread recursion; it is not a cross-thread lock. The registry and name
//! table are internally synchronized, so holding them from multiple threads is safe even though
//! dispatching from multiple threads is out of contract.

pub(crate) mod error;

/// The function-override machinery: registry, trampoline, lifecycle
pub mod hook;
/// The host VM object model, at the interface level the hook machinery needs
pub mod vm;

/// Convenient re-exports of the most commonly used types.
pub mod prelude;

pub use error::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
