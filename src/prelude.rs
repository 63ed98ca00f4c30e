//! # overdub Prelude
//!
//! Convenient re-exports of the most commonly used types, allowing for glob imports when wiring
//! a host runtime to the override machinery.
//!
//! # Example
//!
//! ```rust,no_run
//! use overdub::prelude::*;
//!
//! let runtime = Runtime::new();
//! let trampoline = Trampoline::new(runtime.names().clone());
//! let hook = FunctionOverride::new(trampoline);
//! ```

// Core types and error handling

/// The main error type for all overdub operations
pub use crate::Error;

/// The result type used throughout overdub
pub use crate::Result;

// Hook machinery

/// Holder owning one override's lifecycle
pub use crate::hook::FunctionOverride;

/// Instance-or-class binding of an override
pub use crate::hook::HookTarget;

/// The shared interception trampoline
pub use crate::hook::Trampoline;

/// Call-target recovery policy
pub use crate::hook::ResolveConfig;

/// Registry of active overrides
pub use crate::hook::OverrideRegistry;

// Host VM object model

/// Central runtime context
pub use crate::vm::Runtime;

/// Execution frames
pub use crate::vm::Frame;

/// Function flag bits
pub use crate::vm::FunctionFlags;

/// Dispatch-target identity
pub use crate::vm::FunctionToken;

/// Script values
pub use crate::vm::Value;

/// Handles to classes, functions, and instances
pub use crate::vm::{ClassRc, FunctionRc, InstanceRc};
