//! The host VM's object model, at the interface level the hook machinery needs.
//!
//! This module is deliberately not a scripting engine. It carries exactly the contract a dispatch
//! target, a calling instance, and an execution frame expose to the interception machinery:
//! by-name member lookup, a patchable dispatch slot with a whole-word flag companion, the two
//! calling-convention flavors, and a code cursor positioned just past an ambiguously encoded
//! call-site reference.
//!
//! # Key Components
//!
//! - [`Runtime`] - owns names, classes, and identity allocation
//! - [`ScriptClass`] / [`ClassBuilder`] - owning types and their member tables
//! - [`ScriptFunction`] / [`DispatchSlot`] - dispatch targets and the tagged slot they dispatch
//!   through
//! - [`Instance`] - calling instances with the `call_function` / `process_event` entry points
//! - [`Frame`] - execution frames and the speculative call-word read
//! - [`NameTable`] / [`Name`] - interned names and the call-site validation primitives

/// Owning types and the class builder
pub mod class;
/// Function flag bits
pub mod flags;
/// Execution frames
pub mod frame;
/// Dispatch targets and dispatch slots
pub mod function;
/// Spawned instances and dispatch entry points
pub mod instance;
/// Interned names
pub mod name;
/// The owning runtime context
pub mod runtime;
/// Dispatch-target identity tokens
pub mod token;
/// Script values
pub mod value;

pub use class::{ClassBuilder, ClassRc, ScriptClass};
pub use flags::FunctionFlags;
pub use frame::Frame;
pub use function::{DispatchSlot, FunctionRc, NativeHandler, ScriptFunction};
pub use instance::{Instance, InstanceId, InstanceRc};
pub use name::{Name, NameTable, MAX_NAMES};
pub use runtime::Runtime;
pub use token::{FunctionToken, FUNCTION_TABLE};
pub use value::Value;
