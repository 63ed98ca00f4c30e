//! Owning types and their member tables.
//!
//! A [`ScriptClass`] owns the by-name member table the trampoline resolves late-bound calls
//! against. Classes are defined through the [`ClassBuilder`] returned by
//! [`Runtime::class`](crate::vm::Runtime::class), which interns member names, allocates tokens,
//! and rejects duplicate definitions before anything becomes visible to lookups.

use std::sync::Arc;

use dashmap::DashMap;

use crate::vm::{
    FunctionFlags, FunctionRc, Frame, InstanceRc, Name, NameTable, NativeHandler, Runtime,
    ScriptFunction, Value,
};
use crate::{Error, Result};

/// A script class: a named type owning a set of invocable members.
pub struct ScriptClass {
    name: String,
    names: Arc<NameTable>,
    functions: DashMap<Name, FunctionRc>,
}

/// Reference-counted handle to a [`ScriptClass`]
pub type ClassRc = Arc<ScriptClass>;

impl ScriptClass {
    fn new(name: String, names: Arc<NameTable>) -> Self {
        ScriptClass {
            name,
            names,
            functions: DashMap::new(),
        }
    }

    /// The class name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a member by interned name.
    #[must_use]
    pub fn find_function(&self, name: Name) -> Option<FunctionRc> {
        self.functions.get(&name).map(|entry| Arc::clone(entry.value()))
    }

    /// Looks up a member by its written name, failing with a diagnostic if absent.
    ///
    /// # Errors
    /// Returns [`Error::FunctionNotFound`] when no member with that name exists.
    pub fn find_function_checked(&self, function: &str) -> Result<FunctionRc> {
        self.names
            .find(function)
            .and_then(|name| self.find_function(name))
            .ok_or_else(|| Error::FunctionNotFound {
                class: self.name.clone(),
                function: function.to_string(),
            })
    }

    /// Number of members the class defines
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

impl std::fmt::Debug for ScriptClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptClass")
            .field("name", &self.name)
            .field("functions", &self.functions.len())
            .finish()
    }
}

struct PendingFunction {
    name: String,
    flags: FunctionFlags,
    handler: NativeHandler,
}

/// Builder for defining a [`ScriptClass`] on a runtime.
///
/// Nothing is interned or registered until [`ClassBuilder::register`] runs, so an abandoned
/// builder leaves the runtime untouched.
pub struct ClassBuilder<'a> {
    runtime: &'a Runtime,
    name: String,
    members: Vec<PendingFunction>,
}

impl<'a> ClassBuilder<'a> {
    pub(crate) fn new(runtime: &'a Runtime, name: &str) -> Self {
        ClassBuilder {
            runtime,
            name: name.to_string(),
            members: Vec::new(),
        }
    }

    /// Adds a function member with the direct calling convention.
    #[must_use]
    pub fn function(
        self,
        name: &str,
        handler: impl Fn(&InstanceRc, &mut Frame, &mut Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.member(name, FunctionFlags::empty(), Arc::new(handler))
    }

    /// Adds an event member (fixed signature, result ignored by callers).
    #[must_use]
    pub fn event(
        self,
        name: &str,
        handler: impl Fn(&InstanceRc, &mut Frame, &mut Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.member(name, FunctionFlags::EVENT, Arc::new(handler))
    }

    /// Adds a natively dispatched, non-overridable member.
    ///
    /// Override installation against such a member fails with [`Error::NativeFinal`].
    #[must_use]
    pub fn native_final(
        self,
        name: &str,
        handler: impl Fn(&InstanceRc, &mut Frame, &mut Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.member(
            name,
            FunctionFlags::NATIVE | FunctionFlags::FINAL,
            Arc::new(handler),
        )
    }

    fn member(mut self, name: &str, flags: FunctionFlags, handler: NativeHandler) -> Self {
        self.members.push(PendingFunction {
            name: name.to_string(),
            flags,
            handler,
        });
        self
    }

    /// Interns names, allocates tokens, and registers the finished class with the runtime.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateFunction`] for a repeated member name,
    /// [`Error::DuplicateClass`] when the runtime already has a class with this name, and
    /// [`Error::NameTableFull`] if interning exhausts the name table.
    pub fn register(self) -> Result<ClassRc> {
        let class = ScriptClass::new(self.name, self.runtime.names().clone());

        for pending in self.members {
            let name = self.runtime.names().intern(&pending.name)?;
            if class.functions.contains_key(&name) {
                return Err(Error::DuplicateFunction {
                    class: class.name.clone(),
                    function: pending.name,
                });
            }

            let function = ScriptFunction::new(
                self.runtime.allocate_token(),
                name,
                pending.name,
                pending.flags,
                pending.handler,
            );
            class.functions.insert(name, function);
        }

        let class = Arc::new(class);
        self.runtime.register_class(Arc::clone(&class))?;
        Ok(class)
    }
}
