//! The host runtime context.
//!
//! [`Runtime`] owns everything the original design kept in process-wide state: the interned-name
//! table, the class registry, and the token and instance-id allocators. Components that need a
//! piece of it (the trampoline needs the name table) receive it explicitly, so two runtimes in
//! one process never share hook state.

use std::sync::{
    atomic::{AtomicU32, AtomicU64, Ordering},
    Arc,
};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::vm::{ClassBuilder, ClassRc, FunctionToken, Instance, InstanceId, InstanceRc, NameTable};
use crate::{Error, Result};

/// Central context owning names, classes, and identity allocation.
pub struct Runtime {
    names: Arc<NameTable>,
    classes: DashMap<String, ClassRc>,
    next_function_row: AtomicU32,
    next_instance_id: AtomicU64,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Creates an empty runtime.
    #[must_use]
    pub fn new() -> Self {
        Runtime {
            names: Arc::new(NameTable::new()),
            classes: DashMap::new(),
            next_function_row: AtomicU32::new(1),
            next_instance_id: AtomicU64::new(1),
        }
    }

    /// The runtime's interned-name table.
    ///
    /// Shared with the trampoline so call-site name references can be validated against the same
    /// table the classes interned into.
    #[must_use]
    pub fn names(&self) -> &Arc<NameTable> {
        &self.names
    }

    /// Starts defining a class with the given name.
    #[must_use]
    pub fn class(&self, name: &str) -> ClassBuilder<'_> {
        ClassBuilder::new(self, name)
    }

    /// Looks up a registered class by name.
    #[must_use]
    pub fn find_class(&self, name: &str) -> Option<ClassRc> {
        self.classes.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered classes
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Spawns an instance of a class.
    ///
    /// The label is purely diagnostic; identity is the allocated [`InstanceId`].
    #[must_use]
    pub fn spawn(&self, class: &ClassRc, label: &str) -> InstanceRc {
        Instance::new(
            InstanceId::new(self.next_instance_id.fetch_add(1, Ordering::Relaxed)),
            label.to_string(),
            Arc::clone(class),
        )
    }

    pub(crate) fn allocate_token(&self) -> FunctionToken {
        FunctionToken::for_row(self.next_function_row.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn register_class(&self, class: ClassRc) -> Result<()> {
        match self.classes.entry(class.name().to_string()) {
            Entry::Occupied(_) => Err(Error::DuplicateClass(class.name().to_string())),
            Entry::Vacant(slot) => {
                slot.insert(class);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("classes", &self.classes.len())
            .field("names", &self.names.len())
            .finish()
    }
}
