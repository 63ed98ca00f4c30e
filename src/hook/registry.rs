//! The override registry.
//!
//! A mapping from dispatch-target identity to the active [`OverrideRecord`], with O(1) average
//! lookup, insert, and remove. The registry holds at most one record per target and never owns
//! the records it maps; the installing holders do. It is owned by the
//! [`Trampoline`](crate::hook::Trampoline) rather than living in process-wide state, so distinct
//! hook engines never observe each other's overrides.

use std::sync::Arc;

use dashmap::DashMap;

use crate::hook::OverrideRecord;
use crate::vm::FunctionToken;

/// Mapping from hooked target to its active override record.
pub struct OverrideRegistry {
    records: DashMap<FunctionToken, Arc<OverrideRecord>>,
}

impl Default for OverrideRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OverrideRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        OverrideRegistry {
            records: DashMap::new(),
        }
    }

    /// Inserts or replaces the record for its target.
    ///
    /// A prior occupant for the same target is dropped from the mapping but not torn down; the
    /// lifecycle operation that triggered the replacement is responsible for restoring its saved
    /// state first.
    pub fn install(&self, record: Arc<OverrideRecord>) {
        self.records
            .insert(record.target_function().token(), record);
    }

    /// Returns the active record for a target, if any.
    #[must_use]
    pub fn lookup(&self, token: FunctionToken) -> Option<Arc<OverrideRecord>> {
        self.records.get(&token).map(|entry| Arc::clone(entry.value()))
    }

    /// True when the target currently has an active record.
    #[must_use]
    pub fn contains(&self, token: FunctionToken) -> bool {
        self.records.contains_key(&token)
    }

    /// Removes the mapping for a target, but only if the current record is identity-equal to
    /// `record`.
    ///
    /// Returns whether a removal happened. The identity check prevents a stale holder from
    /// removing a newer registration that superseded it.
    pub fn remove(&self, token: FunctionToken, record: &Arc<OverrideRecord>) -> bool {
        self.records
            .remove_if(&token, |_, current| Arc::ptr_eq(current, record))
            .is_some()
    }

    /// Number of active records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no override is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl std::fmt::Debug for OverrideRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideRegistry")
            .field("records", &self.records.len())
            .finish()
    }
}
