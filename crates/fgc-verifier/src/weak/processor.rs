//! Weak Reference Processor
//!
//! Owns every table of weak roots in the runtime and knows the two ways of
//! walking them:
//!
//! - **Serial phases**: an ordered list of subsystems (agent object tags,
//!   event recorder) that are only processed inside a stop-the-world pause.
//!   Each phase is driven with an `is_alive` predicate and a keep-alive
//!   closure.
//! - **Weak storages**: independent [`OopStorage`] tables that support
//!   concurrent enumeration.
//!
//! [`WeakProcessor::weak_oops_do`] walks both, phases first.

use super::storage::OopStorage;

/// Stop-the-world weak processing phases, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerialWeakPhase {
    /// Objects tagged by attached tooling agents
    AgentTags,
    /// Objects referenced by the event recorder
    EventRecorder,
}

impl SerialWeakPhase {
    pub const ALL: [SerialWeakPhase; 2] = [SerialWeakPhase::AgentTags, SerialWeakPhase::EventRecorder];

    pub fn name(self) -> &'static str {
        match self {
            SerialWeakPhase::AgentTags => "agent tags",
            SerialWeakPhase::EventRecorder => "event recorder",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Concurrently iterable weak storages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeakStorageId {
    /// Weak global handles
    HandleWeak,
    /// Interned string table
    StringTable,
    /// Resolved method table
    MethodTable,
    /// Runtime-internal weak handles
    RuntimeWeak,
}

impl WeakStorageId {
    pub const ALL: [WeakStorageId; 4] = [
        WeakStorageId::HandleWeak,
        WeakStorageId::StringTable,
        WeakStorageId::MethodTable,
        WeakStorageId::RuntimeWeak,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WeakStorageId::HandleWeak => "handle weak",
            WeakStorageId::StringTable => "string table weak",
            WeakStorageId::MethodTable => "method table weak",
            WeakStorageId::RuntimeWeak => "runtime weak",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Weak-root tables and their traversal
#[derive(Debug)]
pub struct WeakProcessor {
    phases: Vec<OopStorage>,
    storages: Vec<OopStorage>,
}

impl WeakProcessor {
    pub fn new() -> Self {
        Self {
            phases: SerialWeakPhase::ALL
                .iter()
                .map(|p| OopStorage::new(p.name()))
                .collect(),
            storages: WeakStorageId::ALL
                .iter()
                .map(|id| OopStorage::new(id.name()))
                .collect(),
        }
    }

    /// Table backing a serial phase
    pub fn phase_table(&self, phase: SerialWeakPhase) -> &OopStorage {
        &self.phases[phase.index()]
    }

    /// Weak storage by id
    pub fn storage(&self, id: WeakStorageId) -> &OopStorage {
        &self.storages[id.index()]
    }

    /// Serial phases in processing order
    pub fn serial_phases(&self) -> impl Iterator<Item = SerialWeakPhase> {
        SerialWeakPhase::ALL.into_iter()
    }

    /// All weak storages
    pub fn weak_storages(&self) -> impl Iterator<Item = &OopStorage> {
        self.storages.iter()
    }

    /// Run one serial phase
    pub fn process_phase(
        &self,
        phase: SerialWeakPhase,
        is_alive: &dyn Fn(usize) -> bool,
        keep_alive: &mut dyn FnMut(usize),
    ) -> usize {
        self.phase_table(phase).weak_oops_do(is_alive, keep_alive)
    }

    /// Full weak walk: every serial phase, then every weak storage
    ///
    /// Returns the number of cleared entries.
    pub fn weak_oops_do(
        &self,
        is_alive: &dyn Fn(usize) -> bool,
        keep_alive: &mut dyn FnMut(usize),
    ) -> usize {
        let mut cleared = 0;
        for table in &self.phases {
            cleared += table.weak_oops_do(is_alive, keep_alive);
        }
        for storage in &self.storages {
            cleared += storage.weak_oops_do(is_alive, keep_alive);
        }
        cleared
    }
}

impl Default for WeakProcessor {
    fn default() -> Self {
        Self::new()
    }
}
