//! Debounced task scheduling for pincode lookups.
//!
//! Each address role owns one timer slot per lookup kind. Scheduling into
//! a slot cancels whatever was pending there (last keystroke wins), and a
//! slot can be reserved without a timer so a linked follow-up lookup can
//! check it is still wanted before running.
//!
//! Cancellation is generation-based: every slot carries a counter, and a
//! timer only runs its job if the counter still matches the value captured
//! when the timer was armed. A job already past that check cannot be
//! stopped; its effects are the caller's concern.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use waybill_types::AddressRole;

/// The two gateway lookups a pincode change drives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    /// pincode → location detail
    PincodeDetail,
    /// pincode → selectable areas
    AreaList,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::PincodeDetail => write!(f, "pincode_detail"),
            LookupKind::AreaList => write!(f, "area_list"),
        }
    }
}

/// Identifies one debounce slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskKey {
    pub role: AddressRole,
    pub kind: LookupKind,
}

impl TaskKey {
    pub fn new(role: AddressRole, kind: LookupKind) -> Self {
        Self { role, kind }
    }
}

/// Cancel-and-replace scheduler for debounced lookups.
#[derive(Debug, Clone, Default)]
pub struct DebounceScheduler {
    generations: Arc<Mutex<BTreeMap<TaskKey, u64>>>,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self, key: TaskKey) -> u64 {
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let generation = generations.entry(key).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Arm a single-shot timer in the slot, cancelling anything pending
    /// there. The job runs on a background thread after `delay`, unless
    /// the slot is re-armed or cancelled first.
    pub fn schedule<F>(&self, key: TaskKey, delay: Duration, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.bump(key);
        let scheduler = self.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            if scheduler.is_current(key, generation) {
                job();
            }
        });
    }

    /// Claim the slot without arming a timer, returning the generation a
    /// linked job must present to `is_current` before running.
    pub fn reserve(&self, key: TaskKey) -> u64 {
        self.bump(key)
    }

    /// True when `generation` is still the latest claim on the slot.
    pub fn is_current(&self, key: TaskKey, generation: u64) -> bool {
        let generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        generations.get(&key) == Some(&generation)
    }

    /// Cancel whatever is pending in the slot.
    pub fn cancel(&self, key: TaskKey) {
        self.bump(key);
    }

    /// Cancel every pending slot. Used at session teardown.
    pub fn cancel_all(&self) {
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for generation in generations.values_mut() {
            *generation += 1;
        }
    }
}
