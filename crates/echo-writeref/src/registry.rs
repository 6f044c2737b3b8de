// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Process-wide map from output target to its write state.
//!
//! Serialization code should carry its [`SharedCounter`] handle directly;
//! the registry exists for lookups by target identity (including the
//! legacy "current target" lookup) and for the shutdown leak sweep.
//!
//! # Lifecycle
//!
//! [`WriterefRegistry::global`] constructs the registry on first use.
//! [`WriterefRegistry::shutdown`] tears it down explicitly: it drains every
//! remaining target and, when asked, reports leaked records.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

use crate::WriterefCounter;

/// Write state handle held by an output target and the registry.
pub type SharedCounter = Arc<Mutex<WriterefCounter>>;

/// Identity of an output target.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct OutputId(pub u64);

impl OutputId {
    /// Mint an id never returned before in this process.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

/// Registry misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The target already has write state.
    #[error("writeref instance already exists for {0}")]
    AlreadyRegistered(OutputId),
    /// The target has no write state.
    #[error("no writeref instance for {0}")]
    NotRegistered(OutputId),
}

#[derive(Default)]
struct Inner {
    counters: HashMap<OutputId, SharedCounter>,
    current: Option<OutputId>,
}

/// Mutex-guarded map of output target → write state.
#[derive(Default)]
pub struct WriterefRegistry {
    inner: Mutex<Inner>,
}

impl fmt::Debug for WriterefRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterefRegistry")
            .field("targets", &self.len())
            .finish()
    }
}

/// Lock a shared counter, recovering from poisoning.
pub fn lock_counter(counter: &SharedCounter) -> MutexGuard<'_, WriterefCounter> {
    counter.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WriterefRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, constructed on first use.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<WriterefRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create write state for `out`. With `copy_from`, the new state shares
    /// that target's records and snapshots its id table.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AlreadyRegistered`] if `out` has state already;
    /// [`RegistryError::NotRegistered`] if `copy_from` has none.
    pub fn create(
        &self,
        out: OutputId,
        copy_from: Option<OutputId>,
    ) -> Result<SharedCounter, RegistryError> {
        let mut inner = self.lock();
        if inner.counters.contains_key(&out) {
            warn!(target_id = %out, "writeref instance already exists");
            return Err(RegistryError::AlreadyRegistered(out));
        }
        let counter = match copy_from {
            Some(from) => {
                let source = inner
                    .counters
                    .get(&from)
                    .ok_or(RegistryError::NotRegistered(from))?;
                WriterefCounter::copy_from(&lock_counter(source))
            }
            None => WriterefCounter::new(),
        };
        let shared = Arc::new(Mutex::new(counter));
        inner.counters.insert(out, Arc::clone(&shared));
        debug!(target_id = %out, copied = ?copy_from, "writeref instance created");
        Ok(shared)
    }

    /// Remove the write state for `out`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotRegistered`] if `out` has no state.
    pub fn destruct(&self, out: OutputId) -> Result<(), RegistryError> {
        let mut inner = self.lock();
        if inner.counters.remove(&out).is_none() {
            warn!(target_id = %out, "writeref instance not found");
            return Err(RegistryError::NotRegistered(out));
        }
        if inner.current == Some(out) {
            inner.current = None;
        }
        debug!(target_id = %out, "writeref instance destroyed");
        Ok(())
    }

    /// Write state for `out`, which also becomes the current target.
    /// `None` returns the current target's state.
    pub fn instance(&self, out: Option<OutputId>) -> Option<SharedCounter> {
        let mut inner = self.lock();
        let Some(out) = out else {
            let current = inner.current?;
            return inner.counters.get(&current).cloned();
        };
        let counter = inner.counters.get(&out).cloned();
        if counter.is_some() {
            inner.current = Some(out);
        } else {
            warn!(target_id = %out, "no writeref instance");
        }
        counter
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.lock().counters.len()
    }

    /// Returns `true` when no targets are registered.
    pub fn is_empty(&self) -> bool {
        self.lock().counters.is_empty()
    }

    /// Drain every target. With `report_leaks`, each drained state is swept
    /// and leaked records are logged. Returns the number of leaked records.
    pub fn shutdown(&self, report_leaks: bool) -> usize {
        let drained: Vec<_> = {
            let mut inner = self.lock();
            inner.current = None;
            inner.counters.drain().collect()
        };
        if !report_leaks {
            return 0;
        }
        drained
            .iter()
            .map(|(_, counter)| lock_counter(counter).debug_cleanup())
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{ObjectId, WriteObject};

    struct Obj(ObjectId);

    impl WriteObject for Obj {
        fn object_id(&self) -> ObjectId {
            self.0
        }

        fn name(&self) -> &str {
            ""
        }
    }

    #[test]
    fn create_lookup_destruct() {
        let registry = WriterefRegistry::new();
        let out = OutputId::fresh();
        let counter = registry.create(out, None).unwrap();
        let found = registry.instance(Some(out)).unwrap();
        assert!(Arc::ptr_eq(&counter, &found));
        assert_eq!(
            registry.create(out, None).unwrap_err(),
            RegistryError::AlreadyRegistered(out)
        );
        registry.destruct(out).unwrap();
        assert!(registry.instance(Some(out)).is_none());
        assert_eq!(
            registry.destruct(out).unwrap_err(),
            RegistryError::NotRegistered(out)
        );
    }

    #[test]
    fn none_returns_current() {
        let registry = WriterefRegistry::new();
        let a = OutputId::fresh();
        let b = OutputId::fresh();
        let ca = registry.create(a, None).unwrap();
        registry.create(b, None).unwrap();
        assert!(registry.instance(None).is_none());
        registry.instance(Some(a));
        assert!(Arc::ptr_eq(&registry.instance(None).unwrap(), &ca));
        registry.destruct(a).unwrap();
        assert!(registry.instance(None).is_none());
    }

    #[test]
    fn copy_shares_records() {
        let registry = WriterefRegistry::new();
        let a = OutputId::fresh();
        let b = OutputId::fresh();
        let ca = registry.create(a, None).unwrap();
        let cb = registry.create(b, Some(a)).unwrap();
        let obj = Obj(ObjectId(9));
        lock_counter(&ca).set_writeref(&obj, 2);
        assert_eq!(lock_counter(&cb).get_writeref(obj.0), 2);
        assert!(lock_counter(&cb).shares_records_with(&lock_counter(&ca)));

        assert_eq!(
            registry.create(OutputId::fresh(), Some(OutputId(0))).unwrap_err(),
            RegistryError::NotRegistered(OutputId(0))
        );
    }

    #[test]
    fn shutdown_reports_leaks() {
        let registry = WriterefRegistry::new();
        let a = OutputId::fresh();
        let ca = registry.create(a, None).unwrap();
        lock_counter(&ca).set_in_graph(&Obj(ObjectId(1)), true);
        assert_eq!(registry.shutdown(true), 1);
        assert!(registry.is_empty());
        assert_eq!(registry.shutdown(true), 0);
    }
}
