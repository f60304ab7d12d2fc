use crate::analysis::dispose_analysis::types::DisposeAnalysisResult;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::flow_graph::flow_nodes::{GraphId, MethodId};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

type ResultSlot = Mutex<Option<Arc<DisposeAnalysisResult>>>;

/// Per-compilation memo of dispose results keyed by (graph, method).
///
/// The outer lock only hands out slots. Each slot is held for the whole computation,
/// so concurrent requesters for one key wait for a single computation while other keys
/// proceed. Failed and cancelled computations leave the slot empty.
#[derive(Debug, Default)]
pub struct DisposeResultCache {
    slots: Mutex<FxHashMap<(GraphId, MethodId), Arc<ResultSlot>>>,
    computations: AtomicUsize,
}

impl DisposeResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &self,
        key: (GraphId, MethodId),
        compute: impl FnOnce() -> Result<DisposeAnalysisResult, CompilerError>,
    ) -> Result<Arc<DisposeAnalysisResult>, CompilerError> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };

        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(result) = cached.as_ref() {
            return Ok(Arc::clone(result));
        }

        self.computations.fetch_add(1, Ordering::Relaxed);
        let result = Arc::new(compute()?);
        *cached = Some(Arc::clone(&result));

        Ok(result)
    }

    pub fn get(&self, key: (GraphId, MethodId)) -> Option<Arc<DisposeAnalysisResult>> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.get(&key)?)
        };

        let cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        cached.clone()
    }

    /// Number of computations started, including ones that failed
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            // Slots still computing are not counted
            .filter(|slot| match slot.try_lock() {
                Ok(cached) => cached.is_some(),
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_some(),
                Err(TryLockError::WouldBlock) => false,
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
