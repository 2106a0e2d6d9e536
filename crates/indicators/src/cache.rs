//! Per-indicator value cache.
//!
//! A ring buffer maps absolute series indices to computed values
//! (`slot = index % capacity`). The resident window
//! `[first_cached_index, highest_result_index]` never spans more than
//! `capacity` indices, so slots never collide. Every slot outside the window is
//! empty.
//!
//! Hits only take the read lock. Misses enter a reentrant gate, re-check, run
//! the computation without holding the slot lock and then store under the
//! write lock. Exactly one thread computes a given index; the others wait on
//! the gate and hit on the re-check.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::CacheConfig;
use crate::error::IndicatorError;
use crate::gate::{ComputeGate, GateGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resident {
    first: usize,
    highest: usize,
}

impl Resident {
    fn contains(self, index: usize) -> bool {
        index >= self.first && index <= self.highest
    }

    fn span(self) -> usize {
        self.highest - self.first + 1
    }
}

#[derive(Debug)]
struct CacheSlots<T> {
    buffer: Vec<Option<T>>,
    resident: Option<Resident>,
}

impl<T: Clone> CacheSlots<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![None; capacity],
            resident: None,
        }
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn slot(&self, index: usize) -> usize {
        index % self.buffer.len()
    }

    fn get(&self, index: usize) -> Option<&T> {
        let resident = self.resident?;
        if !resident.contains(index) {
            return None;
        }
        self.buffer[self.slot(index)].as_ref()
    }

    fn clear_range(&mut self, from: usize, to_inclusive: usize) {
        for index in from..=to_inclusive {
            let slot = self.slot(index);
            self.buffer[slot] = None;
        }
    }

    fn reset(&mut self) {
        self.buffer.iter_mut().for_each(|slot| *slot = None);
        self.resident = None;
    }

    /// Reallocates to `new_capacity`, keeping only `[first, highest]` of the
    /// current window.
    fn rebuild(&mut self, new_capacity: usize, first: usize, highest: usize) {
        let mut buffer = vec![None; new_capacity];
        if let Some(resident) = self.resident {
            let copy_from = first.max(resident.first);
            let copy_to = highest.min(resident.highest);
            for index in copy_from..=copy_to {
                let old_slot = self.slot(index);
                buffer[index % new_capacity] = self.buffer[old_slot].take();
            }
        }
        self.buffer = buffer;
    }

    fn store(&mut self, index: usize, value: T, policy: Policy) -> Result<(), IndicatorError> {
        match self.resident {
            None => {
                self.resident = Some(Resident {
                    first: index,
                    highest: index,
                });
            }
            Some(resident) if index > resident.highest => {
                self.extend_forward(index, resident, policy)?;
            }
            Some(resident) if index < resident.first => {
                self.extend_backward(index, resident, policy)?;
            }
            Some(_) => {}
        }
        let slot = self.slot(index);
        self.buffer[slot] = Some(value);
        Ok(())
    }

    fn extend_forward(
        &mut self,
        index: usize,
        resident: Resident,
        policy: Policy,
    ) -> Result<(), IndicatorError> {
        let required = index - resident.first + 1;
        let capacity = self.capacity();
        let mut first = resident.first;

        if required > capacity {
            if policy.bounded {
                let evict = required - capacity;
                if evict >= resident.span() {
                    tracing::warn!(
                        "cache jump to index {} evicts whole window [{}, {}]",
                        index,
                        resident.first,
                        resident.highest
                    );
                    self.clear_range(resident.first, resident.highest);
                    first = index;
                } else {
                    tracing::trace!(
                        "cache evicts [{}, {}] for index {}",
                        resident.first,
                        resident.first + evict - 1,
                        index
                    );
                    self.clear_range(resident.first, resident.first + evict - 1);
                    first += evict;
                }
            } else {
                let new_capacity = policy.grown_capacity(capacity, required)?;
                tracing::debug!("cache grows from {} to {} slots", capacity, new_capacity);
                self.rebuild(new_capacity, resident.first, resident.highest);
            }
        }

        self.resident = Some(Resident {
            first,
            highest: index,
        });
        Ok(())
    }

    fn extend_backward(
        &mut self,
        index: usize,
        resident: Resident,
        policy: Policy,
    ) -> Result<(), IndicatorError> {
        let required = resident.highest - index + 1;
        let mut capacity = self.capacity();
        let mut highest = resident.highest;

        if required > capacity {
            if policy.bounded {
                let evict = required - capacity;
                tracing::trace!(
                    "cache evicts newest {} entries for backward index {}",
                    evict,
                    index
                );
                highest -= evict;
            } else {
                capacity = policy.grown_capacity(capacity, required)?;
                tracing::debug!(
                    "cache grows from {} to {} slots",
                    self.capacity(),
                    capacity
                );
            }
        }

        self.rebuild(capacity, index, highest);
        self.resident = Some(Resident {
            first: index,
            highest,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Policy {
    bounded: bool,
    max_capacity: usize,
}

impl Policy {
    fn grown_capacity(self, current: usize, required: usize) -> Result<usize, IndicatorError> {
        if required > self.max_capacity {
            tracing::error!(
                "cache needs {} slots, ceiling is {}",
                required,
                self.max_capacity
            );
            return Err(IndicatorError::CapacityExceeded {
                required,
                maximum: self.max_capacity,
            });
        }
        Ok(current.saturating_mul(2).max(required).min(self.max_capacity))
    }
}

/// Thread-safe index → value cache with ring-buffer eviction.
///
/// Bounded caches have a fixed capacity (the series' maximum bar count) and
/// evict old entries as new ones arrive. Unbounded caches start small and
/// double up to a hard ceiling; needing more than that is an error.
#[derive(Debug)]
pub struct ValueCache<T> {
    slots: RwLock<CacheSlots<T>>,
    gate: ComputeGate,
    policy: Policy,
}

impl<T: Clone + Send + Sync> ValueCache<T> {
    /// Creates a cache with a fixed capacity.
    ///
    /// # Errors
    /// Returns `IndicatorError::InvalidParams` if `capacity` is 0 or above the
    /// default ceiling.
    pub fn bounded(capacity: usize) -> Result<Self, IndicatorError> {
        Self::with_config(Some(capacity), &CacheConfig::default())
    }

    /// Creates a growable cache with the default sizing.
    #[must_use]
    pub fn unbounded() -> Self {
        let config = CacheConfig::default();
        Self::build(config.initial_unbounded_capacity, false, config.max_capacity)
    }

    /// Creates a cache for a series with the given maximum bar count.
    ///
    /// `None` selects unbounded mode.
    ///
    /// # Errors
    /// Returns `IndicatorError::InvalidParams` for an invalid config, a zero
    /// bound or a bound above `config.max_capacity`.
    pub fn with_config(
        maximum_bar_count: Option<usize>,
        config: &CacheConfig,
    ) -> Result<Self, IndicatorError> {
        config.validate()?;
        match maximum_bar_count {
            Some(0) => Err(IndicatorError::invalid_params(
                "bounded cache needs a capacity of at least 1",
            )),
            Some(capacity) if capacity > config.max_capacity => {
                Err(IndicatorError::invalid_params(format!(
                    "bounded capacity {capacity} exceeds ceiling {}",
                    config.max_capacity
                )))
            }
            Some(capacity) => Ok(Self::build(capacity, true, capacity)),
            None => Ok(Self::build(
                config.initial_unbounded_capacity,
                false,
                config.max_capacity,
            )),
        }
    }

    fn build(capacity: usize, bounded: bool, max_capacity: usize) -> Self {
        Self {
            slots: RwLock::new(CacheSlots::with_capacity(capacity)),
            gate: ComputeGate::default(),
            policy: Policy {
                bounded,
                max_capacity,
            },
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheSlots<T>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheSlots<T>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value at `index`, computing and storing it on a miss.
    ///
    /// `compute` may read other indices of this cache from the same thread.
    ///
    /// # Errors
    /// Returns `IndicatorError::CapacityExceeded` if an unbounded cache would
    /// have to grow past its ceiling to store the value.
    pub fn get_or_compute<F>(&self, index: usize, compute: F) -> Result<T, IndicatorError>
    where
        F: FnOnce(usize) -> T,
    {
        if let Some(value) = self.get(index) {
            return Ok(value);
        }

        let _gate = self.gate.enter();
        if let Some(value) = self.get(index) {
            return Ok(value);
        }

        let value = compute(index);
        self.write().store(index, value.clone(), self.policy)?;
        Ok(value)
    }

    /// Returns the cached value at `index` without computing.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.read().get(index).cloned()
    }

    /// Returns `true` if a value is resident at `index`.
    #[must_use]
    pub fn is_cached(&self, index: usize) -> bool {
        self.read().get(index).is_some()
    }

    /// Stores `value` at `index`, replacing any resident value.
    ///
    /// # Errors
    /// Returns `IndicatorError::CapacityExceeded` if an unbounded cache would
    /// have to grow past its ceiling.
    pub fn put(&self, index: usize, value: T) -> Result<(), IndicatorError> {
        let _gate = self.gate.enter();
        self.write().store(index, value, self.policy)
    }

    /// Computes and stores every missing index in
    /// `[max(start_index, highest_result_index + 1), target_exclusive)`,
    /// in ascending order.
    ///
    /// # Errors
    /// Returns `IndicatorError::CapacityExceeded` if an unbounded cache would
    /// have to grow past its ceiling; values stored before the failure stay.
    pub fn prefill_until<F>(
        &self,
        start_index: usize,
        target_exclusive: usize,
        mut compute: F,
    ) -> Result<(), IndicatorError>
    where
        F: FnMut(usize) -> T,
    {
        let _gate = self.gate.enter();
        let from = match self.highest_result_index() {
            Some(highest) => start_index.max(highest + 1),
            None => start_index,
        };
        if from >= target_exclusive {
            return Ok(());
        }

        tracing::debug!("cache prefill [{}, {})", from, target_exclusive);
        for index in from..target_exclusive {
            if self.is_cached(index) {
                continue;
            }
            let value = compute(index);
            self.write().store(index, value, self.policy)?;
        }
        Ok(())
    }

    /// Drops every value at or after `index`.
    ///
    /// Degrades to [`ValueCache::clear`] when `index` is at or before the
    /// first resident index; no-op past the highest resident index.
    pub fn invalidate_from(&self, index: usize) {
        let _gate = self.gate.enter();
        let mut slots = self.write();
        let Some(resident) = slots.resident else {
            return;
        };
        if index > resident.highest {
            return;
        }
        if index <= resident.first {
            slots.reset();
            return;
        }
        slots.clear_range(index, resident.highest);
        slots.resident = Some(Resident {
            first: resident.first,
            highest: index - 1,
        });
    }

    /// Drops every cached value. Capacity is kept.
    pub fn clear(&self) {
        let _gate = self.gate.enter();
        self.write().reset();
    }

    /// Oldest resident index, `None` while empty.
    #[must_use]
    pub fn first_cached_index(&self) -> Option<usize> {
        self.read().resident.map(|resident| resident.first)
    }

    /// Newest resident index, `None` while empty.
    #[must_use]
    pub fn highest_result_index(&self) -> Option<usize> {
        self.read().resident.map(|resident| resident.highest)
    }

    /// Current number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.read().capacity()
    }

    /// Returns `true` if the capacity is fixed.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.policy.bounded
    }

    /// Number of resident values (scans the buffer).
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().buffer.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns `true` if no value is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().resident.is_none()
    }

    /// Returns `true` while the current thread is inside a miss, `put`,
    /// prefill or invalidation of this cache.
    #[must_use]
    pub fn is_held_by_current_thread(&self) -> bool {
        self.gate.is_held_by_current_thread()
    }

    /// Enters the compute gate for work that memoizes outside the slots.
    pub(crate) fn enter_gate(&self) -> GateGuard<'_> {
        self.gate.enter()
    }
}
