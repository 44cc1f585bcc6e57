//! Moving-average observation store
//!
//! Fixed-capacity ring buffer with a running sum. Slots fill from index 0,
//! so the valid observations are always `slots[..count]` and the running
//! sum equals their total. Pushing into a full buffer replaces the oldest
//! slot in O(1).

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use oracle_core::{OracleError, OracleResult};

/// Upper bound on `duration / frequency`
pub const MAX_OBSERVATIONS: usize = 4_096;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationBuffer {
    slots: Vec<U256>,
    next_index: usize,
    count: usize,
    cumulative: U256,
    duration: u64,
    last_observation_time: u64,
}

impl ObservationBuffer {
    /// Build a buffer covering `duration` seconds at one observation per
    /// `frequency` seconds. `initial` must fill it exactly or be empty.
    pub fn configure(
        duration: u64,
        frequency: u64,
        initial: Vec<U256>,
        last_observation_time: u64,
    ) -> OracleResult<Self> {
        if frequency == 0 {
            return Err(OracleError::InvalidConfig(
                "observation_frequency must be non-zero".to_string(),
            ));
        }
        if duration == 0 || duration % frequency != 0 {
            return Err(OracleError::InvalidMAConfig(format!(
                "duration {duration} is not a non-zero multiple of frequency {frequency}"
            )));
        }

        let capacity = usize::try_from(duration / frequency)
            .ok()
            .filter(|c| *c <= MAX_OBSERVATIONS)
            .ok_or_else(|| {
                OracleError::InvalidMAConfig(format!(
                    "duration {duration} needs more than {MAX_OBSERVATIONS} observations"
                ))
            })?;

        if !initial.is_empty() && initial.len() != capacity {
            return Err(OracleError::InvalidObservationCount {
                expected: capacity,
                actual: initial.len(),
            });
        }
        if initial.iter().any(|o| o.is_zero()) {
            return Err(OracleError::ZeroObservation);
        }

        let cumulative = initial
            .iter()
            .try_fold(U256::ZERO, |acc, o| acc.checked_add(*o))
            .ok_or(OracleError::Overflow)?;

        let count = initial.len();
        let mut slots = initial;
        slots.resize(capacity, U256::ZERO);

        Ok(Self {
            slots,
            next_index: count % capacity,
            count,
            cumulative,
            duration,
            last_observation_time,
        })
    }

    /// Append an observation, evicting the oldest once full
    pub fn push(&mut self, value: U256, timestamp: u64) -> OracleResult<()> {
        if self.slots.is_empty() {
            return Err(OracleError::InvalidMAConfig(
                "no observation buffer configured".to_string(),
            ));
        }
        if value.is_zero() {
            return Err(OracleError::ZeroObservation);
        }

        let full = self.count == self.capacity();
        let base = if full {
            self.cumulative - self.slots[self.next_index]
        } else {
            self.cumulative
        };
        let cumulative = base.checked_add(value).ok_or(OracleError::Overflow)?;

        self.cumulative = cumulative;
        self.slots[self.next_index] = value;
        self.next_index = (self.next_index + 1) % self.capacity();
        if !full {
            self.count += 1;
        }
        self.last_observation_time = timestamp;
        Ok(())
    }

    /// cumulative / count, or `None` before the first observation
    pub fn average(&self) -> Option<U256> {
        if self.count == 0 {
            return None;
        }
        Some(self.cumulative / U256::from(self.count))
    }

    /// Most recently written observation
    pub fn latest(&self) -> Option<U256> {
        if self.count == 0 {
            return None;
        }
        let capacity = self.capacity();
        Some(self.slots[(self.next_index + capacity - 1) % capacity])
    }

    /// Valid observations in slot order
    pub fn observations(&self) -> &[U256] {
        &self.slots[..self.count]
    }

    /// Valid observations, oldest first
    pub fn history(&self) -> Vec<U256> {
        if self.count < self.capacity() {
            return self.slots[..self.count].to_vec();
        }
        let (newer, older) = self.slots.split_at(self.next_index);
        older.iter().chain(newer).copied().collect()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn cumulative(&self) -> U256 {
        self.cumulative
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn last_observation_time(&self) -> u64 {
        self.last_observation_time
    }
}
