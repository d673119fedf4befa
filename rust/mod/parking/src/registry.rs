use std::sync::{Arc, Mutex, PoisonError};

use parking_core::Clock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SlotError;
use crate::fee::{self, FeeQuote, Rounding};
use crate::model::{Assignment, Slot, SlotPatch, SlotState, validate_plate};
use crate::pin::PinHasher;
use crate::store::SlotStore;

/// Read-modify-write attempts on one slot before reporting contention.
const MAX_CAS_ATTEMPTS: usize = 8;

/// Business limits of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of slots that may exist at once.
    pub capacity: usize,
    /// Price of one billed hour.
    pub unit_rate: u64,
    pub rounding: Rounding,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            unit_rate: 5000,
            rounding: Rounding::Ceil,
        }
    }
}

// ---------------------------------------------------------------------------
// SlotRegistry — state machine over the slot store
// ---------------------------------------------------------------------------

/// Owns the slot lifecycle:
///
/// ```text
/// AVAILABLE --assign--> OCCUPIED --fee--> OCCUPIED (exit time set) --release--> AVAILABLE
///                           └──────────────────release──────────────────────────┘
/// ```
///
/// Every state transition is a single conditional write, so a slot is never
/// left half-updated and two assignments can't book the same slot.
pub struct SlotRegistry {
    store: Arc<dyn SlotStore>,
    clock: Arc<dyn Clock>,
    pins: PinHasher,
    config: RegistryConfig,
    /// Serializes count-check + insert so capacity holds under concurrency.
    create_lock: Mutex<()>,
}

impl SlotRegistry {
    pub fn new(
        store: Arc<dyn SlotStore>,
        clock: Arc<dyn Clock>,
        pins: PinHasher,
        config: RegistryConfig,
    ) -> Self {
        Self {
            store,
            clock,
            pins,
            config,
            create_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // =======================================================================
    // Lifecycle
    // =======================================================================

    /// Register a new AVAILABLE slot with the next sequence number.
    pub fn create_slot(&self) -> Result<Slot, SlotError> {
        let _guard = self
            .create_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let count = self.store.count()?;
        if count >= self.config.capacity {
            warn!(count, max = self.config.capacity, "slot creation refused: capacity reached");
            return Err(SlotError::CapacityExceeded {
                max: self.config.capacity,
            });
        }

        let number = self.store.next_number()?;
        let slot = self.store.insert(Slot::available(number))?;
        info!(id = %slot.id, number, "slot created");
        Ok(slot)
    }

    /// Park `plate` in the lowest-numbered available slot.
    pub fn assign_vehicle(&self, plate: &str) -> Result<Assignment, SlotError> {
        validate_plate(plate).map_err(SlotError::InvalidSlot)?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            let Some(slot) = self.store.find_one_available()? else {
                return Err(SlotError::NoSlotAvailable);
            };

            let pin = self.pins.hash(slot.number, plate)?;
            let mut next = slot.clone();
            next.occupy(plate, self.clock.now(), pin);

            if self.store.update(&slot, &next)? {
                info!(id = %next.id, number = next.number, "vehicle assigned");
                return Ok(Assignment {
                    id: next.id,
                    number: next.number,
                });
            }
            debug!(number = slot.number, "slot taken concurrently, picking another");
        }
        Err(SlotError::Contended("assignment".into()))
    }

    /// Bill the current occupancy and stamp its exit time. The slot stays
    /// OCCUPIED; calling again re-bills from the original entry time.
    pub fn compute_fee(&self, id: &str) -> Result<FeeQuote, SlotError> {
        self.modify(id, |slot| {
            if slot.is_available() {
                return Err(SlotError::SlotNotOccupied(id.to_string()));
            }
            let entry = slot
                .entry_time
                .ok_or_else(|| SlotError::Corrupt(id.to_string()))?;
            let now = self.clock.now();
            let quote = fee::quote(entry, now, self.config.unit_rate, self.config.rounding);

            let mut next = slot.clone();
            next.exit_time = Some(now);
            Ok((next, quote))
        })
        .inspect(|q| info!(id, fee = q.fee, billed_hours = q.billed_hours, "fee computed"))
    }

    /// End the occupancy and return the slot to AVAILABLE.
    pub fn release_slot(&self, id: &str) -> Result<(), SlotError> {
        self.modify(id, |slot| {
            if slot.is_available() {
                return Err(SlotError::SlotNotOccupied(id.to_string()));
            }
            let mut next = slot.clone();
            next.vacate();
            Ok((next, ()))
        })?;
        info!(id, "slot released");
        Ok(())
    }

    // =======================================================================
    // Queries
    // =======================================================================

    pub fn get_slot(&self, id: &str) -> Result<Slot, SlotError> {
        self.store
            .find_by_id(id)?
            .ok_or_else(|| SlotError::SlotNotFound(id.to_string()))
    }

    pub fn list_slots(&self) -> Result<Vec<Slot>, SlotError> {
        Ok(self.store.find_all()?)
    }

    pub fn list_available(&self) -> Result<Vec<Slot>, SlotError> {
        Ok(self.store.find_all_available()?)
    }

    // =======================================================================
    // Administration
    // =======================================================================

    /// Overwrite the fields present in `patch`, then re-check the occupancy
    /// invariant. Occupancy itself (a new plate, AVAILABLE→OCCUPIED) can only
    /// start through [`assign_vehicle`](Self::assign_vehicle), which owns PIN
    /// derivation.
    pub fn update_slot(&self, id: &str, patch: &SlotPatch) -> Result<Slot, SlotError> {
        let updated = self.modify(id, |slot| {
            let next = apply_patch(slot, patch)?;
            Ok((next.clone(), next))
        })?;
        info!(id, state = %updated.state, "slot updated");
        Ok(updated)
    }

    /// Remove a slot for good. Its number is not handed out again.
    pub fn delete_slot(&self, id: &str) -> Result<(), SlotError> {
        if !self.store.delete_by_id(id)? {
            return Err(SlotError::SlotNotFound(id.to_string()));
        }
        info!(id, "slot deleted");
        Ok(())
    }

    // =======================================================================
    // Internals
    // =======================================================================

    /// Read the slot, let `f` compute its successor, and write it back only
    /// if nobody changed the slot in between. Re-reads on conflict so `f`
    /// always judges the latest state.
    fn modify<T>(
        &self,
        id: &str,
        f: impl Fn(&Slot) -> Result<(Slot, T), SlotError>,
    ) -> Result<T, SlotError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let current = self.get_slot(id)?;
            let (next, out) = f(&current)?;
            if self.store.update(&current, &next)? {
                return Ok(out);
            }
            debug!(id, "slot changed during update, retrying");
        }
        Err(SlotError::Contended(id.to_string()))
    }
}

fn apply_patch(current: &Slot, patch: &SlotPatch) -> Result<Slot, SlotError> {
    let invalid = |msg: &str| Err(SlotError::InvalidSlot(msg.to_string()));

    if patch.id.as_ref().is_some_and(|id| *id != current.id) {
        return invalid("id cannot be changed");
    }
    if patch.number.is_some_and(|n| n != current.number) {
        return invalid("number cannot be changed");
    }
    if patch.pin.as_ref().is_some_and(|pin| *pin != current.pin) {
        return invalid("pin is derived on assignment and cannot be written");
    }

    let mut next = current.clone();
    if let Some(state) = patch.state {
        next.state = state;
    }
    if let Some(plate) = &patch.plate {
        next.plate.clone_from(plate);
    }
    if let Some(entry) = patch.entry_time {
        next.entry_time = entry;
    }
    if let Some(exit) = patch.exit_time {
        next.exit_time = exit;
    }

    match (current.state, next.state) {
        (_, SlotState::Available) => next.pin.clear(),
        (SlotState::Available, SlotState::Occupied) => {
            return invalid("slots become occupied through vehicle assignment");
        }
        (SlotState::Occupied, SlotState::Occupied) if next.plate != current.plate => {
            return invalid("release the slot before parking a different plate");
        }
        (SlotState::Occupied, SlotState::Occupied) => {}
    }

    next.check_invariant().map_err(SlotError::InvalidSlot)?;
    Ok(next)
}
