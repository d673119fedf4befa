use parking_kv::KVError;

use crate::model::Slot;

/// Persistence contract the slot registry runs against.
///
/// Listing methods return slots ordered by ascending `number`.
pub trait SlotStore: Send + Sync {
    /// Number of slots currently stored.
    fn count(&self) -> Result<usize, KVError>;

    fn find_by_id(&self, id: &str) -> Result<Option<Slot>, KVError>;

    fn find_all(&self) -> Result<Vec<Slot>, KVError>;

    /// The available slot with the lowest number, if any.
    fn find_one_available(&self) -> Result<Option<Slot>, KVError> {
        Ok(self.find_all()?.into_iter().find(Slot::is_available))
    }

    fn find_all_available(&self) -> Result<Vec<Slot>, KVError> {
        let mut slots = self.find_all()?;
        slots.retain(Slot::is_available);
        Ok(slots)
    }

    /// Persist a new slot, assigning its `id` when empty. Returns the stored record.
    fn insert(&self, slot: Slot) -> Result<Slot, KVError>;

    /// Replace `current` with `next`, but only if the stored record still
    /// equals `current`. Returns `false` when the record changed or vanished.
    fn update(&self, current: &Slot, next: &Slot) -> Result<bool, KVError>;

    /// Returns `false` if no slot had this id.
    fn delete_by_id(&self, id: &str) -> Result<bool, KVError>;

    /// Atomically advance the slot-number sequence and return the new value.
    /// The first call returns 1; values are never handed out twice.
    fn next_number(&self) -> Result<u32, KVError>;
}
