//! `SlotStore` on top of a `KVStore`.
//!
//! Layout:
//! - `parking:slot:{id}`        → JSON-encoded [`Slot`]
//! - `parking:seq:slot_number`  → last handed-out number, decimal text

use std::sync::Arc;

use parking_core::new_id;
use parking_kv::{KVError, KVStore};
use tracing::debug;

use crate::model::Slot;
use crate::store::SlotStore;

const SLOT_PREFIX: &str = "parking:slot:";
const SEQ_KEY: &str = "parking:seq:slot_number";

/// Attempts at the sequence compare-and-swap before giving up.
const SEQ_MAX_ATTEMPTS: usize = 64;

pub struct KvSlotStore {
    kv: Arc<dyn KVStore>,
}

impl KvSlotStore {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    fn make_key(id: &str) -> String {
        format!("{SLOT_PREFIX}{id}")
    }
}

fn encode(slot: &Slot) -> Result<Vec<u8>, KVError> {
    serde_json::to_vec(slot).map_err(|e| KVError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Slot, KVError> {
    serde_json::from_slice(bytes).map_err(|e| KVError::Serialization(e.to_string()))
}

impl SlotStore for KvSlotStore {
    fn count(&self) -> Result<usize, KVError> {
        Ok(self.kv.scan(SLOT_PREFIX)?.len())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Slot>, KVError> {
        self.kv
            .get(&Self::make_key(id))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn find_all(&self) -> Result<Vec<Slot>, KVError> {
        let mut slots = self
            .kv
            .scan(SLOT_PREFIX)?
            .into_iter()
            .map(|(_key, bytes)| decode(&bytes))
            .collect::<Result<Vec<_>, _>>()?;
        slots.sort_by_key(|s| s.number);
        Ok(slots)
    }

    fn insert(&self, mut slot: Slot) -> Result<Slot, KVError> {
        if slot.id.is_empty() {
            slot.id = new_id();
        }
        let key = Self::make_key(&slot.id);
        if !self.kv.compare_and_swap(&key, None, Some(&encode(&slot)?))? {
            return Err(KVError::Storage(format!("slot id '{}' already exists", slot.id)));
        }
        Ok(slot)
    }

    fn update(&self, current: &Slot, next: &Slot) -> Result<bool, KVError> {
        let key = Self::make_key(&current.id);
        let Some(raw) = self.kv.get(&key)? else {
            return Ok(false);
        };
        if decode(&raw)? != *current {
            return Ok(false);
        }
        self.kv
            .compare_and_swap(&key, Some(&raw), Some(&encode(next)?))
    }

    fn delete_by_id(&self, id: &str) -> Result<bool, KVError> {
        self.kv.delete(&Self::make_key(id))
    }

    fn next_number(&self) -> Result<u32, KVError> {
        for _ in 0..SEQ_MAX_ATTEMPTS {
            let raw = self.kv.get(SEQ_KEY)?;
            let last = match &raw {
                Some(bytes) => std::str::from_utf8(bytes)
                    .ok()
                    .and_then(|s| s.parse::<u32>().ok())
                    .ok_or_else(|| {
                        KVError::Serialization(format!("corrupt sequence value at {SEQ_KEY}"))
                    })?,
                None => 0,
            };
            let next = last
                .checked_add(1)
                .ok_or_else(|| KVError::Storage("slot number sequence exhausted".into()))?;
            let encoded = next.to_string();
            if self
                .kv
                .compare_and_swap(SEQ_KEY, raw.as_deref(), Some(encoded.as_bytes()))?
            {
                return Ok(next);
            }
            debug!("slot number sequence contended, retrying");
        }
        Err(KVError::Storage("slot number sequence contended".into()))
    }
}
