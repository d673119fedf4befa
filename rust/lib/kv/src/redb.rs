use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::KVStore;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

fn storage(e: impl std::fmt::Display) -> KVError {
    KVError::Storage(e.to_string())
}

/// KVStore backed by redb, a pure-Rust embedded key-value database.
///
/// redb admits one write transaction at a time, so a read-then-write inside
/// a single write transaction is atomic. `compare_and_swap` relies on this.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(storage)?;

        // Make sure the table exists so that read transactions can open it.
        let write_txn = db.begin_write().map_err(storage)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;

        debug!(path = %path.display(), "opened redb store");
        Ok(Self { db: Arc::new(db) })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;
        let value = table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(storage)?;
            table.insert(key, value).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)
    }

    fn delete(&self, key: &str) -> Result<bool, KVError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let existed = {
            let mut table = write_txn.open_table(TABLE).map_err(storage)?;
            let removed = table.remove(key).map_err(storage)?;
            removed.is_some()
        };
        write_txn.commit().map_err(storage)?;
        Ok(existed)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;

        let mut results = Vec::new();
        for entry in table.range(prefix..).map_err(storage)? {
            let (key, value) = entry.map_err(storage)?;
            let key = key.value().to_string();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key, value.value().to_vec()));
        }
        Ok(results)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> Result<bool, KVError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let swapped = {
            let mut table = write_txn.open_table(TABLE).map_err(storage)?;
            let current = table.get(key).map_err(storage)?.map(|v| v.value().to_vec());
            if current.as_deref() == expected {
                match new {
                    Some(value) => {
                        table.insert(key, value).map_err(storage)?;
                    }
                    None => {
                        table.remove(key).map_err(storage)?;
                    }
                }
                true
            } else {
                false
            }
        };

        if swapped {
            write_txn.commit().map_err(storage)?;
        } else {
            write_txn.abort().map_err(storage)?;
            debug!(key, "compare-and-swap lost");
        }
        Ok(swapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn set_get_delete() {
        let (store, _dir) = open_store();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", b"1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn scan_stops_at_prefix_boundary() {
        let (store, _dir) = open_store();
        store.set("parking:slot:b", b"2").unwrap();
        store.set("parking:slot:a", b"1").unwrap();
        store.set("parking:seq:slot_number", b"7").unwrap();
        store.set("parking:sluggish", b"x").unwrap();

        let entries = store.scan("parking:slot:").unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["parking:slot:a", "parking:slot:b"]);
    }

    #[test]
    fn cas_insert_only_when_absent() {
        let (store, _dir) = open_store();
        assert!(store.compare_and_swap("k", None, Some(b"first")).unwrap());
        assert!(!store.compare_and_swap("k", None, Some(b"second")).unwrap());
        assert_eq!(store.get("k").unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn cas_replaces_matching_value() {
        let (store, _dir) = open_store();
        store.set("k", b"old").unwrap();

        assert!(!store.compare_and_swap("k", Some(b"stale"), Some(b"new")).unwrap());
        assert_eq!(store.get("k").unwrap(), Some(b"old".to_vec()));

        assert!(store.compare_and_swap("k", Some(b"old"), Some(b"new")).unwrap());
        assert_eq!(store.get("k").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn cas_can_delete() {
        let (store, _dir) = open_store();
        store.set("k", b"v").unwrap();
        assert!(store.compare_and_swap("k", Some(b"v"), None).unwrap());
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persist.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set("k", b"kept").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"kept".to_vec()));
    }
}
