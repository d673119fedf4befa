use crate::error::KVError;

/// Byte-oriented key-value storage.
///
/// Keys follow a namespaced convention: `parking:slot:{id}`,
/// `parking:seq:slot_number`.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, overwriting any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool, KVError>;

    /// Scan all keys matching a prefix. Returns (key, value) pairs sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Atomically replace the value at `key` if it currently equals `expected`.
    ///
    /// `expected == None` means "key must be absent"; `new == None` deletes
    /// the key. Returns `false` without writing when the current value differs.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> Result<bool, KVError>;
}
