//! Key-value state storage trait.

use crate::StoreError;

/// Byte-oriented storage for snapshots and bookkeeping.
///
/// Methods take `&self`; backends use interior mutability.
pub trait StateStore {
    /// The value under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Like [`get`](Self::get) but a missing key is [`StoreError::NotFound`].
    fn require(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.get(key)?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}
