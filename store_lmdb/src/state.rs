//! LMDB implementation of StateStore.

use std::path::Path;

use puddel_store::{StateStore, StoreError};

use crate::environment::DEFAULT_MAP_SIZE;
use crate::{LmdbEnvironment, LmdbError};

/// LMDB's default limit on key length.
const MAX_KEY_LEN: usize = 511;

pub struct LmdbStateStore {
    environment: LmdbEnvironment,
}

impl LmdbStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_map_size(path, DEFAULT_MAP_SIZE)
    }

    pub fn with_map_size(path: impl AsRef<Path>, map_size: usize) -> Result<Self, StoreError> {
        let environment = LmdbEnvironment::open(path.as_ref(), map_size)?;
        Ok(Self { environment })
    }

    pub fn path(&self) -> &Path {
        self.environment.path()
    }
}

fn checked(key: &str) -> Result<&str, LmdbError> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(LmdbError::InvalidKey(key.to_string()));
    }
    Ok(key)
}

impl StateStore for LmdbStateStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let key = checked(key)?;
        let env = &self.environment;
        let rtxn = env.env.read_txn().map_err(LmdbError::from)?;
        let value = env.state_db.get(&rtxn, key).map_err(LmdbError::from)?;
        Ok(value.map(<[u8]>::to_vec))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let key = checked(key)?;
        let env = &self.environment;
        let mut wtxn = env.env.write_txn().map_err(LmdbError::from)?;
        env.state_db
            .put(&mut wtxn, key, value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = checked(key)?;
        let env = &self.environment;
        let mut wtxn = env.env.write_txn().map_err(LmdbError::from)?;
        env.state_db
            .delete(&mut wtxn, key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStateStore::open(dir.path().join("snap")).unwrap();
        assert_eq!(store.get("protocol/state").unwrap(), None);

        store.put("protocol/state", b"abc").unwrap();
        assert_eq!(store.get("protocol/state").unwrap(), Some(b"abc".to_vec()));
        assert!(store.path().join("data.mdb").is_file());

        store.put("protocol/state", b"xyz").unwrap();
        assert_eq!(store.require("protocol/state").unwrap(), b"xyz".to_vec());

        store.delete("protocol/state").unwrap();
        store.delete("protocol/state").unwrap();
        assert!(matches!(store.require("protocol/state"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LmdbStateStore::open(dir.path()).unwrap();
            store.put("protocol/snapshot_version", &[1, 0, 0, 0]).unwrap();
        }
        let store = LmdbStateStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get("protocol/snapshot_version").unwrap(),
            Some(vec![1, 0, 0, 0])
        );
    }

    #[test]
    fn unusable_keys_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStateStore::open(dir.path()).unwrap();
        let long = "k".repeat(MAX_KEY_LEN + 1);
        for key in ["", long.as_str()] {
            assert!(matches!(store.put(key, b"x"), Err(StoreError::Backend(_))));
            assert!(matches!(store.get(key), Err(StoreError::Backend(_))));
        }
    }
}
