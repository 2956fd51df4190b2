//! LMDB environment setup.

use std::path::{Path, PathBuf};

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use tracing::debug;

use crate::LmdbError;

/// Snapshots are a few hundred kilobytes; this leaves ample headroom.
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

const STATE_DB: &str = "state";

/// An open LMDB environment with its database handles.
pub struct LmdbEnvironment {
    pub(crate) env: Env,
    pub(crate) state_db: Database<Str, Bytes>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an environment in `path`, creating the directory if needed.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|source| LmdbError::Directory {
            path: path.display().to_string(),
            source,
        })?;

        // SAFETY: the environment is opened once per directory and the files
        // are not modified by anything outside LMDB while it is open.
        let env = unsafe { EnvOpenOptions::new().map_size(map_size).max_dbs(1).open(path)? };

        let mut wtxn = env.write_txn()?;
        let state_db: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(STATE_DB))?;
        wtxn.commit()?;

        debug!(target: "store", path = %path.display(), map_size, "LMDB environment opened");
        Ok(Self {
            env,
            state_db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
