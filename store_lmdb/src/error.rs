use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("cannot prepare {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid key {0:?}")]
    InvalidKey(String),
}

impl From<LmdbError> for puddel_store::StoreError {
    fn from(e: LmdbError) -> Self {
        puddel_store::StoreError::Backend(e.to_string())
    }
}
