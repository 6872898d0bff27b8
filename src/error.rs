use std::path::PathBuf;

/// Error kinds the engine surfaces, per spec.md §7.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("{path} is already fingerprinted")]
    DuplicateIngest { path: PathBuf },

    #[error("store operation failed: {0}")]
    Store(#[source] anyhow::Error),
}
