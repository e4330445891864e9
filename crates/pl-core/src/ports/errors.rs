use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ReaderSdkError {
    #[error("reader SDK is not initialized")]
    NotInitialized,

    #[error("discovery already in progress")]
    DiscoveryInProgress,

    #[error("reader has no resolved identifier")]
    UnresolvedReader,

    #[error("reader SDK error: {0}")]
    Sdk(String),
}

#[derive(Debug, Clone, Error)]
pub enum PreferencesError {
    #[error("storage error: {0}")]
    Storage(String),
}
