//! Error types for drive-model

/// Result type for drive-model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in drive-model operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Item id does not split into exactly three non-empty segments
    #[error(
        "Item id '{id}' is not valid, expected the 'factoryName/repositoryName/nativeId' pattern"
    )]
    MalformedId { id: String },
}
