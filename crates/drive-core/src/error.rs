//! Error types for drive-core

/// Result type for drive-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in projection and change-feed operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Id references a factory name not currently registered, or the
    /// factory declines the id shape. May be transient right after a
    /// reconfiguration; callers may retry once.
    #[error("No factory found for item id with factory name '{name}'")]
    UnknownFactory { name: String },

    /// The audit query would return at least `limit` rows. Folded into
    /// `ChangeSummary::too_many_changes` by the engine, never surfaced to
    /// clients as an error.
    #[error("Change query hit the configured limit of {limit} rows")]
    TooManyChanges { limit: usize },

    /// An item's ancestor chain cannot be traced to any registered
    /// synchronization root. Scoped to the single item being resolved.
    #[error("Cannot find a registered synchronization root above document '{native_id}' (path: {path})")]
    RootlessItem { native_id: String, path: String },

    /// The configuration defines no enabled top-level factory
    #[error("No enabled top-level factory contribution")]
    NoTopLevelFactory,

    /// Children were requested on a non-folder item
    #[error("Item {id} is not a folder")]
    NotAFolder { id: String },

    /// Id references a repository the engine does not know
    #[error("Unknown repository: {name}")]
    UnknownRepository { name: String },

    // Transparent wrappers for underlying crate errors
    /// Item model / id codec error from drive-model
    #[error(transparent)]
    Model(#[from] drive_model::Error),

    /// Repository backend error from drive-repo
    #[error(transparent)]
    Repo(#[from] drive_repo::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}
