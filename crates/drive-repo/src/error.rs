//! Error types for drive-repo

/// Result type for drive-repo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repository operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No document with the given native id
    #[error("Document not found: {native_id}")]
    DocumentNotFound { native_id: String },

    /// Children were requested on a non-folderish document
    #[error("Document {native_id} is not folderish")]
    NotFolderish { native_id: String },

    /// Unknown lifecycle transition for the document's current state
    #[error("Cannot follow transition '{transition}' from state '{state}'")]
    InvalidTransition { transition: String, state: String },

    /// Backend-specific failure
    #[error("Repository backend error: {message}")]
    Backend { message: String },
}
