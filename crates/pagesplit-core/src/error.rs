use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("No source document supplied")]
    MissingInput,

    #[error("Invalid page range: {0}")]
    InvalidRangeToken(String),

    #[error("Invalid split policy: {0}")]
    InvalidPolicy(String),

    #[error("Failed to load PDF: {0}")]
    LoadFailure(String),

    #[error("Page {0} not found")]
    PageNotFound(u32),

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Failed to write PDF: {0}")]
    SerializationFailure(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}
