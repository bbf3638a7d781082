use derive_more::Display;

/// Failures of a durable key/value backend. None of these reach the user:
/// the store logs them and carries on from its in-memory mirror.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum StorageError {
    #[display(fmt = "storage read failed: {}", _0)]
    Read(String),
    #[display(fmt = "storage write failed: {}", _0)]
    Write(String),
    #[display(fmt = "stored record malformed: {}", _0)]
    Serialization(String),
}

impl std::error::Error for StorageError {}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Serialization(error.to_string())
    }
}

/// Domain rule violations raised by the pricing engine. These are shown next
/// to the offending field; the computation itself never fails.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum PricingError {
    #[display(fmt = "Margin % must be below 100.")]
    MarginOutOfRange,
}

impl std::error::Error for PricingError {}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum AppError {
    #[display(fmt = "Storage Error: {}", _0)]
    Storage(StorageError),
    #[display(fmt = "Binding Error: {}", _0)]
    Binding(String),
}

impl std::error::Error for AppError {}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        AppError::Storage(error)
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
