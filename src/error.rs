use thiserror::Error;
use crate::Link;

/// Результат операций с сетью
pub type NeuraNetResult<T> = Result<T, NeuraNetError>;

/// Ошибки сети
#[derive(Error, Debug)]
pub enum NeuraNetError {
    /// Неверные структурные параметры (размеры, формы)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Связь не проходит проверку при установке
    #[error("Invalid link #{index} {link:?}: {reason}")]
    InvalidLink {
        index: usize,
        link: Link,
        reason: String,
    },

    #[error("Index out of range for {what}: {index} (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Не удалось создать пул потоков
    #[error("Worker pool error: {0}")]
    Pool(String),
}

impl From<rayon::ThreadPoolBuildError> for NeuraNetError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        NeuraNetError::Pool(err.to_string())
    }
}
