use thiserror::Error;

#[derive(Debug, Error)]
pub enum MesaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("GenBank error: {0}")]
    GenBank(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
}

impl MesaError {
    pub fn not_found(message: impl Into<String>) -> Self {
        MesaError::NotFound(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        MesaError::InvalidInput(message.into())
    }
}

pub type MesaResult<T> = Result<T, MesaError>;
