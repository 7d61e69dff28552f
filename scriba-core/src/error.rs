use thiserror::Error;

/// All errors produced by scriba-core.
#[derive(Debug, Error)]
pub enum ScribaError {
    #[error("pipeline is not prepared, call prepare() before process()")]
    NotPrepared,

    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("recognition error: {0}")]
    Recognition(String),

    #[error("model file not found: {}", path.display())]
    ModelNotFound { path: std::path::PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ScribaError>;
