use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("no distribution for context ({0}, {1})")]
    UnknownKey(String, String),
    #[error("distribution for context ({0}, {1}) has zero total weight")]
    EmptyDistribution(String, String),
    #[error("no context key starts with any priority token")]
    NoSeedFound,
    #[error("every generation attempt failed")]
    NoCandidates,
    #[error("model bytes unusable: {0}")]
    Persistence(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl ChainError {
    /// True for the outcomes that mean "stay silent this turn" rather than a fault.
    pub fn is_silence(&self) -> bool {
        matches!(self, ChainError::NoSeedFound | ChainError::NoCandidates)
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
