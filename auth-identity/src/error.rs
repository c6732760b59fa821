use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Invalid hashing parameters: {0}")]
    InvalidHashingParams(String),

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Malformed stored hash")]
    MalformedHash,

    #[error("Hashing task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, IdentityError>;
