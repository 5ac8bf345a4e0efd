use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] crate::parser::ParseError),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),

    #[error("No form fields found in document")]
    NoFieldsFound,

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Validation failed with {} error(s)", .errors.len())]
    ValidationFailed { errors: Vec<String> },
}

pub type Result<T> = std::result::Result<T, FormError>;
