//! PDF parsing
//!
//! A native parser for the subset of ISO 32000-1 this crate manipulates:
//! classic cross-reference tables, indirect objects, and the document
//! structures (catalog, page tree, annotations, AcroForm) the repair core
//! rewires. Inputs are expected to be damaged; when the cross-reference
//! table is missing or lies, the reader falls back to scanning the whole
//! buffer for object bodies.

pub mod document;
pub mod lexer;
pub mod reader;
#[cfg(test)]
pub mod test_helpers;
pub mod xref;

pub use self::document::PdfDocument;
pub use self::lexer::{Lexer, Token};
pub use self::reader::PdfReader;
pub use self::xref::{XRefEntry, XRefTable};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid PDF header")]
    InvalidHeader,

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Invalid object reference: {0} {1} R")]
    InvalidReference(u32, u16),

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Invalid xref table")]
    InvalidXRef,

    #[error("Invalid trailer")]
    InvalidTrailer,

    #[error("Circular reference detected")]
    CircularReference,

    #[error("Encryption not supported")]
    EncryptionNotSupported,
}
