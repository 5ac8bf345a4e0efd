//! Interactive form structures (ISO 32000-1 chapter 12.7)
//!
//! The AcroForm dictionary, field types and field flags used both when
//! reading a document's advertised fields and when synthesizing a
//! replacement form during repair.

mod acroform;
mod field;

pub use acroform::AcroForm;
pub use field::{FieldFlags, FieldType};
