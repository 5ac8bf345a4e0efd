//! # formfill
//!
//! AcroForm structure repair and form filling for PDF documents.
//!
//! Application forms in the wild often arrive with their interactive-form
//! metadata missing, mangled, or inconsistent: the page annotations are all
//! there, but no reader can list or fill the fields. This crate rebuilds
//! the form dictionary from those raw annotations — discovering field
//! candidates, resolving canonical names (explicitly, positionally against
//! a coordinate table, or synthetically), aggregating repeated widgets,
//! synthesizing a fresh AcroForm with shared default resources, and
//! rewiring page annotations so one object serves as both the visual
//! annotation and the logical field. The result is verified by re-parsing
//! the output; when that fails, a verbatim copy of the input is produced
//! instead.
//!
//! ## Repairing a form
//!
//! ```no_run
//! use formfill::geometry::Point;
//! use formfill::repair::{repair_acroform, FieldMap, RepairOptions};
//!
//! # fn main() -> formfill::Result<()> {
//! let input = std::fs::read("declaracion.pdf")?;
//!
//! // Positional names for annotations that lost their labels
//! let mut map = FieldMap::new();
//! map.insert(Point::new(100.0, 700.0), "Nombre");
//! map.insert(Point::new(300.0, 700.0), "1er_Apellido");
//!
//! let outcome = repair_acroform(&input, &map, &RepairOptions::default())?;
//! println!("repaired {} fields", outcome.fields.len());
//! std::fs::write("declaracion_repaired.pdf", &outcome.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Filling a form
//!
//! ```no_run
//! use formfill::fill::{fill_form, FillOptions};
//! use formfill::parser::PdfDocument;
//! use std::collections::HashMap;
//!
//! # fn main() -> formfill::Result<()> {
//! let mut doc = PdfDocument::parse(&std::fs::read("declaracion_repaired.pdf")?)?;
//!
//! let mut values = HashMap::new();
//! values.insert("Nombre".to_string(), "Ana".to_string());
//!
//! let report = fill_form(&mut doc, &values, &FillOptions::new())?;
//! println!("filled: {:?}", report.filled);
//! std::fs::write("declaracion_filled.pdf", doc.to_bytes()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`repair`] - the form structure repairer
//! - [`fill`] - writing values into fields
//! - [`validation`] - keyword-rule value checks
//! - [`inspect`] - structural diagnostics
//! - [`parser`] - document loading and the object arena
//! - [`writer`] - serialization
//! - [`forms`] - AcroForm, field types and flags
//! - [`objects`] - the object model

pub mod error;
pub mod fill;
pub mod forms;
pub mod geometry;
pub mod inspect;
pub mod objects;
pub mod parser;
pub mod repair;
pub mod validation;
pub mod writer;

pub use error::{FormError, Result};
pub use fill::{fill_form, FieldMapping, FillOptions, FillReport};
pub use forms::{AcroForm, FieldFlags, FieldType};
pub use inspect::{inspect, StructureReport};
pub use parser::{ParseError, PdfDocument, PdfReader};
pub use repair::{repair_acroform, FieldMap, RepairOptions, RepairOutcome};
pub use writer::PdfWriter;
