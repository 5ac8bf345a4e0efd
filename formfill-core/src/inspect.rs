//! Structural inspection
//!
//! A read-only diagnostic pass over a document: what the object graph
//! advertises (pages, annotations, AcroForm, XFA) next to what the raw
//! bytes suggest (field markers found by pattern matching). The gap between
//! the two is usually where a broken form hides.

use crate::error::Result;
use crate::forms::{FieldFlags, FieldType};
use crate::objects::Object;
use crate::parser::PdfDocument;
use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    static ref TEXT_MARKER: Regex = Regex::new(r"(?-u)/Tx\b").unwrap();
    static ref BUTTON_MARKER: Regex = Regex::new(r"(?-u)/Btn\b").unwrap();
    static ref NAME_MARKER: Regex = Regex::new(r"(?-u)/T\s*\(([^)]*)\)").unwrap();
    static ref VALUE_MARKER: Regex = Regex::new(r"(?-u)/V\s*\(([^)]*)\)").unwrap();
}

/// Raw-byte field markers, counted without parsing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerCounts {
    /// `/Tx` occurrences (text field type tags)
    pub text_fields: usize,
    /// `/Btn` occurrences (button field type tags)
    pub buttons: usize,
    /// `/T (...)` occurrences (field names)
    pub field_names: usize,
    /// `/V (...)` occurrences (field values)
    pub field_values: usize,
}

/// One advertised field
#[derive(Debug, Clone)]
pub struct FieldSummary {
    pub name: String,
    pub field_type: Option<FieldType>,
    pub flags: FieldFlags,
    pub has_value: bool,
}

/// Structural report for one document
#[derive(Debug, Clone)]
pub struct StructureReport {
    /// Header version
    pub version: String,
    /// Number of pages
    pub page_count: usize,
    /// Annotation count per page, in page order
    pub annotations_per_page: Vec<usize>,
    /// Whether the catalog advertises an AcroForm
    pub has_acro_form: bool,
    /// Whether the AcroForm carries XFA data (XML Forms Architecture)
    pub is_xfa: bool,
    /// Fields the accessor can see
    pub fields: Vec<FieldSummary>,
    /// Raw marker counts over the input bytes
    pub markers: MarkerCounts,
    /// First few field names seen in the raw bytes
    pub name_samples: Vec<String>,
}

impl StructureReport {
    /// The usual symptom this tool exists for: the bytes clearly contain
    /// named fields, but the accessor comes up empty.
    pub fn looks_repairable(&self) -> bool {
        self.fields.is_empty() && self.markers.field_names > 0
    }
}

/// Inspect a document without modifying it
pub fn inspect(data: &[u8]) -> Result<StructureReport> {
    let doc = PdfDocument::parse(data)?;

    let page_ids = doc.page_ids().map_err(crate::error::FormError::from)?;
    let annotations_per_page = page_ids
        .iter()
        .map(|page_id| {
            doc.object_dict(*page_id)
                .and_then(|page| page.get_array("Annots"))
                .map(Vec::len)
                .unwrap_or(0)
        })
        .collect();

    let acro_form = doc.acro_form();
    let is_xfa = acro_form.map(|form| form.contains_key("XFA")).unwrap_or(false);

    let fields = doc
        .form_field_ids()
        .into_iter()
        .filter_map(|id| {
            let dict = doc.object_dict(id)?;
            let name = dict.get("T").and_then(Object::as_text)?;
            Some(FieldSummary {
                name: name.to_string(),
                field_type: FieldType::of_dict(dict),
                flags: FieldFlags::of_dict(dict),
                has_value: dict.contains_key("V"),
            })
        })
        .collect();

    let markers = MarkerCounts {
        text_fields: TEXT_MARKER.find_iter(data).count(),
        buttons: BUTTON_MARKER.find_iter(data).count(),
        field_names: NAME_MARKER.find_iter(data).count(),
        field_values: VALUE_MARKER.find_iter(data).count(),
    };

    let name_samples = NAME_MARKER
        .captures_iter(data)
        .take(5)
        .map(|c| String::from_utf8_lossy(&c[1]).to_string())
        .collect();

    Ok(StructureReport {
        version: doc.version().to_string(),
        page_count: page_ids.len(),
        annotations_per_page,
        has_acro_form: acro_form.is_some(),
        is_xfa,
        fields,
        markers,
        name_samples,
    })
}
