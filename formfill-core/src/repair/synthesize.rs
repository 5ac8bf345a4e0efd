//! Structure synthesis
//!
//! Builds the replacement form: one fresh field dictionary per canonical
//! field, populated from a fixed allow-list of attributes, plus the
//! AcroForm dictionary with shared default resources. Nothing is attached
//! to the document root yet — that is the rewiring step's job.

use super::aggregate::CanonicalField;
use crate::error::Result;
use crate::forms::{AcroForm, FieldType};
use crate::objects::{Dictionary, Object, ObjectId};
use crate::parser::PdfDocument;
use tracing::warn;

/// Attribute keys copied from a representative instance into its
/// synthesized field. Everything else is dropped on purpose: viewer-specific
/// leftovers and inconsistent metadata are what broke the form in the first
/// place.
pub const FIELD_ATTRIBUTE_KEYS: &[&str] = &[
    "FT", "T", "V", "DV", "Ff", "Rect", "AP", "AS", "BS", "Border", "DA", "H", "MK", "Subtype",
    "Type", "TU", "MaxLen", "Q", "Opt", "TI", "I",
];

/// One synthesized field and where it came from
#[derive(Debug, Clone)]
pub struct SynthesizedField {
    /// Canonical name
    pub name: String,
    /// Arena handle of the new field dictionary
    pub id: ObjectId,
    /// Field type after inference
    pub field_type: FieldType,
    /// Handles of the original member annotations
    pub members: Vec<ObjectId>,
}

/// Build the new form. Returns the (unattached) AcroForm's handle and the
/// synthesized field listing, in field order.
pub fn synthesize_form(
    doc: &mut PdfDocument,
    canonical: &[CanonicalField],
) -> Result<(ObjectId, Vec<SynthesizedField>)> {
    let mut form = AcroForm::new();
    let mut fields = Vec::with_capacity(canonical.len());

    for logical in canonical {
        let representative = logical.representative();
        let source = doc
            .object_dict(representative.id)
            .cloned()
            .unwrap_or_default();

        let mut field_dict = Dictionary::new();
        for &key in FIELD_ATTRIBUTE_KEYS {
            let Some(value) = source.get(key) else {
                continue;
            };
            match checked_copy(doc, key, value) {
                Ok(copied) => field_dict.set(key, copied),
                Err(reason) => {
                    warn!(field = %logical.name, key, "skipping attribute: {reason}");
                }
            }
        }

        // The canonical name always wins over whatever the source carried
        field_dict.set("T", Object::String(logical.name.clone()));

        let field_type = match FieldType::of_dict(&field_dict) {
            Some(field_type) => field_type,
            None => {
                let declared = source.get("FT").and_then(Object::as_text);
                let inferred = FieldType::infer(declared);
                field_dict.set("FT", Object::Name(inferred.pdf_name().to_string()));
                inferred
            }
        };

        if let Some(page_id) = representative.page_id {
            field_dict.set("P", Object::Reference(page_id));
        }

        let id = doc.allocate(Object::Dictionary(field_dict));
        form.add_field(id);
        fields.push(SynthesizedField {
            name: logical.name.clone(),
            id,
            field_type,
            members: logical.members.iter().map(|m| m.id).collect(),
        });
    }

    let form_id = doc.allocate(Object::Dictionary(form.to_dict()));
    Ok((form_id, fields))
}

/// Validate one attribute before copying. A malformed value loses only
/// that attribute, never the field.
fn checked_copy(doc: &PdfDocument, key: &str, value: &Object) -> std::result::Result<Object, String> {
    if let Object::Reference(id) = value {
        if doc.object(*id).is_none() {
            return Err(format!("dangling reference {id}"));
        }
    }

    if key == "Rect" {
        let resolved = doc.resolve(value);
        let array = resolved.as_array().ok_or("rectangle is not an array")?;
        let entries: Vec<Object> = array.iter().map(|e| doc.resolve(e).clone()).collect();
        if crate::geometry::Rectangle::from_array(&entries).is_none() {
            return Err("rectangle does not hold four numbers".to_string());
        }
    }

    Ok(value.clone())
}
