//! Cross-reference rewiring
//!
//! Replaces every page annotation entry whose candidate produced a
//! synthesized field with a reference to that field, so the page's visual
//! annotation and the form's logical field are the same arena object. Then
//! attaches the finished AcroForm to the document catalog.

use super::synthesize::SynthesizedField;
use crate::error::{FormError, Result};
use crate::objects::{Object, ObjectId};
use crate::parser::PdfDocument;
use std::collections::HashMap;
use tracing::debug;

/// Rewire annotations and attach the form. Returns how many page entries
/// now point at synthesized fields.
pub fn rewire_annotations(
    doc: &mut PdfDocument,
    fields: &[SynthesizedField],
    form_id: ObjectId,
) -> Result<usize> {
    let mut replacement: HashMap<ObjectId, ObjectId> = HashMap::new();
    for field in fields {
        for member in &field.members {
            replacement.insert(*member, field.id);
        }
    }

    let mut replaced = 0;
    for page_id in doc.page_ids().map_err(FormError::from)? {
        let Some(entries) = doc
            .object_dict(page_id)
            .and_then(|page| page.get_array("Annots"))
            .cloned()
        else {
            continue;
        };

        let rewired: Vec<Object> = entries
            .into_iter()
            .map(|entry| match entry.as_reference() {
                Some(id) => match replacement.get(&id) {
                    Some(field_id) => {
                        replaced += 1;
                        Object::Reference(*field_id)
                    }
                    None => entry,
                },
                None => entry,
            })
            .collect();

        if let Some(page) = doc.object_dict_mut(page_id) {
            page.set("Annots", Object::Array(rewired));
        }
    }

    doc.catalog_mut()
        .map_err(FormError::from)?
        .set("AcroForm", Object::Reference(form_id));
    debug!(replaced, "rewired page annotations");

    Ok(replaced)
}
