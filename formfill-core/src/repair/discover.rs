//! Field discovery
//!
//! Collects every field-bearing object of the document. The primary path
//! trusts the document's own field accessor; when nothing is advertised,
//! the fallback walks every page's annotation list and keeps the entries
//! that look like form fields.

use crate::error::{FormError, Result};
use crate::geometry::Rectangle;
use crate::objects::{Dictionary, Object, ObjectId};
use crate::parser::PdfDocument;
use std::collections::HashMap;
use tracing::debug;

/// One discovered field candidate
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Arena handle of the annotation/field object
    pub id: ObjectId,
    /// Owning page, when the object sits in some page's `/Annots`
    pub page_id: Option<ObjectId>,
    /// Index within the owning page's annotation list
    pub annot_index: Option<usize>,
    /// Explicit `/T` name, when present
    pub name: Option<String>,
    /// Bounding rectangle from `/Rect`, when well-formed
    pub rect: Option<Rectangle>,
}

/// Where each annotation handle sits: (page id, index in that page's list)
type LocationIndex = HashMap<ObjectId, (ObjectId, usize)>;

/// Discover all field candidates.
///
/// Mutates the document only by promoting inline annotation dictionaries to
/// arena objects, so every candidate has a stable handle; the traversal is
/// otherwise read-only. Fails with [`FormError::NoFieldsFound`] when both
/// paths come up empty — there is nothing to rebuild a form from.
pub fn discover_candidates(doc: &mut PdfDocument) -> Result<Vec<Candidate>> {
    let mut page_order: Vec<(ObjectId, Vec<ObjectId>)> = Vec::new();
    let mut locations: LocationIndex = HashMap::new();

    for page_id in doc.page_ids().map_err(FormError::from)? {
        let annot_ids = doc.promote_page_annotations(page_id);
        for (index, annot_id) in annot_ids.iter().enumerate() {
            locations.entry(*annot_id).or_insert((page_id, index));
        }
        page_order.push((page_id, annot_ids));
    }

    let advertised = doc.form_field_ids();
    let candidates = if !advertised.is_empty() {
        debug!(count = advertised.len(), "using advertised form fields");
        advertised
            .into_iter()
            .map(|id| make_candidate(doc, id, &locations))
            .collect()
    } else {
        debug!("no advertised fields, walking page annotations");
        let mut found = Vec::new();
        for (_, annot_ids) in &page_order {
            for annot_id in annot_ids {
                let Some(dict) = doc.object_dict(*annot_id) else {
                    continue;
                };
                if is_field_candidate(dict) {
                    found.push(make_candidate(doc, *annot_id, &locations));
                }
            }
        }
        found
    };

    if candidates.is_empty() {
        return Err(FormError::NoFieldsFound);
    }
    Ok(candidates)
}

/// A dictionary qualifies as a field candidate when it carries a field-type
/// tag or a name, or is a widget annotation (nameless widgets are resolved
/// positionally later).
fn is_field_candidate(dict: &Dictionary) -> bool {
    dict.contains_key("FT")
        || dict.contains_key("T")
        || dict.get_name("Subtype") == Some("Widget")
}

fn make_candidate(doc: &PdfDocument, id: ObjectId, locations: &LocationIndex) -> Candidate {
    let dict = doc.object_dict(id);
    let name = dict
        .and_then(|d| d.get("T"))
        .and_then(Object::as_text)
        .map(str::to_string);
    let rect = dict.and_then(|d| rect_of(doc, d));
    let location = locations.get(&id);

    Candidate {
        id,
        page_id: location.map(|(page, _)| *page),
        annot_index: location.map(|(_, index)| *index),
        name,
        rect,
    }
}

/// Read `/Rect`, resolving indirect entries
pub(crate) fn rect_of(doc: &PdfDocument, dict: &Dictionary) -> Option<Rectangle> {
    let array = doc.resolve(dict.get("Rect")?).as_array()?;
    let resolved: Vec<Object> = array
        .iter()
        .map(|entry| doc.resolve(entry).clone())
        .collect();
    Rectangle::from_array(&resolved)
}
