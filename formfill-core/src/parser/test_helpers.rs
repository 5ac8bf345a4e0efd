//! Shared builders for parser and repair tests

use super::document::PdfDocument;
use crate::objects::{Dictionary, Object};

/// Catalog + single page + the given annotation objects wired into the
/// page's `/Annots`
pub fn document_with_annotations(annotations: Vec<Dictionary>) -> PdfDocument {
    let mut doc = PdfDocument::empty();

    let mut annot_refs = Vec::new();
    for annot in annotations {
        let id = doc.allocate(Object::Dictionary(annot));
        annot_refs.push(Object::Reference(id));
    }

    let mut page = Dictionary::new();
    page.set("Type", Object::Name("Page".to_string()));
    page.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
    );
    page.set("Annots", Object::Array(annot_refs));
    let page_id = doc.allocate(Object::Dictionary(page));

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name("Pages".to_string()));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages.set("Count", 1);
    let pages_id = doc.allocate(Object::Dictionary(pages));

    if let Some(page) = doc.object_dict_mut(page_id) {
        page.set("Parent", pages_id);
    }

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name("Catalog".to_string()));
    catalog.set("Pages", pages_id);
    let catalog_id = doc.allocate(Object::Dictionary(catalog));

    doc.trailer_mut().set("Root", catalog_id);
    doc
}

/// A widget annotation dictionary, optionally named
pub fn widget(name: Option<&str>) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name("Annot".to_string()));
    dict.set("Subtype", Object::Name("Widget".to_string()));
    if let Some(name) = name {
        dict.set("T", name);
    }
    dict
}

/// A widget annotation with a `/Rect` centered on the given point
pub fn widget_at(name: Option<&str>, cx: f64, cy: f64) -> Dictionary {
    let mut dict = widget(name);
    dict.set(
        "Rect",
        Object::Array(vec![
            Object::Real(cx - 50.0),
            Object::Real(cy - 10.0),
            Object::Real(cx + 50.0),
            Object::Real(cy + 10.0),
        ]),
    );
    dict
}
