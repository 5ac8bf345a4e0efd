//! Repair-then-fill flow
//!
//! The flow the tool exists for: take a template whose form metadata is
//! gone, repair it, fill the repaired fields from a value set, and check
//! that a fresh reader sees the values.

use formfill::fill::{fill_form, FieldMapping, FillOptions};
use formfill::geometry::Point;
use formfill::objects::{Dictionary, Object};
use formfill::parser::PdfDocument;
use formfill::repair::{repair_acroform, FieldMap, RepairOptions};
use formfill::validation::validate_values;
use std::collections::HashMap;

fn template() -> Vec<u8> {
    let mut doc = PdfDocument::empty();

    let mut annot_refs = Vec::new();
    let positions = [(100.0, 700.0), (300.0, 700.0), (100.0, 650.0)];
    for (cx, cy) in positions {
        let mut annot = Dictionary::new();
        annot.set("Type", Object::Name("Annot".to_string()));
        annot.set("Subtype", Object::Name("Widget".to_string()));
        annot.set(
            "Rect",
            Object::Array(vec![
                Object::Real(cx - 40.0),
                Object::Real(cy - 8.0),
                Object::Real(cx + 40.0),
                Object::Real(cy + 8.0),
            ]),
        );
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
            Object::Integer(595),
            Object::Integer(842),
        ]),
    );
    page.set("Annots", Object::Array(annot_refs));
    let page_id = doc.allocate(Object::Dictionary(page));

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name("Pages".to_string()));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages.set("Count", 1);
    let pages_id = doc.allocate(Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name("Catalog".to_string()));
    catalog.set("Pages", pages_id);
    let catalog_id = doc.allocate(Object::Dictionary(catalog));

    doc.trailer_mut().set("Root", catalog_id);
    doc.to_bytes().unwrap()
}

fn coordinate_map() -> FieldMap {
    let mut map = FieldMap::new();
    map.insert(Point::new(100.0, 700.0), "Nombre");
    map.insert(Point::new(300.0, 700.0), "1er_Apellido");
    map.insert(Point::new(100.0, 650.0), "Fecha_nacimiento");
    map
}

fn value_of(doc: &PdfDocument, field_name: &str) -> Option<Object> {
    doc.form_field_ids().into_iter().find_map(|id| {
        let dict = doc.object_dict(id)?;
        let name = dict.get("T").and_then(Object::as_text)?;
        if name == field_name {
            dict.get("V").cloned()
        } else {
            None
        }
    })
}

#[test]
fn repair_then_fill_then_reload() {
    let outcome =
        repair_acroform(&template(), &coordinate_map(), &RepairOptions::default()).unwrap();
    assert_eq!(
        outcome.field_names(),
        vec!["Nombre", "1er_Apellido", "Fecha_nacimiento"]
    );

    let mut doc = PdfDocument::parse(&outcome.bytes).unwrap();
    let mut values = HashMap::new();
    values.insert("Nombre".to_string(), "Ana".to_string());
    values.insert("1er_Apellido".to_string(), "García".to_string());

    let report = fill_form(&mut doc, &values, &FillOptions::new()).unwrap();
    assert_eq!(report.filled.len(), 2);
    assert!(report.unmatched.is_empty());

    let reloaded = PdfDocument::parse(&doc.to_bytes().unwrap()).unwrap();
    assert_eq!(
        value_of(&reloaded, "Nombre"),
        Some(Object::String("Ana".to_string()))
    );
    // Non-ASCII values survive serialization
    assert_eq!(
        value_of(&reloaded, "1er_Apellido"),
        Some(Object::String("García".to_string()))
    );
    assert_eq!(value_of(&reloaded, "Fecha_nacimiento"), None);
}

#[test]
fn fill_with_mapping_and_day_field() {
    let outcome =
        repair_acroform(&template(), &coordinate_map(), &RepairOptions::default()).unwrap();
    let mut doc = PdfDocument::parse(&outcome.bytes).unwrap();

    // Caller-side names differ from PDF field names
    let mut mapping = FieldMapping::new();
    mapping.insert("Имя", "Nombre");
    mapping.insert("Дата рождения", "Fecha_nacimiento");

    let mut raw = HashMap::new();
    raw.insert("Имя".to_string(), "Ana".to_string());
    raw.insert("Дата рождения".to_string(), "1985-03-07".to_string());
    raw.insert("Лишнее".to_string(), "x".to_string());

    let values = mapping.translate(&raw);
    let options = FillOptions::new().with_day_field("Fecha_nacimiento");
    let report = fill_form(&mut doc, &values, &options).unwrap();

    assert_eq!(report.filled.len(), 2);
    assert_eq!(
        value_of(&doc, "Fecha_nacimiento"),
        Some(Object::String("7".to_string()))
    );
}

#[test]
fn validation_gates_bad_values() {
    let mut values = HashMap::new();
    values.insert("Gender".to_string(), "unknown".to_string());
    values.insert("Nombre".to_string(), "Ana".to_string());

    let report = validate_values(&values, &["Nombre", "NIE"]);
    assert!(!report.is_valid());
    // One rule violation plus one missing required field
    assert_eq!(report.errors.len(), 2);

    values.insert("Gender".to_string(), "female".to_string());
    values.insert("NIE".to_string(), "Y1234567Z".to_string());
    let report = validate_values(&values, &["Nombre", "NIE"]);
    assert!(report.is_valid());
}
