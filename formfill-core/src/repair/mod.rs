//! AcroForm structure repair
//!
//! Rebuilds a usable interactive form from raw page annotations when a
//! document's form metadata is missing, malformed, or inconsistent. The
//! work runs as a fixed pipeline over one in-memory object graph:
//!
//! 1. **Discovery** — find every field-bearing object, from the document's
//!    own field accessor or by walking page annotations.
//! 2. **Identity resolution** — canonical names: explicit `/T`, positional
//!    lookup in a caller-supplied coordinate table, or a synthetic
//!    fallback.
//! 3. **Aggregation** — one logical field per name.
//! 4. **Synthesis** — fresh field dictionaries from an attribute
//!    allow-list, plus the AcroForm with shared default resources.
//! 5. **Rewiring** — page annotations and form fields become the same
//!    arena objects; the form is attached to the catalog.
//! 6. **Verification** — serialize, re-parse, and confirm the fields are
//!    discoverable; otherwise fall back to a verbatim re-serialization of
//!    the input.
//!
//! # Example
//!
//! ```no_run
//! use formfill::geometry::Point;
//! use formfill::repair::{repair_acroform, FieldMap, RepairOptions};
//!
//! # fn main() -> formfill::Result<()> {
//! let input = std::fs::read("broken_form.pdf")?;
//!
//! let mut map = FieldMap::new();
//! map.insert(Point::new(100.0, 700.0), "Nombre");
//! map.insert(Point::new(300.0, 700.0), "1er_Apellido");
//!
//! let outcome = repair_acroform(&input, &map, &RepairOptions::default())?;
//! for field in &outcome.fields {
//!     println!("{} ({}) x{}", field.name, field.field_type, field.instances);
//! }
//! std::fs::write("repaired.pdf", &outcome.bytes)?;
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod discover;
mod resolve;
mod rewire;
mod synthesize;

pub use aggregate::{aggregate_candidates, CanonicalField};
pub use discover::{discover_candidates, Candidate};
pub use resolve::{resolve_identities, FieldMap, FieldMapEntry, DEFAULT_TOLERANCE};
pub use rewire::rewire_annotations;
pub use synthesize::{synthesize_form, SynthesizedField, FIELD_ATTRIBUTE_KEYS};

use crate::error::{FormError, Result};
use crate::forms::FieldType;
use crate::parser::PdfDocument;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Options for a repair run
#[derive(Debug, Clone)]
pub struct RepairOptions {
    /// Re-parse the output and confirm fields are discoverable. When the
    /// check fails, the outcome degrades to a verbatim copy of the input.
    pub verify: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self { verify: true }
    }
}

impl RepairOptions {
    /// Toggle output verification
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

/// One field of the repaired document
#[derive(Debug, Clone)]
pub struct RepairedField {
    /// Canonical name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
    /// Number of annotation instances aggregated into this field
    pub instances: usize,
}

/// Result of a repair run
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// Serialized output: the repaired document, or on the degraded
    /// fallback path a verbatim re-serialization of the input
    pub bytes: Vec<u8>,
    /// Field listing of the output
    pub fields: Vec<RepairedField>,
    /// Whether the degraded fallback produced the output
    pub used_fallback: bool,
    /// Non-fatal notes collected along the way
    pub warnings: Vec<String>,
}

impl RepairOutcome {
    /// Names of the output's fields, in field order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Repair the interactive-form structure of `input`.
///
/// `map` supplies positional names for annotations without a `/T`; pass an
/// empty map to rely on explicit and synthetic names only.
pub fn repair_acroform(
    input: &[u8],
    map: &FieldMap,
    options: &RepairOptions,
) -> Result<RepairOutcome> {
    let original = PdfDocument::parse(input)?;
    let mut doc = original.clone();
    let mut warnings = Vec::new();

    let mut candidates = discover_candidates(&mut doc)?;
    debug!(candidates = candidates.len(), "discovery complete");

    resolve_identities(&mut doc, &mut candidates, map);
    let canonical = aggregate_candidates(candidates);
    debug!(fields = canonical.len(), "aggregation complete");

    let (form_id, synthesized) = synthesize_form(&mut doc, &canonical)?;
    rewire_annotations(&mut doc, &synthesized, form_id)?;

    let fields: Vec<RepairedField> = synthesized
        .iter()
        .map(|field| RepairedField {
            name: field.name.clone(),
            field_type: field.field_type,
            instances: field.members.len(),
        })
        .collect();

    let bytes = doc.to_bytes()?;

    if !options.verify {
        return Ok(RepairOutcome {
            bytes,
            fields,
            used_fallback: false,
            warnings,
        });
    }

    let expected: HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    match read_back_fields(&bytes, &expected) {
        Ok(read_back) => {
            debug!(fields = read_back.len(), "verification passed");
            Ok(RepairOutcome {
                bytes,
                fields,
                used_fallback: false,
                warnings,
            })
        }
        Err(reason) => {
            warn!("verification failed ({reason}), writing verbatim copy");
            warnings.push(format!(
                "synthesized form failed verification ({reason}); wrote a verbatim copy instead"
            ));
            degraded_fallback(&original, warnings)
        }
    }
}

/// Serialize the untouched input graph and verify it once. A second
/// failure here is terminal for the document.
fn degraded_fallback(original: &PdfDocument, warnings: Vec<String>) -> Result<RepairOutcome> {
    let bytes = original.to_bytes()?;

    let reloaded = PdfDocument::parse(&bytes).map_err(|err| {
        FormError::VerificationFailed(format!("fallback copy does not re-parse: {err}"))
    })?;
    let fields = field_listing(&reloaded);
    if fields.is_empty() {
        return Err(FormError::VerificationFailed(
            "fallback copy exposes no form fields".to_string(),
        ));
    }

    Ok(RepairOutcome {
        bytes,
        fields,
        used_fallback: true,
        warnings,
    })
}

/// Re-parse serialized output and check its advertised fields against the
/// names synthesis produced.
fn read_back_fields(
    bytes: &[u8],
    expected: &HashSet<&str>,
) -> std::result::Result<Vec<RepairedField>, String> {
    let reloaded =
        PdfDocument::parse(bytes).map_err(|err| format!("output does not re-parse: {err}"))?;

    let fields = field_listing(&reloaded);
    if fields.is_empty() {
        return Err("field accessor returned nothing".to_string());
    }
    if !fields.iter().any(|f| expected.contains(f.name.as_str())) {
        return Err("no expected field name is discoverable".to_string());
    }
    Ok(fields)
}

/// Field listing as a fresh reader would see it
fn field_listing(doc: &PdfDocument) -> Vec<RepairedField> {
    doc.form_field_ids()
        .into_iter()
        .filter_map(|id| {
            let dict = doc.object_dict(id)?;
            let name = dict.get("T").and_then(crate::objects::Object::as_text)?;
            let field_type =
                FieldType::of_dict(dict).unwrap_or_else(|| FieldType::infer(dict.get_name("FT")));
            Some(RepairedField {
                name: name.to_string(),
                field_type,
                instances: 1,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::objects::{Dictionary, Object};
    use crate::parser::test_helpers::{document_with_annotations, widget, widget_at};

    fn spanish_map() -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(Point::new(100.0, 700.0), "Nombre");
        map.insert(Point::new(300.0, 700.0), "1er_Apellido");
        map
    }

    #[test]
    fn test_repair_names_superset_of_explicit_names() {
        let doc = document_with_annotations(vec![
            widget(Some("Name")),
            widget(Some("Email")),
            widget_at(None, 1000.0, 1000.0),
        ]);
        let input = doc.to_bytes().unwrap();

        let outcome =
            repair_acroform(&input, &FieldMap::new(), &RepairOptions::default()).unwrap();
        assert!(!outcome.used_fallback);

        let names = outcome.field_names();
        assert!(names.contains(&"Name"));
        assert!(names.contains(&"Email"));
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_repair_aggregates_repeated_names() {
        // Two annotations named "Name" and one named "Email"
        let doc = document_with_annotations(vec![
            widget(Some("Name")),
            widget(Some("Name")),
            widget(Some("Email")),
        ]);
        let input = doc.to_bytes().unwrap();

        let outcome =
            repair_acroform(&input, &FieldMap::new(), &RepairOptions::default()).unwrap();
        assert_eq!(outcome.fields.len(), 2);
        assert_eq!(outcome.fields[0].name, "Name");
        assert_eq!(outcome.fields[0].instances, 2);
        assert_eq!(outcome.fields[1].name, "Email");
        assert_eq!(outcome.fields[1].instances, 1);
    }

    #[test]
    fn test_repair_resolves_positions() {
        let doc = document_with_annotations(vec![
            widget_at(None, 100.0, 700.0),
            widget_at(None, 305.0, 698.0),
        ]);
        let input = doc.to_bytes().unwrap();

        let outcome = repair_acroform(&input, &spanish_map(), &RepairOptions::default()).unwrap();
        assert_eq!(outcome.field_names(), vec!["Nombre", "1er_Apellido"]);
    }

    #[test]
    fn test_repair_far_annotation_gets_synthetic_name() {
        let doc = document_with_annotations(vec![widget_at(None, 1000.0, 1000.0)]);
        let input = doc.to_bytes().unwrap();

        let outcome = repair_acroform(&input, &spanish_map(), &RepairOptions::default()).unwrap();
        assert_eq!(outcome.field_names(), vec!["field_0"]);
    }

    #[test]
    fn test_repair_without_any_fields_fails() {
        let mut link = Dictionary::new();
        link.set("Subtype", Object::Name("Link".to_string()));
        let doc = document_with_annotations(vec![link]);
        let input = doc.to_bytes().unwrap();

        assert!(matches!(
            repair_acroform(&input, &FieldMap::new(), &RepairOptions::default()),
            Err(FormError::NoFieldsFound)
        ));
    }

    #[test]
    fn test_repair_roundtrip_field_names_match() {
        let doc = document_with_annotations(vec![
            widget_at(Some("A"), 100.0, 100.0),
            widget_at(Some("B"), 100.0, 200.0),
        ]);
        let input = doc.to_bytes().unwrap();

        let outcome =
            repair_acroform(&input, &FieldMap::new(), &RepairOptions::default()).unwrap();
        let reloaded = PdfDocument::parse(&outcome.bytes).unwrap();
        assert_eq!(
            reloaded.form_field_names(),
            outcome
                .field_names()
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_repair_twice_is_idempotent() {
        let doc = document_with_annotations(vec![
            widget(Some("Name")),
            widget(Some("Name")),
            widget(Some("Email")),
        ]);
        let input = doc.to_bytes().unwrap();

        let first =
            repair_acroform(&input, &FieldMap::new(), &RepairOptions::default()).unwrap();
        let second =
            repair_acroform(&first.bytes, &FieldMap::new(), &RepairOptions::default()).unwrap();
        let third =
            repair_acroform(&second.bytes, &FieldMap::new(), &RepairOptions::default()).unwrap();

        // The canonical field set is stable across passes
        assert_eq!(first.field_names(), second.field_names());
        assert_eq!(second.field_names(), third.field_names());
        // Once the form is canonical, passes agree on instance counts too
        let counts_second: Vec<usize> = second.fields.iter().map(|f| f.instances).collect();
        let counts_third: Vec<usize> = third.fields.iter().map(|f| f.instances).collect();
        assert_eq!(counts_second, counts_third);
    }

    #[test]
    fn test_read_back_rejects_formless_output() {
        let doc = document_with_annotations(vec![widget(Some("Name"))]);
        let bytes = doc.to_bytes().unwrap();
        let expected: HashSet<&str> = ["Name"].into_iter().collect();
        // No AcroForm was ever attached, so the accessor sees nothing
        assert!(read_back_fields(&bytes, &expected).is_err());
    }

    #[test]
    fn test_fallback_verbatim_copy_with_usable_original() {
        // The original already advertises a form; a verbatim copy passes
        // the one-shot re-verification
        let mut doc = document_with_annotations(vec![widget(Some("Kept"))]);
        let mut candidates = discover_candidates(&mut doc).unwrap();
        resolve_identities(&mut doc, &mut candidates, &FieldMap::new());
        let canonical = aggregate_candidates(candidates);
        let (form_id, fields) = synthesize_form(&mut doc, &canonical).unwrap();
        rewire_annotations(&mut doc, &fields, form_id).unwrap();

        let outcome = degraded_fallback(&doc, vec!["forced".to_string()]).unwrap();
        assert!(outcome.used_fallback);
        assert_eq!(outcome.field_names(), vec!["Kept"]);
        assert_eq!(outcome.warnings, vec!["forced".to_string()]);

        // The copy is structurally the original
        let reloaded = PdfDocument::parse(&outcome.bytes).unwrap();
        assert_eq!(reloaded.object_count(), doc.object_count());
    }

    #[test]
    fn test_fallback_fails_when_original_has_no_form() {
        let doc = document_with_annotations(vec![widget(Some("Name"))]);
        assert!(matches!(
            degraded_fallback(&doc, Vec::new()),
            Err(FormError::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_repair_skipping_verification() {
        let doc = document_with_annotations(vec![widget(Some("X"))]);
        let input = doc.to_bytes().unwrap();

        let options = RepairOptions::default().with_verification(false);
        let outcome = repair_acroform(&input, &FieldMap::new(), &options).unwrap();
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.field_names(), vec!["X"]);
    }
}
