//! Form filling
//!
//! Writes caller-supplied values into a document's form fields by name.
//! Works on the page annotation lists, which after repair share their
//! objects with the AcroForm, so one write updates both views.

use crate::error::Result;
use crate::forms::FieldType;
use crate::objects::Object;
use crate::parser::PdfDocument;
use chrono::{Datelike, NaiveDate};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Options for a fill run
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Fields that receive only the day-of-month of an ISO date value
    pub day_fields: HashSet<String>,
}

impl FillOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a field as a day field
    pub fn with_day_field(mut self, name: impl Into<String>) -> Self {
        self.day_fields.insert(name.into());
        self
    }
}

/// Translation table from caller-side field names to PDF field names
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    entries: HashMap<String, String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `source` (the caller's name) to `target` (the PDF field name)
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.entries.insert(source.into(), target.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-key a value set to PDF field names. Values without a mapping
    /// entry are dropped.
    pub fn translate(&self, values: &HashMap<String, String>) -> HashMap<String, String> {
        values
            .iter()
            .filter_map(|(source, value)| {
                self.entries
                    .get(source)
                    .map(|target| (target.clone(), value.clone()))
            })
            .collect()
    }
}

impl From<HashMap<String, String>> for FieldMapping {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

/// Result of a fill run
#[derive(Debug, Clone, Default)]
pub struct FillReport {
    /// Field names that received a value
    pub filled: Vec<String>,
    /// Value keys that matched no field
    pub unmatched: Vec<String>,
    /// Non-fatal notes (overlong values and the like)
    pub warnings: Vec<String>,
}

/// Fill form fields by name. `values` is keyed by PDF field name; apply a
/// [`FieldMapping`] first when the caller's keys differ. Unmatched values
/// are reported, not fatal.
pub fn fill_form(
    doc: &mut PdfDocument,
    values: &HashMap<String, String>,
    options: &FillOptions,
) -> Result<FillReport> {
    let mut report = FillReport::default();
    let mut used_keys: HashSet<String> = HashSet::new();
    let mut filled_names: HashSet<String> = HashSet::new();

    // Page annotations first, then any off-page advertised fields
    let mut targets: Vec<crate::objects::ObjectId> = Vec::new();
    let mut seen = HashSet::new();
    for page_id in doc.page_ids().map_err(crate::error::FormError::from)? {
        for annot_id in doc.promote_page_annotations(page_id) {
            if seen.insert(annot_id) {
                targets.push(annot_id);
            }
        }
    }
    for field_id in doc.form_field_ids() {
        if seen.insert(field_id) {
            targets.push(field_id);
        }
    }

    for id in targets {
        let Some(dict) = doc.object_dict(id) else {
            continue;
        };
        let Some(name) = dict.get("T").and_then(Object::as_text).map(str::to_string) else {
            continue;
        };
        let Some(value) = values.get(&name) else {
            continue;
        };

        let mut value = value.clone();
        if options.day_fields.contains(&name) {
            value = extract_day(&value);
        }

        let field_type =
            FieldType::of_dict(dict).unwrap_or_else(|| FieldType::infer(dict.get_name("FT")));
        if let Some(max_len) = dict.get_integer("MaxLen") {
            if value.chars().count() as i64 > max_len {
                report.warnings.push(format!(
                    "value for '{name}' exceeds the field's maximum length of {max_len}"
                ));
            }
        }

        let Some(dict) = doc.object_dict_mut(id) else {
            continue;
        };
        match field_type {
            FieldType::Button => {
                // Check marks live in the appearance state as well
                dict.set("V", Object::Name(value.clone()));
                dict.set("AS", Object::Name(value.clone()));
            }
            _ => dict.set("V", Object::String(value.clone())),
        }
        debug!(field = %name, "filled");

        used_keys.insert(name.clone());
        if filled_names.insert(name.clone()) {
            report.filled.push(name);
        }
    }

    let mut unmatched: Vec<String> = values
        .keys()
        .filter(|key| !used_keys.contains(*key))
        .cloned()
        .collect();
    unmatched.sort();
    report.unmatched = unmatched;

    Ok(report)
}

/// Day-of-month of an ISO `YYYY-MM-DD` date, as a bare number. Values that
/// are not such a date pass through unchanged.
pub fn extract_day(value: &str) -> String {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => date.day().to_string(),
        Err(_) => value.to_string(),
    }
}
