//! Field identity resolution
//!
//! Assigns every candidate its canonical name. Explicit `/T` names are kept
//! verbatim; nameless candidates are matched positionally against a
//! caller-supplied coordinate-to-name table, and candidates nothing matches
//! get a synthetic name from their position in the page's annotation list.
//! Resolution never fails — completeness beats strictness here.

use super::discover::Candidate;
use crate::geometry::Point;
use crate::objects::Object;
use crate::parser::PdfDocument;
use tracing::debug;

/// Match radius for positional lookup, in PDF units
pub const DEFAULT_TOLERANCE: f64 = 50.0;

/// Entry of a coordinate-to-name table
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldMapEntry {
    pub x: f64,
    pub y: f64,
    pub name: String,
}

/// Coordinate-to-name table for positional field naming.
///
/// Entries keep their insertion order; when two entries sit at the same
/// distance from a candidate, the earlier one wins. Matching is strict:
/// a candidate exactly at the tolerance radius does not match.
#[derive(Debug, Clone)]
pub struct FieldMap {
    entries: Vec<(Point, String)>,
    tolerance: f64,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMap {
    /// An empty table with the default tolerance
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Build from entries, keeping their order
    pub fn from_entries(entries: impl IntoIterator<Item = FieldMapEntry>) -> Self {
        let mut map = Self::new();
        for entry in entries {
            map.insert(Point::new(entry.x, entry.y), entry.name);
        }
        map
    }

    /// Override the tolerance radius
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Append an entry
    pub fn insert(&mut self, position: Point, name: impl Into<String>) {
        self.entries.push((position, name.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the entry nearest to `point`, if any lies strictly within
    /// the tolerance radius
    pub fn lookup(&self, point: Point) -> Option<&str> {
        let mut best = self.tolerance;
        let mut found = None;
        for (position, name) in &self.entries {
            let distance = position.distance_to(&point);
            if distance < best {
                best = distance;
                found = Some(name.as_str());
            }
        }
        found
    }
}

/// Resolve a canonical name for every candidate.
///
/// Writes assigned names into each annotation's `/T` — a deliberate,
/// observable mutation of the shared graph, so that page annotation and
/// synthesized field agree on the name from here on.
pub fn resolve_identities(doc: &mut PdfDocument, candidates: &mut [Candidate], map: &FieldMap) {
    for (position, candidate) in candidates.iter_mut().enumerate() {
        if candidate.name.is_some() {
            continue;
        }

        let assigned = candidate
            .rect
            .and_then(|rect| map.lookup(rect.center()))
            .map(str::to_string);

        let name = match assigned {
            Some(name) => {
                debug!(name = %name, "matched candidate by position");
                name
            }
            None => {
                let index = candidate.annot_index.unwrap_or(position);
                format!("field_{index}")
            }
        };

        if let Some(dict) = doc.object_dict_mut(candidate.id) {
            dict.set("T", Object::String(name.clone()));
        }
        candidate.name = Some(name);
    }
}
