//! In-memory PDF document
//!
//! [`PdfDocument`] owns the object arena: every indirect object keyed by its
//! [`ObjectId`]. Structures that share a node (a widget annotation listed in
//! a page's `/Annots` and in the AcroForm `/Fields`) hold `Reference`
//! handles into the arena, so mutating the node once is visible everywhere.
//! All repair phases operate on this one graph, in place.

use super::reader::PdfReader;
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// A parsed (and mutable) PDF document
#[derive(Debug, Clone)]
pub struct PdfDocument {
    version: String,
    objects: BTreeMap<ObjectId, Object>,
    trailer: Dictionary,
    next_number: u32,
}

impl PdfDocument {
    /// Parse a document from memory
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        PdfReader::read(data)
    }

    /// Assemble a document from already-loaded parts
    pub fn from_parts(
        version: String,
        objects: BTreeMap<ObjectId, Object>,
        trailer: Dictionary,
    ) -> Self {
        let next_number = objects.keys().map(ObjectId::number).max().unwrap_or(0) + 1;
        Self {
            version,
            objects,
            trailer,
            next_number,
        }
    }

    /// An empty document shell (used by tests and builders)
    pub fn empty() -> Self {
        Self {
            version: "1.7".to_string(),
            objects: BTreeMap::new(),
            trailer: Dictionary::new(),
            next_number: 1,
        }
    }

    /// PDF version from the header
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The trailer dictionary
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        &mut self.trailer
    }

    /// Number of objects in the arena
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Iterate all objects in ascending id order
    pub fn objects(&self) -> impl Iterator<Item = (&ObjectId, &Object)> {
        self.objects.iter()
    }

    /// Fetch an object by handle
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Fetch an object for mutation
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Convenience: object as dictionary (streams expose their dict)
    pub fn object_dict(&self, id: ObjectId) -> Option<&Dictionary> {
        self.object(id).and_then(Object::as_dict)
    }

    pub fn object_dict_mut(&mut self, id: ObjectId) -> Option<&mut Dictionary> {
        self.object_mut(id).and_then(Object::as_dict_mut)
    }

    /// Insert an object under an explicit id
    pub fn insert_object(&mut self, id: ObjectId, object: Object) {
        self.next_number = self.next_number.max(id.number() + 1);
        self.objects.insert(id, object);
    }

    /// Add an object under a fresh id and return its handle
    pub fn allocate(&mut self, object: Object) -> ObjectId {
        let id = ObjectId::new(self.next_number, 0);
        self.next_number += 1;
        self.objects.insert(id, object);
        id
    }

    /// Follow reference chains to the underlying object. Unresolvable or
    /// cyclic chains end at `Object::Null`.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        const NULL: &Object = &Object::Null;
        let mut current = object;
        let mut hops = 0;
        while let Object::Reference(id) = current {
            match self.object(*id) {
                Some(next) => current = next,
                None => return NULL,
            }
            hops += 1;
            if hops > 32 {
                warn!("reference chain exceeded depth limit");
                return NULL;
            }
        }
        current
    }

    /// Resolve to a dictionary, if the target is one
    pub fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(object).as_dict()
    }

    /// Handle of the document catalog
    pub fn root_id(&self) -> ParseResult<ObjectId> {
        self.trailer
            .get("Root")
            .and_then(Object::as_reference)
            .ok_or_else(|| ParseError::MissingKey("Root".to_string()))
    }

    /// The document catalog
    pub fn catalog(&self) -> ParseResult<&Dictionary> {
        let root = self.root_id()?;
        self.object_dict(root)
            .ok_or(ParseError::InvalidReference(root.number(), root.generation()))
    }

    pub fn catalog_mut(&mut self) -> ParseResult<&mut Dictionary> {
        let root = self.root_id()?;
        self.object_dict_mut(root)
            .ok_or(ParseError::InvalidReference(root.number(), root.generation()))
    }

    /// Flattened page list in document order (depth-first over the page
    /// tree, cycle-guarded)
    pub fn page_ids(&self) -> ParseResult<Vec<ObjectId>> {
        let catalog = self.catalog()?;
        let pages_root = catalog
            .get("Pages")
            .and_then(Object::as_reference)
            .ok_or_else(|| ParseError::MissingKey("Pages".to_string()))?;

        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        self.collect_pages(pages_root, &mut pages, &mut visited)?;
        Ok(pages)
    }

    fn collect_pages(
        &self,
        node_id: ObjectId,
        pages: &mut Vec<ObjectId>,
        visited: &mut HashSet<ObjectId>,
    ) -> ParseResult<()> {
        if !visited.insert(node_id) {
            return Err(ParseError::CircularReference);
        }
        let node = match self.object_dict(node_id) {
            Some(node) => node,
            None => {
                warn!("page tree node {node_id} missing, skipping");
                return Ok(());
            }
        };

        match node.type_name() {
            Some("Page") => pages.push(node_id),
            _ => {
                // Treat unlabeled interior nodes as /Pages; damaged files
                // drop the /Type more often than the /Kids.
                if let Some(kids) = node.get_array("Kids") {
                    let kid_ids: Vec<ObjectId> =
                        kids.iter().filter_map(Object::as_reference).collect();
                    for kid in kid_ids {
                        self.collect_pages(kid, pages, visited)?;
                    }
                } else if node.contains_key("MediaBox") || node.contains_key("Annots") {
                    // Leaf without a /Type tag
                    pages.push(node_id);
                }
            }
        }
        Ok(())
    }

    /// Number of pages
    pub fn page_count(&self) -> ParseResult<usize> {
        Ok(self.page_ids()?.len())
    }

    /// Ensure every `/Annots` entry of `page_id` is an indirect reference,
    /// promoting inline annotation dictionaries into the arena, and return
    /// the annotation handles in page order.
    pub fn promote_page_annotations(&mut self, page_id: ObjectId) -> Vec<ObjectId> {
        let entries = match self
            .object_dict(page_id)
            .and_then(|page| page.get_array("Annots"))
        {
            Some(entries) => entries.clone(),
            None => return Vec::new(),
        };

        let mut ids = Vec::with_capacity(entries.len());
        let mut rewritten = Vec::with_capacity(entries.len());
        let mut changed = false;

        for entry in entries {
            match entry {
                Object::Reference(id) => {
                    ids.push(id);
                    rewritten.push(Object::Reference(id));
                }
                Object::Dictionary(dict) => {
                    let id = self.allocate(Object::Dictionary(dict));
                    ids.push(id);
                    rewritten.push(Object::Reference(id));
                    changed = true;
                }
                other => {
                    // Keep unrecognized entries verbatim
                    rewritten.push(other);
                }
            }
        }

        if changed {
            if let Some(page) = self.object_dict_mut(page_id) {
                page.set("Annots", Object::Array(rewritten));
            }
        }
        ids
    }

    /// The interactive-form dictionary, if the catalog advertises one
    pub fn acro_form(&self) -> Option<&Dictionary> {
        let catalog = self.catalog().ok()?;
        self.resolve_dict(catalog.get("AcroForm")?)
    }

    /// The field accessor: handles of every field the AcroForm advertises,
    /// including descendants reached through `/Kids`.
    pub fn form_field_ids(&self) -> Vec<ObjectId> {
        let fields = match self.acro_form().and_then(|form| form.get_array("Fields")) {
            Some(fields) => fields.clone(),
            None => return Vec::new(),
        };

        let mut ids = Vec::new();
        let mut visited = HashSet::new();
        for entry in &fields {
            if let Some(id) = entry.as_reference() {
                self.collect_fields(id, &mut ids, &mut visited);
            }
        }
        ids
    }

    fn collect_fields(
        &self,
        id: ObjectId,
        ids: &mut Vec<ObjectId>,
        visited: &mut HashSet<ObjectId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let Some(dict) = self.object_dict(id) else {
            return;
        };
        ids.push(id);
        if let Some(kids) = dict.get_array("Kids") {
            let kid_ids: Vec<ObjectId> = kids.iter().filter_map(Object::as_reference).collect();
            for kid in kid_ids {
                self.collect_fields(kid, ids, visited);
            }
        }
    }

    /// Names of all advertised fields that carry a `/T`
    pub fn form_field_names(&self) -> Vec<String> {
        self.form_field_ids()
            .into_iter()
            .filter_map(|id| {
                self.object_dict(id)
                    .and_then(|dict| dict.get("T"))
                    .and_then(Object::as_text)
                    .map(str::to_string)
            })
            .collect()
    }

    /// Serialize the document
    pub fn to_bytes(&self) -> crate::error::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        crate::writer::PdfWriter::new_with_writer(&mut buffer).write_document(self)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_helpers::{document_with_annotations, widget};

    #[test]
    fn test_allocate_and_resolve() {
        let mut doc = PdfDocument::empty();
        let id = doc.allocate(Object::Integer(42));
        let reference = Object::Reference(id);
        assert_eq!(doc.resolve(&reference), &Object::Integer(42));

        // Dangling references resolve to null
        let dangling = Object::Reference(ObjectId::new(99, 0));
        assert!(doc.resolve(&dangling).is_null());
    }

    #[test]
    fn test_resolve_cycle_ends_at_null() {
        let mut doc = PdfDocument::empty();
        let a = doc.allocate(Object::Null);
        let b = doc.allocate(Object::Reference(a));
        doc.insert_object(a, Object::Reference(b));
        assert!(doc.resolve(&Object::Reference(a)).is_null());
    }

    #[test]
    fn test_page_walk() {
        let doc = document_with_annotations(vec![widget(Some("Name"))]);
        let pages = doc.page_ids().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(doc.page_count().unwrap(), 1);
    }

    #[test]
    fn test_promote_inline_annotations() {
        let mut doc = document_with_annotations(vec![widget(Some("A"))]);
        let page_id = doc.page_ids().unwrap()[0];

        // Append an inline annotation dictionary
        let inline = widget(Some("B"));
        let page = doc.object_dict_mut(page_id).unwrap();
        page.get_mut("Annots")
            .and_then(Object::as_array_mut)
            .unwrap()
            .push(Object::Dictionary(inline));

        let ids = doc.promote_page_annotations(page_id);
        assert_eq!(ids.len(), 2);

        // After promotion every entry is a reference into the arena
        let annots = doc
            .object_dict(page_id)
            .and_then(|p| p.get_array("Annots"))
            .unwrap();
        assert!(annots.iter().all(|e| e.as_reference().is_some()));
        assert_eq!(
            doc.object_dict(ids[1]).unwrap().get("T"),
            Some(&Object::String("B".to_string()))
        );
    }

    #[test]
    fn test_form_field_accessor_without_acroform() {
        let doc = document_with_annotations(vec![widget(Some("Name"))]);
        assert!(doc.acro_form().is_none());
        assert!(doc.form_field_ids().is_empty());
        assert!(doc.form_field_names().is_empty());
    }

    #[test]
    fn test_form_field_accessor_with_kids() {
        let mut doc = document_with_annotations(vec![]);

        let kid_id = doc.allocate(Object::Dictionary(widget(Some("Child"))));
        let mut parent = widget(Some("Parent"));
        parent.set("Kids", Object::Array(vec![Object::Reference(kid_id)]));
        let parent_id = doc.allocate(Object::Dictionary(parent));

        let mut form = Dictionary::new();
        form.set("Fields", Object::Array(vec![Object::Reference(parent_id)]));
        let form_id = doc.allocate(Object::Dictionary(form));
        doc.catalog_mut().unwrap().set("AcroForm", form_id);

        let names = doc.form_field_names();
        assert_eq!(names, vec!["Parent".to_string(), "Child".to_string()]);
    }
}
