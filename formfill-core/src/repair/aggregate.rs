//! Field aggregation
//!
//! Groups resolved candidates into one logical field per canonical name.
//! Repeated widgets (the same checkbox printed in three places) collapse
//! into one field with several member instances.

use super::discover::Candidate;
use std::collections::HashMap;

/// One logical field: a canonical name plus its member instances
#[derive(Debug, Clone)]
pub struct CanonicalField {
    /// Canonical name, unique within one run
    pub name: String,
    /// Member instances in discovery order; never empty
    pub members: Vec<Candidate>,
}

impl CanonicalField {
    /// The representative instance attributes are copied from
    pub fn representative(&self) -> &Candidate {
        &self.members[0]
    }
}

/// Group candidates by canonical name. Fields come out in first-seen
/// order; members keep discovery order. Candidates must be resolved (every
/// name present) before aggregation.
pub fn aggregate_candidates(candidates: Vec<Candidate>) -> Vec<CanonicalField> {
    let mut fields: Vec<CanonicalField> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let name = candidate
            .name
            .clone()
            .expect("aggregation requires resolved candidates");
        match index.get(&name) {
            Some(&position) => fields[position].members.push(candidate),
            None => {
                index.insert(name.clone(), fields.len());
                fields.push(CanonicalField {
                    name,
                    members: vec![candidate],
                });
            }
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ObjectId;

    fn candidate(name: &str, number: u32) -> Candidate {
        Candidate {
            id: ObjectId::new(number, 0),
            page_id: None,
            annot_index: None,
            name: Some(name.to_string()),
            rect: None,
        }
    }

    #[test]
    fn test_grouping_by_name() {
        // Two annotations named "Name", one named "Email"
        let fields = aggregate_candidates(vec![
            candidate("Name", 1),
            candidate("Email", 2),
            candidate("Name", 3),
        ]);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "Name");
        assert_eq!(fields[0].members.len(), 2);
        assert_eq!(fields[1].name, "Email");
        assert_eq!(fields[1].members.len(), 1);
    }

    #[test]
    fn test_first_seen_order_and_member_order() {
        let fields = aggregate_candidates(vec![
            candidate("B", 1),
            candidate("A", 2),
            candidate("B", 3),
            candidate("C", 4),
        ]);

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);

        let member_ids: Vec<u32> = fields[0].members.iter().map(|m| m.id.number()).collect();
        assert_eq!(member_ids, vec![1, 3]);
        assert_eq!(fields[0].representative().id.number(), 1);
    }

    #[test]
    fn test_aggregation_is_idempotent_on_distinct_names() {
        let once = aggregate_candidates(vec![candidate("X", 1), candidate("Y", 2)]);
        let again = aggregate_candidates(
            once.iter()
                .map(|f| candidate(&f.name, f.representative().id.number()))
                .collect(),
        );
        assert_eq!(once.len(), again.len());
        for (a, b) in once.iter().zip(again.iter()) {
            assert_eq!(a.name, b.name);
        }
    }
}
