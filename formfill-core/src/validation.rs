//! Value validation
//!
//! A small rule table checks applicant values before they are written into
//! a form: the first rule whose keyword occurs in the lowercased field name
//! applies. Empty values always pass; validation is a gate the caller opts
//! into, not part of the repair core.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref CYRILLIC: Regex = Regex::new(r"[Ѐ-ӿ]").unwrap();
}

enum Check {
    /// Value must not contain Cyrillic text (identifiers, codes, numbers)
    LatinOnly,
    /// Lowercased value must be one of the listed options
    OneOf(&'static [&'static str]),
}

struct Rule {
    keywords: &'static [&'static str],
    check: Check,
}

/// Field-name keyword rules, first match wins
static RULES: &[Rule] = &[
    Rule {
        keywords: &["code", "number", "номер", "код", "id", "identifier"],
        check: Check::LatinOnly,
    },
    Rule {
        keywords: &["пол", "gender", "sex"],
        check: Check::OneOf(&["муж", "жен", "male", "female", "м", "ж"]),
    },
    Rule {
        keywords: &["семейное положение", "marital", "статус", "status"],
        check: Check::OneOf(&[
            "холост", "замужем", "женат", "разведен", "вдовец", "вдова", "single", "married",
            "divorced", "widower", "widow",
        ]),
    },
    Rule {
        keywords: &["гражданство", "национальность", "citizenship", "nationality"],
        check: Check::OneOf(&[
            "российская",
            "русская",
            "russian",
            "испанская",
            "spanish",
            "украинская",
            "украинец",
            "украинка",
            "ukrainian",
        ]),
    },
];

/// Outcome of validating one value set
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn a failed report into the crate error, carrying all messages
    pub fn ensure_valid(self) -> crate::error::Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(crate::error::FormError::ValidationFailed {
                errors: self.errors,
            })
        }
    }
}

/// Validate a single field value against the rule table. `Ok(())` when no
/// rule applies or the value passes.
pub fn validate_field(name: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    let name_lower = name.to_lowercase();

    for rule in RULES {
        if !rule.keywords.iter().any(|k| name_lower.contains(k)) {
            continue;
        }
        return match &rule.check {
            Check::LatinOnly => {
                if CYRILLIC.is_match(value) {
                    Err(format!(
                        "field '{name}' must contain only digits or latin letters, got '{value}'"
                    ))
                } else {
                    Ok(())
                }
            }
            Check::OneOf(allowed) => {
                let value_lower = value.to_lowercase();
                if allowed.contains(&value_lower.as_str()) {
                    Ok(())
                } else {
                    Err(format!(
                        "field '{name}' has unsupported value '{value}' (allowed: {})",
                        allowed.join(", ")
                    ))
                }
            }
        };
    }
    Ok(())
}

/// Validate a whole value set plus required-field presence
pub fn validate_values(
    values: &HashMap<String, String>,
    required: &[&str],
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for field in required {
        let missing = values.get(*field).map(String::is_empty).unwrap_or(true);
        if missing {
            report.errors.push(format!("missing required field: {field}"));
        }
    }

    let mut names: Vec<&String> = values.keys().collect();
    names.sort();
    for name in names {
        let value = &values[name];
        if value.is_empty() {
            if rule_applies(name) {
                report
                    .warnings
                    .push(format!("field '{name}' is empty; validation skipped"));
            }
            continue;
        }
        if let Err(message) = validate_field(name, value) {
            report.errors.push(message);
        }
    }

    report
}

fn rule_applies(name: &str) -> bool {
    let name_lower = name.to_lowercase();
    RULES
        .iter()
        .any(|rule| rule.keywords.iter().any(|k| name_lower.contains(k)))
}
