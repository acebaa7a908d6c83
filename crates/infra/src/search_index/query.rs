//! Minimal query-string parsing for the in-memory index.
//!
//! Grammar: whitespace-separated terms, any of which may match (OR).
//! `field:value` restricts a term to one field; a bare `*` (or an empty
//! query) matches every document.

use super::r#trait::IndexError;

/// Fields copied into the index for every record.
pub const INDEXED_FIELDS: [&str; 4] = ["id", "name", "quantity", "status"];

/// Fields matched by substring; the others must match the whole value.
const TEXT_FIELDS: [&str; 1] = ["name"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    field: Option<&'static str>,
    value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Empty means "match all".
    terms: Vec<Term>,
}

impl SearchQuery {
    pub fn parse(input: &str) -> Result<Self, IndexError> {
        let mut terms = Vec::new();
        for raw in input.split_whitespace() {
            if raw == "*" {
                return Ok(Self::match_all());
            }
            let term = match raw.split_once(':') {
                Some((field, value)) => {
                    let field = INDEXED_FIELDS
                        .iter()
                        .copied()
                        .find(|f| f.eq_ignore_ascii_case(field))
                        .ok_or_else(|| IndexError::InvalidQuery(format!("unknown field '{field}'")))?;
                    if value.is_empty() {
                        return Err(IndexError::InvalidQuery(format!("missing value for '{field}'")));
                    }
                    Term {
                        field: Some(field),
                        value: value.to_lowercase(),
                    }
                }
                None => Term {
                    field: None,
                    value: raw.to_lowercase(),
                },
            };
            terms.push(term);
        }
        Ok(Self { terms })
    }

    pub fn match_all() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn is_match_all(&self) -> bool {
        self.terms.is_empty()
    }

    /// `fields` holds `(field, lowercased value)` pairs as produced at index time.
    pub fn matches(&self, fields: &[(&'static str, String)]) -> bool {
        if self.is_match_all() {
            return true;
        }
        self.terms.iter().any(|term| {
            fields
                .iter()
                .filter(|(name, _)| term.field.is_none_or(|f| f == *name))
                .any(|(name, value)| term_matches(term, name, value))
        })
    }
}

fn term_matches(term: &Term, field: &str, value: &str) -> bool {
    if term.value == "*" {
        return true;
    }
    if TEXT_FIELDS.contains(&field) {
        value.contains(term.value.as_str())
    } else {
        value == term.value
    }
}
