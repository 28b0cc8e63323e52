//! Contact data model, paginated response schema and de-duplication.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FetchError;

/// Contact identifier as sent by the remote (numeric ids in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContactId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactId::Number(n) => write!(f, "{}", n),
            ContactId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    /// Remaining country fields, kept so structural comparison sees them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub phone: String,
    pub country: Country,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contact {
    pub fn new(id: i64, phone: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id: ContactId::Number(id),
            phone: phone.into(),
            country: Country {
                name: country.into(),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Canonical serialized form used for structural equality.
    ///
    /// `serde_json::Map` keeps keys sorted, so two structurally equal
    /// contacts always produce the same string.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// One page of the remote collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub results: Vec<Contact>,
    /// Cursor to the next page; `None` marks the end of data.
    pub next: Option<String>,
}

impl Page {
    /// Parse and validate a `{ results: Contact[], next: string|null }` body.
    ///
    /// Both keys must be present; a missing `next` is malformed, an explicit
    /// `null` is the end of data.
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|err| FetchError::malformed(format!("body is not JSON: {}", err)))?;

        let Value::Object(mut object) = value else {
            return Err(FetchError::malformed("expected a JSON object"));
        };

        let results = object
            .remove("results")
            .ok_or_else(|| FetchError::malformed("missing `results`"))?;
        if !results.is_array() {
            return Err(FetchError::malformed("`results` is not an array"));
        }
        let results: Vec<Contact> = serde_json::from_value(results)
            .map_err(|err| FetchError::malformed(format!("invalid contact in `results`: {}", err)))?;

        let next = match object.remove("next") {
            None => return Err(FetchError::malformed("missing `next`")),
            Some(Value::Null) => None,
            Some(Value::String(url)) if url.trim().is_empty() => None,
            Some(Value::String(url)) => Some(url),
            Some(other) => {
                return Err(FetchError::malformed(format!(
                    "`next` must be a string or null, got {}",
                    other
                )))
            }
        };

        Ok(Self { results, next })
    }
}

/// Tracks which contacts have already been accumulated.
#[derive(Debug, Default, Clone)]
pub struct DedupIndex {
    seen: HashSet<String>,
}

impl DedupIndex {
    pub fn clear(&mut self) {
        self.seen.clear();
    }

    /// Returns true the first time a structurally equal contact is offered.
    pub fn insert(&mut self, contact: &Contact) -> bool {
        self.seen.insert(contact.fingerprint())
    }

    /// Append the unseen contacts of `incoming` to `target`, first occurrence wins.
    pub fn extend_unique(&mut self, target: &mut Vec<Contact>, incoming: Vec<Contact>) -> usize {
        let before = target.len();
        for contact in incoming {
            if self.insert(&contact) {
                target.push(contact);
            }
        }
        target.len() - before
    }
}

/// Order-preserving removal of structurally equal duplicates.
pub fn dedup_contacts(contacts: Vec<Contact>) -> Vec<Contact> {
    let mut index = DedupIndex::default();
    let mut out = Vec::with_capacity(contacts.len());
    index.extend_unique(&mut out, contacts);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_with_cursor() {
        let body = r#"{
            "count": 2,
            "next": "https://example.test/api/contacts/?format=json&page=2",
            "results": [
                {"id": 1, "phone": "555-0100", "country": {"id": 7, "name": "United States"}},
                {"id": 2, "phone": "555-0101", "country": {"id": 3, "name": "Bangladesh"}}
            ]
        }"#;
        let page = Page::from_json(body).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].country.name, "United States");
        assert_eq!(page.results[0].country.extra.get("id"), Some(&Value::from(7)));
        assert_eq!(
            page.next.as_deref(),
            Some("https://example.test/api/contacts/?format=json&page=2")
        );
    }

    #[test]
    fn null_next_is_end_of_data() {
        let page = Page::from_json(r#"{"results": [], "next": null}"#).unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.next, None);
    }

    #[test]
    fn missing_fields_are_malformed() {
        assert!(matches!(
            Page::from_json(r#"{"results": []}"#),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            Page::from_json(r#"{"next": null}"#),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            Page::from_json(r#"{"results": {}, "next": null}"#),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            Page::from_json("<html>oops</html>"),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            Page::from_json(r#"{"results": [{"id": 1}], "next": null}"#),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let a = Contact::new(1, "111", "United States");
        let b = Contact::new(2, "222", "Canada");
        let c = Contact::new(3, "333", "United States");
        let out = dedup_contacts(vec![a.clone(), b.clone(), a.clone(), c.clone(), b.clone()]);
        assert_eq!(out, vec![a, b, c]);
    }

    #[test]
    fn dedup_is_idempotent() {
        let input = vec![
            Contact::new(1, "111", "United States"),
            Contact::new(1, "111", "United States"),
            Contact::new(2, "222", "Canada"),
            Contact::new(2, "222", "Canada"),
            Contact::new(3, "333", "Chile"),
        ];
        let once = dedup_contacts(input);
        let twice = dedup_contacts(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn same_id_with_different_fields_is_not_a_duplicate() {
        let a = Contact::new(1, "111", "United States");
        let b = Contact::new(1, "999", "United States");
        assert_eq!(dedup_contacts(vec![a, b]).len(), 2);
    }
}
