//! Cache keys: pure functions of entity, filters, and page bounds.
//!
//! Identical filters must produce identical keys so cached results are
//! reused; the search component is always the sanitised term, never raw
//! input.

use std::fmt;

use pagination::{PageRequest, SearchTerm};

/// One segment of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Text(String),
    Number(u64),
    /// Placeholder for an absent filter, so "no search" and "search for
    /// nothing" share a key shape.
    Absent,
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
            Self::Absent => f.write_str("~"),
        }
    }
}

/// A hierarchical cache key; prefixes address whole families of entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    /// Key from explicit parts.
    #[must_use]
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    /// Whether `prefix` addresses this key.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.len() >= prefix.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, part) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(":")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// Key builders for one entity type.
#[derive(Debug, Clone, Copy)]
pub struct QueryKeys {
    entity: &'static str,
}

impl QueryKeys {
    /// Builders rooted at an entity name.
    #[must_use]
    pub const fn new(entity: &'static str) -> Self {
        Self { entity }
    }

    /// Everything cached for the entity.
    #[must_use]
    pub fn all(&self) -> QueryKey {
        QueryKey::new(vec![KeyPart::Text(self.entity.to_owned())])
    }

    /// Every list page, regardless of filters.
    #[must_use]
    pub fn lists(&self) -> QueryKey {
        QueryKey::new(vec![
            KeyPart::Text(self.entity.to_owned()),
            KeyPart::Text("list".to_owned()),
        ])
    }

    /// One list page under one filter set.
    #[must_use]
    pub fn list(&self, search: Option<&SearchTerm>, request: PageRequest) -> QueryKey {
        QueryKey::new(vec![
            KeyPart::Text(self.entity.to_owned()),
            KeyPart::Text("list".to_owned()),
            search.map_or(KeyPart::Absent, |term| KeyPart::Text(term.as_str().to_owned())),
            KeyPart::Number(request.page()),
            KeyPart::Number(request.per_page()),
        ])
    }

    /// One detail entry.
    #[must_use]
    pub fn detail(&self, id: &str) -> QueryKey {
        QueryKey::new(vec![
            KeyPart::Text(self.entity.to_owned()),
            KeyPart::Text("detail".to_owned()),
            KeyPart::Text(id.to_owned()),
        ])
    }
}
