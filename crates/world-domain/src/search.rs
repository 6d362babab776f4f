//! In-memory matching for the global search

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::entities::EntityRecord;
use crate::error::DomainError;
use crate::resource::FieldAccess;
use crate::value_objects::EntityKind;

/// Fields a search term is matched against
pub const SEARCH_FIELDS: [&str; 3] = ["name", "description", "title"];

/// Which kinds a search admits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Kind(EntityKind),
}

impl TypeFilter {
    pub fn admits(&self, kind: EntityKind) -> bool {
        match self {
            Self::All => true,
            Self::Kind(wanted) => *wanted == kind,
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Kind(kind) => write!(f, "{}", kind),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<EntityKind>().map(Self::Kind)
    }
}

/// One search result, tagged with the kind it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(rename = "typeName")]
    pub type_name: &'static str,
    #[serde(flatten)]
    pub record: EntityRecord,
}

impl SearchHit {
    pub fn new(kind: EntityKind, record: EntityRecord) -> Self {
        Self {
            kind,
            type_name: kind.display_name(),
            record,
        }
    }

    /// Best display label: name, then title
    pub fn label(&self) -> &str {
        self.record
            .field_text("name")
            .or_else(|| self.record.field_text("title"))
            .unwrap_or_default()
    }
}

/// Case-insensitive substring match on name, description or title
pub fn matches_term<R: FieldAccess>(record: &R, term: &str) -> bool {
    let needle = term.to_lowercase();
    SEARCH_FIELDS.iter().any(|field| {
        record
            .field_text(field)
            .is_some_and(|text| text.to_lowercase().contains(&needle))
    })
}

/// Keep hits admitted by `filter` whose text matches `term`
pub fn filter_hits(hits: Vec<SearchHit>, term: &str, filter: TypeFilter) -> Vec<SearchHit> {
    hits.into_iter()
        .filter(|hit| filter.admits(hit.kind) && matches_term(&hit.record, term))
        .collect()
}
