use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationError};
use crate::model::ids::{AuthorId, BookId, GenreId, InstanceId, LanguageId};
use crate::schema::fields::{EntityDef, FieldDef};

/// The five kinds of record in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Book,
    Author,
    Genre,
    Language,
    BookInstance,
}

impl EntityKind {
    pub const ALL: [Self; 5] = [
        Self::Book,
        Self::Author,
        Self::Genre,
        Self::Language,
        Self::BookInstance,
    ];

    /// Slug used in entity references and detail paths.
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Author => "author",
            Self::Genre => "genre",
            Self::Language => "language",
            Self::BookInstance => "bookinstance",
        }
    }

    /// Human-readable singular name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Author => "author",
            Self::Genre => "genre",
            Self::Language => "language",
            Self::BookInstance => "book instance",
        }
    }

    pub const fn table(&self) -> &'static str {
        match self {
            Self::Book => "books",
            Self::Author => "authors",
            Self::Genre => "genres",
            Self::Language => "languages",
            Self::BookInstance => "book_instances",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An opaque, stable reference to one stored record.
///
/// Renders as `kind/key` (for example `book/12` or
/// `bookinstance/6f1c...`) and parses back from the same form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Book(BookId),
    Author(AuthorId),
    Genre(GenreId),
    Language(LanguageId),
    BookInstance(InstanceId),
}

impl EntityRef {
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Book(_) => EntityKind::Book,
            Self::Author(_) => EntityKind::Author,
            Self::Genre(_) => EntityKind::Genre,
            Self::Language(_) => EntityKind::Language,
            Self::BookInstance(_) => EntityKind::BookInstance,
        }
    }

    /// The record's key, without the kind prefix.
    pub fn key(&self) -> String {
        match self {
            Self::Book(id) => id.to_string(),
            Self::Author(id) => id.to_string(),
            Self::Genre(id) => id.to_string(),
            Self::Language(id) => id.to_string(),
            Self::BookInstance(id) => id.to_string(),
        }
    }

    /// Path of the record's detail page, e.g. `/catalog/book/12`.
    pub fn detail_path(&self) -> String {
        format!("/catalog/{}/{}", self.kind().slug(), self.key())
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind().slug(), self.key())
    }
}

impl FromStr for EntityRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidData(format!("not an entity reference: {s:?}"));
        let (slug, key) = s.split_once('/').ok_or_else(invalid)?;
        let kind = EntityKind::from_slug(slug).ok_or_else(invalid)?;
        let parsed = match kind {
            EntityKind::Book => key.parse().map(Self::Book).ok(),
            EntityKind::Author => key.parse().map(Self::Author).ok(),
            EntityKind::Genre => key.parse().map(Self::Genre).ok(),
            EntityKind::Language => key.parse().map(Self::Language).ok(),
            EntityKind::BookInstance => key.parse().map(Self::BookInstance).ok(),
        };
        parsed.ok_or_else(invalid)
    }
}

/// Behaviour shared by every catalog record.
pub trait Entity {
    const KIND: EntityKind;
    const FIELDS: &'static [FieldDef];

    /// Default retrieval order, as field names.
    const ORDERING: &'static [&'static str] = &[];

    /// Reference to this record, or `None` if it has not been stored yet.
    fn entity_ref(&self) -> Option<EntityRef>;

    /// Check every field against its declared constraints.
    ///
    /// Uniqueness is a property of the whole table and is checked by the
    /// database layer, not here.
    fn validate(&self) -> Result<(), ValidationError>;

    fn definition() -> EntityDef {
        EntityDef {
            kind: Self::KIND,
            fields: Self::FIELDS,
            ordering: Self::ORDERING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ref_display_and_parse() {
        let r = EntityRef::Book(BookId::new(12));
        assert_eq!(r.to_string(), "book/12");
        assert_eq!("book/12".parse::<EntityRef>().unwrap(), r);
    }

    #[test]
    fn test_entity_ref_detail_path() {
        let r = EntityRef::Author(AuthorId::new(3));
        assert_eq!(r.detail_path(), "/catalog/author/3");
    }

    #[test]
    fn test_instance_ref_round_trip() {
        let id = InstanceId::new();
        let r = EntityRef::BookInstance(id);
        assert_eq!(r.to_string(), format!("bookinstance/{id}"));
        assert_eq!(r.to_string().parse::<EntityRef>().unwrap(), r);
    }

    #[test]
    fn test_entity_ref_parse_rejects_garbage() {
        assert!("book".parse::<EntityRef>().is_err());
        assert!("shelf/1".parse::<EntityRef>().is_err());
        assert!("book/abc".parse::<EntityRef>().is_err());
        assert!("bookinstance/12".parse::<EntityRef>().is_err());
    }

    #[test]
    fn test_kind_slug_lookup() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_slug(kind.slug()), Some(kind));
        }
    }
}
