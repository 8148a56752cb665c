use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::ValidationError;
use crate::model::entity::{Entity, EntityKind, EntityRef};
use crate::model::ids::{AuthorId, BookId, GenreId, LanguageId};
use crate::schema::fields::{FieldDef, FieldKind, OnDelete};

/// Length of an ISBN-13, in characters.
pub const ISBN_LENGTH: usize = 13;

const ID: FieldDef = FieldDef::text("id", "ID")
    .kind(FieldKind::AutoKey)
    .primary_key();
const TITLE: FieldDef = FieldDef::text("title", "Title").max_length(200);
const SUMMARY: FieldDef = FieldDef::text("summary", "Summary")
    .max_length(600)
    .optional();
const ISBN: FieldDef = FieldDef::text("isbn", "ISBN")
    .max_length(ISBN_LENGTH)
    .exact_length(ISBN_LENGTH)
    .unique()
    .help_text("13 Character ISBN number");
const AUTHOR: FieldDef = FieldDef::text("author", "Author")
    .kind(FieldKind::ForeignKey)
    .optional()
    .relation(EntityKind::Author, OnDelete::SetNull);
const GENRES: FieldDef = FieldDef::text("genres", "Genres")
    .kind(FieldKind::ManyToMany)
    .optional()
    .relation(EntityKind::Genre, OnDelete::Cascade);
const LANGUAGE: FieldDef = FieldDef::text("language", "Language")
    .kind(FieldKind::ForeignKey)
    .optional()
    .relation(EntityKind::Language, OnDelete::SetNull);

/// A title in the catalog: the abstract work, not a physical copy.
///
/// Physical copies are [`BookInstance`](crate::model::BookInstance)s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: Option<BookId>,
    pub title: String,

    /// Short description of the book, at most 600 characters.
    pub summary: Option<String>,

    /// ISBN-13, unique across the catalog.
    pub isbn: String,

    /// Cleared when the author is deleted.
    pub author: Option<AuthorId>,

    pub genres: BTreeSet<GenreId>,

    /// Cleared when the language is deleted.
    pub language: Option<LanguageId>,
}

impl Book {
    #[must_use]
    pub fn new(title: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            summary: None,
            isbn: isbn.into(),
            author: None,
            genres: BTreeSet::new(),
            language: None,
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: AuthorId) -> Self {
        self.author = Some(author);
        self
    }

    #[must_use]
    pub fn with_genre(mut self, genre: GenreId) -> Self {
        self.genres.insert(genre);
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: LanguageId) -> Self {
        self.language = Some(language);
        self
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl Entity for Book {
    const KIND: EntityKind = EntityKind::Book;
    const FIELDS: &'static [FieldDef] = &[ID, TITLE, SUMMARY, ISBN, AUTHOR, GENRES, LANGUAGE];

    fn entity_ref(&self) -> Option<EntityRef> {
        self.id.map(EntityRef::Book)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        TITLE.check_text(&self.title)?;
        SUMMARY.check_optional_text(self.summary.as_deref())?;
        ISBN.check_text(&self.isbn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_new() {
        let book = Book::new("Emma", "9780141439587");
        assert_eq!(book.title, "Emma");
        assert_eq!(book.to_string(), "Emma");
        assert!(book.author.is_none());
        assert!(book.genres.is_empty());
        assert!(book.validate().is_ok());
    }

    #[test]
    fn test_book_builder() {
        let book = Book::new("Emma", "9780141439587")
            .with_summary("A comedy of manners.")
            .with_author(AuthorId::new(1))
            .with_genre(GenreId::new(2))
            .with_genre(GenreId::new(2))
            .with_language(LanguageId::new(3));

        assert_eq!(book.summary.as_deref(), Some("A comedy of manners."));
        assert_eq!(book.author, Some(AuthorId::new(1)));
        assert_eq!(book.genres.len(), 1);
        assert_eq!(book.language, Some(LanguageId::new(3)));
    }

    #[test]
    fn test_book_isbn_must_be_thirteen_chars() {
        assert!(matches!(
            Book::new("Emma", "978014143958").validate(),
            Err(ValidationError::WrongLength { field: "isbn", expected: 13, actual: 12 })
        ));
        assert!(matches!(
            Book::new("Emma", "97801414395870").validate(),
            Err(ValidationError::WrongLength { field: "isbn", actual: 14, .. })
        ));
        assert_eq!(
            Book::new("Emma", "").validate(),
            Err(ValidationError::Required { field: "isbn" })
        );
    }

    #[test]
    fn test_book_summary_limit() {
        let ok = Book::new("Emma", "9780141439587").with_summary("s".repeat(600));
        assert!(ok.validate().is_ok());

        let too_long = Book::new("Emma", "9780141439587").with_summary("s".repeat(601));
        assert_eq!(
            too_long.validate(),
            Err(ValidationError::TooLong {
                field: "summary",
                max: 600,
                actual: 601
            })
        );
    }

    #[test]
    fn test_book_entity_ref() {
        let mut book = Book::new("Emma", "9780141439587");
        assert!(book.entity_ref().is_none());
        book.id = Some(BookId::new(7));
        let r = book.entity_ref().unwrap();
        assert_eq!(r.to_string(), "book/7");
        assert_eq!(r.detail_path(), "/catalog/book/7");
    }

    #[test]
    fn test_book_relations_declared() {
        let def = Book::definition();
        let author = def.field("author").unwrap().relation.unwrap();
        assert_eq!(author.on_delete, OnDelete::SetNull);
        assert!(def.field("isbn").unwrap().unique);
    }
}
