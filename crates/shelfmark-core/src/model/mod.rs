pub mod author;
pub mod book;
pub mod entity;
pub mod genre;
pub mod ids;
pub mod instance;
pub mod language;

pub use author::Author;
pub use book::{Book, ISBN_LENGTH};
pub use entity::{Entity, EntityKind, EntityRef};
pub use genre::Genre;
pub use ids::{AuthorId, BookId, GenreId, InstanceId, LanguageId};
pub use instance::{BookInstance, InstanceLabel, LoanStatus};
pub use language::{Language, LanguageCode};

/// Any stored catalog record, as returned when resolving an [`EntityRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Book(Book),
    Author(Author),
    Genre(Genre),
    Language(Language),
    BookInstance(BookInstance),
}

impl Record {
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Book(_) => EntityKind::Book,
            Self::Author(_) => EntityKind::Author,
            Self::Genre(_) => EntityKind::Genre,
            Self::Language(_) => EntityKind::Language,
            Self::BookInstance(_) => EntityKind::BookInstance,
        }
    }
}
