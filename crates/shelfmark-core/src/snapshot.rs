use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Author, Book, BookInstance, Genre, Language};
use crate::schema::Database;

/// Every record in the catalog, each table in its default order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub authors: Vec<Author>,
    pub languages: Vec<Language>,
    pub genres: Vec<Genre>,
    pub books: Vec<Book>,
    pub book_instances: Vec<BookInstance>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
            && self.languages.is_empty()
            && self.genres.is_empty()
            && self.books.is_empty()
            && self.book_instances.is_empty()
    }
}

impl Database {
    /// Read the whole catalog.
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.atomically(|db| {
            Ok(Snapshot {
                authors: db.list_authors()?,
                languages: db.list_languages()?,
                genres: db.list_genres()?,
                books: db.list_books()?,
                book_instances: db.list_instances()?,
            })
        })
    }
}
