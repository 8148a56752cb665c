//! Seed data for a catalog, read from TOML.
//!
//! A fixture lists authors, genres, books, and copies. Books point at
//! authors by fixture key, at genres by name, and at languages by code;
//! copies point at books by ISBN. [`Database::load_fixture`] applies the
//! whole file in one transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Author, AuthorId, Book, BookInstance, Genre, LanguageCode, LoanStatus};
use crate::schema::Database;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub authors: Vec<AuthorEntry>,
    #[serde(default)]
    pub genres: Vec<GenreEntry>,
    #[serde(default)]
    pub books: Vec<BookEntry>,
    #[serde(default)]
    pub copies: Vec<CopyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorEntry {
    /// Name books use to refer to this author within the fixture.
    pub key: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreEntry {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    pub title: String,
    pub isbn: String,
    pub summary: Option<String>,

    /// Key of an entry in `authors`.
    pub author: Option<String>,

    /// Genre names; each must be listed in `genres` or already stored.
    #[serde(default)]
    pub genres: Vec<String>,

    pub language: Option<LanguageCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyEntry {
    /// ISBN of the book this is a copy of.
    pub isbn: String,
    pub imprint: String,
    #[serde(default)]
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
}

/// Number of records created by a fixture load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub authors: usize,
    pub genres: usize,
    pub books: usize,
    pub copies: usize,
}

impl Fixture {
    /// Load a fixture from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::parse(&content).map_err(|e| match e {
            Error::InvalidData(msg) => {
                Error::InvalidData(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse a fixture from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::InvalidData(format!("failed to parse fixture: {}", e)))
    }
}

impl Database {
    /// Apply a fixture atomically: either every record is created or none is.
    pub fn load_fixture(&self, fixture: &Fixture) -> Result<LoadSummary> {
        let summary = self.atomically(|db| {
            let mut summary = LoadSummary::default();

            let mut authors: HashMap<&str, AuthorId> = HashMap::new();
            for entry in &fixture.authors {
                let mut author = Author::new(&entry.first_name, &entry.last_name);
                author.date_of_birth = entry.date_of_birth;
                let id = db.insert_author(&mut author)?;
                if authors.insert(&entry.key, id).is_some() {
                    return Err(Error::InvalidData(format!(
                        "duplicate author key in fixture: {}",
                        entry.key
                    )));
                }
                summary.authors += 1;
            }

            for entry in &fixture.genres {
                if db.find_genre_by_name(&entry.name)?.is_none() {
                    db.insert_genre(&mut Genre::new(&entry.name))?;
                    summary.genres += 1;
                }
            }

            for entry in &fixture.books {
                let mut book = Book::new(&entry.title, &entry.isbn);
                book.summary.clone_from(&entry.summary);
                if let Some(key) = &entry.author {
                    let id = authors.get(key.as_str()).copied().ok_or_else(|| {
                        Error::InvalidData(format!(
                            "book {} refers to unknown author key {}",
                            entry.isbn, key
                        ))
                    })?;
                    book.author = Some(id);
                }
                let mut genres = BTreeSet::new();
                for name in &entry.genres {
                    let genre = db.find_genre_by_name(name)?.ok_or_else(|| {
                        Error::InvalidData(format!(
                            "book {} refers to unknown genre {}",
                            entry.isbn, name
                        ))
                    })?;
                    genres.extend(genre.id);
                }
                book.genres = genres;
                if let Some(code) = entry.language {
                    book.language = db.ensure_language(code)?.id;
                }
                db.insert_book(&mut book)?;
                summary.books += 1;
            }

            for entry in &fixture.copies {
                let book = db.find_book_by_isbn(&entry.isbn)?.ok_or_else(|| {
                    Error::NotFound {
                        entity: "book",
                        id: entry.isbn.clone(),
                    }
                })?;
                let book_id = book.id.ok_or_else(|| {
                    Error::InvalidData(format!("book {} has no stored id", entry.isbn))
                })?;
                let mut copy = BookInstance::new(book_id, &entry.imprint).with_status(entry.status);
                copy.due_back = entry.due_back;
                db.insert_instance(&copy)?;
                summary.copies += 1;
            }

            Ok(summary)
        })?;

        log::info!(
            "Loaded fixture: {} authors, {} genres, {} books, {} copies",
            summary.authors,
            summary.genres,
            summary.books,
            summary.copies
        );
        Ok(summary)
    }
}
