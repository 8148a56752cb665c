use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::{Error, Result, ValidationError};
use crate::model::{
    Author, AuthorId, Book, BookId, BookInstance, Entity, EntityKind, EntityRef, Genre, GenreId,
    InstanceId, Language, LanguageCode, LanguageId, LoanStatus, Record,
};

use super::migrations::MIGRATIONS;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A database connection with CRUD methods for catalog entities.
///
/// Every write validates the record against its field declarations first;
/// SQLite then enforces uniqueness, choice sets, and relation behaviour on
/// delete. Constraint failures surface as [`Error::Validation`] or
/// [`Error::Integrity`].
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init(conn: Connection) -> Result<Self> {
        // Foreign keys are off by default and the setting is per connection.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }

    /// Run `f` inside a transaction, or inside the caller's transaction if
    /// one is already open.
    pub fn atomically<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        if !self.conn.is_autocommit() {
            return f(self);
        }
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Look up any record by its reference.
    pub fn resolve(&self, reference: &EntityRef) -> Result<Record> {
        Ok(match *reference {
            EntityRef::Book(id) => Record::Book(self.get_book(id)?),
            EntityRef::Author(id) => Record::Author(self.get_author(id)?),
            EntityRef::Genre(id) => Record::Genre(self.get_genre(id)?),
            EntityRef::Language(id) => Record::Language(self.get_language(id)?),
            EntityRef::BookInstance(id) => Record::BookInstance(self.get_instance(id)?),
        })
    }

    fn count(&self, sql: &str, param: impl rusqlite::ToSql) -> Result<usize> {
        let n: i64 = self.conn.query_row(sql, [param], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

fn not_found(kind: EntityKind, id: impl ToString) -> Error {
    Error::NotFound {
        entity: kind.name(),
        id: id.to_string(),
    }
}

fn unsaved(kind: EntityKind) -> Error {
    Error::InvalidData(format!("{} has not been stored yet", kind.name()))
}

/// Message of a SQLite constraint failure, if `err` is one.
fn constraint_message(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(e, msg)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(msg.as_deref().unwrap_or(""))
        }
        _ => None,
    }
}

fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn date_from_row(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let Some(text) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map(Some)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn choice_from_row<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    let code: String = row.get(idx)?;
    code.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// Author CRUD
impl Database {
    /// Insert a new author and record its assigned id.
    pub fn insert_author(&self, author: &mut Author) -> Result<AuthorId> {
        author.validate()?;
        self.conn.execute(
            "INSERT INTO authors (first_name, last_name, date_of_birth) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                author.first_name,
                author.last_name,
                date_to_sql(author.date_of_birth),
            ],
        )?;
        let id = AuthorId::new(self.conn.last_insert_rowid());
        author.id = Some(id);
        log::debug!("Inserted author {} ({})", id, author);
        Ok(id)
    }

    /// Update an existing author.
    pub fn update_author(&self, author: &Author) -> Result<()> {
        let id = author.id.ok_or_else(|| unsaved(EntityKind::Author))?;
        author.validate()?;
        let changed = self.conn.execute(
            "UPDATE authors SET first_name = ?2, last_name = ?3, date_of_birth = ?4 WHERE id = ?1",
            rusqlite::params![
                id,
                author.first_name,
                author.last_name,
                date_to_sql(author.date_of_birth),
            ],
        )?;
        if changed == 0 {
            return Err(not_found(EntityKind::Author, id));
        }
        Ok(())
    }

    pub fn get_author(&self, id: AuthorId) -> Result<Author> {
        self.conn
            .query_row(
                "SELECT id, first_name, last_name, date_of_birth FROM authors WHERE id = ?1",
                [id],
                Self::author_from_row,
            )
            .optional()?
            .ok_or_else(|| not_found(EntityKind::Author, id))
    }

    /// List all authors by last name, then first name.
    pub fn list_authors(&self) -> Result<Vec<Author>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, first_name, last_name, date_of_birth
             FROM authors
             ORDER BY last_name, first_name, id",
        )?;
        let authors = stmt
            .query_map([], Self::author_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(authors)
    }

    /// Delete an author. Books by this author keep existing with no author.
    pub fn delete_author(&self, id: AuthorId) -> Result<()> {
        let orphaned = self.count("SELECT COUNT(*) FROM books WHERE author_id = ?1", id)?;
        let changed = self
            .conn
            .execute("DELETE FROM authors WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(not_found(EntityKind::Author, id));
        }
        log::info!("Deleted author {}; cleared author on {} book(s)", id, orphaned);
        Ok(())
    }

    fn author_from_row(row: &Row) -> rusqlite::Result<Author> {
        Ok(Author {
            id: Some(row.get(0)?),
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            date_of_birth: date_from_row(row, 3)?,
        })
    }
}

// Language CRUD
impl Database {
    pub fn insert_language(&self, language: &mut Language) -> Result<LanguageId> {
        language.validate()?;
        self.conn.execute(
            "INSERT INTO languages (lang) VALUES (?1)",
            [language.lang.code()],
        )?;
        let id = LanguageId::new(self.conn.last_insert_rowid());
        language.id = Some(id);
        log::debug!("Inserted language {} ({})", id, language);
        Ok(id)
    }

    pub fn update_language(&self, language: &Language) -> Result<()> {
        let id = language.id.ok_or_else(|| unsaved(EntityKind::Language))?;
        language.validate()?;
        let changed = self.conn.execute(
            "UPDATE languages SET lang = ?2 WHERE id = ?1",
            rusqlite::params![id, language.lang.code()],
        )?;
        if changed == 0 {
            return Err(not_found(EntityKind::Language, id));
        }
        Ok(())
    }

    pub fn get_language(&self, id: LanguageId) -> Result<Language> {
        self.conn
            .query_row(
                "SELECT id, lang FROM languages WHERE id = ?1",
                [id],
                Self::language_from_row,
            )
            .optional()?
            .ok_or_else(|| not_found(EntityKind::Language, id))
    }

    /// The first stored language row with the given code, if any.
    pub fn find_language(&self, code: LanguageCode) -> Result<Option<Language>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, lang FROM languages WHERE lang = ?1 ORDER BY id LIMIT 1",
                [code.code()],
                Self::language_from_row,
            )
            .optional()?)
    }

    /// Return the language row for `code`, creating it if needed.
    pub fn ensure_language(&self, code: LanguageCode) -> Result<Language> {
        if let Some(existing) = self.find_language(code)? {
            return Ok(existing);
        }
        let mut language = Language::new(code);
        self.insert_language(&mut language)?;
        Ok(language)
    }

    pub fn list_languages(&self) -> Result<Vec<Language>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, lang FROM languages ORDER BY id")?;
        let languages = stmt
            .query_map([], Self::language_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(languages)
    }

    /// Delete a language. Books in this language keep existing with none set.
    pub fn delete_language(&self, id: LanguageId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM languages WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(not_found(EntityKind::Language, id));
        }
        log::info!("Deleted language {}", id);
        Ok(())
    }

    fn language_from_row(row: &Row) -> rusqlite::Result<Language> {
        Ok(Language {
            id: Some(row.get(0)?),
            lang: choice_from_row(row, 1)?,
        })
    }
}

// Genre CRUD
impl Database {
    pub fn insert_genre(&self, genre: &mut Genre) -> Result<GenreId> {
        genre.validate()?;
        self.conn
            .execute("INSERT INTO genres (name) VALUES (?1)", [&genre.name])?;
        let id = GenreId::new(self.conn.last_insert_rowid());
        genre.id = Some(id);
        log::debug!("Inserted genre {} ({})", id, genre);
        Ok(id)
    }

    pub fn update_genre(&self, genre: &Genre) -> Result<()> {
        let id = genre.id.ok_or_else(|| unsaved(EntityKind::Genre))?;
        genre.validate()?;
        let changed = self.conn.execute(
            "UPDATE genres SET name = ?2 WHERE id = ?1",
            rusqlite::params![id, genre.name],
        )?;
        if changed == 0 {
            return Err(not_found(EntityKind::Genre, id));
        }
        Ok(())
    }

    pub fn get_genre(&self, id: GenreId) -> Result<Genre> {
        self.conn
            .query_row(
                "SELECT id, name FROM genres WHERE id = ?1",
                [id],
                Self::genre_from_row,
            )
            .optional()?
            .ok_or_else(|| not_found(EntityKind::Genre, id))
    }

    /// The first genre with exactly this name, if any.
    pub fn find_genre_by_name(&self, name: &str) -> Result<Option<Genre>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name FROM genres WHERE name = ?1 ORDER BY id LIMIT 1",
                [name],
                Self::genre_from_row,
            )
            .optional()?)
    }

    pub fn list_genres(&self) -> Result<Vec<Genre>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM genres ORDER BY id")?;
        let genres = stmt
            .query_map([], Self::genre_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(genres)
    }

    /// Delete a genre and untag every book that carried it.
    pub fn delete_genre(&self, id: GenreId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM genres WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(not_found(EntityKind::Genre, id));
        }
        log::info!("Deleted genre {}", id);
        Ok(())
    }

    fn genre_from_row(row: &Row) -> rusqlite::Result<Genre> {
        Ok(Genre {
            id: Some(row.get(0)?),
            name: row.get(1)?,
        })
    }
}

// Book CRUD
impl Database {
    /// Insert a new book with its genre tags and record its assigned id.
    pub fn insert_book(&self, book: &mut Book) -> Result<BookId> {
        book.validate()?;
        let id = self.atomically(|db| {
            db.ensure_isbn_free(&book.isbn, None)?;
            db.conn
                .execute(
                    "INSERT INTO books (title, summary, isbn, author_id, language_id)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        book.title,
                        book.summary,
                        book.isbn,
                        book.author,
                        book.language,
                    ],
                )
                .map_err(|e| book_write_error(e, &book.isbn))?;
            let id = BookId::new(db.conn.last_insert_rowid());
            db.write_book_genres(id, &book.genres)?;
            Ok(id)
        })?;
        book.id = Some(id);
        log::debug!("Inserted book {} ({})", id, book);
        Ok(id)
    }

    /// Update an existing book, replacing its genre tags.
    pub fn update_book(&self, book: &Book) -> Result<()> {
        let id = book.id.ok_or_else(|| unsaved(EntityKind::Book))?;
        book.validate()?;
        self.atomically(|db| {
            db.ensure_isbn_free(&book.isbn, Some(id))?;
            let changed = db
                .conn
                .execute(
                    "UPDATE books SET title = ?2, summary = ?3, isbn = ?4,
                        author_id = ?5, language_id = ?6
                     WHERE id = ?1",
                    rusqlite::params![
                        id,
                        book.title,
                        book.summary,
                        book.isbn,
                        book.author,
                        book.language,
                    ],
                )
                .map_err(|e| book_write_error(e, &book.isbn))?;
            if changed == 0 {
                return Err(not_found(EntityKind::Book, id));
            }
            db.write_book_genres(id, &book.genres)
        })
    }

    pub fn get_book(&self, id: BookId) -> Result<Book> {
        let mut book = self
            .conn
            .query_row(
                "SELECT id, title, summary, isbn, author_id, language_id FROM books WHERE id = ?1",
                [id],
                Self::book_from_row,
            )
            .optional()?
            .ok_or_else(|| not_found(EntityKind::Book, id))?;
        book.genres = self.genre_ids_for_book(id)?;
        Ok(book)
    }

    pub fn find_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let id: Option<BookId> = self
            .conn
            .query_row("SELECT id FROM books WHERE isbn = ?1", [isbn], |row| {
                row.get(0)
            })
            .optional()?;
        id.map(|id| self.get_book(id)).transpose()
    }

    /// List all books in insertion order, with their genre tags.
    pub fn list_books(&self) -> Result<Vec<Book>> {
        self.query_books(
            "SELECT id, title, summary, isbn, author_id, language_id FROM books ORDER BY id",
            [],
        )
    }

    pub fn list_books_by_author(&self, author: AuthorId) -> Result<Vec<Book>> {
        self.query_books(
            "SELECT id, title, summary, isbn, author_id, language_id
             FROM books WHERE author_id = ?1 ORDER BY id",
            [author],
        )
    }

    /// Replace the genre tags of a stored book.
    pub fn set_book_genres(&self, id: BookId, genres: &BTreeSet<GenreId>) -> Result<()> {
        self.atomically(|db| {
            db.get_book(id)?;
            db.write_book_genres(id, genres)
        })
    }

    /// Genres tagged on a book, in genre id order.
    pub fn book_genres(&self, id: BookId) -> Result<Vec<Genre>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.id, g.name
             FROM genres g
             JOIN book_genres bg ON bg.genre_id = g.id
             WHERE bg.book_id = ?1
             ORDER BY g.id",
        )?;
        let genres = stmt
            .query_map([id], Self::genre_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(genres)
    }

    /// Delete a book.
    ///
    /// Fails with [`Error::Integrity`] while any copy still references it;
    /// those copies must be deleted or reassigned first.
    pub fn delete_book(&self, id: BookId) -> Result<()> {
        let copies = self.count("SELECT COUNT(*) FROM book_instances WHERE book_id = ?1", id)?;
        if copies > 0 {
            log::warn!(
                "Refusing to delete book {}: {} copies still reference it",
                id,
                copies
            );
            return Err(book_in_use(id, copies));
        }
        let changed = match self.conn.execute("DELETE FROM books WHERE id = ?1", [id]) {
            Ok(changed) => changed,
            Err(e) if constraint_message(&e).is_some() => {
                let copies =
                    self.count("SELECT COUNT(*) FROM book_instances WHERE book_id = ?1", id)?;
                return Err(book_in_use(id, copies));
            }
            Err(e) => return Err(e.into()),
        };
        if changed == 0 {
            return Err(not_found(EntityKind::Book, id));
        }
        log::info!("Deleted book {}", id);
        Ok(())
    }

    fn ensure_isbn_free(&self, isbn: &str, except: Option<BookId>) -> Result<()> {
        let taken: Option<BookId> = self
            .conn
            .query_row("SELECT id FROM books WHERE isbn = ?1", [isbn], |row| {
                row.get(0)
            })
            .optional()?;
        match taken {
            Some(owner) if Some(owner) != except => Err(isbn_taken(isbn)),
            _ => Ok(()),
        }
    }

    fn write_book_genres(&self, id: BookId, genres: &BTreeSet<GenreId>) -> Result<()> {
        self.conn
            .execute("DELETE FROM book_genres WHERE book_id = ?1", [id])?;
        for genre in genres {
            self.conn
                .execute(
                    "INSERT INTO book_genres (book_id, genre_id) VALUES (?1, ?2)",
                    rusqlite::params![id, genre],
                )
                .map_err(|e| {
                    if constraint_message(&e).is_some() {
                        not_found(EntityKind::Genre, genre)
                    } else {
                        e.into()
                    }
                })?;
        }
        Ok(())
    }

    fn genre_ids_for_book(&self, id: BookId) -> Result<BTreeSet<GenreId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT genre_id FROM book_genres WHERE book_id = ?1")?;
        let ids = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(ids)
    }

    fn query_books(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Book>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut books = stmt
            .query_map(params, Self::book_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut tags: HashMap<BookId, BTreeSet<GenreId>> = HashMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT book_id, genre_id FROM book_genres")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, BookId>(0)?, row.get::<_, GenreId>(1)?))
        })?;
        for row in rows {
            let (book, genre): (BookId, GenreId) = row?;
            tags.entry(book).or_default().insert(genre);
        }

        for book in &mut books {
            if let Some(genres) = book.id.and_then(|id| tags.remove(&id)) {
                book.genres = genres;
            }
        }
        Ok(books)
    }

    fn book_from_row(row: &Row) -> rusqlite::Result<Book> {
        Ok(Book {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            summary: row.get(2)?,
            isbn: row.get(3)?,
            author: row.get(4)?,
            genres: BTreeSet::new(),
            language: row.get(5)?,
        })
    }
}

fn isbn_taken(isbn: &str) -> Error {
    ValidationError::NotUnique {
        field: "isbn",
        value: isbn.to_string(),
    }
    .into()
}

fn book_in_use(id: BookId, copies: usize) -> Error {
    Error::Integrity {
        entity: EntityKind::Book.name(),
        id: id.to_string(),
        dependent_entity: EntityKind::BookInstance.name(),
        dependents: copies,
    }
}

fn book_write_error(err: rusqlite::Error, isbn: &str) -> Error {
    let message = constraint_message(&err).map(str::to_owned);
    match message {
        Some(msg) if msg.contains("books.isbn") => isbn_taken(isbn),
        Some(msg) if msg.contains("FOREIGN KEY") => {
            Error::InvalidData("book references an author or language that does not exist".into())
        }
        _ => err.into(),
    }
}

fn instance_write_error(err: rusqlite::Error, id: InstanceId) -> Error {
    let message = constraint_message(&err).map(str::to_owned);
    match message {
        Some(msg) if msg.contains("book_instances.id") => ValidationError::NotUnique {
            field: "id",
            value: id.to_string(),
        }
        .into(),
        _ => err.into(),
    }
}

// BookInstance CRUD
impl Database {
    /// Insert a new copy. The referenced book must exist.
    pub fn insert_instance(&self, instance: &BookInstance) -> Result<()> {
        instance.validate()?;
        self.get_book(instance.book)?;
        self.conn.execute(
            "INSERT INTO book_instances (id, book_id, imprint, due_back, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                instance.id,
                instance.book,
                instance.imprint,
                date_to_sql(instance.due_back),
                instance.status.code(),
            ],
        )
        .map_err(|e| instance_write_error(e, instance.id))?;
        log::debug!("Inserted book instance {} of book {}", instance.id, instance.book);
        Ok(())
    }

    /// Update an existing copy, including moving it to another book.
    pub fn update_instance(&self, instance: &BookInstance) -> Result<()> {
        instance.validate()?;
        self.get_book(instance.book)?;
        let changed = self.conn.execute(
            "UPDATE book_instances SET book_id = ?2, imprint = ?3, due_back = ?4, status = ?5
             WHERE id = ?1",
            rusqlite::params![
                instance.id,
                instance.book,
                instance.imprint,
                date_to_sql(instance.due_back),
                instance.status.code(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found(EntityKind::BookInstance, instance.id));
        }
        Ok(())
    }

    /// Set the loan status of a copy. Any status may follow any other.
    pub fn set_instance_status(
        &self,
        id: InstanceId,
        status: LoanStatus,
        due_back: Option<NaiveDate>,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE book_instances SET status = ?2, due_back = ?3 WHERE id = ?1",
            rusqlite::params![id, status.code(), date_to_sql(due_back)],
        )?;
        if changed == 0 {
            return Err(not_found(EntityKind::BookInstance, id));
        }
        log::debug!("Book instance {} is now {}", id, status);
        Ok(())
    }

    pub fn get_instance(&self, id: InstanceId) -> Result<BookInstance> {
        self.conn
            .query_row(
                "SELECT id, book_id, imprint, due_back, status FROM book_instances WHERE id = ?1",
                [id],
                Self::instance_from_row,
            )
            .optional()?
            .ok_or_else(|| not_found(EntityKind::BookInstance, id))
    }

    /// List all copies by due date; copies with no due date come first.
    pub fn list_instances(&self) -> Result<Vec<BookInstance>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, book_id, imprint, due_back, status
             FROM book_instances
             ORDER BY due_back, rowid",
        )?;
        let instances = stmt
            .query_map([], Self::instance_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(instances)
    }

    pub fn list_instances_for_book(&self, book: BookId) -> Result<Vec<BookInstance>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, book_id, imprint, due_back, status
             FROM book_instances
             WHERE book_id = ?1
             ORDER BY due_back, rowid",
        )?;
        let instances = stmt
            .query_map([book], Self::instance_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(instances)
    }

    pub fn delete_instance(&self, id: InstanceId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM book_instances WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(not_found(EntityKind::BookInstance, id));
        }
        log::info!("Deleted book instance {}", id);
        Ok(())
    }

    fn instance_from_row(row: &Row) -> rusqlite::Result<BookInstance> {
        Ok(BookInstance {
            id: row.get(0)?,
            book: row.get(1)?,
            imprint: row.get(2)?,
            due_back: date_from_row(row, 3)?,
            status: choice_from_row(row, 4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn austen(db: &Database) -> AuthorId {
        db.insert_author(&mut Author::new("Jane", "Austen")).unwrap()
    }

    fn emma(db: &Database) -> BookId {
        db.insert_book(&mut Book::new("Emma", "9780141439587")).unwrap()
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = db();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);

        let fk: i64 = db
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_author_round_trip() {
        let db = db();
        let dob = NaiveDate::from_ymd_opt(1775, 12, 16).unwrap();
        let mut author = Author::new("Jane", "Austen").with_date_of_birth(dob);
        let id = db.insert_author(&mut author).unwrap();
        assert_eq!(author.id, Some(id));

        let stored = db.get_author(id).unwrap();
        assert_eq!(stored, author);
        assert_eq!(stored.to_string(), "Austen, Jane");
    }

    #[test]
    fn test_authors_ordered_by_last_then_first_name() {
        let db = db();
        db.insert_author(&mut Author::new("Charlotte", "Brontë")).unwrap();
        db.insert_author(&mut Author::new("Jane", "Austen")).unwrap();
        db.insert_author(&mut Author::new("Anne", "Brontë")).unwrap();

        let names: Vec<String> = db
            .list_authors()
            .unwrap()
            .iter()
            .map(|a| a.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["Austen, Jane", "Brontë, Anne", "Brontë, Charlotte"]
        );
    }

    #[test]
    fn test_update_author() {
        let db = db();
        let id = austen(&db);
        let mut author = db.get_author(id).unwrap();
        author.first_name = "J.".to_string();
        db.update_author(&author).unwrap();
        assert_eq!(db.get_author(id).unwrap().first_name, "J.");
    }

    #[test]
    fn test_update_unsaved_author_fails() {
        let db = db();
        let err = db.update_author(&Author::new("Jane", "Austen")).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_insert_invalid_author_is_rejected() {
        let db = db();
        let err = db.insert_author(&mut Author::new("", "Austen")).unwrap_err();
        assert!(err.is_validation());
        assert!(db.list_authors().unwrap().is_empty());
    }

    #[test]
    fn test_book_round_trip_with_genres() {
        let db = db();
        let author = austen(&db);
        let fiction = db.insert_genre(&mut Genre::new("Fiction")).unwrap();
        let romance = db.insert_genre(&mut Genre::new("Romance")).unwrap();
        let english = db.ensure_language(LanguageCode::English).unwrap();

        let mut book = Book::new("Emma", "9780141439587")
            .with_summary("Handsome, clever, and rich.")
            .with_author(author)
            .with_genre(fiction)
            .with_genre(romance)
            .with_language(english.id.unwrap());
        let id = db.insert_book(&mut book).unwrap();

        let stored = db.get_book(id).unwrap();
        assert_eq!(stored, book);

        let names: Vec<String> = db
            .book_genres(id)
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Fiction", "Romance"]);
    }

    #[test]
    fn test_duplicate_isbn_is_a_validation_error() {
        let db = db();
        emma(&db);
        let err = db
            .insert_book(&mut Book::new("Emma (again)", "9780141439587"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NotUnique { field: "isbn", .. })
        ));
        assert_eq!(db.list_books().unwrap().len(), 1);
    }

    #[test]
    fn test_update_book_keeps_own_isbn_but_rejects_taken_one() {
        let db = db();
        let emma_id = emma(&db);
        let mut persuasion = Book::new("Persuasion", "9780141439686");
        db.insert_book(&mut persuasion).unwrap();

        let mut emma = db.get_book(emma_id).unwrap();
        emma.title = "Emma: A Novel".to_string();
        db.update_book(&emma).unwrap();

        persuasion.isbn = "9780141439587".to_string();
        let err = db.update_book(&persuasion).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_book_with_missing_genre_is_rolled_back() {
        let db = db();
        let mut book = Book::new("Emma", "9780141439587").with_genre(GenreId::new(99));
        let err = db.insert_book(&mut book).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "genre", .. }));
        assert!(book.id.is_none());
        assert!(db.list_books().unwrap().is_empty());
    }

    #[test]
    fn test_delete_author_clears_book_reference() {
        let db = db();
        let author = austen(&db);
        let mut book = Book::new("Emma", "9780141439587").with_author(author);
        let id = db.insert_book(&mut book).unwrap();

        db.delete_author(author).unwrap();

        let stored = db.get_book(id).unwrap();
        assert_eq!(stored.title, "Emma");
        assert!(stored.author.is_none());
    }

    #[test]
    fn test_delete_language_clears_book_reference() {
        let db = db();
        let french = db.ensure_language(LanguageCode::French).unwrap().id.unwrap();
        let mut book = Book::new("Candide", "9780140440041").with_language(french);
        let id = db.insert_book(&mut book).unwrap();

        db.delete_language(french).unwrap();

        assert!(db.get_book(id).unwrap().language.is_none());
    }

    #[test]
    fn test_delete_genre_untags_books() {
        let db = db();
        let genre = db.insert_genre(&mut Genre::new("Satire")).unwrap();
        let mut book = Book::new("Candide", "9780140440041").with_genre(genre);
        let id = db.insert_book(&mut book).unwrap();

        db.delete_genre(genre).unwrap();

        assert!(db.get_book(id).unwrap().genres.is_empty());
    }

    #[test]
    fn test_delete_book_with_copies_is_restricted() {
        let db = db();
        let id = emma(&db);
        db.insert_instance(&BookInstance::new(id, "Penguin")).unwrap();

        let err = db.delete_book(id).unwrap_err();
        assert!(err.is_integrity());
        assert!(matches!(err, Error::Integrity { dependents: 1, .. }));
        assert!(db.get_book(id).is_ok());
    }

    #[test]
    fn test_delete_book_removes_genre_links() {
        let db = db();
        let genre = db.insert_genre(&mut Genre::new("Fiction")).unwrap();
        let mut book = Book::new("Emma", "9780141439587").with_genre(genre);
        let id = db.insert_book(&mut book).unwrap();

        db.delete_book(id).unwrap();

        let links: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM book_genres", [], |row| row.get(0))
            .unwrap();
        assert_eq!(links, 0);
        assert_eq!(db.get_genre(genre).unwrap().name, "Fiction");
    }

    #[test]
    fn test_duplicate_instance_id_is_a_validation_error() {
        let db = db();
        let id = emma(&db);
        let copy = BookInstance::new(id, "Penguin");
        db.insert_instance(&copy).unwrap();

        let err = db.insert_instance(&copy).unwrap_err();
        assert!(err.is_validation(), "expected validation error, got {err:?}");
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NotUnique { field: "id", .. })
        ));
        assert_eq!(db.list_instances().unwrap().len(), 1);
    }

    #[test]
    fn test_whitespace_title_is_rejected() {
        let db = db();
        let err = db
            .insert_book(&mut Book::new("   ", "9780141439587"))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(db.insert_genre(&mut Genre::new("  ")).unwrap_err().is_validation());
        assert!(db.list_books().unwrap().is_empty());
    }

    #[test]
    fn test_delete_book_after_removing_copies() {
        let db = db();
        let id = emma(&db);
        let copy = BookInstance::new(id, "Penguin");
        db.insert_instance(&copy).unwrap();

        db.delete_instance(copy.id).unwrap();
        db.delete_book(id).unwrap();

        assert!(matches!(db.get_book(id), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_restrict_holds_at_the_sql_level() {
        let db = db();
        let id = emma(&db);
        db.insert_instance(&BookInstance::new(id, "Penguin")).unwrap();

        let result = db.conn().execute("DELETE FROM books WHERE id = ?1", [id]);
        assert!(result.is_err());
    }

    #[test]
    fn test_instance_requires_existing_book() {
        let db = db();
        let err = db
            .insert_instance(&BookInstance::new(BookId::new(5), "Penguin"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "book", .. }));
    }

    #[test]
    fn test_instances_ordered_by_due_back() {
        let db = db();
        let id = emma(&db);
        let later = BookInstance::new(id, "A")
            .with_due_back(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        let sooner = BookInstance::new(id, "B")
            .with_due_back(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        let none = BookInstance::new(id, "C");
        for copy in [&later, &sooner, &none] {
            db.insert_instance(copy).unwrap();
        }

        let imprints: Vec<String> = db
            .list_instances()
            .unwrap()
            .into_iter()
            .map(|c| c.imprint)
            .collect();
        assert_eq!(imprints, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_set_instance_status_any_transition() {
        let db = db();
        let id = emma(&db);
        let copy = BookInstance::new(id, "Penguin");
        db.insert_instance(&copy).unwrap();

        db.set_instance_status(copy.id, LoanStatus::Reserved, None)
            .unwrap();
        db.set_instance_status(copy.id, LoanStatus::Maintenance, None)
            .unwrap();
        assert_eq!(
            db.get_instance(copy.id).unwrap().status,
            LoanStatus::Maintenance
        );
    }

    #[test]
    fn test_invalid_status_rejected_by_storage() {
        let db = db();
        let id = emma(&db);
        let copy = BookInstance::new(id, "Penguin");
        db.insert_instance(&copy).unwrap();

        let result = db.conn().execute(
            "UPDATE book_instances SET status = 'x' WHERE id = ?1",
            [copy.id],
        );
        assert!(result.is_err());
        assert_eq!(
            db.get_instance(copy.id).unwrap().status,
            LoanStatus::Maintenance
        );
    }

    #[test]
    fn test_every_language_code_is_storable() {
        let db = db();
        for code in LanguageCode::ALL {
            db.insert_language(&mut Language::new(*code)).unwrap();
        }
        assert_eq!(db.list_languages().unwrap().len(), LanguageCode::ALL.len());

        let result = db
            .conn()
            .execute("INSERT INTO languages (lang) VALUES ('xx')", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_language() {
        let db = db();
        let mut language = db.ensure_language(LanguageCode::German).unwrap();
        language.lang = LanguageCode::Dutch;
        db.update_language(&language).unwrap();
        assert_eq!(
            db.get_language(language.id.unwrap()).unwrap().lang,
            LanguageCode::Dutch
        );
    }

    #[test]
    fn test_ensure_language_reuses_row() {
        let db = db();
        let first = db.ensure_language(LanguageCode::French).unwrap();
        let second = db.ensure_language(LanguageCode::French).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.to_string(), "fr");
    }

    #[test]
    fn test_resolve_entity_refs() {
        let db = db();
        let author = austen(&db);
        let book = emma(&db);
        let copy = BookInstance::new(book, "Penguin");
        db.insert_instance(&copy).unwrap();

        let record = db.resolve(&EntityRef::Author(author)).unwrap();
        assert_eq!(record.kind(), EntityKind::Author);

        let reference: EntityRef = copy.entity_ref().unwrap().to_string().parse().unwrap();
        assert_eq!(db.resolve(&reference).unwrap(), Record::BookInstance(copy));

        assert!(db.resolve(&EntityRef::Genre(GenreId::new(9))).is_err());
    }
}
