/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Authors
CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL CHECK (length(first_name) BETWEEN 1 AND 100),
    last_name TEXT NOT NULL CHECK (length(last_name) BETWEEN 1 AND 100),
    date_of_birth TEXT
);

CREATE INDEX IF NOT EXISTS idx_authors_name ON authors(last_name, first_name);

-- Languages (two-letter codes from a fixed set)
CREATE TABLE IF NOT EXISTS languages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lang TEXT NOT NULL DEFAULT 'en' CHECK (lang IN (
        'en','af','sq','ar','eu','be','bn','bs','bg','my','ca','zh','hr','cs',
        'da','nl','eo','et','fi','fr','gl','de','el','he','hi','hu','is','id',
        'it','ja','kk','ko','la','lv','lt','mk','ms','mt','no','fa','pl','pt',
        'ro','ru','sr','sk','sl','es','sw','sv','tl','ta','te','th','tr','uk',
        'vi','cy'
    ))
);

-- Genres
CREATE TABLE IF NOT EXISTS genres (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 200)
);

-- Books (abstract titles)
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 200),
    summary TEXT CHECK (summary IS NULL OR length(summary) <= 600),
    isbn TEXT NOT NULL UNIQUE CHECK (length(isbn) = 13),
    author_id INTEGER REFERENCES authors(id) ON DELETE SET NULL,
    language_id INTEGER REFERENCES languages(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_books_author_id ON books(author_id);
CREATE INDEX IF NOT EXISTS idx_books_language_id ON books(language_id);

-- Book-Genre junction (many-to-many)
CREATE TABLE IF NOT EXISTS book_genres (
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, genre_id)
);

CREATE INDEX IF NOT EXISTS idx_book_genres_genre_id ON book_genres(genre_id);

-- Book instances (physical copies, keyed by random UUID)
CREATE TABLE IF NOT EXISTS book_instances (
    id TEXT PRIMARY KEY,
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE RESTRICT,
    imprint TEXT NOT NULL CHECK (length(imprint) BETWEEN 1 AND 200),
    due_back TEXT,
    status TEXT NOT NULL DEFAULT 'm' CHECK (status IN ('m', 'o', 'a', 'r'))
);

CREATE INDEX IF NOT EXISTS idx_book_instances_book_id ON book_instances(book_id);
CREATE INDEX IF NOT EXISTS idx_book_instances_due_back ON book_instances(due_back);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: MIGRATION_001,
}];
