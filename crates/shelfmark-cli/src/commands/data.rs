use anyhow::{Context, Result};
use shelfmark_core::model::{EntityRef, Record};
use shelfmark_core::schema::Database;
use shelfmark_core::Fixture;
use std::path::{Path, PathBuf};

/// Print the record a reference such as `book/12` points at.
pub fn show_record(db: &Database, reference: &EntityRef) -> Result<()> {
    let record = db
        .resolve(reference)
        .with_context(|| format!("No record at {}", reference.detail_path()))?;

    println!("{} {}", record.kind(), reference.detail_path());
    match record {
        Record::Book(book) => {
            println!("  title: {}", book.title);
            println!("  isbn:  {}", book.isbn);
            if let Some(author) = book.author {
                println!("  author: {}", db.get_author(author)?);
            }
        }
        Record::Author(author) => {
            println!("  name: {}", author);
            if let Some(born) = author.date_of_birth {
                println!("  born: {}", born);
            }
            if let Some(id) = author.id {
                for book in db.list_books_by_author(id)? {
                    println!("  - {}", book);
                }
            }
        }
        Record::Genre(genre) => println!("  name: {}", genre),
        Record::Language(language) => {
            println!("  code: {} ({})", language, language.lang.label());
        }
        Record::BookInstance(copy) => {
            let book = db.get_book(copy.book)?;
            println!("  copy:    {}", copy.label(&book));
            println!("  imprint: {}", copy.imprint);
            println!("  status:  {}", copy.status);
            if let Some(due) = copy.due_back {
                println!("  due:     {}", due);
            }
        }
    }
    Ok(())
}

pub fn load_fixture(db: &Database, path: &Path) -> Result<()> {
    let fixture = Fixture::load(path)?;
    let summary = db
        .load_fixture(&fixture)
        .with_context(|| format!("Nothing was loaded from {}", path.display()))?;

    println!("✓ Loaded {}", path.display());
    println!("  authors: {}", summary.authors);
    println!("  genres:  {}", summary.genres);
    println!("  books:   {}", summary.books);
    println!("  copies:  {}", summary.copies);
    Ok(())
}

pub fn dump(db: &Database, output: Option<PathBuf>) -> Result<()> {
    let json = db.snapshot()?.to_json()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Wrote catalog to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmark_core::model::{Book, BookId};
    use tempfile::TempDir;

    const FIXTURE: &str = r#"
[[authors]]
key = "voltaire"
first_name = "François-Marie"
last_name = "Arouet"

[[books]]
title = "Candide"
isbn = "9780140440041"
author = "voltaire"
language = "fr"

[[copies]]
isbn = "9780140440041"
imprint = "Penguin Classics"
"#;

    #[test]
    fn test_load_then_dump_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let fixture = temp_dir.path().join("seed.toml");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let db = Database::open(temp_dir.path().join("catalog.db")).unwrap();
        load_fixture(&db, &fixture).unwrap();

        let output = temp_dir.path().join("dump.json");
        dump(&db, Some(output.clone())).unwrap();
        let json = std::fs::read_to_string(output).unwrap();
        assert!(json.contains("\"isbn\": \"9780140440041\""));
        assert!(json.contains("\"lang\": \"fr\""));
    }

    #[test]
    fn test_show_unknown_record_fails() {
        let db = Database::open_in_memory().unwrap();
        let reference = EntityRef::Book(BookId::new(1));
        assert!(show_record(&db, &reference).is_err());

        let mut book = Book::new("Candide", "9780140440041");
        db.insert_book(&mut book).unwrap();
        assert!(show_record(&db, &reference).is_ok());
    }
}
