//! End-to-end checks of catalog behaviour against an on-disk database.

use shelfmark_core::model::{
    Author, Book, BookInstance, Entity, EntityRef, Language, LanguageCode, LoanStatus, Record,
};
use shelfmark_core::schema::Database;
use shelfmark_core::{Error, ValidationError};
use std::collections::HashSet;
use tempfile::TempDir;

fn open(dir: &TempDir) -> Database {
    Database::open(dir.path().join("catalog.db")).expect("Failed to open database")
}

/// The worked example: Jane Austen and Emma.
#[test]
fn test_austen_emma_example() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir);

    let mut author = Author::new("Jane", "Austen");
    let author_id = db.insert_author(&mut author).unwrap();
    let mut book = Book::new("Emma", "9780141439587").with_author(author_id);
    db.insert_book(&mut book).unwrap();

    let books = db.list_books().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].to_string(), "Emma");

    let author = db.get_author(books[0].author.unwrap()).unwrap();
    assert_eq!(author.to_string(), "Austen, Jane");
}

#[test]
fn test_isbns_are_pairwise_distinct() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir);

    db.insert_book(&mut Book::new("Emma", "9780141439587"))
        .unwrap();
    let err = db
        .insert_book(&mut Book::new("Not Emma", "9780141439587"))
        .unwrap_err();

    match err {
        Error::Validation(ValidationError::NotUnique { field, value }) => {
            assert_eq!(field, "isbn");
            assert_eq!(value, "9780141439587");
        }
        other => panic!("expected a uniqueness failure, got {other:?}"),
    }

    let isbns: Vec<String> = db.list_books().unwrap().into_iter().map(|b| b.isbn).collect();
    let distinct: HashSet<&String> = isbns.iter().collect();
    assert_eq!(isbns.len(), distinct.len());
}

#[test]
fn test_status_outside_the_four_tags_fails() {
    for bad in ["x", "Lost", "", "M"] {
        let err = bad.parse::<LoanStatus>().unwrap_err();
        assert_eq!(err.field(), "status");
    }
    for good in ["m", "o", "a", "r"] {
        assert!(good.parse::<LoanStatus>().is_ok());
    }
}

#[test]
fn test_deleting_author_keeps_book() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir);

    let author = db.insert_author(&mut Author::new("Jane", "Austen")).unwrap();
    let book = db
        .insert_book(&mut Book::new("Emma", "9780141439587").with_author(author))
        .unwrap();

    db.delete_author(author).unwrap();

    let stored = db.get_book(book).unwrap();
    assert_eq!(stored.title, "Emma");
    assert_eq!(stored.author, None);
}

#[test]
fn test_deleting_book_with_copy_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir);

    let book = db
        .insert_book(&mut Book::new("Emma", "9780141439587"))
        .unwrap();
    db.insert_instance(&BookInstance::new(book, "Penguin Classics"))
        .unwrap();

    let err = db.delete_book(book).unwrap_err();
    assert!(err.is_integrity(), "expected integrity error, got {err:?}");
    assert_eq!(db.list_books().unwrap().len(), 1);
}

#[test]
fn test_copies_get_distinct_identifiers() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir);

    let book = db
        .insert_book(&mut Book::new("Emma", "9780141439587"))
        .unwrap();
    for n in 0..200 {
        db.insert_instance(&BookInstance::new(book, format!("Printing {n}")))
            .unwrap();
    }

    let ids: HashSet<_> = db
        .list_instances()
        .unwrap()
        .into_iter()
        .map(|copy| copy.id)
        .collect();
    assert_eq!(ids.len(), 200);
}

#[test]
fn test_language_codes() {
    assert!(Language::from_code("xx").is_err());

    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir);
    let mut french = Language::from_code("fr").unwrap();
    db.insert_language(&mut french).unwrap();

    let stored = db.get_language(french.id.unwrap()).unwrap();
    assert_eq!(stored.lang, LanguageCode::French);
    assert_eq!(stored.to_string(), "fr");
}

#[test]
fn test_reopen_keeps_data_and_schema() {
    let temp_dir = TempDir::new().unwrap();
    {
        let db = open(&temp_dir);
        db.insert_author(&mut Author::new("Jane", "Austen")).unwrap();
    }

    let db = open(&temp_dir);
    assert_eq!(db.list_authors().unwrap().len(), 1);
    let migrations: i64 = db
        .conn()
        .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(migrations, 1);
}

#[test]
fn test_entity_reference_resolves_to_same_record() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir);

    let mut book = Book::new("Emma", "9780141439587");
    db.insert_book(&mut book).unwrap();
    let copy = BookInstance::new(book.id.unwrap(), "Penguin Classics");
    db.insert_instance(&copy).unwrap();

    let reference: EntityRef = book.entity_ref().unwrap().to_string().parse().unwrap();
    assert_eq!(db.resolve(&reference).unwrap(), Record::Book(book.clone()));

    let stored = db.get_instance(copy.id).unwrap();
    assert_eq!(
        stored.label(&book).to_string(),
        format!("{}, Emma", copy.id)
    );
}
