use anyhow::{Context, Result};
use shelfmark_core::model::{AuthorId, Book, BookId, Entity, GenreId, LanguageCode};
use shelfmark_core::schema::Database;
use std::collections::BTreeSet;

#[derive(Debug, clap::Subcommand)]
pub enum BookCommand {
    /// Add a book
    Add {
        title: String,
        /// 13-character ISBN, unique across the catalog
        isbn: String,
        #[arg(long)]
        summary: Option<String>,
        /// Author id
        #[arg(long)]
        author: Option<AuthorId>,
        /// Genre id (repeatable)
        #[arg(long = "genre")]
        genres: Vec<GenreId>,
        /// Two-letter language code
        #[arg(long)]
        language: Option<LanguageCode>,
    },
    /// List books
    List,
    /// Show a book with its genres and copies
    Show { id: BookId },
    /// Replace a book's genres
    Tag { id: BookId, genres: Vec<GenreId> },
    /// Delete a book (refused while copies exist)
    Delete { id: BookId },
}

pub fn run(db: &Database, command: BookCommand) -> Result<()> {
    match command {
        BookCommand::Add {
            title,
            isbn,
            summary,
            author,
            genres,
            language,
        } => {
            let mut book = Book::new(title, isbn);
            book.summary = summary;
            book.author = author;
            book.genres = genres.into_iter().collect();
            let id = db
                .atomically(|db| {
                    if let Some(code) = language {
                        book.language = db.ensure_language(code)?.id;
                    }
                    db.insert_book(&mut book)
                })
                .with_context(|| format!("Failed to add book {}", book.isbn))?;
            println!("✓ Added book {} ({})", book, id);
        }
        BookCommand::List => {
            let books = db.list_books()?;
            if books.is_empty() {
                println!("No books.");
            }
            for book in books {
                let id = book.id.map(|id| id.to_string()).unwrap_or_default();
                println!("{:>5}  {}  {}", id, book.isbn, book);
            }
        }
        BookCommand::Show { id } => show_book(db, id)?,
        BookCommand::Tag { id, genres } => {
            let genres: BTreeSet<GenreId> = genres.into_iter().collect();
            db.set_book_genres(id, &genres)?;
            println!("✓ Book {} now has {} genre(s)", id, genres.len());
        }
        BookCommand::Delete { id } => {
            let book = db.get_book(id)?;
            db.delete_book(id).with_context(|| {
                format!("Delete or reassign the copies of {} first", book)
            })?;
            println!("✓ Deleted book {}", book);
        }
    }
    Ok(())
}

fn show_book(db: &Database, id: BookId) -> Result<()> {
    let book = db.get_book(id)?;

    println!("{}", book);
    if let Some(reference) = book.entity_ref() {
        println!("  ref:      {}", reference.detail_path());
    }
    println!("  isbn:     {}", book.isbn);
    if let Some(author) = book.author {
        println!("  author:   {}", db.get_author(author)?);
    }
    if let Some(language) = book.language {
        let language = db.get_language(language)?;
        println!("  language: {} ({})", language, language.lang.label());
    }
    let genres: Vec<String> = db
        .book_genres(id)?
        .into_iter()
        .map(|g| g.name)
        .collect();
    if !genres.is_empty() {
        println!("  genres:   {}", genres.join(", "));
    }
    if let Some(summary) = &book.summary {
        println!("\n  {}\n", summary);
    }

    let copies = db.list_instances_for_book(id)?;
    println!("  copies:   {}", copies.len());
    for copy in copies {
        let due = copy
            .due_back
            .map(|d| format!(" (due {})", d))
            .unwrap_or_default();
        println!("    - {} [{}]{}", copy.label(&book), copy.status, due);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(title: &str, language: Option<LanguageCode>) -> BookCommand {
        BookCommand::Add {
            title: title.to_string(),
            isbn: "9780140440041".to_string(),
            summary: None,
            author: None,
            genres: Vec::new(),
            language,
        }
    }

    #[test]
    fn test_add_book_with_language() {
        let db = Database::open_in_memory().unwrap();
        run(&db, add("Candide", Some(LanguageCode::French))).unwrap();

        let book = db.find_book_by_isbn("9780140440041").unwrap().unwrap();
        let language = db.get_language(book.language.unwrap()).unwrap();
        assert_eq!(language.lang, LanguageCode::French);
    }

    #[test]
    fn test_rejected_book_leaves_no_language_behind() {
        let db = Database::open_in_memory().unwrap();
        run(&db, add("Candide", None)).unwrap();

        let err = run(&db, add("Candide (again)", Some(LanguageCode::French)));
        assert!(err.is_err());
        assert!(db.list_languages().unwrap().is_empty());
        assert_eq!(db.list_books().unwrap().len(), 1);
    }
}
