use anyhow::Result;
use chrono::NaiveDate;
use shelfmark_core::model::{Author, AuthorId, Entity};
use shelfmark_core::schema::Database;

#[derive(Debug, clap::Subcommand)]
pub enum AuthorCommand {
    /// Add an author
    Add {
        first_name: String,
        last_name: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        born: Option<NaiveDate>,
    },
    /// List authors by last name, then first name
    List,
    /// Show an author and their books
    Show { id: AuthorId },
    /// Delete an author; their books are kept with no author
    Delete { id: AuthorId },
}

pub fn run(db: &Database, command: AuthorCommand) -> Result<()> {
    match command {
        AuthorCommand::Add {
            first_name,
            last_name,
            born,
        } => {
            let mut author = Author::new(first_name, last_name);
            author.date_of_birth = born;
            let id = db.insert_author(&mut author)?;
            println!("✓ Added author {} ({})", author, id);
        }
        AuthorCommand::List => {
            let authors = db.list_authors()?;
            if authors.is_empty() {
                println!("No authors.");
            }
            for author in authors {
                let id = author.id.map(|id| id.to_string()).unwrap_or_default();
                match author.date_of_birth {
                    Some(born) => println!("{:>5}  {} (b. {})", id, author, born),
                    None => println!("{:>5}  {}", id, author),
                }
            }
        }
        AuthorCommand::Show { id } => {
            let author = db.get_author(id)?;
            println!("{}", author);
            if let Some(reference) = author.entity_ref() {
                println!("  ref:  {}", reference.detail_path());
            }
            if let Some(born) = author.date_of_birth {
                println!("  born: {}", born);
            }
            let books = db.list_books_by_author(id)?;
            println!("  books: {}", books.len());
            for book in books {
                println!("    - {} ({})", book, book.isbn);
            }
        }
        AuthorCommand::Delete { id } => {
            let author = db.get_author(id)?;
            db.delete_author(id)?;
            println!("✓ Deleted author {}", author);
        }
    }
    Ok(())
}
