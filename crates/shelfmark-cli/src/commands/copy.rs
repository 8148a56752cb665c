use anyhow::Result;
use chrono::NaiveDate;
use shelfmark_core::model::{Book, BookId, BookInstance, InstanceId, LoanStatus};
use shelfmark_core::schema::Database;
use std::collections::HashMap;

#[derive(Debug, clap::Subcommand)]
pub enum CopyCommand {
    /// Add a physical copy of a book
    Add {
        book: BookId,
        imprint: String,
        /// Loan status: code (m, o, a, r) or label (default: Maintenance)
        #[arg(long, value_parser = LoanStatus::parse_loose)]
        status: Option<LoanStatus>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due_back: Option<NaiveDate>,
    },
    /// List copies by due date
    List {
        /// Only copies of this book
        #[arg(long)]
        book: Option<BookId>,
    },
    /// Set the loan status of a copy
    ///
    /// Any status may follow any other; the due date is replaced with the
    /// one given here (or cleared).
    Status {
        id: InstanceId,
        #[arg(value_parser = LoanStatus::parse_loose)]
        status: LoanStatus,
        #[arg(long)]
        due_back: Option<NaiveDate>,
    },
    /// Delete a copy
    Delete { id: InstanceId },
}

pub fn run(db: &Database, command: CopyCommand) -> Result<()> {
    match command {
        CopyCommand::Add {
            book,
            imprint,
            status,
            due_back,
        } => {
            let mut copy = BookInstance::new(book, imprint).with_status(status.unwrap_or_default());
            copy.due_back = due_back;
            db.insert_instance(&copy)?;
            let book = db.get_book(book)?;
            println!("✓ Added copy {}", copy.label(&book));
        }
        CopyCommand::List { book } => {
            let copies = match book {
                Some(id) => db.list_instances_for_book(id)?,
                None => db.list_instances()?,
            };
            let books: HashMap<BookId, Book> = db
                .list_books()?
                .into_iter()
                .filter_map(|b| b.id.map(|id| (id, b)))
                .collect();
            if copies.is_empty() {
                println!("No copies.");
            }
            for copy in copies {
                let due = copy
                    .due_back
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let title = books
                    .get(&copy.book)
                    .map(|b| b.title.as_str())
                    .unwrap_or("?");
                println!("{}  {:<11}  {:<10}  {}", copy.id, copy.status, due, title);
            }
        }
        CopyCommand::Status {
            id,
            status,
            due_back,
        } => {
            db.set_instance_status(id, status, due_back)?;
            println!("✓ Copy {} is now {}", id, status);
        }
        CopyCommand::Delete { id } => {
            db.delete_instance(id)?;
            println!("✓ Deleted copy {}", id);
        }
    }
    Ok(())
}
