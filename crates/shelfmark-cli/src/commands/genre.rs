use anyhow::Result;
use shelfmark_core::model::{Genre, GenreId};
use shelfmark_core::schema::Database;

#[derive(Debug, clap::Subcommand)]
pub enum GenreCommand {
    /// Add a genre (e.g. "Science Fiction")
    Add { name: String },
    /// List genres
    List,
    /// Rename a genre
    Rename { id: GenreId, name: String },
    /// Delete a genre and remove it from every book
    Delete { id: GenreId },
}

pub fn run(db: &Database, command: GenreCommand) -> Result<()> {
    match command {
        GenreCommand::Add { name } => {
            let mut genre = Genre::new(name);
            let id = db.insert_genre(&mut genre)?;
            println!("✓ Added genre {} ({})", genre, id);
        }
        GenreCommand::List => {
            for genre in db.list_genres()? {
                let id = genre.id.map(|id| id.to_string()).unwrap_or_default();
                println!("{:>5}  {}", id, genre);
            }
        }
        GenreCommand::Rename { id, name } => {
            let mut genre = db.get_genre(id)?;
            genre.name = name;
            db.update_genre(&genre)?;
            println!("✓ Renamed genre {} to {}", id, genre);
        }
        GenreCommand::Delete { id } => {
            let genre = db.get_genre(id)?;
            db.delete_genre(id)?;
            println!("✓ Deleted genre {}", genre);
        }
    }
    Ok(())
}
