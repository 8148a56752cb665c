use anyhow::Result;
use shelfmark_core::model::{LanguageCode, LanguageId};
use shelfmark_core::schema::Database;

#[derive(Debug, clap::Subcommand)]
pub enum LanguageCommand {
    /// Add a language by two-letter code (e.g. fr)
    Add { code: LanguageCode },
    /// List stored languages
    List,
    /// List every supported language code
    Codes,
    /// Delete a language; its books are kept with no language
    Delete { id: LanguageId },
}

pub fn run(db: &Database, command: LanguageCommand) -> Result<()> {
    match command {
        LanguageCommand::Add { code } => {
            let language = db.ensure_language(code)?;
            let id = language.id.map(|id| id.to_string()).unwrap_or_default();
            println!("✓ Language {} ({}) is {}", language, code.label(), id);
        }
        LanguageCommand::List => {
            for language in db.list_languages()? {
                let id = language.id.map(|id| id.to_string()).unwrap_or_default();
                println!("{:>5}  {}  {}", id, language, language.lang.label());
            }
        }
        LanguageCommand::Codes => {
            for code in LanguageCode::ALL {
                println!("{}  {}", code, code.label());
            }
        }
        LanguageCommand::Delete { id } => {
            let language = db.get_language(id)?;
            db.delete_language(id)?;
            println!("✓ Deleted language {}", language);
        }
    }
    Ok(())
}
