pub mod author;
pub mod book;
pub mod config;
pub mod copy;
pub mod data;
pub mod genre;
pub mod language;
pub mod schema;

pub use author::AuthorCommand;
pub use book::BookCommand;
pub use config::ConfigCommand;
pub use copy::CopyCommand;
pub use genre::GenreCommand;
pub use language::LanguageCommand;
