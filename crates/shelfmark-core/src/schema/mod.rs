pub mod db;
pub mod fields;
pub mod migrations;

pub use db::Database;
pub use fields::{EntityDef, FieldDef, FieldKind, OnDelete, Relation};
pub use migrations::{Migration, MIGRATIONS};

use crate::model::{Author, Book, BookInstance, Entity, Genre, Language};

/// Schema descriptions of every catalog entity.
pub fn entities() -> [EntityDef; 5] {
    [
        Book::definition(),
        Author::definition(),
        Genre::definition(),
        Language::definition(),
        BookInstance::definition(),
    ]
}
