use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::model::entity::{Entity, EntityKind, EntityRef};
use crate::model::ids::GenreId;
use crate::schema::fields::{FieldDef, FieldKind};

const ID: FieldDef = FieldDef::text("id", "ID")
    .kind(FieldKind::AutoKey)
    .primary_key();
const NAME: FieldDef = FieldDef::text("name", "Name")
    .max_length(200)
    .help_text("Enter a book genre (e.g. Science Fiction)");

/// A descriptive tag that may apply to many books.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: Option<GenreId>,

    /// Display name (e.g., "Science Fiction").
    pub name: String,
}

impl Genre {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Entity for Genre {
    const KIND: EntityKind = EntityKind::Genre;
    const FIELDS: &'static [FieldDef] = &[ID, NAME];

    fn entity_ref(&self) -> Option<EntityRef> {
        self.id.map(EntityRef::Genre)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        NAME.check_text(&self.name)
    }
}
