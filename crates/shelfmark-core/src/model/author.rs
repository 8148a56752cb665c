use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::model::entity::{Entity, EntityKind, EntityRef};
use crate::model::ids::AuthorId;
use crate::schema::fields::{FieldDef, FieldKind};

const ID: FieldDef = FieldDef::text("id", "ID")
    .kind(FieldKind::AutoKey)
    .primary_key();
const FIRST_NAME: FieldDef = FieldDef::text("first_name", "First name").max_length(100);
const LAST_NAME: FieldDef = FieldDef::text("last_name", "Last name").max_length(100);
const DATE_OF_BIRTH: FieldDef = FieldDef::text("date_of_birth", "Date of birth")
    .kind(FieldKind::Date)
    .optional();

/// A person credited with writing books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<AuthorId>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

impl Author {
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: None,
        }
    }

    #[must_use]
    pub fn with_date_of_birth(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }
}

/// Renders as `"last_name, first_name"`.
impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.last_name, self.first_name)
    }
}

impl Entity for Author {
    const KIND: EntityKind = EntityKind::Author;
    const FIELDS: &'static [FieldDef] = &[ID, FIRST_NAME, LAST_NAME, DATE_OF_BIRTH];
    const ORDERING: &'static [&'static str] = &["last_name", "first_name"];

    fn entity_ref(&self) -> Option<EntityRef> {
        self.id.map(EntityRef::Author)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        FIRST_NAME.check_text(&self.first_name)?;
        LAST_NAME.check_text(&self.last_name)
    }
}
