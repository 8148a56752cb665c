use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::model::book::Book;
use crate::model::entity::{Entity, EntityKind, EntityRef};
use crate::model::ids::{BookId, InstanceId};
use crate::schema::fields::{FieldDef, FieldKind, OnDelete};

/// Loan availability of a physical copy.
///
/// The catalog does not restrict transitions: any status may follow any
/// other, and no status implies anything about `due_back`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub const ALL: [Self; 4] = [
        Self::Maintenance,
        Self::OnLoan,
        Self::Available,
        Self::Reserved,
    ];

    /// `(code, label)` pairs as persisted and displayed.
    pub const CHOICES: &'static [(&'static str, &'static str)] = &[
        ("m", "Maintenance"),
        ("o", "On loan"),
        ("a", "Available"),
        ("r", "Reserved"),
    ];

    /// The single-letter persisted code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Maintenance => "m",
            Self::OnLoan => "o",
            Self::Available => "a",
            Self::Reserved => "r",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Maintenance => "Maintenance",
            Self::OnLoan => "On loan",
            Self::Available => "Available",
            Self::Reserved => "Reserved",
        }
    }

    /// Parse either a persisted code (`o`) or a label (`On loan`, any case).
    pub fn parse_loose(s: &str) -> Result<Self, ValidationError> {
        s.parse::<Self>().or_else(|err| {
            Self::ALL
                .into_iter()
                .find(|status| status.label().eq_ignore_ascii_case(s.trim()))
                .ok_or(err)
        })
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for LoanStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(Self::Maintenance),
            "o" => Ok(Self::OnLoan),
            "a" => Ok(Self::Available),
            "r" => Ok(Self::Reserved),
            _ => Err(ValidationError::InvalidChoice {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for LoanStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LoanStatus> for String {
    fn from(status: LoanStatus) -> Self {
        status.code().to_string()
    }
}

const ID: FieldDef = FieldDef::text("id", "ID")
    .kind(FieldKind::Uuid)
    .primary_key()
    .help_text("Unique ID for this particular book copy across whole library");
const BOOK: FieldDef = FieldDef::text("book", "Book")
    .kind(FieldKind::ForeignKey)
    .relation(EntityKind::Book, OnDelete::Restrict);
const IMPRINT: FieldDef = FieldDef::text("imprint", "Imprint").max_length(200);
const DUE_BACK: FieldDef = FieldDef::text("due_back", "Due back")
    .kind(FieldKind::Date)
    .optional();
const STATUS: FieldDef = FieldDef::text("status", "Status")
    .kind(FieldKind::Choice(LoanStatus::CHOICES))
    .max_length(1)
    .default("m")
    .help_text("Book availability");

/// A physical, trackable copy of a [`Book`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInstance {
    pub id: InstanceId,
    pub book: BookId,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
}

impl BookInstance {
    /// A new copy with a freshly generated identifier, in maintenance.
    #[must_use]
    pub fn new(book: BookId, imprint: impl Into<String>) -> Self {
        Self {
            id: InstanceId::new(),
            book,
            imprint: imprint.into(),
            due_back: None,
            status: LoanStatus::default(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: LoanStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_due_back(mut self, due_back: NaiveDate) -> Self {
        self.due_back = Some(due_back);
        self
    }

    /// Display form of this copy: `"<id>, <book title>"`.
    ///
    /// `book` should be the record this copy references.
    pub fn label<'a>(&'a self, book: &'a Book) -> InstanceLabel<'a> {
        InstanceLabel {
            instance: self,
            book,
        }
    }
}

/// Borrowed pairing of a copy and its book, rendered as the copy's display form.
#[derive(Debug, Clone, Copy)]
pub struct InstanceLabel<'a> {
    instance: &'a BookInstance,
    book: &'a Book,
}

impl fmt::Display for InstanceLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.instance.id, self.book.title)
    }
}

impl Entity for BookInstance {
    const KIND: EntityKind = EntityKind::BookInstance;
    const FIELDS: &'static [FieldDef] = &[ID, BOOK, IMPRINT, DUE_BACK, STATUS];
    const ORDERING: &'static [&'static str] = &["due_back"];

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::BookInstance(self.id))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        IMPRINT.check_text(&self.imprint)?;
        STATUS.check_choice(self.status.code())
    }
}
