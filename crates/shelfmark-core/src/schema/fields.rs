//! Declarative field and constraint descriptors.
//!
//! Every entity publishes a static list of [`FieldDef`]s describing its
//! columns, the constraints writes must satisfy, and how its relations
//! behave when the referenced record is deleted. Presentation layers read
//! these to build forms; the models use them to validate writes.

use crate::error::ValidationError;
use crate::model::EntityKind;

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Database-assigned integer key.
    AutoKey,
    /// Random 128-bit identifier.
    Uuid,
    /// Free text.
    Text,
    /// Calendar date (`YYYY-MM-DD`).
    Date,
    /// A code drawn from a closed set of `(code, label)` pairs.
    Choice(&'static [(&'static str, &'static str)]),
    /// Reference to a single record of another entity.
    ForeignKey,
    /// Set of references through a join table.
    ManyToMany,
}

impl FieldKind {
    /// Short name used when describing the schema.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AutoKey => "auto",
            Self::Uuid => "uuid",
            Self::Text => "text",
            Self::Date => "date",
            Self::Choice(_) => "choice",
            Self::ForeignKey => "foreign key",
            Self::ManyToMany => "many-to-many",
        }
    }
}

/// What happens to a referencing record when its target is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Clear the reference and keep the record.
    SetNull,
    /// Refuse the delete while references exist.
    Restrict,
    /// Remove the referencing rows as well.
    Cascade,
}

impl OnDelete {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::SetNull => "SET NULL",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
        }
    }
}

/// Target and delete behaviour of a relation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub target: EntityKind,
    pub on_delete: OnDelete,
}

/// A single field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,

    /// Human-readable label.
    pub label: &'static str,

    pub kind: FieldKind,

    /// Upper bound on text length, in characters.
    pub max_length: Option<usize>,

    /// Required exact text length, in characters.
    pub exact_length: Option<usize>,

    /// Whether the stored value may be NULL.
    pub nullable: bool,

    /// Whether an empty value is accepted on write.
    pub blank: bool,

    pub unique: bool,
    pub primary_key: bool,

    /// Default persisted value, if any.
    pub default: Option<&'static str>,

    pub help_text: Option<&'static str>,
    pub relation: Option<Relation>,
}

impl FieldDef {
    /// A required text field with no other constraints.
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            max_length: None,
            exact_length: None,
            nullable: false,
            blank: false,
            unique: false,
            primary_key: false,
            default: None,
            help_text: None,
            relation: None,
        }
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub const fn exact_length(mut self, len: usize) -> Self {
        self.exact_length = Some(len);
        self
    }

    /// Allow both NULL and empty values.
    pub const fn optional(mut self) -> Self {
        self.nullable = true;
        self.blank = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.unique = true;
        self
    }

    pub const fn default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn help_text(mut self, text: &'static str) -> Self {
        self.help_text = Some(text);
        self
    }

    pub const fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub const fn relation(mut self, target: EntityKind, on_delete: OnDelete) -> Self {
        self.relation = Some(Relation { target, on_delete });
        self
    }

    /// Check a text value against this field's declared constraints.
    pub fn check_text(&self, value: &str) -> Result<(), ValidationError> {
        let len = value.chars().count();
        if value.trim().is_empty() {
            return if self.blank {
                Ok(())
            } else {
                Err(ValidationError::Required { field: self.name })
            };
        }
        if let Some(expected) = self.exact_length {
            if len != expected {
                return Err(ValidationError::WrongLength {
                    field: self.name,
                    expected,
                    actual: len,
                });
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(ValidationError::TooLong {
                    field: self.name,
                    max,
                    actual: len,
                });
            }
        }
        Ok(())
    }

    /// Check an optional text value; `None` is accepted only for nullable fields.
    pub fn check_optional_text(&self, value: Option<&str>) -> Result<(), ValidationError> {
        match value {
            Some(text) => self.check_text(text),
            None if self.nullable => Ok(()),
            None => Err(ValidationError::Required { field: self.name }),
        }
    }

    /// Check that `code` is one of this field's choices.
    pub fn check_choice(&self, code: &str) -> Result<(), ValidationError> {
        let FieldKind::Choice(choices) = self.kind else {
            return Ok(());
        };
        if choices.iter().any(|(c, _)| *c == code) {
            Ok(())
        } else {
            Err(ValidationError::InvalidChoice {
                field: self.name,
                value: code.to_string(),
            })
        }
    }
}

/// Schema description of one entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityDef {
    pub kind: EntityKind,
    pub fields: &'static [FieldDef],

    /// Default retrieval order, as field names.
    pub ordering: &'static [&'static str],
}

impl EntityDef {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}
