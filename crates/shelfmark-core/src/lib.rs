//! Core catalog schema for shelfmark.
//!
//! This crate defines the library catalog data model (Book, Author, Genre,
//! Language, BookInstance), the field and constraint declarations that
//! describe it, and the SQLite schema that enforces those constraints.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod fixture;
pub mod model;
pub mod schema;
pub mod snapshot;

pub use error::{Error, Result, ValidationError};
pub use fixture::Fixture;
pub use snapshot::Snapshot;
