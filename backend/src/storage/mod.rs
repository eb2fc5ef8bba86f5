//! # Storage Module
//!
//! Persistence for student registrations and administrator accounts.
//!
//! The domain layer only sees the traits in [`traits`]; the SQLite
//! implementation keeps one JSON document per student next to an indexed
//! email column so uniqueness is enforced by the database as well as by
//! the repository's own pre-check.

pub mod sqlite;
pub mod traits;

pub use sqlite::{AdminRepository, DbConnection, StudentRepository};
pub use traits::{AdminStorage, StudentStorage};
