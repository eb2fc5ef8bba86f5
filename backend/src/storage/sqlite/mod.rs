//! SQLite-backed storage.

pub mod admin_repository;
pub mod connection;
pub mod student_repository;

pub use admin_repository::AdminRepository;
pub use connection::DbConnection;
pub use student_repository::StudentRepository;
