//! # Student Registry Client
//!
//! Command line client for the registry server. It talks to the server's
//! REST API through a record store gateway that falls back to a local JSON
//! slot whenever the server cannot be reached, and computes its reports
//! from an in-memory roster with the same domain services the server uses.
//!
//! ```text
//! CLI (registry)
//!     ↓
//! RegistryClient (roster + domain services)
//!     ↓
//! FallbackStudentStore
//!     ↓                  ↓
//! HttpStudentStore   LocalSlotStore
//! ```

pub mod app;
pub mod cli;
pub mod gateway;
pub mod refresh;
pub mod services;

pub use app::{ClientSettings, RegistryClient};
pub use gateway::{FallbackStudentStore, HttpStudentStore, LocalSlotStore};
pub use refresh::{RefreshConfig, Roster};
pub use services::ApiClient;
