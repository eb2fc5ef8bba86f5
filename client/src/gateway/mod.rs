//! # Record Store Gateway
//!
//! Client-side implementations of `StudentStorage`:
//!
//! - [`HttpStudentStore`]: the registry server's REST API
//! - [`LocalSlotStore`]: a single JSON file holding the whole record list
//! - [`FallbackStudentStore`]: remote first, local slot when the remote is
//!   unreachable
//!
//! All three speak the same trait as the server's SQLite repository, so the
//! domain services run unchanged on top of any of them.

pub mod fallback;
pub mod local;
pub mod remote;

pub use fallback::{FallbackStudentStore, OFFLINE_WARNING};
pub use local::LocalSlotStore;
pub use remote::HttpStudentStore;

#[cfg(test)]
mod end_to_end;
