//! # IO Module
//!
//! Interface layer between HTTP clients and the domain logic.
//!
//! Translates requests into domain operations and domain results into the
//! JSON envelope `{success, data, message, error, errors, count}`, and
//! maps domain errors onto HTTP status codes.

pub mod rest;

pub use rest::*;
