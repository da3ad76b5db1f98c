//! Domain model for users and their email addresses.
//!
//! # Responsibility
//! - Define the entities returned by repositories and services.
//! - Define read-only filter shapes used to query them.
//!
//! # Invariants
//! - Every persisted entity is identified by a strictly positive integer id.
//! - Entities are plain values; they never hold storage handles.

pub mod email;
pub mod filter;
pub mod user;
