//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own transaction boundaries so repositories never commit on their own.
//! - Keep transport layers decoupled from storage details.

pub mod account_service;
