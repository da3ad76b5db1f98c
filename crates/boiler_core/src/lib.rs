//! Core data-access layer for the boiler accounts store.
//! This crate owns the storage invariants; transports call in via services.

pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use context::{CancelReason, Context};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::email::{Email, EmailId};
pub use model::filter::{EmailsFilter, UsersFilter, FILTER_DEFAULT_LIMIT};
pub use model::user::{User, UserId};
pub use repo::email_repo::EmailRepository;
pub use repo::error::{RepoError, RepoResult, ScanError};
pub use repo::storage::{SqliteStorage, Storage};
pub use repo::user_repo::UserRepository;
pub use service::account_service::{AccountService, ErrorKind, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
