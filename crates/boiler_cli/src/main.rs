//! Operator CLI over the accounts store.
//!
//! # Responsibility
//! - Run one account command against a SQLite database file.
//! - Print results as JSON and exit non-zero on failure.
//!
//! Settings come from `BOILER_*` variables; `--db` overrides `BOILER_DB_PATH`.

use boiler_core::db::open_db;
use boiler_core::{
    init_logging, AccountService, Context, CoreConfig, EmailId, EmailsFilter, ServiceError,
    SqliteStorage, UserId, UsersFilter,
};
use clap::{Parser, Subcommand};
use log::error;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "boiler")]
#[command(about = "Manage users and their email addresses")]
struct Cli {
    /// SQLite database file, created on first use
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the core library is linked
    Ping,
    /// Print the core library version
    Version,
    /// Register a user
    AddUser { name: String },
    /// Show one user
    GetUser {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        user_id: UserId,
    },
    /// List users by id, bounded by `--limit` or `BOILER_DEFAULT_LIMIT`
    ListUsers {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
    },
    /// Delete a user and, through the schema, the user's emails
    DeleteUser {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        user_id: UserId,
    },
    /// Attach an address to a user
    AddEmail {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        user_id: UserId,
        address: String,
    },
    /// List a user's emails
    ListEmails {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        user_id: UserId,
    },
    /// Delete one email
    DeleteEmail {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        email_id: EmailId,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Version => "version",
            Self::AddUser { .. } => "add-user",
            Self::GetUser { .. } => "get-user",
            Self::ListUsers { .. } => "list-users",
            Self::DeleteUser { .. } => "delete-user",
            Self::AddEmail { .. } => "add-email",
            Self::ListEmails { .. } => "list-emails",
            Self::DeleteEmail { .. } => "delete-email",
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Value, String> {
    match cli.command {
        Command::Ping => return Ok(json!({ "ping": boiler_core::ping() })),
        Command::Version => return Ok(json!({ "version": boiler_core::core_version() })),
        _ => {}
    }

    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, log_dir).map_err(|err| err.to_string())?;
    }

    let db_path = resolve_db_path(cli.db, &config)?;
    let conn = open_db(&db_path).map_err(|err| format!("could not open database: {err}"))?;
    let storage = SqliteStorage::try_new(&conn).map_err(|err| err.to_string())?;
    let service = AccountService::new(storage);
    let ctx = Context::background();

    let name = cli.command.name();
    dispatch(&service, &ctx, &config, cli.command).map_err(|err| {
        error!("event=cli_command module=cli status=error command={name} error={err}");
        format!("{name}: {}", err.public_message())
    })
}

/// Store commands always need a file; an in-memory store would drop every write on exit.
fn resolve_db_path(flag: Option<PathBuf>, config: &CoreConfig) -> Result<PathBuf, String> {
    flag.or_else(|| config.db_path.clone())
        .ok_or_else(|| "no database configured; pass --db or set BOILER_DB_PATH".to_string())
}

fn dispatch(
    service: &AccountService<SqliteStorage<'_>>,
    ctx: &Context,
    config: &CoreConfig,
    command: Command,
) -> Result<Value, ServiceError> {
    let value = match command {
        Command::Ping | Command::Version => Value::Null,
        Command::AddUser { name } => json!({ "user_id": service.add_user(ctx, &name)? }),
        Command::GetUser { user_id } => json!({ "user": service.get_user(ctx, user_id)? }),
        Command::ListUsers { limit } => {
            let filter = UsersFilter::with_limit(limit.unwrap_or(config.default_limit));
            json!({ "users": service.filter_users(ctx, &filter)? })
        }
        Command::DeleteUser { user_id } => {
            service.delete_user(ctx, user_id)?;
            Value::Null
        }
        Command::AddEmail { user_id, address } => {
            json!({ "email_id": service.add_email(ctx, user_id, &address)? })
        }
        Command::ListEmails { user_id } => {
            let filter = EmailsFilter {
                limit: Some(config.default_limit),
                ..EmailsFilter::by_user(user_id)
            };
            json!({ "emails": service.filter_emails(ctx, &filter)? })
        }
        Command::DeleteEmail { email_id } => {
            service.delete_email(ctx, email_id)?;
            Value::Null
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{resolve_db_path, Cli, Command};
    use boiler_core::CoreConfig;
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_typed_arguments() {
        let cli = Cli::try_parse_from(["boiler", "--db", "/tmp/a.db", "add-email", "3", "a@b.io"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::AddEmail { user_id: 3, ref address } if address == "a@b.io"
        ));
        assert_eq!(cli.db.unwrap().to_str(), Some("/tmp/a.db"));

        let cli = Cli::try_parse_from(["boiler", "list-users", "--limit", "5"]).unwrap();
        assert!(matches!(cli.command, Command::ListUsers { limit: Some(5) }));
    }

    #[test]
    fn rejects_non_positive_ids_and_limits() {
        assert!(Cli::try_parse_from(["boiler", "get-user", "0"]).is_err());
        assert!(Cli::try_parse_from(["boiler", "delete-email", "-4"]).is_err());
        assert!(Cli::try_parse_from(["boiler", "list-users", "--limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["boiler", "get-user", "abc"]).is_err());
    }

    #[test]
    fn store_commands_require_a_database_file() {
        let err = resolve_db_path(None, &CoreConfig::default()).unwrap_err();
        assert!(err.contains("BOILER_DB_PATH"));

        let config = CoreConfig {
            db_path: Some(PathBuf::from("/srv/boiler.db")),
            ..CoreConfig::default()
        };
        assert_eq!(
            resolve_db_path(None, &config).unwrap(),
            PathBuf::from("/srv/boiler.db")
        );
        assert_eq!(
            resolve_db_path(Some(PathBuf::from("/tmp/cli.db")), &config).unwrap(),
            PathBuf::from("/tmp/cli.db")
        );
    }
}
