//! HMS auth service
//!
//! Serves the staff login/refresh API and offers token tooling for operators.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use clap::{Parser, Subcommand};
use hms_api::{
    store::{InMemoryUserStore, UserRecord, UserStore},
    ApiServer, ApiServerConfig,
};
use hms_auth::config::{DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS};
use hms_auth::{hash_password, AuthConfig, Principal, Role, TokenIssuer, TokenVerifier};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// HMS - staff authentication for the hospital records backend
#[derive(Parser, Debug)]
#[command(name = "hms")]
#[command(about = "HMS - staff authentication for the hospital records backend")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ", built ", env!("BUILD_TIME"), ")"))]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the auth API server
    #[command(long_about = r#"
Run the auth API server (register, login, refresh, me).

EXAMPLES:
  hms serve --jwt-secret "$HMS_JWT_SECRET" \
    --seed-user alice:hunter22:doctor \
    --seed-user bob:hunter22:receptionist

ENVIRONMENT VARIABLES:
  HMS_BIND               Address to bind (default 127.0.0.1:3000)
  HMS_JWT_SECRET         Shared HMAC secret for signing tokens
  HMS_ACCESS_TTL_SECS    Access token lifetime in seconds
  HMS_REFRESH_TTL_SECS   Refresh token lifetime in seconds
    "#)]
    Serve {
        /// Address to bind the API server
        #[arg(long, env = "HMS_BIND", default_value = "127.0.0.1:3000")]
        bind: std::net::SocketAddr,

        /// Shared secret for signing and verifying tokens
        #[arg(long, env = "HMS_JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,

        /// Access token lifetime in seconds
        #[arg(long, env = "HMS_ACCESS_TTL_SECS", default_value_t = DEFAULT_ACCESS_TTL_SECS)]
        access_ttl_secs: i64,

        /// Refresh token lifetime in seconds
        #[arg(long, env = "HMS_REFRESH_TTL_SECS", default_value_t = DEFAULT_REFRESH_TTL_SECS)]
        refresh_ttl_secs: i64,

        /// Account to create at startup, as username:password:role (repeatable)
        #[arg(long = "seed-user", value_parser = parse_seed_user)]
        seed_users: Vec<SeedUser>,
    },

    /// Issue or inspect tokens offline
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Mint an access/refresh token pair
    Issue {
        /// Shared secret (must match the server's)
        #[arg(long, env = "HMS_JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,

        /// Subject ID (random if omitted)
        #[arg(long)]
        user_id: Option<Uuid>,

        #[arg(long)]
        username: String,

        /// doctor or receptionist
        #[arg(long)]
        role: Role,

        #[arg(long, default_value_t = DEFAULT_ACCESS_TTL_SECS)]
        access_ttl_secs: i64,

        #[arg(long, default_value_t = DEFAULT_REFRESH_TTL_SECS)]
        refresh_ttl_secs: i64,
    },

    /// Validate a token and print what it carries
    Inspect {
        #[arg(long, env = "HMS_JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,

        token: String,
    },
}

#[derive(Debug, Clone)]
struct SeedUser {
    username: String,
    password: String,
    role: Role,
}

fn parse_seed_user(value: &str) -> Result<SeedUser, String> {
    let mut parts = value.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(username), Some(password), Some(role))
            if !username.is_empty() && !password.is_empty() =>
        {
            Ok(SeedUser {
                username: username.to_string(),
                password: password.to_string(),
                role: role.parse()?,
            })
        }
        _ => Err(format!(
            "expected username:password:role, got '{}'",
            value
        )),
    }
}

/// Token lifetime from a seconds flag; range checks happen in `AuthConfig::validate`
fn lifetime(name: &str, seconds: i64) -> Result<Duration> {
    Duration::try_seconds(seconds)
        .with_context(|| format!("{} lifetime of {}s is out of range", name, seconds))
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

async fn seed(store: &InMemoryUserStore, users: Vec<SeedUser>) -> Result<()> {
    for user in users {
        let hash = hash_password(&user.password)
            .with_context(|| format!("Failed to hash password for '{}'", user.username))?;
        let record = UserRecord::new(user.username, hash, user.role);
        info!("Seeding {} account '{}'", record.role, record.username);
        store
            .insert(record)
            .await
            .context("Failed to seed user")?;
    }
    Ok(())
}

async fn serve(
    bind: std::net::SocketAddr,
    auth: AuthConfig,
    seed_users: Vec<SeedUser>,
) -> Result<()> {
    let issuer = TokenIssuer::from_config(&auth).context("Invalid token configuration")?;
    info!(
        "Access tokens live {}s, refresh tokens {}s",
        issuer.access_ttl().num_seconds(),
        issuer.refresh_ttl().num_seconds()
    );

    let store = InMemoryUserStore::new();
    seed(&store, seed_users).await?;

    let server = ApiServer::new(ApiServerConfig { bind_addr: bind }, issuer, Arc::new(store));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        _ = &mut ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
            Ok(())
        }
        result = server.start() => {
            if let Err(ref e) = result {
                error!("API server error: {:#}", e);
            }
            result
        }
    }
}

fn run_token_command(command: TokenCommand) -> Result<()> {
    match command {
        TokenCommand::Issue {
            jwt_secret,
            user_id,
            username,
            role,
            access_ttl_secs,
            refresh_ttl_secs,
        } => {
            if username.is_empty() {
                bail!("--username must not be empty");
            }

            let config = AuthConfig::new(
                jwt_secret.into_bytes(),
                lifetime("access", access_ttl_secs)?,
                lifetime("refresh", refresh_ttl_secs)?,
            );
            let issuer = TokenIssuer::from_config(&config).context("Invalid token configuration")?;

            let principal = Principal::new(user_id.unwrap_or_else(Uuid::new_v4), username, role);
            let pair = issuer
                .tokenize(&principal)
                .context("Failed to sign tokens")?;

            println!("Subject:       {}", principal.id);
            println!("Username:      {}", principal.username);
            println!("Role:          {}", principal.role);
            println!("Access token:  {}", pair.access_token);
            println!("Refresh token: {}", pair.refresh_token);
            Ok(())
        }
        TokenCommand::Inspect { jwt_secret, token } => {
            let verifier = TokenVerifier::new(jwt_secret.as_bytes());
            match verifier.authorize(token.trim()) {
                Ok(info) => {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                    Ok(())
                }
                Err(e) => bail!("Token rejected ({}): {}", e.code(), e),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            bind,
            jwt_secret,
            access_ttl_secs,
            refresh_ttl_secs,
            seed_users,
        } => {
            info!("HMS auth service starting...");
            let auth = AuthConfig::new(
                jwt_secret.into_bytes(),
                lifetime("access", access_ttl_secs)?,
                lifetime("refresh", refresh_ttl_secs)?,
            );
            serve(bind, auth, seed_users).await
        }
        Commands::Token(command) => run_token_command(command),
    }
}
