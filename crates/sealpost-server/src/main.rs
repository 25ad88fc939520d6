//! Sealpost account service binary.
//!
//! # Usage
//!
//! ```bash
//! # Register (password from the environment keeps it out of shell history)
//! SEALPOST_PASSWORD='Secr3t!' sealpost-server --db accounts.redb register alice
//!
//! # Check a login without printing key material
//! SEALPOST_PASSWORD='Secr3t!' sealpost-server --db accounts.redb login alice
//!
//! # Publish a public key for senders
//! sealpost-server --db accounts.redb public-key alice
//! ```

use std::io::{self, Write};

use clap::{Parser, Subcommand};
use sealpost_proto::PublicKeyPayload;
use sealpost_server::{
    AccountConfig, AccountService, KdfHash, KdfParams, OsEntropy, RedbStorage, ServerError,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sealpost account service
#[derive(Parser, Debug)]
#[command(name = "sealpost-server")]
#[command(about = "Sealpost account and vault service")]
#[command(version)]
struct Args {
    /// Path to the account database
    #[arg(long, env = "SEALPOST_DB", default_value = "sealpost.redb")]
    db: String,

    /// PBKDF2 iterations for new vaults and verifiers
    #[arg(long, default_value_t = 100_000)]
    kdf_iterations: u32,

    /// PBKDF2 hash (sha256, sha512)
    #[arg(long, default_value = "sha256")]
    kdf_hash: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and its identity keypair
    Register {
        /// Username
        user: String,
        /// Password
        #[arg(long, env = "SEALPOST_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Verify credentials and unlock the vault
    Login {
        /// Username
        user: String,
        /// Password
        #[arg(long, env = "SEALPOST_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Change a password and re-wrap the vault
    Passwd {
        /// Username
        user: String,
        /// Current password
        #[arg(long, env = "SEALPOST_PASSWORD", hide_env_values = true)]
        password: String,
        /// New password
        #[arg(long, env = "SEALPOST_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },

    /// Print a user's public key as JSON
    PublicKey {
        /// Username
        user: String,
    },

    /// List registered users
    Users,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let hash: KdfHash = args.kdf_hash.parse().map_err(ServerError::Config)?;
    let kdf = KdfParams::new(args.kdf_iterations, hash)
        .map_err(|e| ServerError::Config(e.to_string()))?;

    let storage = RedbStorage::open(&args.db)
        .map_err(|e| ServerError::Config(format!("cannot open {}: {e}", args.db)))?;
    tracing::debug!(db = %args.db, "opened account database");

    let service = AccountService::new(storage, OsEntropy, AccountConfig { kdf });
    let output = match args.command {
        Command::Register { user, password } => {
            let public_key = service.register(&user, &password).await?;
            format!("registered {user} ({})", public_key.key_id())
        },
        Command::Login { user, password } => {
            let grant = service.login(&user, &password).await?;
            format!("unlocked {user} ({})", grant.identity().key_id())
        },
        Command::Passwd { user, password, new_password } => {
            service.change_password(&user, &password, &new_password).await?;
            format!("password changed for {user}")
        },
        Command::PublicKey { user } => {
            let payload = PublicKeyPayload::from_key(&service.public_key(&user)?);
            serde_json::to_string_pretty(&payload)?
        },
        Command::Users => service.users()?.join("\n"),
    };

    writeln!(io::stdout().lock(), "{output}")?;

    Ok(())
}
