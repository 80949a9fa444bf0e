use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use chrono::Duration;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio::auth::DEFAULT_TOKEN_TTL_HOURS;
use folio::config::{JWT_SECRET_ENV, ServerConfig, SigningKey};
use folio::server::{AppState, create_router};
use folio::store::{SqliteStore, Store};

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "A personal portfolio server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database and signing key
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Secret used to sign identity tokens. Falls back to the key file
        /// written by `folio admin init`.
        #[arg(long, env = JWT_SECRET_ENV, hide_env_values = true)]
        jwt_secret: Option<String>,

        /// Lifetime of issued tokens, in hours
        #[arg(long, env = "FOLIO_TOKEN_TTL_HOURS", default_value_t = DEFAULT_TOKEN_TTL_HOURS)]
        token_ttl_hours: i64,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and signing key)
    Init {
        /// Data directory for the database and signing key
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

fn run_init(data_dir: String) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir: PathBuf::from(data_dir),
        ..ServerConfig::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let key_file = SigningKey::key_path(&config.data_dir);
    if key_file.exists() {
        bail!(
            "Server already initialized. Signing key exists at: {}",
            key_file.display()
        );
    }

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    fs::write(&key_file, SigningKey::generate_secret())?;

    #[cfg(unix)]
    set_restrictive_permissions(&key_file);

    println!();
    println!("Database created at: {}", config.db_path().display());
    println!("Signing key written to: {}", key_file.display());
    println!();
    println!("Start the server with 'folio serve --data-dir {}'", config.data_dir.display());
    println!();

    Ok(())
}

async fn run_serve(config: ServerConfig, jwt_secret: Option<String>) -> anyhow::Result<()> {
    if config.token_ttl <= Duration::zero() {
        bail!("Token lifetime must be positive");
    }

    let signing_key = SigningKey::resolve(jwt_secret.as_deref(), &config.data_dir)?;

    fs::create_dir_all(&config.data_dir)?;
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let state = Arc::new(AppState::new(
        Arc::new(store),
        &signing_key,
        config.token_ttl,
    ));

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!(
        "Starting server on {} (tokens valid for {}h)",
        addr,
        config.token_ttl.num_hours()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; variables may come from the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir } => {
                run_init(data_dir)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            jwt_secret,
            token_ttl_hours,
        } => {
            let Some(token_ttl) = Duration::try_hours(token_ttl_hours) else {
                bail!("Token lifetime of {token_ttl_hours}h is out of range");
            };

            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                token_ttl,
            };

            run_serve(config, jwt_secret).await?;
        }
    }

    Ok(())
}
