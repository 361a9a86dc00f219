#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use taxipark_server::{auth, build_router, AppState, ServerConfig};
use taxipark_store::{drivers, schema, Store};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "taxipark", version, about = "Taxi park record management service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create the database schema if it does not exist.
    InitDb,
    /// Create a superuser account for the back office.
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long)]
        license_number: String,
    },
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn open_store(config: &ServerConfig) -> Store {
    Store::with_max_connections(&config.db_path, config.max_connections)
}

fn init_db(config: &ServerConfig) -> Result<(), String> {
    let store = open_store(config);
    let conn = store.connect().map_err(|e| e.to_string())?;
    schema::init_schema(&conn).map_err(|e| e.to_string())?;
    info!(path = %config.db_path.display(), "database initialized");
    Ok(())
}

fn create_superuser(
    config: &ServerConfig,
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    license_number: String,
) -> Result<(), String> {
    let license = taxipark_model::LicenseNumber::parse(&license_number).map_err(|e| e.0)?;
    let password_hash = auth::hash_password(&password).map_err(|e| e.to_string())?;
    let store = open_store(config);
    let conn = store.connect().map_err(|e| e.to_string())?;
    schema::init_schema(&conn).map_err(|e| e.to_string())?;
    let driver = drivers::create(
        &conn,
        &drivers::NewDriver {
            username,
            password_hash,
            first_name,
            last_name,
            license_number: license,
            is_superuser: true,
        },
    )
    .map_err(|e| e.to_string())?;
    info!(username = %driver.username, id = driver.id.0, "superuser created");
    Ok(())
}

async fn serve(config: ServerConfig) -> Result<(), String> {
    let store = open_store(&config);
    let conn = store.connect().map_err(|e| e.to_string())?;
    schema::init_schema(&conn).map_err(|e| e.to_string())?;
    drop(conn);

    let bind = config.bind.clone();
    let state = AppState::new(store, config).map_err(|e| e.to_string())?;
    let app = build_router(state);

    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|e| format!("bind {bind} failed: {e}"))?;
    info!("taxipark listening on {bind}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();
    let config = ServerConfig::from_env();
    init_tracing(config.log_json);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::InitDb => init_db(&config),
        Command::CreateSuperuser {
            username,
            password,
            first_name,
            last_name,
            license_number,
        } => create_superuser(
            &config,
            username,
            password,
            first_name,
            last_name,
            license_number,
        ),
    }
}
