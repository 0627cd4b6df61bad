use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_library_server::config::{AppConfig, CliConfig, FileConfig};
use music_library_server::{
    open_library_db, run_server, LibraryStore, RequestsLoggingLevel, ServerConfig,
    SqliteLibraryStore, SqlitePlaylistStore, SqliteUserStore, UserManager,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the library database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Base directory for songs whose audio file path is relative.
    /// Defaults to the database directory.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8080)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Accept the X-User-Id header as the identity of the caller.
    #[clap(long)]
    pub trust_user_id_header: bool,

    /// TOML file whose values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            media_path: self.media_path.clone(),
            port: self.port,
            logging_level: self.logging_level,
            frontend_dir_path: self.frontend_dir_path.clone(),
            trust_user_id_header: self.trust_user_id_header,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Could not initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let db_path = config.library_db_path();
    info!("Opening SQLite library database at {:?}...", db_path);
    let db = open_library_db(&db_path)?;

    let library_store = Arc::new(SqliteLibraryStore::new(db.clone()));
    info!(
        "Library has {} artists, {} albums and {} songs",
        library_store.get_artists_count(),
        library_store.get_albums_count(),
        library_store.get_songs_count()
    );
    let playlist_store = Arc::new(SqlitePlaylistStore::new(db.clone()));
    let user_manager = Arc::new(UserManager::new(Arc::new(SqliteUserStore::new(db))));

    if config.trust_user_id_header {
        info!("Trusting the X-User-Id header for authentication");
    }
    info!("Serving audio files from {:?}", config.media_path);

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level,
        port: config.port,
        frontend_dir_path: config.frontend_dir_path,
        trust_user_id_header: config.trust_user_id_header,
        media_path: config.media_path,
    };

    info!("Ready to serve at port {}!", server_config.port);
    run_server(server_config, library_store, playlist_store, user_manager).await
}
