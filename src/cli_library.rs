use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_library_server::config::LIBRARY_DB_FILE_NAME;
use music_library_server::library::{NewSong, Song};
use music_library_server::{open_library_db, LibraryStore, SqliteLibraryStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Inspects and edits the song catalog without going through the server.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the library database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists every song.
    List,

    /// Lists the songs whose title contains the given text.
    Search { fragment: String },

    /// Adds a song, creating its artist and album if needed.
    Add {
        #[clap(long)]
        title: String,
        #[clap(long)]
        artist: String,
        #[clap(long)]
        album: String,
        /// Duration in seconds.
        #[clap(long, default_value_t = 0)]
        duration: i64,
        #[clap(long)]
        audio_file: Option<String>,
    },

    /// Deletes the song with the given id.
    Delete { id: i64 },

    /// Shows the song with the given id.
    Show { id: i64 },
}

fn print_songs(songs: &[Song]) {
    if songs.is_empty() {
        println!("No songs found.");
        return;
    }
    for song in songs {
        println!("{}", song);
    }
}

fn execute(store: &dyn LibraryStore, command: Command) -> Result<()> {
    match command {
        Command::List => print_songs(&store.list_songs()),
        Command::Search { fragment } => print_songs(&store.search_songs_by_title(&fragment)),
        Command::Add {
            title,
            artist,
            album,
            duration,
            audio_file,
        } => {
            if title.trim().is_empty() || artist.trim().is_empty() || album.trim().is_empty() {
                bail!("Title, artist and album cannot be blank.");
            }
            if duration < 0 {
                bail!("Duration cannot be negative.");
            }
            let song = NewSong {
                title: title.trim().to_string(),
                artist_name: artist.trim().to_string(),
                album_name: album.trim().to_string(),
                duration_seconds: duration,
                audio_file_path: audio_file,
            };
            match store.add_song(&song) {
                Some(id) => println!("Added song {}.", id),
                None => bail!("Could not add song {}.", song.title),
            }
        }
        Command::Delete { id } => {
            if !store.delete_song(id) {
                bail!("Song {} not found.", id);
            }
            println!("Deleted song {}.", id);
        }
        Command::Show { id } => match store.get_song(id) {
            Some(song) => {
                println!("{}", song);
                if let Some(path) = &song.audio_file_path {
                    println!("   audio: {}", path);
                }
            }
            None => bail!("Song {} not found.", id),
        },
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let db = open_library_db(cli_args.db_dir.join(LIBRARY_DB_FILE_NAME))?;
    let store = SqliteLibraryStore::new(db);
    execute(&store, cli_args.command)
}
