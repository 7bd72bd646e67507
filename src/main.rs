use std::sync::Arc;

use clap::{Parser, Subcommand};
use tackpad::api::{ApiError, BoardApi, HttpBoardApi};
use tackpad::bookmarks::{BoardRegistry, BookmarkError};
use tackpad::config::{ClientConfig, ConfigError};
use tackpad::error::ErrorCode;
use tackpad::persistence::{PersistError, StaticPassword, decrypt_payload};
use tackpad::session::BoardSession;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Bookmark(#[from] BookmarkError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("board {0} is not in the local registry")]
    UnknownBoard(String),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Api(e) => e.error_code(),
            Self::Persist(e) => e.error_code(),
            Self::Bookmark(e) => e.error_code(),
            Self::InvalidJson(_) => "E_INVALID_JSON",
            Self::UnknownBoard(_) => "E_UNKNOWN_BOARD",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tackpad", about = "TackPad board client")]
struct Cli {
    /// Board API root; overrides TACKPAD_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Password for encrypted boards.
    #[arg(long, env = "TACKPAD_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a board (`load` resumes the last one, `create` makes a new one)
    /// and print its items.
    Show {
        #[arg(default_value = "load")]
        board_id: String,
    },
    /// Export boards as JSON. Defaults to every remembered board.
    Export {
        board_ids: Vec<String>,
        /// Decrypt encrypted boards with --password before printing.
        #[arg(long)]
        decrypt: bool,
    },
    /// Ask the server to add a link item to a board.
    Bookmark { board_id: String, url: String },
    /// List remembered boards, most recent last.
    Boards,
    /// Remove a board from the local registry.
    Forget { board_id: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }

    let result = match cli.command {
        Command::Show { board_id } => run_show(&config, &board_id, cli.password).await,
        Command::Export { board_ids, decrypt } => {
            run_export(&config, &board_ids, decrypt.then_some(cli.password).flatten()).await
        }
        Command::Bookmark { board_id, url } => run_bookmark(&config, &board_id, &url).await,
        Command::Boards => run_boards(&config),
        Command::Forget { board_id } => run_forget(&config, &board_id),
    };
    if let Err(e) = &result {
        tracing::error!(error = %e, error_code = e.error_code(), "command failed");
    }
    result
}

async fn run_show(config: &ClientConfig, board_id: &str, password: Option<String>) -> Result<(), CliError> {
    let api = Arc::new(HttpBoardApi::new(config)?);
    let registry = BoardRegistry::open(&config.bookmarks_path)?;
    let mut session = BoardSession::new(api, config, registry);
    session.load(board_id, &StaticPassword(password)).await?;

    let store = session.store();
    println!(
        "{} ({}){}",
        store.title().unwrap_or(tackpad::bookmarks::UNTITLED),
        store.board_id().unwrap_or_default(),
        if session.is_encrypted() { " [encrypted]" } else { "" }
    );
    for item in store.items() {
        let r = item.rect();
        let lock = if item.is_locked() { " locked" } else { "" };
        println!("  {:<20} {:>8.1} {:>8.1} {:>7.1}x{:<7.1}{lock}", item.id, r.x, r.y, r.width, r.height);
    }
    Ok(())
}

async fn run_export(config: &ClientConfig, board_ids: &[String], password: Option<String>) -> Result<(), CliError> {
    let api = HttpBoardApi::new(config)?;
    let registry = BoardRegistry::open(&config.bookmarks_path)?;
    let mut boards = api.export_boards(&registry.export_entries(board_ids)).await?;

    if let Some(password) = &password {
        for board in &mut boards {
            board.data = decrypt_payload(std::mem::take(&mut board.data), password).await?;
        }
    }
    println!("{}", serde_json::to_string_pretty(&boards)?);
    Ok(())
}

async fn run_bookmark(config: &ClientConfig, board_id: &str, url: &str) -> Result<(), CliError> {
    let api = HttpBoardApi::new(config)?;
    let reply = api.add_bookmark(board_id, url).await?;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

fn run_boards(config: &ClientConfig) -> Result<(), CliError> {
    let registry = BoardRegistry::open(&config.bookmarks_path)?;
    for entry in registry.entries() {
        println!("{:<24} {}", entry.board_id, entry.title);
    }
    Ok(())
}

fn run_forget(config: &ClientConfig, board_id: &str) -> Result<(), CliError> {
    let mut registry = BoardRegistry::open(&config.bookmarks_path)?;
    if !registry.forget(board_id) {
        return Err(CliError::UnknownBoard(board_id.to_owned()));
    }
    registry.save()?;
    println!("forgot {board_id}");
    Ok(())
}
