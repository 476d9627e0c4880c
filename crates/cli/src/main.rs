//! Rankboard — command-line access to SQLite-backed leaderboards
//!
//! Usage:
//!   rankboard rank 42 1500            — Set member 42's score
//!   rankboard leaders --page 2        — Show the second page
//!   rankboard --board weekly around 42

mod config;
mod output;

use clap::{Parser, Subcommand};
use engine::{Leaderboard, LeaderboardError, RankBackend, SqliteBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use config::{Overrides, Settings};

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser)]
#[command(name = "rankboard")]
#[command(about = "Ranked leaderboards with pages, windows and rank lookups", long_about = None)]
#[command(version = APP_VERSION)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Database file (env: RANKBOARD_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Leaderboard name (env: RANKBOARD_BOARD)
    #[arg(short, long, global = true)]
    board: Option<String>,

    /// Entries per page (env: RANKBOARD_PAGE_SIZE)
    #[arg(long, global = true)]
    page_size: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert a member or update its score
    Rank {
        id: u64,
        #[arg(allow_negative_numbers = true)]
        score: i64,
    },
    /// Remove a member
    Remove { id: u64 },
    /// Show a member's score and rank
    Member { id: u64 },
    /// Show one page of leaders
    Leaders {
        #[arg(short, long, default_value_t = 1)]
        page: u64,
    },
    /// Show the page-sized window around a member
    Around { id: u64 },
    /// Show the member at an absolute rank
    At { position: u64 },
    /// Count members on the board
    Count,
    /// Count pages on the board
    Pages,
    /// Remove every member of this board
    Clear,
    /// Remove every member of every board in the database
    Flush,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,persistence=debug,rankboard=debug,sqlx=warn")
    } else {
        EnvFilter::new("warn,engine=info,persistence=info,rankboard=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    let settings = Settings::resolve(Overrides {
        db_path: cli.db,
        board: cli.board,
        page_size: cli.page_size,
    })?;
    info!(
        version = APP_VERSION,
        board = %settings.board,
        db = %settings.db_path.display(),
        "Starting"
    );

    let backend = Arc::new(SqliteBackend::connect(&settings.database()).await?);
    let leaderboard = Leaderboard::new(backend.clone(), settings.leaderboard())?;

    let result = run(cli.command, &leaderboard, backend.as_ref(), cli.json).await;
    backend.close().await;
    result
}

async fn run(
    command: Commands,
    leaderboard: &Leaderboard,
    backend: &dyn RankBackend,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Commands::Rank { id, score } => {
            let member = leaderboard.rank_member(id, score).await?;
            output::print_member(Some(&member), "", json)?;
        }
        Commands::Remove { id } => {
            let removed = leaderboard.remove_member(id).await?;
            output::print_member(removed.as_ref(), &format!("with id {id}"), json)?;
        }
        Commands::Member { id } => {
            let member = leaderboard.get_member(id).await?;
            output::print_member(member.as_ref(), &format!("with id {id}"), json)?;
        }
        Commands::Leaders { page } => {
            let members = leaderboard.get_leaders(page).await?;
            output::print_members(&members, json)?;
        }
        Commands::Around { id } => match leaderboard.get_around_me(id).await {
            Ok(members) => output::print_members(&members, json)?,
            Err(LeaderboardError::NotFound(_)) => {
                output::print_member(None, &format!("with id {id}"), json)?
            }
            Err(e) => return Err(e.into()),
        },
        Commands::At { position } => {
            let member = leaderboard.get_member_by_rank(position).await?;
            output::print_member(member.as_ref(), &format!("at rank {position}"), json)?;
        }
        Commands::Count => {
            let total = leaderboard.total_members().await?;
            output::print_count("members", total, json)?;
        }
        Commands::Pages => {
            let pages = leaderboard.total_pages().await?;
            output::print_count("pages", pages, json)?;
        }
        Commands::Clear => {
            leaderboard.clear().await?;
            println!("Cleared board {}", leaderboard.name());
        }
        Commands::Flush => {
            Leaderboard::clear_all(backend).await?;
            println!("Cleared all boards");
        }
    }

    Ok(())
}
