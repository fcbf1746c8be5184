use clap::{Parser, Subcommand};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::info;

use restaurant_api::migrator::Migrator;

#[derive(Parser)]
#[command(name = "migration", about = "Manage the restaurant database schema")]
struct Cli {
    /// Database URL; falls back to DATABASE_URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://restaurant.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply all pending migrations (default)
    Up,
    /// Roll back the given number of migrations
    Down {
        #[arg(short, long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop every table and re-apply all migrations
    Fresh,
    /// Show applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    info!("Connecting to database: {}", cli.database_url);

    let mut options = ConnectOptions::new(cli.database_url);
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);
    let db = Database::connect(options).await?;

    match cli.command.unwrap_or(Command::Up) {
        Command::Up => {
            Migrator::up(&db, None).await?;
            info!("Migrations applied");
        }
        Command::Down { steps } => {
            Migrator::down(&db, Some(steps)).await?;
            info!("Rolled back {} migration(s)", steps);
        }
        Command::Fresh => {
            Migrator::fresh(&db).await?;
            info!("Schema recreated");
        }
        Command::Status => {
            Migrator::status(&db).await?;
        }
    }

    Ok(())
}
