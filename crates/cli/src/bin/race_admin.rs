use anyhow::Context;
use clap::{Parser, Subcommand};
use cli::render;
use storage::{
    Database,
    repository::race::RaceRepository,
    services::{
        category_assignment::{PgAssignmentStore, recalculate_categories},
        results_ranking::{CategoryFilter, results_board},
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "race-admin")]
#[command(about = "Race timing maintenance jobs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Recompute the category of every participant of a race
    RecalculateCategories {
        #[arg(long)]
        race: Uuid,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the ranked results of a race
    Results {
        #[arg(long)]
        race: Uuid,

        /// `ALL` or a category id
        #[arg(long, default_value = "ALL")]
        category: CategoryFilter,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("race_admin={},storage={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Connecting to database...");
    let db = Database::new(&cli.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Migrate => handle_migrate(&db).await,
        Commands::RecalculateCategories { race, dry_run } => {
            handle_recalculate(&db, race, dry_run).await
        }
        Commands::Results {
            race,
            category,
            json,
        } => handle_results(&db, race, category, json).await,
    }
}

async fn handle_migrate(db: &Database) -> anyhow::Result<()> {
    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    Ok(())
}

async fn handle_recalculate(db: &Database, race_id: Uuid, dry_run: bool) -> anyhow::Result<()> {
    let race = RaceRepository::new(db.pool())
        .find_by_id(race_id)
        .await
        .with_context(|| format!("Race {race_id} not found"))?;

    tracing::info!("Recalculating categories for {} ({})", race.name, race.race_date);

    let store = PgAssignmentStore::new(db.pool());
    let report = recalculate_categories(&store, race_id, dry_run)
        .await
        .context("Category recalculation failed")?;

    for ambiguous in &report.ambiguous {
        tracing::warn!(
            participant_id = %ambiguous.participant_id,
            chosen = %ambiguous.chosen_category_id,
            contenders = ambiguous.contender_ids.len(),
            "Participant fits several categories"
        );
    }

    print!("{}", render::recalculation_summary(&report));

    if !report.is_clean() {
        anyhow::bail!("{} participant(s) could not be updated", report.failures.len());
    }

    Ok(())
}

async fn handle_results(
    db: &Database,
    race_id: Uuid,
    category: CategoryFilter,
    json: bool,
) -> anyhow::Result<()> {
    let board = results_board(db.pool(), race_id, category)
        .await
        .with_context(|| format!("Failed to load results for race {race_id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        print!("{}", render::results_table(&board));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_recalculate_with_dry_run() {
        let cli = Cli::try_parse_from([
            "race-admin",
            "--database-url",
            "postgres://localhost/races",
            "recalculate-categories",
            "--race",
            "7b0e7c1e-3f41-4c55-9a3e-2d4a8f3b9c10",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::RecalculateCategories { race, dry_run } => {
                assert_eq!(race.to_string(), "7b0e7c1e-3f41-4c55-9a3e-2d4a8f3b9c10");
                assert!(dry_run);
            }
            _ => panic!("expected recalculate-categories"),
        }
    }

    #[test]
    fn test_results_category_defaults_to_all() {
        let cli = Cli::try_parse_from([
            "race-admin",
            "--database-url",
            "postgres://localhost/races",
            "results",
            "--race",
            "7b0e7c1e-3f41-4c55-9a3e-2d4a8f3b9c10",
        ])
        .unwrap();

        match cli.command {
            Commands::Results { category, json, .. } => {
                assert_eq!(category, CategoryFilter::All);
                assert!(!json);
            }
            _ => panic!("expected results"),
        }
    }

    #[test]
    fn test_results_rejects_unknown_category() {
        let parsed = Cli::try_parse_from([
            "race-admin",
            "--database-url",
            "postgres://localhost/races",
            "results",
            "--race",
            "7b0e7c1e-3f41-4c55-9a3e-2d4a8f3b9c10",
            "--category",
            "fastest",
        ]);

        assert!(parsed.is_err());
    }
}
