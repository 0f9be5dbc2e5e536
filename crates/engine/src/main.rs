//! Binary entrypoint. This core's world/session/combat ports are
//! deliberately external collaborators (§1 Non-goals) with no concrete
//! adapter in this crate, so this entrypoint can't stand up a full tick
//! scheduler on its own — there is nothing here to implement
//! `RoomDirectoryPort`/`SessionManagerPort`/etc. against. What it *can*
//! do standalone is schema bootstrap and KB seeding (§6), which a
//! surrounding server binary would run before wiring the rest. CLI
//! subcommands are peripheral per §6 and parsed the teacher's way
//! (`xtask/src/main.rs`: bare `std::env::args()`, no argument-parsing
//! crate).

use std::process::ExitCode;

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;

use loreweave_engine::config::EngineConfig;
use loreweave_engine::infrastructure::kb_seed;
use loreweave_engine::infrastructure::persistence::{bootstrap_schema, SqliteWorldKnowledgeBase};

fn usage() -> &'static str {
    "Usage: loreweave-engine [--migrate] [--seed-kb <path>]\n\n\
     --migrate        bootstrap the SQLite schema and exit\n\
     --seed-kb <path> bootstrap the schema, then load a KB seed file into it"
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "loreweave_engine=info".into()),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut migrate = false;
    let mut seed_path: Option<String> = None;

    loop {
        match args.next().as_deref() {
            Some("--migrate") => migrate = true,
            Some("--seed-kb") => {
                seed_path = Some(args.next().context("--seed-kb requires a path argument")?);
            }
            Some("--help" | "-h") => {
                println!("{}", usage());
                return Ok(());
            }
            Some(other) => anyhow::bail!("unknown argument `{other}`\n\n{}", usage()),
            None => break,
        }
    }

    if !migrate && seed_path.is_none() {
        println!("{}", usage());
        return Ok(());
    }

    let config = EngineConfig::from_env().context("loading engine configuration")?;
    tracing::info!(connection = %config.memory.connection_string, "connecting to memory store");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.memory.connection_string)
        .await
        .context("connecting to the memory store")?;

    let report = bootstrap_schema(&pool).await.context("bootstrapping schema")?;
    tracing::info!(vector_support_activated = report.vector_support_activated, "schema ready");

    if let Some(path) = seed_path {
        let contents = std::fs::read_to_string(&path).with_context(|| format!("reading KB seed file {path}"))?;
        let kb = SqliteWorldKnowledgeBase::new(pool.clone());
        let count = kb_seed::load_into(&contents, &kb).await.context("loading KB seed file")?;
        tracing::info!(entries = count, path = %path, "KB seed file loaded");
    }

    Ok(())
}
