use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use movie_data_ingestor::models::raw::ProviderTag;
use movie_sync::{
    config::{SyncConfig, load_config_path},
    db::migrate,
    metrics::{
        portfolio::{
            TopField, movies_by_budget_range, portfolio_summary, profitable_movies, top_by,
            training_rows,
        },
        rollup::{genre_rollup, studio_rollup},
    },
    pipeline::{Pipeline, RunParams, refresh_details},
    providers::build_governor,
    store::Store,
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared_utils::logging::init_tracing;
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Movie business metrics: ingest, dedupe, report")]
struct Cli {
    /// TOML config (database and provider pacing).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,
    /// Overrides `[database] url` and `DATABASE_URL`.
    #[arg(long, global = true, value_name = "URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending migrations.
    Migrate,
    /// Pull listing pages from a provider into the store.
    Ingest {
        #[arg(long, value_parser = parse_provider)]
        provider: ProviderTag,
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Fetch full details for movies not yet stored.
        #[arg(long)]
        hydrate: bool,
    },
    /// Re-fetch details for stored movies and update them in place.
    Refresh {
        #[arg(long, value_parser = parse_provider)]
        provider: ProviderTag,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Delete a movie with its ratings, genre links and external ids.
    Delete {
        #[arg(long)]
        id: i32,
    },
    /// Re-derive every stored ROI from budget and revenue.
    Recompute,
    Report(ReportCmd),
}

#[derive(Args)]
struct ReportCmd {
    #[command(subcommand)]
    sub: ReportSub,
}

#[derive(Subcommand)]
enum ReportSub {
    Summary,
    Genres {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Studios {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Top {
        #[arg(long, default_value = "revenue")]
        by: TopField,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Profitable {
        #[arg(long)]
        limit: Option<usize>,
    },
    BudgetRange {
        #[arg(long)]
        min: Decimal,
        #[arg(long)]
        max: Decimal,
    },
    Training,
}

fn parse_provider(s: &str) -> Result<ProviderTag, String> {
    ProviderTag::parse(s).ok_or_else(|| format!("unknown provider {s:?} (expected tmdb or omdb)"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<SyncConfig> {
    let cfg = match &cli.config {
        Some(path) => load_config_path(path)?,
        None => SyncConfig::default(),
    };
    let mut cfg = cfg.with_env_overrides();
    if let Some(url) = &cli.database_url {
        cfg.database.url = url.clone();
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("info,movie_sync=debug,movie_data_ingestor=info")?;

    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;
    let db_url = cfg.database.url.as_str();

    match cli.cmd {
        Cmd::Migrate => {
            migrate::run_sqlite(db_url).with_context(|| format!("migrate {db_url}"))?;
            info!(db_url, "Migrations applied");
        }
        Cmd::Ingest {
            provider,
            pages,
            hydrate,
        } => {
            let params = RunParams::new(pages)?.with_hydration(hydrate);
            let governor = build_governor(provider, &cfg)?;
            let mut store = Store::open(db_url)?;
            let report = Pipeline::new(&mut store, governor).run(&params).await;
            print!("{report}");
        }
        Cmd::Refresh { provider, limit } => {
            let governor = build_governor(provider, &cfg)?;
            let mut store = Store::open(db_url)?;
            let report = refresh_details(&mut store, &governor, limit).await?;
            print!("{report}");
        }
        Cmd::Delete { id } => {
            let mut store = Store::open(db_url)?;
            if !store.delete_movie(id)? {
                bail!("movie {id} does not exist");
            }
            info!(movie_id = id, "Deleted movie");
        }
        Cmd::Recompute => {
            let mut store = Store::open(db_url)?;
            let changed = store.recompute_all()?;
            info!(changed, "Recomputed ROI");
        }
        Cmd::Report(ReportCmd { sub }) => {
            let mut store = Store::open(db_url)?;
            let conn = store.conn();
            match sub {
                ReportSub::Summary => print_json(&portfolio_summary(conn)?)?,
                ReportSub::Genres { limit } => print_json(&genre_rollup(conn, limit)?)?,
                ReportSub::Studios { limit } => print_json(&studio_rollup(conn, limit)?)?,
                ReportSub::Top { by, limit } => print_json(&top_by(conn, by, limit)?)?,
                ReportSub::Profitable { limit } => print_json(&profitable_movies(conn, limit)?)?,
                ReportSub::BudgetRange { min, max } => {
                    if min > max {
                        bail!("--min {min} is above --max {max}");
                    }
                    print_json(&movies_by_budget_range(conn, min, max)?)?
                }
                ReportSub::Training => print_json(&training_rows(conn)?)?,
            }
        }
    }

    Ok(())
}
