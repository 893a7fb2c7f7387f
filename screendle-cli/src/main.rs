use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use screendle_core::time::{today_in, tomorrow_in};
use screendle_core::{
    AssignmentStore, BatchOptions, Horizon, OnlineFallback, commit, format_date, parse_date, plan_batch,
};
use screendle_ingest::{classic_from_rows, extract_d1_rows, movies_from_rows, parse_catalog_csv, scales_from_rows};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

mod config;
mod logging;
mod sql;
mod state;
mod store_file;

use config::Config;
use store_file::JsonStore;

#[derive(Parser, Debug)]
#[command(name = "screendle", version, about = "Screendle daily puzzle scheduler")]
struct Cli {
    /// Config file (default: ~/.screendle/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pre-schedule Classic and Scales puzzles for the coming days
    Schedule {
        /// Days ahead to schedule
        #[arg(long)]
        days: Option<u32>,

        /// Classic repeat-avoidance window in days
        #[arg(long)]
        lookback: Option<u32>,

        /// First day to schedule, YYYY-MM-DD (default: tomorrow)
        #[arg(long)]
        start: Option<String>,

        /// Snapshot store to read (default from config)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output SQL file
        #[arg(long, default_value = "schedule.sql")]
        output: PathBuf,

        /// Print SQL to stdout instead of writing the file
        #[arg(long)]
        dry_run: bool,

        /// Also commit new assignments into the snapshot store
        #[arg(long)]
        apply: bool,
    },

    /// Show the puzzles for a day, recomputing when nothing was scheduled
    Today {
        /// Day to show, YYYY-MM-DD (default: today in the configured timezone)
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Load catalog or schedule rows into the snapshot store
    Import {
        /// Catalog CSV (id,tmdb_id,title,imdb_rating)
        #[arg(long, conflicts_with = "d1_json", required_unless_present = "d1_json")]
        csv: Option<PathBuf>,

        /// Saved output of `wrangler d1 execute`
        #[arg(long)]
        d1_json: Option<PathBuf>,

        /// What the D1 rows contain
        #[arg(long, value_enum, default_value_t = ImportKind::Movies)]
        kind: ImportKind,

        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Config file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ImportKind {
    Movies,
    Classic,
    Scales,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Schedule {
            days,
            lookback,
            start,
            store,
            output,
            dry_run,
            apply,
        } => {
            let cfg = config::load_config(config_path)?;
            let store_path = store_path(&cfg, store)?;
            let start = match start {
                Some(s) => parse_date(&s)?,
                None => tomorrow_in(&cfg.schedule.timezone, Utc::now())?,
            };
            let horizon = Horizon::new(start)
                .with_days(days.unwrap_or(cfg.schedule.days))
                .with_lookback(lookback.unwrap_or(cfg.schedule.lookback));
            schedule(&cfg, &store_path, horizon, &output, dry_run, apply).await?;
        }

        Command::Today { date, store } => {
            let cfg = config::load_config(config_path)?;
            let store_path = store_path(&cfg, store)?;
            let date = match date {
                Some(s) => parse_date(&s)?,
                None => today_in(&cfg.schedule.timezone, Utc::now())?,
            };
            today(&cfg, &store_path, date).await?;
        }

        Command::Import {
            csv,
            d1_json,
            kind,
            store,
        } => {
            let cfg = config::load_config(config_path)?;
            let store_path = store_path(&cfg, store)?;
            import(&store_path, csv, d1_json, kind).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(config_path)?,
            ConfigCommand::Show => {
                let cfg = config::load_config(config_path)?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn store_path(cfg: &Config, flag: Option<PathBuf>) -> Result<PathBuf> {
    match flag {
        Some(p) => Ok(p),
        None => cfg.store_path(),
    }
}

async fn load_store(path: &Path) -> Result<JsonStore> {
    if !path.exists() {
        bail!(
            "Store not found: {} (run: screendle import --csv <movies.csv>)",
            path.display()
        );
    }
    JsonStore::load(path).await
}

async fn schedule(
    cfg: &Config,
    store_path: &Path,
    horizon: Horizon,
    output: &Path,
    dry_run: bool,
    apply: bool,
) -> Result<()> {
    let mut store = load_store(store_path).await?;
    let span = horizon.span();
    info!(
        range = %format!("{} -> {}", format_date(span.start), format_date(span.end)),
        days = horizon.days,
        lookback = horizon.lookback,
        source = %store_path.display(),
        "scheduling"
    );

    let options = BatchOptions {
        horizon,
        salts: cfg.salts,
        max_exhausted_days: cfg.schedule.max_exhausted_days,
    };
    let plan = plan_batch(&store, &options)?;

    if !plan.classic.exhausted.is_empty() {
        warn!(
            days = plan.classic.exhausted.len(),
            first = %format_date(plan.classic.exhausted[0]),
            "classic repeats were allowed; consider a shorter lookback or a larger catalog"
        );
    }
    info!(
        classic_new_days = plan.classic.assignments.len(),
        scales_new_days = plan.scales.days_scheduled,
        scales_new_rounds = plan.scales.rounds.len(),
        "generated"
    );

    let sql = sql::render(&plan, &store_path.display().to_string(), Utc::now());
    if dry_run {
        print!("{sql}");
    } else {
        std::fs::write(output, &sql).with_context(|| format!("write {}", output.display()))?;
        info!(path = %output.display(), "sql written");
    }

    if apply {
        let summary = commit(&mut store, &plan)?;
        store.save().await?;
        info!(
            classic = summary.classic_written,
            scales = summary.scales_written,
            store = %store.path().display(),
            "applied to store"
        );
    }

    Ok(())
}

async fn today(cfg: &Config, store_path: &Path, date: NaiveDate) -> Result<()> {
    let store = load_store(store_path).await?;
    let fallback = OnlineFallback::new(cfg.schedule.lookback, cfg.salts);

    let classic = fallback.classic(&store, date, &mut rand::thread_rng());
    let scales = fallback.scales(&store, date);
    let titles = store.titles();
    let title = |id: i64| titles.get(&id).copied().unwrap_or("");

    let out = json!({
        "date": format_date(date),
        "classic": {
            "tmdb_id": classic.movie,
            "title": title(classic.movie),
            "source": classic.level,
        },
        "scales": {
            "source": scales.level,
            "rounds": scales.rounds.iter().map(|r| json!({
                "round": r.round,
                "movie_a": { "tmdb_id": r.movie_a, "title": title(r.movie_a) },
                "movie_b": { "tmdb_id": r.movie_b, "title": title(r.movie_b) },
            })).collect::<Vec<_>>(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn import(store_path: &Path, csv: Option<PathBuf>, d1_json: Option<PathBuf>, kind: ImportKind) -> Result<()> {
    let mut store = JsonStore::load_or_empty(store_path).await?;

    if let Some(csv_path) = csv {
        if kind != ImportKind::Movies {
            bail!("--csv only imports the movie catalog");
        }
        let parsed = parse_catalog_csv(&csv_path)?;
        report_skipped(&parsed.skipped);
        let rated = parsed.records.iter().filter(|m| m.is_eligible()).count();
        println!(
            "Imported {} movies ({} rated) from {}, replacing {}",
            parsed.records.len(),
            rated,
            csv_path.display(),
            store.catalog().len()
        );
        store.replace_catalog(parsed.records);
    } else if let Some(json_path) = d1_json {
        let raw = tokio::fs::read_to_string(&json_path)
            .await
            .with_context(|| format!("read {}", json_path.display()))?;
        let rows = extract_d1_rows(&raw).with_context(|| format!("parsing {}", json_path.display()))?;
        match kind {
            ImportKind::Movies => {
                let parsed = movies_from_rows(&rows);
                report_skipped(&parsed.skipped);
                println!(
                    "Imported {} movies from {}, replacing {}",
                    parsed.records.len(),
                    json_path.display(),
                    store.catalog().len()
                );
                store.replace_catalog(parsed.records);
            }
            ImportKind::Classic => {
                let parsed = classic_from_rows(&rows);
                report_skipped(&parsed.skipped);
                let mut written = 0;
                for a in parsed.records {
                    written += store.insert_classic(a)? as usize;
                }
                println!("Imported {written} classic days from {}", json_path.display());
            }
            ImportKind::Scales => {
                let parsed = scales_from_rows(&rows);
                report_skipped(&parsed.skipped);
                let mut written = 0;
                for r in parsed.records {
                    written += store.insert_scales(r)? as usize;
                }
                println!("Imported {written} scales rounds from {}", json_path.display());
            }
        }
    }

    store.save().await?;
    println!("Store: {}", store.path().display());
    Ok(())
}

fn report_skipped(skipped: &[screendle_ingest::RowIssue]) {
    for issue in skipped {
        warn!(row = issue.row, reason = %issue.reason, "skipped row");
    }
}
