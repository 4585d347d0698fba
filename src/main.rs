use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsquiz::catalog::Catalog;
use newsquiz::config::Config;
use newsquiz::error::NewsquizErrorTrait;
use newsquiz::pipeline::{Pipeline, PipelineBuilder};
use newsquiz::render::RenderBackends;
use newsquiz::storage::{ArchiveRotation, RotationOutcome};

#[derive(Parser)]
#[command(
    name = "newsquiz",
    version,
    about = "Daily news and history image quiz generator",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (defaults to environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the web root
    #[arg(long, global = true)]
    web_root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rotate yesterday's quiz, render today's assets and publish
    Generate {
        /// Quiz date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Do not fetch the "on this day" feed
        #[arg(long, default_value = "false")]
        skip_on_this_day: bool,
    },

    /// Archive the published quiz if it belongs to an earlier date
    Rotate {
        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show the history selection and styles for a date without rendering
    Preview {
        /// Quiz date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(root) = cli.web_root.clone() {
        config.output.web_root = root;
    }

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("newsquiz starting");

    match cli.command {
        Commands::Generate {
            date,
            catalog,
            skip_on_this_day,
        } => {
            let date = date.unwrap_or_else(today);
            tracing::info!(
                date = %date,
                catalog = ?catalog,
                skip_on_this_day = %skip_on_this_day,
                "Starting generate command"
            );
            if let Some(path) = catalog {
                config.content.catalog_path = path;
            }
            if skip_on_this_day {
                config.feed.enabled = false;
            }
            generate(config, date).await?;
        }

        Commands::Rotate { date } => {
            let date = date.unwrap_or_else(today);
            tracing::info!(date = %date, "Starting rotate command");
            rotate(&config, date)?;
        }

        Commands::Preview { date, catalog } => {
            let date = date.unwrap_or_else(today);
            tracing::info!(date = %date, catalog = ?catalog, "Starting preview command");
            if let Some(path) = catalog {
                config.content.catalog_path = path;
            }
            preview(config, date)?;
        }
    }

    tracing::info!("newsquiz completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("newsquiz=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new(format!("newsquiz={level},warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    Catalog::from_file(&config.content.catalog_path).with_context(|| {
        format!(
            "Failed to load catalog {}",
            config.content.catalog_path.display()
        )
    })
}

async fn generate(config: Config, date: NaiveDate) -> Result<()> {
    config.validate()?;
    let catalog = load_catalog(&config)?;
    let pipeline = Pipeline::from_config(config, catalog)?;

    let report = match pipeline.run(date).await {
        Ok(report) => report,
        Err(e) if e.is_fatal() => {
            tracing::error!(
                category = e.category().label(),
                recoverable = e.is_recoverable(),
                error = %e,
                "Quiz generation failed"
            );
            return Err(e.into());
        }
        Err(e) => {
            tracing::warn!(
                category = e.category().label(),
                error = %e,
                "Quiz generation finished with errors"
            );
            return Ok(());
        }
    };

    println!("Quiz for {} published to {}", report.date, report.published.display());
    println!("  Rendered: {}", report.rendered);
    println!("  Skipped:  {}", report.skipped);
    println!("  Failed:   {}", report.failed);
    println!(
        "  On this day: {}",
        if report.on_this_day { "yes" } else { "no" }
    );
    Ok(())
}

fn rotate(config: &Config, date: NaiveDate) -> Result<()> {
    config.validate()?;
    let outcome = ArchiveRotation::new(&config.output)
        .rotate(date)
        .context("Archive rotation failed")?;

    match outcome {
        RotationOutcome::NothingPublished => println!("Nothing published yet"),
        RotationOutcome::Current => println!("Published quiz is already dated {date}"),
        RotationOutcome::AlreadyArchived { date } => {
            println!("{date} is already archived, waiting for today's quiz to be published")
        }
        RotationOutcome::Rotated {
            date,
            archived,
            missing,
            snapshot_written,
        } => {
            println!("Archived {date}");
            println!("  Assets archived: {archived}");
            if missing > 0 {
                println!("  Assets missing:  {missing}");
            }
            if !snapshot_written {
                println!("  Snapshot already existed, left unchanged");
            }
        }
    }
    Ok(())
}

fn preview(config: Config, date: NaiveDate) -> Result<()> {
    config.validate()?;
    let catalog = load_catalog(&config)?;
    let backends = RenderBackends::from_config(&config.render)?;
    let pipeline = PipelineBuilder::new(config, catalog, backends).build();

    let preview = pipeline.preview(date);
    println!("History selection for {} (seed {:#018x})", preview.date, preview.seed);
    for (i, (event, style)) in preview.featured.iter().enumerate() {
        println!(
            "  hi{}  {:>5}  {}  [{}]",
            i + 1,
            event.year,
            event.headline,
            style.name
        );
    }
    for (i, event) in preview.distractors.iter().enumerate() {
        println!("  hd{}  {:>5}  {}", i + 1, event.year, event.headline);
    }
    Ok(())
}
