#![allow(clippy::print_stdout)]

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use cafeteria_sentiment::config::AppConfig;
use cafeteria_sentiment::logging::{init_logging, OperationTimer};
use cafeteria_sentiment::metrics::MetricsCollector;
use cafeteria_sentiment::models::NewFeedback;
use cafeteria_sentiment::service::{Freshness, RecommendationService};
use cafeteria_sentiment::{CommentClassifier, Database, SentimentAggregator, SqliteSentimentRepository};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file layered over config/default and config/local
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute sentiment for every item with recent feedback
    Score {
        /// Compute as of this day instead of today (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Classify a single comment and print its word tally
    Classify {
        /// Comment text
        text: String,
    },
    /// Record one feedback submission
    Submit {
        /// Menu item being rated
        #[arg(short, long)]
        menu_item_id: i64,

        /// Star rating, 1 to 5
        #[arg(short, long)]
        rating: i64,

        /// Free-text comment
        #[arg(short = 't', long, default_value = "")]
        comment: String,

        /// Feedback day (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Import feedback from a CSV file (menu_item_id,rating,comment,feedback_date)
    Import {
        /// CSV file with a header row
        file: PathBuf,
    },
    /// Show the top recommended menu items
    Recommend {
        /// Number of items to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show menu items that are candidates for removal
    Discard,
    /// Average rating and feedback count per item over the last month
    Report,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load_from(cli.config.as_deref())?;

    // Held until exit so buffered file logs are flushed
    let _log_guard = init_logging(&config.logging)?;
    MetricsCollector::init()?;

    info!("Starting cafeteria-sentiment");

    let mut db_config = config.database.clone();
    db_config.url = config.get_database_url();
    let db = Database::from_config(&db_config).context("Failed to open database")?;

    match cli.command {
        Commands::Score { as_of } => score(&config, &db, as_of.as_deref()).await?,
        Commands::Classify { text } => classify(&config, &text)?,
        Commands::Submit {
            menu_item_id,
            rating,
            comment,
            date,
        } => {
            let feedback = NewFeedback {
                menu_item_id,
                rating,
                comment,
                feedback_date: date.as_deref().map(parse_date).transpose()?,
            };
            submit(&config, &db, vec![feedback])?;
        },
        Commands::Import { file } => {
            let rows = read_feedback_csv(&file)?;
            submit(&config, &db, rows)?;
        },
        Commands::Recommend { limit } => recommend(&config, &db, limit).await?,
        Commands::Discard => discard(&config, &db).await?,
        Commands::Report => report(&db)?,
    }

    Ok(())
}

fn service(config: &AppConfig, db: &Database) -> Result<RecommendationService<SqliteSentimentRepository>> {
    RecommendationService::from_config(SqliteSentimentRepository::new(db.clone()), config)
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").with_context(|| format!("Invalid date {value:?}, use YYYY-MM-DD"))
}

fn report_freshness(freshness: &Freshness) {
    if let Freshness::Stale(reason) = freshness {
        warn!(%reason, "Showing results from the last successful run");
        println!("(stale: {reason})");
    }
}

/// Run the scoring pipeline once
async fn score(config: &AppConfig, db: &Database, as_of: Option<&str>) -> Result<()> {
    let today = match as_of {
        Some(value) => parse_date(value)?,
        None => Local::now().date_naive(),
    };

    let service = service(config, db)?;
    let report = service.pipeline().run_as_of(today).await?;
    service.invalidate()?;

    println!(
        "Scored {} menu items from {} comments since {}",
        report.outcomes.len(),
        report.comments_fetched,
        report.since
    );
    for outcome in &report.outcomes {
        let record = &outcome.record;
        println!(
            "  item {:>5}  {:<20} score {:>3}  avg {:.2}  {:?}",
            outcome.menu_item_id, record.sentiment.as_str(), record.score, record.average_rating, outcome.status
        );
    }
    if !report.is_complete() {
        warn!(failed = report.failed(), "Some items kept their previous sentiment");
    }

    Ok(())
}

/// Classify one comment with the configured lexicon
fn classify(config: &AppConfig, text: &str) -> Result<()> {
    let lexicon = Arc::new(config.sentiment.load_lexicon()?);
    let classifier = CommentClassifier::new(lexicon, config.sentiment.intensifier_mode()?)?;
    let aggregator = SentimentAggregator::new(classifier);
    let aggregate = aggregator.aggregate(&[text]);
    let words = &aggregate.matched_words;

    println!("{} (score {})", aggregate.sentiment, aggregate.score);
    println!("  positive {:>3}  {}", words.positive_count, words.positive_words.join(", "));
    println!("  negative {:>3}  {}", words.negative_count, words.negative_words.join(", "));
    println!("  neutral  {:>3}  {}", words.neutral_count, words.neutral_words.join(", "));

    Ok(())
}

/// Store submissions and mark any cached run as out of date
fn submit(config: &AppConfig, db: &Database, rows: Vec<NewFeedback>) -> Result<()> {
    let timer = OperationTimer::new("feedback_import");
    let total = rows.len();
    let mut stored = 0usize;

    for (line, feedback) in rows.into_iter().enumerate() {
        match db.add_feedback(feedback) {
            Ok(row) => {
                stored += 1;
                info!(id = row.id, menu_item_id = row.menu_item_id, "Feedback recorded");
            },
            Err(e) => warn!(row = line + 1, error = %e, "Skipping feedback"),
        }
    }
    timer.finish();

    if stored > 0 {
        service(config, db)?.invalidate()?;
    }

    println!("Stored {stored} of {total} feedback rows");
    if stored < total {
        anyhow::bail!("{} feedback rows were rejected", total - stored);
    }
    Ok(())
}

fn read_feedback_csv(path: &Path) -> Result<Vec<NewFeedback>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for (index, row) in reader.deserialize::<NewFeedback>().enumerate() {
        rows.push(row.with_context(|| format!("Malformed CSV row {}", index + 1))?);
    }
    info!(rows = rows.len(), file = %path.display(), "Read feedback file");
    Ok(rows)
}

async fn recommend(config: &AppConfig, db: &Database, limit: Option<usize>) -> Result<()> {
    let served = service(config, db)?.recommendations(limit).await?;
    report_freshness(&served.freshness);

    if served.items.is_empty() {
        println!("No recommendations yet");
        return Ok(());
    }
    for (rank, item) in served.items.iter().enumerate() {
        let record = &item.record;
        println!(
            "{:>2}. item {:>5}  {:<20} score {:>3}  avg {:.2}  {}",
            rank + 1,
            record.menu_item_id,
            record.sentiment.as_str(),
            record.score,
            record.average_rating,
            item.evidence
        );
    }
    Ok(())
}

async fn discard(config: &AppConfig, db: &Database) -> Result<()> {
    let served = service(config, db)?.discard_candidates().await?;
    report_freshness(&served.freshness);

    if served.items.is_empty() {
        println!("No discard candidates");
        return Ok(());
    }
    for record in &served.items {
        println!(
            "item {:>5}  {:<20} avg {:.2}  {}",
            record.menu_item_id,
            record.sentiment.as_str(),
            record.average_rating,
            record.evidence_summary()
        );
    }
    info!(candidates = served.items.len(), "Discard review complete");
    Ok(())
}

fn report(db: &Database) -> Result<()> {
    let rows = db.monthly_feedback_report(Local::now().date_naive())?;
    if rows.is_empty() {
        println!("No feedback in the last month");
        return Ok(());
    }
    for row in rows {
        println!(
            "item {:>5}  avg {:.2}  {} ratings",
            row.menu_item_id, row.average_rating, row.feedback_count
        );
    }
    Ok(())
}
