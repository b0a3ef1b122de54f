mod config;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use diemthi_core::{
    AppError, DbConfig, Group, ImportConfig, ImportService, ImportSummary, LevelCounts,
    RankedStudent, ScoreRangePolicy, StudentRecord, Subject, TracingReporter,
};
use diemthi_db::{MAX_BATCH_ROWS, StudentRepository};

use crate::config::{Command, Config};

/// Number of candidates printed by `top`.
const TOP_LIMIT: usize = 10;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {e}");
    }

    let config = Config::parse();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!("Connecting to database...");
    let db_config = DbConfig::default();
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .connect(&config.database_url)
        .await
        .map_err(AppError::DatabaseError)
        .context("Failed to connect to database")?;

    let repo = StudentRepository::new(pool);

    match config.command {
        Command::Import {
            file,
            batch_size,
            batch_timeout_secs,
            score_policy,
        } => {
            let import_config = import_config(batch_size, batch_timeout_secs, score_policy)?;
            let service = ImportService::with_config(repo, import_config);
            import(&service, &file).await?;
        }
        Command::Show { sbd } => {
            let student = repo
                .get_by_sbd(&sbd)
                .await?
                .ok_or_else(|| AppError::StudentNotFound(sbd.trim().to_string()))?;
            print_student(&student);
        }
        Command::Top { group } => {
            let ranked = repo.top_by_group(group, TOP_LIMIT).await?;
            print_top(group, &ranked);
        }
        Command::Levels { subject } => {
            let counts = repo.count_by_level(subject).await?;
            print_levels(subject, &counts);
        }
    }

    Ok(())
}

fn import_config(
    batch_size: usize,
    batch_timeout_secs: u64,
    score_policy: ScoreRangePolicy,
) -> Result<ImportConfig, AppError> {
    if batch_size == 0 || batch_size > MAX_BATCH_ROWS {
        return Err(AppError::ConfigError(format!(
            "--batch-size must be between 1 and {}, got {}",
            MAX_BATCH_ROWS, batch_size
        )));
    }
    if batch_timeout_secs == 0 {
        return Err(AppError::ConfigError(
            "--batch-timeout-secs must be positive".to_string(),
        ));
    }

    Ok(ImportConfig::default()
        .with_batch_size(batch_size)
        .with_batch_timeout(Duration::from_secs(batch_timeout_secs))
        .with_score_policy(score_policy))
}

async fn import(service: &ImportService<StudentRepository>, file: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    info!(
        file = %file.display(),
        bytes = bytes.len(),
        batch_size = service.config().batch_size.get(),
        "Importing exam results"
    );

    match service
        .import_bytes_with_progress(Some(&bytes), &TracingReporter)
        .await
    {
        Ok(summary) => {
            print_import_summary(&summary);
            Ok(())
        }
        Err(err) => {
            if let AppError::ImportAborted { summary, .. } = &err {
                print_import_summary(summary);
            }
            Err(err.into())
        }
    }
}

/// Prints the most helpful message for `err` to stderr.
fn report_error(err: &anyhow::Error) {
    match err.chain().find_map(|e| e.downcast_ref::<AppError>()) {
        Some(app_err) => eprintln!("\nError: {}", app_err.user_message()),
        None => eprintln!("\nError: {err:#}"),
    }
}

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{:.2}", s))
}

fn print_student(student: &StudentRecord) {
    println!("\nCandidate {}\n", student.sbd);
    for (subject, score) in student.scores() {
        println!("  {:<12} {:>6}", subject.column(), format_score(score));
    }
    println!(
        "  {:<12} {:>6}",
        "ma_ngoai_ngu",
        student.ma_ngoai_ngu.as_deref().unwrap_or("-")
    );
    println!();
}

fn print_top(group: Group, ranked: &[RankedStudent]) {
    let subjects: Vec<&str> = group.subjects().iter().map(|s| s.column()).collect();
    println!("\nTop {} - group {} ({})\n", TOP_LIMIT, group, subjects.join(" + "));

    if ranked.is_empty() {
        println!("  No candidates with all three scores.");
    }
    for (i, entry) in ranked.iter().enumerate() {
        let scores: Vec<String> = group
            .subjects()
            .iter()
            .map(|s| format_score(entry.student.score(*s)))
            .collect();
        println!(
            "  {:>2}. {:<10} {:>6.2}   [{}]",
            i + 1,
            entry.student.sbd,
            entry.total,
            scores.join(", ")
        );
    }
    println!();
}

fn print_levels(subject: Subject, counts: &LevelCounts) {
    println!("\nScore levels - {}\n", subject);
    println!("  Excellent (>= 8):  {:>9}", counts.excellent);
    println!("  Good (6 - 8):      {:>9}", counts.good);
    println!("  Average (4 - 6):   {:>9}", counts.average);
    println!("  Weak (< 4):        {:>9}", counts.weak);
    println!("  Total:             {:>9}", counts.total());
    println!();
}

fn print_import_summary(summary: &ImportSummary) {
    let status = if summary.is_success() {
        "IMPORT COMPLETE"
    } else {
        "IMPORT ABORTED"
    };

    eprintln!();
    eprintln!("=======================================================");
    eprintln!("  {}", status);
    eprintln!("=======================================================");
    eprintln!("  Import id:           {}", summary.import_id);
    eprintln!("  Rows read:           {}", summary.total_records);
    eprintln!("  Imported:            {}", summary.imported_count);
    eprintln!("  Skipped:             {}", summary.skipped_records);
    if summary.skipped_records > 0 {
        eprintln!("    missing sbd:       {}", summary.skip_reasons.missing_id);
        eprintln!("    out of range:      {}", summary.skip_reasons.score_out_of_range);
        eprintln!("    malformed:         {}", summary.skip_reasons.malformed);
    }
    if summary.failed_records > 0 {
        eprintln!("  Not written:         {}", summary.failed_records);
    }
    eprintln!("  Batches committed:   {}", summary.batches_committed);
    eprintln!("  Rows affected:       {}", summary.rows_affected);
    eprintln!("  Elapsed:             {} ms", summary.elapsed_ms);
    eprintln!("=======================================================");
    eprintln!();
}
