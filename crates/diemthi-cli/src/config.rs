use std::path::PathBuf;

use clap::{Parser, Subcommand};

use diemthi_core::{DEFAULT_BATCH_SIZE, Group, ScoreRangePolicy, Subject};

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "diemthi")]
#[command(author, version, about = "Import and query national exam results")]
#[command(after_help = "Examples:
  diemthi import diem_thi_thpt_2024.csv
  diemthi import results.csv --batch-size 2000 --score-policy reject
  diemthi show 01000001
  diemthi top A1
  diemthi levels toan")]
pub struct Config {
    /// PostgreSQL database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import an exam results CSV file
    Import {
        /// Path to the CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Records per upsert statement
        #[arg(short, long, env = "IMPORT_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Seconds a single batch write may take
        #[arg(long, env = "IMPORT_BATCH_TIMEOUT_SECS", default_value = "30")]
        batch_timeout_secs: u64,

        /// Handling of scores outside [0, 10]: passthrough, reject or clamp
        #[arg(long, env = "SCORE_POLICY", default_value = "passthrough")]
        score_policy: ScoreRangePolicy,
    },
    /// Show the score sheet of one candidate
    Show {
        /// Registration number
        sbd: String,
    },
    /// Show the top 10 candidates of an exam group (A, A1, B, C, D)
    Top {
        group: Group,
    },
    /// Show the score level distribution of a subject
    Levels {
        /// Subject column name, e.g. toan, ngu_van, ngoai_ngu
        subject: Subject,
    },
}
