//! Command-line argument parsing for hr-ask.
//!
//! Flags override the matching config file values.

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// Ask a SQLite database questions in plain English.
#[derive(Parser, Debug)]
#[command(name = "hr-ask")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "HR_ASK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (e.g., 127.0.0.1:8501)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Directory uploaded files are saved to
    #[arg(short, long, value_name = "DIR")]
    pub uploads: Option<PathBuf>,

    /// LLM provider to use (groq, openai, mock)
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Model name sent to the completion API
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Reject generated SQL that modifies the database
    #[arg(long)]
    pub read_only: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(AppConfig::default_path)
    }

    /// Applies flags on top of a loaded config.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(database) = &self.database {
            config.storage.database = database.clone();
        }
        if let Some(uploads) = &self.uploads {
            config.storage.uploads_dir = uploads.clone();
        }
        if let Some(provider) = &self.llm {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = Some(model.clone());
        }
        if self.read_only {
            config.query.read_only = true;
        }
    }
}
