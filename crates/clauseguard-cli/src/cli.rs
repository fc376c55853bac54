//! Command-line definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ClauseGuard - flag risky clauses in Terms and Conditions.
#[derive(Parser)]
#[command(name = "clauseguard", version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// LLM provider ("none" or "anthropic")
    #[arg(long, global = true, env = "CLAUSEGUARD_PROVIDER", default_value = "none")]
    pub provider: String,

    /// Runtime configuration file (YAML or JSON)
    #[arg(short, long, global = true, env = "CLAUSEGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// API key for the LLM provider
    #[arg(long, global = true, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a document from a file, a URL, inline text or stdin
    Analyze(AnalyzeArgs),

    /// Answer a question using only the given context
    Ask(AskArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Read the document from a file
    #[arg(long, conflicts_with_all = ["url", "text"])]
    pub file: Option<PathBuf>,

    /// Fetch the document from a URL
    #[arg(long, conflicts_with = "text")]
    pub url: Option<String>,

    /// Analyze this text
    #[arg(long)]
    pub text: Option<String>,

    /// Include findings, evidence and run metadata
    #[arg(short, long)]
    pub detailed: bool,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// The question
    pub question: String,

    /// Read the context from a file (stdin when neither option is given)
    #[arg(long, conflicts_with = "context")]
    pub context_file: Option<PathBuf>,

    /// Context text
    #[arg(long)]
    pub context: Option<String>,
}
