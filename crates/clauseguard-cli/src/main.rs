//! ClauseGuard CLI.

mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::Path;

use clauseguard_runtime::{provider_from_name, AnalysisSource, ClauseGuard, RuntimeConfig};

use cli::{AnalyzeArgs, AskArgs, Cli, Command};
use output::Formatter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so structured output stays clean on stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let service = build_service(&cli)?;
    let formatter = Formatter::new(cli.format);

    let rendered = match cli.command {
        Command::Analyze(args) => analyze(&service, &formatter, args).await?,
        Command::Ask(args) => ask(&service, &formatter, args).await?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn build_service(cli: &Cli) -> Result<ClauseGuard> {
    let config = match &cli.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::default(),
    };

    let mut builder = ClauseGuard::builder().with_config(config);
    if let Some(provider) = provider_from_name(&cli.provider, cli.api_key.as_deref())? {
        builder = builder.with_provider(provider);
    }
    let service = builder.build()?;
    tracing::debug!(backend = service.backend_name(), "Service ready");
    Ok(service)
}

async fn analyze(service: &ClauseGuard, formatter: &Formatter, args: AnalyzeArgs) -> Result<String> {
    let text = match (&args.file, &args.text) {
        (Some(path), _) => Some(read_file(path)?),
        (None, Some(text)) => Some(text.clone()),
        (None, None) if args.url.is_none() => Some(read_stdin()?),
        (None, None) => None,
    };
    let source = AnalysisSource::from_request(text, args.url)?;

    if args.detailed {
        formatter.report(&service.analyze_detailed(&source).await?)
    } else {
        formatter.result(&service.analyze(&source).await?)
    }
}

async fn ask(service: &ClauseGuard, formatter: &Formatter, args: AskArgs) -> Result<String> {
    let context = match (&args.context_file, args.context) {
        (Some(path), _) => read_file(path)?,
        (None, Some(context)) => context,
        (None, None) => read_stdin()?,
    };
    let answer = service.chat(&args.question, &context).await?;
    formatter.answer(&args.question, &answer)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}
