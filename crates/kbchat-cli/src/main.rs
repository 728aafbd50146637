use anyhow::Result;
use clap::Parser;
use kbchat_core::{ChatSession, SecretStore, Settings, TurnOutcome};
use std::path::PathBuf;
use std::process::ExitCode;

mod app;
mod input;
mod render;
mod theme;

#[derive(Parser)]
#[command(name = "kbchat")]
#[command(about = "kbchat - knowledge-grounded Gemini chat in the terminal")]
#[command(version)]
struct Cli {
    /// Ask a single question, stream the reply to stdout and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Gemini model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Color theme (dark, light, high-contrast)
    #[arg(long)]
    theme: Option<String>,

    /// Settings file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Knowledge file injected into every prompt
    #[arg(long)]
    knowledge: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = match cli.config {
        Some(ref path) => Settings::load_from(path)?,
        None => Settings::load(),
    };

    if let Some(ref model) = cli.model {
        settings.llm.model = model.clone();
    }
    if let Some(ref theme) = cli.theme {
        settings.ui.theme = theme.clone();
    }
    if let Some(ref knowledge) = cli.knowledge {
        settings.prompt.knowledge_path = Some(knowledge.clone());
    }

    // The credential resolves before any client or terminal UI exists.
    let secrets = SecretStore::load()?;
    let session = match ChatSession::from_settings(&settings, &secrets) {
        Ok(session) => session,
        Err(e) if e.is_fatal() => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(prompt) = cli.prompt {
        match app::run_single_prompt(session, &prompt).await? {
            TurnOutcome::Complete(_) => Ok(ExitCode::SUCCESS),
            TurnOutcome::Failed(_) => Ok(ExitCode::FAILURE),
        }
    } else {
        app::run_tui(session, &settings).await?;
        Ok(ExitCode::SUCCESS)
    }
}
