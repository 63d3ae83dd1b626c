mod logging;
mod server;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use director_contracts::{ChatTurn, Mode};
use director_engine::{EngineConfig, Frame, GuidanceRequest, Orchestrator};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::server::AppState;

#[derive(Debug, Parser)]
#[command(name = "director", version, about = "Live camera guidance backend")]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Analyze one image and print the guidance JSON.
    Analyze(AnalyzeArgs),
    /// Coaching conversation on stdin/stdout.
    Chat(ChatArgs),
}

#[derive(Debug, Parser)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value_t = 8000)]
    port: u16,
    #[arg(long, default_value = "static")]
    static_dir: PathBuf,
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long, default_value = "Professional Profile")]
    context: String,
    /// Use the scene analyzer (1-10 rubric with details) instead of live coaching.
    #[arg(long)]
    scene: bool,
    #[arg(long, default_value = "photography")]
    mode: String,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    /// Labels containing "video" or "cinematographer" get the video director.
    #[arg(long, default_value = "Professional Profile")]
    context: String,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("director error: {err:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    load_env(cli.env_file.as_deref())?;
    logging::init();
    match cli.command {
        Command::Serve(args) => {
            run_serve(args).await?;
            Ok(0)
        }
        Command::Analyze(args) => run_analyze(args).await,
        Command::Chat(args) => {
            run_chat(args).await?;
            Ok(0)
        }
    }
}

fn load_env(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => load_optional_env(Path::new(".env"))?,
    }
    Ok(())
}

/// A missing file is fine; one that exists but does not parse is an error.
fn load_optional_env(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to load {}", path.display())),
    }
}

fn build_orchestrator(config: EngineConfig) -> Result<Orchestrator> {
    if !config.has_credentials() {
        tracing::warn!("GEMINI_API_KEY / GOOGLE_API_KEY not set; responses will be mocked");
    }
    Orchestrator::from_config(config).context("failed to initialise model gateway")
}

fn parse_mode(raw: &str) -> Result<Mode> {
    Mode::parse(raw).ok_or_else(|| anyhow!("unknown mode '{raw}' (expected photography or videography)"))
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    tokio::fs::create_dir_all(args.static_dir.join("effects"))
        .await
        .with_context(|| format!("failed to create {}", args.static_dir.display()))?;
    let config = EngineConfig::from_env().with_static_dir(&args.static_dir);
    let orchestrator = build_orchestrator(config)?;
    let app = server::router(AppState::new(orchestrator), &args.static_dir);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, static_dir = %args.static_dir.display(), "director listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("shutdown requested");
}

async fn run_analyze(args: AnalyzeArgs) -> Result<i32> {
    let mode = parse_mode(&args.mode)?;
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    let frame = Frame::decode(bytes)?;
    let orchestrator = build_orchestrator(EngineConfig::from_env())?;
    let request = GuidanceRequest::new(args.context, mode).with_image(frame);
    let result = if args.scene {
        orchestrator.analyze_scene(&request).await?
    } else {
        orchestrator.analyze(&request).await?
    };
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(0)
}

async fn run_chat(args: ChatArgs) -> Result<()> {
    let mut context = args.context;
    let orchestrator = build_orchestrator(EngineConfig::from_env())?;
    let mut history: Vec<ChatTurn> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Director chat for '{context}'. Commands: /context <label> /quit");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" || input == "/exit" {
            break;
        }
        if let Some(rest) = input.strip_prefix("/context") {
            match rest.trim() {
                "" => println!("/context expects a label"),
                label => {
                    context = label.to_string();
                    history.clear();
                    println!("Context set to '{context}'");
                }
            }
            continue;
        }

        let request =
            GuidanceRequest::new(context.as_str(), Mode::default()).with_history(history.clone());
        let reply = orchestrator.chat(&request, input).await?;
        match reply.action {
            Some(action) => println!("{} [{}]", reply.text, action.as_str()),
            None => println!("{}", reply.text),
        }
        history.push(ChatTurn::user(input));
        history.push(ChatTurn::assistant(reply.text));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_file_is_ignored() -> Result<()> {
        let temp = tempfile::tempdir()?;
        load_optional_env(&temp.path().join(".env"))
    }

    #[test]
    fn malformed_env_file_is_reported() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join(".env");
        std::fs::write(&path, "DIRECTOR_TEST_KEY='unterminated\n")?;
        let err = load_optional_env(&path).err().map(|err| format!("{err:#}"));
        assert!(err.is_some_and(|message| message.contains("failed to load")));
        Ok(())
    }
}
