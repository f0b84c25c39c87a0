use clap::Parser;
use lure_core::LureConfig;
use lure_reasoning::HoneypotService;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, IsTerminal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "lure.toml", env = "LURE_CONFIG")]
    config: String,

    /// Session id to use (random if omitted)
    #[arg(short, long)]
    session: Option<String>,

    /// Override the LLM provider (openai | groq | deepseek | ollama | mock | none)
    #[arg(short, long)]
    provider: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Process one scammer line. Returns true once the conversation has ended.
async fn handle_line(service: &HoneypotService, session_id: &str, text: &str) -> bool {
    let (detection, outcome) = service.handle_message(session_id, text).await;
    info!(
        "Turn: goal={} engage={} scam={} ({:.2})",
        outcome.decision.goal,
        outcome.decision.should_engage,
        detection.is_scam,
        detection.confidence
    );
    match &outcome.reply {
        Some(reply) => println!("Lure: {}", reply),
        None => println!("[no reply: {}]", outcome.decision.reasoning),
    }
    outcome.conversation_ended
}

async fn run_interactive(service: &HoneypotService, session_id: &str) -> anyhow::Result<()> {
    println!("Lure online (session {}). Type as the scammer; 'quit' to exit.", session_id);
    let mut rl = rustyline::DefaultEditor::new()?;
    loop {
        match rl.readline("scammer> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "quit" || trimmed == "exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);
                if handle_line(service, session_id, trimmed).await {
                    println!("[conversation ended]");
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("Readline error: {}", e);
                break;
            }
        }
    }
    Ok(())
}

async fn run_piped(service: &HoneypotService, session_id: &str) -> anyhow::Result<()> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if handle_line(service, session_id, trimmed).await {
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_json);

    info!("Loading config from {}...", args.config);
    let mut config = LureConfig::load_or_default(&args.config);
    if let Some(provider) = args.provider {
        config.llm.provider = provider;
    }
    info!("LLM config: {:?}", config.llm);

    let service = HoneypotService::from_config(&config);
    let session_id = args.session.unwrap_or_else(|| Uuid::new_v4().to_string());

    if io::stdin().is_terminal() {
        run_interactive(&service, &session_id).await?;
    } else {
        run_piped(&service, &session_id).await?;
    }

    if let Some(snapshot) = service.snapshot(&session_id).await {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}
