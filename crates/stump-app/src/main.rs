mod cli;
mod tools;

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use stump_common::{Event, EventBus, Role, SessionState};
use stump_voice::transport::capture::NullCapture;
use stump_voice::transport::realtime::{RealtimeConfig, RealtimeTransport};
use stump_voice::{SessionOptions, Transport, VoiceSession};

const COPILOT_INSTRUCTIONS: &str = "You are Stump, a voice copilot that helps the user build an \
     outreach campaign step by step. Use the campaign tools to read and update the draft. Keep \
     replies short and conversational.";

/// Load environment variables from a .env file (KEY=VALUE lines).
fn load_dotenv() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        // Workspace root (stump/) — two levels up from crates/stump-app/
        manifest_dir.join("..").join("..").join(".env"),
        std::path::PathBuf::from(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
            return;
        }
    }
}

#[tokio::main]
async fn main() {
    load_dotenv();

    let args = cli::parse();

    let config = match args.config.as_deref() {
        Some(path) => stump_config::load_config_from_path(std::path::Path::new(path)),
        None => stump_config::load_config(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Config load failed, using defaults: {e}");
        stump_config::StumpConfig::default()
    });

    let log_directive = args
        .log_level
        .as_deref()
        .unwrap_or(&config.logging.directive);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "stump=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("Stump v{} starting...", env!("CARGO_PKG_VERSION"));

    let bus = Arc::new(EventBus::new(256));
    spawn_console_feed(bus.clone());

    let transport_config = RealtimeConfig {
        broker_url: args
            .broker_url
            .clone()
            .unwrap_or_else(|| config.endpoint.broker_url.clone()),
        realtime_url: config.endpoint.realtime_url.clone(),
        model: config.endpoint.model.clone(),
        connect_timeout: Duration::from_millis(config.session.channel_open_ms),
    };
    let factory_bus = bus.clone();
    let factory = Box::new(move || {
        Box::new(RealtimeTransport::new(
            transport_config.clone(),
            Box::new(NullCapture::new()),
            factory_bus.clone(),
        )) as Box<dyn Transport>
    });

    let options = SessionOptions {
        max_turns: config.session.max_turns,
        summary_wait: Duration::from_millis(config.session.summary_wait_ms),
        channel_open: Duration::from_millis(config.session.channel_open_ms),
        voice: config.endpoint.voice.clone(),
        transcription_model: config.endpoint.transcription_model.clone(),
        instructions: Some(COPILOT_INSTRUCTIONS.to_string()),
    };

    let handle = match VoiceSession::start(options, factory, bus).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("Failed to start voice session: {e}");
            std::process::exit(1);
        }
    };

    let draft = Arc::new(tools::CampaignDraft::default());
    if let Err(e) = tools::register_campaign_tools(&handle, draft).await {
        tracing::error!("Failed to register campaign tools: {e}");
    }

    println!("Session active. Type a message, /restart, or /quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                let line = line.trim();
                match line {
                    "" => continue,
                    "/quit" | "/q" => break,
                    "/restart" => {
                        if let Err(e) = handle.restart().await {
                            tracing::error!("Restart failed: {e}");
                            break;
                        }
                    }
                    text => {
                        if let Err(e) = handle.send_text(text).await {
                            tracing::error!("Send failed: {e}");
                            break;
                        }
                    }
                }
            }
        }
    }

    handle.stop().await;
    tracing::info!("Shutdown complete");
}

/// Mirror session events to the console: streamed assistant text, state
/// transitions, and notifications.
fn spawn_console_feed(bus: Arc<EventBus>) {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        let mut streaming = false;
        while let Ok(event) = events.recv().await {
            match event {
                Event::AssistantDelta(delta) => {
                    print!("{delta}");
                    let _ = std::io::stdout().flush();
                    streaming = true;
                }
                Event::TurnFinalized { role, text } => {
                    if role == Role::Assistant && streaming {
                        println!();
                        streaming = false;
                    } else if role == Role::User {
                        tracing::debug!(text = %text, "user turn sent");
                    }
                }
                Event::StateChanged(state) => {
                    tracing::info!(state = ?state, "session state changed");
                    if state == SessionState::Restarting {
                        println!("[compacting context...]");
                    }
                }
                Event::Notification(message) => {
                    eprintln!("[stump] {message}");
                }
                Event::Shutdown => break,
                _ => {}
            }
        }
    });
}
