use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use parking_lot::Mutex;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use parley_app::config::{default_config_path, AppConfig};
use parley_app::history::{ConversationHistory, RecordingHandler};
use parley_app::{SmallTalkHandler, VoiceAssistant};
use parley_stt::HttpTranscriber;
use parley_tts::{TextToSpeech, TtsConfig};
use parley_tts_espeak::EspeakSynthesizer;

#[derive(Parser, Debug)]
#[command(name = "parley", about = "Voice front-end for a conversational handler")]
struct Cli {
    /// Configuration file (default: <config dir>/parley/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input device name (default: host default microphone)
    #[arg(long)]
    device: Option<String>,

    /// Override the configured language tag
    #[arg(long)]
    language: Option<String>,

    /// Override the configured voice identifier
    #[arg(long)]
    voice: Option<String>,

    /// Transcription service endpoint
    #[arg(
        long,
        env = "PARLEY_STT_ENDPOINT",
        default_value = "http://127.0.0.1:8085/transcribe"
    )]
    stt_endpoint: String,

    /// Bearer token for the transcription service
    #[arg(long, env = "PARLEY_STT_API_KEY")]
    stt_api_key: Option<String>,

    /// Speaking rate in words per minute
    #[arg(long, default_value_t = 180)]
    rate: u32,

    /// Speaking volume (0.0-1.0)
    #[arg(long, default_value_t = 0.8)]
    volume: f32,

    /// List available voices and exit
    #[arg(long)]
    list_voices: bool,
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "parley.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(guard);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging().map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = AppConfig::load_or_create(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(language) = cli.language {
        config.language = language;
    }
    if let Some(voice) = cli.voice {
        config.voice_id = Some(voice);
    }

    let tts = EspeakSynthesizer::new(TtsConfig {
        voice_id: config.voice_id.clone(),
        rate_wpm: cli.rate,
        volume: cli.volume,
    })
    .context("Failed to initialize speech synthesis")?;

    if cli.list_voices {
        for voice in tts.voices() {
            println!("{:20} {:8} {:?}", voice.id, voice.language, voice.gender);
        }
        return Ok(());
    }

    let mut stt = HttpTranscriber::new(cli.stt_endpoint.clone())
        .context("Failed to build transcription client")?;
    if let Some(key) = cli.stt_api_key {
        stt = stt.with_api_key(key);
    }

    let history_path = config_path.with_file_name("history.json");
    let history = Arc::new(Mutex::new(
        ConversationHistory::load(&history_path, config.max_history)
            .context("Failed to load conversation history")?,
    ));
    let handler = RecordingHandler::new(SmallTalkHandler, Arc::clone(&history));

    let mut assistant = VoiceAssistant::builder()
        .language(config.language.clone())
        .auto_restart(config.auto_restart)
        .device(cli.device)
        .transcriber(Box::new(stt))
        .synthesizer(Box::new(tts))
        .handler(Arc::new(handler))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build assistant: {}", e))?;

    assistant
        .start()
        .map_err(|e| anyhow::anyhow!("Failed to start listen loop: {}", e))?;
    tracing::info!("Parley is listening. Press Ctrl-C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    assistant.stop();

    if config.save_history {
        history
            .lock()
            .save(&history_path)
            .with_context(|| format!("Failed to save {}", history_path.display()))?;
    }
    config.save(&config_path)?;

    Ok(())
}
