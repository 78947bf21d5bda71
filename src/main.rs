use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use herald::speech::{AudioPlayback, Synthesizer};
use herald::{Config, Daemon};

/// Herald - spoken announcer for incoming text messages
#[derive(Parser)]
#[command(name = "herald", version, about)]
struct Cli {
    /// Port for the control/ingest API
    #[arg(long, env = "HERALD_API_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Enable speaking as soon as the daemon starts
    #[arg(long, env = "HERALD_ENABLE_ON_START")]
    enable_on_start: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test speaker output
    TestSpeaker,
    /// Test TTS synthesis and playback
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Send a test message to a running daemon
    Announce {
        /// Sender address (omit for an unknown sender)
        #[arg(short, long)]
        from: Option<String>,
        /// Message body
        body: String,
    },
    /// Turn speaking on in a running daemon
    Enable,
    /// Turn speaking off in a running daemon
    Disable,
    /// Show a running daemon's speech state
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,herald=info",
        1 => "info,herald=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.api_port = port;
    }
    if cli.enable_on_start {
        config.enable_on_start = true;
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::Announce { from, body } => announce(&config, from, &body).await,
            Command::Enable => control(&config, "enable").await,
            Command::Disable => control(&config, "disable").await,
            Command::Status => status(&config).await,
        };
    }

    tracing::info!(port = config.api_port, "starting herald");
    Daemon::new(config).run().await?;
    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let sample_rate = 24000_f32;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * 2.0) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    tokio::task::spawn_blocking(move || playback.play_samples(&samples)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    Ok(())
}

/// Test TTS synthesis and playback
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let synth = Synthesizer::from_config(&config.speech)?;

    println!("Synthesizing speech...");
    let mp3_data = synth.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    let playback = AudioPlayback::new()?;
    tokio::task::spawn_blocking(move || playback.play_mp3(&mp3_data)).await??;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");
    Ok(())
}

/// POST a single-message batch to a running daemon
async fn announce(config: &Config, from: Option<String>, body: &str) -> anyhow::Result<()> {
    let payload = serde_json::json!([{ "from": from, "body": body }]);

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/messages", config.api_port))
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_success() {
        println!("Announced: {body}");
        Ok(())
    } else {
        anyhow::bail!("daemon rejected the message ({status}): {body}")
    }
}

/// POST an enable/disable toggle to a running daemon
async fn control(config: &Config, action: &str) -> anyhow::Result<()> {
    let response = reqwest::Client::new()
        .post(format!(
            "http://127.0.0.1:{}/speech/{action}",
            config.api_port
        ))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_success() {
        println!("{body}");
        Ok(())
    } else {
        anyhow::bail!("daemon refused {action} ({status}): {body}")
    }
}

/// Query a running daemon's speech state
async fn status(config: &Config) -> anyhow::Result<()> {
    let response = reqwest::Client::new()
        .get(format!("http://127.0.0.1:{}/speech", config.api_port))
        .send()
        .await?;

    println!("{}", response.text().await?);
    Ok(())
}
