mod chat;
mod config;
mod device;
mod error;
mod wav;

use clap::{Parser, Subcommand};
use config::{ModemArgs, Settings};
use device::{MicrophoneSource, SpeakerSink};
use error::CliError;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tonelink_core::bits::{self, format_bits, parse_bits};
use tonelink_core::{
    AudioSink, AudioSource, Event, Loopback, ReceiveOutcome, Request, SendOutcome, Session,
    SessionWorker,
};
use tracing_subscriber::EnvFilter;
use wav::{WavSink, WavSource};

#[derive(Parser)]
#[command(name = "tonelink")]
#[command(about = "Send and receive text as audible FSK tones")]
struct Cli {
    #[command(flatten)]
    modem: ModemArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the bit stream for a message
    Encode {
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Turn a bit stream of 0s and 1s back into text
    Decode {
        #[arg(value_name = "BITS")]
        bits: String,
    },

    /// Play a message through the speakers
    Send {
        #[arg(value_name = "TEXT")]
        text: String,

        /// Write the tones to a WAV file instead of playing them
        #[arg(long, value_name = "OUTPUT.WAV")]
        wav: Option<PathBuf>,
    },

    /// Listen on the microphone and decode a message
    Receive {
        /// Decode a WAV recording instead of listening
        #[arg(long, value_name = "INPUT.WAV")]
        wav: Option<PathBuf>,
    },

    /// Send a message through an in-memory channel and decode it again
    Loopback {
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Interactive session on the default audio devices
    Chat,
}

type BoxedSink = Box<dyn AudioSink + Send>;
type BoxedSource = Box<dyn AudioSource + Send>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = cli.modem.resolve()?;

    match cli.command {
        Commands::Encode { text } => encode_command(&text),
        Commands::Decode { bits } => decode_command(&bits),
        Commands::Send { text, wav } => send_command(settings, text, wav).await,
        Commands::Receive { wav } => receive_command(settings, wav).await,
        Commands::Loopback { text } => loopback_command(settings, text).await,
        Commands::Chat => {
            let session = Session::new(settings.modem, SpeakerSink, MicrophoneSource)?;
            let (worker, events) = SessionWorker::spawn(session)?;
            chat::run(worker, events).await
        }
    }
}

fn encode_command(text: &str) -> Result<(), CliError> {
    let encoded = bits::encode(text)?;
    println!("{}", format_bits(&encoded));
    Ok(())
}

fn decode_command(input: &str) -> Result<(), CliError> {
    let text = bits::decode(&parse_bits(input)?)?;
    if let Some((index, ch)) = tonelink_core::validator::find_invalid(&text) {
        tracing::warn!("Decoded text has non-printable {:?} at position {}", ch, index);
    }
    println!("{}", text);
    Ok(())
}

async fn send_command(settings: Settings, text: String, wav: Option<PathBuf>) -> Result<(), CliError> {
    let sink: BoxedSink = match wav {
        Some(path) => Box::new(WavSink::new(path)),
        None => Box::new(SpeakerSink),
    };
    let source: BoxedSource = Box::new(MicrophoneSource);

    let session = Session::new(settings.modem, sink, source)?;
    let (worker, mut events) = SessionWorker::spawn(session)?;
    let event = request(&worker, &mut events, Request::Send(text)).await?;
    worker.shutdown();

    match event {
        Event::Sent { outcome: SendOutcome::Skipped, .. } => {
            println!("Nothing to send");
            Ok(())
        }
        Event::Sent { outcome: SendOutcome::Sent { bits, samples }, .. } => {
            println!("Sent {} bits ({} samples)", bits, samples);
            Ok(())
        }
        other => outcome_error(other),
    }
}

async fn receive_command(settings: Settings, wav: Option<PathBuf>) -> Result<(), CliError> {
    let mut modem = settings.modem;
    let source: BoxedSource = match wav {
        Some(path) => {
            let source = WavSource::open(&path)?;
            if !settings.capture_explicit {
                modem = modem.with_capture_duration(source.duration());
            }
            Box::new(source)
        }
        None => Box::new(MicrophoneSource),
    };
    let sink: BoxedSink = Box::new(SpeakerSink);

    let session = Session::new(modem, sink, source)?;
    let (worker, mut events) = SessionWorker::spawn(session)?;
    let event = request(&worker, &mut events, Request::Receive).await?;
    worker.shutdown();

    match event {
        Event::Received(ReceiveOutcome::Delivered(text)) => {
            println!("{}", text);
            Ok(())
        }
        other => outcome_error(other),
    }
}

async fn loopback_command(settings: Settings, text: String) -> Result<(), CliError> {
    // Listen for exactly as long as the message plays
    let bit_count = text.chars().count() * bits::BITS_PER_CHAR;
    let duration = settings.modem.duration_for_bits(bit_count);
    let modem = settings.modem.with_capture_duration(duration);

    let loopback = Loopback::new();
    let session = Session::new(modem, loopback.sink(), loopback.source())?;
    let (worker, mut events) = SessionWorker::spawn(session)?;

    let sent = request(&worker, &mut events, Request::Send(text)).await?;
    match sent {
        Event::Sent { outcome: SendOutcome::Sent { bits, .. }, .. } => {
            tracing::info!("Looped back {} bits", bits)
        }
        Event::Sent { outcome: SendOutcome::Skipped, .. } => {
            println!("Nothing to send");
            return Ok(());
        }
        other => return outcome_error(other),
    }

    let received = request(&worker, &mut events, Request::Receive).await?;
    worker.shutdown();

    match received {
        Event::Received(ReceiveOutcome::Delivered(text)) => {
            println!("{}", text);
            Ok(())
        }
        other => outcome_error(other),
    }
}

/// Submit one request and wait for its event
async fn request(
    worker: &SessionWorker,
    events: &mut mpsc::UnboundedReceiver<Event>,
    request: Request,
) -> Result<Event, CliError> {
    worker.submit(request)?;
    events.recv().await.ok_or(CliError::NoEvent)
}

fn outcome_error(event: Event) -> Result<(), CliError> {
    match event {
        Event::Failed { error, .. } => Err(error.into()),
        Event::Received(ReceiveOutcome::Rejected(rejection)) => Err(CliError::Rejected(rejection)),
        other => Err(CliError::UnexpectedEvent(format!("{:?}", other))),
    }
}
