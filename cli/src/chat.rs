//! Interactive front end: type to send, `/listen` to receive
//!
//! The session runs on its worker thread; this loop only shuffles lines and
//! events, so typing stays live while audio is playing or recording.

use crate::error::CliError;
use std::io::BufRead;
use tokio::sync::mpsc;
use tonelink_core::{Event, ReceiveOutcome, Request, SendOutcome, SessionWorker};

const LISTEN_COMMAND: &str = "/listen";
const QUIT_COMMAND: &str = "/quit";

/// What one typed line asks for
#[derive(Debug, PartialEq)]
enum Command {
    Quit,
    Submit(Request),
}

fn parse_line(line: String) -> Command {
    match line.trim() {
        QUIT_COMMAND => Command::Quit,
        LISTEN_COMMAND => Command::Submit(Request::Receive),
        _ => Command::Submit(Request::Send(line)),
    }
}

/// A chat log entry; problems go to stderr
#[derive(Debug, PartialEq)]
enum Entry {
    Message(String),
    Problem(String),
}

fn entry_for(event: &Event) -> Option<Entry> {
    match event {
        Event::Sent { outcome: SendOutcome::Skipped, .. } => None,
        Event::Sent { text, .. } => Some(Entry::Message(format!("> {}", text))),
        Event::Received(ReceiveOutcome::Delivered(text)) => {
            Some(Entry::Message(format!("< {}", text)))
        }
        Event::Received(ReceiveOutcome::Rejected(rejection)) => {
            Some(Entry::Problem(format!("! nothing received: {}", rejection)))
        }
        Event::Failed { request, error } => {
            Some(Entry::Problem(format!("! {} failed: {}", request, error)))
        }
    }
}

/// Print an event the way the chat log shows it
pub fn report(event: &Event) {
    match entry_for(event) {
        Some(Entry::Message(line)) => println!("{}", line),
        Some(Entry::Problem(line)) => eprintln!("{}", line),
        None => {}
    }
}

/// Stdin on a plain thread; a pending blocking read must not hold up exit
fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>, CliError> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("tonelink-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

pub async fn run(worker: SessionWorker, mut events: mpsc::UnboundedReceiver<Event>) -> Result<(), CliError> {
    println!(
        "Type a message and press Enter to send. {} to receive, {} to exit.",
        LISTEN_COMMAND, QUIT_COMMAND
    );
    let mut lines = spawn_stdin_reader()?;

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                let request = match parse_line(line) {
                    Command::Quit => break,
                    Command::Submit(request) => request,
                };
                if request == Request::Receive {
                    println!("Listening...");
                }
                if let Err(e) = worker.submit(request) {
                    eprintln!("! {}", e);
                }
            }
            event = events.recv() => {
                match event {
                    Some(event) => report(&event),
                    None => break,
                }
            }
        }
    }

    // Let an in-flight operation finish without stalling the runtime
    tokio::task::spawn_blocking(move || worker.shutdown())
        .await
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;

    // Report whatever the last operation produced
    while let Ok(event) = events.try_recv() {
        report(&event);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonelink_core::{AudioModemError, Rejection, RequestKind};

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_line("/quit".into()), Command::Quit);
        assert_eq!(parse_line("  /listen \n".into()), Command::Submit(Request::Receive));
        assert_eq!(
            parse_line("hello /listen".into()),
            Command::Submit(Request::Send("hello /listen".into()))
        );
    }

    #[test]
    fn test_typed_text_is_sent_verbatim() {
        assert_eq!(
            parse_line("  spaced out ".into()),
            Command::Submit(Request::Send("  spaced out ".into()))
        );
    }

    #[test]
    fn test_entries_for_each_event() {
        let sent = Event::Sent {
            text: "Hi".into(),
            outcome: SendOutcome::Sent { bits: 16, samples: 2352 },
        };
        assert_eq!(entry_for(&sent), Some(Entry::Message("> Hi".into())));

        let skipped = Event::Sent {
            text: " ".into(),
            outcome: SendOutcome::Skipped,
        };
        assert_eq!(entry_for(&skipped), None);

        let delivered = Event::Received(ReceiveOutcome::Delivered("Yo".into()));
        assert_eq!(entry_for(&delivered), Some(Entry::Message("< Yo".into())));

        let rejected = Event::Received(ReceiveOutcome::Rejected(Rejection::Empty));
        assert_eq!(
            entry_for(&rejected),
            Some(Entry::Problem("! nothing received: decoded message is empty".into()))
        );

        let failed = Event::Failed {
            request: RequestKind::Receive,
            error: AudioModemError::MalformedBitstream { len: 1500 },
        };
        assert_eq!(
            entry_for(&failed),
            Some(Entry::Problem(
                "! receive failed: Bit stream length 1500 is not a multiple of 8".into()
            ))
        );
    }
}
