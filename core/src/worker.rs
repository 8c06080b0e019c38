//! Background session worker
//!
//! A send or receive occupies its thread for seconds of audio. The worker
//! owns the [`Session`] on a dedicated OS thread so the caller stays
//! responsive: requests go in over one channel and [`Event`]s come back on
//! another. At most one request is in flight; a second one is rejected with
//! [`AudioModemError::SessionBusy`] rather than queued.

use crate::audio::{AudioSink, AudioSource};
use crate::error::{AudioModemError, Result};
use crate::session::{ReceiveOutcome, SendOutcome, Session};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Send(String),
    Receive,
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Send(_) => RequestKind::Send,
            Request::Receive => RequestKind::Receive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Send,
    Receive,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Send => write!(f, "send"),
            RequestKind::Receive => write!(f, "receive"),
        }
    }
}

/// Result of one request, reported back to the UI
#[derive(Debug)]
pub enum Event {
    Sent { text: String, outcome: SendOutcome },
    Received(ReceiveOutcome),
    Failed { request: RequestKind, error: AudioModemError },
}

/// Handle to a session running on its own thread
pub struct SessionWorker {
    requests: Option<mpsc::Sender<Request>>,
    busy: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SessionWorker {
    /// Move `session` onto a worker thread.
    ///
    /// Returns the handle and the receiving end of the event channel. Events
    /// queue without bound, so an unread receiver never stalls the worker or
    /// a later shutdown.
    pub fn spawn<P, C>(session: Session<P, C>) -> Result<(Self, mpsc::UnboundedReceiver<Event>)>
    where
        P: AudioSink + Send + 'static,
        C: AudioSource + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let busy = Arc::new(AtomicBool::new(false));

        let handle = {
            let busy = Arc::clone(&busy);
            thread::Builder::new()
                .name("tonelink-session".into())
                .spawn(move || run_session(session, request_rx, event_tx, &busy))
                .map_err(AudioModemError::WorkerSpawn)?
        };

        Ok((
            Self {
                requests: Some(request_tx),
                busy,
                handle: Some(handle),
            },
            event_rx,
        ))
    }

    /// True while a request is being served
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Hand a request to the worker without waiting for it to run.
    pub fn submit(&self, request: Request) -> Result<()> {
        let requests = self.requests.as_ref().ok_or(AudioModemError::WorkerClosed)?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Rejecting {} request: session busy", request.kind());
            return Err(AudioModemError::SessionBusy);
        }

        // The busy flag keeps the single request slot free
        if requests.try_send(request).is_err() {
            self.busy.store(false, Ordering::Release);
            return Err(AudioModemError::WorkerClosed);
        }

        Ok(())
    }

    /// Stop accepting requests and wait for the worker thread to finish
    /// whatever it is doing.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Session worker panicked");
            }
        }
    }
}

impl Drop for SessionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_session<P: AudioSink, C: AudioSource>(
    mut session: Session<P, C>,
    mut requests: mpsc::Receiver<Request>,
    events: mpsc::UnboundedSender<Event>,
    busy: &AtomicBool,
) {
    log::debug!("Session worker started");

    while let Some(request) = requests.blocking_recv() {
        let kind = request.kind();
        let event = match request {
            Request::Send(text) => match session.send(&text) {
                Ok(outcome) => Event::Sent { text, outcome },
                Err(error) => Event::Failed { request: kind, error },
            },
            Request::Receive => match session.receive() {
                Ok(outcome) => Event::Received(outcome),
                Err(error) => Event::Failed { request: kind, error },
            },
        };

        if let Event::Failed { error, .. } = &event {
            log::error!("{} failed: {}", kind, error);
        }

        // Clear before publishing so the consumer can submit straight away
        busy.store(false, Ordering::Release);

        if events.send(event).is_err() {
            log::debug!("Event receiver dropped, stopping session worker");
            break;
        }
    }

    log::debug!("Session worker stopped");
}
