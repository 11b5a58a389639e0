use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};

use crate::log_entry::LogEntry;
use crate::log_store::LogStore;
use crate::radio::{TagData, TagRadio, POLLING_MODES};
use crate::storage::KeyValueStore;
use crate::summary;

const STATUS_AVAILABLE: &str = "NFC is available. Tap to scan.";
const STATUS_UNAVAILABLE: &str = "NFC is not available on this device.";
const STATUS_SCANNING: &str = "Scanning... Hold the device near a tag.";
const STATUS_PAUSED: &str = "Scanning paused. Tap to resume.";
const STATUS_IDLE: &str = "Tap to scan.";

/// Lifecycle of the scanning screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Unavailable,
    Idle,
    Scanning,
}

/// Messages delivered into the session actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Toggle,
    CheckAvailability,
    ShowHistory,
    Teardown,
}

/// Orchestrates the discover/stop protocol against the tag radio and feeds
/// every capture into the history.
///
/// All mutable state is owned by one actor task; the discovery channel is
/// the only asynchronous re-entry path and is drained by the same actor.
pub struct ScanSession<R: TagRadio, S: KeyValueStore> {
    radio: R,
    history: LogStore<S>,
    state: SessionState,
    status: String,
    pending: Option<oneshot::Receiver<TagData>>,
}

impl<R: TagRadio, S: KeyValueStore> ScanSession<R, S> {
    pub fn new(radio: R, history: LogStore<S>) -> Self {
        Self {
            radio,
            history,
            state: SessionState::Unknown,
            status: String::new(),
            pending: None,
        }
    }

    /// Actor loop: performs the startup availability check, then processes
    /// commands. While a session is open the pending discovery is raced
    /// against incoming commands, with discovery polled first: a tag that
    /// lands together with a command must win.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        self.check_availability().await;

        loop {
            let keep_going = if let Some(mut discovery) = self.pending.take() {
                tokio::select! {
                    biased;
                    outcome = &mut discovery => {
                        match outcome {
                            Ok(tag) => self.on_discovered(tag).await,
                            Err(_) => self.on_session_ended(),
                        }
                        true
                    }
                    cmd = commands.recv() => {
                        self.pending = Some(discovery);
                        self.handle_command(cmd).await
                    }
                }
            } else {
                let cmd = commands.recv().await;
                self.handle_command(cmd).await
            };

            if !keep_going {
                return;
            }
        }
    }

    /// A closed command channel counts as teardown.
    async fn handle_command(&mut self, cmd: Option<SessionCommand>) -> bool {
        match cmd {
            Some(SessionCommand::Toggle) => self.toggle().await,
            Some(SessionCommand::CheckAvailability) => {
                self.check_availability().await;
            }
            Some(SessionCommand::ShowHistory) => self.show_history(),
            Some(SessionCommand::Teardown) | None => {
                self.teardown().await;
                return false;
            }
        }
        true
    }

    /// Probe the radio. A platform failure counts as unavailable and its
    /// message becomes the status line.
    pub async fn check_availability(&mut self) -> bool {
        match self.radio.is_available().await {
            Ok(true) => {
                if self.state != SessionState::Scanning {
                    self.set_state(SessionState::Idle, STATUS_AVAILABLE);
                }
                true
            }
            Ok(false) => {
                self.set_state(SessionState::Unavailable, STATUS_UNAVAILABLE);
                false
            }
            Err(e) => {
                self.set_state(SessionState::Unavailable, &e.to_string());
                false
            }
        }
    }

    /// One UI entry point: the first tap starts a session, the next stops it.
    /// From an unavailable (or not yet checked) radio, re-check first.
    pub async fn toggle(&mut self) {
        if matches!(
            self.state,
            SessionState::Unknown | SessionState::Unavailable
        ) {
            if !self.check_availability().await {
                warn!("{}", self.status);
                return;
            }
        }

        if self.state == SessionState::Scanning {
            self.stop().await;
        } else {
            self.start().await;
        }
    }

    /// Open a radio session. The attempt resolves exactly once through one
    /// of three disjoint paths: the start call is rejected (handled here), a
    /// tag arrives (`on_discovered`), or the radio ends the session without
    /// one (`on_session_ended`).
    async fn start(&mut self) {
        self.set_state(SessionState::Scanning, STATUS_SCANNING);

        let (discovered_tx, discovered_rx) = oneshot::channel();
        match self.radio.start_session(&POLLING_MODES, discovered_tx).await {
            Ok(()) => self.pending = Some(discovered_rx),
            Err(e) => self.set_state(SessionState::Idle, &e.to_string()),
        }
    }

    /// End the current session. Stop failures are discarded: stopping an
    /// already-closed session is benign.
    async fn stop(&mut self) {
        if let Err(e) = self.radio.stop_session().await {
            debug!("Ignoring stop-session error: {}", e);
        }
        self.pending = None;
        self.set_state(SessionState::Idle, STATUS_PAUSED);
    }

    /// A tag came in on the discovery channel.
    async fn on_discovered(&mut self, tag: TagData) {
        self.pending = None;

        let captured_at = Utc::now();
        let entry = LogEntry::new(
            captured_at.to_rfc3339(),
            summary::summarize(&tag),
            tag.to_string(),
        );
        info!("Tag discovered: {}", entry.summary);

        if let Err(e) = self.history.append(entry).await {
            // The capture stays visible in memory; only persistence failed.
            warn!("Failed to persist scan history: {}", e);
        }

        // The radio auto-stops after the first tag; stop again anyway.
        if let Err(e) = self.radio.stop_session().await {
            debug!("Ignoring stop-session error: {}", e);
        }

        self.set_state(
            SessionState::Idle,
            &format!("Tag captured at {}.", captured_at.format("%H:%M:%S")),
        );
    }

    /// The radio closed the session without delivering a tag.
    fn on_session_ended(&mut self) {
        self.pending = None;
        if self.state == SessionState::Scanning {
            self.set_state(SessionState::Idle, STATUS_IDLE);
        }
    }

    /// Screen teardown: force an active session closed, errors swallowed.
    async fn teardown(&mut self) {
        if self.state == SessionState::Scanning {
            if let Err(e) = self.radio.stop_session().await {
                debug!("Ignoring stop-session error: {}", e);
            }
            self.pending = None;
            self.state = SessionState::Idle;
        }
        debug!("Scan session torn down");
    }

    fn show_history(&self) {
        println!("Status: {}", self.status);
        let entries = self.history.entries();
        if entries.is_empty() {
            println!("No scans recorded yet.");
            return;
        }
        println!("{} scan(s), newest first:", entries.len());
        for entry in entries {
            println!("  {}  {}", entry.timestamp, entry.summary);
        }
    }

    fn set_state(&mut self, state: SessionState, status: &str) {
        self.state = state;
        self.status = status.to_string();
        info!("[{:?}] {}", state, status);
    }
}
