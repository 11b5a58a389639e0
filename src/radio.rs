use std::time::Duration;

use log::debug;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::error::ScanError;

/// Raw data structure of a discovered tag.
pub type TagData = Value;

/// Radio protocol families the reader listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingMode {
    Iso14443,
    Iso18092,
}

/// Every session polls for both supported proximity protocols.
pub const POLLING_MODES: [PollingMode; 2] = [PollingMode::Iso14443, PollingMode::Iso18092];

/// Boundary to the device's tag-radio driver.
///
/// A session delivers at most one discovery through the sender handed to
/// `start_session`. Dropping the sender without sending means the session
/// ended without seeing a tag.
pub trait TagRadio {
    async fn is_available(&mut self) -> Result<bool, ScanError>;

    async fn start_session(
        &mut self,
        modes: &[PollingMode],
        discovered: oneshot::Sender<TagData>,
    ) -> Result<(), ScanError>;

    async fn stop_session(&mut self) -> Result<(), ScanError>;
}

/// Demo driver so the binary runs without tag hardware: pretends a tag shows
/// up a moment after the session opens.
pub struct SimulatedRadio {
    available: bool,
    discovery_delay: Duration,
    session: Option<JoinHandle<()>>,
}

impl SimulatedRadio {
    pub fn new(available: bool, discovery_delay: Duration) -> Self {
        Self {
            available,
            discovery_delay,
            session: None,
        }
    }
}

impl TagRadio for SimulatedRadio {
    async fn is_available(&mut self) -> Result<bool, ScanError> {
        Ok(self.available)
    }

    async fn start_session(
        &mut self,
        modes: &[PollingMode],
        discovered: oneshot::Sender<TagData>,
    ) -> Result<(), ScanError> {
        if !self.available {
            return Err(ScanError::Unavailable(
                "tag radio is switched off".to_string(),
            ));
        }
        if self.session.is_some() {
            return Err(ScanError::Session(
                "a scan session is already open".to_string(),
            ));
        }

        debug!("Opening simulated scan session, polling {:?}", modes);
        let delay = self.discovery_delay;
        self.session = Some(tokio::spawn(async move {
            sleep(delay).await;
            if let Some(tag) = synthesize_tag(&mut rand::thread_rng()) {
                let _ = discovered.send(tag);
            }
            // No send: the sender drops and the session ends empty-handed.
        }));

        Ok(())
    }

    async fn stop_session(&mut self) -> Result<(), ScanError> {
        match self.session.take() {
            Some(handle) => {
                handle.abort();
                debug!("Simulated scan session stopped");
                Ok(())
            }
            None => Err(ScanError::Session("no scan session is open".to_string())),
        }
    }
}

const SAMPLE_TEXTS: &[&str] = &[
    "Open Door",
    "Hello from tagscan",
    "Inventory 7731",
    "https://example.com/asset/42",
];

/// Roughly one session in eight closes without a discovery; the rest produce
/// either an NDEF text tag or a bare technology listing.
fn synthesize_tag(rng: &mut impl Rng) -> Option<TagData> {
    if rng.gen_ratio(1, 8) {
        return None;
    }

    if rng.gen_ratio(1, 4) {
        return Some(json!({
            "nfca": {"atqa": [4, 0], "sak": 8},
            "mifareclassic": {"size": 1024}
        }));
    }

    let text = SAMPLE_TEXTS[rng.gen_range(0..SAMPLE_TEXTS.len())];
    Some(json!({
        "nfca": {"atqa": [4, 0], "sak": 8},
        "ndef": {
            "cachedMessage": {
                "records": [text_record(text)]
            }
        }
    }))
}

/// Short text record with a zero-length language code, so the whole
/// remainder after the prefix byte is the text.
fn text_record(text: &str) -> Value {
    let mut payload = vec![0u8];
    payload.extend_from_slice(text.as_bytes());
    json!({
        "typeNameFormat": 1,
        "type": [84],
        "payload": payload,
    })
}
