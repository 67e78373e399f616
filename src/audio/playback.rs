//! Single-slot audio playback via `rodio`.
//!
//! [`PlaybackSlot`] enforces the one-active-playback rule: starting a new
//! clip stops whatever was playing before. The rodio output stream is not
//! `Send`, so it lives on a dedicated playback thread and the slot only
//! holds a command channel.

use std::io::Cursor;
use std::sync::mpsc;

use thiserror::Error;

use crate::audio::clip::AudioClip;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Failures while opening the output device or decoding a clip.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device available: {0}")]
    NoDevice(String),

    #[error("failed to open playback sink: {0}")]
    Sink(String),

    #[error("failed to decode audio clip: {0}")]
    Decode(String),

    #[error("playback thread is gone")]
    Worker,
}

// ---------------------------------------------------------------------------
// PlaybackSlot
// ---------------------------------------------------------------------------

enum Command {
    Play(Vec<u8>, mpsc::Sender<Result<(), PlaybackError>>),
    Stop,
}

/// Holds at most one active playback; last writer stops the previous clip.
///
/// # Example
/// ```rust,no_run
/// use medbridge::audio::{AudioClip, PlaybackSlot};
///
/// let slot = PlaybackSlot::new().unwrap();
/// let clip = AudioClip::new(std::fs::read("note.mp3").unwrap(), "audio/mpeg");
/// slot.play(&clip).unwrap();   // stops anything already playing
/// slot.stop();
/// ```
pub struct PlaybackSlot {
    tx: mpsc::Sender<Command>,
}

impl PlaybackSlot {
    /// Open the default output device on a dedicated playback thread.
    pub fn new() -> Result<Self, PlaybackError> {
        let (tx, rx) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), PlaybackError>>();

        std::thread::Builder::new()
            .name("playback".into())
            .spawn(move || playback_loop(rx, ready_tx))
            .map_err(|_| PlaybackError::Worker)?;

        ready_rx.recv().map_err(|_| PlaybackError::Worker)??;
        Ok(Self { tx })
    }

    /// Start playing `clip`, stopping the previous clip first.
    pub fn play(&self, clip: &AudioClip) -> Result<(), PlaybackError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(Command::Play(clip.bytes.clone(), reply_tx))
            .map_err(|_| PlaybackError::Worker)?;
        reply_rx.recv().map_err(|_| PlaybackError::Worker)?
    }

    /// Stop the active playback, if any. Idempotent.
    pub fn stop(&self) {
        let _ = self.tx.send(Command::Stop);
    }
}

fn playback_loop(rx: mpsc::Receiver<Command>, ready_tx: mpsc::Sender<Result<(), PlaybackError>>) {
    let stream = match rodio::OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready_tx.send(Err(PlaybackError::NoDevice(e.to_string())));
            return;
        }
    };
    let (_stream, handle) = stream;
    let _ = ready_tx.send(Ok(()));

    let mut current: Option<rodio::Sink> = None;

    while let Ok(cmd) = rx.recv() {
        match cmd {
            Command::Play(bytes, reply_tx) => {
                let result = (|| -> Result<rodio::Sink, PlaybackError> {
                    let source = rodio::Decoder::new(Cursor::new(bytes))
                        .map_err(|e| PlaybackError::Decode(e.to_string()))?;
                    let sink = rodio::Sink::try_new(&handle)
                        .map_err(|e| PlaybackError::Sink(e.to_string()))?;
                    sink.append(source);
                    Ok(sink)
                })();

                match result {
                    Ok(sink) => {
                        // Stop the previous clip before the new one starts.
                        if let Some(prev) = current.take() {
                            prev.stop();
                        }
                        current = Some(sink);
                        let _ = reply_tx.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply_tx.send(Err(e));
                    }
                }
            }
            Command::Stop => {
                if let Some(prev) = current.take() {
                    prev.stop();
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// The slot handle must be Send so the session can live in a tokio task.
    #[test]
    fn playback_slot_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<PlaybackSlot>();
    }
}
