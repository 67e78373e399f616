//! Encounter session — the surface the UI layer consumes.
//!
//! [`Encounter`] composes the turn coordinator, the synthesis client, the
//! single playback slot, the instruction pipeline, the note generator and
//! the optional delivery gateway behind one API:
//!
//! * `start_turn` / `stop_turn` — drive the live translation pipeline
//! * `conversation` — read-only snapshot of committed turns
//! * `play_turn_audio` — on-demand, repeatable synthesis + playback of a
//!   committed turn's translated text (translation is never re-run)
//! * `clarify_instructions` / `send_instructions` — the one-shot
//!   instruction pipeline and its delivery
//! * `generate_soap_note` — structured note over the transcript
//!
//! Dropping the `Encounter` drops any in-flight futures with it, so an
//! abandoned service call can never commit into a torn-down conversation.

use std::sync::Arc;

use thiserror::Error;

use crate::audio::{AudioClip, PlaybackError, PlaybackSlot};
use crate::conversation::{Speaker, Turn, TurnCoordinator, TurnError, TurnOutcome, TurnPhase};
use crate::delivery::{DeliveryError, DeliveryGateway};
use crate::instructions::{ClarifiedInstructions, InstructionError, InstructionPipeline};
use crate::notes::{NoteBackend, SoapNote};
use crate::services::{ServiceError, SynthesisClient};

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Failures from the session-level operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no turn with id {0}")]
    UnknownTurn(u64),

    #[error("the conversation has no turns yet")]
    EmptyConversation,

    #[error("audio playback is not available on this machine")]
    PlaybackUnavailable,

    #[error("delivery gateway is not configured")]
    DeliveryUnavailable,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

// ---------------------------------------------------------------------------
// Encounter
// ---------------------------------------------------------------------------

/// One live doctor↔patient encounter.
pub struct Encounter {
    coordinator: TurnCoordinator,
    synthesizer: Arc<dyn SynthesisClient>,
    instructions: InstructionPipeline,
    notes: Arc<dyn NoteBackend>,
    playback: Option<PlaybackSlot>,
    gateway: Option<Arc<dyn DeliveryGateway>>,
}

impl Encounter {
    pub fn new(
        coordinator: TurnCoordinator,
        synthesizer: Arc<dyn SynthesisClient>,
        instructions: InstructionPipeline,
        notes: Arc<dyn NoteBackend>,
        playback: Option<PlaybackSlot>,
        gateway: Option<Arc<dyn DeliveryGateway>>,
    ) -> Self {
        Self {
            coordinator,
            synthesizer,
            instructions,
            notes,
            playback,
            gateway,
        }
    }

    // -----------------------------------------------------------------------
    // Live translation pipeline
    // -----------------------------------------------------------------------

    pub fn start_turn(&mut self, speaker: Speaker) -> Result<(), TurnError> {
        self.coordinator.start_turn(speaker)
    }

    pub async fn stop_turn(&mut self, speaker: Speaker) -> Result<TurnOutcome, TurnError> {
        self.coordinator.stop_turn(speaker).await
    }

    pub fn phase(&self) -> TurnPhase {
        self.coordinator.phase()
    }

    /// Read-only snapshot of the committed conversation.
    pub fn conversation(&self) -> &[Turn] {
        self.coordinator.conversation()
    }

    pub fn language_of(&self, speaker: Speaker) -> &str {
        self.coordinator.language_of(speaker)
    }

    pub fn set_language(
        &mut self,
        speaker: Speaker,
        code: impl Into<String>,
    ) -> Result<(), TurnError> {
        self.coordinator.set_language(speaker, code)
    }

    pub fn swap_languages(&mut self) -> Result<(), TurnError> {
        self.coordinator.swap_languages()
    }

    // -----------------------------------------------------------------------
    // Turn audio replay
    // -----------------------------------------------------------------------

    /// Synthesize a committed turn's translated text.
    ///
    /// Repeatable and idempotent: every call is an independent synthesis of
    /// the same recorded text; translation is never re-run.
    pub async fn synthesize_turn(&self, turn_id: u64) -> Result<AudioClip, SessionError> {
        let turn = self
            .coordinator
            .turn(turn_id)
            .ok_or(SessionError::UnknownTurn(turn_id))?;

        let clip = self
            .synthesizer
            .synthesize(&turn.translated_text, None, None)
            .await?;
        Ok(clip)
    }

    /// Synthesize and play a committed turn's translated text, stopping any
    /// clip that is already playing.
    pub async fn play_turn_audio(&self, turn_id: u64) -> Result<(), SessionError> {
        let clip = self.synthesize_turn(turn_id).await?;
        self.play_clip(&clip)
    }

    /// Play an arbitrary clip (e.g. a generated voice note) through the
    /// single playback slot.
    pub fn play_clip(&self, clip: &AudioClip) -> Result<(), SessionError> {
        let slot = self
            .playback
            .as_ref()
            .ok_or(SessionError::PlaybackUnavailable)?;
        slot.play(clip)?;
        Ok(())
    }

    /// Stop whatever is playing. Idempotent.
    pub fn stop_playback(&self) {
        if let Some(slot) = &self.playback {
            slot.stop();
        }
    }

    // -----------------------------------------------------------------------
    // Instructions and notes
    // -----------------------------------------------------------------------

    /// Run the one-shot clarification pipeline. Independent of coordinator
    /// state — it can run mid-conversation or after it.
    pub async fn clarify_instructions(
        &self,
        raw_text: &str,
        target_language: &str,
    ) -> Result<ClarifiedInstructions, InstructionError> {
        self.instructions.run(raw_text, target_language).await
    }

    /// Deliver previously clarified instructions to a phone number.
    pub async fn send_instructions(
        &self,
        destination: &str,
        instructions: &ClarifiedInstructions,
    ) -> Result<(), SessionError> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or(SessionError::DeliveryUnavailable)?;

        gateway
            .deliver(
                destination,
                &instructions.clarified_text,
                Some(&instructions.audio),
            )
            .await?;
        Ok(())
    }

    /// Generate a SOAP note from the conversation so far.
    pub async fn generate_soap_note(&self) -> Result<SoapNote, SessionError> {
        if self.conversation().is_empty() {
            return Err(SessionError::EmptyConversation);
        }
        let note = self.notes.generate_note(&self.coordinator.transcript()).await?;
        Ok(note)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
