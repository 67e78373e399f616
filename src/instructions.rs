//! Instruction clarification pipeline.
//!
//! A one-shot pipeline, independent of the turn coordinator and the live
//! conversation: take the doctor's raw instruction text (typed or
//! dictated), clarify-and-translate it into the patient's language, then
//! synthesize a voice note **from the translated text**.
//!
//! Translate-then-synthesize order is a correctness invariant — running
//! synthesis on the original would produce audio in the wrong language.

use std::sync::Arc;

use thiserror::Error;

use crate::audio::AudioClip;
use crate::services::{ServiceError, SynthesisClient, TranslationClient};

/// Fixed context passed to the translation backend for instruction jobs.
///
/// This is deliberately *not* the conversation context: instructions are
/// clarified against a stable "medical guidance" register, whatever was
/// said in the encounter.
const CLARIFICATION_CONTEXT: &str = "Medical guidance for a patient. Consolidate, \
clarify and simplify the instructions in a clear, simple and encouraging tone \
before translating.";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The finished product of one instruction job.
#[derive(Debug, Clone)]
pub struct ClarifiedInstructions {
    /// Clarified instructions, in the patient's language.
    pub clarified_text: String,
    /// Voice note synthesized from `clarified_text`.
    pub audio: AudioClip,
}

/// Failures from the clarification pipeline.
#[derive(Debug, Error)]
pub enum InstructionError {
    /// The caller provided no instruction text at all.
    #[error("no instruction text provided")]
    EmptyInstruction,

    /// Translation or synthesis failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

// ---------------------------------------------------------------------------
// InstructionPipeline
// ---------------------------------------------------------------------------

/// Clarify → translate → synthesize, with no history retained across jobs.
pub struct InstructionPipeline {
    translator: Arc<dyn TranslationClient>,
    synthesizer: Arc<dyn SynthesisClient>,
    /// The doctor's working language — the source of every instruction.
    doctor_language: String,
}

impl InstructionPipeline {
    pub fn new(
        translator: Arc<dyn TranslationClient>,
        synthesizer: Arc<dyn SynthesisClient>,
        doctor_language: impl Into<String>,
    ) -> Self {
        Self {
            translator,
            synthesizer,
            doctor_language: doctor_language.into(),
        }
    }

    /// Run one instruction job.
    pub async fn run(
        &self,
        raw_text: &str,
        target_language: &str,
    ) -> Result<ClarifiedInstructions, InstructionError> {
        if raw_text.trim().is_empty() {
            return Err(InstructionError::EmptyInstruction);
        }

        let clarified_text = self
            .translator
            .translate(
                raw_text,
                &self.doctor_language,
                target_language,
                Some(CLARIFICATION_CONTEXT),
            )
            .await?;

        // The voice note is rendered from the translation, never the input.
        let audio = self
            .synthesizer
            .synthesize(&clarified_text, None, None)
            .await?;

        log::info!(
            "instructions: clarified {} chars into {target_language}, {} audio bytes",
            raw_text.len(),
            audio.bytes.len()
        );

        Ok(ClarifiedInstructions {
            clarified_text,
            audio,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
