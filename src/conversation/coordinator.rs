//! Turn coordinator — the state machine that serializes the pipeline.
//!
//! # State machine
//!
//! ```text
//! Idle ──start_turn(s)──▶ Capturing(s)
//!      ◀─device error────┘
//!
//! Capturing(s) ──stop_turn(s)──▶ Processing(s)
//!
//! Processing(s) ──empty audio / empty transcript──▶ Idle   (NoSpeech)
//!               ──transcribe → translate → commit──▶ Idle  (Committed)
//!               ──service failure──────────────────▶ Idle  (error surfaced)
//! ```
//!
//! The cardinal invariant: at most one speaker is ever being captured or
//! processed. While the phase is not `Idle`, any `start_turn` — from either
//! speaker — is rejected as busy. Every processing path, success or
//! failure, returns the phase to `Idle` so the other speaker can proceed.
//!
//! A turn is committed only with both texts populated; no partial turn ever
//! reaches the log.

use std::sync::Arc;

use thiserror::Error;

use crate::audio::{ActiveRecording, CaptureError, Recorder};
use crate::config::ConversationConfig;
use crate::services::{ServiceError, TranscriptionClient, TranslationClient};

use super::log::{ConversationLog, Turn};
use super::speaker::{Speaker, SpeakerSlot};

// ---------------------------------------------------------------------------
// TurnPhase
// ---------------------------------------------------------------------------

/// Authoritative pipeline phase for the whole conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Nobody is talking; both speakers' controls are live.
    Idle,
    /// `Speaker`'s microphone is buffering an utterance.
    Capturing(Speaker),
    /// `Speaker`'s utterance is in the transcribe→translate sequence.
    Processing(Speaker),
}

impl TurnPhase {
    /// `true` while a speaker holds the pipeline.
    pub fn is_busy(&self) -> bool {
        !matches!(self, TurnPhase::Idle)
    }
}

// ---------------------------------------------------------------------------
// TurnError / TurnOutcome
// ---------------------------------------------------------------------------

/// Failures surfaced by the coordinator. All of them leave the phase `Idle`
/// except [`TurnError::Busy`], which leaves the in-flight turn untouched.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Another utterance is being captured or processed.
    #[error("another turn is already in progress")]
    Busy,

    /// `stop_turn` was called for a speaker who is not capturing.
    #[error("{0} has no recording in progress")]
    NoActiveCapture(Speaker),

    /// The capture device could not be acquired; the phase stayed `Idle`.
    #[error("capture device unavailable: {0}")]
    DeviceAccess(#[from] CaptureError),

    /// Languages are locked once the conversation has at least one turn.
    #[error("languages cannot change after the conversation has started")]
    LanguageLocked,

    /// Transcription or translation failed; no turn was committed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// How a stopped turn resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Both stages succeeded and the turn is in the log.
    Committed(Turn),
    /// The utterance carried no detectable speech; nothing was committed.
    /// A legitimate outcome, not an error — the user is told to retry.
    NoSpeech,
}

// ---------------------------------------------------------------------------
// TurnCoordinator
// ---------------------------------------------------------------------------

/// Owns the conversation log's append operation and drives the
/// transcribe→translate sequence for one utterance at a time.
pub struct TurnCoordinator {
    phase: TurnPhase,
    active: Option<Box<dyn ActiveRecording>>,
    log: ConversationLog,
    doctor: SpeakerSlot,
    patient: SpeakerSlot,
    doctor_recorder: Arc<dyn Recorder>,
    patient_recorder: Arc<dyn Recorder>,
    transcriber: Arc<dyn TranscriptionClient>,
    translator: Arc<dyn TranslationClient>,
    context_window: usize,
}

impl TurnCoordinator {
    pub fn new(
        config: &ConversationConfig,
        transcriber: Arc<dyn TranscriptionClient>,
        translator: Arc<dyn TranslationClient>,
        doctor_recorder: Arc<dyn Recorder>,
        patient_recorder: Arc<dyn Recorder>,
    ) -> Self {
        Self {
            phase: TurnPhase::Idle,
            active: None,
            log: ConversationLog::new(),
            doctor: SpeakerSlot::new(config.doctor_language.clone()),
            patient: SpeakerSlot::new(config.patient_language.clone()),
            doctor_recorder,
            patient_recorder,
            transcriber,
            translator,
            context_window: config.context_window,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Read-only snapshot of the committed conversation.
    pub fn conversation(&self) -> &[Turn] {
        self.log.turns()
    }

    pub fn turn(&self, id: u64) -> Option<&Turn> {
        self.log.get(id)
    }

    pub fn language_of(&self, speaker: Speaker) -> &str {
        &self.slot(speaker).language
    }

    /// Full original-text transcript for note generation.
    pub fn transcript(&self) -> String {
        self.log.transcript()
    }

    // -----------------------------------------------------------------------
    // Language management
    // -----------------------------------------------------------------------

    /// Change a speaker's language. Rejected once any turn is committed —
    /// already-recorded turns keep the languages they were committed with.
    pub fn set_language(
        &mut self,
        speaker: Speaker,
        code: impl Into<String>,
    ) -> Result<(), TurnError> {
        if !self.log.is_empty() {
            return Err(TurnError::LanguageLocked);
        }
        self.slot_mut(speaker).language = code.into();
        Ok(())
    }

    /// Swap the two speakers' languages. Same lock as [`set_language`].
    ///
    /// [`set_language`]: Self::set_language
    pub fn swap_languages(&mut self) -> Result<(), TurnError> {
        if !self.log.is_empty() {
            return Err(TurnError::LanguageLocked);
        }
        std::mem::swap(&mut self.doctor.language, &mut self.patient.language);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Turn lifecycle
    // -----------------------------------------------------------------------

    /// `Idle → Capturing(speaker)`.
    ///
    /// Rejected as [`TurnError::Busy`] while any turn is in flight — this is
    /// what makes the other speaker's start control a no-op. A device
    /// failure surfaces immediately and the phase stays `Idle`.
    pub fn start_turn(&mut self, speaker: Speaker) -> Result<(), TurnError> {
        if self.phase.is_busy() {
            log::debug!("start_turn({speaker}) rejected: {:?}", self.phase);
            return Err(TurnError::Busy);
        }

        let recording = self.recorder_for(speaker).begin()?;
        self.active = Some(recording);
        self.phase = TurnPhase::Capturing(speaker);
        log::debug!("turn: Idle → Capturing({speaker})");
        Ok(())
    }

    /// `Capturing(speaker) → Processing(speaker) → Idle`.
    ///
    /// Drives the full transcribe→translate sequence and commits the turn.
    /// Whatever happens — commit, no-speech, or service failure — the phase
    /// is `Idle` when this returns.
    pub async fn stop_turn(&mut self, speaker: Speaker) -> Result<TurnOutcome, TurnError> {
        match self.phase {
            TurnPhase::Capturing(s) if s == speaker => {}
            _ => return Err(TurnError::NoActiveCapture(speaker)),
        }

        let Some(recording) = self.active.take() else {
            // Unreachable by construction; recover rather than wedge.
            self.phase = TurnPhase::Idle;
            return Err(TurnError::NoActiveCapture(speaker));
        };

        let clip = recording.finish();
        self.phase = TurnPhase::Processing(speaker);
        log::debug!("turn: Capturing({speaker}) → Processing({speaker})");

        let result = self.process(speaker, clip).await;

        self.phase = TurnPhase::Idle;
        log::debug!("turn: Processing({speaker}) → Idle");
        result
    }

    /// The processing algorithm for one utterance.
    async fn process(
        &mut self,
        speaker: Speaker,
        clip: crate::audio::AudioClip,
    ) -> Result<TurnOutcome, TurnError> {
        if clip.is_empty() {
            log::info!("turn({speaker}): empty recording, nothing to transcribe");
            return Ok(TurnOutcome::NoSpeech);
        }

        let source = self.slot(speaker).language.clone();
        let target = self.slot(speaker.other()).language.clone();

        let original_text = self.transcriber.transcribe(&clip, Some(&source)).await?;

        if original_text.trim().is_empty() {
            // Empty transcription is a legitimate "nothing detected"
            // outcome, not an error.
            log::info!("turn({speaker}): transcription came back empty");
            return Ok(TurnOutcome::NoSpeech);
        }

        // Context reflects only turns committed before this one.
        let context = self.log.context_window(self.context_window);

        let translated_text = self
            .translator
            .translate(&original_text, &source, &target, context.as_deref())
            .await?;

        let turn = self
            .log
            .commit(speaker, original_text, translated_text, source, target);

        log::info!("turn({speaker}): committed #{}", turn.id);
        Ok(TurnOutcome::Committed(turn))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn slot(&self, speaker: Speaker) -> &SpeakerSlot {
        match speaker {
            Speaker::Doctor => &self.doctor,
            Speaker::Patient => &self.patient,
        }
    }

    fn slot_mut(&mut self, speaker: Speaker) -> &mut SpeakerSlot {
        match speaker {
            Speaker::Doctor => &mut self.doctor,
            Speaker::Patient => &mut self.patient,
        }
    }

    fn recorder_for(&self, speaker: Speaker) -> &Arc<dyn Recorder> {
        match speaker {
            Speaker::Doctor => &self.doctor_recorder,
            Speaker::Patient => &self.patient_recorder,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::audio::{AudioClip, MockRecorder};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Transcriber that always returns a fixed transcript.
    struct FixedTranscriber(String);

    #[async_trait]
    impl TranscriptionClient for FixedTranscriber {
        async fn transcribe(
            &self,
            _clip: &AudioClip,
            _language_hint: Option<&str>,
        ) -> Result<String, ServiceError> {
            Ok(self.0.clone())
        }
    }

    /// Transcriber that always fails.
    struct FailTranscriber;

    #[async_trait]
    impl TranscriptionClient for FailTranscriber {
        async fn transcribe(
            &self,
            _clip: &AudioClip,
            _language_hint: Option<&str>,
        ) -> Result<String, ServiceError> {
            Err(ServiceError::Status {
                status: 500,
                body: "boom".into(),
            })
        }
    }

    /// Translator that records every call and answers `"«text»"`.
    struct SpyTranslator {
        calls: Mutex<Vec<(String, String, String, Option<String>)>>,
    }

    impl SpyTranslator {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, String, String, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranslationClient for SpyTranslator {
        async fn translate(
            &self,
            text: &str,
            source_language: &str,
            target_language: &str,
            context: Option<&str>,
        ) -> Result<String, ServiceError> {
            self.calls.lock().unwrap().push((
                text.to_string(),
                source_language.to_string(),
                target_language.to_string(),
                context.map(|c| c.to_string()),
            ));
            Ok(format!("«{text}»"))
        }
    }

    /// Translator that always fails.
    struct FailTranslator;

    #[async_trait]
    impl TranslationClient for FailTranslator {
        async fn translate(
            &self,
            _text: &str,
            _source: &str,
            _target: &str,
            _context: Option<&str>,
        ) -> Result<String, ServiceError> {
            Err(ServiceError::Timeout)
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn speech_clip() -> AudioClip {
        AudioClip::new(vec![0u8; 256], "audio/wav")
    }

    fn make_coordinator(
        transcriber: Arc<dyn TranscriptionClient>,
        translator: Arc<dyn TranslationClient>,
    ) -> TurnCoordinator {
        let recorder: Arc<dyn Recorder> = Arc::new(MockRecorder::yielding(speech_clip()));
        TurnCoordinator::new(
            &ConversationConfig::default(),
            transcriber,
            translator,
            Arc::clone(&recorder),
            recorder,
        )
    }

    async fn run_turn(coordinator: &mut TurnCoordinator, speaker: Speaker) -> TurnOutcome {
        coordinator.start_turn(speaker).unwrap();
        coordinator.stop_turn(speaker).await.unwrap()
    }

    // -----------------------------------------------------------------------
    // End-to-end scenario
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn doctor_turn_commits_with_both_texts_and_languages() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("Hello".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        let outcome = run_turn(&mut coordinator, Speaker::Doctor).await;

        let TurnOutcome::Committed(turn) = outcome else {
            panic!("expected a committed turn");
        };
        assert_eq!(turn.speaker, Speaker::Doctor);
        assert_eq!(turn.original_text, "Hello");
        assert_eq!(turn.translated_text, "«Hello»");
        assert_eq!(turn.source_language, "eng");
        assert_eq!(turn.target_language, "urd");
        assert_eq!(coordinator.conversation().len(), 1);
        assert_eq!(coordinator.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn patient_turn_uses_reversed_language_pair() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("مجھے بخار ہے".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        run_turn(&mut coordinator, Speaker::Patient).await;

        let calls = spy.calls();
        assert_eq!(calls[0].1, "urd"); // source = patient slot
        assert_eq!(calls[0].2, "eng"); // target = doctor slot
    }

    // -----------------------------------------------------------------------
    // Mutual exclusion
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn second_start_is_rejected_while_capturing() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("hi".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        coordinator.start_turn(Speaker::Doctor).unwrap();

        // Both the other speaker and the same speaker are rejected.
        assert!(matches!(
            coordinator.start_turn(Speaker::Patient),
            Err(TurnError::Busy)
        ));
        assert!(matches!(
            coordinator.start_turn(Speaker::Doctor),
            Err(TurnError::Busy)
        ));
        assert_eq!(coordinator.phase(), TurnPhase::Capturing(Speaker::Doctor));

        // The in-flight turn is unaffected by the rejected starts.
        let outcome = coordinator.stop_turn(Speaker::Doctor).await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Committed(_)));
    }

    #[tokio::test]
    async fn stop_for_wrong_speaker_is_rejected() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("hi".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        coordinator.start_turn(Speaker::Doctor).unwrap();
        assert!(matches!(
            coordinator.stop_turn(Speaker::Patient).await,
            Err(TurnError::NoActiveCapture(Speaker::Patient))
        ));
        // Doctor's capture is still live.
        assert_eq!(coordinator.phase(), TurnPhase::Capturing(Speaker::Doctor));
    }

    #[tokio::test]
    async fn stop_without_start_is_rejected() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("hi".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        assert!(matches!(
            coordinator.stop_turn(Speaker::Doctor).await,
            Err(TurnError::NoActiveCapture(Speaker::Doctor))
        ));
    }

    // -----------------------------------------------------------------------
    // Context windowing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn context_excludes_the_in_flight_turn() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("line".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        // First turn: no context at all.
        run_turn(&mut coordinator, Speaker::Doctor).await;
        // Second turn: context is exactly the first turn.
        run_turn(&mut coordinator, Speaker::Patient).await;

        let calls = spy.calls();
        assert_eq!(calls[0].3, None);
        let second_ctx = calls[1].3.as_deref().unwrap();
        assert_eq!(second_ctx, "Doctor: line");
        // Never the in-flight turn's own text as a Patient line.
        assert!(!second_ctx.contains("Patient:"));
    }

    #[tokio::test]
    async fn context_window_holds_three_most_recent_turns() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("x".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        for _ in 0..5 {
            run_turn(&mut coordinator, Speaker::Doctor).await;
        }

        let calls = spy.calls();
        let fifth_ctx = calls[4].3.as_deref().unwrap();
        assert_eq!(fifth_ctx.lines().count(), 3);
    }

    // -----------------------------------------------------------------------
    // No-speech and failure paths
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_transcription_commits_nothing_and_frees_the_pipeline() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        let outcome = run_turn(&mut coordinator, Speaker::Doctor).await;
        assert_eq!(outcome, TurnOutcome::NoSpeech);
        assert!(coordinator.conversation().is_empty());
        assert!(spy.calls().is_empty(), "translation must not run");

        // The other speaker can proceed immediately.
        assert!(coordinator.start_turn(Speaker::Patient).is_ok());
    }

    #[tokio::test]
    async fn empty_recording_skips_transcription_entirely() {
        let spy = SpyTranslator::new();
        let recorder: Arc<dyn Recorder> =
            Arc::new(MockRecorder::yielding(AudioClip::new(Vec::new(), "audio/wav")));
        let mut coordinator = TurnCoordinator::new(
            &ConversationConfig::default(),
            Arc::new(FailTranscriber), // would error if ever called
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
            Arc::clone(&recorder),
            recorder,
        );

        let outcome = run_turn(&mut coordinator, Speaker::Doctor).await;
        assert_eq!(outcome, TurnOutcome::NoSpeech);
        assert_eq!(coordinator.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn transcription_failure_returns_to_idle_without_a_turn() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FailTranscriber),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        coordinator.start_turn(Speaker::Doctor).unwrap();
        let err = coordinator.stop_turn(Speaker::Doctor).await.unwrap_err();
        assert!(matches!(err, TurnError::Service(_)));
        assert!(coordinator.conversation().is_empty());
        assert_eq!(coordinator.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn translation_failure_never_commits_a_partial_turn() {
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("Hello".into())),
            Arc::new(FailTranslator),
        );

        coordinator.start_turn(Speaker::Doctor).unwrap();
        let err = coordinator.stop_turn(Speaker::Doctor).await.unwrap_err();
        assert!(matches!(err, TurnError::Service(ServiceError::Timeout)));

        // Atomic commit: no turn with original text but no translation.
        assert!(coordinator.conversation().is_empty());
        assert_eq!(coordinator.phase(), TurnPhase::Idle);

        // The pipeline is reusable after the failure.
        assert!(coordinator.start_turn(Speaker::Patient).is_ok());
    }

    #[tokio::test]
    async fn device_failure_surfaces_at_start_and_stays_idle() {
        let spy = SpyTranslator::new();
        let bad: Arc<dyn Recorder> = Arc::new(MockRecorder::unavailable());
        let good: Arc<dyn Recorder> = Arc::new(MockRecorder::yielding(speech_clip()));
        let mut coordinator = TurnCoordinator::new(
            &ConversationConfig::default(),
            Arc::new(FixedTranscriber("hi".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
            bad,  // doctor's device is broken
            good, // patient's works
        );

        let err = coordinator.start_turn(Speaker::Doctor).unwrap_err();
        assert!(matches!(err, TurnError::DeviceAccess(_)));
        assert_eq!(coordinator.phase(), TurnPhase::Idle);

        // The patient's control still works.
        assert!(coordinator.start_turn(Speaker::Patient).is_ok());
    }

    // -----------------------------------------------------------------------
    // Language lock
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn languages_are_mutable_before_the_first_turn() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("hola".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        coordinator.set_language(Speaker::Patient, "spa").unwrap();
        coordinator.swap_languages().unwrap();
        assert_eq!(coordinator.language_of(Speaker::Doctor), "spa");
        assert_eq!(coordinator.language_of(Speaker::Patient), "eng");
    }

    #[tokio::test]
    async fn languages_lock_after_the_first_commit() {
        let spy = SpyTranslator::new();
        let mut coordinator = make_coordinator(
            Arc::new(FixedTranscriber("Hello".into())),
            Arc::clone(&spy) as Arc<dyn TranslationClient>,
        );

        run_turn(&mut coordinator, Speaker::Doctor).await;

        assert!(matches!(
            coordinator.set_language(Speaker::Patient, "spa"),
            Err(TurnError::LanguageLocked)
        ));
        assert!(matches!(
            coordinator.swap_languages(),
            Err(TurnError::LanguageLocked)
        ));

        // Committed turns keep their recorded languages.
        let turn = &coordinator.conversation()[0];
        assert_eq!(turn.source_language, "eng");
        assert_eq!(turn.target_language, "urd");
    }
}
