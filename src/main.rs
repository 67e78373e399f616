//! Application entry point — medbridge encounter console.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run) and
//!    overlay credentials from the environment.
//! 3. Build the service clients — missing credentials fail fast here,
//!    before any network call.
//! 4. Open the optional playback slot and delivery gateway (the encounter
//!    degrades gracefully without either).
//! 5. Wire the [`Encounter`] and run the interactive console loop.

use std::io::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use medbridge::audio::{MicRecorder, PlaybackSlot, Recorder};
use medbridge::config::AppConfig;
use medbridge::conversation::{Speaker, TurnCoordinator, TurnOutcome};
use medbridge::delivery::{DeliveryGateway, WhatsAppGateway};
use medbridge::instructions::{ClarifiedInstructions, InstructionPipeline};
use medbridge::languages::LanguageDirectory;
use medbridge::notes::NoteBackend;
use medbridge::services::{
    ChatTranslator, RetryPolicy, ScribeClient, SynthesisClient, TranscriptionClient,
    TranslationClient, VoiceSynthesizer,
};
use medbridge::session::Encounter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("medbridge starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides();
        cfg
    });

    let languages = LanguageDirectory::default();
    let retry = RetryPolicy {
        max_attempts: config.retry.max_attempts,
    };

    // 3. Service clients — credential problems surface before any call.
    let transcriber: Arc<dyn TranscriptionClient> = Arc::new(
        ScribeClient::from_config(&config.transcription, retry)
            .context("transcription backend")?,
    );
    let translator = Arc::new(
        ChatTranslator::from_config(&config.translation, languages.clone(), retry)
            .context("translation backend")?,
    );
    let synthesizer: Arc<dyn SynthesisClient> = Arc::new(
        VoiceSynthesizer::from_config(&config.synthesis, retry).context("synthesis backend")?,
    );

    // 4. Optional collaborators
    let gateway: Option<Arc<dyn DeliveryGateway>> =
        match WhatsAppGateway::from_config(&config.delivery) {
            Ok(g) => Some(Arc::new(g)),
            Err(e) => {
                log::warn!("Delivery disabled: {e}");
                None
            }
        };

    let playback = match PlaybackSlot::new() {
        Ok(slot) => Some(slot),
        Err(e) => {
            log::warn!("Playback unavailable: {e}");
            None
        }
    };

    // 5. Wire the encounter
    let doctor_recorder: Arc<dyn Recorder> = Arc::new(MicRecorder::new());
    let patient_recorder: Arc<dyn Recorder> = Arc::new(MicRecorder::new());

    let coordinator = TurnCoordinator::new(
        &config.conversation,
        transcriber,
        Arc::clone(&translator) as Arc<dyn TranslationClient>,
        doctor_recorder,
        patient_recorder,
    );

    let instructions = InstructionPipeline::new(
        Arc::clone(&translator) as Arc<dyn TranslationClient>,
        Arc::clone(&synthesizer),
        config.conversation.doctor_language.clone(),
    );

    let notes: Arc<dyn NoteBackend> = translator;

    let mut encounter = Encounter::new(
        coordinator,
        synthesizer,
        instructions,
        notes,
        playback,
        gateway,
    );

    println!(
        "medbridge console — doctor speaks {}, patient speaks {}. Type `help` for commands.",
        languages.display_name(encounter.language_of(Speaker::Doctor)),
        languages.display_name(encounter.language_of(Speaker::Patient)),
    );

    run_console(&mut encounter, &languages).await
}

// ---------------------------------------------------------------------------
// Console loop
// ---------------------------------------------------------------------------

/// Drive the encounter from stdin. Every failure becomes a printed notice;
/// nothing here crashes the session.
async fn run_console(encounter: &mut Encounter, languages: &LanguageDirectory) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_instructions: Option<ClarifiedInstructions> = None;

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "doctor" => toggle_turn(encounter, Speaker::Doctor).await,
            "patient" => toggle_turn(encounter, Speaker::Patient).await,

            "log" => {
                for turn in encounter.conversation() {
                    println!(
                        "#{} {} [{}→{}]: {}  ⇒  {}",
                        turn.id,
                        turn.speaker,
                        turn.source_language,
                        turn.target_language,
                        turn.original_text,
                        turn.translated_text
                    );
                }
            }

            "play" => match rest.trim().parse::<u64>() {
                Ok(id) => {
                    if let Err(e) = encounter.play_turn_audio(id).await {
                        println!("playback failed: {e}");
                    }
                }
                Err(_) => println!("usage: play <turn id>"),
            },

            "stop" => encounter.stop_playback(),

            "lang" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some(role), Some(code)) => {
                        let speaker = if role == "doctor" {
                            Speaker::Doctor
                        } else {
                            Speaker::Patient
                        };
                        match encounter.set_language(speaker, code) {
                            Ok(()) => println!("{speaker} now speaks {}", languages.display_name(code)),
                            Err(e) => println!("{e}"),
                        }
                    }
                    _ => println!("usage: lang <doctor|patient> <code>"),
                }
            }

            "swap" => match encounter.swap_languages() {
                Ok(()) => println!("languages swapped"),
                Err(e) => println!("{e}"),
            },

            "clarify" => {
                let (lang, text) = rest.split_once(' ').unwrap_or((rest, ""));
                match encounter.clarify_instructions(text, lang).await {
                    Ok(result) => {
                        println!("clarified: {}", result.clarified_text);
                        if let Err(e) = encounter.play_clip(&result.audio) {
                            log::debug!("not playing instruction audio: {e}");
                        }
                        last_instructions = Some(result);
                    }
                    Err(e) => println!("clarification failed: {e}"),
                }
            }

            "send" => match &last_instructions {
                Some(instructions) => {
                    match encounter.send_instructions(rest.trim(), instructions).await {
                        Ok(()) => println!("instructions sent to {}", rest.trim()),
                        Err(e) => println!("delivery failed: {e}"),
                    }
                }
                None => println!("run `clarify` first"),
            },

            "note" => match encounter.generate_soap_note().await {
                Ok(note) => {
                    println!("Subjective: {}", note.subjective);
                    println!("Objective:  {}", note.objective);
                    println!("Assessment: {}", note.assessment);
                    println!("Plan:       {}", note.plan);
                }
                Err(e) => println!("note generation failed: {e}"),
            },

            "help" => print_help(),
            "quit" | "exit" => break,
            "" => {}
            other => println!("unknown command `{other}` — type `help`"),
        }
    }

    Ok(())
}

/// One key per speaker: press to start recording, press again to stop and
/// run the pipeline. The coordinator rejects the press while the other
/// speaker holds the pipeline.
async fn toggle_turn(encounter: &mut Encounter, speaker: Speaker) {
    use medbridge::conversation::TurnPhase;

    match encounter.phase() {
        TurnPhase::Capturing(s) if s == speaker => match encounter.stop_turn(speaker).await {
            Ok(TurnOutcome::Committed(turn)) => {
                println!("{}: {}  ⇒  {}", turn.speaker, turn.original_text, turn.translated_text);
            }
            Ok(TurnOutcome::NoSpeech) => {
                println!("no speech detected — please try again");
            }
            Err(e) => println!("turn failed: {e}"),
        },
        _ => match encounter.start_turn(speaker) {
            Ok(()) => println!("{speaker} recording… press again to stop"),
            Err(e) => println!("cannot start: {e}"),
        },
    }
}

fn print_help() {
    println!("commands:");
    println!("  doctor | patient       start/stop that speaker's turn");
    println!("  log                    show the conversation");
    println!("  play <id>              replay a turn's translation as audio");
    println!("  stop                   stop playback");
    println!("  lang <role> <code>     change a language (before the first turn)");
    println!("  swap                   swap the two languages (before the first turn)");
    println!("  clarify <lang> <text>  clarify + translate + voice an instruction");
    println!("  send <number>          deliver the last clarified instruction");
    println!("  note                   generate a SOAP note from the conversation");
    println!("  quit");
}
