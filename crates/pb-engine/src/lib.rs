//! Playback engine for the pulsebox synthesizer.
//!
//! Interprets one MML song per voice and mixes two pulse-wave channels one
//! sample at a time. Nothing reachable from [`Engine::render`] allocates,
//! blocks, or does unbounded work, so it can run inside a host audio callback.

#![cfg_attr(not(feature = "std"), no_std)]

mod error;
pub mod frequency;
mod mixer;
pub mod mml;
mod voice;

pub use error::EngineError;
pub use frequency::{key_frequency, period_for_key, piano_key, tempo_for_bpm, NoteName};
pub use mixer::Engine;
pub use mml::{Command, Event, Interpreter, Settings};
pub use voice::{DutyCycle, Voice, VoiceId, CHANNEL_ATTENUATION};

/// Number of independent voices mixed by the engine.
pub const VOICE_COUNT: usize = 2;

/// Size of each voice's song buffer. Songs must be strictly shorter.
pub const SONG_CAPACITY: usize = 4096;

/// Sample rate used when no audio device dictates one.
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;
