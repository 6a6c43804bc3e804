//! Main synthesis engine: owns the voices and mixes them sample by sample.

use crate::voice::{Voice, VoiceId};
use crate::{EngineError, VOICE_COUNT};

/// The pulsebox engine.
///
/// Hosts share it between a control thread and the audio callback behind a
/// single lock; every method is O(1) apart from [`Engine::render`], which is
/// linear in the buffer it fills.
#[derive(Clone, Debug)]
pub struct Engine {
    /// Voice states
    voices: [Voice; VOICE_COUNT],
    /// Output sample rate, fixed at construction
    sample_rate: f32,
    /// Master gain, 0..=1
    gain: f32,
}

impl Engine {
    /// Create an engine with idle voices and unity gain.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::new()),
            sample_rate,
            gain: 1.0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Install a song on a voice, resetting its parameters.
    pub fn play(&mut self, voice: VoiceId, mml: &str) -> Result<(), EngineError> {
        self.voices[voice.slot()].load(mml, self.sample_rate)
    }

    /// Silence a voice. Idempotent.
    pub fn stop(&mut self, voice: VoiceId) {
        self.voices[voice.slot()].halt();
    }

    /// Silence every voice.
    pub fn stop_all(&mut self) {
        for voice in &mut self.voices {
            voice.halt();
        }
    }

    /// Set the master gain, clamped to 0..=1 (NaN becomes 0). Returns the stored value.
    pub fn set_gain(&mut self, gain: f32) -> f32 {
        self.gain = if gain.is_nan() { 0.0 } else { gain.clamp(0.0, 1.0) };
        self.gain
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn voice(&self, voice: VoiceId) -> &Voice {
        &self.voices[voice.slot()]
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// True when no voice is sounding or has song left.
    pub fn is_idle(&self) -> bool {
        self.voices.iter().all(|v| !v.is_active())
    }

    /// Generate one output sample.
    ///
    /// A voice whose event just ran out contributes nothing this sample;
    /// the tick is spent fetching its next event.
    pub fn render_sample(&mut self) -> f32 {
        let sample_rate = self.sample_rate;
        let mut total = 0.0;

        for voice in &mut self.voices {
            match voice.tick() {
                Some(sample) => total += sample,
                None => voice.dispatch(sample_rate),
            }
        }

        (total * self.gain).clamp(-1.0, 1.0)
    }

    /// Fill `out` with consecutive output samples.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.render_sample();
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(crate::DEFAULT_SAMPLE_RATE)
    }
}
