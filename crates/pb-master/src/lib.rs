//! Headless controller for pulsebox.
//!
//! Owns the engine shared with the audio callback and exposes the control
//! surface that hosts and scripting layers call: install a song on a voice,
//! stop a voice, adjust the master gain. Voices are addressed by 1-based index.

mod error;
mod wav;

use pb_audio::{AudioOutput, CpalOutput, RenderFn};
use pb_engine::{Engine, VoiceId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Re-export common types so callers don't need pb-engine/pb-audio directly.
pub use error::ControlError;
pub use pb_audio::AudioError;
pub use pb_engine::{EngineError, DEFAULT_SAMPLE_RATE, SONG_CAPACITY, VOICE_COUNT};

pub use wav::{samples_to_wav, write_wav};

/// Engine handle shared between the control thread and the render callback.
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Headless controller: owns the shared engine and, optionally, the live output.
pub struct Controller {
    engine: SharedEngine,
    output: Option<Box<dyn AudioOutput>>,
}

impl Controller {
    /// Create a controller with no audio output, for offline rendering or
    /// hosts that pull samples from [`Controller::engine`] themselves.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            engine: Arc::new(Mutex::new(Engine::new(sample_rate))),
            output: None,
        }
    }

    /// Create a controller driving `output`. The engine runs at the rate the
    /// output reports, and output starts immediately.
    pub fn with_output(mut output: Box<dyn AudioOutput>) -> Result<Self, ControlError> {
        let mut ctrl = Self::new(output.sample_rate() as f32);
        output.connect(render_callback(ctrl.engine.clone()))?;
        output.start()?;
        ctrl.output = Some(output);
        Ok(ctrl)
    }

    /// Create a controller playing through the system's default output device.
    pub fn with_default_device() -> Result<Self, ControlError> {
        Self::with_output(Box::new(CpalOutput::new()?))
    }

    /// Shared engine handle.
    pub fn engine(&self) -> SharedEngine {
        self.engine.clone()
    }

    pub fn sample_rate(&self) -> f32 {
        self.lock().sample_rate()
    }

    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Control surface ---

    /// Install `mml` on voice `voice_index` (1-based) and start it from the top.
    pub fn set_voice_song(&self, voice_index: usize, mml: &str) -> Result<(), ControlError> {
        let voice = VoiceId::from_index(voice_index).inspect_err(|e| log::warn!("play rejected: {}", e))?;
        self.lock()
            .play(voice, mml)
            .inspect_err(|e| log::warn!("play rejected on voice {}: {}", voice_index, e))?;
        log::debug!("voice {} playing {} byte(s) of MML", voice_index, mml.len());
        Ok(())
    }

    /// Silence voice `voice_index` (1-based). Stopping an idle voice is a no-op.
    pub fn stop_voice(&self, voice_index: usize) -> Result<(), ControlError> {
        let voice = VoiceId::from_index(voice_index).inspect_err(|e| log::warn!("stop rejected: {}", e))?;
        self.lock().stop(voice);
        log::debug!("voice {} stopped", voice_index);
        Ok(())
    }

    pub fn stop_all(&self) {
        self.lock().stop_all();
    }

    /// Set the master gain, clamped to 0..=1. Returns the stored value.
    pub fn set_gain(&self, value: f32) -> f32 {
        let stored = self.lock().set_gain(value);
        if stored != value {
            log::warn!("gain {} clamped to {}", value, stored);
        }
        log::debug!("gain set to {}", stored);
        stored
    }

    pub fn gain(&self) -> f32 {
        self.lock().gain()
    }

    /// Whether voice `voice_index` is sounding or still has song to read.
    pub fn is_voice_active(&self, voice_index: usize) -> Result<bool, ControlError> {
        let voice = VoiceId::from_index(voice_index)?;
        Ok(self.lock().voice(voice).is_active())
    }

    /// True once every voice has finished or been stopped.
    pub fn is_idle(&self) -> bool {
        self.lock().is_idle()
    }

    // --- Live output ---

    pub fn pause_output(&mut self) -> Result<(), ControlError> {
        if let Some(output) = self.output.as_mut() {
            output.stop()?;
        }
        Ok(())
    }

    pub fn resume_output(&mut self) -> Result<(), ControlError> {
        if let Some(output) = self.output.as_mut() {
            output.start()?;
        }
        Ok(())
    }

    pub fn is_output_running(&self) -> bool {
        self.output.as_ref().is_some_and(|o| o.is_running())
    }

    // --- Offline rendering ---

    /// Render from a snapshot of the current state until every voice is idle
    /// or `max_frames` samples exist. Live state is not advanced.
    pub fn render_frames(&self, max_frames: usize) -> Vec<f32> {
        let mut engine = self.lock().clone();
        let reserve = max_frames.min(engine.sample_rate() as usize);

        let mut frames = Vec::with_capacity(reserve);
        while !engine.is_idle() && frames.len() < max_frames {
            frames.push(engine.render_sample());
        }
        frames
    }

    /// Render at most `max_seconds` of audio to a 16-bit mono WAV image.
    pub fn render_to_wav(&self, max_seconds: u32) -> Vec<u8> {
        let sample_rate = self.sample_rate() as u32;
        let max_frames = (sample_rate as usize).saturating_mul(max_seconds as usize);
        let frames = self.render_frames(max_frames);
        log::info!(
            "rendered {} frame(s) ({:.2}s) at {} Hz",
            frames.len(),
            frames.len() as f32 / sample_rate.max(1) as f32,
            sample_rate
        );
        samples_to_wav(&frames, sample_rate)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(output) = self.output.as_mut() {
            if let Err(e) = output.stop() {
                log::warn!("failed to stop audio output: {}", e);
            }
        }
    }
}

/// Render callback for the device thread: one lock per buffer.
fn render_callback(engine: SharedEngine) -> RenderFn {
    Box::new(move |out: &mut [f32]| match engine.lock() {
        Ok(mut engine) => engine.render(out),
        Err(_) => out.fill(0.0),
    })
}
