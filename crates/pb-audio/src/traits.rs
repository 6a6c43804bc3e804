//! Audio output trait and error types.

/// Error type for audio operations.
#[derive(Debug)]
pub enum AudioError {
    /// Failed to initialize audio device
    DeviceInit(String),
    /// Failed to create audio stream
    StreamCreate(String),
    /// Playback error
    Playback(String),
    /// No audio device available
    NoDevice,
    /// `start` was called before a render callback was connected
    NotConnected,
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::DeviceInit(msg) => write!(f, "Device init error: {}", msg),
            AudioError::StreamCreate(msg) => write!(f, "Stream create error: {}", msg),
            AudioError::Playback(msg) => write!(f, "Playback error: {}", msg),
            AudioError::NoDevice => write!(f, "No audio device available"),
            AudioError::NotConnected => write!(f, "No render callback connected"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Fills a mono buffer with the next samples. Called from the device's
/// real-time thread, so it must not block or allocate.
pub type RenderFn = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

/// Trait for pull-model audio output backends.
pub trait AudioOutput {
    /// Sample rate granted by the device.
    fn sample_rate(&self) -> u32;

    /// Install the callback that produces samples. Replaces any previous one.
    fn connect(&mut self, render: RenderFn) -> Result<(), AudioError>;

    /// Start (or resume) invoking the render callback.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Pause output. The callback stays connected.
    fn stop(&mut self) -> Result<(), AudioError>;

    /// Whether the callback is currently being driven.
    fn is_running(&self) -> bool;
}
