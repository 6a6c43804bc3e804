//! Controller error type.

use pb_audio::AudioError;
use pb_engine::EngineError;

/// Error returned by [`Controller`](crate::Controller) operations.
#[derive(Debug)]
pub enum ControlError {
    /// Rejected voice index or song text
    Engine(EngineError),
    /// Audio device failure
    Audio(AudioError),
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlError::Engine(e) => write!(f, "invalid argument: {}", e),
            ControlError::Audio(e) => write!(f, "audio error: {}", e),
        }
    }
}

impl std::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ControlError::Engine(e) => Some(e),
            ControlError::Audio(e) => Some(e),
        }
    }
}

impl From<EngineError> for ControlError {
    fn from(e: EngineError) -> Self {
        ControlError::Engine(e)
    }
}

impl From<AudioError> for ControlError {
    fn from(e: AudioError) -> Self {
        ControlError::Audio(e)
    }
}
