//! Engine error type.

use core::fmt;

/// Rejected transport request. Nothing is mutated when one of these is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// Voice index outside `1..=VOICE_COUNT`
    InvalidVoice(usize),
    /// Song text was empty
    EmptySong,
    /// Song text does not fit the voice buffer
    SongTooLong { len: usize, capacity: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidVoice(index) => write!(f, "invalid audio voice: {}", index),
            EngineError::EmptySong => write!(f, "invalid length of MML string: empty"),
            EngineError::SongTooLong { len, capacity } => write!(
                f,
                "invalid length of MML string: {} bytes (must be below {})",
                len, capacity
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EngineError {}
