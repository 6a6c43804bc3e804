//! Voice: one monophonic channel holding an MML song, its parse state, and
//! the pulse oscillator with its linear decay envelope.

use heapless::Vec;

use crate::frequency::period_for_key;
use crate::mml::{Event, Interpreter, Settings};
use crate::{EngineError, SONG_CAPACITY, VOICE_COUNT};

/// Fixed per-voice attenuation applied before the master gain.
pub const CHANNEL_ATTENUATION: f32 = 0.125;

/// Fraction of each pulse period spent high.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DutyCycle {
    /// 50%, selected with `m5`
    #[default]
    Half,
    /// 25%, selected with `m2`
    Quarter,
    /// 12.5%, selected with `m1`
    Eighth,
}

impl DutyCycle {
    /// Duty selected by an `m` command digit.
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            b'5' => Some(DutyCycle::Half),
            b'2' => Some(DutyCycle::Quarter),
            b'1' => Some(DutyCycle::Eighth),
            _ => None,
        }
    }

    /// Phase below which the oscillator outputs +1.
    pub const fn threshold(self, period: u32) -> u32 {
        match self {
            DutyCycle::Half => period / 2,
            DutyCycle::Quarter => period / 4,
            DutyCycle::Eighth => period / 8,
        }
    }
}

/// Handle to one of the engine's voices. Only valid indices can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceId(u8);

impl VoiceId {
    /// Validate a 1-based voice index as used by the control surface.
    pub fn from_index(index: usize) -> Result<Self, EngineError> {
        if (1..=VOICE_COUNT).contains(&index) {
            Ok(Self((index - 1) as u8))
        } else {
            Err(EngineError::InvalidVoice(index))
        }
    }

    /// 1-based index.
    pub fn index(self) -> usize {
        self.0 as usize + 1
    }

    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }

    /// Every voice, in index order.
    pub fn all() -> impl Iterator<Item = VoiceId> {
        (0..VOICE_COUNT as u8).map(VoiceId)
    }
}

/// A single pulse-wave voice.
///
/// Zeroed voices are idle: no song, no cursor, no time left to play.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Voice {
    /// MML text installed by the last `play`
    song: Vec<u8, SONG_CAPACITY>,
    /// Offset of the next command byte; `None` while the interpreter is idle
    cursor: Option<usize>,
    /// Octave, tempo, default length and duty in effect
    settings: Settings,
    /// Samples left in the current note or rest
    ttl: u32,
    /// Oscillator phase, 0..period
    phase: u32,
    /// Samples per waveform cycle; 0 during rests
    period: u32,
    /// Phase below which the output is high
    duty_threshold: u32,
    /// Current amplitude, 0..=1
    envelope: f32,
    /// Amplitude lost per sample
    decay: f32,
}

impl Voice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new song and reset every musical parameter.
    ///
    /// The next call to [`Voice::tick`] returns `None` so the caller dispatches
    /// the first event.
    pub fn load(&mut self, mml: &str, sample_rate: f32) -> Result<(), EngineError> {
        let bytes = mml.as_bytes();
        if bytes.is_empty() {
            return Err(EngineError::EmptySong);
        }
        if bytes.len() >= SONG_CAPACITY {
            return Err(EngineError::SongTooLong {
                len: bytes.len(),
                capacity: SONG_CAPACITY,
            });
        }

        self.song.clear();
        let stored = self.song.extend_from_slice(bytes);
        debug_assert!(stored.is_ok(), "song length checked against capacity");
        self.cursor = Some(0);
        self.settings = Settings::new(sample_rate);
        self.ttl = 0;
        self.phase = 0;
        self.period = 0;
        self.duty_threshold = 0;
        self.envelope = 0.0;
        self.decay = 0.0;
        Ok(())
    }

    /// Silence the voice and park the interpreter. The song stays in place.
    pub fn halt(&mut self) {
        self.ttl = 0;
        self.cursor = None;
    }

    /// Advance the oscillator and envelope by one sample.
    ///
    /// Returns this voice's contribution to the mix, or `None` when the
    /// current event has run out; the caller must then [`dispatch`](Voice::dispatch)
    /// instead of mixing anything from this voice for the sample.
    pub fn tick(&mut self) -> Option<f32> {
        if self.ttl == 0 {
            return None;
        }
        self.ttl -= 1;

        self.phase += 1;
        if self.phase >= self.period {
            self.phase = 0;
        }
        let raw = if self.period == 0 {
            0.0
        } else if self.phase < self.duty_threshold {
            1.0
        } else {
            -1.0
        };

        self.envelope = if self.ttl == 0 {
            0.0
        } else {
            (self.envelope - self.decay).max(0.0)
        };

        Some(raw * self.envelope * CHANNEL_ATTENUATION)
    }

    /// Run the interpreter from the cursor and program the next event.
    ///
    /// At the end of the song the voice goes idle until the next `load`.
    pub fn dispatch(&mut self, sample_rate: f32) {
        let Some(cursor) = self.cursor else {
            return;
        };

        let mut interp = Interpreter::new(&self.song, cursor, self.settings, sample_rate);
        let event = interp.next_event();
        let next = interp.cursor();
        self.settings = interp.settings();

        match event {
            Some(event) => {
                self.cursor = (next < self.song.len()).then_some(next);
                self.start(event, sample_rate);
            }
            None => self.halt(),
        }
    }

    fn start(&mut self, event: Event, sample_rate: f32) {
        self.ttl = event.ttl();
        self.phase = 0;
        match event {
            Event::Note { key, ttl } => {
                self.period = period_for_key(key, sample_rate);
                self.duty_threshold = self.settings.duty.threshold(self.period);
                self.envelope = 1.0;
                self.decay = 1.0 / ttl as f32;
            }
            Event::Rest { .. } => {
                self.period = 0;
                self.duty_threshold = 0;
                self.envelope = 0.0;
                self.decay = 0.0;
            }
        }
    }

    /// Whether the voice is sounding or still has song left to read.
    pub fn is_active(&self) -> bool {
        self.ttl > 0 || self.cursor.is_some()
    }

    /// The installed song, if any.
    pub fn song(&self) -> &str {
        core::str::from_utf8(&self.song).unwrap_or_default()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn duty_threshold(&self) -> u32 {
        self.duty_threshold
    }

    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }
}
