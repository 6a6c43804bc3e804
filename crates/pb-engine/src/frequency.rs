//! Note resolution: note name + octave to piano key, key to oscillator period.
//!
//! Keys are numbered like a piano keyboard, 1 (A0) through 88 (C8), with
//! equal-tempered frequencies tuned to A4 = 440 Hz.

/// Lowest piano key.
pub const KEY_MIN: u8 = 1;

/// Highest piano key.
pub const KEY_MAX: u8 = 88;

/// Tempo clamp range in beats per minute.
pub const BPM_MIN: u32 = 32;
pub const BPM_MAX: u32 = 200;

/// Tempo installed by `play`.
pub const DEFAULT_BPM: u32 = 120;

/// Frequencies of the 88 piano keys in Hz. Index 0 is key 1 (A0).
#[rustfmt::skip]
pub const FREQUENCIES: [f32; 88] = [
      27.500,   29.135,   30.868,   32.703,   34.648,   36.708,   38.891,   41.203,
      43.654,   46.249,   48.999,   51.913,   55.000,   58.270,   61.735,   65.406,
      69.296,   73.416,   77.782,   82.407,   87.307,   92.499,   97.999,  103.826,
     110.000,  116.541,  123.471,  130.813,  138.591,  146.832,  155.563,  164.814,
     174.614,  184.997,  195.998,  207.652,  220.000,  233.082,  246.942,  261.626,
     277.183,  293.665,  311.127,  329.628,  349.228,  369.994,  391.995,  415.305,
     440.000,  466.164,  493.883,  523.251,  554.365,  587.330,  622.254,  659.255,
     698.456,  739.989,  783.991,  830.609,  880.000,  932.328,  987.767, 1046.502,
    1108.731, 1174.659, 1244.508, 1318.510, 1396.913, 1479.978, 1567.982, 1661.219,
    1760.000, 1864.655, 1975.533, 2093.005, 2217.461, 2349.318, 2489.016, 2637.020,
    2793.826, 2959.955, 3135.963, 3322.438, 3520.000, 3729.310, 3951.066, 4186.009,
];

/// Note letters accepted by the interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    /// Parse a note letter, case-insensitive.
    pub fn from_letter(letter: u8) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            b'c' => Some(NoteName::C),
            b'd' => Some(NoteName::D),
            b'e' => Some(NoteName::E),
            b'f' => Some(NoteName::F),
            b'g' => Some(NoteName::G),
            b'a' => Some(NoteName::A),
            b'b' => Some(NoteName::B),
            _ => None,
        }
    }

    /// Piano key of this note in octave 0. Octave 3 C is key 40 (C4).
    pub const fn base_key(self) -> i32 {
        match self {
            NoteName::C => 4,
            NoteName::D => 6,
            NoteName::E => 8,
            NoteName::F => 9,
            NoteName::G => 11,
            NoteName::A => 13,
            NoteName::B => 15,
        }
    }
}

/// Resolve a note, a semitone shift (-1, 0, +1) and an octave to a piano key.
pub fn piano_key(name: NoteName, shift: i32, octave: u8) -> u8 {
    let key = name.base_key() + shift + octave as i32 * 12;
    key.clamp(KEY_MIN as i32, KEY_MAX as i32) as u8
}

/// Frequency in Hz of a piano key. Out-of-range keys are clamped.
pub fn key_frequency(key: u8) -> f32 {
    FREQUENCIES[(key.clamp(KEY_MIN, KEY_MAX) - KEY_MIN) as usize]
}

/// Samples per waveform cycle for a key: `floor(sample_rate / frequency)`,
/// never less than 1 so keys above the sample rate still oscillate.
pub fn period_for_key(key: u8, sample_rate: f32) -> u32 {
    ((sample_rate / key_frequency(key)) as u32).max(1)
}

/// Samples in a whole note at `bpm`.
///
/// The beat count is divided down to quarter-note groups with integer
/// division before the reciprocal is taken, so e.g. 130 and 128 BPM share
/// the same tempo.
pub fn tempo_for_bpm(bpm: u32, sample_rate: f32) -> f32 {
    let quarters = bpm.clamp(BPM_MIN, BPM_MAX) / 4;
    60.0 / quarters as f32 * sample_rate
}

/// Duration in samples of a note of `length` (fraction of a whole note).
pub fn note_ttl(length: f32, tempo: f32) -> u32 {
    (length * tempo) as u32
}
