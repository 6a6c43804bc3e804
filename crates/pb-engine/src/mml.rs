//! MML interpreter.
//!
//! Walks a voice's song one command byte at a time, applying octave, tempo,
//! length and duty changes until a note or rest is produced. Unknown bytes are
//! skipped and out-of-range numbers are clamped, never rejected.

use crate::frequency::{note_ttl, piano_key, tempo_for_bpm, NoteName, DEFAULT_BPM};
use crate::voice::DutyCycle;

/// Highest selectable octave.
pub const MAX_OCTAVE: u8 = 6;

/// Octave installed by `play`.
pub const DEFAULT_OCTAVE: u8 = 3;

/// Note length installed by `play` (a quarter note).
pub const DEFAULT_NOTE_LENGTH: f32 = 0.25;

/// Range accepted by the `l` command's divisor.
const LENGTH_DIVISOR_MIN: u32 = 1;
const LENGTH_DIVISOR_MAX: u32 = 64;

/// Length multiplier applied per trailing dot.
const DOT_FACTOR: f32 = 1.5;

/// A single command byte, decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// `:` restart from the beginning of the song
    Loop,
    /// `<`
    OctaveDown,
    /// `>`
    OctaveUp,
    /// `o` + number
    Octave,
    /// `l` + number
    Length,
    /// `t` + number
    Tempo,
    /// `m` + digit
    Duty,
    /// `p` or `r`
    Rest,
    /// `c d e f g a b`
    Note(NoteName),
}

impl Command {
    /// Decode a command byte, case-insensitive. Returns `None` for bytes that
    /// carry no meaning on their own.
    pub fn decode(byte: u8) -> Option<Self> {
        match byte.to_ascii_lowercase() {
            b':' => Some(Command::Loop),
            b'<' => Some(Command::OctaveDown),
            b'>' => Some(Command::OctaveUp),
            b'o' => Some(Command::Octave),
            b'l' => Some(Command::Length),
            b't' => Some(Command::Tempo),
            b'm' => Some(Command::Duty),
            b'p' | b'r' => Some(Command::Rest),
            letter => NoteName::from_letter(letter).map(Command::Note),
        }
    }
}

/// Musical parameters that persist across events on a voice.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Settings {
    /// Current octave, 0..=6
    pub octave: u8,
    /// Samples per whole note, fixed when a tempo command is parsed
    pub tempo: f32,
    /// Default note length as a fraction of a whole note
    pub note_length: f32,
    /// Pulse duty cycle for subsequent notes
    pub duty: DutyCycle,
}

impl Settings {
    /// The parameters `play` installs: octave 3, 120 BPM, quarter notes, 50% duty.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            octave: DEFAULT_OCTAVE,
            tempo: tempo_for_bpm(DEFAULT_BPM, sample_rate),
            note_length: DEFAULT_NOTE_LENGTH,
            duty: DutyCycle::Half,
        }
    }
}

/// An audible or silent event with a duration in samples. Durations are never 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Note { key: u8, ttl: u32 },
    Rest { ttl: u32 },
}

impl Event {
    pub fn ttl(&self) -> u32 {
        match self {
            Event::Note { ttl, .. } | Event::Rest { ttl } => *ttl,
        }
    }
}

/// Cursor over a song plus the settings being mutated while reading it.
pub struct Interpreter<'a> {
    song: &'a [u8],
    pos: usize,
    settings: Settings,
    sample_rate: f32,
}

impl<'a> Interpreter<'a> {
    pub fn new(song: &'a [u8], cursor: usize, settings: Settings, sample_rate: f32) -> Self {
        Self {
            song,
            pos: cursor.min(song.len()),
            settings,
            sample_rate,
        }
    }

    /// Offset of the next unread byte.
    pub fn cursor(&self) -> usize {
        self.pos
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Read commands until a note or rest is produced.
    ///
    /// Returns `None` at the end of the song. A song whose loop section holds
    /// no playable event also ends: hitting the loop marker a second time in
    /// one call parks the cursor at the end. At most two passes over the song
    /// are made per call.
    pub fn next_event(&mut self) -> Option<Event> {
        let mut wrapped = false;
        while let Some(byte) = self.next_byte() {
            let Some(command) = Command::decode(byte) else {
                continue;
            };
            if command == Command::Loop {
                if wrapped {
                    self.pos = self.song.len();
                    return None;
                }
                wrapped = true;
            }
            if let Some(event) = self.execute(command) {
                return Some(event);
            }
        }
        None
    }

    /// Apply one decoded command, reading its arguments from the song.
    ///
    /// Notes and rests that resolve to zero samples produce no event.
    pub fn execute(&mut self, command: Command) -> Option<Event> {
        match command {
            Command::Loop => self.pos = 0,
            Command::OctaveDown => self.settings.octave = self.settings.octave.saturating_sub(1),
            Command::OctaveUp => self.settings.octave = (self.settings.octave + 1).min(MAX_OCTAVE),
            Command::Octave => {
                self.settings.octave = self.read_number().min(MAX_OCTAVE as u32) as u8;
            }
            Command::Length => {
                let divisor = self.read_number().clamp(LENGTH_DIVISOR_MIN, LENGTH_DIVISOR_MAX);
                self.settings.note_length = 1.0 / divisor as f32;
            }
            Command::Tempo => {
                self.settings.tempo = tempo_for_bpm(self.read_number(), self.sample_rate);
            }
            Command::Duty => self.read_duty(),
            Command::Rest => return self.read_event(None),
            Command::Note(name) => return self.read_event(Some(name)),
        }
        None
    }

    fn peek(&self) -> Option<u8> {
        self.song.get(self.pos).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Greedy run of decimal digits; 0 when there are none.
    fn read_number(&mut self) -> u32 {
        let mut value: u32 = 0;
        while let Some(digit @ b'0'..=b'9') = self.peek() {
            value = value.saturating_mul(10).saturating_add((digit - b'0') as u32);
            self.pos += 1;
        }
        value
    }

    fn read_duty(&mut self) {
        if let Some(digit @ b'0'..=b'9') = self.peek() {
            self.pos += 1;
            if let Some(duty) = DutyCycle::from_digit(digit) {
                self.settings.duty = duty;
            }
        }
    }

    /// `+`/`#` sharpen, `-` flattens.
    fn read_accidental(&mut self) -> i32 {
        let shift = match self.peek() {
            Some(b'+' | b'#') => 1,
            Some(b'-') => -1,
            _ => return 0,
        };
        self.pos += 1;
        shift
    }

    fn read_event(&mut self, name: Option<NoteName>) -> Option<Event> {
        let key = name.map(|name| {
            let shift = self.read_accidental();
            piano_key(name, shift, self.settings.octave)
        });

        let divisor = self.read_number();
        let mut length = if divisor > 0 {
            1.0 / divisor as f32
        } else {
            self.settings.note_length
        };
        while self.peek() == Some(b'.') {
            length *= DOT_FACTOR;
            self.pos += 1;
        }

        let ttl = note_ttl(length, self.settings.tempo);
        if ttl == 0 {
            return None;
        }
        Some(match key {
            Some(key) => Event::Note { key, ttl },
            None => Event::Rest { ttl },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;
    const QUARTER: u32 = 22050;

    fn interpreter(song: &str) -> Interpreter<'_> {
        Interpreter::new(song.as_bytes(), 0, Settings::new(SAMPLE_RATE), SAMPLE_RATE)
    }

    fn events(song: &str, limit: usize) -> Vec<Event> {
        let mut interp = interpreter(song);
        let mut out = Vec::new();
        while out.len() < limit {
            match interp.next_event() {
                Some(event) => out.push(event),
                None => break,
            }
        }
        out
    }

    fn settings_after(song: &str) -> Settings {
        let mut interp = interpreter(song);
        while interp.next_event().is_some() {}
        interp.settings()
    }

    #[test]
    fn decode_is_case_insensitive() {
        assert_eq!(Command::decode(b'o'), Some(Command::Octave));
        assert_eq!(Command::decode(b'O'), Some(Command::Octave));
        assert_eq!(Command::decode(b'P'), Some(Command::Rest));
        assert_eq!(Command::decode(b'r'), Some(Command::Rest));
        assert_eq!(Command::decode(b'G'), Some(Command::Note(NoteName::G)));
    }

    #[test]
    fn decode_ignores_unknown_bytes() {
        for byte in [b' ', b'x', b'5', b'#', b'.', 0xff] {
            assert_eq!(Command::decode(byte), None);
        }
    }

    #[test]
    fn octave_command_clamps() {
        assert_eq!(settings_after("o5").octave, 5);
        assert_eq!(settings_after("o9").octave, 6);
        assert_eq!(settings_after("o").octave, 0);
    }

    #[test]
    fn octave_shifts_clamp() {
        assert_eq!(settings_after(">").octave, 4);
        assert_eq!(settings_after(">>>>>>").octave, 6);
        assert_eq!(settings_after("<<<<<").octave, 0);
        assert_eq!(settings_after("o0<").octave, 0);
    }

    #[test]
    fn length_command_clamps_divisor() {
        assert_eq!(settings_after("l8").note_length, 0.125);
        assert_eq!(settings_after("l0").note_length, 1.0);
        assert_eq!(settings_after("l100").note_length, 1.0 / 64.0);
    }

    #[test]
    fn tempo_command_clamps() {
        assert_eq!(settings_after("t128").tempo, 82687.5);
        assert_eq!(settings_after("t").tempo, tempo_for_bpm(32, SAMPLE_RATE));
        assert_eq!(settings_after("T999").tempo, tempo_for_bpm(200, SAMPLE_RATE));
    }

    #[test]
    fn duty_command_selects_known_digits() {
        assert_eq!(settings_after("m2").duty, DutyCycle::Quarter);
        assert_eq!(settings_after("M1").duty, DutyCycle::Eighth);
        assert_eq!(settings_after("m1m5").duty, DutyCycle::Half);
        assert_eq!(settings_after("m2m3").duty, DutyCycle::Quarter);
    }

    #[test]
    fn duty_command_without_digit_leaves_next_command() {
        let mut interp = interpreter("mc");
        assert_eq!(interp.next_event(), Some(Event::Note { key: 40, ttl: QUARTER }));
        assert_eq!(interp.settings().duty, DutyCycle::Half);
    }

    #[test]
    fn notes_use_default_length() {
        assert_eq!(
            events("cdefgab", 10),
            vec![
                Event::Note { key: 40, ttl: QUARTER },
                Event::Note { key: 42, ttl: QUARTER },
                Event::Note { key: 44, ttl: QUARTER },
                Event::Note { key: 45, ttl: QUARTER },
                Event::Note { key: 47, ttl: QUARTER },
                Event::Note { key: 49, ttl: QUARTER },
                Event::Note { key: 51, ttl: QUARTER },
            ]
        );
    }

    #[test]
    fn explicit_length_overrides_default_once() {
        assert_eq!(
            events("c8c", 10),
            vec![Event::Note { key: 40, ttl: 11025 }, Event::Note { key: 40, ttl: QUARTER }]
        );
    }

    #[test]
    fn dots_extend_length() {
        assert_eq!(events("c4.", 1), vec![Event::Note { key: 40, ttl: 33075 }]);
        assert_eq!(events("c..", 1), vec![Event::Note { key: 40, ttl: 49612 }]);
        assert_eq!(events("r2.", 1), vec![Event::Rest { ttl: 66150 }]);
    }

    #[test]
    fn accidentals_follow_the_letter() {
        assert_eq!(
            events("c#c+c-", 10).iter().map(|e| match e {
                Event::Note { key, .. } => *key,
                Event::Rest { .. } => 0,
            }).collect::<Vec<_>>(),
            vec![41, 41, 39]
        );
    }

    #[test]
    fn rests_take_length_but_no_accidental() {
        let mut interp = interpreter("p2+");
        assert_eq!(interp.next_event(), Some(Event::Rest { ttl: 44100 }));
        assert_eq!(interp.cursor(), 2);
    }

    #[test]
    fn tempo_applies_to_later_notes_only() {
        assert_eq!(
            events("c t60 c", 10),
            vec![
                Event::Note { key: 40, ttl: QUARTER },
                Event::Note { key: 40, ttl: 44100 },
            ]
        );
    }

    #[test]
    fn octave_applies_to_note_letters() {
        assert_eq!(events("o4a", 1), vec![Event::Note { key: 61, ttl: QUARTER }]);
        assert_eq!(events("<a", 1), vec![Event::Note { key: 37, ttl: QUARTER }]);
    }

    #[test]
    fn unknown_bytes_are_skipped() {
        assert_eq!(events("  x?! c ", 10), vec![Event::Note { key: 40, ttl: QUARTER }]);
    }

    #[test]
    fn end_of_song_yields_nothing() {
        let mut interp = interpreter("c");
        assert!(interp.next_event().is_some());
        assert_eq!(interp.next_event(), None);
        assert_eq!(interp.cursor(), 1);
    }

    #[test]
    fn loop_marker_restarts_song() {
        let notes = events("cde:", 9);
        assert_eq!(notes.len(), 9);
        let keys: Vec<u8> = notes
            .iter()
            .map(|e| match e {
                Event::Note { key, .. } => *key,
                Event::Rest { .. } => 0,
            })
            .collect();
        assert_eq!(keys, vec![40, 42, 44, 40, 42, 44, 40, 42, 44]);
    }

    #[test]
    fn loop_keeps_settings_from_previous_pass() {
        let keys: Vec<Event> = events(">c:", 3);
        assert_eq!(
            keys,
            vec![
                Event::Note { key: 52, ttl: QUARTER },
                Event::Note { key: 64, ttl: QUARTER },
                Event::Note { key: 76, ttl: QUARTER },
            ]
        );
    }

    #[test]
    fn loop_without_events_ends() {
        for song in [":", "o4:", "c99999:", "::"] {
            let mut interp = interpreter(song);
            assert_eq!(interp.next_event(), None, "song {:?}", song);
            assert_eq!(interp.cursor(), song.len());
        }
    }

    #[test]
    fn zero_length_notes_are_skipped() {
        assert_eq!(events("c99999d", 10), vec![Event::Note { key: 42, ttl: QUARTER }]);
        assert_eq!(events("c99999999999999999999", 10), vec![]);
    }

    #[test]
    fn resumes_from_cursor() {
        let song = b"cde";
        let mut interp = Interpreter::new(song, 2, Settings::new(SAMPLE_RATE), SAMPLE_RATE);
        assert_eq!(interp.next_event(), Some(Event::Note { key: 44, ttl: QUARTER }));
    }
}
