//! pulsebox CLI: play MML on the default device or render it to WAV.
//!
//! Usage:
//!   pb-cli play --voice1 "t120l8 cdefgab>c" --voice2 "o2 c1"
//!   pb-cli play --file song.mml --seconds 30
//!   pb-cli render --voice1 "cde:" --out song.wav --seconds 10
//!
//! A song file holds the MML for voice 1 on its first non-empty line and
//! voice 2 on its second. Set `RUST_LOG=debug` for control-path logging.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pb_master::{Controller, VOICE_COUNT};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use std::{fs, thread};

#[derive(Parser)]
#[command(name = "pb-cli", version, about = "Two-voice square-wave MML synthesizer")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Play songs on the default audio device
    Play {
        #[command(flatten)]
        songs: SongArgs,
        /// Stop after this many seconds even if a song loops
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Render songs to a 16-bit mono WAV file
    Render {
        #[command(flatten)]
        songs: SongArgs,
        /// Output WAV path
        #[arg(long)]
        out: PathBuf,
        /// Maximum length; songs that end earlier produce shorter files
        #[arg(long, default_value_t = 60)]
        seconds: u32,
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,
    },
}

#[derive(Args)]
struct SongArgs {
    /// MML for voice 1
    #[arg(long)]
    voice1: Option<String>,
    /// MML for voice 2
    #[arg(long)]
    voice2: Option<String>,
    /// Read voice MML from a file, one voice per line
    #[arg(long, conflicts_with_all = ["voice1", "voice2"])]
    file: Option<PathBuf>,
    /// Master gain, clamped to 0..=1
    #[arg(long, default_value_t = 1.0)]
    gain: f32,
}

impl SongArgs {
    /// Songs indexed by voice (element 0 is voice 1).
    fn songs(&self) -> Result<Vec<Option<String>>> {
        let songs = match &self.file {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let lines: Vec<Option<String>> = text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| Some(line.to_string()))
                    .collect();
                if lines.len() > VOICE_COUNT {
                    bail!("{} has {} songs, at most {} voices exist", path.display(), lines.len(), VOICE_COUNT);
                }
                lines
            }
            None => vec![self.voice1.clone(), self.voice2.clone()],
        };

        if songs.iter().all(Option::is_none) {
            bail!("nothing to play: pass --voice1, --voice2 or --file");
        }
        Ok(songs)
    }

    fn apply(&self, ctrl: &Controller) -> Result<()> {
        ctrl.set_gain(self.gain);
        for (i, song) in self.songs()?.iter().enumerate() {
            if let Some(mml) = song {
                ctrl.set_voice_song(i + 1, mml)
                    .with_context(|| format!("voice {}", i + 1))?;
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Play { songs, seconds } => play_audio(&songs, seconds),
        Cmd::Render { songs, out, seconds, sample_rate } => {
            render_to_wav(&songs, &out, seconds, sample_rate)
        }
    }
}

fn play_audio(songs: &SongArgs, seconds: Option<u64>) -> Result<()> {
    let ctrl = Controller::with_default_device().context("failed to open audio output")?;
    songs.apply(&ctrl)?;
    println!("Playing at {} Hz...", ctrl.sample_rate());

    let started = Instant::now();
    let limit = seconds.map(Duration::from_secs);
    while !ctrl.is_idle() {
        let elapsed = started.elapsed();
        if limit.is_some_and(|limit| elapsed >= limit) {
            ctrl.stop_all();
            break;
        }
        print!("\r{:>6.1}s", elapsed.as_secs_f32());
        let _ = std::io::stdout().flush();
        thread::sleep(Duration::from_millis(50));
    }

    // Let the device drain its last buffer.
    thread::sleep(Duration::from_millis(200));
    println!("\rDone.          ");
    Ok(())
}

fn render_to_wav(songs: &SongArgs, path: &Path, seconds: u32, sample_rate: u32) -> Result<()> {
    let ctrl = Controller::new(sample_rate as f32);
    songs.apply(&ctrl)?;
    println!("Rendering to {} at {} Hz...", path.display(), sample_rate);

    let wav = ctrl.render_to_wav(seconds);
    fs::write(path, &wav).with_context(|| format!("failed to write {}", path.display()))?;

    println!("Wrote {} bytes", wav.len());
    Ok(())
}
