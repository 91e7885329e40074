//! # Piano Roll
//!
//! Desktop viewer for a parsed MIDI song: note blocks fall towards a keyboard in time
//! with a wall clock.
//!
//! Usage: `piano-roll [song.json]`, where `song.json` is MIDI parser output. Without an
//! argument a short demo plays.
//!
//! Keys: Space play/pause, Left/Right seek, Home restart, `L` labels, `O` octave lines,
//! `+`/`-` visible window, `[`/`]` audio/visual offset, `F` fullscreen.

use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let song = std::env::args_os().nth(1).map(PathBuf::from);
    piano_roll::desktop_frontend::run(song)
}
