//! Loading note sequences from the JSON a MIDI parser produces.
//!
//! Expected shape (extra keys are ignored):
//! `{ "header": { "name": .. }, "tracks": [ { "name", "channel", "instrument": { "name", .. },
//! "notes": [ { "midi", "time", "duration", "velocity" } ] } ] }`

use crate::notes::{Note, NoteSequence, TrackInfo};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SongError {
    #[error("could not read song file: {0}")]
    Io(#[from] std::io::Error),
    #[error("song is not valid parser output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSong {
    header: RawHeader,
    tracks: Vec<RawTrack>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHeader {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTrack {
    name: String,
    channel: Option<u8>,
    instrument: Option<RawInstrument>,
    notes: Vec<RawNote>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawInstrument {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawNote {
    midi: i64,
    time: f64,
    duration: f64,
    #[serde(default)]
    velocity: Option<f32>,
}

impl RawNote {
    fn problem(&self) -> Option<&'static str> {
        if !(0..=127).contains(&self.midi) {
            Some("pitch outside 0..=127")
        } else if !self.time.is_finite() {
            Some("non-finite start time")
        } else if !self.duration.is_finite() || self.duration < 0.0 {
            Some("negative or non-finite duration")
        } else {
            None
        }
    }
}

/// A parsed song ready for the renderer.
#[derive(Clone, Debug, Default)]
pub struct Song {
    pub name: String,
    pub notes: NoteSequence,
}

impl Song {
    pub fn duration(&self) -> f64 {
        self.notes.end_time()
    }
}

/// Flattens parser output into a sorted [`NoteSequence`].
///
/// Track indices follow the order of `tracks`. Ids are assigned after sorting, so they
/// increase with start time. Malformed notes are dropped with a warning.
pub fn parse_song(input: &str) -> Result<Song, SongError> {
    let raw: RawSong = serde_json::from_str(input)?;

    let mut notes = Vec::new();
    let mut tracks = Vec::with_capacity(raw.tracks.len());
    let mut skipped = 0usize;

    for (track_idx, track) in raw.tracks.into_iter().enumerate() {
        for n in &track.notes {
            if let Some(problem) = n.problem() {
                log::warn!(
                    "Skipping note on track {track_idx} at {:.3}s: {problem}",
                    n.time
                );
                skipped += 1;
                continue;
            }
            let mut note = Note::new(0, n.midi as i32, track_idx, n.time, n.duration);
            note.velocity = n.velocity;
            notes.push(note);
        }
        tracks.push(TrackInfo {
            name: track.name,
            channel: track.channel,
            instrument: track.instrument.map(|i| i.name),
        });
    }

    let mut sequence = NoteSequence::new(notes);
    sequence.renumber();
    let sequence = sequence.with_tracks(tracks);

    log::info!(
        "Loaded song {:?}: {} notes on {} tracks ({} skipped)",
        raw.header.name,
        sequence.len(),
        sequence.tracks().len(),
        skipped
    );

    Ok(Song {
        name: raw.header.name,
        notes: sequence,
    })
}

pub fn load_song(path: &Path) -> Result<Song, SongError> {
    let text = std::fs::read_to_string(path)?;
    parse_song(&text)
}

/// A short two-track phrase shown when no song is given.
pub fn demo_song() -> Song {
    // (pitch, start, duration)
    const MELODY: [(i32, f64, f64); 12] = [
        (64, 0.0, 0.5),
        (62, 0.5, 0.5),
        (60, 1.0, 0.5),
        (62, 1.5, 0.5),
        (64, 2.0, 0.5),
        (64, 2.5, 0.5),
        (64, 3.0, 1.0),
        (62, 4.0, 0.5),
        (62, 4.5, 0.5),
        (62, 5.0, 1.0),
        (64, 6.0, 0.5),
        (67, 6.5, 1.5),
    ];
    const BASS: [(i32, f64, f64); 4] = [
        (48, 0.0, 2.0),
        (43, 2.0, 2.0),
        (47, 4.0, 2.0),
        (48, 6.0, 2.0),
    ];

    let melody = MELODY.iter().map(|&(p, t, d)| Note::new(0, p, 0, t, d));
    let bass = BASS.iter().map(|&(p, t, d)| Note::new(0, p, 1, t, d));

    let mut notes = NoteSequence::new(melody.chain(bass).collect());
    notes.renumber();

    Song {
        name: "Demo".to_owned(),
        notes: notes.with_tracks(vec![
            TrackInfo {
                name: "Melody".to_owned(),
                ..TrackInfo::default()
            },
            TrackInfo {
                name: "Bass".to_owned(),
                ..TrackInfo::default()
            },
        ]),
    }
}
