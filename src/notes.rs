use std::ops::Range;

/// A single note as handed over by the MIDI parser. Times are in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: u32,
    pub pitch: i32, // 0..=127, 60 is middle C
    pub track: usize,
    pub start_time: f64,
    pub duration: f64,
    pub velocity: Option<f32>,
}

impl Note {
    pub fn new(id: u32, pitch: i32, track: usize, start_time: f64, duration: f64) -> Self {
        Self {
            id,
            pitch,
            track,
            start_time,
            duration,
            velocity: None,
        }
    }

    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Per-track metadata carried along from the parser. The renderer never reads it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackInfo {
    pub name: String,
    pub channel: Option<u8>,
    pub instrument: Option<String>,
}

/// Notes ordered by ascending `start_time`.
///
/// The ordering is established on construction and never broken afterwards, which is
/// what lets [`NoteSequence::visible_range`] stop at the first note past the window.
#[derive(Clone, Debug, Default)]
pub struct NoteSequence {
    notes: Vec<Note>,
    tracks: Vec<TrackInfo>,
    max_duration: f64,
}

impl NoteSequence {
    /// Builds a sequence, stably sorting the notes by start time.
    pub fn new(mut notes: Vec<Note>) -> Self {
        notes.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        let max_duration = notes.iter().map(|n| n.duration).fold(0.0, f64::max);
        Self {
            notes,
            tracks: Vec::new(),
            max_duration,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_tracks(mut self, tracks: Vec<TrackInfo>) -> Self {
        self.tracks = tracks;
        self
    }

    /// Reassigns ids as sequence positions.
    pub fn renumber(&mut self) {
        for (i, note) in self.notes.iter_mut().enumerate() {
            note.id = i as u32;
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn tracks(&self) -> &[TrackInfo] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Lowest and highest pitch present, or `None` for an empty sequence.
    pub fn pitch_bounds(&self) -> Option<(i32, i32)> {
        let mut pitches = self.notes.iter().map(|n| n.pitch);
        let first = pitches.next()?;
        Some(pitches.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Time at which the last note stops sounding.
    pub fn end_time(&self) -> f64 {
        self.notes.iter().map(Note::end_time).fold(0.0, f64::max)
    }

    /// Index range of the notes that overlap `[time - window, time + window]` once
    /// shifted by `offset`.
    ///
    /// The range starts at the first note (in sequence order) whose shifted end reaches
    /// the window start and stops before the first note whose shifted start is past the
    /// window end. Notes inside the range may still end before the window start when a
    /// longer earlier note keeps the range open; the renderer skips those.
    pub fn visible_range(&self, time: f64, window: f64, offset: f64) -> Range<usize> {
        let visible_start = time - window;
        let visible_end = time + window;

        // Nothing before `lo` can reach the window: even the longest note would end too early.
        let lo = self
            .notes
            .partition_point(|n| n.start_time + offset + self.max_duration < visible_start);

        let Some(first) = self.notes[lo..]
            .iter()
            .position(|n| n.start_time + offset + n.duration >= visible_start)
        else {
            return self.notes.len()..self.notes.len();
        };
        let first = lo + first;

        let len = self.notes[first..].partition_point(|n| n.start_time + offset <= visible_end);
        first..first + len
    }

    pub fn visible(&self, time: f64, window: f64, offset: f64) -> &[Note] {
        &self.notes[self.visible_range(time, window, offset)]
    }
}

impl From<Vec<Note>> for NoteSequence {
    fn from(notes: Vec<Note>) -> Self {
        Self::new(notes)
    }
}

const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch name without the octave, e.g. "C" or "F#".
pub fn pitch_name(pitch: i32) -> &'static str {
    PITCH_NAMES[pitch.rem_euclid(12) as usize]
}
