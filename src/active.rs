use crate::notes::Note;
use std::collections::{HashMap, HashSet};

/// Whether `note` sounds at `time` once shifted by `offset`. Both ends are inclusive.
pub fn is_note_active_at(note: &Note, time: f64, offset: f64) -> bool {
    let start = note.start_time + offset;
    let end = note.start_time + note.duration + offset;
    start <= time && time <= end
}

/// Notes and keys sounding at one instant.
///
/// Always rebuilt from scratch: playback can seek anywhere, so patching the previous
/// state would leave stale keys lit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveState {
    active_note_ids: HashSet<u32>,
    active_pitch_to_track: HashMap<i32, usize>,
}

impl ActiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute(time: f64, notes: &[Note], offset: f64) -> Self {
        let mut state = Self::new();
        state.update(time, notes, offset);
        state
    }

    /// Clears the state and rescans every note. When several active notes share a
    /// pitch, the one latest in `notes` decides the key's track.
    pub fn update(&mut self, time: f64, notes: &[Note], offset: f64) {
        self.clear();
        for note in notes.iter().filter(|n| is_note_active_at(n, time, offset)) {
            self.active_note_ids.insert(note.id);
            self.active_pitch_to_track.insert(note.pitch, note.track);
        }
    }

    pub fn clear(&mut self) {
        self.active_note_ids.clear();
        self.active_pitch_to_track.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.active_note_ids.is_empty()
    }

    pub fn active_note_ids(&self) -> &HashSet<u32> {
        &self.active_note_ids
    }

    pub fn active_pitch_to_track(&self) -> &HashMap<i32, usize> {
        &self.active_pitch_to_track
    }

    pub fn is_note_active(&self, id: u32) -> bool {
        self.active_note_ids.contains(&id)
    }

    pub fn track_for_pitch(&self, pitch: i32) -> Option<usize> {
        self.active_pitch_to_track.get(&pitch).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: u32, pitch: i32, track: usize, start: f64, dur: f64) -> Note {
        Note::new(id, pitch, track, start, dur)
    }

    #[test]
    fn single_note_active_then_released() {
        let notes = [note(1, 60, 0, 0.0, 1.0)];
        let state = ActiveState::compute(0.5, &notes, 0.0);
        assert_eq!(state.active_note_ids(), &HashSet::from([1]));
        assert_eq!(state.track_for_pitch(60), Some(0));

        let later = ActiveState::compute(5.0, &notes, 0.0);
        assert!(later.is_empty());
        assert_eq!(later.track_for_pitch(60), None);
    }

    #[test]
    fn window_is_inclusive_at_both_ends() {
        let n = note(7, 64, 2, 1.0, 0.5);
        assert!(is_note_active_at(&n, 1.0, 0.0));
        assert!(is_note_active_at(&n, 1.5, 0.0));
        assert!(!is_note_active_at(&n, 0.999, 0.0));
        assert!(!is_note_active_at(&n, 1.501, 0.0));
        // Shifted by the audio/visual offset.
        assert!(is_note_active_at(&n, 0.95, -0.1));
        assert!(!is_note_active_at(&n, 1.45, -0.1 - 0.01));
    }

    #[test]
    fn zero_length_note_is_active_at_its_instant() {
        let n = note(3, 50, 0, 2.0, 0.0);
        assert!(is_note_active_at(&n, 2.0, 0.0));
        assert!(!is_note_active_at(&n, 2.0001, 0.0));
    }

    #[test]
    fn repeated_updates_are_idempotent() {
        let notes = [
            note(1, 60, 0, 0.0, 2.0),
            note(2, 64, 1, 0.5, 2.0),
            note(3, 67, 1, 3.0, 1.0),
        ];
        let mut a = ActiveState::new();
        a.update(1.0, &notes, 0.0);
        let first = a.clone();
        a.update(1.0, &notes, 0.0);
        assert_eq!(a, first);
        assert_eq!(a.active_note_ids().len(), 2);
    }

    #[test]
    fn seek_replaces_rather_than_merges() {
        let notes = [note(1, 60, 0, 0.0, 1.0), note(2, 72, 3, 10.0, 1.0)];
        let mut state = ActiveState::new();
        state.update(0.5, &notes, 0.0);
        state.update(10.5, &notes, 0.0);
        assert!(!state.is_note_active(1));
        assert!(state.is_note_active(2));
        assert_eq!(state.track_for_pitch(60), None);
        assert_eq!(state.track_for_pitch(72), Some(3));

        state.update(5.0, &notes, 0.0);
        assert!(state.is_empty());
        assert!(state.active_pitch_to_track().is_empty());
    }

    #[test]
    fn later_note_owns_shared_pitch() {
        let notes = [note(1, 60, 0, 0.0, 4.0), note(2, 60, 5, 1.0, 1.0)];
        let state = ActiveState::compute(1.5, &notes, 0.0);
        assert_eq!(state.active_note_ids().len(), 2);
        assert_eq!(state.track_for_pitch(60), Some(5));
    }
}
