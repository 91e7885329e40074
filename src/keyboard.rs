//! Keyboard geometry in layout units, where one white key is one unit wide.
//!
//! Every function here is total over `i32`: the octave is a floored division and the
//! semitone a euclidean remainder, so pitches outside 0..=127 still land somewhere sane.

pub const WHITE_KEYS_PER_OCTAVE: i32 = 7;
pub const BLACK_KEY_WIDTH_RATIO: f64 = 0.6;

/// Bounds of a standard 88-key piano (A0..=C8).
pub const STANDARD_MIN_PITCH: i32 = 21;
pub const STANDARD_MAX_PITCH: i32 = 108;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeySlot {
    /// Left edge within the octave, in white-key units.
    pub offset: f64,
    pub is_black: bool,
}

const fn white(offset: f64) -> KeySlot {
    KeySlot {
        offset,
        is_black: false,
    }
}

const fn black(offset: f64) -> KeySlot {
    KeySlot {
        offset,
        is_black: true,
    }
}

/// Position of each semitone of an octave on the 7-white-key layout.
pub const OCTAVE_LAYOUT: [KeySlot; 12] = [
    white(0.0),
    black(0.65),
    white(1.0),
    black(1.65),
    white(2.0),
    white(3.0),
    black(3.65),
    white(4.0),
    black(4.65),
    white(5.0),
    black(5.65),
    white(6.0),
];

pub fn semitone_index(pitch: i32) -> usize {
    pitch.rem_euclid(12) as usize
}

pub fn octave(pitch: i32) -> i32 {
    pitch.div_euclid(12)
}

pub fn key_slot(pitch: i32) -> KeySlot {
    OCTAVE_LAYOUT[semitone_index(pitch)]
}

pub fn is_black_key(pitch: i32) -> bool {
    key_slot(pitch).is_black
}

/// Left edge of `pitch` in layout units, counted from pitch 0.
pub fn layout_offset(pitch: i32) -> f64 {
    (octave(pitch) * WHITE_KEYS_PER_OCTAVE) as f64 + key_slot(pitch).offset
}

pub fn key_width_units(pitch: i32) -> f64 {
    if is_black_key(pitch) {
        BLACK_KEY_WIDTH_RATIO
    } else {
        1.0
    }
}

/// Left edge of `pitch` in pixels.
pub fn key_x(pitch: i32, left_offset: f64, scale: f64) -> f64 {
    (layout_offset(pitch) - left_offset) * scale
}

pub fn key_width(pitch: i32, scale: f64) -> f64 {
    key_width_units(pitch) * scale
}

/// Number of semitones needed to span `white_keys` extra white keys.
pub fn white_keys_to_semitones(white_keys: u32) -> i32 {
    (white_keys as f64 * 12.0 / WHITE_KEYS_PER_OCTAVE as f64).ceil() as i32
}
