//! Canvas sizing and the pitch-range -> pixel mapping derived from it.

use crate::keyboard::{self, STANDARD_MAX_PITCH, STANDARD_MIN_PITCH};
use crate::notes::NoteSequence;

/// Tunable layout constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    /// Narrowest rendered range, in octaves.
    pub min_octave_span: u32,
    /// Extra white keys of headroom added past the data.
    pub extra_white_keys: u32,
    /// Share of the canvas height taken by the keyboard.
    pub piano_height_ratio: f64,
    /// Black key height relative to the keyboard height.
    pub black_key_height_ratio: f64,
    /// Canvas height relative to the window when not fullscreen.
    pub windowed_height_ratio: f64,
    /// Note blocks shorter than this (in CSS pixels) get no label.
    pub min_note_label_height: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            min_octave_span: 6,
            extra_white_keys: 3,
            piano_height_ratio: 0.15,
            black_key_height_ratio: 0.6,
            windowed_height_ratio: 0.7,
            min_note_label_height: 15.0,
        }
    }
}

/// Inclusive pitch range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PitchRange {
    pub min: i32,
    pub max: i32,
}

impl PitchRange {
    pub fn semitones(&self) -> i32 {
        self.max - self.min + 1
    }

    pub fn contains(&self, pitch: i32) -> bool {
        (self.min..=self.max).contains(&pitch)
    }
}

/// Observed pitches are clamped to these bounds before a range is picked.
pub const OBSERVED_PITCH_MIN: i32 = -128;
pub const OBSERVED_PITCH_MAX: i32 = 255;

/// How the rendered pitch range is chosen from the data.
///
/// An engine picks one policy when it is built and keeps it; the two produce
/// different pictures for the same song.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RangePolicy {
    /// At least `min_octave_span` octaves centered on the data, snapped to octave
    /// boundaries, re-anchored to contain the data, padded on the right.
    #[default]
    Centered,
    /// The 88-key range merged with the data range, padded on both ends.
    StandardKeyboard,
}

impl RangePolicy {
    pub fn pitch_range(
        self,
        actual_min: i32,
        actual_max: i32,
        params: &LayoutParams,
    ) -> PitchRange {
        let padding = keyboard::white_keys_to_semitones(params.extra_white_keys);
        // Keeps the arithmetic below in range for any `i32` pitch.
        let actual_min = actual_min.clamp(OBSERVED_PITCH_MIN, OBSERVED_PITCH_MAX);
        let actual_max = actual_max.clamp(OBSERVED_PITCH_MIN, OBSERVED_PITCH_MAX);

        match self {
            RangePolicy::Centered => {
                let center = (actual_min + actual_max) as f64 / 2.0;
                let actual_octaves = ((actual_max - actual_min + 1) as f64 / 12.0).ceil() as i32;
                let octaves = actual_octaves.max(params.min_octave_span as i32);
                let semitones = octaves * 12;

                let mut min = ((center - semitones as f64 / 2.0) / 12.0).floor() as i32 * 12;
                let mut max = min + semitones - 1;
                if min > actual_min {
                    min = actual_min.div_euclid(12) * 12;
                    max = min + semitones - 1;
                }
                if max < actual_max {
                    max = ((actual_max + 1) as f64 / 12.0).ceil() as i32 * 12 - 1;
                    // Shifting up may uncover the low end again; grow instead.
                    min = (max - semitones + 1).min(actual_min.div_euclid(12) * 12);
                }

                PitchRange {
                    min,
                    max: max + padding,
                }
            }
            RangePolicy::StandardKeyboard => PitchRange {
                min: actual_min.min(STANDARD_MIN_PITCH) - padding,
                max: actual_max.max(STANDARD_MAX_PITCH) + padding,
            },
        }
    }
}

/// Host-side measurements the canvas size is derived from, all in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostLayout {
    pub container_width: f64,
    pub container_height: f64,
    pub window_height: f64,
    pub fullscreen: bool,
    /// Height of a control bar sharing the container in fullscreen.
    pub controls_height: Option<f64>,
    pub device_pixel_ratio: f64,
}

/// Canvas size in CSS pixels plus the physical buffer backing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasMetrics {
    pub css_width: f64,
    pub css_height: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub device_pixel_ratio: f64,
}

impl CanvasMetrics {
    pub fn from_host(host: &HostLayout, params: &LayoutParams) -> Self {
        let css_width = host.container_width.max(0.0);
        let mut css_height = if host.fullscreen {
            host.container_height - host.controls_height.unwrap_or(0.0)
        } else {
            host.window_height * params.windowed_height_ratio
        };
        if css_height < 0.0 {
            css_height = host.container_height.max(0.0);
        }

        let dpr = if host.device_pixel_ratio > 0.0 {
            host.device_pixel_ratio
        } else {
            1.0
        };

        Self {
            css_width,
            css_height,
            pixel_width: (css_width * dpr).round() as u32,
            pixel_height: (css_height * dpr).round() as u32,
            device_pixel_ratio: dpr,
        }
    }
}

/// Mapping from layout units to CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Pixels per layout unit.
    pub scale: f64,
    /// Layout offset of the leftmost rendered pitch.
    pub left_offset: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Rendered pitch range; `None` when there was nothing to lay out.
    pub range: Option<PitchRange>,
}

impl Viewport {
    /// Identity mapping used when there are no notes to fit.
    pub fn unscaled(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            scale: 1.0,
            left_offset: 0.0,
            canvas_width,
            canvas_height,
            range: None,
        }
    }

    pub fn compute(
        notes: &NoteSequence,
        canvas_width: f64,
        canvas_height: f64,
        policy: RangePolicy,
        params: &LayoutParams,
    ) -> Self {
        let Some((actual_min, actual_max)) = notes.pitch_bounds() else {
            return Self::unscaled(canvas_width, canvas_height);
        };

        let range = policy.pitch_range(actual_min, actual_max, params);
        let left_offset = keyboard::layout_offset(range.min);
        let span = keyboard::layout_offset(range.max) - left_offset;
        if canvas_width <= 0.0 || span <= 0.0 {
            return Self::unscaled(canvas_width, canvas_height);
        }

        Self {
            scale: canvas_width / span,
            left_offset,
            canvas_width,
            canvas_height,
            range: Some(range),
        }
    }

    pub fn piano_height(&self, params: &LayoutParams) -> f64 {
        self.canvas_height * params.piano_height_ratio
    }

    /// Y coordinate where falling notes meet the keyboard.
    pub fn piano_top(&self, params: &LayoutParams) -> f64 {
        self.canvas_height - self.piano_height(params)
    }

    /// Whole octaves of pitches (clamped to 0..=127) that intersect the canvas.
    pub fn rendered_pitch_span(&self) -> (i32, i32) {
        let width_units = self.canvas_width / self.scale;
        let lo = ((self.left_offset / 7.0).floor() as i32 * 12).max(0);
        let hi = (((self.left_offset + width_units) / 7.0).ceil() as i32 * 12).min(127);
        (lo, hi)
    }

    pub fn x_for_pitch(&self, pitch: i32) -> f64 {
        keyboard::key_x(pitch, self.left_offset, self.scale)
    }
}
