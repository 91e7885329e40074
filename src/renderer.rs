use crate::active::ActiveState;
use crate::config::{self, ConfigRepository, RenderConfig};
use crate::key_cache::{KeyPositionCache, KeyRect};
use crate::keyboard::is_black_key;
use crate::notes::{pitch_name, NoteSequence};
use crate::palette::{Rgb, TrackPalette};
use crate::surface::{rounded_rect_path, Font, Surface2d, TextAlign, TextBaseline};
use crate::viewport::{CanvasMetrics, HostLayout, LayoutParams, RangePolicy, Viewport};
use bitflags::bitflags;

const KEY_OUTLINE_COLOR: Rgb = Rgb::BLACK;
const KEY_LABEL_COLOR: Rgb = Rgb::BLACK;
const NOTE_LABEL_COLOR: Rgb = Rgb::WHITE;
const NOTE_LABEL_FONT: Font = Font {
    size: 12.0,
    bold: true,
};
const KEY_OUTLINE_WIDTH: f64 = 1.0;
// Relative to the keyboard height.
const KEY_LABEL_SIZE_RATIO: f64 = 0.15;
const KEY_LABEL_BOTTOM_RATIO: f64 = 0.11;
const NOTE_CORNER_RATIO: f64 = 0.1;
/// How far sounding note blocks are pushed towards white.
pub const ACTIVE_NOTE_LIGHTEN: f64 = 0.25;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Layers: u16 {
        const Clear = 1 << 0;
        const OctaveLines = 1 << 1;
        const Notes = 1 << 2;
        const NoteLabels = 1 << 3;
        const Keyboard = 1 << 4;
        const KeyLabels = 1 << 5;
    }
}

/// What one [`PianoRoll::draw_frame`] call put on the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub layers: Layers,
    pub note_blocks: usize,
    pub note_labels: usize,
    pub keys: usize,
}

impl Default for FrameReport {
    fn default() -> Self {
        Self {
            layers: Layers::empty(),
            note_blocks: 0,
            note_labels: 0,
            keys: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// No surface to draw on.
    Detached,
    /// Surface attached; canvas size or viewport not yet derived.
    AwaitingLayout,
    Ready,
}

/// The piano-roll engine: owns the note sequence, the render settings and the derived
/// layout, and paints frames onto a [`Surface2d`].
///
/// Callers drive it once per tick with [`PianoRoll::update_active_state`] followed by
/// [`PianoRoll::draw_frame`]. Layout changes must go through [`PianoRoll::layout`]
/// before the next draw.
pub struct PianoRoll<S: Surface2d> {
    surface: Option<S>,
    state: EngineState,
    notes: NoteSequence,
    config: RenderConfig,
    repo: Box<dyn ConfigRepository>,
    policy: RangePolicy,
    params: LayoutParams,
    palette: TrackPalette,
    metrics: Option<CanvasMetrics>,
    viewport: Option<Viewport>,
    keys: KeyPositionCache,
    active: ActiveState,
}

impl<S: Surface2d> PianoRoll<S> {
    /// Builds a detached engine with settings read from `repo`.
    pub fn new(mut repo: Box<dyn ConfigRepository>) -> Self {
        let config = config::load_or_default(repo.as_mut());
        Self {
            surface: None,
            state: EngineState::Detached,
            notes: NoteSequence::empty(),
            config,
            repo,
            policy: RangePolicy::default(),
            params: LayoutParams::default(),
            palette: TrackPalette::default(),
            metrics: None,
            viewport: None,
            keys: KeyPositionCache::new(),
            active: ActiveState::new(),
        }
    }

    pub fn with_range_policy(mut self, policy: RangePolicy) -> Self {
        self.policy = policy;
        self.invalidate_layout();
        self
    }

    pub fn with_layout_params(mut self, params: LayoutParams) -> Self {
        self.params = params;
        self.invalidate_layout();
        self
    }

    pub fn with_palette(mut self, palette: TrackPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn attach_surface(&mut self, surface: S) {
        self.surface = Some(surface);
        self.metrics = None;
        self.viewport = None;
        self.keys.invalidate();
        self.state = EngineState::AwaitingLayout;
        log::info!("Surface attached");
    }

    pub fn detach_surface(&mut self) -> Option<S> {
        let surface = self.surface.take();
        if surface.is_some() {
            log::info!("Surface detached");
        }
        self.metrics = None;
        self.viewport = None;
        self.keys.invalidate();
        self.state = EngineState::Detached;
        surface
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Sizes the surface from the host measurements and derives the viewport and key
    /// cache. Does nothing while detached.
    pub fn layout(&mut self, host: &HostLayout) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let metrics = CanvasMetrics::from_host(host, &self.params);
        surface.resize(
            metrics.pixel_width,
            metrics.pixel_height,
            metrics.device_pixel_ratio,
        );
        self.metrics = Some(metrics);
        self.relayout();
    }

    /// Marks the viewport stale. The next draw re-derives it from the last known canvas
    /// size.
    pub fn invalidate_layout(&mut self) {
        if self.state == EngineState::Ready {
            self.state = EngineState::AwaitingLayout;
        }
        self.keys.invalidate();
    }

    fn relayout(&mut self) {
        let Some(metrics) = self.metrics else {
            return;
        };
        let viewport = Viewport::compute(
            &self.notes,
            metrics.css_width,
            metrics.css_height,
            self.policy,
            &self.params,
        );
        self.keys.rebuild(&viewport);
        log::debug!(
            "Viewport {}x{}: range {:?}, scale {:.3}, left offset {:.2}",
            metrics.css_width,
            metrics.css_height,
            viewport.range,
            viewport.scale,
            viewport.left_offset
        );
        self.viewport = Some(viewport);
        self.state = EngineState::Ready;
    }

    /// Replaces the note sequence. The viewport follows immediately when laid out.
    pub fn set_notes(&mut self, notes: NoteSequence) {
        self.notes = notes;
        self.active.clear();
        if self.state == EngineState::Ready {
            self.relayout();
        }
    }

    pub fn notes(&self) -> &NoteSequence {
        &self.notes
    }

    pub fn update_active_state(&mut self, time: f64) -> &ActiveState {
        self.active
            .update(time, self.notes.notes(), self.config.audio_visual_offset);
        &self.active
    }

    pub fn active_state(&self) -> &ActiveState {
        &self.active
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn repository(&self) -> &dyn ConfigRepository {
        self.repo.as_ref()
    }

    fn persist(&mut self) {
        if let Err(e) = self.repo.save(&self.config) {
            log::warn!("Could not save render preferences: {e}");
        }
    }

    pub fn set_show_labels(&mut self, show: bool) {
        self.config.show_labels = show;
        self.persist();
    }

    pub fn set_show_octave_lines(&mut self, show: bool) {
        self.config.show_octave_lines = show;
        self.persist();
    }

    /// Non-finite offsets are ignored.
    pub fn set_audio_visual_offset(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            log::warn!("Ignoring audio/visual offset {seconds}");
            return;
        }
        self.config.audio_visual_offset = seconds;
        self.persist();
    }

    /// Values that are not finite and positive are ignored.
    pub fn set_visible_window_seconds(&mut self, seconds: f64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            log::warn!("Ignoring visible window of {seconds}s");
            return;
        }
        self.config.visible_window_seconds = seconds;
        self.persist();
    }

    pub fn set_octave_line_color(&mut self, color: Rgb) {
        self.config.octave_line_color = color;
        self.persist();
    }

    /// Negative and non-finite widths are ignored.
    pub fn set_octave_line_width(&mut self, width: f64) {
        if !width.is_finite() || width < 0.0 {
            log::warn!("Ignoring octave line width {width}");
            return;
        }
        self.config.octave_line_width = width;
        self.persist();
    }

    pub fn set_black_key_note_labels(&mut self, show: bool) {
        self.config.black_key_note_labels = show;
        self.persist();
    }

    pub fn reset_show_labels(&mut self) {
        self.set_show_labels(config::DEFAULT_SHOW_LABELS);
    }

    pub fn reset_audio_visual_offset(&mut self) {
        self.set_audio_visual_offset(config::DEFAULT_AUDIO_VISUAL_OFFSET);
    }

    pub fn canvas_metrics(&self) -> Option<&CanvasMetrics> {
        self.metrics.as_ref()
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// Pixel extent of the key for `pitch`, once laid out.
    pub fn key_rect(&self, pitch: i32) -> Option<KeyRect> {
        self.keys.lookup(pitch)
    }

    /// Current fill of the key for `pitch`, following the active state.
    pub fn key_color(&self, pitch: i32) -> Rgb {
        self.palette
            .key_color(self.active.track_for_pitch(pitch), is_black_key(pitch))
    }

    pub fn piano_top(&self) -> Option<f64> {
        self.viewport.as_ref().map(|v| v.piano_top(&self.params))
    }

    pub fn rendered_pitch_span(&self) -> Option<(i32, i32)> {
        self.viewport.as_ref().map(Viewport::rendered_pitch_span)
    }

    /// Paints the frame for `time`.
    ///
    /// Without a surface or a known canvas size nothing happens. An empty sequence only
    /// clears the surface.
    pub fn draw_frame(&mut self, time: f64) -> FrameReport {
        if self.surface.is_none() {
            return FrameReport::default();
        }
        if self.state != EngineState::Ready {
            self.relayout();
        }
        let (Some(surface), Some(metrics), Some(viewport)) =
            (self.surface.as_mut(), self.metrics, self.viewport)
        else {
            return FrameReport::default();
        };

        let mut painter = FramePainter {
            s: surface,
            viewport,
            keys: &self.keys,
            config: &self.config,
            params: &self.params,
            palette: &self.palette,
            active: &self.active,
            report: FrameReport::default(),
        };

        painter.clear(&metrics);
        if !self.notes.is_empty() {
            if self.config.show_octave_lines {
                painter.octave_lines();
            }
            painter.notes(&self.notes, time);
            painter.keyboard();
        }
        painter.report
    }
}

struct FramePainter<'a, S: Surface2d> {
    s: &'a mut S,
    viewport: Viewport,
    keys: &'a KeyPositionCache,
    config: &'a RenderConfig,
    params: &'a LayoutParams,
    palette: &'a TrackPalette,
    active: &'a ActiveState,
    report: FrameReport,
}

impl<S: Surface2d> FramePainter<'_, S> {
    fn clear(&mut self, metrics: &CanvasMetrics) {
        self.s
            .clear_rect(0.0, 0.0, metrics.css_width, metrics.css_height);
        self.report.layers |= Layers::Clear;
    }

    fn octave_lines(&mut self) {
        let (lo, hi) = self.viewport.rendered_pitch_span();
        let bottom = self.viewport.piano_top(self.params);

        self.s.save();
        self.s.set_stroke_color(self.config.octave_line_color);
        self.s.set_line_width(self.config.octave_line_width);
        let first_c = lo + (12 - lo.rem_euclid(12)) % 12;
        for pitch in (first_c..=hi).step_by(12) {
            let Some(key) = self.keys.lookup(pitch) else {
                continue;
            };
            self.s.begin_path();
            self.s.move_to(key.x, 0.0);
            self.s.line_to(key.x, bottom);
            self.s.stroke();
        }
        self.s.restore();
        self.report.layers |= Layers::OctaveLines;
    }

    fn notes(&mut self, notes: &NoteSequence, time: f64) {
        let window = self.config.visible_window_seconds;
        let offset = self.config.audio_visual_offset;
        let piano_top = self.viewport.piano_top(self.params);
        let speed = piano_top / window;
        let visible_start = time - window;

        self.s.set_text_align(TextAlign::Center);
        self.s.set_text_baseline(TextBaseline::Middle);

        for note in notes.visible(time, window, offset) {
            if note.start_time + offset + note.duration < visible_start {
                continue;
            }
            let Some(key) = self.keys.lookup(note.pitch) else {
                continue;
            };

            let appear_time = note.start_time + offset - window;
            let bottom = (time - appear_time) * speed;
            let height = note.duration * speed;
            let top = bottom - height;
            let radius = (key.width * NOTE_CORNER_RATIO)
                .min(key.width / 2.0)
                .min(height / 2.0);

            let black = is_black_key(note.pitch);
            let mut color = self.palette.color_for(note.track, black);
            if self.active.is_note_active(note.id) {
                color = color.lighten(ACTIVE_NOTE_LIGHTEN);
            }
            self.s.set_fill_color(color);
            rounded_rect_path(&mut *self.s, key.x, top, key.width, height, radius);
            self.s.fill();
            self.report.note_blocks += 1;

            let label_fits = height > self.params.min_note_label_height
                && (!black || self.config.black_key_note_labels);
            if self.config.show_labels && label_fits {
                self.s.set_fill_color(NOTE_LABEL_COLOR);
                self.s.set_font(NOTE_LABEL_FONT);
                self.s
                    .fill_text(pitch_name(note.pitch), key.center_x(), top + height / 2.0);
                self.report.note_labels += 1;
            }
        }

        self.report.layers |= Layers::Notes;
        if self.report.note_labels > 0 {
            self.report.layers |= Layers::NoteLabels;
        }
    }

    fn keyboard(&mut self) {
        let (lo, hi) = self.viewport.rendered_pitch_span();
        let piano_height = self.viewport.piano_height(self.params);
        let top = self.viewport.piano_top(self.params);

        // White keys first so black keys overlap them.
        for pitch in (lo..=hi).filter(|&p| !is_black_key(p)) {
            let Some(key) = self.keys.lookup(pitch) else {
                continue;
            };
            let fill = self
                .palette
                .key_color(self.active.track_for_pitch(pitch), false);
            self.s.set_fill_color(fill);
            self.s.fill_rect(key.x, top, key.width, piano_height);
            self.s.set_stroke_color(KEY_OUTLINE_COLOR);
            self.s.set_line_width(KEY_OUTLINE_WIDTH);
            self.s.stroke_rect(key.x, top, key.width, piano_height);
            self.report.keys += 1;
        }

        let black_height = piano_height * self.params.black_key_height_ratio;
        for pitch in (lo..=hi).filter(|&p| is_black_key(p)) {
            let Some(key) = self.keys.lookup(pitch) else {
                continue;
            };
            let fill = self
                .palette
                .key_color(self.active.track_for_pitch(pitch), true);
            self.s.set_fill_color(fill);
            self.s.fill_rect(key.x, top, key.width, black_height);
            self.report.keys += 1;
        }
        self.report.layers |= Layers::Keyboard;

        if !self.config.show_labels {
            return;
        }
        self.s.set_fill_color(KEY_LABEL_COLOR);
        self.s.set_font(Font {
            size: piano_height * KEY_LABEL_SIZE_RATIO,
            bold: false,
        });
        self.s.set_text_align(TextAlign::Center);
        self.s.set_text_baseline(TextBaseline::Middle);
        let y = self.viewport.canvas_height - piano_height * KEY_LABEL_BOTTOM_RATIO;
        for pitch in (lo..=hi).filter(|&p| !is_black_key(p)) {
            if let Some(key) = self.keys.lookup(pitch) {
                self.s.fill_text(pitch_name(pitch), key.center_x(), y);
            }
        }
        self.report.layers |= Layers::KeyLabels;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, MemoryRepository, NullRepository};
    use crate::notes::Note;
    use crate::surface::{CommandRecorder, DrawCommand};
    use pretty_assertions::assert_eq;

    struct BrokenRepository;

    impl ConfigRepository for BrokenRepository {
        fn load(&self) -> Result<Option<RenderConfig>, ConfigError> {
            Err(ConfigError::Unavailable)
        }

        fn save(&mut self, _config: &RenderConfig) -> Result<(), ConfigError> {
            Err(ConfigError::Unavailable)
        }
    }

    fn host() -> HostLayout {
        HostLayout {
            container_width: 800.0,
            container_height: 900.0,
            window_height: 1000.0,
            fullscreen: false,
            controls_height: None,
            device_pixel_ratio: 1.0,
        }
    }

    fn ready_roll(notes: Vec<Note>) -> PianoRoll<CommandRecorder> {
        let mut roll = PianoRoll::new(Box::new(NullRepository));
        roll.set_notes(NoteSequence::new(notes));
        roll.attach_surface(CommandRecorder::new());
        roll.layout(&host());
        roll.surface_mut().unwrap().clear();
        roll
    }

    #[test]
    fn walks_through_the_state_machine() {
        let mut roll: PianoRoll<CommandRecorder> = PianoRoll::new(Box::new(NullRepository));
        assert_eq!(roll.state(), EngineState::Detached);

        // Layout and drawing without a surface are no-ops.
        roll.layout(&host());
        assert_eq!(roll.draw_frame(0.0), FrameReport::default());
        assert_eq!(roll.state(), EngineState::Detached);

        roll.attach_surface(CommandRecorder::new());
        assert_eq!(roll.state(), EngineState::AwaitingLayout);
        assert_eq!(roll.draw_frame(0.0), FrameReport::default());

        roll.layout(&host());
        assert_eq!(roll.state(), EngineState::Ready);
        assert_eq!(
            roll.surface().unwrap().commands()[0],
            DrawCommand::Resize {
                pixel_width: 800,
                pixel_height: 700,
                device_pixel_ratio: 1.0
            }
        );

        roll.invalidate_layout();
        assert_eq!(roll.state(), EngineState::AwaitingLayout);
        assert_eq!(roll.key_rect(60), None);
        roll.draw_frame(0.0);
        assert_eq!(roll.state(), EngineState::Ready);
        assert!(roll.key_rect(60).is_some());

        assert!(roll.detach_surface().is_some());
        assert_eq!(roll.state(), EngineState::Detached);
        assert_eq!(roll.viewport(), None);
    }

    #[test]
    fn empty_sequence_only_clears() {
        let mut roll = ready_roll(Vec::new());
        let report = roll.draw_frame(1.0);
        assert_eq!(report.layers, Layers::Clear);
        assert_eq!(
            roll.surface().unwrap().commands(),
            &[DrawCommand::ClearRect {
                x: 0.0,
                y: 0.0,
                w: 800.0,
                h: 700.0
            }]
        );
    }

    #[test]
    fn draws_layers_in_order() {
        let mut roll = ready_roll(vec![Note::new(1, 60, 0, 0.0, 1.0)]);
        let report = roll.draw_frame(0.0);
        assert_eq!(report.layers, Layers::all());
        assert_eq!(report.note_blocks, 1);
        assert_eq!(report.note_labels, 1);

        let cmds = roll.surface().unwrap().commands();
        let first = |want: fn(&DrawCommand) -> bool| cmds.iter().position(want).unwrap();
        let clear = first(|c| matches!(c, DrawCommand::ClearRect { .. }));
        let grid = first(|c| matches!(c, DrawCommand::Stroke));
        let block = first(|c| matches!(c, DrawCommand::Fill));
        let key = first(|c| matches!(c, DrawCommand::FillRect { .. }));
        assert!(clear < grid && grid < block && block < key);
    }

    #[test]
    fn note_block_geometry_follows_time() {
        let mut roll = ready_roll(vec![Note::new(1, 60, 0, 0.0, 1.0)]);
        roll.set_audio_visual_offset(0.0);
        roll.set_show_octave_lines(false);
        roll.surface_mut().unwrap().clear();
        roll.draw_frame(0.0);

        // The keyboard starts at 700 - 105; the note falls 595px over the 3s window.
        let piano_top = roll.piano_top().unwrap();
        assert_eq!(piano_top, 595.0);
        let key = roll.key_rect(60).unwrap();
        let speed = piano_top / 3.0;
        let top = piano_top - speed;
        let radius = key.width * 0.1;

        let cmds = roll.surface().unwrap().commands();
        assert!(cmds.contains(&DrawCommand::MoveTo {
            x: key.x + radius,
            y: top
        }));
        assert!(cmds.contains(&DrawCommand::FillText {
            text: "C".to_owned(),
            x: key.center_x(),
            y: top + speed / 2.0
        }));
    }

    #[test]
    fn short_and_black_key_notes_skip_labels() {
        let mut roll = ready_roll(vec![
            Note::new(1, 60, 0, 0.0, 0.01),
            Note::new(2, 61, 0, 0.0, 1.0),
        ]);
        let report = roll.draw_frame(0.0);
        assert_eq!(report.note_blocks, 2);
        assert_eq!(report.note_labels, 0);
        assert!(!report.layers.contains(Layers::NoteLabels));

        roll.set_black_key_note_labels(true);
        assert_eq!(roll.draw_frame(0.0).note_labels, 1);
    }

    #[test]
    fn hides_labels_and_grid_when_disabled() {
        let mut roll = ready_roll(vec![Note::new(1, 60, 0, 0.0, 1.0)]);
        roll.set_show_labels(false);
        roll.set_show_octave_lines(false);
        roll.surface_mut().unwrap().clear();
        let report = roll.draw_frame(0.0);
        assert_eq!(report.layers, Layers::Clear | Layers::Notes | Layers::Keyboard);
        assert!(roll.surface().unwrap().texts().is_empty());
        assert_eq!(
            roll.surface()
                .unwrap()
                .count(|c| matches!(c, DrawCommand::Stroke)),
            0
        );
    }

    #[test]
    fn keyboard_covers_rendered_span() {
        let mut roll = ready_roll(vec![Note::new(1, 60, 0, 0.0, 1.0)]);
        let (lo, hi) = roll.rendered_pitch_span().unwrap();
        let report = roll.draw_frame(0.0);
        assert_eq!(report.keys, (hi - lo + 1) as usize);

        let labels = roll
            .surface()
            .unwrap()
            .texts()
            .into_iter()
            .filter(|t| !t.contains('#'))
            .count();
        let whites = (lo..=hi).filter(|&p| !is_black_key(p)).count();
        // One label per white key plus the note block's own label.
        assert_eq!(labels, whites + 1);
    }

    #[test]
    fn active_keys_take_track_colors() {
        let mut roll = ready_roll(vec![
            Note::new(1, 60, 2, 0.0, 1.0),
            Note::new(2, 61, 2, 0.0, 1.0),
        ]);
        roll.set_audio_visual_offset(0.0);
        let palette = TrackPalette::default();

        roll.update_active_state(0.5);
        assert_eq!(roll.key_color(60), palette.color_for(2, false));
        assert_eq!(roll.key_color(61), palette.color_for(2, true));
        assert_eq!(roll.key_color(62), Rgb::WHITE);

        roll.draw_frame(0.5);
        let cmds = roll.surface().unwrap().commands();
        assert!(cmds.contains(&DrawCommand::FillColor(
            palette.color_for(2, false).lighten(ACTIVE_NOTE_LIGHTEN)
        )));

        roll.update_active_state(5.0);
        assert_eq!(roll.key_color(60), Rgb::WHITE);
        assert_eq!(roll.key_color(61), Rgb::BLACK);
    }

    #[test]
    fn replacing_notes_relayouts_and_clears_active_state() {
        let mut roll = ready_roll(vec![Note::new(1, 60, 0, 0.0, 1.0)]);
        roll.update_active_state(0.5);
        let before = *roll.viewport().unwrap();

        roll.set_notes(NoteSequence::new(vec![
            Note::new(1, 21, 0, 0.0, 1.0),
            Note::new(2, 108, 0, 0.0, 1.0),
        ]));
        assert!(roll.active_state().is_empty());
        let after = roll.viewport().unwrap();
        assert_ne!(after.scale, before.scale);
        let range = after.range.unwrap();
        assert!(range.contains(21) && range.contains(108));
        assert_eq!(roll.key_rect(60).unwrap().x, after.x_for_pitch(60));
    }

    #[test]
    fn setters_persist() {
        let mut roll: PianoRoll<CommandRecorder> =
            PianoRoll::new(Box::new(MemoryRepository::new()));
        roll.set_show_labels(false);
        roll.set_audio_visual_offset(0.2);
        roll.set_visible_window_seconds(5.0);
        let stored = roll.repository().load().unwrap().unwrap();
        assert!(!stored.show_labels);
        assert_eq!(stored.audio_visual_offset, 0.2);
        assert_eq!(stored.visible_window_seconds, 5.0);

        roll.reset_show_labels();
        roll.reset_audio_visual_offset();
        let stored = roll.repository().load().unwrap().unwrap();
        assert!(stored.show_labels);
        assert_eq!(stored.audio_visual_offset, -0.1);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut roll: PianoRoll<CommandRecorder> = PianoRoll::new(Box::new(NullRepository));
        roll.set_visible_window_seconds(0.0);
        roll.set_visible_window_seconds(f64::INFINITY);
        roll.set_audio_visual_offset(f64::NAN);
        roll.set_octave_line_width(-1.0);
        roll.set_octave_line_width(f64::NAN);
        assert_eq!(roll.config(), &RenderConfig::default());
    }

    #[test]
    fn pitches_outside_the_key_cache_are_skipped() {
        let mut roll = ready_roll(vec![
            Note::new(0, 60, 0, 0.0, 1.0),
            Note::new(1, 200, 1, 0.0, 1.0),
            Note::new(2, i32::MAX, 2, 0.0, 1.0),
        ]);
        assert_eq!(roll.key_rect(200), None);

        roll.update_active_state(0.5);
        let report = roll.draw_frame(0.5);
        assert_eq!(report.note_blocks, 1);
        assert!(report.keys > 0);
        assert!(report.layers.contains(Layers::Keyboard));
    }

    #[test]
    fn loads_stored_settings_on_construction() {
        let repo = MemoryRepository::with_json(
            r#"{"showLabels":false,"showOctaveLines":false,"audioVisualOffset":0.0,"visibleWindowSeconds":6}"#,
        );
        let roll: PianoRoll<CommandRecorder> = PianoRoll::new(Box::new(repo));
        assert!(!roll.config().show_labels);
        assert_eq!(roll.config().visible_window_seconds, 6.0);
    }

    #[test]
    fn broken_store_does_not_block_setters() {
        let mut roll: PianoRoll<CommandRecorder> = PianoRoll::new(Box::new(BrokenRepository));
        assert_eq!(roll.config(), &RenderConfig::default());
        roll.set_show_labels(false);
        assert!(!roll.config().show_labels);
    }

    #[test]
    fn fullscreen_layout_uses_container_minus_controls() {
        let mut roll = ready_roll(vec![Note::new(1, 60, 0, 0.0, 1.0)]);
        roll.layout(&HostLayout {
            fullscreen: true,
            controls_height: Some(100.0),
            device_pixel_ratio: 2.0,
            ..host()
        });
        let m = roll.canvas_metrics().unwrap();
        assert_eq!((m.css_width, m.css_height), (800.0, 800.0));
        assert_eq!((m.pixel_width, m.pixel_height), (1600, 1600));
        assert_eq!(roll.piano_top(), Some(680.0));
    }
}
