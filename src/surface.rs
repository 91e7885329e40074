//! The 2D immediate-mode drawing surface the renderer paints through.
//!
//! Coordinates are CSS pixels. Implementations scale them by the device pixel ratio
//! passed to [`Surface2d::resize`].

use crate::palette::Rgb;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Font {
    /// Height in CSS pixels.
    pub size: f64,
    pub bold: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            size: 10.0,
            bold: false,
        }
    }
}

pub trait Surface2d {
    /// Reallocates the backing store at `pixel_width` x `pixel_height` physical pixels.
    fn resize(&mut self, pixel_width: u32, pixel_height: u32, device_pixel_ratio: f64);

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    fn set_fill_color(&mut self, color: Rgb);
    fn set_stroke_color(&mut self, color: Rgb);
    fn set_line_width(&mut self, width: f64);
    fn set_font(&mut self, font: Font);
    fn set_text_align(&mut self, align: TextAlign);
    fn set_text_baseline(&mut self, baseline: TextBaseline);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    /// Canvas-style `arcTo`: a line towards the corner `(x1, y1)` rounded with `radius`
    /// so that it leaves heading for `(x2, y2)`.
    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_text(&mut self, text: &str, x: f64, y: f64);

    /// Pushes the current style state.
    fn save(&mut self);
    /// Pops the style state pushed by the matching [`Surface2d::save`].
    fn restore(&mut self);
}

/// Traces a rounded rectangle as the current path. A zero radius degrades to a plain
/// rectangle.
pub fn rounded_rect_path<S: Surface2d + ?Sized>(
    s: &mut S,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    radius: f64,
) {
    let r = radius.max(0.0).min(w / 2.0).min(h / 2.0);
    let (right, bottom) = (x + w, y + h);

    s.begin_path();
    s.move_to(x + r, y);
    s.line_to(right - r, y);
    s.arc_to(right, y, right, y + r, r);
    s.line_to(right, bottom - r);
    s.arc_to(right, bottom, right - r, bottom, r);
    s.line_to(x + r, bottom);
    s.arc_to(x, bottom, x, bottom - r, r);
    s.line_to(x, y + r);
    s.arc_to(x, y, x + r, y, r);
}

/// One call made against a [`CommandRecorder`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Resize { pixel_width: u32, pixel_height: u32, device_pixel_ratio: f64 },
    ClearRect { x: f64, y: f64, w: f64, h: f64 },
    FillColor(Rgb),
    StrokeColor(Rgb),
    LineWidth(f64),
    Font(Font),
    TextAlign(TextAlign),
    TextBaseline(TextBaseline),
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    StrokeRect { x: f64, y: f64, w: f64, h: f64 },
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    ArcTo { x1: f64, y1: f64, x2: f64, y2: f64, radius: f64 },
    Fill,
    Stroke,
    FillText { text: String, x: f64, y: f64 },
    Save,
    Restore,
}

/// A surface that draws nothing and remembers every call, in order.
#[derive(Clone, Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl Surface2d for CommandRecorder {
    fn resize(&mut self, pixel_width: u32, pixel_height: u32, device_pixel_ratio: f64) {
        self.push(DrawCommand::Resize {
            pixel_width,
            pixel_height,
            device_pixel_ratio,
        });
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawCommand::ClearRect { x, y, w, h });
    }

    fn set_fill_color(&mut self, color: Rgb) {
        self.push(DrawCommand::FillColor(color));
    }

    fn set_stroke_color(&mut self, color: Rgb) {
        self.push(DrawCommand::StrokeColor(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawCommand::LineWidth(width));
    }

    fn set_font(&mut self, font: Font) {
        self.push(DrawCommand::Font(font));
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.push(DrawCommand::TextAlign(align));
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.push(DrawCommand::TextBaseline(baseline));
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawCommand::FillRect { x, y, w, h });
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawCommand::StrokeRect { x, y, w, h });
    }

    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::LineTo { x, y });
    }

    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) {
        self.push(DrawCommand::ArcTo {
            x1,
            y1,
            x2,
            y2,
            radius,
        });
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.push(DrawCommand::FillText {
            text: text.to_owned(),
            x,
            y,
        });
    }

    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }
}
