//! Software implementation of [`Surface2d`] over a `0x00RRGGBB` pixel buffer.
//!
//! The buffer is sized in physical pixels; every incoming coordinate is in CSS pixels
//! and multiplied by the device pixel ratio before it touches the buffer.

use crate::palette::Rgb;
use crate::pixel_font;
use crate::surface::{Font, Surface2d, TextAlign, TextBaseline};
use std::f64::consts::PI;

#[derive(Clone, Copy, Debug)]
struct PaintState {
    fill: u32,
    stroke: u32,
    line_width: f64,
    font: Font,
    align: TextAlign,
    baseline: TextBaseline,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            fill: 0,
            stroke: 0,
            line_width: 1.0,
            font: Font::default(),
            align: TextAlign::Left,
            baseline: TextBaseline::Middle,
        }
    }
}

pub struct PixelCanvas {
    pixels: Vec<u32>,
    width: usize,
    height: usize,
    dpr: f64,
    background: u32,
    state: PaintState,
    saved: Vec<PaintState>,
    // Subpaths of the current path, in physical pixels.
    path: Vec<Vec<(f64, f64)>>,
}

impl Default for PixelCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelCanvas {
    /// An empty canvas; it holds no pixels until the first `resize`.
    pub fn new() -> Self {
        Self {
            pixels: Vec::new(),
            width: 0,
            height: 0,
            dpr: 1.0,
            background: 0,
            state: PaintState::default(),
            saved: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Color `clear_rect` resets pixels to.
    pub fn with_background(mut self, color: Rgb) -> Self {
        self.background = color.to_u32();
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Physical pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    fn to_px(&self, v: f64) -> f64 {
        v * self.dpr
    }

    /// Fills a physical-pixel rectangle given by its edges, clipped to the buffer.
    fn fill_px(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: u32) {
        let (x0, x1) = (x0.min(x1), x0.max(x1));
        let (y0, y1) = (y0.min(y1), y0.max(y1));
        let x0 = (x0.round().max(0.0) as usize).min(self.width);
        let x1 = (x1.round().max(0.0) as usize).min(self.width);
        let y0 = (y0.round().max(0.0) as usize).min(self.height);
        let y1 = (y1.round().max(0.0) as usize).min(self.height);

        for y in y0..y1 {
            let row = y * self.width;
            self.pixels[row + x0..row + x1].fill(color);
        }
    }

    fn current_point(&self) -> Option<(f64, f64)> {
        self.path.last().and_then(|sp| sp.last()).copied()
    }

    fn push_point(&mut self, p: (f64, f64)) {
        match self.path.last_mut() {
            Some(sp) => sp.push(p),
            None => self.path.push(vec![p]),
        }
    }

    /// Even-odd scanline fill of the current path; subpaths are closed implicitly.
    fn fill_path(&mut self, color: u32) {
        let mut edges = Vec::new();
        for sp in &self.path {
            if sp.len() < 3 {
                continue;
            }
            for i in 0..sp.len() {
                let a = sp[i];
                let b = sp[(i + 1) % sp.len()];
                if a.1 != b.1 {
                    edges.push((a, b));
                }
            }
        }
        if edges.is_empty() {
            return;
        }

        let min_y = edges.iter().map(|(a, b)| a.1.min(b.1)).fold(f64::INFINITY, f64::min);
        let max_y = edges.iter().map(|(a, b)| a.1.max(b.1)).fold(f64::NEG_INFINITY, f64::max);
        let y_start = (min_y.floor().max(0.0) as usize).min(self.height);
        let y_end = (max_y.ceil().max(0.0) as usize).min(self.height);

        let mut xs = Vec::new();
        for y in y_start..y_end {
            let sy = y as f64 + 0.5;
            xs.clear();
            for &((ax, ay), (bx, by)) in &edges {
                let (lo, hi) = if ay < by { (ay, by) } else { (by, ay) };
                if sy < lo || sy >= hi {
                    continue;
                }
                xs.push(ax + (sy - ay) * (bx - ax) / (by - ay));
            }
            xs.sort_by(f64::total_cmp);
            for pair in xs.chunks_exact(2) {
                let x0 = ((pair[0] - 0.5).ceil().max(0.0) as usize).min(self.width);
                let x1 = ((pair[1] - 0.5).ceil().max(0.0) as usize).min(self.width);
                let row = y * self.width;
                if x0 < x1 {
                    self.pixels[row + x0..row + x1].fill(color);
                }
            }
        }
    }

    /// Strokes each path segment by stamping line-width squares along it.
    fn stroke_path(&mut self, color: u32) {
        let lw = self.to_px(self.state.line_width).max(1.0);
        let half = lw / 2.0;
        let segments: Vec<((f64, f64), (f64, f64))> = self
            .path
            .iter()
            .flat_map(|sp| sp.windows(2).map(|w| (w[0], w[1])))
            .collect();

        for ((ax, ay), (bx, by)) in segments {
            let len = (bx - ax).hypot(by - ay);
            let steps = (len * 2.0).ceil().max(1.0) as usize;
            for i in 0..=steps {
                let t = i as f64 / steps as f64;
                let (x, y) = (ax + (bx - ax) * t, ay + (by - ay) * t);
                self.fill_px(x - half, y - half, x + half, y + half, color);
            }
        }
    }

    fn font_cell(&self) -> i32 {
        (self.to_px(self.state.font.size) / pixel_font::GLYPH_H as f64)
            .round()
            .max(1.0) as i32
    }
}

impl Surface2d for PixelCanvas {
    fn resize(&mut self, pixel_width: u32, pixel_height: u32, device_pixel_ratio: f64) {
        self.width = pixel_width as usize;
        self.height = pixel_height as usize;
        self.dpr = if device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        self.pixels = vec![self.background; self.width * self.height];
        self.path.clear();
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let bg = self.background;
        self.fill_px(self.to_px(x), self.to_px(y), self.to_px(x + w), self.to_px(y + h), bg);
    }

    fn set_fill_color(&mut self, color: Rgb) {
        self.state.fill = color.to_u32();
    }

    fn set_stroke_color(&mut self, color: Rgb) {
        self.state.stroke = color.to_u32();
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn set_font(&mut self, font: Font) {
        self.state.font = font;
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.state.align = align;
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.baseline = baseline;
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let color = self.state.fill;
        self.fill_px(self.to_px(x), self.to_px(y), self.to_px(x + w), self.to_px(y + h), color);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let color = self.state.stroke;
        let lw = self.to_px(self.state.line_width).max(1.0);
        let (x0, y0) = (self.to_px(x), self.to_px(y));
        let (x1, y1) = (self.to_px(x + w), self.to_px(y + h));

        self.fill_px(x0, y0, x1, y0 + lw, color);
        self.fill_px(x0, y1 - lw, x1, y1, color);
        self.fill_px(x0, y0, x0 + lw, y1, color);
        self.fill_px(x1 - lw, y0, x1, y1, color);
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let p = (self.to_px(x), self.to_px(y));
        self.path.push(vec![p]);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = (self.to_px(x), self.to_px(y));
        self.push_point(p);
    }

    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) {
        let p1 = (self.to_px(x1), self.to_px(y1));
        let p2 = (self.to_px(x2), self.to_px(y2));
        let r = self.to_px(radius);

        let Some(p0) = self.current_point() else {
            self.path.push(vec![p1]);
            return;
        };

        let v1 = (p0.0 - p1.0, p0.1 - p1.1);
        let v2 = (p2.0 - p1.0, p2.1 - p1.1);
        let (len1, len2) = (v1.0.hypot(v1.1), v2.0.hypot(v2.1));
        if r <= 0.0 || len1 == 0.0 || len2 == 0.0 {
            self.push_point(p1);
            return;
        }

        let u1 = (v1.0 / len1, v1.1 / len1);
        let u2 = (v2.0 / len2, v2.1 / len2);
        let angle = (u1.0 * u2.0 + u1.1 * u2.1).clamp(-1.0, 1.0).acos();
        if angle.sin().abs() < 1e-9 {
            self.push_point(p1);
            return;
        }

        // Tangent points on both legs and the circle center on the bisector.
        let tangent = r / (angle / 2.0).tan();
        let t1 = (p1.0 + u1.0 * tangent, p1.1 + u1.1 * tangent);
        let t2 = (p1.0 + u2.0 * tangent, p1.1 + u2.1 * tangent);
        let bis = (u1.0 + u2.0, u1.1 + u2.1);
        let bis_len = bis.0.hypot(bis.1);
        let dist = r / (angle / 2.0).sin();
        let c = (p1.0 + bis.0 / bis_len * dist, p1.1 + bis.1 / bis_len * dist);

        self.push_point(t1);
        let a1 = (t1.1 - c.1).atan2(t1.0 - c.0);
        let a2 = (t2.1 - c.1).atan2(t2.0 - c.0);
        let mut sweep = a2 - a1;
        if sweep > PI {
            sweep -= 2.0 * PI;
        } else if sweep < -PI {
            sweep += 2.0 * PI;
        }

        let n = ((sweep.abs() * r) / 2.0).ceil().clamp(2.0, 32.0) as usize;
        for i in 1..=n {
            let a = a1 + sweep * i as f64 / n as f64;
            self.push_point((c.0 + r * a.cos(), c.1 + r * a.sin()));
        }
    }

    fn fill(&mut self) {
        let color = self.state.fill;
        self.fill_path(color);
    }

    fn stroke(&mut self) {
        let color = self.state.stroke;
        self.stroke_path(color);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let cell = self.font_cell();
        let tw = pixel_font::text_width(text, cell) as f64;
        let th = pixel_font::text_height(cell) as f64;
        let (px, py) = (self.to_px(x), self.to_px(y));

        let left = match self.state.align {
            TextAlign::Left => px,
            TextAlign::Center => px - tw / 2.0,
            TextAlign::Right => px - tw,
        };
        let top = match self.state.baseline {
            TextBaseline::Top => py,
            TextBaseline::Middle => py - th / 2.0,
            TextBaseline::Bottom => py - th,
        };

        pixel_font::draw_text(
            &mut self.pixels,
            self.width,
            self.height,
            left.round() as i32,
            top.round() as i32,
            text,
            self.state.fill,
            cell,
            self.state.font.bold,
        );
    }

    fn save(&mut self) {
        self.saved.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::rounded_rect_path;

    const RED: Rgb = Rgb::new(255, 0, 0);

    fn canvas(w: u32, h: u32, dpr: f64) -> PixelCanvas {
        let mut c = PixelCanvas::new();
        c.resize(w, h, dpr);
        c
    }

    #[test]
    fn starts_empty_until_resized() {
        let c = PixelCanvas::new();
        assert_eq!((c.width(), c.height()), (0, 0));
        assert!(c.pixels().is_empty());
    }

    #[test]
    fn fill_rect_scales_by_device_pixel_ratio() {
        let mut c = canvas(20, 20, 2.0);
        c.set_fill_color(RED);
        c.fill_rect(1.0, 1.0, 2.0, 2.0);
        assert_eq!(c.pixel(2, 2), Some(RED.to_u32()));
        assert_eq!(c.pixel(5, 5), Some(RED.to_u32()));
        assert_eq!(c.pixel(6, 6), Some(0));
        assert_eq!(c.pixel(1, 1), Some(0));
    }

    #[test]
    fn clear_rect_restores_background() {
        let mut c = canvas(10, 10, 1.0).with_background(Rgb::new(1, 2, 3));
        c.resize(10, 10, 1.0);
        c.set_fill_color(RED);
        c.fill_rect(0.0, 0.0, 10.0, 10.0);
        c.clear_rect(0.0, 0.0, 10.0, 10.0);
        assert!(c.pixels().iter().all(|&p| p == 0x010203));
    }

    #[test]
    fn fill_rect_clips_outside_buffer() {
        let mut c = canvas(4, 4, 1.0);
        c.set_fill_color(RED);
        c.fill_rect(-10.0, -10.0, 100.0, 100.0);
        assert!(c.pixels().iter().all(|&p| p == RED.to_u32()));
    }

    #[test]
    fn stroke_rect_outlines_only() {
        let mut c = canvas(10, 10, 1.0);
        c.set_stroke_color(RED);
        c.stroke_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(c.pixel(0, 5), Some(RED.to_u32()));
        assert_eq!(c.pixel(9, 5), Some(RED.to_u32()));
        assert_eq!(c.pixel(5, 5), Some(0));
    }

    #[test]
    fn rounded_rect_fill_leaves_corners() {
        let mut c = canvas(40, 40, 1.0);
        c.set_fill_color(RED);
        rounded_rect_path(&mut c, 0.0, 0.0, 40.0, 40.0, 10.0);
        c.fill();
        assert_eq!(c.pixel(20, 20), Some(RED.to_u32()));
        assert_eq!(c.pixel(20, 0), Some(RED.to_u32()));
        assert_eq!(c.pixel(0, 20), Some(RED.to_u32()));
        assert_eq!(c.pixel(0, 0), Some(0));
        assert_eq!(c.pixel(39, 39), Some(0));
    }

    #[test]
    fn zero_radius_fills_plain_rectangle() {
        let mut c = canvas(10, 10, 1.0);
        c.set_fill_color(RED);
        rounded_rect_path(&mut c, 2.0, 2.0, 4.0, 4.0, 0.0);
        c.fill();
        assert_eq!(c.pixel(2, 2), Some(RED.to_u32()));
        assert_eq!(c.pixel(5, 5), Some(RED.to_u32()));
        assert_eq!(c.pixel(6, 6), Some(0));
    }

    #[test]
    fn stroke_draws_vertical_line() {
        let mut c = canvas(10, 10, 1.0);
        c.set_stroke_color(RED);
        c.begin_path();
        c.move_to(5.0, 0.0);
        c.line_to(5.0, 10.0);
        c.stroke();
        assert_eq!(c.pixel(5, 3), Some(RED.to_u32()));
        assert_eq!(c.pixel(2, 3), Some(0));
    }

    #[test]
    fn centered_text_lands_around_anchor() {
        let mut c = canvas(40, 40, 1.0);
        c.set_fill_color(RED);
        c.set_font(Font { size: 14.0, bold: false });
        c.set_text_align(TextAlign::Center);
        c.set_text_baseline(TextBaseline::Middle);
        c.fill_text("C", 20.0, 20.0);

        let lit: Vec<(usize, usize)> = (0..40)
            .flat_map(|y| (0..40).map(move |x| (x, y)))
            .filter(|&(x, y)| c.pixel(x, y) == Some(RED.to_u32()))
            .collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&(x, y)| (15..=25).contains(&x) && (13..=27).contains(&y)));
    }

    #[test]
    fn save_restore_round_trips_style() {
        let mut c = canvas(4, 4, 1.0);
        c.set_fill_color(RED);
        c.save();
        c.set_fill_color(Rgb::WHITE);
        c.restore();
        c.fill_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(c.pixel(0, 0), Some(RED.to_u32()));
        // Unbalanced restore is ignored.
        c.restore();
    }
}
