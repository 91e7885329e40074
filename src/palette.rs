//! Colors and the per-track color table.

/// An opaque sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Hue in degrees, saturation and lightness in 0..=1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From `0x00RRGGBB`.
    pub const fn from_u32(v: u32) -> Self {
        Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    /// To `0x00RRGGBB`, the layout softbuffer presents.
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Parses `#RRGGBB` or `RRGGBB`.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Self::from_u32)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_hsl(self) -> Hsl {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;

        if d == 0.0 {
            return Hsl { h: 0.0, s: 0.0, l };
        }

        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        Hsl { h: h * 60.0, s, l }
    }

    pub fn from_hsl(hsl: Hsl) -> Self {
        let Hsl { h, s, l } = hsl;
        let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;

        if s == 0.0 {
            let v = to_u8(l);
            return Self::new(v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let h = h.rem_euclid(360.0) / 360.0;

        let channel = |t: f64| {
            let t = t.rem_euclid(1.0);
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };

        Self::new(
            to_u8(channel(h + 1.0 / 3.0)),
            to_u8(channel(h)),
            to_u8(channel(h - 1.0 / 3.0)),
        )
    }

    /// Reduces saturation by `fraction` (0.45 removes 45% of it).
    pub fn desaturate(self, fraction: f64) -> Self {
        let mut hsl = self.to_hsl();
        hsl.s *= 1.0 - fraction.clamp(0.0, 1.0);
        Self::from_hsl(hsl)
    }

    /// Moves lightness `amount` of the way towards white.
    pub fn lighten(self, amount: f64) -> Self {
        let mut hsl = self.to_hsl();
        hsl.l += (1.0 - hsl.l) * amount.clamp(0.0, 1.0);
        Self::from_hsl(hsl)
    }
}

pub const DEFAULT_TRACK_COLORS: [Rgb; 8] = [
    Rgb::from_u32(0x4CAF50),
    Rgb::from_u32(0x2196F3),
    Rgb::from_u32(0xFFC107),
    Rgb::from_u32(0xE91E63),
    Rgb::from_u32(0x9C27B0),
    Rgb::from_u32(0xFF5722),
    Rgb::from_u32(0x00BCD4),
    Rgb::from_u32(0x8BC34A),
];

/// Share of saturation removed from track colors drawn on black keys.
pub const BLACK_KEY_DESATURATION: f64 = 0.45;

pub const WHITE_KEY_COLOR: Rgb = Rgb::WHITE;
pub const BLACK_KEY_COLOR: Rgb = Rgb::BLACK;

/// Cyclic track -> color assignment with a muted variant for black keys.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackPalette {
    base: Vec<Rgb>,
    muted: Vec<Rgb>,
}

impl Default for TrackPalette {
    fn default() -> Self {
        Self::new(&DEFAULT_TRACK_COLORS)
    }
}

impl TrackPalette {
    /// An empty color list falls back to the default palette.
    pub fn new(colors: &[Rgb]) -> Self {
        let base = if colors.is_empty() {
            DEFAULT_TRACK_COLORS.to_vec()
        } else {
            colors.to_vec()
        };
        let muted = base
            .iter()
            .map(|c| c.desaturate(BLACK_KEY_DESATURATION))
            .collect();
        Self { base, muted }
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn color_for(&self, track: usize, is_black_key: bool) -> Rgb {
        let idx = track % self.base.len();
        if is_black_key {
            self.muted[idx]
        } else {
            self.base[idx]
        }
    }

    /// Fill for a keyboard key: the track color while a track sounds it, else the plain key color.
    pub fn key_color(&self, active_track: Option<usize>, is_black_key: bool) -> Rgb {
        match (active_track, is_black_key) {
            (Some(track), black) => self.color_for(track, black),
            (None, false) => WHITE_KEY_COLOR,
            (None, true) => BLACK_KEY_COLOR,
        }
    }
}
