use crate::keyboard;
use crate::viewport::Viewport;

pub const PITCH_COUNT: usize = 128;

/// Horizontal pixel extent of a key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyRect {
    pub x: f64,
    pub width: f64,
}

impl KeyRect {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Pixel rectangles for pitches 0..=127 under the current viewport.
///
/// Empty until the first [`KeyPositionCache::rebuild`], and emptied again by
/// [`KeyPositionCache::invalidate`]; callers skip pitches whose lookup misses.
#[derive(Clone, Debug)]
pub struct KeyPositionCache {
    rects: [Option<KeyRect>; PITCH_COUNT],
}

impl Default for KeyPositionCache {
    fn default() -> Self {
        Self {
            rects: [None; PITCH_COUNT],
        }
    }
}

impl KeyPositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, viewport: &Viewport) {
        for (pitch, slot) in self.rects.iter_mut().enumerate() {
            let pitch = pitch as i32;
            *slot = Some(KeyRect {
                x: keyboard::key_x(pitch, viewport.left_offset, viewport.scale),
                width: keyboard::key_width(pitch, viewport.scale),
            });
        }
    }

    pub fn invalidate(&mut self) {
        self.rects = [None; PITCH_COUNT];
    }

    pub fn is_built(&self) -> bool {
        self.rects.iter().all(Option::is_some)
    }

    pub fn lookup(&self, pitch: i32) -> Option<KeyRect> {
        let idx = usize::try_from(pitch).ok()?;
        self.rects.get(idx).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, KeyRect)> + '_ {
        self.rects
            .iter()
            .enumerate()
            .filter_map(|(pitch, r)| r.map(|r| (pitch as i32, r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            scale: 17.5,
            left_offset: 14.0,
            canvas_width: 800.0,
            canvas_height: 600.0,
            range: None,
        }
    }

    #[test]
    fn empty_until_rebuilt() {
        let cache = KeyPositionCache::new();
        assert!(!cache.is_built());
        assert_eq!(cache.lookup(60), None);
        assert_eq!(cache.iter().count(), 0);
    }

    #[test]
    fn rebuild_matches_layout_formula() {
        let vp = viewport();
        let mut cache = KeyPositionCache::new();
        cache.rebuild(&vp);
        assert!(cache.is_built());
        for pitch in 0..128 {
            let rect = cache.lookup(pitch).unwrap();
            assert_eq!(rect.x, (keyboard::layout_offset(pitch) - vp.left_offset) * vp.scale);
            assert_eq!(rect.width, keyboard::key_width_units(pitch) * vp.scale);
        }
    }

    #[test]
    fn out_of_range_lookups_miss() {
        let mut cache = KeyPositionCache::new();
        cache.rebuild(&viewport());
        assert_eq!(cache.lookup(-1), None);
        assert_eq!(cache.lookup(128), None);
    }

    #[test]
    fn invalidate_then_rebuild_with_new_viewport() {
        let mut cache = KeyPositionCache::new();
        cache.rebuild(&viewport());
        cache.invalidate();
        assert_eq!(cache.lookup(60), None);

        let wider = Viewport {
            scale: 35.0,
            ..viewport()
        };
        cache.rebuild(&wider);
        let c4 = cache.lookup(60).unwrap();
        assert_eq!(c4.x, (35.0 - 14.0) * 35.0);
        assert_eq!(c4.center_x(), c4.x + 17.5);
        assert_eq!(c4.right(), c4.x + 35.0);
    }
}
