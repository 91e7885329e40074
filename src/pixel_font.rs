//! Minimal 5x7 pixel font used by the software raster for key labels and the HUD.
//!
//! Only the glyphs we draw are included: note names, digits and a few HUD letters.

pub const GLYPH_W: i32 = 5;
pub const GLYPH_H: i32 = 7;

pub fn glyph_5x7(ch: char) -> [u8; 7] {
    match ch {
        // Notes
        'A' => [
            0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001,
        ],
        'B' => [
            0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110,
        ],
        'C' => [
            0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110,
        ],
        'D' => [
            0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110,
        ],
        'E' => [
            0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111,
        ],
        'F' => [
            0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000,
        ],
        'G' => [
            0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110,
        ],
        '#' => [
            0b01010, 0b11111, 0b01010, 0b01010, 0b11111, 0b01010, 0b01010,
        ],

        // HUD
        'P' => [
            0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000,
        ],
        'S' => [
            0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110,
        ],
        'U' => [
            0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110,
        ],
        'W' => [
            0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001,
        ],

        '0' => [
            0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110,
        ],
        '1' => [
            0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110,
        ],
        '2' => [
            0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111,
        ],
        '3' => [
            0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110,
        ],
        '4' => [
            0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010,
        ],
        '5' => [
            0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110,
        ],
        '6' => [
            0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110,
        ],
        '7' => [
            0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000,
        ],
        '8' => [
            0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110,
        ],
        '9' => [
            0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100,
        ],

        // Separators
        ':' => [
            0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000,
        ],
        '/' => [
            0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000,
        ],
        '.' => [
            0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100,
        ],
        '-' => [
            0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000,
        ],
        ' ' => [0; 7],
        _ => [0; 7],
    }
}

/// Width in pixels of `text` drawn with `cell`-sized font pixels.
pub fn text_width(text: &str, cell: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 {
        return 0;
    }
    n * GLYPH_W * cell + (n - 1) * cell
}

pub fn text_height(cell: i32) -> i32 {
    GLYPH_H * cell
}

/// Blits `text` into a row-major `0x00RRGGBB` buffer, clipping at the edges.
/// Each font pixel becomes a `cell` x `cell` square; `bold` doubles strokes one pixel right.
pub fn draw_text(
    pixels: &mut [u32],
    w: usize,
    h: usize,
    x_left: i32,
    y_top: i32,
    text: &str,
    color: u32,
    cell: i32,
    bold: bool,
) {
    let cell = cell.max(1);
    let extra = if bold { 1 } else { 0 };

    let mut x = x_left;
    for ch in text.chars() {
        let g = glyph_5x7(ch);
        for (row, bits) in g.iter().enumerate() {
            for col in 0..GLYPH_W {
                if (bits & (1 << (GLYPH_W - 1 - col))) == 0 {
                    continue;
                }

                let x0 = x + col * cell;
                let x1 = x0 + cell + extra;
                let y0 = y_top + row as i32 * cell;
                let y1 = y0 + cell;

                for py in y0.max(0)..y1.min(h as i32) {
                    for px in x0.max(0)..x1.min(w as i32) {
                        pixels[py as usize * w + px as usize] = color;
                    }
                }
            }
        }
        x += GLYPH_W * cell + cell;
    }
}
