use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

// Bytes per framebuffer row.
const ROW_BYTES: usize = SCREEN_WIDTH / 8;

/// Monochrome 64x32 display, bit-packed one row per 8 bytes. The MSB of each byte is the
/// leftmost pixel of that byte.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    rows: [[u8; ROW_BYTES]; SCREEN_HEIGHT],
}

impl Framebuffer {
    /// Construct an all-dark framebuffer.
    pub fn new() -> Self {
        Framebuffer {
            rows: [[0; ROW_BYTES]; SCREEN_HEIGHT],
        }
    }

    /// Turn every pixel off.
    pub fn clear(&mut self) {
        for row in self.rows.iter_mut() {
            *row = [0; ROW_BYTES];
        }
    }

    /// Returns true if the pixel at (`x`, `y`) is lit. Out-of-range coordinates are dark.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return false;
        }
        (self.rows[y][x / 8] >> (7 - x % 8)) & 1 != 0
    }

    /// The packed bytes of row `y`, or `None` if `y` is off screen.
    pub fn row(&self, y: usize) -> Option<&[u8; ROW_BYTES]> {
        self.rows.get(y)
    }

    /// All rows, top to bottom.
    pub fn rows(&self) -> &[[u8; ROW_BYTES]; SCREEN_HEIGHT] {
        &self.rows
    }

    /// Returns true if no pixel is lit.
    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(|&b| b == 0))
    }

    /// Draw the screen as text, one line per row, with `on` for lit pixels and `off` for
    /// dark ones.
    pub fn render(&self, on: char, off: char) -> String {
        let mut out = String::with_capacity((SCREEN_WIDTH + 1) * SCREEN_HEIGHT);
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                out.push(if self.pixel(x, y) { on } else { off });
            }
            out.push('\n');
        }
        out
    }

    /// XOR one 8-pixel sprite row into the framebuffer with its leftmost pixel at
    /// (`x`, `y`). `x` and `y` must already be on screen.
    ///
    /// When `clip` is set, pixels past the right edge and rows past the bottom edge are
    /// dropped; otherwise they wrap around to the opposite edge.
    ///
    /// Returns true if any lit pixel was turned off.
    pub fn xor_row(&mut self, x: usize, y: usize, sprite_row: u8, clip: bool) -> bool {
        debug_assert!(x < SCREEN_WIDTH && y < SCREEN_HEIGHT);

        // A sprite row not aligned to a byte straddles two framebuffer bytes.
        let shift = x % 8;
        let first = sprite_row >> shift;
        let second = if shift == 0 {
            0
        } else {
            sprite_row << (8 - shift)
        };

        let column = x / 8;
        let row = &mut self.rows[y];
        let mut collision = row[column] & first != 0;
        row[column] ^= first;

        if second != 0 {
            let next = column + 1;
            let next = if next < ROW_BYTES {
                Some(next)
            } else if clip {
                None
            } else {
                Some(next % ROW_BYTES)
            };

            if let Some(next) = next {
                collision |= row[next] & second != 0;
                row[next] ^= second;
            }
        }

        collision
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer::new()
    }
}

impl fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.render('#', ' '))
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Framebuffer {{")?;
        for row in self.rows.iter() {
            for byte in row.iter() {
                write!(f, "{:08b}", byte)?;
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_row_sets_one_byte() {
        let mut fb = Framebuffer::new();
        assert!(!fb.xor_row(8, 3, 0b1010_0000, true));
        assert_eq!(fb.rows()[3][1], 0b1010_0000);
        assert!(fb.pixel(8, 3));
        assert!(!fb.pixel(9, 3));
        assert!(fb.pixel(10, 3));
    }

    #[test]
    fn unaligned_row_straddles_two_bytes() {
        let mut fb = Framebuffer::new();
        fb.xor_row(4, 0, 0xFF, true);
        assert_eq!(fb.rows()[0][0], 0x0F);
        assert_eq!(fb.rows()[0][1], 0xF0);
    }

    #[test]
    fn xor_twice_restores_and_reports_collision() {
        let mut fb = Framebuffer::new();
        assert!(!fb.xor_row(5, 7, 0xC3, true));
        assert!(fb.xor_row(5, 7, 0xC3, true));
        assert!(fb.is_blank());
    }

    #[test]
    fn right_edge_clips() {
        let mut fb = Framebuffer::new();
        fb.xor_row(60, 0, 0xFF, true);
        assert_eq!(fb.rows()[0][7], 0x0F);
        assert_eq!(fb.rows()[0][0], 0x00);
    }

    #[test]
    fn right_edge_wraps() {
        let mut fb = Framebuffer::new();
        fb.xor_row(60, 0, 0xFF, false);
        assert_eq!(fb.rows()[0][7], 0x0F);
        assert_eq!(fb.rows()[0][0], 0xF0);
        assert!(fb.pixel(0, 0));
        assert!(fb.pixel(63, 0));
    }

    #[test]
    fn clear_blanks_everything() {
        let mut fb = Framebuffer::new();
        fb.xor_row(0, 0, 0xFF, true);
        fb.xor_row(63, 31, 0x80, true);
        fb.clear();
        assert!(fb.is_blank());
    }

    #[test]
    fn display_renders_hash_for_lit_pixels() {
        let mut fb = Framebuffer::new();
        fb.xor_row(0, 0, 0x80, true);
        let text = fb.to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first.len(), SCREEN_WIDTH);
        assert!(first.starts_with("# "));
        assert_eq!(text.lines().count(), SCREEN_HEIGHT);
    }

    #[test]
    fn render_uses_chosen_characters() {
        let mut fb = Framebuffer::new();
        fb.xor_row(62, 31, 0b1000_0000, true);
        let text = fb.render('X', '.');
        let last = text.lines().last().unwrap();
        assert_eq!(&last[60..], "..X.");
        assert!(text.lines().next().unwrap().chars().all(|c| c == '.'));
        assert_eq!(text.matches('X').count(), 1);
    }

    #[test]
    fn row_is_none_off_screen() {
        let mut fb = Framebuffer::new();
        fb.xor_row(0, 31, 0xAA, true);
        assert_eq!(fb.row(31), Some(&[0xAA, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(fb.row(SCREEN_HEIGHT), None);
        assert!(!fb.pixel(0, SCREEN_HEIGHT));
    }
}
