//! Bitmap glyphs for [`FrameBuffer::draw_character`](crate::FrameBuffer::draw_character).
//!
//! A glyph is a flattened, row-major grid of 0/1 cells exactly
//! [`GLYPH_WIDTH`] columns wide. Rows can be as many as the font needs.

/// Columns in every glyph.
pub const GLYPH_WIDTH: usize = 3;

/// Horizontal distance between the origins of consecutive characters in a string.
pub const GLYPH_ADVANCE: i32 = GLYPH_WIDTH as i32 + 1;

/// Source of glyph bitmaps.
pub trait GlyphResolver {
    /// Bitmap for `character`, or `None` if the font has no glyph for it.
    fn resolve(&self, character: char) -> Option<&[u8]>;
}

/// Built-in 3x5 pixel font. Letters are case-insensitive.
#[derive(Clone, Copy, Debug, Default)]
pub struct Font3x5;

impl GlyphResolver for Font3x5 {
    fn resolve(&self, character: char) -> Option<&[u8]> {
        glyph_3x5(character.to_ascii_uppercase()).map(|g| g.as_slice())
    }
}

#[rustfmt::skip]
fn glyph_3x5(character: char) -> Option<&'static [u8; 15]> {
    let glyph = match character {
        'A' => &[0,1,0, 1,0,1, 1,1,1, 1,0,1, 1,0,1],
        'B' => &[1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,1,0],
        'C' => &[0,1,1, 1,0,0, 1,0,0, 1,0,0, 0,1,1],
        'D' => &[1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,1,0],
        'E' => &[1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,1,1],
        'F' => &[1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,0,0],
        'G' => &[0,1,1, 1,0,0, 1,0,1, 1,0,1, 0,1,1],
        'H' => &[1,0,1, 1,0,1, 1,1,1, 1,0,1, 1,0,1],
        'I' => &[1,1,1, 0,1,0, 0,1,0, 0,1,0, 1,1,1],
        'J' => &[0,0,1, 0,0,1, 0,0,1, 1,0,1, 0,1,0],
        'K' => &[1,0,1, 1,0,1, 1,1,0, 1,0,1, 1,0,1],
        'L' => &[1,0,0, 1,0,0, 1,0,0, 1,0,0, 1,1,1],
        'M' => &[1,0,1, 1,1,1, 1,1,1, 1,0,1, 1,0,1],
        'N' => &[1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,0,1],
        'O' => &[0,1,0, 1,0,1, 1,0,1, 1,0,1, 0,1,0],
        'P' => &[1,1,0, 1,0,1, 1,1,0, 1,0,0, 1,0,0],
        'Q' => &[0,1,0, 1,0,1, 1,0,1, 1,1,0, 0,1,1],
        'R' => &[1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,0,1],
        'S' => &[0,1,1, 1,0,0, 0,1,0, 0,0,1, 1,1,0],
        'T' => &[1,1,1, 0,1,0, 0,1,0, 0,1,0, 0,1,0],
        'U' => &[1,0,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1],
        'V' => &[1,0,1, 1,0,1, 1,0,1, 1,0,1, 0,1,0],
        'W' => &[1,0,1, 1,0,1, 1,1,1, 1,1,1, 1,0,1],
        'X' => &[1,0,1, 1,0,1, 0,1,0, 1,0,1, 1,0,1],
        'Y' => &[1,0,1, 1,0,1, 0,1,0, 0,1,0, 0,1,0],
        'Z' => &[1,1,1, 0,0,1, 0,1,0, 1,0,0, 1,1,1],
        '0' => &[1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1],
        '1' => &[0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1],
        '2' => &[1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1],
        '3' => &[1,1,1, 0,0,1, 1,1,1, 0,0,1, 1,1,1],
        '4' => &[1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1],
        '5' => &[1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1],
        '6' => &[1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1],
        '7' => &[1,1,1, 0,0,1, 0,0,1, 0,0,1, 0,0,1],
        '8' => &[1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1],
        '9' => &[1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1],
        ' ' => &[0,0,0, 0,0,0, 0,0,0, 0,0,0, 0,0,0],
        '.' => &[0,0,0, 0,0,0, 0,0,0, 0,0,0, 0,1,0],
        ',' => &[0,0,0, 0,0,0, 0,0,0, 0,1,0, 1,0,0],
        ':' => &[0,0,0, 0,1,0, 0,0,0, 0,1,0, 0,0,0],
        ';' => &[0,0,0, 0,1,0, 0,0,0, 0,1,0, 1,0,0],
        '!' => &[0,1,0, 0,1,0, 0,1,0, 0,0,0, 0,1,0],
        '?' => &[1,1,1, 0,0,1, 0,1,0, 0,0,0, 0,1,0],
        '-' => &[0,0,0, 0,0,0, 1,1,1, 0,0,0, 0,0,0],
        '+' => &[0,0,0, 0,1,0, 1,1,1, 0,1,0, 0,0,0],
        '=' => &[0,0,0, 1,1,1, 0,0,0, 1,1,1, 0,0,0],
        '/' => &[0,0,1, 0,0,1, 0,1,0, 1,0,0, 1,0,0],
        '(' => &[0,0,1, 0,1,0, 0,1,0, 0,1,0, 0,0,1],
        ')' => &[1,0,0, 0,1,0, 0,1,0, 0,1,0, 1,0,0],
        '[' => &[1,1,0, 1,0,0, 1,0,0, 1,0,0, 1,1,0],
        ']' => &[0,1,1, 0,0,1, 0,0,1, 0,0,1, 0,1,1],
        '<' => &[0,0,1, 0,1,0, 1,0,0, 0,1,0, 0,0,1],
        '>' => &[1,0,0, 0,1,0, 0,0,1, 0,1,0, 1,0,0],
        '\'' => &[0,1,0, 0,1,0, 0,0,0, 0,0,0, 0,0,0],
        '"' => &[1,0,1, 1,0,1, 0,0,0, 0,0,0, 0,0,0],
        '_' => &[0,0,0, 0,0,0, 0,0,0, 0,0,0, 1,1,1],
        '*' => &[1,0,1, 0,1,0, 1,0,1, 0,0,0, 0,0,0],
        '%' => &[1,0,1, 0,0,1, 0,1,0, 1,0,0, 1,0,1],
        '#' => &[1,0,1, 1,1,1, 1,0,1, 1,1,1, 1,0,1],
        _ => return None,
    };
    Some(glyph)
}
