//! Text measurement and drawing backends

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};

use crate::error::RenderError;

/// Measures and draws strings at a pixel size
pub trait GlyphBackend: Send + Sync {
    /// Rendered width of `text` in pixels
    fn text_width(&self, text: &str, size: f32) -> i32;

    /// Draw `text` with its top-left corner at (x, y)
    fn draw_text(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, size: f32, text: &str);
}

/// TrueType font rendered through `rusttype`
pub struct RusttypeGlyphs {
    font: Font<'static>,
}

impl std::fmt::Debug for RusttypeGlyphs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RusttypeGlyphs")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl RusttypeGlyphs {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RenderError> {
        let font = Font::try_from_vec(data)
            .ok_or_else(|| RenderError::Font("not a valid TrueType/OpenType font".to_string()))?;
        Ok(Self { font })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| RenderError::Font(format!("cannot read {}: {e}", path.display())))?;
        Self::from_bytes(data)
    }
}

impl GlyphBackend for RusttypeGlyphs {
    fn text_width(&self, text: &str, size: f32) -> i32 {
        text_size(Scale::uniform(size), &self.font, text).0
    }

    fn draw_text(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, size: f32, text: &str) {
        draw_text_mut(canvas, color, x, y, Scale::uniform(size), &self.font, text);
    }
}

/// Fixed-advance backend that draws each visible character as a solid block.
///
/// Needs no font file and its metrics are exact, which makes output
/// reproducible across machines.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockGlyphs;

impl BlockGlyphs {
    /// Horizontal advance per character
    #[must_use]
    pub fn advance(size: f32) -> i32 {
        ((size * 0.6) as i32).max(2)
    }

    #[must_use]
    pub fn block_height(size: f32) -> u32 {
        ((size * 0.7) as u32).max(1)
    }
}

impl GlyphBackend for BlockGlyphs {
    fn text_width(&self, text: &str, size: f32) -> i32 {
        let chars = i32::try_from(text.chars().count()).unwrap_or(i32::MAX);
        chars.saturating_mul(Self::advance(size))
    }

    fn draw_text(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, size: f32, text: &str) {
        let advance = Self::advance(size);
        let block_width = u32::try_from(advance - 1).unwrap_or(1).max(1);
        let block_height = Self::block_height(size);

        let mut pen = x;
        for ch in text.chars() {
            if !ch.is_whitespace() {
                draw_filled_rect_mut(
                    canvas,
                    Rect::at(pen, y).of_size(block_width, block_height),
                    color,
                );
            }
            pen = pen.saturating_add(advance);
        }
    }
}
