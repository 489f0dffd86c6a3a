//! Draw operations, rasterization and encoding

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use super::glyphs::GlyphBackend;
use crate::config::OutputFormat;
use crate::error::RenderError;

/// One primitive of the table drawing, in paint order
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Inclusive corners; the outline is one pixel wide
    Rect {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        fill: Rgb<u8>,
        outline: Option<Rgb<u8>>,
    },
    Text {
        x: i32,
        y: i32,
        size: f32,
        color: Rgb<u8>,
        text: String,
    },
}

/// Paint `ops` onto a `width` x `height` canvas
pub fn rasterize(
    ops: &[DrawOp],
    width: u32,
    height: u32,
    background: Rgb<u8>,
    glyphs: &dyn GlyphBackend,
) -> Result<RgbImage, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::Canvas(format!("empty canvas {width}x{height}")));
    }

    let mut canvas = RgbImage::from_pixel(width, height, background);
    for op in ops {
        match op {
            DrawOp::Rect {
                x0,
                y0,
                x1,
                y1,
                fill,
                outline,
            } => {
                let rect = inclusive_rect(*x0, *y0, *x1, *y1)?;
                draw_filled_rect_mut(&mut canvas, rect, *fill);
                if let Some(outline) = outline {
                    draw_hollow_rect_mut(&mut canvas, rect, *outline);
                }
            }
            DrawOp::Text {
                x,
                y,
                size,
                color,
                text,
            } => glyphs.draw_text(&mut canvas, *color, *x, *y, *size, text),
        }
    }
    Ok(canvas)
}

fn inclusive_rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Result<Rect, RenderError> {
    let width = u32::try_from(i64::from(x1) - i64::from(x0) + 1).ok().filter(|w| *w > 0);
    let height = u32::try_from(i64::from(y1) - i64::from(y0) + 1).ok().filter(|h| *h > 0);
    match (width, height) {
        (Some(w), Some(h)) => Ok(Rect::at(x0, y0).of_size(w, h)),
        _ => Err(RenderError::Canvas(format!(
            "inverted rectangle ({x0},{y0})-({x1},{y1})"
        ))),
    }
}

/// Compress the canvas; JPEG uses `jpeg_quality`
pub fn encode(canvas: &RgbImage, format: OutputFormat, jpeg_quality: u8) -> Result<Vec<u8>, RenderError> {
    let (width, height) = canvas.dimensions();
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);

    match format {
        OutputFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut cursor, jpeg_quality.clamp(1, 100));
            encoder.encode(canvas, width, height, ColorType::Rgb8)?;
        }
        OutputFormat::Png => {
            PngEncoder::new(&mut cursor).write_image(canvas, width, height, ColorType::Rgb8)?;
        }
    }
    Ok(bytes)
}
