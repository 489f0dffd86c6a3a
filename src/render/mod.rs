//! Table image rendering
//!
//! Rendering is split in two: [`TableRenderer::plan`] turns the title,
//! dataset and registry into a list of [`DrawOp`]s, and [`TableRenderer::render`]
//! rasterizes and encodes that plan. Both are pure functions of their inputs
//! and the glyph backend, so the same inputs give byte-identical images.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::config::{OutputFormat, RenderConfig};
use crate::error::RenderError;
use crate::models::{LocationRegistry, WeatherDataset};

pub mod canvas;
pub mod glyphs;
pub mod layout;

pub use canvas::DrawOp;
pub use glyphs::{BlockGlyphs, GlyphBackend, RusttypeGlyphs};
pub use layout::{ColumnKind, ColumnSpec, LayoutMetrics, TableLayout, TableSchema, centered_x};

use layout::{BLACK, HEADER_FILL, WHITE};

/// Encoded image and its format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

impl RenderedImage {
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

impl OutputFormat {
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// `"<prefix> (Atualizado em dd/mm/YYYY HH:MM:SS)"` in the given zone
#[must_use]
pub fn format_title(prefix: &str, acquired_at: DateTime<Utc>, tz: Tz) -> String {
    let local = acquired_at.with_timezone(&tz);
    format!("{prefix} (Atualizado em {})", local.format("%d/%m/%Y %H:%M:%S"))
}

#[derive(Clone)]
pub struct TableRenderer {
    schema: TableSchema,
    metrics: LayoutMetrics,
    glyphs: Arc<dyn GlyphBackend>,
    font_size: f32,
    header_font_size: f32,
    format: OutputFormat,
    jpeg_quality: u8,
}

impl std::fmt::Debug for TableRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRenderer")
            .field("schema", &self.schema)
            .field("font_size", &self.font_size)
            .field("header_font_size", &self.header_font_size)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl TableRenderer {
    pub fn new(glyphs: Arc<dyn GlyphBackend>, schema: TableSchema) -> Self {
        Self {
            schema,
            metrics: LayoutMetrics::default(),
            glyphs,
            font_size: 20.0,
            header_font_size: 22.0,
            format: OutputFormat::Jpeg,
            jpeg_quality: 75,
        }
    }

    pub fn from_config(config: &RenderConfig, glyphs: Arc<dyn GlyphBackend>) -> Self {
        Self::new(glyphs, TableSchema::from_kind(config.schema))
            .with_font_sizes(config.font_size, config.header_font_size)
            .with_format(config.format, config.jpeg_quality)
    }

    #[must_use]
    pub fn with_font_sizes(mut self, body: f32, header: f32) -> Self {
        self.font_size = body;
        self.header_font_size = header;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: OutputFormat, jpeg_quality: u8) -> Self {
        self.format = format;
        self.jpeg_quality = jpeg_quality;
        self
    }

    #[must_use]
    pub fn layout(&self, row_count: usize) -> TableLayout {
        TableLayout::new(&self.schema, row_count, self.metrics)
    }

    /// Draw operations for the whole table, in paint order
    #[must_use]
    pub fn plan(&self, title: &str, dataset: &WeatherDataset, registry: &LocationRegistry) -> Vec<DrawOp> {
        let layout = self.layout(registry.len());
        let metrics = &layout.metrics;
        let columns = self.schema.columns();
        let mut ops = Vec::with_capacity(2 + columns.len() * (registry.len() + 1) + registry.len());

        ops.push(DrawOp::Text {
            x: metrics.margin,
            y: metrics.title_y,
            size: self.font_size,
            color: BLACK,
            text: title.to_string(),
        });

        let header_top = layout.header_top();
        ops.push(DrawOp::Rect {
            x0: metrics.margin,
            y0: header_top,
            x1: layout.table_right(),
            y1: header_top + metrics.header_height,
            fill: HEADER_FILL,
            outline: Some(BLACK),
        });
        for (i, column) in columns.iter().enumerate() {
            let width = self.glyphs.text_width(&column.header, self.header_font_size);
            ops.push(DrawOp::Text {
                x: centered_x(layout.column_starts[i], layout.column_widths[i], width),
                y: header_top + metrics.header_text_offset,
                size: self.header_font_size,
                color: WHITE,
                text: column.header.clone(),
            });
        }

        for (row, location) in registry.iter().enumerate() {
            let record = dataset.record_or_unavailable(&location.key);
            let top = layout.row_top(row);

            ops.push(DrawOp::Rect {
                x0: metrics.margin,
                y0: top,
                x1: layout.table_right(),
                y1: top + metrics.row_height,
                fill: TableLayout::row_fill(row),
                outline: Some(BLACK),
            });

            for (i, column) in columns.iter().enumerate() {
                let text = column.kind.cell(location, &record);
                if text.is_empty() {
                    continue;
                }
                let start = layout.column_starts[i];
                let x = if column.kind.is_free_text() {
                    start + metrics.cell_inset
                } else {
                    let width = self.glyphs.text_width(text, self.font_size);
                    centered_x(start, layout.column_widths[i], width)
                };
                ops.push(DrawOp::Text {
                    x,
                    y: top + metrics.row_text_offset,
                    size: self.font_size,
                    color: BLACK,
                    text: text.to_string(),
                });
            }
        }

        ops
    }

    /// Rasterize and encode the table. Missing data never fails; only
    /// drawing or encoding problems do.
    pub fn render(
        &self,
        title: &str,
        dataset: &WeatherDataset,
        registry: &LocationRegistry,
    ) -> Result<RenderedImage, RenderError> {
        if self.schema.columns().is_empty() {
            return Err(RenderError::Canvas("schema has no columns".to_string()));
        }

        let layout = self.layout(registry.len());
        let ops = self.plan(title, dataset, registry);
        let canvas = canvas::rasterize(&ops, layout.width, layout.height, WHITE, self.glyphs.as_ref())?;
        let bytes = canvas::encode(&canvas, self.format, self.jpeg_quality)?;

        debug!(
            width = layout.width,
            height = layout.height,
            bytes = bytes.len(),
            "Rendered weather table"
        );
        Ok(RenderedImage {
            bytes,
            format: self.format,
        })
    }
}
