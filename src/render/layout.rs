//! Table geometry: column schemas, canvas size and text placement

use image::Rgb;

use crate::config::SchemaKind;
use crate::models::{Location, WeatherRecord};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const HEADER_FILL: Rgb<u8> = Rgb([0x4C, 0x9E, 0xD9]);
/// Background of rows 0, 2, 4, ...
pub const ROW_FILL_EVEN: Rgb<u8> = Rgb([0xF4, 0xF4, 0xF4]);
/// Background of rows 1, 3, 5, ...
pub const ROW_FILL_ODD: Rgb<u8> = Rgb([0xE0, 0xE0, 0xE0]);

/// What a column shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    GroupLabel,
    DisplayName,
    Temperature,
    Condition,
    Humidity,
    WindSpeed,
    RainProbability,
}

impl ColumnKind {
    /// Free-text columns are left-aligned, data columns centered
    #[must_use]
    pub fn is_free_text(self) -> bool {
        matches!(self, Self::GroupLabel | Self::DisplayName)
    }

    /// Cell text for one row; unavailable fields read `"N/D"`
    #[must_use]
    pub fn cell<'a>(self, location: &'a Location, record: &'a WeatherRecord) -> &'a str {
        match self {
            Self::GroupLabel => &location.group_label,
            Self::DisplayName => &location.display_name,
            Self::Temperature => record.temperature.as_str(),
            Self::Condition => record.condition.as_str(),
            Self::Humidity => record.humidity.as_str(),
            Self::WindSpeed => record.wind_speed.as_str(),
            Self::RainProbability => record.rain_probability.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub header: String,
    pub width: u32,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(header: impl Into<String>, width: u32, kind: ColumnKind) -> Self {
        Self {
            header: header.into(),
            width,
            kind,
        }
    }
}

/// Ordered columns of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    #[must_use]
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// Seven columns: group, place and all five weather fields
    #[must_use]
    pub fn full() -> Self {
        Self::new(vec![
            ColumnSpec::new("MINA", 450, ColumnKind::GroupLabel),
            ColumnSpec::new("CIDADE", 320, ColumnKind::DisplayName),
            ColumnSpec::new("TEMPERATURA", 140, ColumnKind::Temperature),
            ColumnSpec::new("CONDIÇÃO", 350, ColumnKind::Condition),
            ColumnSpec::new("UMIDADE", 70, ColumnKind::Humidity),
            ColumnSpec::new("VENTO", 155, ColumnKind::WindSpeed),
            ColumnSpec::new("PROBAB. CHUVA", 185, ColumnKind::RainProbability),
        ])
    }

    /// Three columns: group, place and rain probability
    #[must_use]
    pub fn rain() -> Self {
        Self::new(vec![
            ColumnSpec::new("MINA", 500, ColumnKind::GroupLabel),
            ColumnSpec::new("CORREDOR SUDESTE", 350, ColumnKind::DisplayName),
            ColumnSpec::new("PROBABILIDADE DE CHUVA", 250, ColumnKind::RainProbability),
        ])
    }

    #[must_use]
    pub fn from_kind(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::Full => Self::full(),
            SchemaKind::Rain => Self::rain(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    #[must_use]
    pub fn total_width(&self) -> u32 {
        self.columns.iter().map(|c| c.width).sum()
    }
}

/// Fixed pixel constants of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    /// Left/right margin and title x
    pub margin: i32,
    pub title_y: i32,
    /// Top edge of the header band
    pub table_top: i32,
    pub header_height: i32,
    pub row_height: i32,
    /// Height added below the rows, covering the title area and bottom margin
    pub padding: i32,
    pub header_text_offset: i32,
    pub row_text_offset: i32,
    /// Left inset of free-text cells
    pub cell_inset: i32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            margin: 10,
            title_y: 10,
            table_top: 50,
            header_height: 60,
            row_height: 40,
            padding: 63,
            header_text_offset: 15,
            row_text_offset: 10,
            cell_inset: 10,
        }
    }
}

/// Geometry derived from a schema, metrics and the row count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub metrics: LayoutMetrics,
    pub column_starts: Vec<i32>,
    pub column_widths: Vec<i32>,
    pub row_count: usize,
    pub width: u32,
    pub height: u32,
}

impl TableLayout {
    #[must_use]
    pub fn new(schema: &TableSchema, row_count: usize, metrics: LayoutMetrics) -> Self {
        let column_widths: Vec<i32> = schema
            .columns()
            .iter()
            .map(|c| i32::try_from(c.width).unwrap_or(i32::MAX))
            .collect();

        let column_starts = column_widths
            .iter()
            .scan(metrics.margin, |x, width| {
                let start = *x;
                *x = x.saturating_add(*width);
                Some(start)
            })
            .collect();

        let rows = i32::try_from(row_count).unwrap_or(i32::MAX);
        let width = 2 * i64::from(metrics.margin) + i64::from(schema.total_width());
        let height = i64::from(metrics.header_height)
            + i64::from(rows) * i64::from(metrics.row_height)
            + i64::from(metrics.padding);

        Self {
            metrics,
            column_starts,
            column_widths,
            row_count,
            width: u32::try_from(width).unwrap_or(0),
            height: u32::try_from(height).unwrap_or(0),
        }
    }

    /// Right edge (inclusive) of the header band and rows
    #[must_use]
    pub fn table_right(&self) -> i32 {
        i32::try_from(self.width).unwrap_or(i32::MAX) - self.metrics.margin
    }

    #[must_use]
    pub fn header_top(&self) -> i32 {
        self.metrics.table_top
    }

    #[must_use]
    pub fn row_top(&self, row: usize) -> i32 {
        let row = i32::try_from(row).unwrap_or(i32::MAX);
        self.metrics.table_top + self.metrics.header_height + row * self.metrics.row_height
    }

    /// Fill color for a row, alternating by parity
    #[must_use]
    pub fn row_fill(row: usize) -> Rgb<u8> {
        if row % 2 == 0 { ROW_FILL_EVEN } else { ROW_FILL_ODD }
    }
}

/// x at which `text_width` pixels of text sit centered in the column.
///
/// Floor division, so text wider than its column overflows one pixel more
/// to the left than to the right.
#[must_use]
pub fn centered_x(column_start: i32, column_width: i32, text_width: i32) -> i32 {
    column_start + (column_width - text_width).div_euclid(2)
}
