//! Data structures describing the logical content of a utilization report.
//!
//! The types in this module form a plain model of the finished report: which lines of text,
//! images and tables appear, in what order, and with which alignment and size. They avoid
//! referencing the rendering crate directly so a document can be assembled and inspected in
//! tests without fonts, and rendered later by [`crate::render`].

use crate::catalog::MetricSpec;
use crate::richtext::{Emphasis, Span};

/// Horizontal placement of text and images.
///
/// The variants map directly to [`genpdf::Alignment`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// Left aligned content.
    #[default]
    Left,
    /// Center aligned content.
    Center,
    /// Right aligned content.
    Right,
}

/// A single styled line of text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextLine {
    span: Span,
    alignment: HorizontalAlignment,
}

impl TextLine {
    /// Creates a left aligned line from the provided span.
    pub fn new(span: Span) -> Self {
        Self {
            span,
            alignment: HorizontalAlignment::Left,
        }
    }

    /// Returns the styled span.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Returns the raw text of the line.
    pub fn text(&self) -> &str {
        self.span.text()
    }

    /// Returns whether the line is bold.
    pub fn is_bold(&self) -> bool {
        self.span.is_bold()
    }

    /// Returns the emphasis level of the line.
    pub fn emphasis(&self) -> Emphasis {
        self.span.emphasis()
    }

    /// Returns the configured alignment.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Sets the alignment and returns the updated line.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// Image bytes that have already been decoded once and are known to be valid.
///
/// The document owns the bytes, so a report never refers back to temporary files or remote
/// objects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedImage {
    bytes: Vec<u8>,
    pixel_width: u32,
    pixel_height: u32,
}

impl EmbeddedImage {
    pub(crate) fn new(bytes: Vec<u8>, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            bytes,
            pixel_width,
            pixel_height,
        }
    }

    /// Returns the encoded image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the source dimensions in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.pixel_width, self.pixel_height)
    }
}

/// An embedded image with its placement.
///
/// The width is stored in millimetres so it maps straight onto the scaling applied by
/// [`crate::elements::ScaledImage`]. The height follows from the aspect ratio; images are scaled,
/// never cropped.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBlock {
    image: EmbeddedImage,
    alignment: HorizontalAlignment,
    width_mm: f64,
}

impl ImageBlock {
    /// Creates a left aligned image block rendered at `width_mm`.
    pub fn new(image: EmbeddedImage, width_mm: f64) -> Self {
        Self {
            image,
            alignment: HorizontalAlignment::Left,
            width_mm,
        }
    }

    /// Returns the embedded image.
    pub fn image(&self) -> &EmbeddedImage {
        &self.image
    }

    /// Returns the configured alignment.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Returns the rendered width in millimetres.
    pub fn width_mm(&self) -> f64 {
        self.width_mm
    }

    /// Sets the alignment and returns the updated image block.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// One borderless cell of the header band.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderCell {
    logo: ImageBlock,
    width_mm: f64,
}

impl HeaderCell {
    pub fn new(logo: ImageBlock, width_mm: f64) -> Self {
        Self { logo, width_mm }
    }

    pub fn logo(&self) -> &ImageBlock {
        &self.logo
    }

    pub fn width_mm(&self) -> f64 {
        self.width_mm
    }
}

/// Two-cell logo band repeated at the top of every page.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderBand {
    left: HeaderCell,
    right: HeaderCell,
}

impl HeaderBand {
    pub fn new(left: HeaderCell, right: HeaderCell) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &HeaderCell {
        &self.left
    }

    pub fn right(&self) -> &HeaderCell {
        &self.right
    }

    /// Returns the cells from left to right. A header band always has exactly two.
    pub fn cells(&self) -> [&HeaderCell; 2] {
        [&self.left, &self.right]
    }

    /// Total width spanned by the band.
    pub fn width_mm(&self) -> f64 {
        self.left.width_mm + self.right.width_mm
    }
}

/// Label and chart for a single catalog metric.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricSection {
    metric: MetricSpec,
    label: TextLine,
    chart: ImageBlock,
}

impl MetricSection {
    pub fn new(metric: MetricSpec, label: TextLine, chart: ImageBlock) -> Self {
        Self {
            metric,
            label,
            chart,
        }
    }

    pub fn metric(&self) -> &MetricSpec {
        &self.metric
    }

    pub fn label(&self) -> &TextLine {
        &self.label
    }

    pub fn chart(&self) -> &ImageBlock {
        &self.chart
    }
}

/// Alarm names configured for one metric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlarmRow {
    label: String,
    alarms: Vec<String>,
}

impl AlarmRow {
    pub fn new(label: impl Into<String>, alarms: Vec<String>) -> Self {
        Self {
            label: label.into(),
            alarms,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn alarms(&self) -> &[String] {
        &self.alarms
    }

    /// Text shown in the alarms column: a comma separated list, or `No alarms`.
    pub fn alarms_cell(&self) -> String {
        if self.alarms.is_empty() {
            "No alarms".to_string()
        } else {
            self.alarms.join(", ")
        }
    }
}

/// Optional "Metric / Alarms" table shown ahead of the charts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlarmSummary {
    rows: Vec<AlarmRow>,
}

impl AlarmSummary {
    pub fn new(rows: Vec<AlarmRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[AlarmRow] {
        &self.rows
    }
}

/// Individual content blocks that make up the report body.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// A line of styled text.
    Text(TextLine),
    /// An empty separator line.
    Spacer,
    /// Alarm overview table.
    AlarmSummary(AlarmSummary),
    /// Label plus chart for one metric.
    Metric(MetricSection),
}

/// A fully assembled, self-contained report.
///
/// A document always has exactly one header band and one footer; the body holds the remaining
/// blocks in display order. Values are produced by [`crate::assembler::assemble`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReportDocument {
    header: HeaderBand,
    body: Vec<Block>,
    footer: TextLine,
}

impl ReportDocument {
    pub(crate) fn new(header: HeaderBand, body: Vec<Block>, footer: TextLine) -> Self {
        Self {
            header,
            body,
            footer,
        }
    }

    /// Returns the logo band printed on every page.
    pub fn header(&self) -> &HeaderBand {
        &self.header
    }

    /// Returns the body blocks in display order.
    pub fn blocks(&self) -> &[Block] {
        &self.body
    }

    /// Returns the footer line printed on every page.
    pub fn footer(&self) -> &TextLine {
        &self.footer
    }

    /// Iterates over the metric sections in display order.
    pub fn metric_sections(&self) -> impl Iterator<Item = &MetricSection> {
        self.body.iter().filter_map(|block| match block {
            Block::Metric(section) => Some(section),
            _ => None,
        })
    }

    /// Iterates over the text lines of the body in display order.
    pub fn text_lines(&self) -> impl Iterator<Item = &TextLine> {
        self.body.iter().filter_map(|block| match block {
            Block::Text(line) => Some(line),
            _ => None,
        })
    }

    /// Returns the alarm summary, if the document carries one.
    pub fn alarm_summary(&self) -> Option<&AlarmSummary> {
        self.body.iter().find_map(|block| match block {
            Block::AlarmSummary(summary) => Some(summary),
            _ => None,
        })
    }
}
