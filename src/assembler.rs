//! Composition of a [`ReportDocument`] from already-fetched inputs.
//!
//! The assembler performs no I/O. Charts arrive through a provider callback and logos as bytes,
//! so the same inputs always produce the same document.

use chrono::NaiveDate;
use log::debug;

use crate::catalog::MetricSpec;
use crate::elements::embed_image;
use crate::error::{ReportError, Result};
use crate::model::{
    AlarmSummary, Block, HeaderBand, HeaderCell, HorizontalAlignment, ImageBlock, MetricSection,
    ReportDocument, TextLine,
};
use crate::richtext::{Emphasis, Span};

/// Title printed at the top of every report.
pub const REPORT_TITLE: &str = "SCL Resource Utilization";

/// Width of the printable area: US Letter minus one inch margins on each side.
pub const USABLE_WIDTH_MM: f64 = 165.1;

/// Display width of each header logo, independent of the source pixel size.
pub const LOGO_WIDTH_MM: f64 = 25.4;

/// Display width of the metric charts.
pub const CHART_WIDTH_MM: f64 = USABLE_WIDTH_MM;

/// Day-month-year format used on the date line and in the footer.
pub const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Rendered chart bytes for one catalog metric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartImage {
    metric: MetricSpec,
    bytes: Vec<u8>,
}

impl ChartImage {
    pub fn new(metric: MetricSpec, bytes: Vec<u8>) -> Self {
        Self { metric, bytes }
    }

    pub fn metric(&self) -> &MetricSpec {
        &self.metric
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Side of the header band a logo is placed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogoPosition {
    Left,
    Right,
}

impl LogoPosition {
    fn alignment(self) -> HorizontalAlignment {
        match self {
            LogoPosition::Left => HorizontalAlignment::Left,
            LogoPosition::Right => HorizontalAlignment::Right,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            LogoPosition::Left => "left logo",
            LogoPosition::Right => "right logo",
        }
    }
}

/// A branding image fetched for the header band.
#[derive(Clone, Debug, PartialEq)]
pub struct LogoAsset {
    position: LogoPosition,
    bytes: Vec<u8>,
    display_width_mm: f64,
}

impl LogoAsset {
    /// Creates a logo rendered at the standard [`LOGO_WIDTH_MM`].
    pub fn new(position: LogoPosition, bytes: Vec<u8>) -> Self {
        Self {
            position,
            bytes,
            display_width_mm: LOGO_WIDTH_MM,
        }
    }

    pub fn position(&self) -> LogoPosition {
        self.position
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn display_width_mm(&self) -> f64 {
        self.display_width_mm
    }
}

/// The left and right header logos.
#[derive(Clone, Debug, PartialEq)]
pub struct LogoPair {
    left: LogoAsset,
    right: LogoAsset,
}

impl LogoPair {
    pub fn new(left_bytes: Vec<u8>, right_bytes: Vec<u8>) -> Self {
        Self {
            left: LogoAsset::new(LogoPosition::Left, left_bytes),
            right: LogoAsset::new(LogoPosition::Right, right_bytes),
        }
    }

    pub fn left(&self) -> &LogoAsset {
        &self.left
    }

    pub fn right(&self) -> &LogoAsset {
        &self.right
    }
}

/// Optional extensions to the standard layout.
#[derive(Clone, Debug, Default)]
pub struct AssemblyOptions {
    /// Alarm table inserted after the instance heading, ahead of the charts.
    pub alarm_summary: Option<AlarmSummary>,
}

/// Formats a date the way it appears in the report, e.g. `05-03-2024`.
pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Assembles the standard report layout.
///
/// See [`assemble_with`] for the ordering and error behaviour.
pub fn assemble<'a, I, P>(
    instance_name: &str,
    metrics: I,
    chart_provider: P,
    logos: LogoPair,
    generated: NaiveDate,
) -> Result<ReportDocument>
where
    I: IntoIterator<Item = &'a MetricSpec>,
    P: FnMut(&MetricSpec) -> Result<ChartImage>,
{
    assemble_with(
        AssemblyOptions::default(),
        instance_name,
        metrics,
        chart_provider,
        logos,
        generated,
    )
}

/// Assembles a report document.
///
/// The body is laid out as title, date line, spacer, instance heading, spacer, the optional
/// alarm table, and one label + chart + spacer group per metric in the order given. The footer
/// reuses `generated`, so header and footer dates always agree.
///
/// The chart provider is invoked once per metric, in order. Its errors are returned unchanged and
/// abort assembly; a document never has a missing or duplicated metric section. Empty or
/// undecodable logo and chart bytes fail with a render error.
pub fn assemble_with<'a, I, P>(
    options: AssemblyOptions,
    instance_name: &str,
    metrics: I,
    mut chart_provider: P,
    logos: LogoPair,
    generated: NaiveDate,
) -> Result<ReportDocument>
where
    I: IntoIterator<Item = &'a MetricSpec>,
    P: FnMut(&MetricSpec) -> Result<ChartImage>,
{
    let header = header_band(logos)?;
    let date = display_date(generated);

    let mut body = vec![
        Block::Text(
            TextLine::new(Span::new(REPORT_TITLE).bold().with_emphasis(Emphasis::Title))
                .with_alignment(HorizontalAlignment::Center),
        ),
        Block::Text(
            TextLine::new(Span::new(format!("Date: {date}")))
                .with_alignment(HorizontalAlignment::Center),
        ),
        Block::Spacer,
        Block::Text(TextLine::new(
            Span::new(instance_name)
                .bold()
                .with_emphasis(Emphasis::Heading),
        )),
        Block::Spacer,
    ];

    if let Some(summary) = options.alarm_summary {
        body.push(Block::AlarmSummary(summary));
        body.push(Block::Spacer);
    }

    for metric in metrics {
        let label = TextLine::new(
            Span::new(metric.label())
                .bold()
                .with_emphasis(Emphasis::Label),
        );
        let chart = chart_provider(metric)?;
        if chart.metric() != metric {
            return Err(ReportError::render(format!(
                "chart provider returned {} when asked for {}",
                chart.metric().identifier(),
                metric.identifier()
            )));
        }
        let what = format!("chart for {}", metric.identifier());
        let image = embed_image(chart.into_bytes(), &what)?;
        debug!("embedded {what} ({}x{} px)", image.pixel_size().0, image.pixel_size().1);

        body.push(Block::Metric(MetricSection::new(
            metric.clone(),
            label,
            ImageBlock::new(image, CHART_WIDTH_MM),
        )));
        body.push(Block::Spacer);
    }

    let footer =
        TextLine::new(Span::new(format!("Generated on {date}")).with_emphasis(Emphasis::Small))
            .with_alignment(HorizontalAlignment::Center);

    Ok(ReportDocument::new(header, body, footer))
}

fn header_band(logos: LogoPair) -> Result<HeaderBand> {
    let cell_width = USABLE_WIDTH_MM / 2.0;
    let LogoPair { left, right } = logos;
    Ok(HeaderBand::new(
        header_cell(left, cell_width)?,
        header_cell(right, cell_width)?,
    ))
}

fn header_cell(logo: LogoAsset, cell_width: f64) -> Result<HeaderCell> {
    let LogoAsset {
        position,
        bytes,
        display_width_mm,
    } = logo;
    let image = embed_image(bytes, position.describe())?;
    let block = ImageBlock::new(image, display_width_mm).with_alignment(position.alignment());
    Ok(HeaderCell::new(block, cell_width))
}
