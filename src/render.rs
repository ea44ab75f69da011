//! Serialization of an assembled [`ReportDocument`] into publishable bytes.

use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::error::{Error, ErrorKind};
use genpdf::style::Style;
use genpdf::{Element, Margins, PaperSize};
use log::debug;

use crate::assembler::REPORT_TITLE;
use crate::builder::DocumentBuilder;
use crate::elements::{prepare_image, to_genpdf_alignment, ScaledImage};
use crate::error::{ReportError, Result};
use crate::model::{AlarmSummary, Block, HeaderCell, MetricSection, ReportDocument, TextLine};
use crate::richtext::Emphasis;

const PAGE_MARGIN_MM: f64 = 25.4;
const HEADER_GAP_MM: f64 = 4.0;
const FOOTER_HEIGHT_MM: f64 = 10.0;
const TABLE_CELL_PADDING_MM: f64 = 1.0;

/// Turns a report document into the bytes of a publishable file.
pub trait DocumentRenderer {
    /// Serializes the document.
    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>>;

    /// File extension of the produced format, without the dot.
    fn extension(&self) -> &str;
}

impl<T: DocumentRenderer + ?Sized> DocumentRenderer for &T {
    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        (**self).render(document)
    }

    fn extension(&self) -> &str {
        (**self).extension()
    }
}

/// Renders reports as US Letter PDF pages with one inch margins.
///
/// The logo band and footer line are drawn on every page by the page decorator; the body
/// blocks flow across pages in document order.
#[derive(Clone, Debug, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        let footer = document.footer().clone();
        let mut pdf = DocumentBuilder::new()
            .with_title(REPORT_TITLE)
            .with_paper_size(PaperSize::Letter)
            .with_margins(Margins::all(PAGE_MARGIN_MM))
            .with_font_size(Emphasis::Body.font_size())
            .with_header(HEADER_GAP_MM, header_factory(document)?)
            .with_footer(FOOTER_HEIGHT_MM, move |_| Ok(paragraph(&footer)))
            .build()?;

        for block in document.blocks() {
            match block {
                Block::Text(line) => pdf.push(paragraph(line)),
                Block::Spacer => pdf.push(Break::new(1)),
                Block::AlarmSummary(summary) => pdf.push(alarm_table(summary)?),
                Block::Metric(section) => push_metric(&mut pdf, section)?,
            }
        }

        let mut bytes = Vec::new();
        pdf.render(&mut bytes)?;
        debug!("rendered report PDF ({} bytes)", bytes.len());
        Ok(bytes)
    }

    fn extension(&self) -> &str {
        "pdf"
    }
}

fn paragraph(line: &TextLine) -> Paragraph {
    Paragraph::new(line.span().to_styled_string()).aligned(to_genpdf_alignment(line.alignment()))
}

fn push_metric(pdf: &mut genpdf::Document, section: &MetricSection) -> Result<()> {
    pdf.push(paragraph(section.label()));
    let chart = section.chart();
    let image = ScaledImage::from_embedded(chart.image(), chart.width_mm())?
        .with_alignment(to_genpdf_alignment(chart.alignment()));
    pdf.push(image);
    Ok(())
}

/// Builds the per-page logo band: a borderless two column table with equal column weights.
fn header_factory(
    document: &ReportDocument,
) -> Result<impl Fn(usize) -> std::result::Result<TableLayout, Error> + 'static> {
    let [left, right] = document.header().cells();
    let left = PreparedLogo::new(left)?;
    let right = PreparedLogo::new(right)?;

    Ok(move |_page: usize| {
        let mut table = TableLayout::new(vec![1, 1]);
        table
            .row()
            .element(left.element()?)
            .element(right.element()?)
            .push()?;
        Ok(table)
    })
}

struct PreparedLogo {
    pixels: image::DynamicImage,
    width_mm: f64,
    alignment: genpdf::Alignment,
}

impl PreparedLogo {
    fn new(cell: &HeaderCell) -> Result<Self> {
        let logo = cell.logo();
        Ok(Self {
            pixels: prepare_image(logo.image())?,
            width_mm: logo.width_mm().min(cell.width_mm()),
            alignment: to_genpdf_alignment(logo.alignment()),
        })
    }

    fn element(&self) -> std::result::Result<ScaledImage, Error> {
        ScaledImage::new(self.pixels.clone(), self.width_mm)
            .map(|image| image.with_alignment(self.alignment))
            .map_err(|err| Error::new(err.to_string(), ErrorKind::InvalidData))
    }
}

fn alarm_table(summary: &AlarmSummary) -> Result<TableLayout> {
    let mut table = TableLayout::new(vec![1, 2]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let bold = Style::new().bold();
    table
        .row()
        .element(Paragraph::new("Metric").styled(bold).padded(TABLE_CELL_PADDING_MM))
        .element(Paragraph::new("Alarms").styled(bold).padded(TABLE_CELL_PADDING_MM))
        .push()
        .map_err(table_error)?;

    for row in summary.rows() {
        table
            .row()
            .element(Paragraph::new(row.label()).padded(TABLE_CELL_PADDING_MM))
            .element(Paragraph::new(row.alarms_cell()).padded(TABLE_CELL_PADDING_MM))
            .push()
            .map_err(table_error)?;
    }

    Ok(table)
}

fn table_error(err: Error) -> ReportError {
    ReportError::render(format!("failed to build alarm table: {err}"))
}
