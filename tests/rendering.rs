//! Rendering tests need a font family: the bundled Roboto files under `assets/fonts` (or the
//! directory named by `REPORT_FONTS_DIR`), or a system Liberation Sans / DejaVu Sans install.
//! Without one they print a notice and return early.

use std::io::Cursor;

use chrono::NaiveDate;
use genpdf::elements::{Break, Paragraph};
use genpdf::{Alignment, Margins, PaperSize};
use resource_report::builder::DocumentBuilder;
use resource_report::model::{AlarmRow, AlarmSummary};
use resource_report::{
    assemble, assemble_with, fonts, AssemblyOptions, ChartImage, DocumentRenderer, LogoPair,
    MetricCatalog, PdfRenderer,
};
use sha2::{Digest, Sha256};

const SKIP_HINT: &str = "no fonts found. Set REPORT_FONTS_DIR, copy assets/fonts next to the \
     binary, or install Liberation Sans or DejaVu Sans.";

fn png(width: u32, height: u32, alpha: bool) -> Vec<u8> {
    let mut bytes = Vec::new();
    let image = if alpha {
        image::DynamicImage::ImageRgba8(image::ImageBuffer::from_fn(width, height, |x, y| {
            image::Rgba([(x % 255) as u8, (y % 255) as u8, 40, 128])
        }))
    } else {
        image::DynamicImage::ImageRgb8(image::ImageBuffer::from_fn(width, height, |x, y| {
            image::Rgb([(x % 255) as u8, 200, (y % 255) as u8])
        }))
    };
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .expect("encode png");
    bytes
}

fn report_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date")
}

fn render_sample_report() -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let document = assemble(
        "PRD_S4H_SCL_APP",
        &MetricCatalog::default(),
        |metric| Ok(ChartImage::new(metric.clone(), png(220, 60, false))),
        LogoPair::new(png(64, 32, true), png(48, 48, false)),
        report_date(),
    )
    .expect("assemble sample report");

    let bytes = PdfRenderer::new()
        .render(&document)
        .expect("render sample report");
    Some(bytes)
}

/// Renders text-only pages through the report page furniture.
///
/// Embedded images are written in an unspecified object order, so byte-level comparisons use
/// a document without them.
fn render_text_pages() -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let mut pdf = DocumentBuilder::new()
        .with_title("SCL Resource Utilization")
        .with_paper_size(PaperSize::Letter)
        .with_margins(Margins::all(25.4))
        .with_font_size(11)
        .with_header(4.0, |page| {
            Ok(Paragraph::new(format!("Header {page}")).aligned(Alignment::Center))
        })
        .with_footer(10.0, |_| {
            Ok(Paragraph::new("Generated on 05-03-2024").aligned(Alignment::Center))
        })
        .build()
        .expect("build document");
    for index in 0..80 {
        pdf.push(Paragraph::new(format!("Metric line {index}")));
        pdf.push(Break::new(1));
    }

    let mut bytes = Vec::new();
    pdf.render(&mut bytes).expect("render text pages");
    Some(bytes)
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|window| *window == needle)
        .count()
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if !data[index..].starts_with(tag) {
                index += 1;
                continue;
            }
            let mut cursor = index + tag.len();
            while cursor < data.len() && data[cursor] != terminator {
                if terminator == b')' || !matches!(data[cursor], b'<' | b'>' | b' ' | b'\n') {
                    data[cursor] = b'0';
                }
                cursor += 1;
            }
            index = cursor;
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while let Some(start_pos) = data[offset..]
            .windows(start.len())
            .position(|window| window == start)
        {
            let begin = offset + start_pos + start.len();
            let Some(end_pos) = data[begin..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[begin..begin + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n') {
                    *byte = b'0';
                }
            }
            offset = begin + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    let dated: [&[u8]; 3] = [b"/CreationDate(", b"/ModDate(", b"/Producer("];
    for tag in dated {
        scrub_segment(&mut normalized, tag, b')');
    }
    scrub_segment(&mut normalized, b"/ID[", b']');
    let xmp: [(&[u8], &[u8]); 6] = [
        (b"<xmp:CreateDate>", b"</xmp:CreateDate>"),
        (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
        (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
        (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
        (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
        (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
    ];
    for (start, end) in xmp {
        scrub_xml(&mut normalized, start, end);
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn renders_pdf_document() {
    let Some(bytes) = render_sample_report() else {
        eprintln!("Skipping renders_pdf_document: {SKIP_HINT}");
        return;
    };
    assert!(bytes.starts_with(b"%PDF-"), "output should be a PDF file");
    assert!(
        count(&bytes, b"/Subtype/Image") + count(&bytes, b"/Subtype /Image") >= 6,
        "both logos and all four charts should be embedded"
    );
}

#[test]
fn report_renders_are_the_same_size() {
    let (Some(bytes_a), Some(bytes_b)) = (render_sample_report(), render_sample_report()) else {
        eprintln!("Skipping report_renders_are_the_same_size: {SKIP_HINT}");
        return;
    };
    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
}

#[test]
fn rendering_is_deterministic() {
    let (Some(bytes_a), Some(bytes_b)) = (render_text_pages(), render_text_pages()) else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_HINT}");
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn renders_alarm_summary_table() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping renders_alarm_summary_table: {SKIP_HINT}");
        return;
    }

    let catalog = MetricCatalog::default();
    let rows = catalog
        .iter()
        .map(|metric| AlarmRow::new(metric.label(), Vec::new()))
        .collect();
    let document = assemble_with(
        AssemblyOptions {
            alarm_summary: Some(AlarmSummary::new(rows)),
        },
        "PRD_S4H_SCL_APP",
        &catalog,
        |metric| Ok(ChartImage::new(metric.clone(), png(220, 60, true))),
        LogoPair::new(png(64, 32, false), png(48, 48, false)),
        report_date(),
    )
    .expect("assemble report with alarms");

    let bytes = PdfRenderer::new()
        .render(&document)
        .expect("render report with alarms");
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn pdf_renderer_names_pdf_extension() {
    assert_eq!(PdfRenderer::new().extension(), "pdf");
}
