//! Element implementations and image helpers built on top of `genpdf` primitives.
//!
//! This module validates raw image bytes for the report model and provides a fixed-width image
//! element, which the upstream crate does not ship with: `genpdf` sizes images from their pixel
//! count and DPI, while the report wants logos and charts at a set physical width.

use image::GenericImageView;

use genpdf::elements::Image;
use genpdf::error::Error;
use genpdf::style::Style;
use genpdf::{render, Alignment, Element, Mm, RenderResult, Scale, Size};

use crate::error::{ReportError, Result};
use crate::model::{EmbeddedImage, HorizontalAlignment};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Decodes in-memory image bytes, reporting empty or malformed input as a render error.
///
/// `what` names the image in the error message, e.g. `chart for CPUUtilization`.
pub fn decode_image_from_bytes(bytes: &[u8], what: &str) -> Result<image::DynamicImage> {
    if bytes.is_empty() {
        return Err(ReportError::render(format!("{what} is empty")));
    }
    image::load_from_memory(bytes)
        .map_err(|err| ReportError::render_with(format!("{what} could not be decoded"), err))
}

/// Validates `bytes` as an image and wraps them for embedding in the report model.
pub fn embed_image(bytes: Vec<u8>, what: &str) -> Result<EmbeddedImage> {
    let decoded = decode_image_from_bytes(&bytes, what)?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(ReportError::render(format!("{what} has no pixels")));
    }
    Ok(EmbeddedImage::new(bytes, width, height))
}

/// Maps the model alignment onto `genpdf`.
pub fn to_genpdf_alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
        HorizontalAlignment::Right => Alignment::Right,
    }
}

/// An image element rendered at a fixed physical width while keeping its aspect ratio.
pub struct ScaledImage {
    image: Image,
    alignment: Alignment,
    natural_size: Size,
    width: Mm,
}

/// Decodes an embedded image into pixels `genpdf` can place.
///
/// PDF images cannot carry an alpha channel through `genpdf`, so transparent sources (logos and
/// chart exports usually are) are flattened to RGB.
pub fn prepare_image(image: &EmbeddedImage) -> Result<image::DynamicImage> {
    let decoded = decode_image_from_bytes(image.bytes(), "embedded image")?;
    if decoded.color().has_alpha() {
        Ok(image::DynamicImage::ImageRgb8(decoded.to_rgb8()))
    } else {
        Ok(decoded)
    }
}

impl ScaledImage {
    /// Builds the element from an embedded report image.
    pub fn from_embedded(image: &EmbeddedImage, width_mm: f64) -> Result<Self> {
        Self::new(prepare_image(image)?, width_mm)
    }

    /// Builds the element from pixels returned by [`prepare_image`].
    pub fn new(decoded: image::DynamicImage, width_mm: f64) -> Result<Self> {
        let natural_size = estimated_image_size(&decoded, DEFAULT_IMAGE_DPI);
        let image = Image::from_dynamic_image(decoded)?;
        let mut element = Self {
            image,
            alignment: Alignment::Left,
            natural_size,
            width: mm_from_f64(width_mm),
        };
        element.apply_scale();
        Ok(element)
    }

    /// Sets the horizontal alignment and returns the updated element.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self.image.set_alignment(alignment);
        self
    }

    fn apply_scale(&mut self) {
        let natural = mm_to_f64(self.natural_size.width);
        if natural > f64::EPSILON {
            let scale = mm_to_f64(self.width) / natural;
            self.image.set_scale(Scale::new(scale, scale));
        }
    }
}

impl Element for ScaledImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> std::result::Result<RenderResult, Error> {
        self.image.set_alignment(self.alignment);
        self.image.render(context, area, style)
    }
}
