//! `genpdf` document construction with per-page header and footer bands.

use genpdf::error::{Error, ErrorKind};
use genpdf::style;
use genpdf::{self, Element, Margins, Mm, PageDecorator, Position, Size};

use crate::fonts;

type BandFactory = dyn Fn(usize) -> Result<Box<dyn Element>, Error>;

/// Builder for `genpdf::Document` instances with the report page furniture.
#[derive(Default)]
pub struct DocumentBuilder {
    title: Option<String>,
    paper_size: Option<Size>,
    margins: Option<Margins>,
    font_size: Option<u8>,
    header: Option<HeaderSpec>,
    footer: Option<FooterSpec>,
}

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the PDF document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the paper size used for newly created documents.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Sets the default body font size in points.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Configures a header band built for every page, followed by `gap` of empty space.
    pub fn with_header<F, E>(mut self, gap: impl Into<Mm>, header: F) -> Self
    where
        F: Fn(usize) -> Result<E, Error> + 'static,
        E: Element + 'static,
    {
        self.header = Some(HeaderSpec {
            gap: gap.into(),
            factory: boxed_factory(header),
        });
        self
    }

    /// Configures a footer band with a fixed height that is built for every page.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> Result<E, Error> + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec {
            height: height.into(),
            factory: boxed_factory(footer),
        });
        self
    }

    /// Builds a fully configured `genpdf::Document` using the default font family.
    pub fn build(self) -> crate::error::Result<genpdf::Document> {
        let font_family = fonts::default_font_family()?;
        let mut document = genpdf::Document::new(font_family);

        if let Some(title) = self.title {
            document.set_title(title);
        }
        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }
        if let Some(font_size) = self.font_size {
            document.set_font_size(font_size);
        }

        document.set_page_decorator(BandPageDecorator {
            page: 0,
            margins: self.margins,
            header: self.header,
            footer: self.footer,
        });

        Ok(document)
    }
}

fn boxed_factory<F, E>(factory: F) -> Box<BandFactory>
where
    F: Fn(usize) -> Result<E, Error> + 'static,
    E: Element + 'static,
{
    Box::new(move |page| factory(page).map(|element| Box::new(element) as Box<dyn Element>))
}

struct HeaderSpec {
    gap: Mm,
    factory: Box<BandFactory>,
}

struct FooterSpec {
    height: Mm,
    factory: Box<BandFactory>,
}

struct BandPageDecorator {
    page: usize,
    margins: Option<Margins>,
    header: Option<HeaderSpec>,
    footer: Option<FooterSpec>,
}

impl PageDecorator for BandPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        if let Some(header) = &self.header {
            let mut element = (header.factory)(self.page)?;
            let result = element.render(context, area.clone(), style)?;
            if result.has_more {
                return Err(Error::new(
                    "Header band does not fit on the page",
                    ErrorKind::PageSizeExceeded,
                ));
            }
            area.add_offset(Position::new(0, result.size.height + header.gap));
        }

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(self.page)?;
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}
