//! Styled text fragments used by the report model.
//!
//! A [`Span`] carries the small subset of typography the report needs (weight and one of a few
//! emphasis sizes) and converts into [`genpdf`][genpdf] styled strings when the document is
//! rendered. Keeping the fragments free of font handles lets the assembler build and tests inspect
//! documents without any fonts installed.
//!
//! [genpdf]: https://docs.rs/genpdf/

use std::cmp::Ordering;

use genpdf::style::{Style, StyledString};

/// Relative emphasis of a line of text, mapped onto a fixed point size.
///
/// Emphases order by point size, so `Emphasis::Title > Emphasis::Heading`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Emphasis {
    /// Document title.
    Title,
    /// Secondary heading such as the instance identity.
    Heading,
    /// Metric labels.
    Label,
    /// Regular body text.
    #[default]
    Body,
    /// Footer and other fine print.
    Small,
}

impl Emphasis {
    /// Returns the font size in points.
    pub fn font_size(self) -> u8 {
        match self {
            Emphasis::Title => 20,
            Emphasis::Heading => 16,
            Emphasis::Label => 12,
            Emphasis::Body => 11,
            Emphasis::Small => 8,
        }
    }
}

impl PartialOrd for Emphasis {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Emphasis {
    fn cmp(&self, other: &Self) -> Ordering {
        self.font_size().cmp(&other.font_size())
    }
}

/// A slice of text together with its weight and emphasis.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    emphasis: Emphasis,
}

impl Span {
    /// Creates a new body-sized, regular-weight span.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Returns the raw text contained in this span.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether the span should be rendered in bold.
    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// Returns the emphasis level of the span.
    pub fn emphasis(&self) -> Emphasis {
        self.emphasis
    }

    /// Sets the bold flag and returns the updated span.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Sets the emphasis and returns the updated span.
    pub fn with_emphasis(mut self, emphasis: Emphasis) -> Self {
        self.emphasis = emphasis;
        self
    }

    /// Convenience shorthand that marks the span as bold.
    pub fn bold(self) -> Self {
        self.with_bold(true)
    }

    fn to_style(&self) -> Style {
        let mut style = Style::new().with_font_size(self.emphasis.font_size());
        if self.bold {
            style.set_bold();
        }
        style
    }

    /// Converts the span to a [`StyledString`].
    pub fn to_styled_string(&self) -> StyledString {
        StyledString::new(self.text.clone(), self.to_style())
    }
}

impl From<&Span> for StyledString {
    fn from(span: &Span) -> Self {
        span.to_styled_string()
    }
}
