//! Error taxonomy shared by the report pipeline.

use std::error::Error as StdError;
use std::fmt;

type Source = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised while fetching, assembling, rendering or publishing a report.
///
/// Every variant keeps an optional source so the invocation handler can emit the full cause
/// chain in its failure envelope.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A chart or asset source could not be reached or returned no data.
    #[error("{message}")]
    Fetch {
        message: String,
        #[source]
        source: Option<Source>,
    },
    /// A named asset does not exist at the expected location.
    #[error("asset not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },
    /// Image bytes could not be decoded or the document could not be laid out.
    #[error("{message}")]
    Render {
        message: String,
        #[source]
        source: Option<Source>,
    },
    /// The serialized document could not be written to its destination.
    #[error("{message}")]
    Publish {
        message: String,
        #[source]
        source: Option<Source>,
    },
    /// The deployment configuration is malformed.
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<Source>,
    },
}

impl ReportError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
            source: None,
        }
    }

    pub fn fetch_with(message: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::Fetch {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            source: None,
        }
    }

    pub fn render_with(message: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::Render {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
            source: None,
        }
    }

    pub fn publish_with(message: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::Publish {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with(message: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the taxonomy name reported as `errorType` in failure envelopes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Render { .. } => ErrorKind::Render,
            Self::Publish { .. } => ErrorKind::Publish,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Formats the error followed by one `caused by:` line per source in the chain.
    pub fn trace(&self) -> String {
        let mut trace = format!("{}: {}", self.kind(), self);
        let mut current: Option<&(dyn StdError + 'static)> = self.source();
        while let Some(source) = current {
            trace.push_str("\n  caused by: ");
            trace.push_str(&source.to_string());
            current = source.source();
        }
        trace
    }
}

/// Discriminant of [`ReportError`] without the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    NotFound,
    Render,
    Publish,
    Config,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "FetchError",
            Self::NotFound => "NotFound",
            Self::Render => "RenderError",
            Self::Publish => "PublishError",
            Self::Config => "ConfigError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<genpdf::error::Error> for ReportError {
    fn from(err: genpdf::error::Error) -> Self {
        Self::render(format!("failed to lay out report document: {err}"))
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ReportError> = std::result::Result<T, E>;
