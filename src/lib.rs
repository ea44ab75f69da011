//! Daily resource-utilization reports for a monitored server.
//!
//! A run fetches one chart per catalog metric plus two logos, assembles them into a
//! [`model::ReportDocument`], renders it as PDF and publishes it under a date-partitioned key.
//! [`handler::ReportHandler`] drives the whole pipeline; the I/O collaborators live in
//! [`sources`].

pub mod assembler;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod handler;
pub mod model;
pub mod naming;
pub mod render;
pub mod richtext;
pub mod sources;

pub use assembler::{assemble, assemble_with, AssemblyOptions, ChartImage, LogoPair};
pub use catalog::{MetricCatalog, MetricSpec};
pub use config::ReportConfig;
pub use error::{ErrorKind, ReportError, Result};
pub use handler::{Clock, InvocationEvent, ReportHandler, ResultEnvelope, SystemClock};
pub use naming::{compute_target, PublishTarget};
pub use render::{DocumentRenderer, PdfRenderer};
