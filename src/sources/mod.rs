//! Collaborators that perform I/O on behalf of the pipeline.
//!
//! The traits are synchronous: a run performs its fetches one after another and only the
//! document order matters. Backends live in submodules; the AWS backend is behind the `aws`
//! feature.

mod fs;
mod widget;

#[cfg(feature = "aws")]
mod aws;

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::naming::PublishTarget;

pub use fs::{FsChartSource, FsObjectStore};
pub use widget::{widget_definition, MetricDimension};

#[cfg(feature = "aws")]
pub use aws::{CloudWatchAlarms, CloudWatchCharts, S3ObjectStore};

/// Parameters of a single chart render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartRequest {
    pub metric_id: String,
    pub label: String,
    pub window_end: DateTime<Utc>,
    pub window: Duration,
    pub width: u32,
    pub height: u32,
}

impl ChartRequest {
    /// Start of the trailing window.
    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_end - self.window
    }
}

/// Renders time-series charts (average statistic, single series) as raster image bytes.
pub trait MetricSource {
    fn fetch_chart(&self, request: &ChartRequest) -> Result<Vec<u8>>;
}

/// Reads named static objects such as the header logos.
pub trait AssetFetcher {
    /// Returns the object bytes, or [`crate::ReportError::NotFound`] when it does not exist.
    fn fetch_asset(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}

/// Writes the finished report, replacing any existing object at the same key.
pub trait Publisher {
    /// Stores `bytes` at `target` and returns its canonical location.
    fn publish(&self, bytes: &[u8], target: &PublishTarget) -> Result<String>;
}

/// Lists the alarms configured on a metric of the monitored instance.
pub trait AlarmSource {
    fn alarms_for(&self, metric_id: &str) -> Result<Vec<String>>;
}

macro_rules! forward_impls {
    ($trait:ident { fn $method:ident(&self $(, $arg:ident: $ty:ty)*) -> $ret:ty; }) => {
        impl<T: $trait + ?Sized> $trait for &T {
            fn $method(&self $(, $arg: $ty)*) -> $ret {
                (**self).$method($($arg),*)
            }
        }

        impl<T: $trait + ?Sized> $trait for Box<T> {
            fn $method(&self $(, $arg: $ty)*) -> $ret {
                (**self).$method($($arg),*)
            }
        }
    };
}

forward_impls!(MetricSource { fn fetch_chart(&self, request: &ChartRequest) -> Result<Vec<u8>>; });
forward_impls!(AssetFetcher { fn fetch_asset(&self, bucket: &str, key: &str) -> Result<Vec<u8>>; });
forward_impls!(Publisher { fn publish(&self, bytes: &[u8], target: &PublishTarget) -> Result<String>; });
forward_impls!(AlarmSource { fn alarms_for(&self, metric_id: &str) -> Result<Vec<String>>; });

/// Content type stored alongside a published object, derived from the key extension.
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "pdf" => "application/pdf",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
