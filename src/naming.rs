//! Date-partitioned naming of published reports.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Destination of a published report.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublishTarget {
    bucket: String,
    key: String,
}

impl PublishTarget {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Canonical object URI, e.g. `s3://test-resource-util/Test/2024-03-05/SCL_Report.pdf`.
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Fixed parts of the report key plus the fallback bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetNaming<'a> {
    pub default_bucket: &'a str,
    pub key_prefix: &'a str,
    pub report_name: &'a str,
    pub extension: &'a str,
}

/// Computes `{prefix}/{YYYY-MM-DD}/{report_name}.{extension}` in the override bucket, or in the
/// default bucket when no (non-blank) override is given.
pub fn compute_target(
    run_date: NaiveDate,
    override_bucket: Option<&str>,
    naming: &TargetNaming<'_>,
) -> PublishTarget {
    let bucket = override_bucket
        .map(str::trim)
        .filter(|bucket| !bucket.is_empty())
        .unwrap_or(naming.default_bucket);

    let prefix = naming.key_prefix.trim_matches('/');
    let file_name = format!("{}.{}", naming.report_name, naming.extension);
    let day = run_date.format("%Y-%m-%d");
    let key = if prefix.is_empty() {
        format!("{day}/{file_name}")
    } else {
        format!("{prefix}/{day}/{file_name}")
    };

    PublishTarget::new(bucket, key)
}
