//! Deployment configuration for the report pipeline.
//!
//! Every field defaults to the values of the production deployment, so an empty TOML file (or
//! [`ReportConfig::default`]) describes a working setup. A typical override file:
//!
//! ```toml
//! instance_id = "i-0bf7a1cdc65f2a2fe"
//! instance_name = "PRD_S4H_SCL_APP"
//! default_bucket = "test-resource-util"
//!
//! metric_catalog = [
//!     { identifier = "NetworkIn", label = "Network In" },
//!     { identifier = "CPUUtilization", label = "CPU Utilization" },
//! ]
//!
//! [logo_assets]
//! bucket = "test-resource-util"
//! prefix = "lambda/Logos"
//! left = "Hathi-Cement.png"
//! right = "Sapphire.jpg"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::catalog::MetricCatalog;
use crate::error::{ReportError, Result};
use crate::naming::TargetNaming;

/// Location of the two header logos in blob storage.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogoAssets {
    pub bucket: String,
    pub prefix: String,
    pub left: String,
    pub right: String,
}

impl LogoAssets {
    fn key_for(&self, name: &str) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        }
    }

    /// Object key of the left logo.
    pub fn left_key(&self) -> String {
        self.key_for(&self.left)
    }

    /// Object key of the right logo.
    pub fn right_key(&self) -> String {
        self.key_for(&self.right)
    }
}

impl Default for LogoAssets {
    fn default() -> Self {
        Self {
            bucket: "test-resource-util".to_string(),
            prefix: "lambda/Logos".to_string(),
            left: "Hathi-Cement.png".to_string(),
            right: "Sapphire.jpg".to_string(),
        }
    }
}

/// Size and time window of the rendered metric charts.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartSettings {
    /// Length of the trailing window ending at the run time.
    pub window_hours: u32,
    /// Requested chart width in pixels.
    pub width: u32,
    /// Requested chart height in pixels.
    pub height: u32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            window_hours: 24,
            width: 1100,
            height: 300,
        }
    }
}

/// Everything a report run needs to know about its deployment.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub instance_id: String,
    pub instance_name: String,
    pub region: String,
    /// Metric namespace queried for every catalog entry.
    pub namespace: String,
    pub metric_catalog: MetricCatalog,
    pub logo_assets: LogoAssets,
    pub default_bucket: String,
    pub key_prefix: String,
    pub report_name: String,
    pub chart: ChartSettings,
    /// Adds a per-metric alarm table ahead of the charts.
    pub include_alarm_summary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            instance_id: "i-0bf7a1cdc65f2a2fe".to_string(),
            instance_name: "PRD_S4H_SCL_APP".to_string(),
            region: "ap-south-1".to_string(),
            namespace: "AWS/EC2".to_string(),
            metric_catalog: MetricCatalog::default(),
            logo_assets: LogoAssets::default(),
            default_bucket: "test-resource-util".to_string(),
            key_prefix: "Test".to_string(),
            report_name: "SCL_Report".to_string(),
            chart: ChartSettings::default(),
            include_alarm_summary: false,
        }
    }
}

impl ReportConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)
            .map_err(|err| ReportError::config_with("invalid report configuration", err))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            ReportError::config_with(
                format!("failed to read configuration file {}", path.display()),
                err,
            )
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks the fields the pipeline cannot run without.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("instance_id", &self.instance_id),
            ("instance_name", &self.instance_name),
            ("region", &self.region),
            ("namespace", &self.namespace),
            ("default_bucket", &self.default_bucket),
            ("report_name", &self.report_name),
            ("logo_assets.bucket", &self.logo_assets.bucket),
            ("logo_assets.left", &self.logo_assets.left),
            ("logo_assets.right", &self.logo_assets.right),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ReportError::config(format!("`{name}` must not be empty")));
            }
        }
        if self.report_name.contains('/') {
            return Err(ReportError::config("`report_name` must not contain '/'"));
        }
        if self.chart.window_hours == 0 || self.chart.width == 0 || self.chart.height == 0 {
            return Err(ReportError::config(
                "chart window and dimensions must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Naming parameters for [`crate::naming::compute_target`].
    pub fn target_naming<'a>(&'a self, extension: &'a str) -> TargetNaming<'a> {
        TargetNaming {
            default_bucket: &self.default_bucket,
            key_prefix: &self.key_prefix,
            report_name: &self.report_name,
            extension,
        }
    }
}
