//! Fixed, ordered catalog of the metrics charted in every report.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// A single catalog entry: the metric identifier queried from the metric source and the label
/// printed above its chart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    identifier: String,
    label: String,
}

impl MetricSpec {
    /// Creates a new catalog entry.
    pub fn new(identifier: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
        }
    }

    /// Returns the metric identifier, e.g. `CPUUtilization`.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the human readable label, e.g. `CPU Utilization`.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Ordered sequence of [`MetricSpec`] values configured once per deployment.
///
/// Catalog order is document order: the assembler emits one section per entry in exactly this
/// sequence. The catalog is validated on construction and exposes no mutation API afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MetricCatalog {
    metrics: Vec<MetricSpec>,
}

impl MetricCatalog {
    /// Builds a catalog, rejecting blank fields and duplicate identifiers.
    pub fn new(metrics: impl IntoIterator<Item = MetricSpec>) -> Result<Self> {
        let metrics: Vec<MetricSpec> = metrics.into_iter().collect();
        let mut seen = HashSet::with_capacity(metrics.len());

        for (index, metric) in metrics.iter().enumerate() {
            if metric.identifier.trim().is_empty() {
                return Err(ReportError::config(format!(
                    "metric catalog entry {index} has an empty identifier"
                )));
            }
            if metric.label.trim().is_empty() {
                return Err(ReportError::config(format!(
                    "metric catalog entry '{}' has an empty label",
                    metric.identifier
                )));
            }
            if !seen.insert(metric.identifier.as_str()) {
                return Err(ReportError::config(format!(
                    "metric identifier '{}' appears more than once in the catalog",
                    metric.identifier
                )));
            }
        }

        Ok(Self { metrics })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricSpec> {
        self.metrics.iter()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MetricSpec> {
        self.metrics.get(index)
    }

    pub fn as_slice(&self) -> &[MetricSpec] {
        &self.metrics
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self {
            metrics: vec![
                MetricSpec::new("NetworkIn", "Network In"),
                MetricSpec::new("NetworkOut", "Network Out"),
                MetricSpec::new("mem_used_percent", "Memory Utilization"),
                MetricSpec::new("CPUUtilization", "CPU Utilization"),
            ],
        }
    }
}

impl<'a> IntoIterator for &'a MetricCatalog {
    type Item = &'a MetricSpec;
    type IntoIter = std::slice::Iter<'a, MetricSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'de> Deserialize<'de> for MetricCatalog {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let metrics = Vec::<MetricSpec>::deserialize(deserializer)?;
        Self::new(metrics).map_err(serde::de::Error::custom)
    }
}
