//! CloudWatch metric widget definitions.

use chrono::SecondsFormat;
use serde_json::{json, Value};

use super::ChartRequest;

/// The namespace and dimension that identify the monitored instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricDimension<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub value: &'a str,
    pub region: &'a str,
}

/// Builds the JSON widget definition accepted by `GetMetricWidgetImage`.
///
/// The chart shows the average of a single unstacked series over an absolute window, titled with
/// the request label and with the legend below the plot.
pub fn widget_definition(request: &ChartRequest, dimension: &MetricDimension<'_>) -> Value {
    json!({
        "metrics": [[dimension.namespace, request.metric_id, dimension.name, dimension.value]],
        "stat": "Average",
        "view": "timeSeries",
        "stacked": false,
        "region": dimension.region,
        "start": request.window_start().to_rfc3339_opts(SecondsFormat::Secs, true),
        "end": request.window_end.to_rfc3339_opts(SecondsFormat::Secs, true),
        "width": request.width,
        "height": request.height,
        "title": request.label,
        "setPeriodToTimeRange": true,
        "legend": { "position": "bottom" },
    })
}
