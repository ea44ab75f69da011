//! Entry point that runs one report and maps the outcome onto a status envelope.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::assembler::{assemble_with, AssemblyOptions, ChartImage, LogoPair};
use crate::catalog::MetricSpec;
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::model::{AlarmRow, AlarmSummary};
use crate::naming::{compute_target, PublishTarget};
use crate::render::DocumentRenderer;
use crate::sources::{AlarmSource, AssetFetcher, ChartRequest, MetricSource, Publisher};

/// Inbound invocation payload. Unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationEvent {
    /// Overrides the configured default publish bucket.
    #[serde(rename = "ReportBucket", default, skip_serializing_if = "Option::is_none")]
    pub report_bucket: Option<String>,
}

impl InvocationEvent {
    pub fn with_bucket(bucket: impl Into<String>) -> Self {
        Self {
            report_bucket: Some(bucket.into()),
        }
    }
}

/// Status code and body returned to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub status_code: u16,
    pub body: String,
}

impl ResultEnvelope {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    fn success(location: &str) -> Self {
        Self {
            status_code: 200,
            body: format!("Uploaded to {location}"),
        }
    }

    fn failure(err: &ReportError) -> Self {
        let body = FailureBody {
            error_type: err.kind().to_string(),
            error_message: err.to_string(),
            trace: err.trace(),
        };
        Self {
            status_code: 500,
            body: serde_json::to_string(&body).unwrap_or_else(|_| body.error_message.clone()),
        }
    }
}

/// JSON body of a failure envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBody {
    pub error_type: String,
    pub error_message: String,
    pub trace: String,
}

/// Source of the run timestamp.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Runs the report pipeline with injected collaborators.
///
/// `handle` never returns an error: every failure becomes a 500 envelope, and nothing is
/// published unless all charts were fetched and the document rendered.
pub struct ReportHandler<M, A, P, R> {
    config: ReportConfig,
    metrics: M,
    assets: A,
    publisher: P,
    renderer: R,
    alarms: Option<Box<dyn AlarmSource>>,
    clock: Box<dyn Clock>,
}

impl<M, A, P, R> ReportHandler<M, A, P, R>
where
    M: MetricSource,
    A: AssetFetcher,
    P: Publisher,
    R: DocumentRenderer,
{
    pub fn new(config: ReportConfig, metrics: M, assets: A, publisher: P, renderer: R) -> Self {
        Self {
            config,
            metrics,
            assets,
            publisher,
            renderer,
            alarms: None,
            clock: Box::new(SystemClock),
        }
    }

    /// Supplies the alarm source used when `include_alarm_summary` is enabled.
    pub fn with_alarms(mut self, alarms: impl AlarmSource + 'static) -> Self {
        self.alarms = Some(Box::new(alarms));
        self
    }

    /// Replaces the wall clock, e.g. with a fixed instant in tests.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Runs one report. The clock is read exactly once, so the document date, footer date and
    /// object key always agree even when a run straddles midnight.
    pub fn handle(&self, event: &InvocationEvent) -> ResultEnvelope {
        let now = self.clock.now();
        let today = now.with_timezone(&Local).date_naive();
        self.handle_at(event, now, today)
    }

    /// Runs one report for an explicit run instant and report date.
    pub fn handle_at(
        &self,
        event: &InvocationEvent,
        now: DateTime<Utc>,
        run_date: NaiveDate,
    ) -> ResultEnvelope {
        match self.run(event, now, run_date) {
            Ok(location) => {
                info!("report published to {location}");
                ResultEnvelope::success(&location)
            }
            Err(err) => {
                warn!("report run failed: {}", err.trace());
                ResultEnvelope::failure(&err)
            }
        }
    }

    /// Resolves where a report for `run_date` would be published.
    pub fn target_for(&self, run_date: NaiveDate, override_bucket: Option<&str>) -> PublishTarget {
        compute_target(
            run_date,
            override_bucket,
            &self.config.target_naming(self.renderer.extension()),
        )
    }

    fn run(
        &self,
        event: &InvocationEvent,
        now: DateTime<Utc>,
        run_date: NaiveDate,
    ) -> Result<String> {
        let target = self.target_for(run_date, event.report_bucket.as_deref());
        info!(
            "building report for {} ({}) -> {target}",
            self.config.instance_name, self.config.instance_id
        );

        let logos = self.fetch_logos()?;
        let options = AssemblyOptions {
            alarm_summary: self.alarm_summary()?,
        };

        let chart = &self.config.chart;
        let fetch_chart = |metric: &MetricSpec| -> Result<ChartImage> {
            info!("fetching chart for {}", metric.identifier());
            let request = ChartRequest {
                metric_id: metric.identifier().to_string(),
                label: metric.label().to_string(),
                window_end: now,
                window: Duration::hours(i64::from(chart.window_hours)),
                width: chart.width,
                height: chart.height,
            };
            let bytes = self.metrics.fetch_chart(&request)?;
            Ok(ChartImage::new(metric.clone(), bytes))
        };

        let document = assemble_with(
            options,
            &self.config.instance_name,
            &self.config.metric_catalog,
            fetch_chart,
            logos,
            run_date,
        )?;
        let bytes = self.renderer.render(&document)?;
        info!("rendered report ({} bytes)", bytes.len());

        self.publisher.publish(&bytes, &target)
    }

    fn fetch_logos(&self) -> Result<LogoPair> {
        let assets = &self.config.logo_assets;
        let left = self.assets.fetch_asset(&assets.bucket, &assets.left_key())?;
        let right = self.assets.fetch_asset(&assets.bucket, &assets.right_key())?;
        Ok(LogoPair::new(left, right))
    }

    fn alarm_summary(&self) -> Result<Option<AlarmSummary>> {
        if !self.config.include_alarm_summary {
            return Ok(None);
        }
        let source = self.alarms.as_ref().ok_or_else(|| {
            ReportError::config("include_alarm_summary is set but no alarm source is configured")
        })?;

        let rows = self
            .config
            .metric_catalog
            .iter()
            .map(|metric| {
                let alarms = source.alarms_for(metric.identifier())?;
                Ok(AlarmRow::new(metric.label(), alarms))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(AlarmSummary::new(rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_reads_report_bucket() {
        let event: InvocationEvent =
            serde_json::from_str(r#"{"ReportBucket": "override", "source": "aws.events"}"#)
                .expect("valid event");
        assert_eq!(event.report_bucket.as_deref(), Some("override"));

        let empty: InvocationEvent = serde_json::from_str("{}").expect("valid event");
        assert_eq!(empty, InvocationEvent::default());
    }

    #[test]
    fn envelope_serializes_status_code_in_camel_case() {
        let envelope = ResultEnvelope::success("s3://bucket/key.pdf");
        let json = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"], "Uploaded to s3://bucket/key.pdf");
    }

    #[test]
    fn failure_envelope_carries_structured_error() {
        let envelope = ResultEnvelope::failure(&ReportError::fetch("no datapoints"));
        assert_eq!(envelope.status_code, 500);
        let body: FailureBody = serde_json::from_str(&envelope.body).expect("json body");
        assert_eq!(body.error_type, "FetchError");
        assert_eq!(body.error_message, "no datapoints");
        assert!(body.trace.contains("no datapoints"));
    }
}
