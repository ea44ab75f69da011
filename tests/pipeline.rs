use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Cursor;
use std::rc::Rc;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use resource_report::handler::FailureBody;
use resource_report::model::ReportDocument;
use resource_report::sources::{AlarmSource, AssetFetcher, ChartRequest, MetricSource, Publisher};
use resource_report::{
    Clock, DocumentRenderer, InvocationEvent, MetricCatalog, MetricSpec, PublishTarget,
    ReportConfig, ReportError, ReportHandler, Result,
};

fn png(width: u32, height: u32) -> Vec<u8> {
    let buffer = image::ImageBuffer::from_fn(width, height, |x, y| {
        image::Rgb([(x % 255) as u8, (y % 255) as u8, 120])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .expect("encode png");
    bytes
}

fn two_metric_config() -> ReportConfig {
    ReportConfig {
        metric_catalog: MetricCatalog::new([
            MetricSpec::new("NetworkIn", "Network In"),
            MetricSpec::new("CPUUtilization", "CPU Utilization"),
        ])
        .expect("valid catalog"),
        ..ReportConfig::default()
    }
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date")
}

fn run_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 6, 30, 0).single().expect("valid instant")
}

#[derive(Default)]
struct FakeCharts {
    failing: Option<&'static str>,
    requests: RefCell<Vec<ChartRequest>>,
}

impl FakeCharts {
    fn failing_on(metric_id: &'static str) -> Self {
        Self {
            failing: Some(metric_id),
            ..Self::default()
        }
    }

    fn requested_ids(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|request| request.metric_id.clone())
            .collect()
    }
}

impl MetricSource for FakeCharts {
    fn fetch_chart(&self, request: &ChartRequest) -> Result<Vec<u8>> {
        self.requests.borrow_mut().push(request.clone());
        if self.failing == Some(request.metric_id.as_str()) {
            return Err(ReportError::fetch(format!(
                "no datapoints for {}",
                request.metric_id
            )));
        }
        Ok(png(110, 30))
    }
}

struct FakeAssets {
    objects: HashMap<(String, String), Vec<u8>>,
}

impl FakeAssets {
    fn with_logos(config: &ReportConfig) -> Self {
        let assets = &config.logo_assets;
        let mut objects = HashMap::new();
        objects.insert((assets.bucket.clone(), assets.left_key()), png(64, 32));
        objects.insert((assets.bucket.clone(), assets.right_key()), png(48, 48));
        Self { objects }
    }

    fn empty() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }
}

impl AssetFetcher for FakeAssets {
    fn fetch_asset(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| ReportError::not_found(bucket, key))
    }
}

#[derive(Default)]
struct RecordingPublisher {
    fail: bool,
    published: RefCell<Vec<(PublishTarget, Vec<u8>)>>,
}

impl Publisher for RecordingPublisher {
    fn publish(&self, bytes: &[u8], target: &PublishTarget) -> Result<String> {
        if self.fail {
            return Err(ReportError::publish("access denied"));
        }
        self.published
            .borrow_mut()
            .push((target.clone(), bytes.to_vec()));
        Ok(target.uri())
    }
}

/// Captures the assembled document instead of laying it out, so no fonts are needed.
#[derive(Default)]
struct CapturingRenderer {
    documents: RefCell<Vec<ReportDocument>>,
}

impl CapturingRenderer {
    fn last(&self) -> ReportDocument {
        self.documents
            .borrow()
            .last()
            .cloned()
            .expect("a document was rendered")
    }
}

impl DocumentRenderer for CapturingRenderer {
    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        self.documents.borrow_mut().push(document.clone());
        Ok(b"%PDF-fake".to_vec())
    }

    fn extension(&self) -> &str {
        "pdf"
    }
}

struct StaticAlarms(HashMap<&'static str, Vec<String>>);

impl AlarmSource for StaticAlarms {
    fn alarms_for(&self, metric_id: &str) -> Result<Vec<String>> {
        Ok(self.0.get(metric_id).cloned().unwrap_or_default())
    }
}

/// Moves forward one day on every reading, so a second reading shows up as a date mismatch.
struct AdvancingClock {
    next: Cell<DateTime<Utc>>,
    reads: Rc<Cell<u32>>,
}

impl Clock for AdvancingClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.next.get();
        self.next.set(now + Duration::days(1));
        self.reads.set(self.reads.get() + 1);
        now
    }
}

#[test]
fn publishes_report_under_date_partitioned_key() {
    let config = two_metric_config();
    let assets = FakeAssets::with_logos(&config);
    let charts = FakeCharts::default();
    let publisher = RecordingPublisher::default();
    let renderer = CapturingRenderer::default();

    let handler = ReportHandler::new(config, &charts, assets, &publisher, &renderer);
    let envelope = handler.handle_at(&InvocationEvent::default(), run_instant(), run_date());

    assert_eq!(envelope.status_code, 200);
    assert_eq!(
        envelope.body,
        "Uploaded to s3://test-resource-util/Test/2024-03-05/SCL_Report.pdf"
    );

    let published = publisher.published.borrow();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0.bucket(), "test-resource-util");
    assert_eq!(published[0].0.key(), "Test/2024-03-05/SCL_Report.pdf");
    assert_eq!(published[0].1, b"%PDF-fake");

    let document = renderer.last();
    let labels: Vec<&str> = document
        .metric_sections()
        .map(|section| section.label().text())
        .collect();
    assert_eq!(labels, ["Network In", "CPU Utilization"]);
    assert!(document
        .text_lines()
        .any(|line| line.text() == "PRD_S4H_SCL_APP"));
    assert!(document
        .text_lines()
        .any(|line| line.text() == "Date: 05-03-2024"));
    assert_eq!(document.footer().text(), "Generated on 05-03-2024");
    assert!(document.alarm_summary().is_none());
}

#[test]
fn chart_requests_cover_trailing_window() {
    let config = two_metric_config();
    let assets = FakeAssets::with_logos(&config);
    let charts = FakeCharts::default();

    let handler = ReportHandler::new(
        config,
        &charts,
        assets,
        RecordingPublisher::default(),
        CapturingRenderer::default(),
    );
    let envelope = handler.handle_at(&InvocationEvent::default(), run_instant(), run_date());
    assert!(envelope.is_success());

    let requests = charts.requests.borrow();
    assert_eq!(requests.len(), 2);
    for request in requests.iter() {
        assert_eq!(request.window_end, run_instant());
        assert_eq!(request.window, Duration::hours(24));
        assert_eq!((request.width, request.height), (1100, 300));
    }
    assert_eq!(requests[1].label, "CPU Utilization");
}

#[test]
fn event_bucket_overrides_default() {
    let config = two_metric_config();
    let assets = FakeAssets::with_logos(&config);
    let publisher = RecordingPublisher::default();

    let handler = ReportHandler::new(
        config,
        FakeCharts::default(),
        assets,
        &publisher,
        CapturingRenderer::default(),
    );
    let event: InvocationEvent =
        serde_json::from_str(r#"{"ReportBucket": "adhoc-reports"}"#).expect("valid event");
    let envelope = handler.handle_at(&event, run_instant(), run_date());

    assert_eq!(
        envelope.body,
        "Uploaded to s3://adhoc-reports/Test/2024-03-05/SCL_Report.pdf"
    );
    assert_eq!(publisher.published.borrow()[0].0.bucket(), "adhoc-reports");
}

#[test]
fn blank_event_bucket_falls_back_to_default() {
    let config = two_metric_config();
    let assets = FakeAssets::with_logos(&config);

    let handler = ReportHandler::new(
        config,
        FakeCharts::default(),
        assets,
        RecordingPublisher::default(),
        CapturingRenderer::default(),
    );
    let envelope = handler.handle_at(&InvocationEvent::with_bucket("  "), run_instant(), run_date());
    assert_eq!(
        envelope.body,
        "Uploaded to s3://test-resource-util/Test/2024-03-05/SCL_Report.pdf"
    );
}

#[test]
fn chart_failure_yields_500_and_publishes_nothing() {
    let config = two_metric_config();
    let assets = FakeAssets::with_logos(&config);
    let charts = FakeCharts::failing_on("NetworkIn");
    let publisher = RecordingPublisher::default();
    let renderer = CapturingRenderer::default();

    let handler = ReportHandler::new(config, &charts, assets, &publisher, &renderer);
    let envelope = handler.handle_at(&InvocationEvent::default(), run_instant(), run_date());

    assert_eq!(envelope.status_code, 500);
    let body: FailureBody = serde_json::from_str(&envelope.body).expect("json failure body");
    assert_eq!(body.error_type, "FetchError");
    assert!(!body.error_message.is_empty());
    assert!(body.trace.starts_with("FetchError: no datapoints for NetworkIn"));

    assert_eq!(charts.requested_ids(), ["NetworkIn"]);
    assert!(renderer.documents.borrow().is_empty());
    assert!(publisher.published.borrow().is_empty());
}

#[test]
fn missing_logo_is_reported_as_not_found() {
    let charts = FakeCharts::default();
    let publisher = RecordingPublisher::default();

    let handler = ReportHandler::new(
        two_metric_config(),
        &charts,
        FakeAssets::empty(),
        &publisher,
        CapturingRenderer::default(),
    );
    let envelope = handler.handle_at(&InvocationEvent::default(), run_instant(), run_date());

    assert_eq!(envelope.status_code, 500);
    let body: FailureBody = serde_json::from_str(&envelope.body).expect("json failure body");
    assert_eq!(body.error_type, "NotFound");
    assert!(body.error_message.contains("lambda/Logos/Hathi-Cement.png"));
    assert!(charts.requested_ids().is_empty());
    assert!(publisher.published.borrow().is_empty());
}

#[test]
fn corrupt_chart_is_a_render_error() {
    struct GarbageCharts;

    impl MetricSource for GarbageCharts {
        fn fetch_chart(&self, _request: &ChartRequest) -> Result<Vec<u8>> {
            Ok(b"<html>throttled</html>".to_vec())
        }
    }

    let config = two_metric_config();
    let assets = FakeAssets::with_logos(&config);
    let handler = ReportHandler::new(
        config,
        GarbageCharts,
        assets,
        RecordingPublisher::default(),
        CapturingRenderer::default(),
    );
    let envelope = handler.handle_at(&InvocationEvent::default(), run_instant(), run_date());
    let body: FailureBody = serde_json::from_str(&envelope.body).expect("json failure body");
    assert_eq!(body.error_type, "RenderError");
}

#[test]
fn publish_failure_is_reported() {
    let config = two_metric_config();
    let assets = FakeAssets::with_logos(&config);
    let publisher = RecordingPublisher {
        fail: true,
        ..RecordingPublisher::default()
    };

    let handler = ReportHandler::new(
        config,
        FakeCharts::default(),
        assets,
        publisher,
        CapturingRenderer::default(),
    );
    let envelope = handler.handle_at(&InvocationEvent::default(), run_instant(), run_date());
    let body: FailureBody = serde_json::from_str(&envelope.body).expect("json failure body");
    assert_eq!(envelope.status_code, 500);
    assert_eq!(body.error_type, "PublishError");
    assert_eq!(body.error_message, "access denied");
}

#[test]
fn alarm_summary_precedes_charts() {
    let config = ReportConfig {
        include_alarm_summary: true,
        ..two_metric_config()
    };
    let assets = FakeAssets::with_logos(&config);
    let renderer = CapturingRenderer::default();
    let alarms = StaticAlarms(HashMap::from([(
        "CPUUtilization",
        vec!["cpu-high".to_string(), "cpu-critical".to_string()],
    )]));

    let handler = ReportHandler::new(
        config,
        FakeCharts::default(),
        assets,
        RecordingPublisher::default(),
        &renderer,
    )
    .with_alarms(alarms);
    let envelope = handler.handle_at(&InvocationEvent::default(), run_instant(), run_date());
    assert!(envelope.is_success(), "{}", envelope.body);

    let document = renderer.last();
    let summary = document.alarm_summary().expect("alarm summary present");
    let cells: Vec<(&str, String)> = summary
        .rows()
        .iter()
        .map(|row| (row.label(), row.alarms_cell()))
        .collect();
    assert_eq!(
        cells,
        [
            ("Network In", "No alarms".to_string()),
            ("CPU Utilization", "cpu-high, cpu-critical".to_string()),
        ]
    );

    let summary_index = document
        .blocks()
        .iter()
        .position(|block| matches!(block, resource_report::model::Block::AlarmSummary(_)))
        .expect("summary block");
    let first_metric = document
        .blocks()
        .iter()
        .position(|block| matches!(block, resource_report::model::Block::Metric(_)))
        .expect("metric block");
    assert!(summary_index < first_metric);
}

#[test]
fn alarm_summary_without_source_is_a_config_error() {
    let config = ReportConfig {
        include_alarm_summary: true,
        ..two_metric_config()
    };
    let assets = FakeAssets::with_logos(&config);
    let publisher = RecordingPublisher::default();

    let handler = ReportHandler::new(
        config,
        FakeCharts::default(),
        assets,
        &publisher,
        CapturingRenderer::default(),
    );
    let envelope = handler.handle_at(&InvocationEvent::default(), run_instant(), run_date());
    let body: FailureBody = serde_json::from_str(&envelope.body).expect("json failure body");
    assert_eq!(body.error_type, "ConfigError");
    assert!(publisher.published.borrow().is_empty());
}

#[test]
fn handle_reads_the_clock_once_for_key_and_dates() {
    let now = run_instant();
    let today = now.with_timezone(&Local).date_naive();
    let config = two_metric_config();
    let assets = FakeAssets::with_logos(&config);
    let charts = FakeCharts::default();
    let publisher = RecordingPublisher::default();
    let renderer = CapturingRenderer::default();
    let reads = Rc::new(Cell::new(0));

    let handler = ReportHandler::new(config, &charts, assets, &publisher, &renderer).with_clock(
        AdvancingClock {
            next: Cell::new(now),
            reads: Rc::clone(&reads),
        },
    );
    let envelope = handler.handle(&InvocationEvent::default());
    assert!(envelope.is_success());
    assert_eq!(reads.get(), 1);
    assert!(charts
        .requests
        .borrow()
        .iter()
        .all(|request| request.window_end == now));

    let expected_key = format!("Test/{}/SCL_Report.pdf", today.format("%Y-%m-%d"));
    assert_eq!(publisher.published.borrow()[0].0.key(), expected_key);

    let stamp = today.format("%d-%m-%Y").to_string();
    let document = renderer.last();
    assert_eq!(document.footer().text(), format!("Generated on {stamp}"));
    assert!(document
        .text_lines()
        .any(|line| line.text() == format!("Date: {stamp}")));
}

#[test]
fn target_matches_published_location() {
    let handler = ReportHandler::new(
        two_metric_config(),
        FakeCharts::default(),
        FakeAssets::empty(),
        RecordingPublisher::default(),
        CapturingRenderer::default(),
    );
    let target = handler.target_for(run_date(), None);
    assert_eq!(
        target.uri(),
        "s3://test-resource-util/Test/2024-03-05/SCL_Report.pdf"
    );
}
