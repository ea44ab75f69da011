//! AWS backends: S3 for logos and reports, CloudWatch for charts and alarms.
//!
//! The SDK is async; the pipeline is not. Calls are driven to completion on a private runtime.

use std::sync::OnceLock;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudwatch::types::Dimension;
use aws_sdk_s3::primitives::ByteStream;
use log::debug;

use super::{
    content_type_for, widget_definition, AlarmSource, AssetFetcher, ChartRequest, MetricDimension,
    MetricSource, Publisher,
};
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::naming::PublishTarget;

static RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

fn rt() -> Result<&'static tokio::runtime::Runtime> {
    if let Some(rt) = RT.get() {
        return Ok(rt);
    }
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|err| ReportError::config_with("failed to start AWS client runtime", err))?;
    Ok(RT.get_or_init(|| runtime))
}

fn load_sdk_config(region: &str) -> Result<aws_config::SdkConfig> {
    let region = Region::new(region.to_string());
    Ok(rt()?.block_on(async move {
        aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await
    }))
}

/// S3 object store used for the logo assets and the published report.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(region: &str) -> Result<Self> {
        let conf = load_sdk_config(region)?;
        Ok(Self {
            client: aws_sdk_s3::Client::new(&conf),
        })
    }
}

impl AssetFetcher for S3ObjectStore {
    fn fetch_asset(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let client = self.client.clone();
        let (bucket_owned, key_owned) = (bucket.to_string(), key.to_string());

        let response = rt()?.block_on(async move {
            match client
                .get_object()
                .bucket(bucket_owned)
                .key(key_owned)
                .send()
                .await
            {
                Ok(output) => Ok(output.body.collect().await),
                Err(err) => Err(err),
            }
        });

        match response {
            Ok(Ok(aggregated)) => Ok(aggregated.into_bytes().to_vec()),
            Ok(Err(err)) => Err(ReportError::fetch_with(
                format!("failed to read body of s3://{bucket}/{key}"),
                err,
            )),
            Err(err) => {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    Err(ReportError::not_found(bucket, key))
                } else {
                    Err(ReportError::fetch_with(
                        format!("failed to fetch s3://{bucket}/{key}"),
                        service,
                    ))
                }
            }
        }
    }
}

impl Publisher for S3ObjectStore {
    fn publish(&self, bytes: &[u8], target: &PublishTarget) -> Result<String> {
        let client = self.client.clone();
        let bucket = target.bucket().to_string();
        let key = target.key().to_string();
        let body = ByteStream::from(bytes.to_vec());
        let content_type = content_type_for(&key);

        rt()?
            .block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .content_type(content_type)
                    .body(body)
                    .send()
                    .await
            })
            .map_err(|err| {
                ReportError::publish_with(
                    format!("failed to upload {target}"),
                    err.into_service_error(),
                )
            })?;

        debug!("uploaded {} bytes to {target}", bytes.len());
        Ok(target.uri())
    }
}

/// Chart source backed by CloudWatch `GetMetricWidgetImage`.
pub struct CloudWatchCharts {
    client: aws_sdk_cloudwatch::Client,
    namespace: String,
    instance_id: String,
    region: String,
}

impl CloudWatchCharts {
    pub fn new(config: &ReportConfig) -> Result<Self> {
        let conf = load_sdk_config(&config.region)?;
        Ok(Self {
            client: aws_sdk_cloudwatch::Client::new(&conf),
            namespace: config.namespace.clone(),
            instance_id: config.instance_id.clone(),
            region: config.region.clone(),
        })
    }
}

impl MetricSource for CloudWatchCharts {
    fn fetch_chart(&self, request: &ChartRequest) -> Result<Vec<u8>> {
        let widget = widget_definition(
            request,
            &MetricDimension {
                namespace: &self.namespace,
                name: "InstanceId",
                value: &self.instance_id,
                region: &self.region,
            },
        );
        let client = self.client.clone();

        let output = rt()?
            .block_on(async move {
                client
                    .get_metric_widget_image()
                    .metric_widget(widget.to_string())
                    .send()
                    .await
            })
            .map_err(|err| {
                ReportError::fetch_with(
                    format!("failed to render chart for {}", request.metric_id),
                    err.into_service_error(),
                )
            })?;

        match output.metric_widget_image() {
            Some(image) if !image.as_ref().is_empty() => Ok(image.as_ref().to_vec()),
            _ => Err(ReportError::fetch(format!(
                "CloudWatch returned no chart for {}",
                request.metric_id
            ))),
        }
    }
}

/// Alarm source backed by CloudWatch `DescribeAlarmsForMetric`.
pub struct CloudWatchAlarms {
    client: aws_sdk_cloudwatch::Client,
    namespace: String,
    instance_id: String,
}

impl CloudWatchAlarms {
    pub fn new(config: &ReportConfig) -> Result<Self> {
        let conf = load_sdk_config(&config.region)?;
        Ok(Self {
            client: aws_sdk_cloudwatch::Client::new(&conf),
            namespace: config.namespace.clone(),
            instance_id: config.instance_id.clone(),
        })
    }
}

fn instance_dimension(instance_id: &str) -> Dimension {
    Dimension::builder()
        .name("InstanceId")
        .value(instance_id)
        .build()
}

impl AlarmSource for CloudWatchAlarms {
    fn alarms_for(&self, metric_id: &str) -> Result<Vec<String>> {
        let client = self.client.clone();
        let dimension = instance_dimension(&self.instance_id);
        let namespace = self.namespace.clone();
        let metric = metric_id.to_string();

        let output = rt()?
            .block_on(async move {
                client
                    .describe_alarms_for_metric()
                    .metric_name(metric)
                    .namespace(namespace)
                    .dimensions(dimension)
                    .send()
                    .await
            })
            .map_err(|err| {
                ReportError::fetch_with(
                    format!("failed to list alarms for {metric_id}"),
                    err.into_service_error(),
                )
            })?;

        Ok(output
            .metric_alarms
            .unwrap_or_default()
            .into_iter()
            .filter_map(|alarm| alarm.alarm_name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_dimension_targets_instance() {
        let dimension = instance_dimension("i-0bf7a1cdc65f2a2fe");
        assert_eq!(dimension.name(), Some("InstanceId"));
        assert_eq!(dimension.value(), Some("i-0bf7a1cdc65f2a2fe"));
    }
}
