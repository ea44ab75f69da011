//! Filesystem backends for local runs and tests.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use log::debug;

use super::{AssetFetcher, ChartRequest, MetricSource, Publisher};
use crate::error::{ReportError, Result};
use crate::naming::PublishTarget;

/// Object store laid out as `{root}/{bucket}/{key}` on the local filesystem.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|err| {
            ReportError::config_with(
                format!("cannot create object store root {}", root.display()),
                err,
            )
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the path of an object, refusing keys that would escape the bucket directory.
    pub fn path_for(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        let relative = Path::new(bucket).join(key);
        let contained = !bucket.is_empty()
            && !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        contained.then(|| self.root.join(relative))
    }
}

impl AssetFetcher for FsObjectStore {
    fn fetch_asset(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self
            .path_for(bucket, key)
            .ok_or_else(|| ReportError::not_found(bucket, key))?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(ReportError::not_found(bucket, key))
            }
            Err(err) => Err(ReportError::fetch_with(
                format!("failed to read {}", path.display()),
                err,
            )),
        }
    }
}

impl Publisher for FsObjectStore {
    fn publish(&self, bytes: &[u8], target: &PublishTarget) -> Result<String> {
        let path = self
            .path_for(target.bucket(), target.key())
            .ok_or_else(|| ReportError::publish(format!("invalid publish target {target}")))?;
        let publish_err =
            |err: io::Error| ReportError::publish_with(format!("failed to write {target}"), err);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(publish_err)?;
        }

        let tmp = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(publish_err)?;
            file.write_all(bytes).map_err(publish_err)?;
            file.sync_all().map_err(publish_err)?;
        }
        fs::rename(&tmp, &path).map_err(publish_err)?;

        debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(format!("file://{}", path.display()))
    }
}

/// Serves pre-rendered charts stored as `{root}/{metric_id}.png`.
pub struct FsChartSource {
    root: PathBuf,
}

impl FsChartSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl MetricSource for FsChartSource {
    fn fetch_chart(&self, request: &ChartRequest) -> Result<Vec<u8>> {
        let path = self.root.join(format!("{}.png", request.metric_id));
        fs::read(&path).map_err(|err| {
            ReportError::fetch_with(
                format!(
                    "no chart for {} at {}",
                    request.metric_id,
                    path.display()
                ),
                err,
            )
        })
    }
}
