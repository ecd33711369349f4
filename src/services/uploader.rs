use crate::config::{DEFAULT_MULTIPART_THRESHOLD, DEFAULT_PART_SIZE, UploaderConfig};
use crate::error::{AppError, AppResult};
use crate::services::policy::UPLOAD_PREFIX;
use crate::services::storage::ObjectStore;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    SinglePut,
    Multipart,
}

impl fmt::Display for UploadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStrategy::SinglePut => write!(f, "single-put"),
            UploadStrategy::Multipart => write!(f, "multipart"),
        }
    }
}

/// Forced uploads always go multipart; otherwise only files of at least
/// `threshold` bytes do.
pub fn select_strategy(size: u64, force_multipart: bool, threshold: u64) -> UploadStrategy {
    if force_multipart || size >= threshold {
        UploadStrategy::Multipart
    } else {
        UploadStrategy::SinglePut
    }
}

/// Builds `uploads/{timestamp}_{file name}`. Only the final path component
/// is used, so directories in `path` never reach the key.
pub fn object_key(now: DateTime<Utc>, path: &Path) -> AppResult<String> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            AppError::InvalidInput(format!("{} has no usable file name", path.display()))
        })?;

    Ok(format!(
        "{}/{}_{}",
        UPLOAD_PREFIX,
        now.to_rfc3339_opts(SecondsFormat::Micros, true),
        file_name
    ))
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    pub key: String,
    pub size: u64,
    pub strategy: UploadStrategy,
    /// Parts sent; 1 for a single put
    pub parts: usize,
}

pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    multipart_threshold: u64,
    part_size: u64,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
            part_size: DEFAULT_PART_SIZE,
        }
    }

    pub fn from_config(store: Arc<dyn ObjectStore>, config: &UploaderConfig) -> Self {
        Self {
            store,
            multipart_threshold: config.multipart_threshold,
            part_size: config.part_size,
        }
    }

    pub fn with_multipart_threshold(mut self, threshold: u64) -> Self {
        self.multipart_threshold = threshold;
        self
    }

    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = part_size;
        self
    }

    pub async fn upload(&self, path: &Path, force_multipart: bool) -> AppResult<UploadReport> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(AppError::InvalidInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let size = metadata.len();
        let key = object_key(Utc::now(), path)?;
        let strategy = select_strategy(size, force_multipart, self.multipart_threshold);

        info!(
            "⬆️  Uploading {} ({} bytes) as {} [{}]",
            path.display(),
            size,
            key,
            strategy
        );

        let parts = match strategy {
            UploadStrategy::SinglePut => {
                self.store
                    .put_file(&key, path)
                    .await
                    .map_err(AppError::Upstream)?;
                1
            }
            UploadStrategy::Multipart => self
                .store
                .put_file_multipart(&key, path, size, self.part_size)
                .await
                .map_err(AppError::Upstream)?,
        };

        info!("✅ Uploaded {} in {} part(s)", key, parts);

        Ok(UploadReport {
            key,
            size,
            strategy,
            parts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const GIB5: u64 = 5 * 1024 * 1024 * 1024;

    #[test]
    fn test_select_strategy_threshold() {
        assert_eq!(select_strategy(0, false, GIB5), UploadStrategy::SinglePut);
        assert_eq!(select_strategy(GIB5 - 1, false, GIB5), UploadStrategy::SinglePut);
        assert_eq!(select_strategy(GIB5, false, GIB5), UploadStrategy::Multipart);
        assert_eq!(select_strategy(GIB5 * 2, false, GIB5), UploadStrategy::Multipart);
    }

    #[test]
    fn test_select_strategy_forced() {
        for size in [0, 1, 1024, GIB5 - 1, GIB5, u64::MAX] {
            assert_eq!(select_strategy(size, true, GIB5), UploadStrategy::Multipart);
        }
    }

    #[test]
    fn test_object_key_uses_base_name() {
        let now = Utc.with_ymd_and_hms(2020, 1, 29, 12, 30, 0).unwrap();
        let key = object_key(now, Path::new("/tmp/some/dir/report.csv")).unwrap();
        assert_eq!(key, "uploads/2020-01-29T12:30:00.000000Z_report.csv");
        assert!(!key.contains("/tmp"));
    }

    #[test]
    fn test_object_key_rejects_pathless_name() {
        let now = Utc::now();
        assert!(object_key(now, Path::new("/")).is_err());
        assert!(object_key(now, Path::new("..")).is_err());
    }
}
