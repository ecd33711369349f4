use crate::config::{MAX_PART_SIZE, MAX_PARTS, MIN_PART_SIZE};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, Length};
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use std::path::Path;
use tracing::{debug, warn};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads the whole file in a single PutObject request.
    async fn put_file(&self, key: &str, path: &Path) -> Result<()>;

    /// Uploads the `size` bytes of the file in parts of about `part_size`
    /// bytes and returns the number of parts sent.
    async fn put_file_multipart(
        &self,
        key: &str,
        path: &Path,
        size: u64,
        part_size: u64,
    ) -> Result<usize>;
}

/// Part size actually used for an object of `size` bytes: at least the
/// requested size and the S3 minimum, grown so the object fits in
/// `MAX_PARTS` parts. Fails when even `MAX_PART_SIZE` parts cannot hold it.
pub fn plan_part_size(size: u64, part_size: u64) -> Result<u64> {
    let planned = part_size
        .max(size.div_ceil(MAX_PARTS))
        .max(MIN_PART_SIZE);
    if planned > MAX_PART_SIZE {
        bail!(
            "object of {} bytes exceeds the multipart limit of {} parts of {} bytes",
            size,
            MAX_PARTS,
            MAX_PART_SIZE
        );
    }
    Ok(planned)
}

/// `(offset, length)` of every part. An empty object is a single empty part.
pub fn part_ranges(size: u64, part_size: u64) -> Vec<(u64, u64)> {
    if size == 0 || part_size == 0 {
        return vec![(0, 0)];
    }
    (0..size.div_ceil(part_size))
        .map(|i| {
            let offset = i * part_size;
            (offset, part_size.min(size - offset))
        })
        .collect()
}

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    async fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        path: &Path,
        ranges: &[(u64, u64)],
    ) -> Result<Vec<CompletedPart>> {
        let mut completed_parts = Vec::with_capacity(ranges.len());

        for (i, &(offset, length)) in ranges.iter().enumerate() {
            let part_number = i32::try_from(i + 1)?;

            // Parts are streamed straight from the file.
            let body = if length == 0 {
                ByteStream::from_static(b"")
            } else {
                ByteStream::read_from()
                    .path(path)
                    .offset(offset)
                    .length(Length::Exact(length))
                    .build()
                    .await?
            };

            let upload_part_res = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .body(body)
                .part_number(part_number)
                .send()
                .await
                .map_err(|e| anyhow!("UploadPart {} failed: {}", part_number, DisplayErrorContext(&e)))?;

            debug!(
                "📦 Part {}/{} uploaded ({} bytes)",
                part_number,
                ranges.len(),
                length
            );

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(upload_part_res.e_tag().unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );
        }

        Ok(completed_parts)
    }

    async fn abort(&self, key: &str, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            warn!(
                "S3 abort_multipart_upload failed: bucket={}, key={}, error={}",
                self.bucket,
                key,
                DisplayErrorContext(&e)
            );
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_file(&self, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path).await?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| anyhow!("PutObject failed: {}", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn put_file_multipart(
        &self,
        key: &str,
        path: &Path,
        size: u64,
        part_size: u64,
    ) -> Result<usize> {
        let part_size = plan_part_size(size, part_size)?;
        let ranges = part_ranges(size, part_size);

        let multipart_upload_res = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("CreateMultipartUpload failed: {}", DisplayErrorContext(&e)))?;

        let upload_id = multipart_upload_res
            .upload_id()
            .ok_or_else(|| anyhow!("No upload ID"))?;

        debug!(
            "Multipart upload {} started: {} part(s) of {} bytes",
            upload_id,
            ranges.len(),
            part_size
        );

        let completed_parts = match self.upload_parts(key, upload_id, path, &ranges).await {
            Ok(parts) => parts,
            Err(e) => {
                self.abort(key, upload_id).await;
                return Err(e);
            }
        };
        let part_count = completed_parts.len();

        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        let res = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await;

        if let Err(e) = res {
            let err = anyhow!("CompleteMultipartUpload failed: {}", DisplayErrorContext(&e));
            self.abort(key, upload_id).await;
            return Err(err);
        }

        Ok(part_count)
    }
}
