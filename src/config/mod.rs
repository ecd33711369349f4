use crate::error::{AppError, AppResult};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Session name sent with every AssumeRole call unless overridden
pub const DEFAULT_SESSION_NAME: &str = "multipart-upload-sts-session";

/// Session lifetimes STS accepts for AssumeRole (15 minutes to 12 hours)
pub const MIN_SESSION_DURATION: i32 = 900;
pub const MAX_SESSION_DURATION: i32 = 43_200;

/// Objects at or above this size are uploaded in parts (5 GiB)
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 5 * 1024 * 1024 * 1024;

/// Part size for multipart uploads (8 MiB)
pub const DEFAULT_PART_SIZE: u64 = 8 * 1024 * 1024;

/// S3 rejects non-final parts smaller than 5 MiB
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// S3 rejects parts larger than 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Part numbers run from 1 to 10,000
pub const MAX_PARTS: u64 = 10_000;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Reads a variable, treating blank values as absent.
fn non_blank<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an optional variable; a value that is set but malformed is an error.
fn parse_optional<T, F>(lookup: &F, key: &'static str) -> AppResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    non_blank(lookup, key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AppError::InvalidConfig(format!("{}: {:?} ({})", key, raw, e)))
        })
        .transpose()
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Configuration for the credential broker.
///
/// Required values stay optional here so that a missing variable is reported
/// by [`BrokerConfig::require`] at request time instead of aborting startup.
#[derive(Debug, Clone, Default)]
pub struct BrokerConfig {
    /// IAM role to assume (`ROLE_ARN`)
    pub role_arn: Option<String>,

    /// Bucket the uploader writes to (`BUCKET_NAME`)
    pub bucket_name: Option<String>,

    /// ARN of that bucket, used to scope the session policy (`BUCKET_ARN`)
    pub bucket_arn: Option<String>,

    /// Session name (`ROLE_SESSION_NAME`, default: "multipart-upload-sts-session")
    pub session_name: String,

    /// Requested session lifetime (`SESSION_DURATION_SECONDS`, default: role default)
    pub duration_seconds: Option<i32>,
}

/// Broker configuration with every required value present.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBrokerConfig {
    pub role_arn: String,
    pub bucket_name: String,
    pub bucket_arn: String,
    pub session_name: String,
    pub duration_seconds: Option<i32>,
}

impl BrokerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Fails only on malformed optional values; missing required values are
    /// left for [`BrokerConfig::require`].
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let duration_seconds = parse_optional::<i32, _>(&lookup, "SESSION_DURATION_SECONDS")?;
        if let Some(seconds) = duration_seconds {
            if !(MIN_SESSION_DURATION..=MAX_SESSION_DURATION).contains(&seconds) {
                return Err(AppError::InvalidConfig(format!(
                    "SESSION_DURATION_SECONDS: {} is outside {}..={}",
                    seconds, MIN_SESSION_DURATION, MAX_SESSION_DURATION
                )));
            }
        }

        Ok(Self {
            role_arn: non_blank(&lookup, "ROLE_ARN"),
            bucket_name: non_blank(&lookup, "BUCKET_NAME"),
            bucket_arn: non_blank(&lookup, "BUCKET_ARN"),
            session_name: non_blank(&lookup, "ROLE_SESSION_NAME")
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
            duration_seconds,
        })
    }

    /// Checks the required values in order and fails on the first one missing.
    pub fn require(&self) -> AppResult<ResolvedBrokerConfig> {
        let role_arn = self
            .role_arn
            .clone()
            .ok_or(AppError::MissingConfig("ROLE_ARN"))?;
        let bucket_name = self
            .bucket_name
            .clone()
            .ok_or(AppError::MissingConfig("BUCKET_NAME"))?;
        let bucket_arn = self
            .bucket_arn
            .clone()
            .ok_or(AppError::MissingConfig("BUCKET_ARN"))?;

        Ok(ResolvedBrokerConfig {
            role_arn,
            bucket_name,
            bucket_arn,
            session_name: self.session_name.clone(),
            duration_seconds: self.duration_seconds,
        })
    }
}

/// Configuration for the uploader, built from the temporary credentials
/// handed out by the broker.
#[derive(Clone)]
pub struct UploaderConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,

    /// Destination bucket (`BUCKET_NAME`)
    pub bucket: String,

    /// AWS region (`AWS_REGION`, default: "us-east-1")
    pub region: String,

    /// Custom S3-compatible endpoint (`S3_ENDPOINT_URL`), path-style addressing
    pub endpoint_url: Option<String>,

    /// Size at which uploads switch to multipart (`MULTIPART_THRESHOLD`, default: 5 GiB)
    pub multipart_threshold: u64,

    /// Multipart part size in bytes (`UPLOAD_PART_SIZE`, default: 8 MiB, clamped to 5 MiB..=5 GiB)
    pub part_size: u64,
}

impl fmt::Debug for UploaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploaderConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("multipart_threshold", &self.multipart_threshold)
            .field("part_size", &self.part_size)
            .finish()
    }
}

impl UploaderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            non_blank(&lookup, key).ok_or(AppError::MissingConfig(key))
        };

        Ok(Self {
            access_key_id: required("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
            session_token: required("AWS_SESSION_TOKEN")?,
            bucket: required("BUCKET_NAME")?,
            region: non_blank(&lookup, "AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_url: non_blank(&lookup, "S3_ENDPOINT_URL"),
            multipart_threshold: parse_optional(&lookup, "MULTIPART_THRESHOLD")?
                .unwrap_or(DEFAULT_MULTIPART_THRESHOLD),
            part_size: parse_optional(&lookup, "UPLOAD_PART_SIZE")?
                .unwrap_or(DEFAULT_PART_SIZE)
                .clamp(MIN_PART_SIZE, MAX_PART_SIZE),
        })
    }
}
