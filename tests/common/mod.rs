#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use sts_multipart_upload::config::BrokerConfig;
use sts_multipart_upload::models::{AssumedIdentity, TemporaryCredentials};
use sts_multipart_upload::services::storage::{ObjectStore, part_ranges, plan_part_size};
use sts_multipart_upload::services::sts::{AssumeRoleRequest, AssumedRole, RoleAssumer};

pub const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/lambda-multipart-upload-sts";
pub const BUCKET_NAME: &str = "multipart-upload-sts-test";
pub const BUCKET_ARN: &str = "arn:aws:s3:::multipart-upload-sts-test";

pub fn broker_config() -> BrokerConfig {
    let vars: HashMap<&str, &str> = [
        ("ROLE_ARN", ROLE_ARN),
        ("BUCKET_NAME", BUCKET_NAME),
        ("BUCKET_ARN", BUCKET_ARN),
    ]
    .into_iter()
    .collect();
    BrokerConfig::from_lookup(|key: &str| vars.get(key).map(|v| v.to_string())).unwrap()
}

pub fn sample_role() -> AssumedRole {
    AssumedRole {
        credentials: TemporaryCredentials {
            access_key_id: "ASIA-A".to_string(),
            secret_access_key: "secret-B".to_string(),
            session_token: "token-C".to_string(),
            expiration: Utc.with_ymd_and_hms(2020, 1, 29, 13, 0, 0).unwrap(),
        },
        identity: AssumedIdentity {
            assumed_role_id: "AROA-D:multipart-upload-sts-session".to_string(),
            arn: "arn:aws:sts::123456789012:assumed-role/E".to_string(),
        },
    }
}

/// Records every request; answers with `sample_role` or a fixed error.
pub struct StubAssumer {
    pub calls: Mutex<Vec<AssumeRoleRequest>>,
    pub fail_with: Option<String>,
}

impl StubAssumer {
    pub fn ok() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(msg.to_string()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RoleAssumer for StubAssumer {
    async fn assume_role(&self, request: AssumeRoleRequest) -> anyhow::Result<AssumedRole> {
        self.calls.lock().unwrap().push(request);
        match &self.fail_with {
            Some(msg) => Err(anyhow!("{}", msg)),
            None => Ok(sample_role()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoredVia {
    Put,
    Multipart { part_size: u64 },
}

/// In-memory object store keyed by object key.
pub struct MockObjectStore {
    pub objects: Mutex<HashMap<String, (Vec<u8>, StoredVia)>>,
    pub fail_with: Option<String>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_with: Some(msg.to_string()),
        }
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put_file(&self, key: &str, path: &Path) -> anyhow::Result<()> {
        if let Some(msg) = &self.fail_with {
            return Err(anyhow!("{}", msg));
        }
        let data = tokio::fs::read(path).await?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, StoredVia::Put));
        Ok(())
    }

    async fn put_file_multipart(
        &self,
        key: &str,
        path: &Path,
        size: u64,
        part_size: u64,
    ) -> anyhow::Result<usize> {
        if let Some(msg) = &self.fail_with {
            return Err(anyhow!("{}", msg));
        }
        let part_size = plan_part_size(size, part_size)?;
        let parts = part_ranges(size, part_size).len();
        let data = tokio::fs::read(path).await?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, StoredVia::Multipart { part_size }));
        Ok(parts)
    }
}
