use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const POLICY_VERSION: &str = "2012-10-17";

/// Key prefix every issued session is confined to
pub const UPLOAD_PREFIX: &str = "uploads";

/// Actions granted to an upload session. Abort is needed so a failed
/// multipart upload can be cleaned up with the same credentials.
pub const UPLOAD_ACTIONS: &[&str] = &["s3:PutObject", "s3:AbortMultipartUpload"];

/// IAM session policy attached to an AssumeRole call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionPolicy {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub sid: String,
    pub effect: String,
    pub action: Vec<String>,
    pub resource: String,
}

impl SessionPolicy {
    /// Policy allowing uploads under `{bucket_arn}/uploads/*` only.
    ///
    /// Rejects anything that is not a concrete ARN so the resource can never
    /// widen to a wildcard.
    pub fn upload_only(bucket_arn: &str) -> AppResult<Self> {
        let bucket_arn = bucket_arn.trim().trim_end_matches('/');
        if !bucket_arn.starts_with("arn:") {
            return Err(AppError::InvalidConfig(format!(
                "BUCKET_ARN: expected an ARN, got {:?}",
                bucket_arn
            )));
        }
        if bucket_arn.contains('*') {
            return Err(AppError::InvalidConfig(format!(
                "BUCKET_ARN: wildcards are not allowed in {:?}",
                bucket_arn
            )));
        }

        Ok(Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                sid: "RestrictToUploadPrefix".to_string(),
                effect: "Allow".to_string(),
                action: UPLOAD_ACTIONS.iter().map(|a| a.to_string()).collect(),
                resource: upload_resource(bucket_arn),
            }],
        })
    }

    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::InvalidConfig(format!("session policy: {}", e)))
    }
}

pub fn upload_resource(bucket_arn: &str) -> String {
    format!("{}/{}/*", bucket_arn, UPLOAD_PREFIX)
}
