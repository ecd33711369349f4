use crate::models::{AssumedIdentity, TemporaryCredentials};
use crate::utils::time;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_sts::Client;
use aws_sdk_sts::error::DisplayErrorContext;

#[derive(Debug, Clone, PartialEq)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    /// Session policy JSON
    pub policy: String,
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssumedRole {
    pub credentials: TemporaryCredentials,
    pub identity: AssumedIdentity,
}

/// Anything able to exchange the caller's identity for role credentials.
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(&self, request: AssumeRoleRequest) -> Result<AssumedRole>;
}

pub struct StsRoleAssumer {
    client: Client,
}

impl StsRoleAssumer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(&self, request: AssumeRoleRequest) -> Result<AssumedRole> {
        let res = self
            .client
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .policy(&request.policy)
            .set_duration_seconds(request.duration_seconds)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    "STS AssumeRole failed: role={}, error={}",
                    request.role_arn,
                    DisplayErrorContext(&e)
                );
                anyhow!("{}", DisplayErrorContext(&e))
            })?;

        let creds = res
            .credentials
            .context("No credentials in AssumeRole response")?;
        let user = res
            .assumed_role_user
            .context("No assumed role user in AssumeRole response")?;

        let expiration = time::from_aws(&creds.expiration)
            .context("AssumeRole expiration is out of range")?;

        Ok(AssumedRole {
            credentials: TemporaryCredentials {
                access_key_id: creds.access_key_id,
                secret_access_key: creds.secret_access_key,
                session_token: creds.session_token,
                expiration,
            },
            identity: AssumedIdentity {
                assumed_role_id: user.assumed_role_id,
                arn: user.arn,
            },
        })
    }
}
