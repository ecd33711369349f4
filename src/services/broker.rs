use crate::config::BrokerConfig;
use crate::error::{AppError, AppResult};
use crate::models::{BrokerResponse, TemporaryCredentials};
use crate::services::policy::SessionPolicy;
use crate::services::sts::{AssumeRoleRequest, RoleAssumer};
use std::sync::Arc;
use tracing::info;

/// Name of the uploader binary used in the `envcmd` hint
pub const UPLOAD_COMMAND: &str = "upload";

/// Issues upload-scoped temporary credentials.
pub struct CredentialBroker {
    assumer: Arc<dyn RoleAssumer>,
}

impl CredentialBroker {
    pub fn new(assumer: Arc<dyn RoleAssumer>) -> Self {
        Self { assumer }
    }

    /// Validates `config`, then assumes the role with a session policy
    /// confined to the bucket's upload prefix.
    ///
    /// Configuration problems are returned before any remote call is made.
    pub async fn issue(&self, config: &BrokerConfig) -> AppResult<BrokerResponse> {
        let config = config.require()?;
        let policy = SessionPolicy::upload_only(&config.bucket_arn)?;

        let request = AssumeRoleRequest {
            role_arn: config.role_arn.clone(),
            session_name: config.session_name.clone(),
            policy: policy.to_json()?,
            duration_seconds: config.duration_seconds,
        };

        let assumed = self
            .assumer
            .assume_role(request)
            .await
            .map_err(AppError::Upstream)?;

        info!(
            "🔑 Issued upload credentials: arn={}, expires={}",
            assumed.identity.arn, assumed.credentials.expiration
        );

        let envcmd = env_command(&assumed.credentials, &config.bucket_name);
        Ok(BrokerResponse {
            creds: assumed.credentials,
            user: assumed.identity,
            envcmd: Some(envcmd),
        })
    }
}

/// Shell prefix that runs the uploader with the issued credentials.
pub fn env_command(creds: &TemporaryCredentials, bucket_name: &str) -> String {
    format!(
        "AWS_ACCESS_KEY_ID={} AWS_SECRET_ACCESS_KEY={} AWS_SESSION_TOKEN={} BUCKET_NAME={} {}",
        creds.access_key_id, creds.secret_access_key, creds.session_token, bucket_name, UPLOAD_COMMAND
    )
}
