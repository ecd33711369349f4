use crate::config::UploaderConfig;
use crate::services::storage::S3ObjectStore;
use crate::services::sts::StsRoleAssumer;
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::info;

/// STS client using the broker's own identity from the default provider chain.
pub async fn setup_sts() -> Arc<StsRoleAssumer> {
    let aws_config = aws_config::load_from_env().await;
    info!(
        "🔐 STS client ready (region: {})",
        aws_config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "<default>".to_string())
    );
    Arc::new(StsRoleAssumer::new(aws_sdk_sts::Client::new(&aws_config)))
}

/// S3 client bound to the temporary session credentials in `config`.
pub async fn setup_storage(config: &UploaderConfig) -> Arc<S3ObjectStore> {
    let mut loader = aws_config::from_env()
        .region(Region::new(config.region.clone()))
        .credentials_provider(Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            Some(config.session_token.clone()),
            None,
            "sts-session",
        ));

    if let Some(endpoint_url) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint_url.is_some())
        .build();

    info!(
        "☁️  S3 Storage: {} (Bucket: {})",
        config.endpoint_url.as_deref().unwrap_or("aws"),
        config.bucket
    );

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    Arc::new(S3ObjectStore::new(s3_client, config.bucket.clone()))
}
