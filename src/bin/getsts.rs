use dotenvy::dotenv;
use sts_multipart_upload::config::BrokerConfig;
use sts_multipart_upload::infrastructure::aws;
use sts_multipart_upload::services::broker::{CredentialBroker, UPLOAD_COMMAND};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "getsts=info,sts_multipart_upload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = BrokerConfig::from_env()?;
    // Fail before building any AWS client.
    config.require()?;

    let broker = CredentialBroker::new(aws::setup_sts().await);
    let res = broker.issue(&config).await?;

    info!(
        "👤 user: AssumedRoleId={}, Arn={}",
        res.user.assumed_role_id, res.user.arn
    );

    println!("{}", serde_json::to_string_pretty(&res)?);

    eprintln!("Use like:");
    eprintln!("  AWS_ACCESS_KEY_ID={}", res.creds.access_key_id);
    eprintln!("  AWS_SECRET_ACCESS_KEY={}", res.creds.secret_access_key);
    eprintln!("  AWS_SESSION_TOKEN={}", res.creds.session_token);
    if let Some(bucket) = &config.bucket_name {
        eprintln!("  BUCKET_NAME={}", bucket);
    }
    eprintln!("  {} <PATH>", UPLOAD_COMMAND);

    Ok(())
}
