use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use sts_multipart_upload::config::UploaderConfig;
use sts_multipart_upload::infrastructure::aws;
use sts_multipart_upload::services::uploader::Uploader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Upload a file to S3 with temporary STS credentials", long_about = None)]
struct Args {
    /// File to upload
    path: PathBuf,

    /// Use multipart upload regardless of file size
    #[arg(long)]
    multipart: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // RUST_LOG=debug shows per-part progress
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upload=info,sts_multipart_upload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = UploaderConfig::from_env()?;
    let store = aws::setup_storage(&config).await;
    let uploader = Uploader::from_config(store, &config);

    if args.multipart {
        info!("Using multipart...");
    }

    let report = uploader.upload(&args.path, args.multipart).await?;
    println!(
        "Uploaded OK: s3://{}/{} ({} bytes, {}, {} part(s))",
        config.bucket, report.key, report.size, report.strategy, report.parts
    );

    Ok(())
}
