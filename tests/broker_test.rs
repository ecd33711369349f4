mod common;

use common::{BUCKET_ARN, ROLE_ARN, StubAssumer, broker_config};
use serde_json::Value;
use std::sync::Arc;
use sts_multipart_upload::config::{BrokerConfig, DEFAULT_SESSION_NAME};
use sts_multipart_upload::error::AppError;
use sts_multipart_upload::services::broker::CredentialBroker;

#[tokio::test]
async fn test_missing_role_arn_makes_no_remote_call() {
    let stub = Arc::new(StubAssumer::ok());
    let broker = CredentialBroker::new(stub.clone());

    let mut config = broker_config();
    config.role_arn = None;

    let err = broker.issue(&config).await.unwrap_err();
    assert!(matches!(err, AppError::MissingConfig("ROLE_ARN")));
    assert_eq!(err.to_string(), "No ROLE_ARN found");
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_empty_config_makes_no_remote_call() {
    let stub = Arc::new(StubAssumer::ok());
    let broker = CredentialBroker::new(stub.clone());

    let err = broker.issue(&BrokerConfig::default()).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_bucket_arn_makes_no_remote_call() {
    let stub = Arc::new(StubAssumer::ok());
    let broker = CredentialBroker::new(stub.clone());

    let mut config = broker_config();
    config.bucket_arn = Some("*".to_string());

    let err = broker.issue(&config).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidConfig(_)));
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_assume_role_request_carries_scoped_policy() {
    let stub = Arc::new(StubAssumer::ok());
    let broker = CredentialBroker::new(stub.clone());

    broker.issue(&broker_config()).await.unwrap();

    let calls = stub.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let request = &calls[0];
    assert_eq!(request.role_arn, ROLE_ARN);
    assert_eq!(request.session_name, DEFAULT_SESSION_NAME);
    assert_eq!(request.duration_seconds, None);

    let policy: Value = serde_json::from_str(&request.policy).unwrap();
    let statements = policy["Statement"].as_array().unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0]["Resource"], format!("{}/uploads/*", BUCKET_ARN));
    assert_eq!(
        statements[0]["Action"],
        serde_json::json!(["s3:PutObject", "s3:AbortMultipartUpload"])
    );
}

#[tokio::test]
async fn test_response_round_trips_credentials_and_identity() {
    let broker = CredentialBroker::new(Arc::new(StubAssumer::ok()));

    let res = broker.issue(&broker_config()).await.unwrap();
    let json: Value = serde_json::to_value(&res).unwrap();

    assert_eq!(json["creds"]["AccessKeyId"], "ASIA-A");
    assert_eq!(json["creds"]["SecretAccessKey"], "secret-B");
    assert_eq!(json["creds"]["SessionToken"], "token-C");
    assert_eq!(json["creds"]["Expiration"], "2020-01-29T13:00:00+00:00");
    assert_eq!(
        json["user"]["AssumedRoleId"],
        "AROA-D:multipart-upload-sts-session"
    );
    assert_eq!(
        json["user"]["Arn"],
        "arn:aws:sts::123456789012:assumed-role/E"
    );

    let envcmd = json["envcmd"].as_str().unwrap();
    assert!(envcmd.contains("AWS_ACCESS_KEY_ID=ASIA-A"));
    assert!(envcmd.contains("AWS_SESSION_TOKEN=token-C"));
    assert!(envcmd.ends_with(" upload"));

    let parsed: sts_multipart_upload::models::BrokerResponse =
        serde_json::from_value(json).unwrap();
    assert_eq!(parsed, res);
}

#[tokio::test]
async fn test_upstream_failure_is_propagated() {
    let stub = Arc::new(StubAssumer::failing(
        "AccessDenied: User is not authorized to perform: sts:AssumeRole",
    ));
    let broker = CredentialBroker::new(stub.clone());

    let err = broker.issue(&broker_config()).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));
    assert!(err.to_string().contains("AccessDenied"));
    assert_eq!(stub.call_count(), 1);
}
