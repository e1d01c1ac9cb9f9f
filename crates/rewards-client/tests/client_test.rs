//! Integration tests for the rewards client against the mock backend

use greenproof_common::{FetchError, ProofRequest, Snapshot, SubmissionError};
use rewards_client::mock_backend::MockBackend;
use rewards_client::{BalanceFetcher, ProofSubmitter, RewardsClient};
use std::time::Duration;

const WALLET: &str = "Wxyz9fKq3m1234";

fn proof(barcode: &str) -> ProofRequest {
    ProofRequest::new(
        barcode,
        WALLET,
        Snapshot::new(vec![0xff, 0xd8, 0xff, 0xe0, 1, 2, 3], "image/jpeg"),
    )
}

#[tokio::test]
async fn test_submit_sends_three_named_parts() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");
    backend
        .set_validate_response(200, r#"{"status":"success","points_awarded":10,"total_points":40}"#)
        .await;

    let client = RewardsClient::new(backend.url());
    let result = client.submit(proof("0123456789012")).await.unwrap();

    assert_eq!(result.points_awarded, 10);
    assert_eq!(result.total_points, Some(40));

    let proofs = backend.received_proofs().await;
    assert_eq!(proofs.len(), 1);
    assert_eq!(proofs[0].barcode_id.as_deref(), Some("0123456789012"));
    assert_eq!(proofs[0].pubkey.as_deref(), Some(WALLET));
    assert_eq!(proofs[0].image.as_deref(), Some(&[0xff, 0xd8, 0xff, 0xe0, 1, 2, 3][..]));
    assert_eq!(proofs[0].image_file_name.as_deref(), Some("snapshot.jpg"));
    assert_eq!(proofs[0].image_content_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test]
async fn test_submit_empty_body_awards_zero_points() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");
    backend.set_validate_response(200, "{}").await;

    let client = RewardsClient::new(backend.url());
    let result = client.submit(proof("4006381333931")).await.unwrap();

    assert_eq!(result.points_awarded, 0);
}

#[tokio::test]
async fn test_submit_rejection_carries_backend_error() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");
    backend
        .set_validate_response(400, r#"{"error":"invalid barcode"}"#)
        .await;

    let client = RewardsClient::new(backend.url());
    let err = client.submit(proof("garbage")).await.unwrap_err();

    assert_eq!(
        err,
        SubmissionError::Status {
            status: 400,
            message: "invalid barcode".to_string()
        }
    );
    assert_eq!(backend.validate_calls(), 1);
}

#[tokio::test]
async fn test_submit_unparsable_body_is_decode_error() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");
    backend.set_validate_response(200, "<html>oops</html>").await;

    let client = RewardsClient::new(backend.url());
    let err = client.submit(proof("0123456789012")).await.unwrap_err();

    assert!(matches!(err, SubmissionError::Decode(_)));
}

#[tokio::test]
async fn test_submit_unreachable_backend_is_transport_error() {
    // Bind and drop a listener so the port is known to be closed
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let client = RewardsClient::new(format!("http://{}", addr));
    let err = client.submit(proof("0123456789012")).await.unwrap_err();

    assert!(matches!(err, SubmissionError::Transport(_)));
}

#[tokio::test]
async fn test_submit_times_out() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");
    backend.set_validate_delay(Duration::from_secs(2)).await;

    let client = RewardsClient::with_timeout(backend.url(), Duration::from_millis(200)).unwrap();
    let err = client.submit(proof("0123456789012")).await.unwrap_err();

    assert!(matches!(err, SubmissionError::Transport(_)));
}

#[tokio::test]
async fn test_fetch_balance() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");
    backend
        .set_wallet_response(200, r#"{"points":230,"reward_balance":250,"wallet_info":{}}"#)
        .await;

    let client = RewardsClient::new(backend.url());
    let balance = client.fetch(WALLET).await.unwrap();

    assert_eq!(balance.reward_balance, 250);
    assert_eq!(balance.points, 230);
    assert_eq!(backend.requested_wallets().await, vec![WALLET.to_string()]);
}

#[tokio::test]
async fn test_fetch_missing_balance_defaults_to_zero() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");
    backend.set_wallet_response(200, "{}").await;

    let client = RewardsClient::new(backend.url());
    let balance = client.fetch(WALLET).await.unwrap();

    assert_eq!(balance.reward_balance, 0);
}

#[tokio::test]
async fn test_null_fields_decode_as_zero() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");
    backend
        .set_validate_response(200, r#"{"status":"success","points_awarded":null}"#)
        .await;
    backend
        .set_wallet_response(200, r#"{"points":null,"reward_balance":null}"#)
        .await;

    let client = RewardsClient::new(backend.url());
    let result = client.submit(proof("0123456789012")).await.unwrap();
    assert_eq!(result.points_awarded, 0);

    let balance = client.fetch(WALLET).await.unwrap();
    assert_eq!(balance.reward_balance, 0);
    assert_eq!(balance.points, 0);
}

#[tokio::test]
async fn test_fetch_unknown_wallet() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");
    backend
        .set_wallet_response(404, r#"{"error":"wallet not found"}"#)
        .await;

    let client = RewardsClient::new(backend.url());
    let err = client.fetch("nobody").await.unwrap_err();

    assert_eq!(
        err,
        FetchError::Status {
            status: 404,
            message: "wallet not found".to_string()
        }
    );
    assert_eq!(backend.wallet_calls(), 1);
}

#[tokio::test]
async fn test_fetch_encodes_wallet_address() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");

    let client = RewardsClient::new(backend.url());
    client.fetch("odd/wallet id").await.unwrap();

    assert_eq!(
        backend.requested_wallets().await,
        vec!["odd/wallet id".to_string()]
    );
}

#[tokio::test]
async fn test_health_check() {
    let backend = MockBackend::start().await.expect("Failed to start mock backend");

    let client = RewardsClient::new(backend.url());
    assert!(client.health_check().await.unwrap());
}
