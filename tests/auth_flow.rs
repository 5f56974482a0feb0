mod common;

use axum::http::StatusCode;
use ethers::signers::{ LocalWallet, Signer };
use serde_json::json;

use common::{ send, spawn_app, FakeRunner, OWNER };

/// Second default Hardhat account; its address is `OWNER`.
const OWNER_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

async fn challenge(router: &axum::Router, address: &str) -> String {
    let (status, body) = send(
        router,
        "GET",
        &format!("/api/auth/message?address={}", address),
        None,
        None
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["message"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_sign_in_and_use_session() {
    let app = spawn_app(FakeRunner::default(), true).await;
    let wallet: LocalWallet = OWNER_KEY.parse().unwrap();
    assert_eq!(format!("{:?}", wallet.address()), OWNER);

    let message = challenge(&app.router, "0x70997970C51812dc3A010C7d01b50e0d17dc79C8").await;
    assert!(message.contains(OWNER));

    let signature = wallet.sign_message(&message).await.unwrap();
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "address": OWNER, "signature": signature.to_string() }))
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["address"], OWNER);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app.router, "GET", "/api/auth/verify", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["address"], OWNER);

    let (status, body) = send(&app.router, "GET", "/api/contracts/mine", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokens"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["presales"].as_array().map(Vec::len), Some(0));

    // The nonce rotates on login, so the same signature cannot be replayed
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "address": OWNER, "signature": signature.to_string() }))
    ).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_signer_is_rejected() {
    let app = spawn_app(FakeRunner::default(), true).await;
    let message = challenge(&app.router, OWNER).await;

    let impostor = LocalWallet::new(&mut ethers::core::rand::thread_rng());
    let signature = impostor.sign_message(&message).await.unwrap();

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "address": OWNER, "signature": signature.to_string() }))
    ).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_SIGNATURE");
}

#[tokio::test]
async fn test_invalid_address_for_challenge() {
    let app = spawn_app(FakeRunner::default(), true).await;

    let (status, body) = send(&app.router, "GET", "/api/auth/message?address=0x1234", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ADDRESS");
}

#[tokio::test]
async fn test_challenge_without_address() {
    let app = spawn_app(FakeRunner::default(), true).await;

    let (status, body) = send(&app.router, "GET", "/api/auth/message", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_verify_rejects_garbage_token() {
    let app = spawn_app(FakeRunner::default(), true).await;

    let (status, body) = send(&app.router, "GET", "/api/auth/verify", Some("not-a-jwt"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}
