use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use tamperproof_crypto::attestation::verify_attestation;
use tamperproof_crypto::Ed25519SigningKey;
use tamperproof_types::*;

use super::*;
use crate::anchors::AnchorBook;
use crate::config::LedgerState;
use crate::error::LedgerError;

const HELLO_DIGEST: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

fn test_state() -> Arc<LedgerState> {
    Arc::new(LedgerState::new(Ed25519SigningKey::generate(
        &mut rand::rngs::OsRng,
    )))
}

fn digest_request(digest: &str) -> Json<DigestRequest> {
    Json(DigestRequest {
        digest: digest.to_string(),
    })
}

fn assert_signed(state: &LedgerState, r: &ConfirmResponse) {
    let target = AttestationSignTarget {
        digest: r.digest.clone(),
        attested: r.attested,
        anchored_at: r.anchored_at,
    };
    let sig = r.signature.as_deref().unwrap();
    assert!(verify_attestation(&state.verifying_key, &target, sig).is_ok());
}

#[tokio::test]
async fn test_confirm_before_and_after_anchor() {
    let state = test_state();

    let Json(before) = handle_confirm(State(state.clone()), digest_request(HELLO_DIGEST))
        .await
        .unwrap();
    assert!(!before.attested);
    assert_eq!(before.anchored_at, None);
    assert_signed(&state, &before);

    let Json(anchored) = handle_anchor(State(state.clone()), digest_request(HELLO_DIGEST))
        .await
        .unwrap();
    assert!(!anchored.already_anchored);

    let Json(after) = handle_confirm(State(state.clone()), digest_request(HELLO_DIGEST))
        .await
        .unwrap();
    assert!(after.attested);
    assert_eq!(after.anchored_at, Some(anchored.anchored_at));
    assert_signed(&state, &after);
}

#[tokio::test]
async fn test_anchor_is_idempotent() {
    let state = test_state();
    let Json(first) = handle_anchor(State(state.clone()), digest_request(HELLO_DIGEST))
        .await
        .unwrap();
    let Json(second) = handle_anchor(State(state.clone()), digest_request(HELLO_DIGEST))
        .await
        .unwrap();

    assert!(second.already_anchored);
    assert_eq!(second.anchored_at, first.anchored_at);
    assert_eq!(state.anchors.count().await, 1);
}

/// Ledgerを再起動しても登録済みダイジェストはアテステーションされる
#[tokio::test]
async fn test_anchor_survives_ledger_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anchors.json");
    let key_bytes = Ed25519SigningKey::generate(&mut rand::rngs::OsRng).to_bytes();

    let state = Arc::new(LedgerState::with_anchors(
        Ed25519SigningKey::from_bytes(&key_bytes),
        AnchorBook::open(&path).await.unwrap(),
    ));
    let Json(anchored) = handle_anchor(State(state.clone()), digest_request(HELLO_DIGEST))
        .await
        .unwrap();
    drop(state);

    let restarted = Arc::new(LedgerState::with_anchors(
        Ed25519SigningKey::from_bytes(&key_bytes),
        AnchorBook::open(&path).await.unwrap(),
    ));
    let Json(confirmed) = handle_confirm(State(restarted.clone()), digest_request(HELLO_DIGEST))
        .await
        .unwrap();
    assert!(confirmed.attested);
    assert_eq!(confirmed.anchored_at, Some(anchored.anchored_at));
    assert_signed(&restarted, &confirmed);
}

#[tokio::test]
async fn test_malformed_digest() {
    let state = test_state();

    let anchored = handle_anchor(State(state.clone()), digest_request("xyz")).await;
    assert!(matches!(anchored, Err(LedgerError::BadRequest(_))));

    let Json(confirmed) = handle_confirm(State(state.clone()), digest_request("xyz"))
        .await
        .unwrap();
    assert!(!confirmed.attested);
    assert_signed(&state, &confirmed);
}

#[tokio::test]
async fn test_generate_hash() {
    let Json(r) = handle_generate_hash(Bytes::from_static(b"hello")).await;
    assert_eq!(r.hash, HELLO_DIGEST);
}

#[tokio::test]
async fn test_ledger_info_publishes_pubkey() {
    let state = test_state();
    let Json(info) = handle_ledger_info(State(state.clone())).await;
    let decoded = tamperproof_crypto::verifying_key_from_base58(&info.signing_pubkey).unwrap();
    assert_eq!(decoded, state.verifying_key);
}
