//! # GET /.well-known/ledger-info
//!
//! Gatewayが `TRUST_PUBKEY` に設定する署名検証用公開鍵を公開する。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tamperproof_types::LedgerInfo;

use crate::config::LedgerState;

pub async fn handle_ledger_info(State(state): State<Arc<LedgerState>>) -> Json<LedgerInfo> {
    Json(LedgerInfo {
        signing_pubkey: tamperproof_crypto::verifying_key_to_base58(&state.verifying_key),
    })
}
