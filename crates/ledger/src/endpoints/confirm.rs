//! # POST /confirm
//!
//! ダイジェストが台帳に登録済みかを回答する。回答には
//! `AttestationSignTarget` に対するEd25519署名を付ける。
//! 未登録・形式不正も `attested = false` として署名付きで返す。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tamperproof_types::*;

use crate::config::LedgerState;
use crate::error::LedgerError;

pub async fn handle_confirm(
    State(state): State<Arc<LedgerState>>,
    Json(body): Json<DigestRequest>,
) -> Result<Json<ConfirmResponse>, LedgerError> {
    let digest = body.digest;

    let (anchored_at, detail) = if !tamperproof_crypto::is_valid_digest(&digest) {
        (None, "ダイジェストの形式が不正です".to_string())
    } else {
        match state.anchors.get(&digest).await {
            Some(ts) => (Some(ts), format!("{ts} に台帳へ登録済み")),
            None => (None, "台帳に登録されていません".to_string()),
        }
    };
    let attested = anchored_at.is_some();

    let target = AttestationSignTarget {
        digest: digest.clone(),
        attested,
        anchored_at,
    };
    let signature = tamperproof_crypto::attestation::sign_attestation(&state.signing_key, &target)
        .map_err(|e| LedgerError::Internal(e.to_string()))?;

    tracing::debug!(digest = %digest, attested, "信頼確認に回答");

    Ok(Json(ConfirmResponse {
        digest,
        attested,
        detail,
        anchored_at,
        signature: Some(signature),
    }))
}
