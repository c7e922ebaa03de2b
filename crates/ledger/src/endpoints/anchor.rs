//! # POST /anchor
//!
//! ダイジェストを台帳に登録する。登録は一度きりで、再登録しても
//! 最初の登録時刻は変わらない。
//!
//! 登録は別タスクで実行し、クライアントが切断しても台帳への書き込みは完了させる。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tamperproof_types::*;

use crate::config::{now_unix_secs, LedgerState};
use crate::error::LedgerError;

pub async fn handle_anchor(
    State(state): State<Arc<LedgerState>>,
    Json(body): Json<DigestRequest>,
) -> Result<Json<AnchorResponse>, LedgerError> {
    if !tamperproof_crypto::is_valid_digest(&body.digest) {
        return Err(LedgerError::BadRequest(format!(
            "ダイジェストの形式が不正です: {}",
            body.digest
        )));
    }

    let digest = body.digest;
    let task = {
        let state = state.clone();
        let digest = digest.clone();
        tokio::spawn(async move { state.anchors.anchor(&digest, now_unix_secs()).await })
    };
    let anchored = task
        .await
        .map_err(|e| LedgerError::Internal(format!("登録タスクが異常終了しました: {e}")))??;

    if !anchored.already_anchored {
        tracing::info!(digest = %digest, "ダイジェストを台帳に登録しました");
    }

    Ok(Json(AnchorResponse {
        digest,
        anchored_at: anchored.anchored_at,
        already_anchored: anchored.already_anchored,
    }))
}
