//! # Gatewayエンドポイント
//!
//! ## API エンドポイント
//! - `POST /documents/upload?filename=` — 登録（リクエストボディが生バイト列）
//! - `POST /verify/file` — ファイル内容による検証
//! - `GET /verify/hash?document_hash=` — ダイジェストによる検証
//! - `GET /documents` — 一覧
//! - `GET /documents/stats` — 集計
//! - `PATCH /documents/{id}/verify` — 検証済み化
//! - `DELETE /documents/{id}` — 削除
//! - `GET /documents/download/{id}` — 生バイト列のダウンロード
//! - `GET /qr/{id}` — 証明アーティファクト
//! - `POST /trust/confirm` — Ledgerとの相互確認

pub mod documents;
pub mod proof;
pub mod trust;
pub mod upload;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_helpers;


use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};

pub use documents::{
    handle_delete, handle_download, handle_list, handle_mark_verified, handle_stats,
};
pub use proof::handle_proof_artifact;
pub use trust::handle_trust_confirm;
pub use upload::handle_upload;
pub use verify::{handle_verify_file, handle_verify_hash};

use crate::config::GatewayState;

/// Gatewayのルーターを構築する。
pub fn router(state: Arc<GatewayState>) -> axum::Router {
    let body_limit = state.max_upload_size;
    axum::Router::new()
        .route("/documents/upload", post(handle_upload))
        .route("/verify/file", post(handle_verify_file))
        .route("/verify/hash", get(handle_verify_hash))
        .route("/documents", get(handle_list))
        .route("/documents/stats", get(handle_stats))
        .route("/documents/{id}/verify", patch(handle_mark_verified))
        .route("/documents/{id}", axum::routing::delete(handle_delete))
        .route("/documents/download/{id}", get(handle_download))
        .route("/qr/{id}", get(handle_proof_artifact))
        .route("/trust/confirm", post(handle_trust_confirm))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
